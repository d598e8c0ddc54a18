//! Ansatz description and the parametric circuit template it produces.
//!
//! The ansatz fixes the circuit structure once per run: how many qubits,
//! which rotation each angle drives, the entangling layer and the final
//! measurement. Only the angle values change between executions.
//!
//! The input features are split into one contiguous block per qubit
//! ([`BlockLayout`]). Every angle in block `k` is applied to qubit `k`, so with
//! the reference 2-qubit ansatz each qubit receives exactly one rotation.

use std::fmt;
use std::ops::Range;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::error::{QksError, QksResult};
use crate::executor::ParameterBindings;

/// Single-qubit rotation driven by one angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    /// Rotation about X.
    Rx,
    /// Rotation about Y.
    Ry,
    /// Rotation about Z.
    Rz,
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rotation::Rx => write!(f, "rx"),
            Rotation::Ry => write!(f, "ry"),
            Rotation::Rz => write!(f, "rz"),
        }
    }
}

/// Entangling layer applied after the rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entangler {
    /// No entangling gates.
    None,
    /// CX from each qubit to its successor.
    CxChain,
    /// CZ between each pair of neighbouring qubits.
    CzChain,
}

/// One operation of a [`CircuitTemplate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplateOp {
    /// Parametric single-qubit rotation.
    Rotate {
        /// Rotation axis.
        gate: Rotation,
        /// Target qubit.
        qubit: usize,
        /// Name of the angle bound at execution time.
        parameter: String,
    },
    /// Controlled-X.
    Cx {
        /// Control qubit.
        control: usize,
        /// Target qubit.
        target: usize,
    },
    /// Controlled-Z.
    Cz {
        /// First qubit.
        a: usize,
        /// Second qubit.
        b: usize,
    },
    /// Measure a qubit into a classical bit.
    Measure {
        /// Measured qubit.
        qubit: usize,
        /// Destination bit.
        clbit: usize,
    },
}

/// A fixed parametric circuit with named real-valued inputs.
///
/// This is what gets handed to [`Executor::compile`](crate::Executor::compile).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitTemplate {
    name: String,
    num_qubits: usize,
    parameters: Vec<String>,
    ops: Vec<TemplateOp>,
}

impl CircuitTemplate {
    /// Create a template from its parts.
    pub fn new(
        name: impl Into<String>,
        num_qubits: usize,
        parameters: Vec<String>,
        ops: Vec<TemplateOp>,
    ) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            parameters,
            ops,
        }
    }

    /// Template name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of classical bits written per shot.
    pub fn num_clbits(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, TemplateOp::Measure { .. }))
            .count()
    }

    /// Parameter names, in angle order.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Operations in program order.
    pub fn ops(&self) -> &[TemplateOp] {
        &self.ops
    }
}

/// Partition of the input features into per-qubit diagonal blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    dim_input: usize,
    num_blocks: usize,
}

impl BlockLayout {
    /// Split `dim_input` features into `num_blocks` equal contiguous blocks.
    pub fn new(dim_input: usize, num_blocks: usize) -> QksResult<Self> {
        if dim_input == 0 || num_blocks == 0 {
            return Err(QksError::invalid(
                "block layout needs a positive dimension and block count",
            ));
        }
        if dim_input % num_blocks != 0 {
            return Err(QksError::invalid(format!(
                "input dimension {dim_input} does not split into {num_blocks} equal blocks"
            )));
        }
        Ok(Self {
            dim_input,
            num_blocks,
        })
    }

    /// One block per feature.
    pub fn diagonal(dim_input: usize) -> QksResult<Self> {
        Self::new(dim_input, dim_input)
    }

    /// Input dimension covered by the layout.
    pub fn dim_input(&self) -> usize {
        self.dim_input
    }

    /// Number of blocks.
    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    /// Features per block.
    pub fn block_size(&self) -> usize {
        self.dim_input / self.num_blocks
    }

    /// Block that owns `feature`.
    pub fn block_of(&self, feature: usize) -> usize {
        feature / self.block_size()
    }

    /// Feature indices covered by `block`.
    pub fn block_range(&self, block: usize) -> Range<usize> {
        let size = self.block_size();
        block * size..(block + 1) * size
    }
}

/// Structural description of the featurization circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ansatz {
    num_qubits: usize,
    dim_input: usize,
    rotation: Rotation,
    entangler: Entangler,
}

impl Ansatz {
    /// Create an ansatz with `num_qubits` qubits fed by `dim_input` angles.
    ///
    /// `dim_input` must be a positive multiple of `num_qubits`.
    pub fn new(num_qubits: usize, dim_input: usize) -> QksResult<Self> {
        if num_qubits == 0 {
            return Err(QksError::invalid("ansatz needs at least one qubit"));
        }
        BlockLayout::new(dim_input, num_qubits)?;
        Ok(Self {
            num_qubits,
            dim_input,
            rotation: Rotation::Rx,
            entangler: Entangler::CxChain,
        })
    }

    /// The 2-qubit, 2-input ansatz: `Rx` on each qubit, `CX 0 1`, measure.
    pub fn reference() -> Self {
        Self {
            num_qubits: 2,
            dim_input: 2,
            rotation: Rotation::Rx,
            entangler: Entangler::CxChain,
        }
    }

    /// One qubit per input feature.
    pub fn for_inputs(dim_input: usize) -> QksResult<Self> {
        Self::new(dim_input, dim_input)
    }

    /// Set the rotation gate.
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the entangling layer.
    pub fn with_entangler(mut self, entangler: Entangler) -> Self {
        self.entangler = entangler;
        self
    }

    /// Number of qubits (and measured bits per shot).
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of angles per execution.
    pub fn dim_input(&self) -> usize {
        self.dim_input
    }

    /// Rotation gate.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Entangling layer.
    pub fn entangler(&self) -> Entangler {
        self.entangler
    }

    /// Feature-to-qubit block partition.
    pub fn block_layout(&self) -> BlockLayout {
        BlockLayout {
            dim_input: self.dim_input,
            num_blocks: self.num_qubits,
        }
    }

    /// Name of the `index`-th angle.
    pub fn parameter_name(index: usize) -> String {
        format!("theta[{index}]")
    }

    /// Build the circuit template.
    pub fn template(&self) -> CircuitTemplate {
        let layout = self.block_layout();
        let parameters: Vec<String> = (0..self.dim_input).map(Self::parameter_name).collect();

        let mut ops = Vec::with_capacity(self.dim_input + 2 * self.num_qubits);
        for (index, parameter) in parameters.iter().enumerate() {
            ops.push(TemplateOp::Rotate {
                gate: self.rotation,
                qubit: layout.block_of(index),
                parameter: parameter.clone(),
            });
        }
        for q in 0..self.num_qubits.saturating_sub(1) {
            match self.entangler {
                Entangler::None => {}
                Entangler::CxChain => ops.push(TemplateOp::Cx {
                    control: q,
                    target: q + 1,
                }),
                Entangler::CzChain => ops.push(TemplateOp::Cz { a: q, b: q + 1 }),
            }
        }
        for q in 0..self.num_qubits {
            ops.push(TemplateOp::Measure { qubit: q, clbit: q });
        }

        CircuitTemplate::new(
            format!("qks_{}q_{}", self.num_qubits, self.rotation),
            self.num_qubits,
            parameters,
            ops,
        )
    }

    /// Bind an angle vector to the template's parameter names.
    pub fn bind(&self, theta: ArrayView1<'_, f64>) -> QksResult<ParameterBindings> {
        if theta.len() != self.dim_input {
            return Err(QksError::invalid(format!(
                "angle vector has {} entries, ansatz expects {}",
                theta.len(),
                self.dim_input
            )));
        }
        Ok(theta
            .iter()
            .enumerate()
            .map(|(index, &angle)| (Self::parameter_name(index), angle))
            .collect())
    }
}

impl Default for Ansatz {
    fn default() -> Self {
        Self::reference()
    }
}
