//! Simulator executor implementation.

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, instrument};

use qks_core::{
    CircuitTemplate, ExecError, ExecResult, Executable, Executor, ParameterBindings, Rotation,
    TemplateOp,
};

use crate::statevector::{Statevector, qubit_bit};

/// Gate of a compiled program. Rotation angles refer to parameter slots.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SimOp {
    Rotate {
        gate: Rotation,
        qubit: usize,
        slot: usize,
    },
    Cx {
        control: usize,
        target: usize,
    },
    Cz {
        a: usize,
        b: usize,
    },
}

/// A template validated and lowered for the statevector engine.
#[derive(Debug, Clone)]
pub struct SimProgram {
    name: String,
    num_qubits: usize,
    parameters: Vec<String>,
    ops: Vec<SimOp>,
    /// (qubit, clbit) pairs, applied after all gates.
    measurements: Vec<(usize, usize)>,
    num_clbits: usize,
}

impl SimProgram {
    /// Name of the template this program was compiled from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of simulated qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Resolve bindings into one angle per parameter slot.
    fn resolve(&self, bindings: &ParameterBindings) -> ExecResult<Vec<f64>> {
        if let Some(unknown) = bindings.keys().find(|&k| !self.parameters.contains(k)) {
            return Err(ExecError::Binding(format!("unknown parameter '{unknown}'")));
        }
        self.parameters
            .iter()
            .map(|name| match bindings.get(name) {
                Some(value) if value.is_finite() => Ok(*value),
                Some(value) => Err(ExecError::Binding(format!(
                    "parameter '{name}' has non-finite value {value}"
                ))),
                None => Err(ExecError::Binding(format!("parameter '{name}' is unbound"))),
            })
            .collect()
    }

    fn prepare(&self, angles: &[f64]) -> Statevector {
        let mut sv = Statevector::new(self.num_qubits);
        for op in &self.ops {
            match *op {
                SimOp::Rotate { gate, qubit, slot } => match gate {
                    Rotation::Rx => sv.apply_rx(qubit, angles[slot]),
                    Rotation::Ry => sv.apply_ry(qubit, angles[slot]),
                    Rotation::Rz => sv.apply_rz(qubit, angles[slot]),
                },
                SimOp::Cx { control, target } => sv.apply_cx(control, target),
                SimOp::Cz { a, b } => sv.apply_cz(a, b),
            }
        }
        sv
    }
}

impl Executable for SimProgram {
    fn parameter_names(&self) -> &[String] {
        &self.parameters
    }

    fn num_clbits(&self) -> usize {
        self.num_clbits
    }
}

/// Local statevector executor.
///
/// Each `run` prepares the bound state once and samples it `shots` times.
/// Sampling draws from a single generator shared by all runs, so a seeded
/// executor driven sequentially is reproducible.
pub struct SimulatorExecutor {
    /// Maximum number of qubits supported.
    max_qubits: usize,
    rng: Mutex<StdRng>,
}

impl SimulatorExecutor {
    /// Create a simulator seeded from system entropy.
    pub fn new() -> Self {
        Self {
            max_qubits: 20,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create a simulator with a fixed sampling seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            max_qubits: 20,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Limit the number of qubits a template may use.
    pub fn with_max_qubits(mut self, max_qubits: usize) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    /// Largest template this simulator accepts.
    pub fn max_qubits(&self) -> usize {
        self.max_qubits
    }

    fn lower(&self, template: &CircuitTemplate) -> ExecResult<SimProgram> {
        let num_qubits = template.num_qubits();
        if num_qubits > self.max_qubits {
            return Err(ExecError::Unsupported(format!(
                "template has {num_qubits} qubits but simulator only supports {}",
                self.max_qubits
            )));
        }

        let parameters = template.parameters().to_vec();
        let mut seen = HashSet::new();
        if let Some(dup) = parameters.iter().find(|p| !seen.insert(p.as_str())) {
            return Err(ExecError::InvalidTemplate(format!(
                "parameter '{dup}' declared twice"
            )));
        }

        let num_clbits = template.num_clbits();
        let check_qubit = |q: usize| {
            if q < num_qubits {
                Ok(q)
            } else {
                Err(ExecError::InvalidTemplate(format!(
                    "qubit {q} out of range for {num_qubits} qubits"
                )))
            }
        };

        let mut ops = Vec::with_capacity(template.ops().len());
        let mut measurements = Vec::new();
        for op in template.ops() {
            if !measurements.is_empty() && !matches!(op, TemplateOp::Measure { .. }) {
                return Err(ExecError::Unsupported(
                    "gates after measurement".to_string(),
                ));
            }
            match op {
                TemplateOp::Rotate {
                    gate,
                    qubit,
                    parameter,
                } => {
                    let slot = parameters
                        .iter()
                        .position(|p| p == parameter)
                        .ok_or_else(|| {
                            ExecError::InvalidTemplate(format!(
                                "rotation uses undeclared parameter '{parameter}'"
                            ))
                        })?;
                    ops.push(SimOp::Rotate {
                        gate: *gate,
                        qubit: check_qubit(*qubit)?,
                        slot,
                    });
                }
                TemplateOp::Cx { control, target } => {
                    if control == target {
                        return Err(ExecError::InvalidTemplate(format!(
                            "cx on a single qubit {control}"
                        )));
                    }
                    ops.push(SimOp::Cx {
                        control: check_qubit(*control)?,
                        target: check_qubit(*target)?,
                    });
                }
                TemplateOp::Cz { a, b } => {
                    if a == b {
                        return Err(ExecError::InvalidTemplate(format!(
                            "cz on a single qubit {a}"
                        )));
                    }
                    ops.push(SimOp::Cz {
                        a: check_qubit(*a)?,
                        b: check_qubit(*b)?,
                    });
                }
                TemplateOp::Measure { qubit, clbit } => {
                    if *clbit >= num_clbits {
                        return Err(ExecError::InvalidTemplate(format!(
                            "clbit {clbit} out of range for {num_clbits} bits"
                        )));
                    }
                    if measurements.iter().any(|&(_, c)| c == *clbit) {
                        return Err(ExecError::InvalidTemplate(format!(
                            "clbit {clbit} measured twice"
                        )));
                    }
                    measurements.push((check_qubit(*qubit)?, *clbit));
                }
            }
        }

        Ok(SimProgram {
            name: template.name().to_string(),
            num_qubits,
            parameters,
            ops,
            measurements,
            num_clbits,
        })
    }
}

impl Default for SimulatorExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for SimulatorExecutor {
    type Executable = SimProgram;

    fn name(&self) -> &str {
        "simulator"
    }

    #[instrument(skip(self, template), fields(name = template.name()))]
    async fn compile(&self, template: &CircuitTemplate) -> ExecResult<SimProgram> {
        let program = self.lower(template)?;
        debug!(
            "Compiled {} gates over {} qubits",
            program.ops.len(),
            program.num_qubits
        );
        Ok(program)
    }

    async fn run(
        &self,
        executable: &SimProgram,
        bindings: &ParameterBindings,
        shots: u32,
    ) -> ExecResult<Vec<u8>> {
        let start = Instant::now();
        let angles = executable.resolve(bindings)?;
        let sv = executable.prepare(&angles);

        let mut bits = vec![0u8; shots as usize * executable.num_clbits];
        {
            let mut rng = self
                .rng
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            for shot in bits.chunks_mut(executable.num_clbits.max(1)) {
                let outcome = sv.sample(&mut *rng);
                for &(qubit, clbit) in &executable.measurements {
                    shot[clbit] = qubit_bit(outcome, qubit);
                }
            }
        }

        debug!("Simulated {} shots in {:?}", shots, start.elapsed());
        Ok(bits)
    }
}
