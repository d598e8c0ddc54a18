//! The execution boundary: compile once, run many times.
//!
//! # Lifecycle
//!
//! ```text
//!   compile(template) ──→ Executable ──→ run(executable, bindings, shots) × N·E
//!       (once)            (read-only)              (async, stochastic)
//! ```
//!
//! The featurizer never assumes two `run` calls with the same bindings
//! return the same bits.

use async_trait::async_trait;
use rustc_hash::FxHashMap;

use crate::ansatz::CircuitTemplate;
use crate::error::{ExecError, ExecResult};

/// Concrete values for a template's named parameters.
pub type ParameterBindings = FxHashMap<String, f64>;

/// A compiled circuit, reusable across any number of `run` calls.
pub trait Executable: Send + Sync {
    /// Names of the parameters the compiled circuit expects, in angle order.
    fn parameter_names(&self) -> &[String];

    /// Bits produced per shot.
    fn num_clbits(&self) -> usize;
}

/// Trait for quantum execution backends.
///
/// # Contract
///
/// - `compile()` is called at most once per featurization run.
/// - `run()` MUST return exactly `shots * executable.num_clbits()` values,
///   each 0 or 1, shot-major.
/// - `run()` MAY retry transient failures internally; from the caller's
///   side it either returns bits or fails.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Capability returned by [`compile`](Self::compile).
    type Executable: Executable;

    /// Get the name of this executor.
    fn name(&self) -> &str;

    /// Compile a parametric template into a reusable executable.
    async fn compile(&self, template: &CircuitTemplate) -> ExecResult<Self::Executable>;

    /// Execute the compiled circuit with the given bindings.
    async fn run(
        &self,
        executable: &Self::Executable,
        bindings: &ParameterBindings,
        shots: u32,
    ) -> ExecResult<Vec<u8>>;
}

/// Check an outcome has the expected length and only binary values.
pub fn validate_outcome(bits: &[u8], expected: usize) -> ExecResult<()> {
    if bits.len() != expected {
        return Err(ExecError::MalformedOutcome {
            expected,
            got: bits.len(),
        });
    }
    if let Some((position, &value)) = bits.iter().enumerate().find(|&(_, &b)| b > 1) {
        return Err(ExecError::InvalidBit { position, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_outcome() {
        assert!(validate_outcome(&[1, 0], 2).is_ok());
        assert!(matches!(
            validate_outcome(&[1], 2),
            Err(ExecError::MalformedOutcome {
                expected: 2,
                got: 1
            })
        ));
        assert!(matches!(
            validate_outcome(&[0, 2], 2),
            Err(ExecError::InvalidBit {
                position: 1,
                value: 2
            })
        ));
    }
}
