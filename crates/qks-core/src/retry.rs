//! Executor wrapper that retries transient failures.

use async_trait::async_trait;
use tracing::warn;

use crate::ansatz::CircuitTemplate;
use crate::config::RetryPolicy;
use crate::error::{ExecResult, QksResult};
use crate::executor::{Executor, ParameterBindings};

/// Wraps an executor and retries `run` calls that fail transiently.
///
/// Only [`ExecError::is_transient`](crate::ExecError::is_transient) failures
/// are retried; everything else, and the last transient failure, is returned
/// unchanged. `compile` is passed through untouched.
pub struct RetryingExecutor<E> {
    inner: E,
    policy: RetryPolicy,
}

impl<E: Executor> RetryingExecutor<E> {
    /// Wrap `inner` with `policy`.
    pub fn new(inner: E, policy: RetryPolicy) -> QksResult<Self> {
        policy.validate()?;
        Ok(Self { inner, policy })
    }

    /// The wrapped executor.
    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// The retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<E: Executor> Executor for RetryingExecutor<E> {
    type Executable = E::Executable;

    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn compile(&self, template: &CircuitTemplate) -> ExecResult<Self::Executable> {
        self.inner.compile(template).await
    }

    async fn run(
        &self,
        executable: &Self::Executable,
        bindings: &ParameterBindings,
        shots: u32,
    ) -> ExecResult<Vec<u8>> {
        let mut backoff = self.policy.initial_backoff();
        let mut attempt = 1;
        loop {
            match self.inner.run(executable, bindings, shots).await {
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    warn!(
                        executor = self.inner.name(),
                        attempt,
                        "Transient execution failure, retrying in {:?}: {}",
                        backoff,
                        e
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.mul_f64(self.policy.backoff_multiplier);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansatz::Ansatz;
    use crate::error::ExecError;
    use crate::executor::Executable;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Program {
        names: Vec<String>,
    }

    impl Executable for Program {
        fn parameter_names(&self) -> &[String] {
            &self.names
        }

        fn num_clbits(&self) -> usize {
            2
        }
    }

    /// Fails the first `failures` runs with the given error kind.
    struct Flaky {
        failures: usize,
        transient: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Executor for Flaky {
        type Executable = Program;

        fn name(&self) -> &str {
            "flaky"
        }

        async fn compile(&self, template: &CircuitTemplate) -> ExecResult<Program> {
            Ok(Program {
                names: template.parameters().to_vec(),
            })
        }

        async fn run(
            &self,
            _executable: &Program,
            _bindings: &ParameterBindings,
            _shots: u32,
        ) -> ExecResult<Vec<u8>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                if self.transient {
                    return Err(ExecError::Transient("queue full".into()));
                }
                return Err(ExecError::Backend("calibration fault".into()));
            }
            Ok(vec![0, 1])
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff_ms: 10,
            backoff_multiplier: 2.0,
        }
    }

    async fn run_once(executor: &RetryingExecutor<Flaky>) -> ExecResult<Vec<u8>> {
        let program = executor
            .compile(&Ansatz::reference().template())
            .await
            .unwrap();
        executor
            .run(&program, &ParameterBindings::default(), 1)
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_failures() {
        let flaky = Flaky {
            failures: 2,
            transient: true,
            calls: AtomicUsize::new(0),
        };
        let executor = RetryingExecutor::new(flaky, policy(3)).unwrap();

        assert_eq!(run_once(&executor).await.unwrap(), vec![0, 1]);
        assert_eq!(executor.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let flaky = Flaky {
            failures: 5,
            transient: true,
            calls: AtomicUsize::new(0),
        };
        let executor = RetryingExecutor::new(flaky, policy(3)).unwrap();

        assert!(matches!(
            run_once(&executor).await,
            Err(ExecError::Transient(_))
        ));
        assert_eq!(executor.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_retry_fatal_failures() {
        let flaky = Flaky {
            failures: 1,
            transient: false,
            calls: AtomicUsize::new(0),
        };
        let executor = RetryingExecutor::new(flaky, policy(5)).unwrap();

        assert!(matches!(
            run_once(&executor).await,
            Err(ExecError::Backend(_))
        ));
        assert_eq!(executor.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rejects_invalid_policy() {
        let flaky = Flaky {
            failures: 0,
            transient: true,
            calls: AtomicUsize::new(0),
        };
        assert!(RetryingExecutor::new(flaky, policy(0)).is_err());
    }
}
