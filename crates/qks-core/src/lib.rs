//! Quantum Kitchen Sinks featurization
//!
//! This crate turns low-dimensional classical data into high-dimensional
//! binary feature vectors by pushing random affine transforms of each point
//! through a fixed parametric quantum circuit and concatenating the measured
//! bits across many independent episodes. A linear classifier trained on the
//! resulting features can separate data that is not linearly separable in
//! the input space.
//!
//! # Overview
//!
//! | Component | Item | Runs |
//! |-----------|------|------|
//! | Random parameter generator | [`generate`] → [`EpisodeParameters`] | once per run |
//! | Angle mapper | [`AngleMapper`], [`angles`] | N × E times |
//! | Execution adapter | [`Executor`] trait | compile once, run N × E times |
//! | Featurizer | [`Featurizer`], [`featurize`] | once per run |
//!
//! For point `u_i` and episode `e` the circuit receives
//! θ = Ω_e · u_i + β_e, where Ω_e is block-diagonal (one block per qubit)
//! with standard-normal entries and β_e is uniform on `[0, 2π)`.
//!
//! # Example
//!
//! ```ignore
//! use qks_core::{Ansatz, Featurizer, FeaturizerConfig};
//! use qks_adapter_sim::SimulatorExecutor;
//! use ndarray::array;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let executor = SimulatorExecutor::new();
//!     let train = array![[0.1, 0.9], [-0.5, 0.5]];
//!     let test = array![[0.3, -0.2]];
//!
//!     let featurizer = Featurizer::new(
//!         Ansatz::reference(),
//!         FeaturizerConfig::with_episodes(200).seed(42),
//!     )?;
//!
//!     // Keep the drawn parameters so the test set lands in the same space.
//!     let run = featurizer.run(&executor, train.view()).await?;
//!     let test_features = featurizer
//!         .featurize_with(&executor, test.view(), &run.parameters)
//!         .await?;
//!
//!     println!("train {:?}, test {:?}", run.features.dim(), test_features.dim());
//!     Ok(())
//! }
//! ```
//!
//! # Implementing an Executor
//!
//! ```ignore
//! use qks_core::{CircuitTemplate, Executable, Executor, ExecResult, ParameterBindings};
//! use async_trait::async_trait;
//!
//! struct Compiled { names: Vec<String>, clbits: usize }
//!
//! impl Executable for Compiled {
//!     fn parameter_names(&self) -> &[String] { &self.names }
//!     fn num_clbits(&self) -> usize { self.clbits }
//! }
//!
//! struct MyBackend;
//!
//! #[async_trait]
//! impl Executor for MyBackend {
//!     type Executable = Compiled;
//!
//!     fn name(&self) -> &str { "my_backend" }
//!
//!     async fn compile(&self, template: &CircuitTemplate) -> ExecResult<Compiled> {
//!         // Translate the template for the device once
//!         # todo!()
//!     }
//!
//!     async fn run(
//!         &self,
//!         executable: &Compiled,
//!         bindings: &ParameterBindings,
//!         shots: u32,
//!     ) -> ExecResult<Vec<u8>> {
//!         // Bind, execute, return shots * clbits bits
//!         # todo!()
//!     }
//! }
//! ```

pub mod angles;
pub mod ansatz;
pub mod cancel;
pub mod config;
pub mod datasets;
pub mod error;
pub mod executor;
pub mod featurizer;
pub mod params;
pub mod retry;

pub use angles::{AngleMapper, angles};
pub use ansatz::{Ansatz, BlockLayout, CircuitTemplate, Entangler, Rotation, TemplateOp};
pub use cancel::CancellationToken;
pub use config::{FeaturizerConfig, RetryPolicy};
pub use error::{ExecError, ExecResult, IndexKind, QksError, QksResult};
pub use executor::{Executable, Executor, ParameterBindings, validate_outcome};
pub use featurizer::{Featurization, Featurizer, Progress, ProgressCallback, featurize};
pub use params::{EpisodeParameters, generate};
pub use retry::RetryingExecutor;
