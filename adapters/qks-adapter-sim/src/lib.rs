//! Local Statevector Executor
//!
//! This crate provides a local [`Executor`](qks_core::Executor) for running
//! Quantum Kitchen Sinks featurization without quantum hardware. It prepares
//! the exact statevector for each set of bound angles and samples measured
//! bits from it, so outcomes carry genuine shot noise.
//!
//! # Features
//!
//! - **Compile once**: templates are validated and lowered to a gate list
//!   with parameter slots; `run` only binds angles
//! - **Supported gates**: `Rx`, `Ry`, `Rz`, `CX`, `CZ`, terminal measurement
//! - **Seedable sampling**: [`SimulatorExecutor::with_seed`] makes sequential
//!   runs reproducible
//!
//! # Performance
//!
//! | Qubits | Memory | Simulation Speed |
//! |--------|--------|------------------|
//! | 2 | 64 B | Instant |
//! | 10 | ~16 KB | Instant |
//! | 20 | ~16 MB | Moderate |
//!
//! # Example
//!
//! ```ignore
//! use qks_adapter_sim::SimulatorExecutor;
//! use qks_core::featurize;
//! use ndarray::array;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let executor = SimulatorExecutor::with_seed(7);
//!     let data = array![[0.2, -0.4], [1.0, 0.5]];
//!
//!     let features = featurize(&executor, data.view(), 100).await?;
//!     println!("Features: {:?}", features.dim()); // (2, 200)
//!
//!     Ok(())
//! }
//! ```

mod simulator;
mod statevector;

pub use simulator::{SimProgram, SimulatorExecutor};
