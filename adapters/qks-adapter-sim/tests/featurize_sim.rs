//! Featurization driven through the statevector executor.

use std::f64::consts::PI;

use ndarray::{Array1, Array2, array};
use qks_adapter_sim::SimulatorExecutor;
use qks_core::datasets::picture_frames;
use qks_core::{
    Ansatz, EpisodeParameters, ExecError, Featurizer, FeaturizerConfig, QksError, featurize,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Fixed parameters: every episode flips both qubits regardless of input.
fn flip_everything(num_episodes: usize) -> EpisodeParameters {
    EpisodeParameters::from_parts(
        Array1::zeros(2 * num_episodes),
        Array2::from_elem((num_episodes, 2), PI),
        0,
    )
    .unwrap()
}

#[tokio::test]
async fn test_deterministic_episodes() {
    let executor = SimulatorExecutor::with_seed(1);
    let featurizer = Featurizer::new(Ansatz::reference(), FeaturizerConfig::default()).unwrap();
    let data = array![[0.3, -0.7], [5.0, 2.0]];

    let features = featurizer
        .featurize_with(&executor, data.view(), &flip_everything(3))
        .await
        .unwrap();

    // Rx(π) on both qubits, then CX 0→1 clears qubit 1.
    assert_eq!(features, Array2::from_shape_fn((2, 6), |(_, j)| (1 - j % 2) as u8));
}

#[tokio::test]
async fn test_seeded_runs_are_reproducible() {
    let data = array![[0.1, 0.2], [0.5, -0.5], [-1.0, 0.3]];
    let config = FeaturizerConfig::with_episodes(20).seed(42).shots(2);

    let mut results = Vec::new();
    for _ in 0..2 {
        let executor = SimulatorExecutor::with_seed(7);
        let featurizer = Featurizer::new(Ansatz::reference(), config.clone()).unwrap();
        results.push(featurizer.run(&executor, data.view()).await.unwrap());
    }

    assert_eq!(results[0].features, results[1].features);
    assert_eq!(results[0].parameters, results[1].parameters);
    assert_eq!(results[0].features.dim(), (3, 80));
}

#[tokio::test]
async fn test_picture_frames_activate_features() {
    let mut rng = StdRng::seed_from_u64(3);
    let frames = picture_frames(40, &mut rng).unwrap();
    let executor = SimulatorExecutor::with_seed(3);

    let features = featurize(&executor, frames.points.view(), 25)
        .await
        .unwrap();

    assert_eq!(features.dim(), (80, 50));
    let ones = features.iter().filter(|&&b| b == 1).count();
    assert!(ones > 0 && ones < features.len());
}

#[tokio::test]
async fn test_oversized_ansatz_fails_compile() {
    let executor = SimulatorExecutor::with_seed(0).with_max_qubits(2);
    let ansatz = Ansatz::for_inputs(4).unwrap();
    let featurizer = Featurizer::new(ansatz, FeaturizerConfig::with_episodes(2)).unwrap();

    let err = featurizer
        .featurize(&executor, Array2::<f64>::zeros((3, 4)).view())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        QksError::Compile(ExecError::Unsupported(_))
    ));
}
