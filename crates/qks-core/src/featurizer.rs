//! Featurization: drive the executor over every (point, episode) pair.
//!
//! The run is all-or-nothing. Either every one of the N × E execution calls
//! succeeds and a complete N × (E · shots · Q) matrix is returned, or the
//! first failure aborts the run and nothing is returned.
//!
//! Calls are dispatched point-major, episode-minor, with up to
//! `max_concurrency` in flight. Each outcome is written into its own
//! (point, episode) slot, so the matrix layout does not depend on completion
//! order.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use ndarray::{Array2, ArrayView1, ArrayView2, s};
use tracing::{debug, info, instrument};

use crate::angles::AngleMapper;
use crate::ansatz::{Ansatz, CircuitTemplate};
use crate::cancel::CancellationToken;
use crate::config::FeaturizerConfig;
use crate::error::{ExecError, QksError, QksResult};
use crate::executor::{Executable, Executor, validate_outcome};
use crate::params::{EpisodeParameters, generate};

/// Reported after each data point has all of its episodes executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// The point that just completed.
    pub point: usize,
    /// Points completed so far, including this one.
    pub completed_points: usize,
    /// Points in the dataset.
    pub total_points: usize,
}

/// Callback invoked with [`Progress`] updates.
pub type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

/// Output of a complete featurization run.
#[derive(Debug, Clone)]
pub struct Featurization {
    /// N × (E · shots · Q) binary feature matrix, rows in input order.
    pub features: Array2<u8>,
    /// The episode parameters used; reuse them to featurize further data
    /// in the same feature space.
    pub parameters: EpisodeParameters,
    /// Number of execution calls made (N × E).
    pub executions: usize,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
}

/// Orchestrates parameter generation, angle mapping and execution.
pub struct Featurizer {
    ansatz: Ansatz,
    config: FeaturizerConfig,
    progress: Option<ProgressCallback>,
    cancellation: Option<CancellationToken>,
}

impl Featurizer {
    /// Create a featurizer for `ansatz`.
    pub fn new(ansatz: Ansatz, config: FeaturizerConfig) -> QksResult<Self> {
        config.validate()?;
        Ok(Self {
            ansatz,
            config,
            progress: None,
            cancellation: None,
        })
    }

    /// Register a callback invoked once per completed point.
    ///
    /// With `max_concurrency > 1` points may complete out of order.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Attach a cancellation token, checked before every execution call.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The ansatz.
    pub fn ansatz(&self) -> &Ansatz {
        &self.ansatz
    }

    /// The configuration.
    pub fn config(&self) -> &FeaturizerConfig {
        &self.config
    }

    /// Width of one feature row for `num_episodes` episodes.
    pub fn feature_width(&self, num_episodes: usize) -> usize {
        num_episodes * self.config.shots as usize * self.ansatz.num_qubits()
    }

    /// Featurize `dataset` with freshly drawn episode parameters.
    pub async fn featurize<E: Executor>(
        &self,
        executor: &E,
        dataset: ArrayView2<'_, f64>,
    ) -> QksResult<Array2<u8>> {
        Ok(self.run(executor, dataset).await?.features)
    }

    /// Featurize `dataset` and keep the drawn parameters.
    pub async fn run<E: Executor>(
        &self,
        executor: &E,
        dataset: ArrayView2<'_, f64>,
    ) -> QksResult<Featurization> {
        self.validate_dataset(dataset)?;
        let parameters = generate(dataset.ncols(), self.config.num_episodes, self.config.seed)?;
        self.run_with(executor, dataset, parameters).await
    }

    /// Featurize `dataset` with existing parameters.
    ///
    /// The episode count comes from `parameters`, not the configuration.
    pub async fn featurize_with<E: Executor>(
        &self,
        executor: &E,
        dataset: ArrayView2<'_, f64>,
        parameters: &EpisodeParameters,
    ) -> QksResult<Array2<u8>> {
        self.validate_dataset(dataset)?;
        Ok(self
            .run_with(executor, dataset, parameters.clone())
            .await?
            .features)
    }

    #[instrument(skip_all, fields(executor = executor.name(), points = dataset.nrows()))]
    async fn run_with<E: Executor>(
        &self,
        executor: &E,
        dataset: ArrayView2<'_, f64>,
        parameters: EpisodeParameters,
    ) -> QksResult<Featurization> {
        let start = Instant::now();
        let mapper = AngleMapper::new(dataset, &parameters, self.ansatz.block_layout())?;

        let template = self.ansatz.template();
        let executable = executor
            .compile(&template)
            .await
            .map_err(QksError::Compile)?;
        check_executable(&template, &executable)?;

        let num_points = mapper.num_points();
        let num_episodes = mapper.num_episodes();
        let bits_per_episode = self.config.shots as usize * template.num_clbits();
        let width = num_episodes * bits_per_episode;

        info!(
            num_points,
            num_episodes,
            width,
            seed = parameters.seed(),
            max_concurrency = self.config.max_concurrency,
            "Starting featurization"
        );

        let mut features = Array2::<u8>::zeros((num_points, width));
        let mut pending = vec![num_episodes; num_points];
        let mut completed_points = 0;

        let pairs = (0..num_points)
            .flat_map(move |point| (0..num_episodes).map(move |episode| (point, episode)));
        let executable = &executable;
        let mapper = &mapper;
        let mut outcomes = stream::iter(pairs)
            .map(move |(point, episode)| {
                self.execute_pair(executor, executable, mapper, point, episode, bits_per_episode)
            })
            .buffer_unordered(self.config.max_concurrency);

        while let Some(outcome) = outcomes.next().await {
            let (point, episode, bits) = outcome?;
            let offset = episode * bits_per_episode;
            features
                .slice_mut(s![point, offset..offset + bits_per_episode])
                .assign(&ArrayView1::from(&bits[..]));

            pending[point] -= 1;
            if pending[point] == 0 {
                completed_points += 1;
                debug!(point, completed_points, "Point featurized");
                if let Some(callback) = &self.progress {
                    callback(Progress {
                        point,
                        completed_points,
                        total_points: num_points,
                    });
                }
            }
        }
        drop(outcomes);

        let elapsed = start.elapsed();
        info!(?elapsed, "Featurization completed");

        Ok(Featurization {
            features,
            parameters,
            executions: num_points * num_episodes,
            elapsed,
        })
    }

    async fn execute_pair<E: Executor>(
        &self,
        executor: &E,
        executable: &E::Executable,
        mapper: &AngleMapper<'_, '_>,
        point: usize,
        episode: usize,
        expected_bits: usize,
    ) -> QksResult<(usize, usize, Vec<u8>)> {
        if self
            .cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
        {
            return Err(QksError::Cancelled);
        }

        let theta = mapper.angles(point, episode)?;
        let bindings = self.ansatz.bind(theta.view())?;

        let call = executor.run(executable, &bindings, self.config.shots);
        let result = match self.config.timeout() {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(ExecError::Timeout(limit))),
            None => call.await,
        };

        result
            .and_then(|bits| validate_outcome(&bits, expected_bits).map(|()| bits))
            .map(|bits| (point, episode, bits))
            .map_err(|source| QksError::Execution {
                point,
                episode,
                source,
            })
    }

    fn validate_dataset(&self, dataset: ArrayView2<'_, f64>) -> QksResult<()> {
        let (points, dim) = dataset.dim();
        if points == 0 {
            return Err(QksError::invalid("dataset has no points"));
        }
        if dim != self.ansatz.dim_input() {
            return Err(QksError::invalid(format!(
                "dataset has {dim} features, ansatz expects {}",
                self.ansatz.dim_input()
            )));
        }
        if let Some(((row, col), _)) = dataset.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(QksError::invalid(format!(
                "dataset value at ({row}, {col}) is not finite"
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Featurizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Featurizer")
            .field("ansatz", &self.ansatz)
            .field("config", &self.config)
            .field("progress", &self.progress.is_some())
            .field("cancellation", &self.cancellation)
            .finish()
    }
}

fn check_executable<X: Executable>(template: &CircuitTemplate, executable: &X) -> QksResult<()> {
    if executable.parameter_names() != template.parameters() {
        return Err(QksError::invalid(format!(
            "executable expects parameters {:?}, template provides {:?}",
            executable.parameter_names(),
            template.parameters()
        )));
    }
    if executable.num_clbits() != template.num_clbits() {
        return Err(QksError::invalid(format!(
            "executable measures {} bits, template measures {}",
            executable.num_clbits(),
            template.num_clbits()
        )));
    }
    Ok(())
}

/// Featurize `dataset` with one qubit per input feature and default settings.
pub async fn featurize<E: Executor>(
    executor: &E,
    dataset: ArrayView2<'_, f64>,
    num_episodes: usize,
) -> QksResult<Array2<u8>> {
    let ansatz = Ansatz::for_inputs(dataset.ncols())?;
    Featurizer::new(ansatz, FeaturizerConfig::with_episodes(num_episodes))?
        .featurize(executor, dataset)
        .await
}
