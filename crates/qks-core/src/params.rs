//! Random episode parameters (the shared Ω and β draws).
//!
//! One [`EpisodeParameters`] value is drawn per featurization run and reused,
//! unmodified, for every data point. Regenerating it per point would destroy
//! the shared random projection the features depend on.

use std::f64::consts::TAU;
use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1, s};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IndexKind, QksError, QksResult};

/// The random affine parameters for every episode of a run.
///
/// `alphas` is stored flat: the scale applied to feature `k` in episode `e`
/// lives at index `e * dim_input + k`. `betas` has one row per episode.
///
/// Deserialization applies the same shape checks as
/// [`from_parts`](Self::from_parts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEpisodeParameters")]
pub struct EpisodeParameters {
    dim_input: usize,
    num_episodes: usize,
    seed: u64,
    alphas: Array1<f64>,
    betas: Array2<f64>,
}

/// Unchecked wire form of [`EpisodeParameters`].
#[derive(Deserialize)]
struct RawEpisodeParameters {
    dim_input: usize,
    num_episodes: usize,
    seed: u64,
    alphas: Array1<f64>,
    betas: Array2<f64>,
}

impl TryFrom<RawEpisodeParameters> for EpisodeParameters {
    type Error = QksError;

    fn try_from(raw: RawEpisodeParameters) -> QksResult<Self> {
        let params = Self {
            dim_input: raw.dim_input,
            num_episodes: raw.num_episodes,
            seed: raw.seed,
            alphas: raw.alphas,
            betas: raw.betas,
        };
        params.check()?;
        Ok(params)
    }
}

/// Draw fresh episode parameters.
///
/// `alphas` are standard normal, `betas` uniform on `[0, 2π)`. With
/// `seed == None` a seed is taken from OS entropy; either way the seed used
/// is recorded on the result so the draw can be replayed.
pub fn generate(
    dim_input: usize,
    num_episodes: usize,
    seed: Option<u64>,
) -> QksResult<EpisodeParameters> {
    if dim_input == 0 {
        return Err(QksError::invalid("input dimension must be positive"));
    }
    if num_episodes == 0 {
        return Err(QksError::invalid("episode count must be positive"));
    }

    let seed = seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    let alphas: Array1<f64> = (0..dim_input * num_episodes)
        .map(|_| rng.sample::<f64, _>(StandardNormal))
        .collect();
    let betas = Array2::from_shape_fn((num_episodes, dim_input), |_| rng.gen_range(0.0..TAU));

    debug!(dim_input, num_episodes, seed, "Generated episode parameters");

    Ok(EpisodeParameters {
        dim_input,
        num_episodes,
        seed,
        alphas,
        betas,
    })
}

impl EpisodeParameters {
    /// Assemble parameters from explicit values.
    ///
    /// `alphas` must hold `num_episodes * dim_input` entries and `betas` must
    /// be `num_episodes × dim_input`.
    pub fn from_parts(alphas: Array1<f64>, betas: Array2<f64>, seed: u64) -> QksResult<Self> {
        let (num_episodes, dim_input) = betas.dim();
        let params = Self {
            dim_input,
            num_episodes,
            seed,
            alphas,
            betas,
        };
        params.check()?;
        Ok(params)
    }

    /// Input dimension D.
    pub fn dim_input(&self) -> usize {
        self.dim_input
    }

    /// Episode count E.
    pub fn num_episodes(&self) -> usize {
        self.num_episodes
    }

    /// Seed the parameters were drawn from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// All alphas, flat, episode-major.
    pub fn alphas(&self) -> ArrayView1<'_, f64> {
        self.alphas.view()
    }

    /// All betas, one row per episode.
    pub fn betas(&self) -> &Array2<f64> {
        &self.betas
    }

    /// The diagonal of Ω for `episode`.
    pub fn episode_alphas(&self, episode: usize) -> QksResult<ArrayView1<'_, f64>> {
        self.check_episode(episode)?;
        let start = episode * self.dim_input;
        Ok(self.alphas.slice(s![start..start + self.dim_input]))
    }

    /// β for `episode`.
    pub fn beta(&self, episode: usize) -> QksResult<ArrayView1<'_, f64>> {
        self.check_episode(episode)?;
        Ok(self.betas.row(episode))
    }

    /// Write the parameters as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> QksResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read parameters previously written by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> QksResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn check_episode(&self, episode: usize) -> QksResult<()> {
        if episode >= self.num_episodes {
            return Err(QksError::OutOfRange {
                kind: IndexKind::Episode,
                index: episode,
                len: self.num_episodes,
            });
        }
        Ok(())
    }

    fn check(&self) -> QksResult<()> {
        if self.dim_input == 0 || self.num_episodes == 0 {
            return Err(QksError::invalid(
                "episode parameters must have positive dimension and episode count",
            ));
        }
        if self.betas.dim() != (self.num_episodes, self.dim_input) {
            return Err(QksError::invalid(format!(
                "betas have shape {:?}, expected ({}, {})",
                self.betas.dim(),
                self.num_episodes,
                self.dim_input
            )));
        }
        if self.alphas.len() != self.num_episodes * self.dim_input {
            return Err(QksError::invalid(format!(
                "alphas have {} entries, expected {}",
                self.alphas.len(),
                self.num_episodes * self.dim_input
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shapes() {
        let params = generate(2, 5, Some(7)).unwrap();
        assert_eq!(params.dim_input(), 2);
        assert_eq!(params.num_episodes(), 5);
        assert_eq!(params.alphas().len(), 10);
        assert_eq!(params.betas().dim(), (5, 2));
    }

    #[test]
    fn test_generate_rejects_zero_counts() {
        assert!(matches!(
            generate(0, 5, None),
            Err(QksError::InvalidArgument(_))
        ));
        assert!(matches!(
            generate(2, 0, None),
            Err(QksError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let a = generate(3, 20, Some(1234)).unwrap();
        let b = generate(3, 20, Some(1234)).unwrap();
        let c = generate(3, 20, Some(1235)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.alphas(), c.alphas());
    }

    #[test]
    fn test_unseeded_generation_records_seed() {
        let params = generate(2, 4, None).unwrap();
        let replay = generate(2, 4, Some(params.seed())).unwrap();
        assert_eq!(params, replay);
    }

    #[test]
    fn test_betas_within_full_turn() {
        let params = generate(2, 2000, Some(3)).unwrap();
        assert!(params.betas().iter().all(|&b| (0.0..TAU).contains(&b)));
    }

    #[test]
    fn test_alphas_standard_normal_moments() {
        let params = generate(2, 20_000, Some(99)).unwrap();
        let alphas = params.alphas();
        let n = alphas.len() as f64;
        let mean = alphas.sum() / n;
        let variance = alphas.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / (n - 1.0);
        assert!(mean.abs() < 0.03, "mean {mean}");
        assert!((variance - 1.0).abs() < 0.05, "variance {variance}");
    }

    #[test]
    fn test_episode_views() {
        let alphas = Array1::from(vec![1.0, 2.0, 3.0, 4.0]);
        let betas = Array2::from_shape_vec((2, 2), vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let params = EpisodeParameters::from_parts(alphas, betas, 0).unwrap();

        assert_eq!(params.episode_alphas(1).unwrap().to_vec(), vec![3.0, 4.0]);
        assert_eq!(params.beta(0).unwrap().to_vec(), vec![0.1, 0.2]);
        assert!(matches!(
            params.beta(2),
            Err(QksError::OutOfRange {
                kind: IndexKind::Episode,
                index: 2,
                len: 2
            })
        ));
    }

    #[test]
    fn test_from_parts_rejects_mismatched_shapes() {
        let alphas = Array1::from(vec![1.0, 2.0, 3.0]);
        let betas = Array2::zeros((2, 2));
        assert!(matches!(
            EpisodeParameters::from_parts(alphas, betas, 0),
            Err(QksError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_save_load_preserves_parameters() {
        let params = generate(2, 3, Some(11)).unwrap();
        let path = std::env::temp_dir().join(format!("qks-params-{}.json", std::process::id()));

        params.save(&path).unwrap();
        let loaded = EpisodeParameters::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(params, loaded);
    }

    #[test]
    fn test_deserialize_rejects_short_alphas() {
        let mut value = serde_json::to_value(generate(2, 3, Some(1)).unwrap()).unwrap();
        value["alphas"] = serde_json::to_value(Array1::from(vec![0.5, -0.5])).unwrap();

        let err = serde_json::from_value::<EpisodeParameters>(value).unwrap_err();
        assert!(err.to_string().contains("alphas"), "{err}");
    }

    #[test]
    fn test_deserialize_rejects_zero_episodes() {
        let mut value = serde_json::to_value(generate(2, 1, Some(1)).unwrap()).unwrap();
        value["num_episodes"] = serde_json::json!(0);
        value["alphas"] = serde_json::to_value(Array1::<f64>::zeros(0)).unwrap();
        value["betas"] = serde_json::to_value(Array2::<f64>::zeros((0, 2))).unwrap();

        assert!(serde_json::from_value::<EpisodeParameters>(value).is_err());
    }

    #[test]
    fn test_load_rejects_inconsistent_file() {
        let params = generate(2, 2, Some(3)).unwrap();
        let mut value = serde_json::to_value(&params).unwrap();
        value["dim_input"] = serde_json::json!(3);
        let path =
            std::env::temp_dir().join(format!("qks-bad-params-{}.json", std::process::id()));
        std::fs::write(&path, value.to_string()).unwrap();

        let result = EpisodeParameters::load(&path);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(QksError::Serialization(_))));
    }
}
