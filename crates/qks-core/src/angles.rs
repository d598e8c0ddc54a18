//! Per-(point, episode) angle computation.
//!
//! θ_{i,e} = Ω_e · u_i + β_e, where Ω_e is block-diagonal with one diagonal
//! block per qubit and the diagonal entries come from the episode's alphas.

use ndarray::{Array1, Array2, ArrayView2, s};

use crate::ansatz::BlockLayout;
use crate::error::{IndexKind, QksError, QksResult};
use crate::params::EpisodeParameters;

/// Maps (point, episode) pairs of one dataset to circuit angles.
///
/// Pure: holds only borrowed, immutable inputs.
#[derive(Debug, Clone, Copy)]
pub struct AngleMapper<'d, 'p> {
    dataset: ArrayView2<'d, f64>,
    params: &'p EpisodeParameters,
    layout: BlockLayout,
}

impl<'d, 'p> AngleMapper<'d, 'p> {
    /// Create a mapper over `dataset` (N × D).
    pub fn new(
        dataset: ArrayView2<'d, f64>,
        params: &'p EpisodeParameters,
        layout: BlockLayout,
    ) -> QksResult<Self> {
        let dim = dataset.ncols();
        if dim != params.dim_input() {
            return Err(QksError::invalid(format!(
                "dataset has {dim} features but episode parameters were drawn for {}",
                params.dim_input()
            )));
        }
        if layout.dim_input() != dim {
            return Err(QksError::invalid(format!(
                "block layout covers {} features, dataset has {dim}",
                layout.dim_input()
            )));
        }
        Ok(Self {
            dataset,
            params,
            layout,
        })
    }

    /// Number of points N.
    pub fn num_points(&self) -> usize {
        self.dataset.nrows()
    }

    /// Number of episodes E.
    pub fn num_episodes(&self) -> usize {
        self.params.num_episodes()
    }

    /// Compute θ for `point` in `episode`.
    pub fn angles(&self, point: usize, episode: usize) -> QksResult<Array1<f64>> {
        if point >= self.num_points() {
            return Err(QksError::OutOfRange {
                kind: IndexKind::Point,
                index: point,
                len: self.num_points(),
            });
        }
        let alphas = self.params.episode_alphas(episode)?;
        let beta = self.params.beta(episode)?;
        let u = self.dataset.row(point);

        let mut theta = Array1::zeros(self.layout.dim_input());
        for block in 0..self.layout.num_blocks() {
            let r = self.layout.block_range(block);
            let scaled = &alphas.slice(s![r.clone()]) * &u.slice(s![r.clone()]);
            theta
                .slice_mut(s![r.clone()])
                .assign(&(scaled + beta.slice(s![r])));
        }
        Ok(theta)
    }

    /// Ω for `episode` as an explicit D × D matrix.
    pub fn omega(&self, episode: usize) -> QksResult<Array2<f64>> {
        let alphas = self.params.episode_alphas(episode)?;
        let dim = self.layout.dim_input();
        let mut omega = Array2::zeros((dim, dim));
        for block in 0..self.layout.num_blocks() {
            for k in self.layout.block_range(block) {
                omega[[k, k]] = alphas[k];
            }
        }
        Ok(omega)
    }
}

/// Compute θ for one (point, episode) pair with a per-feature block layout.
pub fn angles(
    point: usize,
    episode: usize,
    dataset: ArrayView2<'_, f64>,
    params: &EpisodeParameters,
) -> QksResult<Array1<f64>> {
    let layout = BlockLayout::diagonal(dataset.ncols())?;
    AngleMapper::new(dataset, params, layout)?.angles(point, episode)
}
