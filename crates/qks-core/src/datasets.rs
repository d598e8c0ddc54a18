//! Synthetic datasets and dataset construction helpers.
//!
//! The "picture frames" set is two concentric square frames. No line
//! separates the inner frame from the outer one in the input plane, which is
//! what makes it a useful check on the featurization.

use ndarray::{Array1, Array2, Axis, concatenate};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{QksError, QksResult};

/// Build an N × D dataset from rows, rejecting ragged input.
pub fn from_rows(rows: &[Vec<f64>]) -> QksResult<Array2<f64>> {
    let dim = rows.first().map_or(0, Vec::len);
    if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != dim) {
        return Err(QksError::invalid(format!(
            "row {index} has {} features, expected {dim}",
            row.len()
        )));
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), dim), flat).map_err(|e| QksError::invalid(e.to_string()))
}

/// Points of a square frame centred at the origin.
///
/// `num_points / 4` points lie along each side. Along-side coordinates are
/// evenly spaced over `[-side / 2, side / 2]`; the across-side coordinate is
/// jittered uniformly within `thickness / 2` of the side. Rows are ordered
/// bottom, top, left, right. The same jitter draws are shared between the
/// horizontal and vertical sides.
pub fn generate_frame<R: Rng>(
    num_points: usize,
    side: f64,
    thickness: f64,
    rng: &mut R,
) -> QksResult<Array2<f64>> {
    if !side.is_finite() || side <= 0.0 {
        return Err(QksError::invalid("frame side must be positive"));
    }
    if !thickness.is_finite() || thickness < 0.0 {
        return Err(QksError::invalid("frame thickness must be non-negative"));
    }

    let per_side = num_points / 4;
    let half = side / 2.0;
    let along = Array1::linspace(-half, half, per_side);
    let mut jitter = || -> Array1<f64> {
        (0..per_side)
            .map(|_| {
                if thickness > 0.0 {
                    rng.gen_range(-thickness / 2.0..thickness / 2.0)
                } else {
                    0.0
                }
            })
            .collect()
    };
    let lower = jitter() - half;
    let upper = jitter() + half;

    let mut frame = Array2::zeros((4 * per_side, 2));
    for (j, &a) in along.iter().enumerate() {
        frame[[j, 0]] = a;
        frame[[j, 1]] = lower[j];
        frame[[per_side + j, 0]] = a;
        frame[[per_side + j, 1]] = upper[j];
        frame[[2 * per_side + j, 0]] = lower[j];
        frame[[2 * per_side + j, 1]] = a;
        frame[[3 * per_side + j, 0]] = upper[j];
        frame[[3 * per_side + j, 1]] = a;
    }
    Ok(frame)
}

/// Shape of one frame in [`picture_frames`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSpec {
    /// Side length.
    pub side: f64,
    /// Width of the band the points are jittered across.
    pub thickness: f64,
}

/// Inner frame (label 0).
pub const INNER_FRAME: FrameSpec = FrameSpec {
    side: 1.0,
    thickness: 0.2,
};

/// Outer frame (label 1).
pub const OUTER_FRAME: FrameSpec = FrameSpec {
    side: 2.0,
    thickness: 0.2,
};

/// A labelled dataset.
#[derive(Debug, Clone)]
pub struct LabelledData {
    /// N × 2 points.
    pub points: Array2<f64>,
    /// One 0/1 label per point.
    pub labels: Array1<u8>,
}

/// Inner frame (label 0) stacked on top of the outer frame (label 1).
pub fn picture_frames<R: Rng>(
    points_per_frame: usize,
    rng: &mut R,
) -> QksResult<LabelledData> {
    picture_frames_with(points_per_frame, INNER_FRAME, OUTER_FRAME, rng)
}

/// [`picture_frames`] with explicit frame shapes.
pub fn picture_frames_with<R: Rng>(
    points_per_frame: usize,
    inner: FrameSpec,
    outer: FrameSpec,
    rng: &mut R,
) -> QksResult<LabelledData> {
    let inner_points = generate_frame(points_per_frame, inner.side, inner.thickness, rng)?;
    let outer_points = generate_frame(points_per_frame, outer.side, outer.thickness, rng)?;

    let points = concatenate(Axis(0), &[inner_points.view(), outer_points.view()])
        .map_err(|e| QksError::invalid(e.to_string()))?;
    let labels = std::iter::repeat_n(0u8, inner_points.nrows())
        .chain(std::iter::repeat_n(1u8, outer_points.nrows()))
        .collect();

    Ok(LabelledData { points, labels })
}
