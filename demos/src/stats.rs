//! Summary statistics over binary feature matrices.

use std::collections::BTreeMap;

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use qks_core::{QksError, QksResult};

/// Mean feature vector of each class, keyed by label.
pub fn class_means(
    features: ArrayView2<'_, u8>,
    labels: ArrayView1<'_, u8>,
) -> QksResult<BTreeMap<u8, Array1<f64>>> {
    if features.nrows() != labels.len() {
        return Err(QksError::invalid(format!(
            "{} feature rows but {} labels",
            features.nrows(),
            labels.len()
        )));
    }

    let mut sums: BTreeMap<u8, (Array1<f64>, usize)> = BTreeMap::new();
    for (row, &label) in features.axis_iter(Axis(0)).zip(labels) {
        let (sum, count) = sums
            .entry(label)
            .or_insert_with(|| (Array1::zeros(features.ncols()), 0));
        *sum += &row.mapv(f64::from);
        *count += 1;
    }

    Ok(sums
        .into_iter()
        .map(|(label, (sum, count))| (label, sum / count as f64))
        .collect())
}

/// Fraction of ones in each class, averaged over all features.
pub fn mean_activation(
    features: ArrayView2<'_, u8>,
    labels: ArrayView1<'_, u8>,
) -> QksResult<BTreeMap<u8, f64>> {
    Ok(class_means(features, labels)?
        .into_iter()
        .map(|(label, mean)| (label, mean.mean().unwrap_or(0.0)))
        .collect())
}

/// Training accuracy of a nearest-centroid classifier on the features.
///
/// Each row is assigned the label whose class mean is closest in squared
/// Euclidean distance.
pub fn nearest_centroid_accuracy(
    features: ArrayView2<'_, u8>,
    labels: ArrayView1<'_, u8>,
) -> QksResult<f64> {
    let means = class_means(features, labels)?;
    if means.is_empty() {
        return Err(QksError::invalid("no labelled rows"));
    }

    let correct = features
        .axis_iter(Axis(0))
        .zip(labels)
        .filter(|(row, label)| {
            let row = row.mapv(f64::from);
            let predicted = means
                .iter()
                .map(|(&l, mean)| (l, (&row - mean).mapv(|d| d * d).sum()))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(l, _)| l);
            predicted == Some(**label)
        })
        .count();

    Ok(correct as f64 / labels.len() as f64)
}
