//! Internal cluster-validity scoring

use crate::error::{Error, Result};
use crate::utils::euclidean_distance;
use ndarray::ArrayView2;
use std::collections::BTreeSet;

/// Mean intra-cluster distance a(i): average distance from a point to the
/// other members of its own cluster. Zero for singleton clusters.
fn mean_intra_cluster_distance(
    data: ArrayView2<f64>,
    point_idx: usize,
    cluster: usize,
    labels: &[usize],
) -> f64 {
    let point = data.row(point_idx);
    let mut total = 0.0;
    let mut count = 0usize;

    for (j, &label) in labels.iter().enumerate() {
        if j != point_idx && label == cluster {
            total += euclidean_distance(point, data.row(j));
            count += 1;
        }
    }

    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Minimum mean distance b(i) from a point to the members of any other cluster
fn min_inter_cluster_distance(
    data: ArrayView2<f64>,
    point_idx: usize,
    cluster: usize,
    labels: &[usize],
    clusters: &BTreeSet<usize>,
) -> f64 {
    let point = data.row(point_idx);
    let mut min_mean = f64::INFINITY;

    for &other_cluster in clusters {
        if other_cluster == cluster {
            continue;
        }

        let mut total = 0.0;
        let mut count = 0usize;
        for (j, &label) in labels.iter().enumerate() {
            if label == other_cluster {
                total += euclidean_distance(point, data.row(j));
                count += 1;
            }
        }

        if count > 0 {
            min_mean = min_mean.min(total / count as f64);
        }
    }

    if min_mean.is_finite() {
        min_mean
    } else {
        0.0
    }
}

/// Silhouette coefficient for a single point: (b - a) / max(a, b)
fn silhouette_coefficient(a_i: f64, b_i: f64) -> f64 {
    let max_ab = a_i.max(b_i);
    if max_ab == 0.0 {
        0.0
    } else {
        (b_i - a_i) / max_ab
    }
}

/// Mean silhouette score over all points, in [-1, 1]; higher is better.
///
/// The score is undefined for fewer than two clusters or when the cluster
/// count reaches the sample count; those cases return an error so that a
/// parameter sweep can skip the configuration rather than compare a
/// meaningless value.
///
/// # Example
///
/// ```
/// use bistromap::metrics::silhouette_score;
/// use ndarray::arr2;
///
/// let data = arr2(&[[0.0, 0.0], [0.1, 0.1], [5.0, 5.0], [5.1, 5.1]]);
/// let labels = vec![0, 0, 1, 1];
/// let score = silhouette_score(data.view(), &labels).unwrap();
/// assert!(score > 0.5);
/// ```
pub fn silhouette_score(data: ArrayView2<f64>, labels: &[usize]) -> Result<f64> {
    let n_samples = data.nrows();

    if labels.len() != n_samples {
        return Err(Error::invalid_parameter(format!(
            "labels length {} does not match sample count {}",
            labels.len(),
            n_samples
        )));
    }

    if n_samples < 2 {
        return Err(Error::insufficient_samples(
            "silhouette score requires at least 2 samples",
        ));
    }

    // Cluster ids are not required to be contiguous, so the guards count
    // distinct observed labels
    let clusters: BTreeSet<usize> = labels.iter().copied().collect();

    if clusters.len() < 2 {
        return Err(Error::computation_error(
            "silhouette score requires at least 2 clusters",
        ));
    }

    if clusters.len() > n_samples - 1 {
        return Err(Error::computation_error(
            "silhouette score is undefined when every point is its own cluster",
        ));
    }

    let total: f64 = (0..n_samples)
        .map(|i| {
            let cluster = labels[i];
            let a_i = mean_intra_cluster_distance(data, i, cluster, labels);
            let b_i = min_inter_cluster_distance(data, i, cluster, labels, &clusters);
            silhouette_coefficient(a_i, b_i)
        })
        .sum();

    Ok(total / n_samples as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_well_separated_clusters_score_high() {
        let data = arr2(&[
            [0.0, 0.0],
            [0.1, 0.1],
            [0.2, 0.0],
            [10.0, 10.0],
            [10.1, 10.1],
            [10.2, 10.0],
        ]);
        let labels = vec![0, 0, 0, 1, 1, 1];

        let score = silhouette_score(data.view(), &labels).unwrap();
        assert!(score > 0.9);
    }

    #[test]
    fn test_bad_partition_scores_low() {
        let data = arr2(&[
            [0.0, 0.0],
            [0.1, 0.1],
            [10.0, 10.0],
            [10.1, 10.1],
        ]);
        // Labels cut across the true blobs
        let bad = vec![0, 1, 0, 1];
        let good = vec![0, 0, 1, 1];

        let bad_score = silhouette_score(data.view(), &bad).unwrap();
        let good_score = silhouette_score(data.view(), &good).unwrap();
        assert!(bad_score < good_score);
        assert!(bad_score < 0.0);
    }

    #[test]
    fn test_score_is_bounded() {
        let data = arr2(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]]);
        let labels = vec![0, 0, 1, 1];

        let score = silhouette_score(data.view(), &labels).unwrap();
        assert!((-1.0..=1.0).contains(&score));
    }

    #[test]
    fn test_single_cluster_is_undefined() {
        let data = arr2(&[[0.0, 0.0], [1.0, 1.0]]);
        assert!(silhouette_score(data.view(), &[0, 0]).is_err());
    }

    #[test]
    fn test_single_cluster_with_nonzero_label_is_undefined() {
        // One effective group regardless of the id it carries
        let data = arr2(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]]);
        assert!(silhouette_score(data.view(), &[1, 1, 1, 1]).is_err());
        assert!(silhouette_score(data.view(), &[7, 7, 7, 7]).is_err());
    }

    #[test]
    fn test_gapped_cluster_ids_score_like_contiguous() {
        let data = arr2(&[[0.0, 0.0], [0.1, 0.1], [5.0, 5.0], [5.1, 5.1]]);

        let gapped = silhouette_score(data.view(), &[0, 0, 3, 3]).unwrap();
        let contiguous = silhouette_score(data.view(), &[0, 0, 1, 1]).unwrap();
        assert_eq!(gapped, contiguous);
        assert!(gapped > 0.5);
    }

    #[test]
    fn test_every_point_own_cluster_is_undefined() {
        let data = arr2(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
        assert!(silhouette_score(data.view(), &[0, 1, 2]).is_err());
    }

    #[test]
    fn test_label_length_mismatch() {
        let data = arr2(&[[0.0, 0.0], [1.0, 1.0]]);
        assert!(silhouette_score(data.view(), &[0]).is_err());
    }
}
