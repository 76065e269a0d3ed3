//! DBSCAN density-based clustering with explicit noise labeling

use crate::error::{Error, Result};
use crate::utils::{euclidean_distance, validate_matrix};
use ndarray::ArrayView2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// Internal label encoding: UNCLASSIFIED has never been assigned,
// NOISE_LABEL is visited but not density-reachable (may be promoted to a
// border point later).
const UNCLASSIFIED: i64 = -2;
const NOISE_LABEL: i64 = -1;

/// DBSCAN clustering algorithm. Groups points that are mutually
/// density-reachable; points not reachable from any sufficiently dense
/// neighborhood are labeled noise rather than assigned to a cluster.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dbscan {
    /// Maximum distance between two points to count as neighbors
    pub eps: f64,
    /// Minimum neighborhood size (including the point itself) for a core point
    pub min_samples: usize,
}

/// Result of DBSCAN clustering
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DbscanResult {
    /// Per-point label: `Some(cluster_id)` or `None` for noise
    pub labels: Vec<Option<usize>>,
    /// Number of clusters discovered
    pub n_clusters: usize,
}

impl DbscanResult {
    /// Number of points labeled noise
    pub fn n_noise(&self) -> usize {
        self.labels.iter().filter(|l| l.is_none()).count()
    }
}

impl Default for Dbscan {
    fn default() -> Self {
        Self {
            eps: 0.5,
            min_samples: 5,
        }
    }
}

impl Dbscan {
    /// Create a new DBSCAN clusterer
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self { eps, min_samples }
    }

    /// Fit the algorithm and return per-point labels with noise marked
    pub fn fit(&self, data: ArrayView2<f64>) -> Result<DbscanResult> {
        validate_matrix(data)?;

        if self.eps <= 0.0 {
            return Err(Error::invalid_parameter("eps must be positive"));
        }

        if self.min_samples == 0 {
            return Err(Error::invalid_parameter("min_samples must be at least 1"));
        }

        let n = data.nrows();
        let mut labels = vec![UNCLASSIFIED; n];
        let mut visited = vec![false; n];
        let mut cluster_id: i64 = 0;

        for point_idx in 0..n {
            if visited[point_idx] {
                continue;
            }
            visited[point_idx] = true;

            let neighbors = self.region_query(data, point_idx);

            // min_samples includes the point itself
            if neighbors.len() + 1 < self.min_samples {
                labels[point_idx] = NOISE_LABEL;
                continue;
            }

            self.expand_cluster(data, point_idx, &neighbors, &mut labels, cluster_id, &mut visited);
            cluster_id += 1;
        }

        let labels = labels
            .into_iter()
            .map(|l| if l >= 0 { Some(l as usize) } else { None })
            .collect();

        Ok(DbscanResult {
            labels,
            n_clusters: cluster_id as usize,
        })
    }

    /// Find all neighbors of a point within eps
    fn region_query(&self, data: ArrayView2<f64>, point_idx: usize) -> Vec<usize> {
        let point = data.row(point_idx);
        (0..data.nrows())
            .filter(|&idx| {
                idx != point_idx && euclidean_distance(point, data.row(idx)) <= self.eps
            })
            .collect()
    }

    /// Grow a cluster outward from a core point using iterative expansion
    fn expand_cluster(
        &self,
        data: ArrayView2<f64>,
        point_idx: usize,
        neighbors: &[usize],
        labels: &mut [i64],
        cluster_id: i64,
        visited: &mut [bool],
    ) {
        labels[point_idx] = cluster_id;

        let mut to_process: Vec<usize> = neighbors.to_vec();

        while let Some(neighbor_idx) = to_process.pop() {
            // A point previously labeled noise can still become a border
            // point, so labels are assigned before the visited check.
            if labels[neighbor_idx] == UNCLASSIFIED || labels[neighbor_idx] == NOISE_LABEL {
                labels[neighbor_idx] = cluster_id;
            }

            if visited[neighbor_idx] {
                continue;
            }
            visited[neighbor_idx] = true;

            let neighbor_neighbors = self.region_query(data, neighbor_idx);

            if neighbor_neighbors.len() + 1 >= self.min_samples {
                for nn in neighbor_neighbors {
                    if !visited[nn] {
                        to_process.push(nn);
                    }
                }
            }
        }
    }
}
