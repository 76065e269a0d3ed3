//! Hyperparameter sweeps across the three clustering families, scored by
//! silhouette and reduced to a best configuration per family

use crate::dbscan::Dbscan;
use crate::error::{Error, Result};
use crate::kmeans::KMeans;
use crate::kmedoids::KMedoids;
use crate::metrics::silhouette_score;
use crate::utils::validate_matrix;
use ndarray::{Array2, ArrayView2};
use std::ops::RangeInclusive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Grid boundaries for the sweep. The defaults mirror the ranges the
/// exploratory analysis was designed around: k in 2..=10, eps from 0.1 to
/// 0.9 in steps of 0.1, min_samples in 2..=9.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SweepConfig {
    /// Candidate cluster counts for the partition-based families
    pub k_range: RangeInclusive<usize>,
    /// Candidate neighborhood radii for the density-based family
    pub eps_values: Vec<f64>,
    /// Candidate minimum neighborhood sizes for the density-based family
    pub min_samples_range: RangeInclusive<usize>,
    /// Seed threaded through every stochastic fit
    pub random_state: u64,
    /// Restarts per partition fit
    pub n_init: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            k_range: 2..=10,
            eps_values: (1..10).map(|i| i as f64 * 0.1).collect(),
            min_samples_range: 2..=9,
            random_state: 42,
            n_init: 10,
        }
    }
}

/// One scored grid point of a partition-based sweep
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartitionEntry {
    /// Cluster count
    pub k: usize,
    /// Silhouette score of the fit
    pub score: f64,
    /// Within-cluster sum of squares, recorded for the centroid variant
    /// only (elbow inspection)
    pub inertia: Option<f64>,
}

/// Best configuration of a partition-based sweep
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartitionBest {
    /// Selected cluster count
    pub k: usize,
    /// Its silhouette score
    pub score: f64,
}

/// Outcome of a partition-based sweep: the full score series for
/// diagnostic plotting plus the retained best configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartitionSweep {
    /// Scored grid points in ascending-k order; skipped ks are absent
    pub entries: Vec<PartitionEntry>,
    /// Best-scoring configuration, `None` when no k could be scored
    pub best: Option<PartitionBest>,
}

impl PartitionSweep {
    /// The best configuration, or a NoValidConfiguration error
    pub fn require_best(&self) -> Result<&PartitionBest> {
        self.best
            .as_ref()
            .ok_or_else(|| Error::no_valid_configuration("no k produced a scorable partition"))
    }
}

/// One scored grid point of the density-based sweep
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DensityEntry {
    /// Neighborhood radius
    pub eps: f64,
    /// Minimum neighborhood size
    pub min_samples: usize,
    /// Silhouette score over the non-noise points
    pub score: f64,
    /// Number of clusters found
    pub n_clusters: usize,
    /// Number of points labeled noise
    pub n_noise: usize,
}

/// Best configuration of the density-based sweep
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DensityBest {
    /// Selected neighborhood radius
    pub eps: f64,
    /// Selected minimum neighborhood size
    pub min_samples: usize,
    /// Its silhouette score
    pub score: f64,
}

/// Outcome of the density-based sweep. A grid where no combination yields
/// at least two non-noise clusters reports `best: None` rather than an
/// error.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DensitySweep {
    /// Scorable grid points in sweep order (ascending eps, then min_samples)
    pub entries: Vec<DensityEntry>,
    /// Best-scoring configuration, `None` when nothing was scorable
    pub best: Option<DensityBest>,
}

impl DensitySweep {
    /// The best configuration, or a NoValidConfiguration error
    pub fn require_best(&self) -> Result<&DensityBest> {
        self.best.as_ref().ok_or_else(|| {
            Error::no_valid_configuration(
                "no (eps, min_samples) combination produced at least two clusters",
            )
        })
    }
}

/// Combined report across the three families
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EvaluationReport {
    /// Centroid-based partition sweep (with inertia series)
    pub kmeans: PartitionSweep,
    /// Medoid-based partition sweep
    pub kmedoids: PartitionSweep,
    /// Density-based sweep
    pub dbscan: DensitySweep,
}

/// Runs each clustering family over its parameter grid on a fixed
/// embedding, scores every configuration by silhouette, and retains the
/// best per family. A grid point whose fit fails or whose score is
/// undefined is skipped, never aborting the sweep.
#[derive(Debug, Clone, Default)]
pub struct ClusterEvaluator {
    config: SweepConfig,
}

/// Returns true when the candidate score should replace the incumbent.
/// Strict comparison keeps the earlier grid point on ties, which makes the
/// selection deterministic in sweep order.
fn improves(score: f64, incumbent: Option<f64>) -> bool {
    match incumbent {
        Some(best) => score > best,
        None => true,
    }
}

impl ClusterEvaluator {
    /// Create an evaluator with the given sweep configuration
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    /// The sweep configuration in use
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Run all three family sweeps over the embedding
    pub fn evaluate(&self, embedding: ArrayView2<f64>) -> Result<EvaluationReport> {
        validate_matrix(embedding)?;

        Ok(EvaluationReport {
            kmeans: self.sweep_kmeans(embedding),
            kmedoids: self.sweep_kmedoids(embedding),
            dbscan: self.sweep_dbscan(embedding),
        })
    }

    /// Centroid-based sweep: silhouette plus inertia per k
    fn sweep_kmeans(&self, embedding: ArrayView2<f64>) -> PartitionSweep {
        self.sweep_partition(embedding, |k, seed, n_init| {
            let result = KMeans::new(k)
                .random_state(seed)
                .n_init(n_init)
                .fit(embedding)
                .ok()?;
            Some((result.labels.to_vec(), Some(result.inertia)))
        })
    }

    /// Medoid-based sweep: silhouette per k, no inertia series
    fn sweep_kmedoids(&self, embedding: ArrayView2<f64>) -> PartitionSweep {
        self.sweep_partition(embedding, |k, seed, n_init| {
            let result = KMedoids::new(k)
                .random_state(seed)
                .n_init(n_init)
                .fit(embedding)
                .ok()?;
            Some((result.labels.to_vec(), None))
        })
    }

    /// Shared partition-sweep driver. `fit` returns labels plus an
    /// optional inertia, or `None` when the grid point failed.
    fn sweep_partition<F>(&self, embedding: ArrayView2<f64>, fit: F) -> PartitionSweep
    where
        F: Fn(usize, u64, usize) -> Option<(Vec<usize>, Option<f64>)>,
    {
        let n_samples = embedding.nrows();
        let mut entries = Vec::new();
        let mut best: Option<PartitionBest> = None;

        for k in self.config.k_range.clone() {
            // Silhouette is undefined at k == n_samples; guard rather
            // than score
            if k < 2 || k + 1 > n_samples {
                continue;
            }

            let Some((labels, inertia)) =
                fit(k, self.config.random_state, self.config.n_init)
            else {
                continue;
            };

            let Ok(score) = silhouette_score(embedding, &labels) else {
                continue;
            };

            entries.push(PartitionEntry { k, score, inertia });

            if improves(score, best.as_ref().map(|b| b.score)) {
                best = Some(PartitionBest { k, score });
            }
        }

        PartitionSweep { entries, best }
    }

    /// Density-based sweep over the (eps, min_samples) grid. A combination
    /// is scored only when it yields at least two distinct non-noise
    /// clusters; noise points are excluded from the score.
    fn sweep_dbscan(&self, embedding: ArrayView2<f64>) -> DensitySweep {
        let mut entries = Vec::new();
        let mut best: Option<DensityBest> = None;

        for &eps in &self.config.eps_values {
            for min_samples in self.config.min_samples_range.clone() {
                let Ok(result) = Dbscan::new(eps, min_samples).fit(embedding) else {
                    continue;
                };

                if result.n_clusters < 2 {
                    continue;
                }

                let Some((clustered, labels)) = non_noise_subset(embedding, &result.labels)
                else {
                    continue;
                };

                let Ok(score) = silhouette_score(clustered.view(), &labels) else {
                    continue;
                };

                entries.push(DensityEntry {
                    eps,
                    min_samples,
                    score,
                    n_clusters: result.n_clusters,
                    n_noise: result.n_noise(),
                });

                if improves(score, best.as_ref().map(|b| b.score)) {
                    best = Some(DensityBest {
                        eps,
                        min_samples,
                        score,
                    });
                }
            }
        }

        DensitySweep { entries, best }
    }
}

/// Extract the rows and labels of the non-noise points. Returns `None`
/// when nothing survives the filter.
fn non_noise_subset(
    embedding: ArrayView2<f64>,
    labels: &[Option<usize>],
) -> Option<(Array2<f64>, Vec<usize>)> {
    let kept: Vec<(usize, usize)> = labels
        .iter()
        .enumerate()
        .filter_map(|(i, l)| l.map(|c| (i, c)))
        .collect();

    if kept.is_empty() {
        return None;
    }

    let mut subset = Array2::zeros((kept.len(), embedding.ncols()));
    let mut subset_labels = Vec::with_capacity(kept.len());

    for (row, &(i, c)) in kept.iter().enumerate() {
        subset.row_mut(row).assign(&embedding.row(i));
        subset_labels.push(c);
    }

    Some((subset, subset_labels))
}
