//! K-medoids clustering: partitioning around actual member points

use crate::error::{Error, Result};
use crate::utils::{
    assignments_equal, euclidean_distance, get_cluster_indices, validate_matrix,
    validate_parameters,
};
use ndarray::{Array1, ArrayView2};
use rand::prelude::*;
use rayon::prelude::*;
use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// K-medoids clustering algorithm. Unlike k-means the representative point
/// of each cluster is an actual dataset member, which makes the result
/// robust to outliers at the price of a costlier update step.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KMedoids {
    /// Number of clusters
    pub n_clusters: usize,
    /// Maximum number of iterations
    pub max_iter: usize,
    /// Number of initialization runs
    pub n_init: usize,
    /// Random seed for reproducibility
    pub random_state: Option<u64>,
    /// Number of parallel jobs
    pub n_jobs: Option<usize>,
    /// Enable verbose output
    pub verbose: bool,
}

/// Result of k-medoids clustering
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KMedoidsResult {
    /// Cluster labels for each data point
    pub labels: Array1<usize>,
    /// Row indices of the final medoids
    pub medoid_indices: Array1<usize>,
    /// Number of iterations until convergence
    pub n_iter: usize,
    /// Total distance from each point to its medoid
    pub cost: f64,
    /// Whether the algorithm converged
    pub converged: bool,
}

impl Default for KMedoids {
    fn default() -> Self {
        Self {
            n_clusters: 8,
            max_iter: 300,
            n_init: 10,
            random_state: None,
            n_jobs: None,
            verbose: false,
        }
    }
}

impl KMedoids {
    /// Create a new k-medoids clusterer with the specified number of clusters
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            ..Default::default()
        }
    }

    /// Set the maximum number of iterations
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the number of initialization runs
    pub fn n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Set the random seed for reproducibility
    pub fn random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Set the number of parallel jobs
    pub fn n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = Some(n_jobs);
        self
    }

    /// Enable verbose output
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Fit the k-medoids algorithm, running `n_init` restarts and keeping
    /// the lowest-cost result
    pub fn fit(&self, data: ArrayView2<f64>) -> Result<KMedoidsResult> {
        self.validate_input(data)?;

        let results: Vec<Result<KMedoidsResult>> = if self.should_use_parallel() {
            (0..self.n_init)
                .into_par_iter()
                .map(|i| {
                    let seed = self.random_state.unwrap_or(0) + i as u64;
                    self.fit_single(data, seed)
                })
                .collect()
        } else {
            (0..self.n_init)
                .map(|i| {
                    let seed = self.random_state.unwrap_or(0) + i as u64;
                    self.fit_single(data, seed)
                })
                .collect()
        };

        let mut best_result: Option<KMedoidsResult> = None;
        let mut best_cost = f64::INFINITY;

        for result in results {
            let result = result?;
            if result.cost < best_cost {
                best_cost = result.cost;
                best_result = Some(result);
            }
        }

        best_result.ok_or_else(|| Error::computation_error("no successful k-medoids runs"))
    }

    /// Fit the model and return only the cluster labels
    pub fn fit_predict(&self, data: ArrayView2<f64>) -> Result<Array1<usize>> {
        let result = self.fit(data)?;
        Ok(result.labels)
    }

    /// Single alternating run from one random initialization
    fn fit_single(&self, data: ArrayView2<f64>, seed: u64) -> Result<KMedoidsResult> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut medoids = self.initialize_medoids(data.nrows(), &mut rng);

        let mut previous_labels: Option<Vec<usize>> = None;
        let mut n_iter = 0;
        let mut converged = false;

        for iter in 0..self.max_iter {
            n_iter = iter + 1;

            let labels = self.assign_points(data, &medoids);

            if let Some(ref prev_labels) = previous_labels {
                if assignments_equal(&labels, prev_labels) {
                    converged = true;
                    if self.verbose {
                        println!("K-medoids converged after {} iterations", n_iter);
                    }
                    break;
                }
            }

            medoids = self.update_medoids(data, &labels, &medoids);
            previous_labels = Some(labels);
        }

        let final_labels = self.assign_points(data, &medoids);
        let cost = final_labels
            .iter()
            .enumerate()
            .map(|(i, &c)| euclidean_distance(data.row(i), data.row(medoids[c])))
            .sum();

        Ok(KMedoidsResult {
            labels: Array1::from_vec(final_labels),
            medoid_indices: Array1::from_vec(medoids),
            n_iter,
            cost,
            converged,
        })
    }

    /// Select k distinct row indices as initial medoids
    fn initialize_medoids<R: Rng>(&self, n_points: usize, rng: &mut R) -> Vec<usize> {
        let mut selected = Vec::with_capacity(self.n_clusters);
        let mut seen = HashSet::new();

        while selected.len() < self.n_clusters {
            let idx = rng.gen_range(0..n_points);
            if seen.insert(idx) {
                selected.push(idx);
            }
        }

        selected
    }

    /// Assign each point to its nearest medoid
    fn assign_points(&self, data: ArrayView2<f64>, medoids: &[usize]) -> Vec<usize> {
        data.rows()
            .into_iter()
            .map(|point| {
                let mut best = 0;
                let mut best_distance = f64::INFINITY;
                for (c, &medoid_idx) in medoids.iter().enumerate() {
                    let d = euclidean_distance(point, data.row(medoid_idx));
                    if d < best_distance {
                        best_distance = d;
                        best = c;
                    }
                }
                best
            })
            .collect()
    }

    /// Replace each medoid with the member point minimizing the total
    /// distance to the rest of its cluster
    fn update_medoids(
        &self,
        data: ArrayView2<f64>,
        labels: &[usize],
        current: &[usize],
    ) -> Vec<usize> {
        let cluster_indices = get_cluster_indices(labels, self.n_clusters);
        let mut medoids = current.to_vec();

        for (cluster_id, indices) in cluster_indices.iter().enumerate() {
            // An empty cluster keeps its previous medoid
            if indices.is_empty() {
                continue;
            }

            let mut best_idx = indices[0];
            let mut best_total = f64::INFINITY;

            for &candidate in indices {
                let total: f64 = indices
                    .iter()
                    .map(|&other| euclidean_distance(data.row(candidate), data.row(other)))
                    .sum();
                if total < best_total {
                    best_total = total;
                    best_idx = candidate;
                }
            }

            medoids[cluster_id] = best_idx;
        }

        medoids
    }

    /// Validate input parameters and data
    fn validate_input(&self, data: ArrayView2<f64>) -> Result<()> {
        validate_parameters(self.n_clusters, self.max_iter, 0.0, self.n_init)?;
        validate_matrix(data)?;

        if self.n_clusters > data.nrows() {
            return Err(Error::insufficient_samples(format!(
                "cannot fit {} clusters on {} data points",
                self.n_clusters,
                data.nrows()
            )));
        }

        Ok(())
    }

    /// Determine if parallel processing should be used
    fn should_use_parallel(&self) -> bool {
        match self.n_jobs {
            Some(1) => false,
            Some(_) => true,
            None => self.n_init > 1,
        }
    }
}
