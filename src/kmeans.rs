//! K-means clustering (Lloyd iteration) over numeric embeddings

use crate::error::{Error, Result};
use crate::utils::{
    assignments_equal, get_cluster_indices, squared_distance, validate_matrix,
    validate_parameters,
};
use ndarray::{Array1, Array2, ArrayView2};
use rand::prelude::*;
use rayon::prelude::*;
use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// K-means clustering algorithm for numeric data
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KMeans {
    /// Number of clusters
    pub n_clusters: usize,
    /// Maximum number of iterations
    pub max_iter: usize,
    /// Tolerance on total centroid movement for convergence
    pub tol: f64,
    /// Number of initialization runs
    pub n_init: usize,
    /// Random seed for reproducibility
    pub random_state: Option<u64>,
    /// Number of parallel jobs
    pub n_jobs: Option<usize>,
    /// Enable verbose output
    pub verbose: bool,
}

/// Result of k-means clustering
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KMeansResult {
    /// Cluster labels for each data point
    pub labels: Array1<usize>,
    /// Final cluster centroids
    pub centroids: Array2<f64>,
    /// Number of iterations until convergence
    pub n_iter: usize,
    /// Total within-cluster sum of squared distances
    pub inertia: f64,
    /// Whether the algorithm converged
    pub converged: bool,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            n_clusters: 8,
            max_iter: 300,
            tol: 1e-4,
            n_init: 10,
            random_state: None,
            n_jobs: None,
            verbose: false,
        }
    }
}

impl KMeans {
    /// Create a new k-means clusterer with the specified number of clusters
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

    /// Set the convergence tolerance
    pub fn tolerance(mut self, tol: f64) -> Self {
        self.tol = tol;
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

    /// Fit the k-means algorithm to the data, running `n_init` restarts and
    /// keeping the result with the lowest inertia
    pub fn fit(&self, data: ArrayView2<f64>) -> Result<KMeansResult> {
        self.validate_input(data)?;

        let results: Vec<Result<KMeansResult>> = if self.should_use_parallel() {
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

        let mut best_result: Option<KMeansResult> = None;
        let mut best_inertia = f64::INFINITY;

        for result in results {
            let result = result?;
            if result.inertia < best_inertia {
                best_inertia = result.inertia;
                best_result = Some(result);
            }
        }

        best_result.ok_or_else(|| Error::computation_error("no successful k-means runs"))
    }

    /// Fit the model and return only the cluster labels
    pub fn fit_predict(&self, data: ArrayView2<f64>) -> Result<Array1<usize>> {
        let result = self.fit(data)?;
        Ok(result.labels)
    }

    /// Single Lloyd run from one random initialization
    fn fit_single(&self, data: ArrayView2<f64>, seed: u64) -> Result<KMeansResult> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut centroids = self.initialize_centroids(data, &mut rng);

        let mut previous_labels: Option<Vec<usize>> = None;
        let mut n_iter = 0;
        let mut converged = false;

        for iter in 0..self.max_iter {
            n_iter = iter + 1;

            let labels = self.assign_points(data, centroids.view());

            if let Some(ref prev_labels) = previous_labels {
                if assignments_equal(&labels, prev_labels) {
                    converged = true;
                    if self.verbose {
                        println!("K-means converged after {} iterations", n_iter);
                    }
                    break;
                }
            }

            let new_centroids = self.update_centroids(data, &labels, &mut rng);

            let shift: f64 = centroids
                .rows()
                .into_iter()
                .zip(new_centroids.rows())
                .map(|(old, new)| squared_distance(old, new))
                .sum();

            centroids = new_centroids;
            previous_labels = Some(labels);

            if shift < self.tol {
                converged = true;
                if self.verbose {
                    println!(
                        "K-means converged (centroid shift < tol) after {} iterations",
                        n_iter
                    );
                }
                break;
            }
        }

        let final_labels = self.assign_points(data, centroids.view());
        let inertia = final_labels
            .iter()
            .enumerate()
            .map(|(i, &c)| squared_distance(data.row(i), centroids.row(c)))
            .sum();

        Ok(KMeansResult {
            labels: Array1::from_vec(final_labels),
            centroids,
            n_iter,
            inertia,
            converged,
        })
    }

    /// Select k distinct data rows as initial centroids
    fn initialize_centroids<R: Rng>(&self, data: ArrayView2<f64>, rng: &mut R) -> Array2<f64> {
        let n_points = data.nrows();
        let mut selected_indices = Vec::with_capacity(self.n_clusters);
        let mut seen = HashSet::new();

        while selected_indices.len() < self.n_clusters {
            let idx = rng.gen_range(0..n_points);
            if seen.insert(idx) {
                selected_indices.push(idx);
            }
        }

        let mut centroids = Array2::zeros((self.n_clusters, data.ncols()));
        for (i, &data_idx) in selected_indices.iter().enumerate() {
            centroids.row_mut(i).assign(&data.row(data_idx));
        }

        centroids
    }

    /// Assign each point to its nearest centroid
    fn assign_points(&self, data: ArrayView2<f64>, centroids: ArrayView2<f64>) -> Vec<usize> {
        data.rows()
            .into_iter()
            .map(|point| {
                let mut best = 0;
                let mut best_distance = f64::INFINITY;
                for (c, centroid) in centroids.rows().into_iter().enumerate() {
                    let d = squared_distance(point, centroid);
                    if d < best_distance {
                        best_distance = d;
                        best = c;
                    }
                }
                best
            })
            .collect()
    }

    /// Recompute each centroid as the mean of its members; an empty cluster
    /// is reseeded from a random data row
    fn update_centroids<R: Rng>(
        &self,
        data: ArrayView2<f64>,
        labels: &[usize],
        rng: &mut R,
    ) -> Array2<f64> {
        let cluster_indices = get_cluster_indices(labels, self.n_clusters);
        let mut centroids = Array2::zeros((self.n_clusters, data.ncols()));

        for (cluster_id, indices) in cluster_indices.iter().enumerate() {
            if indices.is_empty() {
                let random_idx = rng.gen_range(0..data.nrows());
                centroids.row_mut(cluster_id).assign(&data.row(random_idx));
                continue;
            }

            for &row_idx in indices {
                let point = data.row(row_idx);
                for (j, &v) in point.iter().enumerate() {
                    centroids[[cluster_id, j]] += v;
                }
            }

            let count = indices.len() as f64;
            for j in 0..data.ncols() {
                centroids[[cluster_id, j]] /= count;
            }
        }

        centroids
    }

    /// Validate input parameters and data
    fn validate_input(&self, data: ArrayView2<f64>) -> Result<()> {
        validate_parameters(self.n_clusters, self.max_iter, self.tol, self.n_init)?;
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
