//! Dimensionality reduction: a linear variance-maximizing projection for
//! clustering and a non-linear neighborhood-preserving embedding for
//! visualization

use crate::error::{Error, Result};
use crate::utils::{squared_distance, validate_matrix};
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, ArrayView2};
use rand::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Principal component analysis. Projects the encoded matrix onto the
/// directions of maximum variance; the projection feeds the clustering
/// sweep downstream.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pca {
    /// Number of components to keep
    pub n_components: usize,
}

/// Fitted PCA state: feature means and the principal axes, returned from
/// `fit` and passed explicitly into `transform`
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PcaModel {
    mean: Array1<f64>,
    components: Array2<f64>,
    explained_variance_ratio: Vec<f64>,
}

impl PcaModel {
    /// Principal axes, one row per component
    pub fn components(&self) -> &Array2<f64> {
        &self.components
    }

    /// Fraction of total variance captured by each component
    pub fn explained_variance_ratio(&self) -> &[f64] {
        &self.explained_variance_ratio
    }

    /// Project data onto the fitted principal axes
    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(Error::invalid_feature(format!(
                "expected {} features, got {}",
                self.mean.len(),
                x.ncols()
            )));
        }

        let centered = &x - &self.mean;
        Ok(centered.dot(&self.components.t()))
    }
}

impl Pca {
    /// Create a PCA reducer targeting the given number of components
    pub fn new(n_components: usize) -> Self {
        Self { n_components }
    }

    /// Fit principal axes on the data.
    ///
    /// The eigendecomposition is exact and the component signs follow a
    /// fixed convention (largest-magnitude loading is non-negative), so the
    /// projection is identical across runs on identical input.
    pub fn fit(&self, x: ArrayView2<f64>) -> Result<PcaModel> {
        validate_matrix(x)?;

        let (n_samples, n_features) = x.dim();

        if self.n_components == 0 {
            return Err(Error::invalid_parameter("n_components must be > 0"));
        }

        if self.n_components > n_features {
            return Err(Error::invalid_parameter(
                "n_components cannot exceed the number of features",
            ));
        }

        if n_samples < self.n_components + 1 {
            return Err(Error::insufficient_samples(format!(
                "projection to {} dimensions requires at least {} samples, got {}",
                self.n_components,
                self.n_components + 1,
                n_samples
            )));
        }

        let mean = x.sum_axis(ndarray::Axis(0)) / n_samples as f64;
        let centered = &x - &mean;

        // Covariance matrix, then exact symmetric eigendecomposition
        let cov = centered.t().dot(&centered) / (n_samples - 1) as f64;
        let cov_matrix = DMatrix::from_row_slice(
            n_features,
            n_features,
            cov.as_slice().ok_or_else(|| {
                Error::computation_error("covariance matrix is not contiguous")
            })?,
        );
        let eigen = SymmetricEigen::new(cov_matrix);

        let mut order: Vec<usize> = (0..n_features).collect();
        order.sort_by(|&a, &b| {
            eigen.eigenvalues[b]
                .partial_cmp(&eigen.eigenvalues[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut components = Array2::zeros((self.n_components, n_features));
        let mut explained = Vec::with_capacity(self.n_components);

        for (row, &idx) in order.iter().take(self.n_components).enumerate() {
            explained.push(eigen.eigenvalues[idx].max(0.0));
            for j in 0..n_features {
                components[[row, j]] = eigen.eigenvectors[(j, idx)];
            }
        }

        // Sign convention: flip a component when its largest-magnitude
        // loading is negative
        for mut row in components.rows_mut() {
            let dominant = row
                .iter()
                .cloned()
                .fold(0.0f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
            if dominant < 0.0 {
                row.mapv_inplace(|v| -v);
            }
        }

        let total: f64 = eigen.eigenvalues.iter().map(|v| v.max(0.0)).sum();
        let explained_variance_ratio = explained
            .iter()
            .map(|&v| if total > 0.0 { v / total } else { 0.0 })
            .collect();

        Ok(PcaModel {
            mean,
            components,
            explained_variance_ratio,
        })
    }

    /// Fit and project in one call
    pub fn fit_transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?.transform(x)
    }
}

/// Non-linear neighborhood-preserving embedding in the style of t-SNE:
/// perplexity-calibrated Gaussian affinities in the input space, a
/// Student-t kernel in the embedding space, and momentum gradient descent
/// with early exaggeration. Used for visualization only; no downstream
/// component consumes it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sne {
    /// Number of dimensions in the embedding
    pub n_components: usize,
    /// Perplexity, balancing local and global structure
    pub perplexity: f64,
    /// Gradient descent learning rate
    pub learning_rate: f64,
    /// Number of gradient descent iterations
    pub n_iter: usize,
    /// Random seed for the embedding initialization
    pub random_state: Option<u64>,
}

impl Default for Sne {
    fn default() -> Self {
        Self {
            n_components: 2,
            perplexity: 15.0,
            learning_rate: 200.0,
            n_iter: 500,
            random_state: None,
        }
    }
}

impl Sne {
    /// Create an embedding with the given target dimension
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            ..Default::default()
        }
    }

    /// Set the perplexity
    pub fn perplexity(mut self, perplexity: f64) -> Self {
        self.perplexity = perplexity;
        self
    }

    /// Set the learning rate
    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the number of gradient descent iterations
    pub fn n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    /// Set the random seed for reproducibility
    pub fn random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Compute the embedding. Deterministic given the seed.
    pub fn fit_transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        validate_matrix(x)?;

        let n = x.nrows();

        if self.n_components == 0 {
            return Err(Error::invalid_parameter("n_components must be > 0"));
        }

        if n < self.n_components + 1 {
            return Err(Error::insufficient_samples(format!(
                "embedding into {} dimensions requires at least {} samples, got {}",
                self.n_components,
                self.n_components + 1,
                n
            )));
        }

        let p = self.joint_affinities(x);

        let mut rng = StdRng::seed_from_u64(self.random_state.unwrap_or(0));
        let mut y = Array2::zeros((n, self.n_components));
        for v in y.iter_mut() {
            *v = rng.gen_range(-1e-4..1e-4);
        }

        let mut velocity: Array2<f64> = Array2::zeros((n, self.n_components));
        let exaggeration_iters = (self.n_iter / 5).min(100);

        for iter in 0..self.n_iter {
            let exaggeration = if iter < exaggeration_iters { 4.0 } else { 1.0 };

            // Student-t kernel in the embedding space
            let mut q_num = Array2::zeros((n, n));
            let mut q_total = 0.0;
            for i in 0..n {
                for j in (i + 1)..n {
                    let num = 1.0 / (1.0 + squared_distance(y.row(i), y.row(j)));
                    q_num[[i, j]] = num;
                    q_num[[j, i]] = num;
                    q_total += 2.0 * num;
                }
            }
            let q_total = q_total.max(1e-12);

            let momentum = if iter < self.n_iter / 2 { 0.5 } else { 0.8 };
            let mut gradient: Array2<f64> = Array2::zeros((n, self.n_components));

            for i in 0..n {
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let q_ij = (q_num[[i, j]] / q_total).max(1e-12);
                    let mult = 4.0 * (exaggeration * p[[i, j]] - q_ij) * q_num[[i, j]];
                    for d in 0..self.n_components {
                        gradient[[i, d]] += mult * (y[[i, d]] - y[[j, d]]);
                    }
                }
            }

            for i in 0..n {
                for d in 0..self.n_components {
                    velocity[[i, d]] =
                        momentum * velocity[[i, d]] - self.learning_rate * gradient[[i, d]];
                    y[[i, d]] += velocity[[i, d]];
                }
            }
        }

        Ok(y)
    }

    /// Symmetrized, perplexity-calibrated affinity matrix over the input
    fn joint_affinities(&self, x: ArrayView2<f64>) -> Array2<f64> {
        let n = x.nrows();
        // Keep the effective perplexity feasible for small datasets
        let target_perplexity = self.perplexity.min((n as f64 - 1.0) / 3.0).max(1.0);
        let target_entropy = target_perplexity.ln();

        let mut sq_dist = Array2::zeros((n, n));
        for i in 0..n {
            for j in (i + 1)..n {
                let d = squared_distance(x.row(i), x.row(j));
                sq_dist[[i, j]] = d;
                sq_dist[[j, i]] = d;
            }
        }

        let mut p = Array2::zeros((n, n));
        for i in 0..n {
            let (mut beta, mut beta_min, mut beta_max) = (1.0f64, 0.0f64, f64::INFINITY);

            // Binary search the bandwidth so the row entropy matches the
            // target perplexity
            for _ in 0..50 {
                let mut row_sum = 0.0;
                let mut weighted = 0.0;
                for j in 0..n {
                    if j == i {
                        continue;
                    }
                    let w = (-beta * sq_dist[[i, j]]).exp();
                    row_sum += w;
                    weighted += w * sq_dist[[i, j]];
                }
                let row_sum = row_sum.max(1e-12);
                let entropy = row_sum.ln() + beta * weighted / row_sum;

                if (entropy - target_entropy).abs() < 1e-5 {
                    break;
                }

                if entropy > target_entropy {
                    beta_min = beta;
                    beta = if beta_max.is_finite() {
                        (beta + beta_max) / 2.0
                    } else {
                        beta * 2.0
                    };
                } else {
                    beta_max = beta;
                    beta = (beta + beta_min) / 2.0;
                }
            }

            let mut row_sum = 0.0;
            for j in 0..n {
                if j != i {
                    p[[i, j]] = (-beta * sq_dist[[i, j]]).exp();
                    row_sum += p[[i, j]];
                }
            }
            let row_sum = row_sum.max(1e-12);
            for j in 0..n {
                p[[i, j]] /= row_sum;
            }
        }

        // Symmetrize and floor
        let mut joint = Array2::zeros((n, n));
        for i in 0..n {
            for j in 0..n {
                joint[[i, j]] = ((p[[i, j]] + p[[j, i]]) / (2.0 * n as f64)).max(1e-12);
            }
        }
        joint
    }
}
