//! Final segment assignment: a production k-means fit with a
//! predetermined k, attached to every record

use crate::dataset::Dataset;
use crate::encoding::{ContinuousField, FeatureEncoder, FeatureSpec};
use crate::error::Result;
use crate::kmeans::KMeans;
use ndarray::{Array1, Array2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Final mapping from record (row index) to cluster id, plus the centroids
/// of the production fit. Created once per run and consumed read-only by
/// the recommendation query.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterAssignment {
    /// Cluster id per record, in dataset order
    pub labels: Array1<usize>,
    /// Number of clusters
    pub n_clusters: usize,
    /// Centroids in standardized feature space
    pub centroids: Array2<f64>,
}

/// Fits a fixed-count partition on a chosen continuous feature subset and
/// attaches the cluster id to every record.
///
/// The feature subset here is a deliberate, independent production choice:
/// it does not have to match the subset the exploratory sweep ran on, and
/// k is trusted as given rather than re-derived from validity scores.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentAssigner {
    /// Continuous fields used for the production fit
    pub features: Vec<ContinuousField>,
    /// Predetermined cluster count
    pub n_clusters: usize,
    /// Seed for the k-means fit
    pub random_state: u64,
    /// Restarts for the k-means fit
    pub n_init: usize,
}

impl SegmentAssigner {
    /// Create an assigner over the given features and cluster count
    pub fn new(features: Vec<ContinuousField>, n_clusters: usize) -> Self {
        Self {
            features,
            n_clusters,
            random_state: 42,
            n_init: 10,
        }
    }

    /// Set the random seed
    pub fn random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Set the number of k-means restarts
    pub fn n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Standardize the chosen features, fit k-means with the predetermined
    /// k, and write the cluster id onto every record
    pub fn assign(&self, dataset: &mut Dataset) -> Result<ClusterAssignment> {
        let encoder = FeatureEncoder::new(FeatureSpec::continuous_only(self.features.clone()));
        let matrix = encoder.fit_transform(dataset)?;

        let result = KMeans::new(self.n_clusters)
            .random_state(self.random_state)
            .n_init(self.n_init)
            .fit(matrix.view())?;

        for (record, &label) in dataset.records_mut().iter_mut().zip(result.labels.iter()) {
            record.cluster = Some(label);
        }

        Ok(ClusterAssignment {
            labels: result.labels,
            n_clusters: self.n_clusters,
            centroids: result.centroids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;
    use std::collections::HashSet;

    fn banded_dataset() -> Dataset {
        // Three clearly separated price/rating bands
        let mut records = Vec::new();
        for i in 0..5 {
            records.push(Record::new(
                format!("budget-{i}"),
                "X",
                "Mumbai",
                "Street Food",
                3.0 + i as f64 * 0.05,
                50,
                200.0 + i as f64 * 10.0,
            ));
            records.push(Record::new(
                format!("mid-{i}"),
                "Y",
                "Pune",
                "Cafe",
                4.0 + i as f64 * 0.05,
                500,
                900.0 + i as f64 * 10.0,
            ));
            records.push(Record::new(
                format!("fine-{i}"),
                "Z",
                "Delhi",
                "Fine Dining",
                4.8 + i as f64 * 0.02,
                2000,
                2500.0 + i as f64 * 20.0,
            ));
        }
        Dataset::from_records(records)
    }

    #[test]
    fn test_every_record_gets_a_cluster() {
        let mut dataset = banded_dataset();
        let assigner = SegmentAssigner::new(
            vec![
                ContinuousField::Rating,
                ContinuousField::AvgCost,
                ContinuousField::ReviewCount,
            ],
            3,
        )
        .random_state(42);

        let assignment = assigner.assign(&mut dataset).unwrap();

        assert_eq!(assignment.labels.len(), dataset.len());
        assert!(dataset.records().iter().all(|r| r.cluster.is_some()));

        let distinct: HashSet<usize> =
            dataset.records().iter().filter_map(|r| r.cluster).collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn test_bands_cluster_together() {
        let mut dataset = banded_dataset();
        let assigner =
            SegmentAssigner::new(vec![ContinuousField::Rating, ContinuousField::AvgCost], 3)
                .random_state(42);

        assigner.assign(&mut dataset).unwrap();

        // Records in the same band share a cluster id
        let budget = dataset.records()[0].cluster;
        let fine = dataset.records()[2].cluster;
        assert_ne!(budget, fine);
        for chunk in dataset.records().chunks(3) {
            assert_eq!(chunk[0].cluster, dataset.records()[0].cluster);
            assert_eq!(chunk[2].cluster, dataset.records()[2].cluster);
        }
    }

    #[test]
    fn test_assignment_is_deterministic() {
        let assigner =
            SegmentAssigner::new(vec![ContinuousField::Rating, ContinuousField::AvgCost], 3)
                .random_state(7);

        let mut a = banded_dataset();
        let mut b = banded_dataset();
        let ra = assigner.assign(&mut a).unwrap();
        let rb = assigner.assign(&mut b).unwrap();

        assert_eq!(ra.labels, rb.labels);
    }

    #[test]
    fn test_too_few_records_errors() {
        let mut dataset = Dataset::from_records(vec![Record::new(
            "only", "X", "Mumbai", "Cafe", 4.0, 10, 500.0,
        )]);
        let assigner = SegmentAssigner::new(vec![ContinuousField::Rating], 3);

        assert!(assigner.assign(&mut dataset).is_err());
        // Failure leaves the dataset unassigned
        assert!(dataset.records().iter().all(|r| r.cluster.is_none()));
    }
}
