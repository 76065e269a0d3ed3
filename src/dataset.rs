//! Restaurant records, the in-memory dataset, and the recommendation filter

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One restaurant. The source-of-truth attributes are immutable for the
/// duration of a run; only the derived `cluster` field is ever written,
/// and only once, by the segment assigner.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Record {
    /// Display name (identifier only, never used as a feature)
    pub name: String,
    /// Neighborhood or street-level location
    pub location: String,
    /// City the restaurant operates in
    pub city: String,
    /// Cuisine style
    pub cuisine: String,
    /// Average user rating, bounded 0-5
    pub rating: f64,
    /// Total number of reviews
    pub review_count: u64,
    /// Average cost for two
    pub avg_cost: f64,
    /// Cluster id attached by the segment assigner, `None` until assigned
    pub cluster: Option<usize>,
}

impl Record {
    /// Create a new record with no cluster assignment
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        city: impl Into<String>,
        cuisine: impl Into<String>,
        rating: f64,
        review_count: u64,
        avg_cost: f64,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            city: city.into(),
            cuisine: cuisine.into(),
            rating,
            review_count,
            avg_cost,
            cluster: None,
        }
    }
}

/// Ordered collection of records, loaded once and held in memory for the
/// duration of a run. Row order is the canonical record identity: every
/// matrix produced downstream aligns row `i` with `records()[i]`.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Build a dataset from a vector of records
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset contains no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Immutable view of the records in dataset order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Mutable access to the records, used by the segment assigner to
    /// attach cluster ids
    pub(crate) fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }
}

/// Filter criteria for the recommendation query
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecommendationQuery {
    /// City to search in (matched case-insensitively)
    pub city: String,
    /// Minimum acceptable rating
    pub min_rating: f64,
    /// Maximum acceptable average cost for two
    pub max_price: f64,
    /// Optional restriction to a single precomputed cluster
    pub cluster: Option<usize>,
}

impl RecommendationQuery {
    /// Create a query with no cluster restriction
    pub fn new(city: impl Into<String>, min_rating: f64, max_price: f64) -> Self {
        Self {
            city: city.into(),
            min_rating,
            max_price,
            cluster: None,
        }
    }

    /// Restrict results to a single cluster id
    pub fn in_cluster(mut self, cluster: usize) -> Self {
        self.cluster = Some(cluster);
        self
    }
}

/// Return the records matching the query: city match (case-insensitive),
/// rating at or above the minimum, cost at or below the maximum, and the
/// cluster id when one is requested.
///
/// An unrecognized city or an empty match is an empty result, not an error.
pub fn recommend<'a>(dataset: &'a Dataset, query: &RecommendationQuery) -> Vec<&'a Record> {
    dataset
        .records()
        .iter()
        .filter(|r| r.city.eq_ignore_ascii_case(&query.city))
        .filter(|r| r.rating >= query.min_rating)
        .filter(|r| r.avg_cost <= query.max_price)
        .filter(|r| match query.cluster {
            Some(id) => r.cluster == Some(id),
            None => true,
        })
        .collect()
}
