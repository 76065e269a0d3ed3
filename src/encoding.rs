//! Feature encoding: standardization of continuous fields and one-hot
//! expansion of categorical fields

use crate::dataset::{Dataset, Record};
use crate::error::{Error, Result};
use ndarray::Array2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Continuous (numeric) record fields available as features
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ContinuousField {
    /// Average user rating
    Rating,
    /// Total number of reviews
    ReviewCount,
    /// Average cost for two
    AvgCost,
}

impl ContinuousField {
    /// Extract the numeric value of this field from a record
    pub fn value(&self, record: &Record) -> f64 {
        match self {
            Self::Rating => record.rating,
            Self::ReviewCount => record.review_count as f64,
            Self::AvgCost => record.avg_cost,
        }
    }

    /// Field name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rating => "rating",
            Self::ReviewCount => "review_count",
            Self::AvgCost => "avg_cost",
        }
    }
}

/// Categorical (string-valued) record fields available as features
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CategoricalField {
    /// Neighborhood or street-level location
    Location,
    /// City
    City,
    /// Cuisine style
    Cuisine,
}

impl CategoricalField {
    /// Extract the string value of this field from a record
    pub fn value<'a>(&self, record: &'a Record) -> &'a str {
        match self {
            Self::Location => &record.location,
            Self::City => &record.city,
            Self::Cuisine => &record.cuisine,
        }
    }
}

/// Explicit partition of the feature set into continuous and categorical
/// fields. Column order in the encoded matrix follows this spec: continuous
/// fields first (in spec order), then one indicator block per categorical
/// field (in spec order).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeatureSpec {
    /// Continuous fields, standardized to zero mean and unit variance
    pub continuous: Vec<ContinuousField>,
    /// Categorical fields, one-hot expanded over the observed vocabulary
    pub categorical: Vec<CategoricalField>,
}

impl FeatureSpec {
    /// The full feature set used by the exploratory sweep: all three
    /// continuous fields plus all three categorical fields
    pub fn full() -> Self {
        Self {
            continuous: vec![
                ContinuousField::Rating,
                ContinuousField::ReviewCount,
                ContinuousField::AvgCost,
            ],
            categorical: vec![
                CategoricalField::Location,
                CategoricalField::City,
                CategoricalField::Cuisine,
            ],
        }
    }

    /// A purely continuous spec (no indicator columns)
    pub fn continuous_only(fields: Vec<ContinuousField>) -> Self {
        Self {
            continuous: fields,
            categorical: Vec::new(),
        }
    }
}

/// Per-column standardization statistics computed over the full dataset
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColumnStats {
    /// Column mean
    pub mean: f64,
    /// Column standard deviation (population)
    pub std: f64,
}

/// Fitted encoder state: standardization statistics per continuous field
/// and a sorted category vocabulary per categorical field. Immutable once
/// fitted; `transform` may be called any number of times.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EncoderModel {
    spec: FeatureSpec,
    stats: Vec<ColumnStats>,
    vocabularies: Vec<Vec<String>>,
}

impl EncoderModel {
    /// The feature spec this model was fitted with
    pub fn spec(&self) -> &FeatureSpec {
        &self.spec
    }

    /// Standardization statistics, one entry per continuous field
    pub fn stats(&self) -> &[ColumnStats] {
        &self.stats
    }

    /// Sorted category vocabularies, one entry per categorical field
    pub fn vocabularies(&self) -> &[Vec<String>] {
        &self.vocabularies
    }

    /// Total number of columns in the encoded matrix
    pub fn n_columns(&self) -> usize {
        self.spec.continuous.len() + self.vocabularies.iter().map(Vec::len).sum::<usize>()
    }

    /// Encode a dataset into a dense numeric matrix, one row per record in
    /// dataset order.
    ///
    /// A constant continuous column standardizes to all zeros. A category
    /// never seen during fitting encodes as an all-zero indicator block.
    pub fn transform(&self, dataset: &Dataset) -> Result<Array2<f64>> {
        let n_rows = dataset.len();
        let n_cols = self.n_columns();
        let mut matrix = Array2::zeros((n_rows, n_cols));

        for (i, record) in dataset.records().iter().enumerate() {
            let mut col = 0;

            for (field, stats) in self.spec.continuous.iter().zip(&self.stats) {
                let raw = field.value(record);
                if !raw.is_finite() {
                    return Err(Error::invalid_feature(format!(
                        "non-finite value in continuous column '{}' at row {}",
                        field.name(),
                        i
                    )));
                }
                // Constant column: standardized value is zero by convention
                matrix[[i, col]] = if stats.std > f64::EPSILON {
                    (raw - stats.mean) / stats.std
                } else {
                    0.0
                };
                col += 1;
            }

            for (field, vocabulary) in self.spec.categorical.iter().zip(&self.vocabularies) {
                let value = field.value(record);
                if let Ok(offset) = vocabulary.binary_search_by(|v| v.as_str().cmp(value)) {
                    matrix[[i, col + offset]] = 1.0;
                }
                col += vocabulary.len();
            }
        }

        Ok(matrix)
    }
}

/// Encoder for turning raw records into a numeric feature matrix
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    spec: FeatureSpec,
}

impl FeatureEncoder {
    /// Create an encoder for the given feature spec
    pub fn new(spec: FeatureSpec) -> Self {
        Self { spec }
    }

    /// Fit standardization statistics and category vocabularies over the
    /// full dataset, returning an immutable model
    pub fn fit(&self, dataset: &Dataset) -> Result<EncoderModel> {
        if dataset.is_empty() {
            return Err(Error::invalid_feature("cannot fit encoder on an empty dataset"));
        }

        let n = dataset.len() as f64;
        let mut stats = Vec::with_capacity(self.spec.continuous.len());

        for field in &self.spec.continuous {
            let mut sum = 0.0;
            for (i, record) in dataset.records().iter().enumerate() {
                let v = field.value(record);
                if !v.is_finite() {
                    return Err(Error::invalid_feature(format!(
                        "non-finite value in continuous column '{}' at row {}",
                        field.name(),
                        i
                    )));
                }
                sum += v;
            }
            let mean = sum / n;

            let variance = dataset
                .records()
                .iter()
                .map(|r| (field.value(r) - mean).powi(2))
                .sum::<f64>()
                / n;

            stats.push(ColumnStats {
                mean,
                std: variance.sqrt(),
            });
        }

        let mut vocabularies = Vec::with_capacity(self.spec.categorical.len());
        for field in &self.spec.categorical {
            let mut values: Vec<String> = dataset
                .records()
                .iter()
                .map(|r| field.value(r).to_string())
                .collect();
            // Lexicographic order keeps the column layout reproducible
            values.sort_unstable();
            values.dedup();
            vocabularies.push(values);
        }

        Ok(EncoderModel {
            spec: self.spec.clone(),
            stats,
            vocabularies,
        })
    }

    /// Fit the encoder and transform the same dataset in one call
    pub fn fit_transform(&self, dataset: &Dataset) -> Result<Array2<f64>> {
        self.fit(dataset)?.transform(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;

    fn sample_dataset() -> Dataset {
        Dataset::from_records(vec![
            Record::new("A", "Colaba", "Mumbai", "North Indian", 4.0, 100, 500.0),
            Record::new("B", "Bandra", "Mumbai", "Chinese", 3.0, 200, 700.0),
            Record::new("C", "Indiranagar", "Bangalore", "Chinese", 5.0, 300, 900.0),
        ])
    }

    #[test]
    fn test_row_count_matches_dataset() {
        let dataset = sample_dataset();
        let encoder = FeatureEncoder::new(FeatureSpec::full());
        let matrix = encoder.fit_transform(&dataset).unwrap();
        assert_eq!(matrix.nrows(), dataset.len());
    }

    #[test]
    fn test_column_layout() {
        let dataset = sample_dataset();
        let encoder = FeatureEncoder::new(FeatureSpec::full());
        let model = encoder.fit(&dataset).unwrap();

        // 3 continuous + 3 locations + 2 cities + 2 cuisines
        assert_eq!(model.n_columns(), 3 + 3 + 2 + 2);
        assert_eq!(model.vocabularies()[1], vec!["Bangalore", "Mumbai"]);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let dataset = sample_dataset();
        let encoder = FeatureEncoder::new(FeatureSpec::full());

        let a = encoder.fit_transform(&dataset).unwrap();
        let b = encoder.fit_transform(&dataset).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_standardized_moments() {
        let dataset = sample_dataset();
        let encoder = FeatureEncoder::new(FeatureSpec::continuous_only(vec![
            ContinuousField::Rating,
            ContinuousField::AvgCost,
        ]));
        let matrix = encoder.fit_transform(&dataset).unwrap();

        for col in matrix.columns() {
            let n = col.len() as f64;
            let mean = col.sum() / n;
            let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            assert!(mean.abs() < 1e-10);
            assert!((var - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_constant_column_standardizes_to_zero() {
        let dataset = Dataset::from_records(vec![
            Record::new("A", "X", "M", "C", 4.0, 10, 500.0),
            Record::new("B", "Y", "M", "C", 4.0, 20, 500.0),
        ]);
        let encoder = FeatureEncoder::new(FeatureSpec::continuous_only(vec![
            ContinuousField::Rating,
            ContinuousField::AvgCost,
        ]));
        let matrix = encoder.fit_transform(&dataset).unwrap();

        assert!(matrix.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_singleton_category_gets_a_column() {
        let dataset = sample_dataset();
        let encoder = FeatureEncoder::new(FeatureSpec {
            continuous: vec![],
            categorical: vec![CategoricalField::Location],
        });
        let model = encoder.fit(&dataset).unwrap();

        // Every location appears exactly once and each still gets a column
        assert_eq!(model.n_columns(), 3);
        let matrix = model.transform(&dataset).unwrap();
        for row in matrix.rows() {
            assert_eq!(row.sum(), 1.0);
        }
    }

    #[test]
    fn test_unseen_category_encodes_as_zeros() {
        let dataset = sample_dataset();
        let encoder = FeatureEncoder::new(FeatureSpec {
            continuous: vec![],
            categorical: vec![CategoricalField::City],
        });
        let model = encoder.fit(&dataset).unwrap();

        let unseen = Dataset::from_records(vec![Record::new(
            "D", "Somewhere", "Pune", "Thai", 4.1, 50, 400.0,
        )]);
        let matrix = model.transform(&unseen).unwrap();
        assert!(matrix.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let dataset = Dataset::from_records(vec![Record::new(
            "A", "X", "M", "C", f64::NAN, 10, 500.0,
        )]);
        let encoder = FeatureEncoder::new(FeatureSpec::continuous_only(vec![
            ContinuousField::Rating,
        ]));
        assert!(matches!(
            encoder.fit(&dataset),
            Err(crate::Error::InvalidFeature { .. })
        ));
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let dataset = Dataset::from_records(vec![]);
        let encoder = FeatureEncoder::new(FeatureSpec::full());
        assert!(encoder.fit(&dataset).is_err());
    }
}
