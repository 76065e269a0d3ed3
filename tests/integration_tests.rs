use bistromap::{
    recommend, ClusterEvaluator, ContinuousField, Dataset, Error, FeatureEncoder, FeatureSpec,
    KMeans, Pca, Record, RecommendationQuery, SegmentAssigner, Sne, SweepConfig,
};
use ndarray::Array2;
use rand::prelude::*;
use std::collections::HashSet;

/// Synthetic dataset: `n` records spread across three cities, ratings
/// uniform in [3.0, 5.0], costs uniform in [200, 2000]
fn synthetic_dataset(n: usize, seed: u64) -> Dataset {
    let cities = ["Mumbai", "Bangalore", "Chennai"];
    let cuisines = ["North Indian", "Chinese", "Continental", "South Indian"];
    let mut rng = StdRng::seed_from_u64(seed);

    let records = (0..n)
        .map(|i| {
            Record::new(
                format!("restaurant-{i}"),
                format!("area-{}", i % 7),
                cities[i % cities.len()],
                cuisines[i % cuisines.len()],
                rng.gen_range(3.0..5.0),
                rng.gen_range(10..3000),
                rng.gen_range(200.0..2000.0),
            )
        })
        .collect();

    Dataset::from_records(records)
}

#[test]
fn test_encoder_row_count_and_determinism() {
    let dataset = synthetic_dataset(40, 1);
    let encoder = FeatureEncoder::new(FeatureSpec::full());

    let a = encoder.fit_transform(&dataset).unwrap();
    let b = encoder.fit_transform(&dataset).unwrap();

    assert_eq!(a.nrows(), 40);
    assert_eq!(a, b);
}

#[test]
fn test_standardized_columns_have_unit_moments() {
    let dataset = synthetic_dataset(60, 2);
    let encoder = FeatureEncoder::new(FeatureSpec::continuous_only(vec![
        ContinuousField::Rating,
        ContinuousField::ReviewCount,
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
fn test_constant_column_encodes_to_zeros() {
    let records = (0..10)
        .map(|i| Record::new(format!("r{i}"), "X", "Mumbai", "Cafe", 4.0, 100, 500.0))
        .collect();
    let dataset = Dataset::from_records(records);

    let encoder =
        FeatureEncoder::new(FeatureSpec::continuous_only(vec![ContinuousField::Rating]));
    let matrix = encoder.fit_transform(&dataset).unwrap();

    assert!(matrix.iter().all(|&v| v == 0.0));
}

#[test]
fn test_out_of_range_k_never_returns_wrong_shape() {
    let data = Array2::from_shape_vec(
        (4, 2),
        vec![0.0, 0.0, 0.1, 0.1, 5.0, 5.0, 5.1, 5.1],
    )
    .unwrap();

    // Explicit fit with k > n is a structured error, not a bad result
    assert!(matches!(
        KMeans::new(9).fit(data.view()),
        Err(Error::InsufficientSamples { .. })
    ));

    // The sweep with the same data just skips the infeasible ks
    let report = ClusterEvaluator::new(SweepConfig::default())
        .evaluate(data.view())
        .unwrap();
    for entry in &report.kmeans.entries {
        assert!(entry.k <= 3);
    }
}

#[test]
fn test_density_sweep_no_valid_configuration_is_not_an_error() {
    // Every pairwise distance dwarfs the largest eps in the default grid
    let data = Array2::from_shape_vec(
        (5, 2),
        vec![0.0, 0.0, 50.0, 0.0, 0.0, 50.0, 50.0, 50.0, 25.0, 90.0],
    )
    .unwrap();

    let report = ClusterEvaluator::new(SweepConfig::default())
        .evaluate(data.view())
        .unwrap();

    assert!(report.dbscan.best.is_none());
    assert!(report.dbscan.entries.is_empty());
}

#[test]
fn test_density_best_is_max_over_scorable_entries() {
    // Two dense blobs: plenty of (eps, min_samples) combinations find both
    let mut rng = StdRng::seed_from_u64(5);
    let mut rows = Vec::new();
    for &(cx, cy) in &[(0.0, 0.0), (6.0, 6.0)] {
        for _ in 0..10 {
            rows.push(cx + rng.gen_range(-0.15..0.15));
            rows.push(cy + rng.gen_range(-0.15..0.15));
        }
    }
    let data = Array2::from_shape_vec((20, 2), rows).unwrap();

    let report = ClusterEvaluator::new(SweepConfig::default())
        .evaluate(data.view())
        .unwrap();

    let best = report.dbscan.require_best().unwrap();
    let max_score = report
        .dbscan
        .entries
        .iter()
        .map(|e| e.score)
        .fold(f64::NEG_INFINITY, f64::max);

    assert!(!report.dbscan.entries.is_empty());
    assert_eq!(best.score, max_score);

    // Deterministic selection: the best entry is the first one attaining
    // the maximum in sweep order
    let first_max = report
        .dbscan
        .entries
        .iter()
        .find(|e| e.score == max_score)
        .unwrap();
    assert_eq!(best.eps, first_max.eps);
    assert_eq!(best.min_samples, first_max.min_samples);
}

#[test]
fn test_full_pipeline_on_synthetic_blobs() {
    // Three cities with distinct rating/cost profiles so the encoded
    // matrix has real cluster structure
    let mut records = Vec::new();
    let profiles = [
        ("Mumbai", 3.2, 300.0),
        ("Bangalore", 4.1, 1000.0),
        ("Chennai", 4.8, 1900.0),
    ];
    let mut rng = StdRng::seed_from_u64(11);
    for (city, rating, cost) in profiles {
        for i in 0..10 {
            records.push(Record::new(
                format!("{city}-{i}"),
                format!("area-{i}"),
                city,
                "Mixed",
                rating + rng.gen_range(-0.05..0.05),
                500,
                cost + rng.gen_range(-20.0..20.0),
            ));
        }
    }
    let dataset = Dataset::from_records(records);

    let encoder = FeatureEncoder::new(FeatureSpec::continuous_only(vec![
        ContinuousField::Rating,
        ContinuousField::AvgCost,
    ]));
    let matrix = encoder.fit_transform(&dataset).unwrap();

    let embedding = Pca::new(2).fit_transform(matrix.view()).unwrap();
    assert_eq!(embedding.dim(), (30, 2));

    // Visualization embedding runs on the same input but feeds nothing
    // downstream
    let viz = Sne::new(2)
        .perplexity(8.0)
        .n_iter(100)
        .random_state(42)
        .fit_transform(matrix.view())
        .unwrap();
    assert_eq!(viz.dim(), (30, 2));

    let report = ClusterEvaluator::new(SweepConfig::default())
        .evaluate(embedding.view())
        .unwrap();

    assert_eq!(report.kmeans.require_best().unwrap().k, 3);
    assert_eq!(report.kmedoids.require_best().unwrap().k, 3);
}

#[test]
fn test_segment_assigner_covers_all_fifty_records() {
    let mut dataset = synthetic_dataset(50, 3);
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

    assert_eq!(assignment.labels.len(), 50);
    assert!(dataset.records().iter().all(|r| r.cluster.is_some()));

    let distinct: HashSet<usize> = dataset.records().iter().filter_map(|r| r.cluster).collect();
    assert_eq!(distinct.len(), 3);
    assert!(distinct.iter().all(|&id| id < 3));
}

#[test]
fn test_query_against_augmented_dataset() {
    let mut dataset = Dataset::from_records(vec![
        Record::new("Target", "Colaba", "Mumbai", "North Indian", 4.5, 1200, 800.0),
        Record::new("Too Pricey", "Bandra", "Mumbai", "Chinese", 4.6, 900, 1600.0),
        Record::new("Too Low", "Juhu", "Mumbai", "Cafe", 3.1, 300, 400.0),
        Record::new("Elsewhere", "MG Road", "Bangalore", "Continental", 4.9, 2000, 700.0),
    ]);
    SegmentAssigner::new(vec![ContinuousField::Rating, ContinuousField::AvgCost], 2)
        .random_state(42)
        .assign(&mut dataset)
        .unwrap();

    // Case-insensitive city match plus both thresholds
    let results = recommend(&dataset, &RecommendationQuery::new("mumbai", 4.0, 1000.0));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "Target");

    // Unknown city is an empty result, not an error
    assert!(recommend(&dataset, &RecommendationQuery::new("Nowhereville", 0.0, 9999.0)).is_empty());

    // Cluster restriction narrows to the target's own segment
    let cluster = dataset.records()[0].cluster.unwrap();
    let results = recommend(
        &dataset,
        &RecommendationQuery::new("Mumbai", 4.0, 1000.0).in_cluster(cluster),
    );
    assert_eq!(results.len(), 1);

    let other = 1 - cluster;
    let results = recommend(
        &dataset,
        &RecommendationQuery::new("Mumbai", 4.0, 1000.0).in_cluster(other),
    );
    assert!(results.is_empty());
}
