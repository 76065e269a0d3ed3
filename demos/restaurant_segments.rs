//! End-to-end segmentation walkthrough: encode a restaurant dataset,
//! reduce it, sweep the three clustering families, assign production
//! segments, and answer a filtered recommendation query.
//!
//! Loading from storage, plotting, and interactive input stay outside the
//! library; this demo stands in for those collaborators with in-memory
//! data and stdout.

use bistromap::{
    recommend, ClusterEvaluator, ContinuousField, Dataset, FeatureEncoder, FeatureSpec, Pca,
    Record, RecommendationQuery, SegmentAssigner, Sne, SweepConfig,
};
use rand::prelude::*;

fn build_dataset() -> Dataset {
    let profiles: [(&str, &str, f64, f64); 5] = [
        // (city, cuisine, rating center, cost center)
        ("Mumbai", "Street Food", 3.4, 250.0),
        ("Mumbai", "North Indian", 4.3, 900.0),
        ("Bangalore", "Continental", 4.1, 1200.0),
        ("Bangalore", "South Indian", 3.9, 350.0),
        ("Delhi", "Mughlai", 4.6, 1800.0),
    ];
    let mut rng = StdRng::seed_from_u64(42);
    let mut records = Vec::new();

    for (p, (city, cuisine, rating, cost)) in profiles.iter().enumerate() {
        for i in 0..12 {
            records.push(Record::new(
                format!("{cuisine} #{i} ({city})"),
                format!("area-{}", (p * 12 + i) % 9),
                *city,
                *cuisine,
                (rating + rng.gen_range(-0.15..0.15)).clamp(0.0, 5.0),
                rng.gen_range(50..2500),
                cost + rng.gen_range(-60.0..60.0),
            ));
        }
    }

    Dataset::from_records(records)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut dataset = build_dataset();
    println!("Loaded {} restaurants", dataset.len());

    // --- Encode: standardize continuous fields, one-hot the categoricals ---
    let encoder = FeatureEncoder::new(FeatureSpec::full());
    let model = encoder.fit(&dataset)?;
    let matrix = model.transform(&dataset)?;
    println!(
        "Encoded matrix: {} rows x {} columns",
        matrix.nrows(),
        matrix.ncols()
    );

    // --- Reduce: PCA feeds the sweep, the SNE embedding is for plotting ---
    let pca = Pca::new(2);
    let pca_model = pca.fit(matrix.view())?;
    let embedding = pca_model.transform(matrix.view())?;
    println!(
        "PCA explained variance ratio: {:?}",
        pca_model.explained_variance_ratio()
    );

    let viz = Sne::new(2)
        .perplexity(12.0)
        .n_iter(300)
        .random_state(42)
        .fit_transform(matrix.view())?;
    println!("Visualization embedding: {:?} (handed to the plotting side)", viz.dim());

    // --- Sweep the three families and report the winners ---
    let evaluator = ClusterEvaluator::new(SweepConfig::default());
    let report = evaluator.evaluate(embedding.view())?;

    if let Some(best) = &report.kmeans.best {
        println!(
            "Best k-means: k={} (silhouette {:.4})",
            best.k, best.score
        );
        for entry in &report.kmeans.entries {
            println!(
                "  k={:<2} silhouette={:.4} inertia={:.2}",
                entry.k,
                entry.score,
                entry.inertia.unwrap_or(f64::NAN)
            );
        }
    }

    if let Some(best) = &report.kmedoids.best {
        println!(
            "Best k-medoids: k={} (silhouette {:.4})",
            best.k, best.score
        );
    }

    match &report.dbscan.best {
        Some(best) => println!(
            "Best DBSCAN: eps={:.1}, min_samples={} (silhouette {:.4})",
            best.eps, best.min_samples, best.score
        ),
        None => println!("DBSCAN could not find a valid configuration"),
    }

    // --- Production assignment with a predetermined k on its own feature
    //     subset, independent of the exploratory sweep ---
    let assigner = SegmentAssigner::new(
        vec![
            ContinuousField::Rating,
            ContinuousField::AvgCost,
            ContinuousField::ReviewCount,
        ],
        3,
    )
    .random_state(42);
    let assignment = assigner.assign(&mut dataset)?;
    println!("Assigned {} records to {} segments", assignment.labels.len(), assignment.n_clusters);

    // --- Filtered recommendation query over the augmented dataset ---
    let query = RecommendationQuery::new("mumbai", 4.0, 1000.0);
    let results = recommend(&dataset, &query);

    println!(
        "\nRecommended in {} with rating >= {} and price <= {}:",
        query.city, query.min_rating, query.max_price
    );
    for record in results {
        println!(
            "  {:<28} {:<12} rating={:.1} cost={:.0} cluster={:?}",
            record.name, record.cuisine, record.rating, record.avg_cost, record.cluster
        );
    }

    Ok(())
}
