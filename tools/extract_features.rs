//! Bidder Feature Extraction Tool
//!
//! Configuration-driven tool that turns a bid log into a normalized,
//! labeled feature dataset.
//!
//! # Flow
//!
//! 1. Load and validate a `PipelineConfig` (TOML)
//! 2. Run the cached extraction: raw matrix, entity ids, fitted transform
//!    and normalized matrix are each read from the artifact store when
//!    present and computed otherwise. The bids file is only read if the raw
//!    matrix has to be computed.
//! 3. Load ground truth (cached as `train_answer`) and join it by entity id
//! 4. Export `features.npy`, `labels.npy`, `entity_ids.json`, `metadata.json`.
//!    Rows without a label (held-out bidders) go to `unlabeled/` with the
//!    same files minus `labels.npy`.
//!
//! # Usage
//!
//! ```bash
//! # From TOML config
//! RUST_LOG=info cargo run --release --bin extract_features -- --config configs/bids.toml
//!
//! # Generate sample config
//! cargo run --release --bin extract_features -- --generate-config bids.toml
//! ```

use bidder_feature_extractor::cache::TRAIN_ANSWER;
use bidder_feature_extractor::export::UNLABELED_DIR;
use bidder_feature_extractor::prelude::*;
use std::time::Instant;

/// Main entry point for the extraction tool
fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    match args[1].as_str() {
        "--config" => {
            if args.len() < 3 {
                eprintln!("Error: --config requires a path argument");
                std::process::exit(1);
            }
            if let Err(e) = run_from_config(&args[2]) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        "--generate-config" => {
            if args.len() < 3 {
                eprintln!("Error: --generate-config requires a path argument");
                std::process::exit(1);
            }
            if let Err(e) = generate_sample_config(&args[2]) {
                eprintln!("Error generating config: {e}");
                std::process::exit(1);
            }
        }
        "--help" | "-h" => {
            print_usage(&args[0]);
        }
        _ => {
            eprintln!("Unknown argument: {}", args[1]);
            print_usage(&args[0]);
            std::process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!(
        r#"
Bidder Feature Extraction Tool

Usage:
    {program} --config <path.toml>       Extract, normalize and export features
    {program} --generate-config <path>   Generate sample config file
    {program} --help                     Show this help

Set RUST_LOG=info for stage progress and cache hits/misses.
"#
    );
}

/// Generate a sample configuration file
fn generate_sample_config(path: &str) -> Result<()> {
    let config = PipelineConfig::default().with_metadata(ExperimentMetadata {
        name: "bidder-features".to_string(),
        description: Some("Per-bidder features for bot detection".to_string()),
        created_at: Some(chrono::Utc::now().to_rfc3339()),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
        tags: None,
    });
    config.save_toml(path)?;

    println!("Generated sample config: {path}");
    println!("\nEdit the following fields before running:");
    println!("  - input.bids_path: Path to the bid events CSV");
    println!("  - input.labels_path: Path to the ground-truth CSV (remove if unlabeled)");
    println!("  - cache.dir / output.dir: Artifact and export locations");
    Ok(())
}

/// Run extraction and export from a configuration file
fn run_from_config(config_path: &str) -> Result<()> {
    let start = Instant::now();
    let config = PipelineConfig::load_toml(config_path)?;
    log::info!("Loaded configuration: {config_path}");

    let pipeline = Pipeline::from_config(config.clone())?;

    let (summary, unlabeled) = if config.cache.enabled {
        let mut store = FileArtifactStore::open(&config.cache.dir)?;
        run_with_store(&mut store, &pipeline, &config)?
    } else {
        let mut store = MemoryArtifactStore::new();
        run_with_store(&mut store, &pipeline, &config)?
    };

    println!(
        "Exported {} samples x {} features to {} in {:.2?}",
        summary.n_samples,
        summary.n_features,
        config.output.dir.display(),
        start.elapsed()
    );
    if unlabeled > 0 {
        println!("Exported {unlabeled} unlabeled samples to {UNLABELED_DIR}/");
    }
    Ok(())
}

fn run_with_store<S: ArtifactStore>(
    store: &mut S,
    pipeline: &Pipeline,
    config: &PipelineConfig,
) -> Result<(ExportMetadata, usize)> {
    let input = &config.input;

    let run = run_cached(store, pipeline, || {
        let events = load_events_csv(&input.bids_path, &input.columns)?;
        let check = FeatureValidator::new().validate_events(&events);
        if !check.is_valid() {
            log::warn!("Input check: {check}");
        }
        Ok(events)
    })?;
    if run.fully_cached() {
        log::info!("All training artifacts loaded from cache");
    } else {
        log::info!("Computed artifacts: {}", run.computed.join(", "));
    }

    let exporter = NumpyExporter::new(&config.output.dir);
    match &input.labels_path {
        Some(labels_path) => {
            let (labels, _) = get_or_compute(store, TRAIN_ANSWER, || {
                load_labels_csv(
                    labels_path,
                    &input.label_id_column,
                    &input.label_outcome_column,
                )
            })?;
            let dataset = labels.join(&run.normalized)?;
            let split = exporter.export_split(&dataset, &run.normalized)?;
            let unlabeled = split.unlabeled.map_or(0, |u| u.metadata.n_samples);
            Ok((split.labeled.metadata, unlabeled))
        }
        None => Ok((exporter.export(&run.normalized)?.metadata, 0)),
    }
}
