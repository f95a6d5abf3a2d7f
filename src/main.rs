//! CLI entry point for the combat data preparation pipeline.

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use combat_prep::{
    convert_data, fetch_data, sample_data, utils::is_numeric_dtype, wash_data, CategoryEncoder,
    DatasetPaths, FillMethod, MatchupColumns, NaFiller, PrepConfig, SampleMethod, TableSchema,
};
use polars::prelude::*;
use std::path::Path;
use tracing::info;

/// CLI-compatible sampling method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSampleMethod {
    /// Under-sample the majority, then SMOTE the minority to parity
    Both,
    /// Only drop random majority rows
    UnderSampling,
    /// Only synthesize minority rows
    OverSampling,
}

impl From<CliSampleMethod> for SampleMethod {
    fn from(cli: CliSampleMethod) -> Self {
        match cli {
            CliSampleMethod::Both => SampleMethod::Both,
            CliSampleMethod::UnderSampling => SampleMethod::UnderSampling,
            CliSampleMethod::OverSampling => SampleMethod::OverSampling,
        }
    }
}

/// CLI-compatible fill method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFillMethod {
    /// Use the mean of non-null values
    Mean,
    /// Use the median of non-null values
    Median,
}

impl From<CliFillMethod> for FillMethod {
    fn from(cli: CliFillMethod) -> Self {
        match cli {
            CliFillMethod::Mean => FillMethod::Mean,
            CliFillMethod::Median => FillMethod::Median,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Combat outcome data preparation pipeline",
    long_about = "Prepares matchup data for a binary win/loss classifier.\n\n\
                  Expects a dataset directory with pokemon.csv (unit stats),\n\
                  combats.csv (training matchups with winners) and tests.csv\n\
                  (holdout matchups).\n\n\
                  EXAMPLES:\n  \
                  # Clean and rebalance with the defaults\n  \
                  combat-prep -i data/\n\n  \
                  # Drop outlier rows and only under-sample\n  \
                  combat-prep -i data/ --drop-outliers --method under-sampling"
)]
struct Args {
    /// Dataset directory holding pokemon.csv, combats.csv and tests.csv
    #[arg(short, long)]
    input: String,

    /// Output directory for the prepared tables
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Id column of the unit table
    #[arg(long, default_value = "#")]
    unit_id: String,

    /// Matchup column holding the first combatant's id
    #[arg(long, default_value = "First_pokemon")]
    first: String,

    /// Matchup column holding the second combatant's id
    #[arg(long, default_value = "Second_pokemon")]
    second: String,

    /// Matchup column holding the winner's id
    #[arg(long, default_value = "Winner")]
    winner: String,

    /// Name of the target column in the prepared table
    #[arg(short, long, default_value = "win")]
    target: String,

    /// Class rebalancing method
    #[arg(short, long, value_enum, default_value = "both")]
    method: CliSampleMethod,

    /// Drop flagged outlier rows instead of only reporting them
    #[arg(long)]
    drop_outliers: bool,

    /// Fill statistic for missing numeric values
    #[arg(long, value_enum, default_value = "mean")]
    fill_method: CliFillMethod,

    /// Rows with a missing fraction above this are dropped (0.0 - 1.0)
    #[arg(long, default_value = "0.4")]
    sparse_row_threshold: f64,

    /// Majority/minority ratio the under-sampling step shrinks toward
    #[arg(long, default_value = "1.5")]
    target_ratio: f64,

    /// Seed for every randomized operation
    #[arg(long, default_value = "1021")]
    seed: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
fn init_logging(level: &str, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Dataset directory not found: {}", args.input));
    }
    if !Path::new(&args.output).exists() {
        std::fs::create_dir_all(&args.output)?;
        info!("Created output directory: {}", args.output);
    }

    let config = PrepConfig::builder()
        .sparse_row_threshold(args.sparse_row_threshold)
        .drop_outliers(args.drop_outliers)
        .fill_method(args.fill_method.into())
        .seed(args.seed)
        .target_ratio(args.target_ratio)
        .build()?;

    info!("Loading dataset from: {}", args.input);
    let dataset = fetch_data(&DatasetPaths::in_dir(&args.input))?;

    let train_columns = MatchupColumns {
        unit_id: &args.unit_id,
        first: &args.first,
        second: &args.second,
        winner: Some(&args.winner),
        target: &args.target,
    };
    let train = convert_data(&dataset.matches, &dataset.units, &train_columns)?;
    info!("Flattened training matchups: {:?}", train.shape());

    let holdout_columns = MatchupColumns {
        winner: None,
        ..train_columns.clone()
    };
    let holdout = convert_data(&dataset.holdout, &dataset.units, &holdout_columns)?;
    info!("Flattened holdout matchups: {:?}", holdout.shape());

    let schema = TableSchema::detect(&train, &[], &args.target)?;

    let (mut washed, report) = wash_data(train, &schema, &config)?;
    info!(
        duplicates = report.duplicates_removed,
        sparse = report.sparse_rows_removed,
        outliers = report.outlier_rows.len(),
        dropped = report.outliers_dropped,
        "washing complete: {:?}",
        washed.shape()
    );

    // Rebalancing needs a fully numeric, fully populated feature space, so
    // fit the imputer and encoder on the training table and apply the same
    // fitted state to the holdout.
    let mut holdout = holdout;
    let features = schema.feature_columns(&washed);
    let mut filler = NaFiller::new(config.fill_method);
    filler.fit_transform(&mut washed, &features, &schema)?;
    filler.transform(&mut holdout, &features, &schema)?;

    let categorical: Vec<String> = washed
        .get_columns()
        .iter()
        .filter(|col| !schema.is_excluded(col.name().as_str()))
        .filter(|col| !is_numeric_dtype(col.dtype()))
        .map(|col| col.name().to_string())
        .collect();
    if !categorical.is_empty() {
        let mut encoder = CategoryEncoder::new();
        encoder.fit_transform(&mut washed, &categorical)?;
        encoder.transform(&mut holdout, &categorical)?;
    }

    let mut balanced = sample_data(&washed, &schema, args.method.into(), &config)?;
    info!("Rebalancing complete: {:?}", balanced.shape());

    write_csv(&mut balanced, &args.output, "train_prepared.csv")?;
    write_csv(&mut holdout, &args.output, "holdout_prepared.csv")?;

    Ok(())
}

fn write_csv(df: &mut DataFrame, output_dir: &str, file_name: &str) -> Result<()> {
    let path = Path::new(output_dir).join(file_name);
    let mut file = std::fs::File::create(&path)?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(df)?;

    info!("Wrote {}", path.display());
    Ok(())
}
