//! Combat Outcome Data Preparation
//!
//! Turns raw matchup data into a clean, balanced table ready for a binary
//! win/loss classifier, built on Polars.
//!
//! # Overview
//!
//! The pipeline has two entry points:
//!
//! - **Washing** ([`wash_data`]): duplicate removal, sparse-row dropping,
//!   isolation-forest outlier detection, and id-column removal
//! - **Rebalancing** ([`sample_data`]): SMOTE over-sampling and random
//!   under-sampling toward a configurable majority/minority ratio
//!
//! Around them sit the fit/transform components: [`NaFiller`] for tracked
//! missing-value imputation, [`CategoryEncoder`] for deterministic ordinal
//! encoding, and [`OutlierDetector`] for standalone outlier scoring. All
//! randomness is seeded through [`PrepConfig`], so every run of the same
//! input produces the same output.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use combat_prep::{
//!     sample_data, wash_data, PrepConfig, SampleMethod, TableSchema,
//! };
//!
//! let schema = TableSchema::detect(&df, &[], "win")?;
//! let config = PrepConfig::builder()
//!     .drop_outliers(true)
//!     .seed(1021)
//!     .build()?;
//!
//! let (washed, report) = wash_data(df, &schema, &config)?;
//! let balanced = sample_data(&washed, &schema, SampleMethod::Both, &config)?;
//! ```

pub mod config;
pub mod dataset;
pub mod encoding;
pub mod error;
pub mod imputers;
pub mod outliers;
pub mod pipeline;
pub mod sampling;
pub mod schema;
pub mod utils;

pub use config::{FillMethod, PrepConfig, PrepConfigBuilder};
pub use dataset::{convert_data, fetch_data, DatasetPaths, MatchupColumns, MatchupDataset};
pub use encoding::CategoryEncoder;
pub use error::{PrepError, Result};
pub use imputers::NaFiller;
pub use outliers::{IsolationScorer, OutlierDetector};
pub use pipeline::{sample_data, wash_data, SampleMethod, WashReport};
pub use sampling::{OverSampler, UnderSampler};
pub use schema::{ColumnKind, TableSchema};
