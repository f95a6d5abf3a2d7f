//! Configuration for the preparation pipeline.
//!
//! A single [`PrepConfig`] carries the knobs for cleaning and resampling,
//! built through a fluent builder and validated before use.

use crate::error::{PrepError, Result};
use serde::{Deserialize, Serialize};

/// Statistic used to fill missing numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FillMethod {
    /// Use the mean of non-null values.
    #[default]
    Mean,
    /// Use the median of non-null values.
    Median,
}

/// Configuration for cleaning and resampling.
///
/// Use [`PrepConfig::builder()`] for fluent construction:
///
/// ```rust,ignore
/// let config = PrepConfig::builder()
///     .sparse_row_threshold(0.4)
///     .drop_outliers(true)
///     .seed(1021)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepConfig {
    /// Rows with a missing fraction above this are dropped (0.0 - 1.0).
    /// Default: 0.4 (keep rows with at least 60% populated columns).
    pub sparse_row_threshold: f64,

    /// Whether flagged outlier rows are dropped. When false they are only
    /// reported. Default: false.
    pub drop_outliers: bool,

    /// Fill statistic for missing numeric values. Default: Mean.
    pub fill_method: FillMethod,

    /// Seed for every randomized operation. Default: 1021.
    pub seed: u64,

    /// Majority/minority ratio the under-sampling step shrinks toward.
    /// Default: 1.5.
    pub target_ratio: f64,

    /// Nearest neighbors considered by SMOTE interpolation. Default: 5.
    pub smote_neighbors: usize,

    /// Number of isolation trees. Default: 100.
    pub isolation_trees: usize,

    /// Fraction of rows each isolation tree is grown on (0.0 - 1.0].
    /// Default: 0.5.
    pub isolation_sample_fraction: f64,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            sparse_row_threshold: 0.4,
            drop_outliers: false,
            fill_method: FillMethod::default(),
            seed: 1021,
            target_ratio: 1.5,
            smote_neighbors: 5,
            isolation_trees: 100,
            isolation_sample_fraction: 0.5,
        }
    }
}

impl PrepConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PrepConfigBuilder {
        PrepConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.sparse_row_threshold) {
            return Err(PrepError::InvalidConfig(format!(
                "sparse_row_threshold must be within [0, 1], got {}",
                self.sparse_row_threshold
            )));
        }
        if self.target_ratio < 1.0 {
            return Err(PrepError::InvalidConfig(format!(
                "target_ratio must be at least 1.0, got {}",
                self.target_ratio
            )));
        }
        if self.smote_neighbors == 0 {
            return Err(PrepError::InvalidConfig(
                "smote_neighbors must be at least 1".to_string(),
            ));
        }
        if self.isolation_trees == 0 {
            return Err(PrepError::InvalidConfig(
                "isolation_trees must be at least 1".to_string(),
            ));
        }
        if !(self.isolation_sample_fraction > 0.0 && self.isolation_sample_fraction <= 1.0) {
            return Err(PrepError::InvalidConfig(format!(
                "isolation_sample_fraction must be within (0, 1], got {}",
                self.isolation_sample_fraction
            )));
        }
        Ok(())
    }
}

/// Builder for [`PrepConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PrepConfigBuilder {
    sparse_row_threshold: Option<f64>,
    drop_outliers: Option<bool>,
    fill_method: Option<FillMethod>,
    seed: Option<u64>,
    target_ratio: Option<f64>,
    smote_neighbors: Option<usize>,
    isolation_trees: Option<usize>,
    isolation_sample_fraction: Option<f64>,
}

impl PrepConfigBuilder {
    /// Set the missing-fraction threshold above which rows are dropped.
    pub fn sparse_row_threshold(mut self, threshold: f64) -> Self {
        self.sparse_row_threshold = Some(threshold);
        self
    }

    /// Drop flagged outlier rows instead of only reporting them.
    pub fn drop_outliers(mut self, drop: bool) -> Self {
        self.drop_outliers = Some(drop);
        self
    }

    /// Set the fill statistic for missing numeric values.
    pub fn fill_method(mut self, method: FillMethod) -> Self {
        self.fill_method = Some(method);
        self
    }

    /// Set the seed used by all randomized operations.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the majority/minority ratio targeted by under-sampling.
    pub fn target_ratio(mut self, ratio: f64) -> Self {
        self.target_ratio = Some(ratio);
        self
    }

    /// Set the neighbor count for SMOTE interpolation.
    pub fn smote_neighbors(mut self, k: usize) -> Self {
        self.smote_neighbors = Some(k);
        self
    }

    /// Set the number of isolation trees.
    pub fn isolation_trees(mut self, n: usize) -> Self {
        self.isolation_trees = Some(n);
        self
    }

    /// Set the per-tree row sample fraction.
    pub fn isolation_sample_fraction(mut self, fraction: f64) -> Self {
        self.isolation_sample_fraction = Some(fraction);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<PrepConfig> {
        let defaults = PrepConfig::default();
        let config = PrepConfig {
            sparse_row_threshold: self
                .sparse_row_threshold
                .unwrap_or(defaults.sparse_row_threshold),
            drop_outliers: self.drop_outliers.unwrap_or(defaults.drop_outliers),
            fill_method: self.fill_method.unwrap_or(defaults.fill_method),
            seed: self.seed.unwrap_or(defaults.seed),
            target_ratio: self.target_ratio.unwrap_or(defaults.target_ratio),
            smote_neighbors: self.smote_neighbors.unwrap_or(defaults.smote_neighbors),
            isolation_trees: self.isolation_trees.unwrap_or(defaults.isolation_trees),
            isolation_sample_fraction: self
                .isolation_sample_fraction
                .unwrap_or(defaults.isolation_sample_fraction),
        };
        config.validate()?;
        Ok(config)
    }
}
