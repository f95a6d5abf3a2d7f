//! Error types for the combat-data preparation pipeline.
//!
//! Every failure mode the pipeline can hit is a typed variant here; stages
//! either fully succeed or return one of these. Nothing is swallowed.

use thiserror::Error;

/// The main error type for the preparation pipeline.
#[derive(Error, Debug)]
pub enum PrepError {
    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No valid values found in a column for computation.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// `NaFiller::transform` called for a numeric column never seen during fit.
    #[error("Column '{column}' was not fitted; call fit_transform before transform")]
    NotFitted { column: String },

    /// A column expected to be numeric could not be used as such.
    #[error("Column '{0}' is not numeric; encode it before resampling")]
    NonNumericFeature(String),

    /// A feature column still holds nulls where a full matrix is required.
    #[error("Column '{0}' contains missing values; impute before resampling")]
    MissingValues(String),

    /// Under-sampling requested with a target ratio above the current ratio.
    #[error(
        "Cannot under-sample to ratio {requested:.3}: current majority/minority ratio is only {current:.3}"
    )]
    RatioError { current: f64, requested: f64 },

    /// Target column has more than two distinct labels.
    #[error("Target column '{column}' has {classes} distinct labels; only binary targets are supported")]
    MultiClassTarget { column: String, classes: usize },

    /// Unrecognized sampling method name.
    #[error("Unknown sampling method '{0}' (expected 'both', 'under-sampling' or 'over-sampling')")]
    UnknownMethod(String),

    /// A matchup references a unit id absent from the unit table.
    #[error("Matchup references unit id {0} which is not in the unit table")]
    UnknownUnit(i64),

    /// A class is too small to synthesize neighbors from.
    #[error("Class {label} has only {count} row(s); SMOTE needs at least 2")]
    InsufficientClassSamples { label: i64, count: usize },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PrepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_error_message() {
        let err = PrepError::RatioError {
            current: 1.2,
            requested: 1.5,
        };
        let msg = err.to_string();
        assert!(msg.contains("1.500"));
        assert!(msg.contains("1.200"));
    }

    #[test]
    fn test_not_fitted_message() {
        let err = PrepError::NotFitted {
            column: "attack".to_string(),
        };
        assert!(err.to_string().contains("attack"));
        assert!(err.to_string().contains("fit_transform"));
    }

    #[test]
    fn test_unknown_method_message() {
        let err = PrepError::UnknownMethod("sideways-sampling".to_string());
        assert!(err.to_string().contains("sideways-sampling"));
    }
}
