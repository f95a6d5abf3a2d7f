//! Class rebalancing entry point.

use crate::config::PrepConfig;
use crate::error::{PrepError, Result};
use crate::sampling::{split_classes, OverSampler, UnderSampler};
use crate::schema::TableSchema;
use polars::prelude::*;
use std::str::FromStr;
use tracing::{info, warn};

/// How the class balance is restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMethod {
    /// Under-sample the majority toward the target ratio, then SMOTE the
    /// minority up to parity.
    Both,
    /// Only drop random majority rows.
    UnderSampling,
    /// Only synthesize minority rows.
    OverSampling,
}

impl FromStr for SampleMethod {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "both" => Ok(SampleMethod::Both),
            "under-sampling" => Ok(SampleMethod::UnderSampling),
            "over-sampling" => Ok(SampleMethod::OverSampling),
            other => Err(PrepError::UnknownMethod(other.to_string())),
        }
    }
}

/// Rebalance a binary-target table.
///
/// The target must have exactly two labels; anything else fails with
/// [`PrepError::MultiClassTarget`]. Over-sampling requires every feature
/// column to be numeric and returns only the feature columns plus the
/// target; pure under-sampling keeps all columns.
pub fn sample_data(
    df: &DataFrame,
    schema: &TableSchema,
    method: SampleMethod,
    config: &PrepConfig,
) -> Result<DataFrame> {
    config.validate()?;
    let split = split_classes(df, schema)?;
    info!(
        majority = split.majority.len(),
        minority = split.minority.len(),
        ratio = split.ratio(),
        ?method,
        "rebalancing classes"
    );

    match method {
        SampleMethod::UnderSampling => under_sample_clamped(df, schema, config),
        SampleMethod::OverSampling => OverSampler::smote_sample(df, schema, config),
        SampleMethod::Both => {
            let reduced = under_sample_clamped(df, schema, config)?;
            OverSampler::smote_sample(&reduced, schema, config)
        }
    }
}

/// Under-sample toward the target ratio, or pass through unchanged when the
/// classes are already at least that balanced.
fn under_sample_clamped(
    df: &DataFrame,
    schema: &TableSchema,
    config: &PrepConfig,
) -> Result<DataFrame> {
    let split = split_classes(df, schema)?;
    if split.ratio() <= config.target_ratio {
        warn!(
            current = split.ratio(),
            target = config.target_ratio,
            "classes already within target ratio, skipping under-sampling"
        );
        return Ok(df.clone());
    }
    UnderSampler::random_sample(df, schema, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced_frame() -> DataFrame {
        let mut attack = Vec::new();
        let mut defense = Vec::new();
        let mut win = Vec::new();
        for i in 0..100 {
            attack.push(50.0 + (i % 11) as f64);
            defense.push(30.0 + (i % 7) as f64);
            win.push(1i64);
        }
        for i in 0..10 {
            attack.push(10.0 + (i % 4) as f64);
            defense.push(80.0 + (i % 3) as f64);
            win.push(0i64);
        }
        df!["attack" => attack, "defense" => defense, "win" => win].unwrap()
    }

    fn schema_for(df: &DataFrame) -> TableSchema {
        TableSchema::detect(df, &[], "win").unwrap()
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!(SampleMethod::from_str("both").unwrap(), SampleMethod::Both);
        assert_eq!(
            SampleMethod::from_str("under-sampling").unwrap(),
            SampleMethod::UnderSampling
        );
        assert_eq!(
            SampleMethod::from_str("over-sampling").unwrap(),
            SampleMethod::OverSampling
        );
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        let result = SampleMethod::from_str("oversampling");
        assert!(matches!(result, Err(PrepError::UnknownMethod(m)) if m == "oversampling"));
    }

    #[test]
    fn test_both_reaches_parity() {
        let df = imbalanced_frame();
        let schema = schema_for(&df);

        let balanced = sample_data(&df, &schema, SampleMethod::Both, &PrepConfig::default()).unwrap();

        // 100:10 under-samples to 15:10, then SMOTE brings 10 up to 15.
        assert_eq!(balanced.height(), 30);
        let split = split_classes(&balanced, &schema).unwrap();
        assert_eq!(split.majority.len(), 15);
        assert_eq!(split.minority.len(), 15);
    }

    #[test]
    fn test_under_sampling_only() {
        let df = imbalanced_frame();
        let schema = schema_for(&df);

        let reduced =
            sample_data(&df, &schema, SampleMethod::UnderSampling, &PrepConfig::default()).unwrap();
        let split = split_classes(&reduced, &schema).unwrap();
        assert_eq!(split.majority.len(), 15);
        assert_eq!(split.minority.len(), 10);
    }

    #[test]
    fn test_under_sampling_skipped_when_already_balanced() {
        let df = df![
            "attack" => [1.0, 2.0, 3.0, 4.0],
            "win" => [1i64, 0, 1, 0],
        ]
        .unwrap();
        let schema = schema_for(&df);

        let out =
            sample_data(&df, &schema, SampleMethod::UnderSampling, &PrepConfig::default()).unwrap();
        assert_eq!(out, df);
    }

    #[test]
    fn test_over_sampling_only() {
        let df = imbalanced_frame();
        let schema = schema_for(&df);

        let balanced =
            sample_data(&df, &schema, SampleMethod::OverSampling, &PrepConfig::default()).unwrap();
        let split = split_classes(&balanced, &schema).unwrap();
        assert_eq!(split.majority.len(), 100);
        assert_eq!(split.minority.len(), 100);
    }

    #[test]
    fn test_multiclass_target_fails() {
        let df = df![
            "attack" => [1.0, 2.0, 3.0],
            "win" => [0i64, 1, 2],
        ]
        .unwrap();
        let schema = schema_for(&df);
        let result = sample_data(&df, &schema, SampleMethod::Both, &PrepConfig::default());
        assert!(matches!(result, Err(PrepError::MultiClassTarget { .. })));
    }

    #[test]
    fn test_sample_deterministic_under_seed() {
        let df = imbalanced_frame();
        let schema = schema_for(&df);
        let config = PrepConfig::default();

        let a = sample_data(&df, &schema, SampleMethod::Both, &config).unwrap();
        let b = sample_data(&df, &schema, SampleMethod::Both, &config).unwrap();
        assert_eq!(a, b);
    }
}
