//! Random under-sampling.

use super::split_classes;
use crate::config::PrepConfig;
use crate::error::{PrepError, Result};
use crate::schema::TableSchema;
use polars::prelude::*;
use rand::prelude::*;
use tracing::info;

/// Shrinks the majority class by dropping random rows.
pub struct UnderSampler;

impl UnderSampler {
    /// Drop random majority rows until the majority/minority ratio reaches
    /// `config.target_ratio`.
    ///
    /// Fails with [`PrepError::RatioError`] when the requested ratio exceeds
    /// the current one; under-sampling cannot add rows. Surviving rows keep
    /// their original relative order and all columns.
    pub fn random_sample(
        df: &DataFrame,
        schema: &TableSchema,
        config: &PrepConfig,
    ) -> Result<DataFrame> {
        let split = split_classes(df, schema)?;
        let current = split.ratio();
        let requested = config.target_ratio;
        if requested > current {
            return Err(PrepError::RatioError { current, requested });
        }

        let keep_majority = ((requested * split.minority.len() as f64).round() as usize)
            .min(split.majority.len());

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut majority = split.majority.clone();
        majority.shuffle(&mut rng);
        majority.truncate(keep_majority);

        let mut keep: Vec<usize> = majority;
        keep.extend_from_slice(&split.minority);
        keep.sort_unstable();

        info!(
            dropped = split.majority.len() - keep_majority,
            kept = keep.len(),
            ratio = requested,
            "under-sampled majority class"
        );

        let indices = IdxCa::from_vec(
            "idx".into(),
            keep.into_iter().map(|i| i as IdxSize).collect(),
        );
        Ok(df.take(&indices)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::split_classes;

    fn imbalanced_frame() -> DataFrame {
        let mut attack = Vec::new();
        let mut win = Vec::new();
        for i in 0..30 {
            attack.push(i as f64);
            win.push(1i64);
        }
        for i in 0..10 {
            attack.push(100.0 + i as f64);
            win.push(0i64);
        }
        df!["attack" => attack, "win" => win].unwrap()
    }

    fn schema_for(df: &DataFrame) -> TableSchema {
        TableSchema::detect(df, &[], "win").unwrap()
    }

    #[test]
    fn test_under_sampling_reaches_target_ratio() {
        let df = imbalanced_frame();
        let schema = schema_for(&df);
        let config = PrepConfig::default(); // target_ratio 1.5

        let reduced = UnderSampler::random_sample(&df, &schema, &config).unwrap();
        let split = split_classes(&reduced, &schema).unwrap();

        assert_eq!(split.minority.len(), 10);
        assert_eq!(split.majority.len(), 15);
    }

    #[test]
    fn test_minority_rows_are_untouched() {
        let df = imbalanced_frame();
        let schema = schema_for(&df);
        let config = PrepConfig::default();

        let reduced = UnderSampler::random_sample(&df, &schema, &config).unwrap();
        let attack = reduced.column("attack").unwrap().f64().unwrap();
        let win = reduced.column("win").unwrap().i64().unwrap();

        let minority_attacks: Vec<f64> = (0..reduced.height())
            .filter(|&i| win.get(i) == Some(0))
            .map(|i| attack.get(i).unwrap())
            .collect();
        let expected: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        assert_eq!(minority_attacks, expected);
    }

    #[test]
    fn test_requested_ratio_above_current_fails() {
        let df = df![
            "attack" => [1.0, 2.0, 3.0],
            "win" => [1i64, 1, 0],
        ]
        .unwrap();
        let schema = schema_for(&df);
        let config = PrepConfig::builder().target_ratio(3.0).build().unwrap();

        let result = UnderSampler::random_sample(&df, &schema, &config);
        assert!(matches!(
            result,
            Err(PrepError::RatioError { requested, .. }) if requested == 3.0
        ));
    }

    #[test]
    fn test_deterministic_under_seed() {
        let df = imbalanced_frame();
        let schema = schema_for(&df);
        let config = PrepConfig::default();

        let a = UnderSampler::random_sample(&df, &schema, &config).unwrap();
        let b = UnderSampler::random_sample(&df, &schema, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_row_order_is_preserved() {
        let df = imbalanced_frame();
        let schema = schema_for(&df);
        let config = PrepConfig::default();

        let reduced = UnderSampler::random_sample(&df, &schema, &config).unwrap();
        let attack = reduced.column("attack").unwrap().f64().unwrap();

        // The source frame was sorted by attack, so surviving rows must be too.
        let values: Vec<f64> = (0..reduced.height())
            .map(|i| attack.get(i).unwrap())
            .collect();
        let mut sorted = values.clone();
        sorted.sort_by(|x, y| x.partial_cmp(y).unwrap());
        assert_eq!(values, sorted);
    }
}
