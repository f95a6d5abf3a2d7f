//! Outlier detection.
//!
//! [`OutlierDetector`] combines a multivariate isolation-forest score with a
//! univariate mean-rule cutoff applied to the score distribution, so callers
//! never pick a contamination fraction by hand. The univariate rules are also
//! exposed directly.

mod isolation_forest;

pub use isolation_forest::IsolationScorer;

use crate::config::PrepConfig;
use crate::encoding::CategoryEncoder;
use crate::error::Result;
use crate::imputers::NaFiller;
use crate::schema::TableSchema;
use crate::utils::{is_numeric_dtype, mean, median, median_abs_deviation, std_dev, to_feature_matrix};
use polars::prelude::*;
use tracing::{debug, info};

/// Scale factor relating MAD to the standard deviation of a normal sample.
const MAD_NORMAL_SCALE: f64 = 1.4826;

/// Two-stage outlier detector over a feature table.
///
/// Owns a working copy of the data; the target and id columns declared in
/// the schema are excluded from the feature space before scoring.
pub struct OutlierDetector {
    data: DataFrame,
    schema: TableSchema,
    config: PrepConfig,
}

impl OutlierDetector {
    pub fn new(data: DataFrame, schema: TableSchema, config: PrepConfig) -> Self {
        Self {
            data,
            schema,
            config,
        }
    }

    /// Positions of entries strictly outside `mean ± 3σ` (population σ).
    pub fn mean_detection(values: &[f64]) -> Vec<usize> {
        let m = mean(values);
        let sd = std_dev(values);
        let lower = m - 3.0 * sd;
        let upper = m + 3.0 * sd;

        values
            .iter()
            .enumerate()
            .filter(|(_, &v)| v < lower || v > upper)
            .map(|(i, _)| i)
            .collect()
    }

    /// Positions of entries strictly outside `median ± 3·(1.4826·MAD)`.
    pub fn median_detection(values: &[f64]) -> Vec<usize> {
        let med = median(values);
        let mad = MAD_NORMAL_SCALE * median_abs_deviation(values);
        let lower = med - 3.0 * mad;
        let upper = med + 3.0 * mad;

        values
            .iter()
            .enumerate()
            .filter(|(_, &v)| v < lower || v > upper)
            .map(|(i, _)| i)
            .collect()
    }

    /// Score every row with an isolation forest, then cut the score
    /// distribution with [`mean_detection`](Self::mean_detection).
    ///
    /// Returns the flagged row positions and logs the outlier ratio.
    pub fn isolation_forest(&self) -> Result<Vec<usize>> {
        let mut data = self.data.clone();
        let feature_columns = self.schema.feature_columns(&data);

        // Impute before scoring; flag columns join the feature space.
        let mut filler = NaFiller::new(self.config.fill_method);
        filler.fit_transform(&mut data, &feature_columns, &self.schema)?;

        // Keep features only, then encode whatever is still non-numeric.
        let keep: Vec<String> = data
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .filter(|name| !self.schema.is_excluded(name))
            .collect();
        let mut features = data.select(keep)?;

        let categorical: Vec<String> = features
            .get_columns()
            .iter()
            .filter(|col| !is_numeric_dtype(col.dtype()))
            .map(|col| col.name().to_string())
            .collect();
        if !categorical.is_empty() {
            let mut encoder = CategoryEncoder::new();
            encoder.fit_transform(&mut features, &categorical)?;
        }

        let matrix = to_feature_matrix(&features)?;
        let scorer = IsolationScorer::fit(
            &matrix,
            self.config.isolation_trees,
            self.config.isolation_sample_fraction,
            self.config.seed,
        );
        let scores = scorer.decision_scores(&matrix);
        debug!(rows = scores.len(), "isolation scoring complete");

        let outliers = Self::mean_detection(&scores);
        let ratio = if scores.is_empty() {
            0.0
        } else {
            outliers.len() as f64 / scores.len() as f64
        };
        info!(ratio, count = outliers.len(), "outlier ratio from isolation scoring");

        Ok(outliers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableSchema;

    #[test]
    fn test_mean_detection_flags_strict_exceedances() {
        let mut values: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        values.push(100.0);
        let m = mean(&values);
        let sd = std_dev(&values);
        assert!(values[20] > m + 3.0 * sd);

        assert_eq!(OutlierDetector::mean_detection(&values), vec![20]);
    }

    #[test]
    fn test_mean_detection_boundary_value_not_flagged() {
        // Values exactly on the bound are inside the normal range.
        let values = vec![-1.0, 1.0, -1.0, 1.0];
        // mean = 0, sd = 1; bounds = [-3, 3]
        assert!(OutlierDetector::mean_detection(&values).is_empty());
    }

    #[test]
    fn test_mean_detection_flags_tiny_fraction_of_normal_sample() {
        use rand::prelude::*;

        // Box-Muller standard normals; roughly 0.27% of draws fall outside
        // three sigma, so the flagged fraction must stay well under 1%.
        let mut rng = StdRng::seed_from_u64(1021);
        let mut values = Vec::with_capacity(1000);
        for _ in 0..500 {
            let u1: f64 = rng.gen::<f64>().max(1e-12);
            let u2: f64 = rng.gen();
            let r = (-2.0 * u1.ln()).sqrt();
            let theta = 2.0 * std::f64::consts::PI * u2;
            values.push(r * theta.cos());
            values.push(r * theta.sin());
        }

        let flagged = OutlierDetector::mean_detection(&values);
        assert!(
            flagged.len() <= 10,
            "flagged {} of 1000 normal draws",
            flagged.len()
        );
    }

    #[test]
    fn test_mean_detection_flags_both_tails() {
        let mut values = vec![0.0; 100];
        values[0] = 50.0;
        values[99] = -50.0;
        let flagged = OutlierDetector::mean_detection(&values);
        assert_eq!(flagged, vec![0, 99]);
    }

    #[test]
    fn test_median_detection_resists_single_outlier() {
        let mut values = vec![10.0; 21];
        for (i, v) in values.iter_mut().enumerate() {
            *v += (i % 5) as f64 * 0.1;
        }
        values[7] = 1000.0;

        let flagged = OutlierDetector::median_detection(&values);
        assert_eq!(flagged, vec![7]);
    }

    #[test]
    fn test_median_detection_uniform_values_flag_nothing() {
        let values = vec![3.0; 10];
        assert!(OutlierDetector::median_detection(&values).is_empty());
    }

    #[test]
    fn test_isolation_forest_flags_extreme_row() {
        let mut attack = vec![0.0; 60];
        let mut defense = vec![0.0; 60];
        for i in 0..60 {
            attack[i] = 50.0 + (i % 10) as f64;
            defense[i] = 40.0 + (i % 7) as f64;
        }
        attack[59] = 5000.0;
        defense[59] = -4000.0;

        let df = df![
            "attack" => attack,
            "defense" => defense,
            "win" => vec![0i64; 60],
        ]
        .unwrap();
        let schema = TableSchema::detect(&df, &[], "win").unwrap();

        let detector = OutlierDetector::new(df, schema, PrepConfig::default());
        let flagged = detector.isolation_forest().unwrap();

        assert!(flagged.contains(&59), "extreme row should be flagged: {:?}", flagged);
        assert!(flagged.len() < 6, "cutoff should flag few rows: {:?}", flagged);
    }

    #[test]
    fn test_isolation_forest_handles_missing_and_categorical() {
        let df = df![
            "attack" => [Some(10.0), Some(11.0), None, Some(9.0), Some(10.5), Some(10.2)],
            "type" => [Some("fire"), Some("water"), Some("fire"), None, Some("grass"), Some("fire")],
            "win" => [1i64, 0, 1, 0, 1, 0],
        ]
        .unwrap();
        let schema = TableSchema::detect(&df, &[], "win").unwrap();

        let detector = OutlierDetector::new(df, schema, PrepConfig::default());
        // Must not error on nulls or string columns.
        let flagged = detector.isolation_forest().unwrap();
        assert!(flagged.len() <= 6);
    }

    #[test]
    fn test_isolation_forest_deterministic() {
        let df = df![
            "a" => (0..30).map(|i| (i % 7) as f64).collect::<Vec<_>>(),
            "b" => (0..30).map(|i| (i % 5) as f64).collect::<Vec<_>>(),
            "win" => vec![0i64; 30],
        ]
        .unwrap();
        let schema = TableSchema::detect(&df, &[], "win").unwrap();

        let first = OutlierDetector::new(df.clone(), schema.clone(), PrepConfig::default())
            .isolation_forest()
            .unwrap();
        let second = OutlierDetector::new(df, schema, PrepConfig::default())
            .isolation_forest()
            .unwrap();
        assert_eq!(first, second);
    }
}
