//! SMOTE over-sampling.

use super::{split_classes, target_labels};
use crate::config::PrepConfig;
use crate::error::{PrepError, Result};
use crate::schema::TableSchema;
use crate::utils::to_feature_matrix;
use ndarray::Array2;
use polars::prelude::*;
use rand::prelude::*;
use tracing::info;

/// Synthesizes minority-class rows by interpolating between nearest
/// neighbors until both classes have equal counts.
pub struct OverSampler;

impl OverSampler {
    /// Over-sample the minority class of a binary target up to parity.
    ///
    /// Every feature column must already be numeric and fully imputed;
    /// a null feature cell is an error. The output holds the
    /// feature columns (as Float64) plus the target, with the synthetic rows
    /// appended after the originals.
    pub fn smote_sample(
        df: &DataFrame,
        schema: &TableSchema,
        config: &PrepConfig,
    ) -> Result<DataFrame> {
        let split = split_classes(df, schema)?;
        let feature_names = schema.feature_columns(df);
        let matrix = to_feature_matrix(&df.select(feature_names.clone())?)?;
        let labels = target_labels(df, schema.target_column())?;

        let n_minority = split.minority.len();
        let n_synthetic = split.majority.len() - n_minority;
        if n_synthetic == 0 {
            return Self::assemble(&feature_names, &matrix, &labels, &[], 0, schema);
        }
        if n_minority < 2 {
            return Err(PrepError::InsufficientClassSamples {
                label: split.minority_label,
                count: n_minority,
            });
        }

        let k = config.smote_neighbors.min(n_minority - 1);
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut synthetic: Vec<f64> = Vec::with_capacity(n_synthetic * matrix.ncols());

        for _ in 0..n_synthetic {
            let base = split.minority[rng.gen_range(0..n_minority)];
            let neighbors = Self::nearest_minority(&matrix, base, &split.minority, k);
            let neighbor = neighbors[rng.gen_range(0..neighbors.len())];
            let gap: f64 = rng.gen();

            for j in 0..matrix.ncols() {
                let origin = matrix[[base, j]];
                let step = matrix[[neighbor, j]] - origin;
                synthetic.push(origin + gap * step);
            }
        }

        info!(
            synthesized = n_synthetic,
            minority_label = split.minority_label,
            "SMOTE brought classes to parity"
        );
        Self::assemble(
            &feature_names,
            &matrix,
            &labels,
            &synthetic,
            split.minority_label,
            schema,
        )
    }

    /// Indices of the `k` minority rows closest to `base` (excluding itself).
    fn nearest_minority(
        matrix: &Array2<f64>,
        base: usize,
        minority: &[usize],
        k: usize,
    ) -> Vec<usize> {
        let mut distances: Vec<(usize, f64)> = minority
            .iter()
            .filter(|&&row| row != base)
            .map(|&row| {
                let d: f64 = (0..matrix.ncols())
                    .map(|j| {
                        let delta = matrix[[row, j]] - matrix[[base, j]];
                        delta * delta
                    })
                    .sum();
                (row, d)
            })
            .collect();
        distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        distances.truncate(k);
        distances.into_iter().map(|(row, _)| row).collect()
    }

    /// Rebuild a frame of feature columns plus target from the original
    /// matrix and the flat synthetic row buffer.
    fn assemble(
        feature_names: &[String],
        matrix: &Array2<f64>,
        labels: &[i64],
        synthetic: &[f64],
        minority_label: i64,
        schema: &TableSchema,
    ) -> Result<DataFrame> {
        let n_cols = matrix.ncols();
        let n_synth = if n_cols == 0 {
            0
        } else {
            synthetic.len() / n_cols
        };

        let mut columns: Vec<Column> = Vec::with_capacity(n_cols + 1);
        for (j, name) in feature_names.iter().enumerate() {
            let mut values: Vec<f64> = matrix.column(j).to_vec();
            values.extend((0..n_synth).map(|s| synthetic[s * n_cols + j]));
            columns.push(Column::new(name.as_str().into(), values));
        }

        let mut target: Vec<i64> = labels.to_vec();
        target.extend(std::iter::repeat(minority_label).take(n_synth));
        columns.push(Column::new(schema.target_column().into(), target));

        Ok(DataFrame::new(columns)?)
    }
}
