//! Ordinal encoding for categorical feature columns.
//!
//! The anomaly scorer and the samplers operate on numeric matrices, so
//! categorical columns are mapped to stable integer codes first. Codes are
//! assigned from the sorted vocabulary seen during fit, which keeps the
//! encoding deterministic across runs.

use crate::error::{PrepError, Result};
use crate::utils::any_value_text;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::warn;

/// Code assigned to values never seen during fit.
const UNSEEN_CODE: f64 = -1.0;

/// Deterministic ordinal encoder for categorical columns.
///
/// One instance owns the per-column vocabulary built during
/// [`fit_transform`](CategoryEncoder::fit_transform) so test data can be
/// encoded consistently with [`transform`](CategoryEncoder::transform).
#[derive(Debug, Default)]
pub struct CategoryEncoder {
    vocabularies: HashMap<String, HashMap<String, f64>>,
}

impl CategoryEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the vocabulary of each column and replace it with numeric codes.
    pub fn fit_transform(&mut self, df: &mut DataFrame, columns: &[String]) -> Result<()> {
        for column in columns {
            let series = df
                .column(column)
                .map_err(|_| PrepError::ColumnNotFound(column.clone()))?
                .as_materialized_series()
                .clone();

            let vocabulary = Self::build_vocabulary(&series)?;
            let encoded = Self::encode_series(&series, &vocabulary);
            df.replace(column, encoded)?;
            self.vocabularies.insert(column.clone(), vocabulary);
        }
        Ok(())
    }

    /// Encode columns using vocabularies learned during fit.
    ///
    /// A column never fit fails with [`PrepError::NotFitted`]; values outside
    /// the fitted vocabulary map to a `-1.0` sentinel code.
    pub fn transform(&self, df: &mut DataFrame, columns: &[String]) -> Result<()> {
        for column in columns {
            let vocabulary =
                self.vocabularies
                    .get(column)
                    .ok_or_else(|| PrepError::NotFitted {
                        column: column.clone(),
                    })?;

            let series = df
                .column(column)
                .map_err(|_| PrepError::ColumnNotFound(column.clone()))?
                .as_materialized_series()
                .clone();

            let encoded = Self::encode_series(&series, vocabulary);
            df.replace(column, encoded)?;
        }
        Ok(())
    }

    fn build_vocabulary(series: &Series) -> Result<HashMap<String, f64>> {
        let mut values: Vec<String> = Vec::new();
        for i in 0..series.len() {
            let val = series.get(i)?;
            if matches!(val, AnyValue::Null) {
                continue;
            }
            let text = any_value_text(&val);
            if !values.contains(&text) {
                values.push(text);
            }
        }
        values.sort();

        Ok(values
            .into_iter()
            .enumerate()
            .map(|(code, value)| (value, code as f64))
            .collect())
    }

    fn encode_series(series: &Series, vocabulary: &HashMap<String, f64>) -> Series {
        let mut codes: Vec<Option<f64>> = Vec::with_capacity(series.len());
        for i in 0..series.len() {
            match series.get(i) {
                Ok(AnyValue::Null) | Err(_) => codes.push(None),
                Ok(val) => {
                    let text = any_value_text(&val);
                    match vocabulary.get(&text) {
                        Some(&code) => codes.push(Some(code)),
                        None => {
                            warn!(column = %series.name(), value = %text, "unseen category, coding as {}", UNSEEN_CODE);
                            codes.push(Some(UNSEEN_CODE));
                        }
                    }
                }
            }
        }
        Series::new(series.name().clone(), codes)
    }
}
