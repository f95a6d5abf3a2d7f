//! Missing-value filler with tracked per-column state.

use crate::config::FillMethod;
use crate::error::{PrepError, Result};
use crate::schema::{ColumnKind, TableSchema};
use crate::utils::{fill_numeric_nulls, fill_string_nulls};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Sentinel used for missing categorical values.
pub const MISSING_SENTINEL: &str = "missing";

/// Suffix of the binary columns that record where a value was imputed.
pub const FLAG_SUFFIX: &str = "_flag";

/// Fills missing values and remembers the fill rule of each numeric column.
///
/// Numeric columns get a `<col>_flag` companion column (1.0 where the value
/// was originally null) and their nulls replaced by the configured statistic;
/// the fitted value is stored so [`transform`](NaFiller::transform) can apply
/// it to new data. Categorical columns get the `"missing"` sentinel and no
/// flag column.
#[derive(Debug)]
pub struct NaFiller {
    method: FillMethod,
    fill_values: HashMap<String, f64>,
}

impl NaFiller {
    pub fn new(method: FillMethod) -> Self {
        Self {
            method,
            fill_values: HashMap::new(),
        }
    }

    /// Fit fill rules on `columns` and apply them, mutating `df` in place.
    pub fn fit_transform(
        &mut self,
        df: &mut DataFrame,
        columns: &[String],
        schema: &TableSchema,
    ) -> Result<()> {
        for column in columns {
            match schema.kind_of(column)? {
                ColumnKind::Categorical => Self::fill_categorical(df, column)?,
                ColumnKind::Numeric => {
                    let series = Self::numeric_series(df, column)?;
                    let fill_value = match self.method {
                        FillMethod::Mean => series.mean(),
                        FillMethod::Median => series.median(),
                    }
                    .ok_or_else(|| PrepError::NoValidValues(column.clone()))?;

                    Self::flag_and_fill(df, column, &series, fill_value)?;
                    self.fill_values.insert(column.clone(), fill_value);
                    debug!(column = %column, fill_value, "fitted numeric fill rule");
                }
            }
        }
        Ok(())
    }

    /// Apply previously fitted fill rules to `columns`, mutating `df` in place.
    ///
    /// A numeric column that was never fit fails with
    /// [`PrepError::NotFitted`].
    pub fn transform(
        &self,
        df: &mut DataFrame,
        columns: &[String],
        schema: &TableSchema,
    ) -> Result<()> {
        for column in columns {
            match schema.kind_of(column)? {
                ColumnKind::Categorical => Self::fill_categorical(df, column)?,
                ColumnKind::Numeric => {
                    let fill_value = *self.fill_values.get(column).ok_or_else(|| {
                        PrepError::NotFitted {
                            column: column.clone(),
                        }
                    })?;
                    let series = Self::numeric_series(df, column)?;
                    Self::flag_and_fill(df, column, &series, fill_value)?;
                }
            }
        }
        Ok(())
    }

    /// Columns a fill rule has been fitted for.
    pub fn fitted_columns(&self) -> impl Iterator<Item = &str> {
        self.fill_values.keys().map(|s| s.as_str())
    }

    fn numeric_series(df: &DataFrame, column: &str) -> Result<Series> {
        Ok(df
            .column(column)
            .map_err(|_| PrepError::ColumnNotFound(column.to_string()))?
            .as_materialized_series()
            .clone())
    }

    /// Add the `<col>_flag` column and replace nulls with `fill_value`.
    fn flag_and_fill(
        df: &mut DataFrame,
        column: &str,
        series: &Series,
        fill_value: f64,
    ) -> Result<()> {
        let mask = series.is_null();
        let flags: Vec<f64> = (0..series.len())
            .map(|i| if mask.get(i).unwrap_or(false) { 1.0 } else { 0.0 })
            .collect();
        let flag_name = format!("{}{}", column, FLAG_SUFFIX);
        df.with_column(Series::new(flag_name.as_str().into(), flags))?;

        let filled = fill_numeric_nulls(series, fill_value)?;
        df.replace(column, filled)?;
        Ok(())
    }

    fn fill_categorical(df: &mut DataFrame, column: &str) -> Result<()> {
        let series = df
            .column(column)
            .map_err(|_| PrepError::ColumnNotFound(column.to_string()))?
            .as_materialized_series()
            .clone();
        if series.null_count() > 0 {
            let filled = fill_string_nulls(&series, MISSING_SENTINEL)?;
            df.replace(column, filled)?;
        }
        Ok(())
    }
}
