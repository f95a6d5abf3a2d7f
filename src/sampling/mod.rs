//! Class rebalancing for binary targets.
//!
//! [`OverSampler`] synthesizes minority rows with SMOTE interpolation;
//! [`UnderSampler`] drops random majority rows. Both are deterministic under
//! the configured seed.

mod random;
mod smote;

pub use random::UnderSampler;
pub use smote::OverSampler;

use crate::error::{PrepError, Result};
use crate::schema::TableSchema;
use polars::prelude::*;

/// Row positions of the two classes of a binary target.
///
/// `majority` always holds at least as many rows as `minority`; an exact tie
/// is broken by label value, with the smaller label taken as majority.
#[derive(Debug)]
pub(crate) struct ClassSplit {
    pub majority_label: i64,
    pub majority: Vec<usize>,
    pub minority_label: i64,
    pub minority: Vec<usize>,
}

impl ClassSplit {
    /// Majority count over minority count.
    pub fn ratio(&self) -> f64 {
        self.majority.len() as f64 / self.minority.len() as f64
    }
}

/// Partition the rows of `df` by its binary target column.
///
/// Fails with [`PrepError::MultiClassTarget`] for more than two labels and
/// with [`PrepError::NoValidValues`] if the target has nulls or no rows.
pub(crate) fn split_classes(df: &DataFrame, schema: &TableSchema) -> Result<ClassSplit> {
    let target = schema.target_column();
    let labels = target_labels(df, target)?;

    let mut distinct: Vec<i64> = labels.clone();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() != 2 {
        return Err(PrepError::MultiClassTarget {
            column: target.to_string(),
            classes: distinct.len(),
        });
    }

    let (a, b) = (distinct[0], distinct[1]);
    let a_rows: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, &l)| l == a)
        .map(|(i, _)| i)
        .collect();
    let b_rows: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, &l)| l == b)
        .map(|(i, _)| i)
        .collect();

    // Tie on counts goes to the smaller label so the split is deterministic.
    if a_rows.len() >= b_rows.len() {
        Ok(ClassSplit {
            majority_label: a,
            majority: a_rows,
            minority_label: b,
            minority: b_rows,
        })
    } else {
        Ok(ClassSplit {
            majority_label: b,
            majority: b_rows,
            minority_label: a,
            minority: a_rows,
        })
    }
}

/// The target column as integer labels; nulls are rejected.
pub(crate) fn target_labels(df: &DataFrame, target: &str) -> Result<Vec<i64>> {
    let series = df
        .column(target)
        .map_err(|_| PrepError::ColumnNotFound(target.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Int64)
        .map_err(|_| PrepError::NonNumericFeature(target.to_string()))?;

    let chunked = series
        .i64()
        .map_err(|_| PrepError::NonNumericFeature(target.to_string()))?;

    let mut labels = Vec::with_capacity(chunked.len());
    for value in chunked {
        match value {
            Some(v) => labels.push(v),
            None => return Err(PrepError::NoValidValues(target.to_string())),
        }
    }
    if labels.is_empty() {
        return Err(PrepError::NoValidValues(target.to_string()));
    }
    Ok(labels)
}
