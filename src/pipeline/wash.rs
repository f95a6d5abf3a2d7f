//! Table washing: duplicates, sparse rows, outliers, id columns.

use crate::config::PrepConfig;
use crate::error::Result;
use crate::outliers::OutlierDetector;
use crate::schema::TableSchema;
use crate::utils::row_null_counts;
use polars::prelude::*;
use tracing::{debug, info, warn};

/// What [`wash_data`] did to the table.
#[derive(Debug, Clone, Default)]
pub struct WashReport {
    /// Duplicate rows removed by keep-first deduplication.
    pub duplicates_removed: usize,
    /// Rows removed for exceeding the sparse-row threshold.
    pub sparse_rows_removed: usize,
    /// Row positions (after dedup and sparse filtering) the outlier
    /// detector flagged.
    pub outlier_rows: Vec<usize>,
    /// Whether the flagged rows were dropped or only reported.
    pub outliers_dropped: bool,
}

/// Clean a table for training.
///
/// Runs keep-first deduplication, drops rows whose missing fraction exceeds
/// `config.sparse_row_threshold`, flags outlier rows with the isolation
/// detector (dropping them only when `config.drop_outliers` is set), and
/// finally removes the id columns. The target column is untouched.
pub fn wash_data(
    df: DataFrame,
    schema: &TableSchema,
    config: &PrepConfig,
) -> Result<(DataFrame, WashReport)> {
    schema.validate(&df)?;
    config.validate()?;
    let mut report = WashReport::default();

    // 1. Duplicates, first occurrence wins.
    let before = df.height();
    let mut df = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
    report.duplicates_removed = before - df.height();
    if report.duplicates_removed > 0 {
        debug!(removed = report.duplicates_removed, "removed duplicate rows");
    }

    // 2. Rows that are mostly holes.
    let before = df.height();
    if df.width() > 0 && df.height() > 0 {
        let width = df.width() as f64;
        let keep: Vec<bool> = row_null_counts(&df)
            .into_iter()
            .map(|nulls| nulls as f64 / width <= config.sparse_row_threshold)
            .collect();
        let mask = BooleanChunked::from_slice("mask".into(), &keep);
        df = df.filter(&mask)?;
    }
    report.sparse_rows_removed = before - df.height();
    if report.sparse_rows_removed > 0 {
        debug!(removed = report.sparse_rows_removed, "removed sparse rows");
    }

    // 3. Outliers: always reported, dropped only on request.
    if df.height() > 0 {
        let detector = OutlierDetector::new(df.clone(), schema.clone(), config.clone());
        report.outlier_rows = detector.isolation_forest()?;

        if config.drop_outliers && !report.outlier_rows.is_empty() {
            let mut keep = vec![true; df.height()];
            for &row in &report.outlier_rows {
                keep[row] = false;
            }
            let mask = BooleanChunked::from_slice("mask".into(), &keep);
            df = df.filter(&mask)?;
            report.outliers_dropped = true;
            info!(dropped = report.outlier_rows.len(), "dropped outlier rows");
        } else if !report.outlier_rows.is_empty() {
            warn!(
                flagged = report.outlier_rows.len(),
                rows = ?report.outlier_rows,
                "outlier rows flagged but kept"
            );
        }
    }

    // 4. Identifier columns carry no signal for the classifier.
    if !schema.id_columns().is_empty() {
        let ids: Vec<PlSmallStr> = schema
            .id_columns()
            .iter()
            .map(|s| s.as_str().into())
            .collect();
        df = df.drop_many(ids);
    }

    Ok((df, report))
}
