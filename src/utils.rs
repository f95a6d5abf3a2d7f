//! Shared helpers for the preparation pipeline.
//!
//! Dtype checks, null filling, and the univariate statistics used by the
//! outlier rules live here so the stage modules stay focused.

use crate::error::{PrepError, Result};
use ndarray::Array2;
use polars::prelude::*;

// =============================================================================
// Data type utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// Series transformation utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value.
///
/// The result is always Float64 so fitted fill values round-trip exactly.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let mask = series.is_null();
    let len = series.len();
    let mut result_vec = Vec::with_capacity(len);

    for i in 0..len {
        if mask.get(i).unwrap_or(false) {
            result_vec.push(Some(fill_value));
        } else {
            let val = series.get(i)?;
            result_vec.push(Some(val.try_extract::<f64>()?));
        }
    }

    Ok(Series::new(series.name().clone(), result_vec))
}

/// Fill null values in a string Series with a specific value.
///
/// Non-null cells pass through verbatim.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let len = series.len();
    let mut result_vec = Vec::with_capacity(len);

    for i in 0..len {
        let val = series.get(i)?;
        if matches!(val, AnyValue::Null) {
            result_vec.push(Some(fill_value.to_string()));
        } else {
            result_vec.push(Some(any_value_text(&val)));
        }
    }

    Ok(Series::new(series.name().clone(), result_vec))
}

/// Canonical text form of a cell, with string quoting stripped.
///
/// `AnyValue`'s Display wraps strings in quotes; going through this keeps
/// cell values byte-identical when they round-trip a fill or an encoding.
pub(crate) fn any_value_text(val: &AnyValue) -> String {
    match val {
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => format!("{}", other),
    }
}

/// Count null cells per row across all columns of a frame.
pub fn row_null_counts(df: &DataFrame) -> Vec<usize> {
    let mut counts = vec![0usize; df.height()];
    for col in df.get_columns() {
        let mask = col.as_materialized_series().is_null();
        for (i, is_null) in mask.into_iter().enumerate() {
            if is_null.unwrap_or(false) {
                counts[i] += 1;
            }
        }
    }
    counts
}

// =============================================================================
// Matrix conversion
// =============================================================================

/// Convert a frame of numeric columns into a row-major `Array2<f64>`.
///
/// Every column must cast to Float64 and be fully populated; a column with
/// null cells is rejected, so callers impute first.
pub fn to_feature_matrix(df: &DataFrame) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = df.width();
    let mut matrix = Array2::zeros((n_rows, n_cols));

    for (j, col) in df.get_columns().iter().enumerate() {
        let series = col.as_materialized_series();
        if !is_numeric_dtype(series.dtype()) {
            return Err(PrepError::NonNumericFeature(series.name().to_string()));
        }
        if series.null_count() > 0 {
            return Err(PrepError::MissingValues(series.name().to_string()));
        }
        let casted = series
            .cast(&DataType::Float64)
            .map_err(|_| PrepError::NonNumericFeature(series.name().to_string()))?;
        let values = casted
            .f64()
            .map_err(|_| PrepError::NonNumericFeature(series.name().to_string()))?;
        for (i, val) in values.into_no_null_iter().enumerate() {
            matrix[[i, j]] = val;
        }
    }

    Ok(matrix)
}

// =============================================================================
// Univariate statistics
// =============================================================================

/// Arithmetic mean of a slice. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation of a slice.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Median of a slice. Returns 0.0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Median absolute deviation of a slice.
pub fn median_abs_deviation(values: &[f64]) -> f64 {
    let med = median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    median(&deviations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(is_numeric_dtype(&DataType::UInt8));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_fill_numeric_nulls() {
        let series = Series::new("test".into(), &[Some(1.0), None, Some(3.0)]);
        let filled = fill_numeric_nulls(&series, 0.0).unwrap();

        assert_eq!(filled.get(0).unwrap().try_extract::<f64>().unwrap(), 1.0);
        assert_eq!(filled.get(1).unwrap().try_extract::<f64>().unwrap(), 0.0);
        assert_eq!(filled.get(2).unwrap().try_extract::<f64>().unwrap(), 3.0);
        assert_eq!(filled.null_count(), 0);
    }

    #[test]
    fn test_fill_string_nulls() {
        let series = Series::new("test".into(), &[Some("a"), None, Some("b")]);
        let filled = fill_string_nulls(&series, "missing").unwrap();
        assert_eq!(filled.null_count(), 0);

        let values = filled.str().unwrap();
        assert_eq!(values.get(0), Some("a"));
        assert_eq!(values.get(1), Some("missing"));
        assert_eq!(values.get(2), Some("b"));
    }

    #[test]
    fn test_row_null_counts() {
        let df = df![
            "a" => [Some(1.0), None, Some(3.0)],
            "b" => [None::<&str>, None, Some("x")],
        ]
        .unwrap();
        assert_eq!(row_null_counts(&df), vec![1, 2, 0]);
    }

    #[test]
    fn test_to_feature_matrix() {
        let df = df![
            "a" => [1.0, 2.0],
            "b" => [3i64, 4],
        ]
        .unwrap();
        let matrix = to_feature_matrix(&df).unwrap();
        assert_eq!(matrix.shape(), &[2, 2]);
        assert_eq!(matrix[[0, 1]], 3.0);
        assert_eq!(matrix[[1, 0]], 2.0);
    }

    #[test]
    fn test_to_feature_matrix_rejects_nulls() {
        let df = df!["a" => [Some(1.0), None, Some(3.0)]].unwrap();
        assert!(matches!(
            to_feature_matrix(&df),
            Err(PrepError::MissingValues(c)) if c == "a"
        ));
    }

    #[test]
    fn test_to_feature_matrix_rejects_strings() {
        let df = df!["a" => ["x", "y"]].unwrap();
        assert!(matches!(
            to_feature_matrix(&df),
            Err(PrepError::NonNumericFeature(_))
        ));
    }

    #[test]
    fn test_mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), 5.0);
        assert!((std_dev(&values) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[1.0, 3.0, 2.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_median_abs_deviation() {
        // median = 2.5, deviations = [1.5, 0.5, 0.5, 1.5], mad = 1
        assert_eq!(median_abs_deviation(&[1.0, 2.0, 3.0, 4.0]), 1.0);
    }
}
