//! Explicit column schema for the preparation pipeline.
//!
//! Instead of sniffing dataframe dtypes at every stage, the pipeline carries
//! a declared schema: each column is numeric or categorical, one column is
//! the classification target, and id columns are kept out of the feature
//! space. `TableSchema::detect` builds a schema from dtypes once; callers
//! may also construct one by hand.

use crate::error::{PrepError, Result};
use crate::utils::is_numeric_dtype;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of a column for preprocessing purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Integer or floating point values.
    Numeric,
    /// String-like values with a finite vocabulary.
    Categorical,
}

/// Declared schema of a table: column kinds, target column, id columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    kinds: HashMap<String, ColumnKind>,
    target_column: String,
    id_columns: Vec<String>,
}

impl TableSchema {
    /// Build a schema with explicit column kinds.
    pub fn new(
        kinds: HashMap<String, ColumnKind>,
        target_column: impl Into<String>,
        id_columns: Vec<String>,
    ) -> Self {
        Self {
            kinds,
            target_column: target_column.into(),
            id_columns,
        }
    }

    /// Infer a schema from a frame's dtypes.
    ///
    /// Numeric dtypes map to [`ColumnKind::Numeric`], everything else to
    /// [`ColumnKind::Categorical`]. Target and id columns get entries too so
    /// the schema covers the whole frame.
    pub fn detect(
        df: &DataFrame,
        id_columns: &[String],
        target_column: &str,
    ) -> Result<Self> {
        if df.column(target_column).is_err() {
            return Err(PrepError::ColumnNotFound(target_column.to_string()));
        }
        for id in id_columns {
            if df.column(id).is_err() {
                return Err(PrepError::ColumnNotFound(id.clone()));
            }
        }

        let mut kinds = HashMap::new();
        for col in df.get_columns() {
            let kind = if is_numeric_dtype(col.dtype()) {
                ColumnKind::Numeric
            } else {
                ColumnKind::Categorical
            };
            kinds.insert(col.name().to_string(), kind);
        }

        Ok(Self {
            kinds,
            target_column: target_column.to_string(),
            id_columns: id_columns.to_vec(),
        })
    }

    /// The target column name.
    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    /// The id column names.
    pub fn id_columns(&self) -> &[String] {
        &self.id_columns
    }

    /// Kind of a column; error if the column was never declared.
    pub fn kind_of(&self, column: &str) -> Result<ColumnKind> {
        self.kinds
            .get(column)
            .copied()
            .ok_or_else(|| PrepError::ColumnNotFound(column.to_string()))
    }

    /// Whether the given column is the target or an id column.
    pub fn is_excluded(&self, column: &str) -> bool {
        column == self.target_column || self.id_columns.iter().any(|c| c == column)
    }

    /// Feature columns of a frame: present columns minus target and ids,
    /// in frame order.
    pub fn feature_columns(&self, df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .filter(|name| !self.is_excluded(name))
            .collect()
    }

    /// Numeric and categorical column name lists for a frame, feature
    /// columns only, in frame order.
    pub fn split_feature_kinds(&self, df: &DataFrame) -> Result<(Vec<String>, Vec<String>)> {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();
        for name in self.feature_columns(df) {
            match self.kind_of(&name)? {
                ColumnKind::Numeric => numeric.push(name),
                ColumnKind::Categorical => categorical.push(name),
            }
        }
        Ok((numeric, categorical))
    }

    /// Fail fast if any declared target/id column is absent from the frame.
    pub fn validate(&self, df: &DataFrame) -> Result<()> {
        if df.column(&self.target_column).is_err() {
            return Err(PrepError::ColumnNotFound(self.target_column.clone()));
        }
        for id in &self.id_columns {
            if df.column(id).is_err() {
                return Err(PrepError::ColumnNotFound(id.clone()));
            }
        }
        Ok(())
    }

    /// Register a column added after detection (e.g. a missing-value flag).
    pub fn declare(&mut self, column: impl Into<String>, kind: ColumnKind) {
        self.kinds.insert(column.into(), kind);
    }
}
