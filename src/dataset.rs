//! Loading and flattening matchup datasets.
//!
//! The raw data comes as two tables: a unit table with one row of stats per
//! unit, and a matchup table pairing two unit ids per row (plus, for
//! training data, the winner's id). [`convert_data`] joins them into one
//! flat table with a `_1`/`_2` column per combatant and a binary target.

use crate::error::{PrepError, Result};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// File layout of a matchup dataset directory.
#[derive(Debug, Clone)]
pub struct DatasetPaths {
    /// Per-unit stats table.
    pub units: PathBuf,
    /// Training matchups with a winner column.
    pub matches: PathBuf,
    /// Holdout matchups without a winner.
    pub holdout: PathBuf,
}

impl DatasetPaths {
    /// Conventional file names inside a dataset directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            units: dir.join("pokemon.csv"),
            matches: dir.join("combats.csv"),
            holdout: dir.join("tests.csv"),
        }
    }
}

/// The three tables of a matchup dataset.
#[derive(Debug)]
pub struct MatchupDataset {
    pub units: DataFrame,
    pub matches: DataFrame,
    pub holdout: DataFrame,
}

/// Column names tying a matchup table to its unit table.
#[derive(Debug, Clone)]
pub struct MatchupColumns<'a> {
    /// Id column of the unit table.
    pub unit_id: &'a str,
    /// Matchup column holding the first combatant's id.
    pub first: &'a str,
    /// Matchup column holding the second combatant's id.
    pub second: &'a str,
    /// Matchup column holding the winner's id, absent for holdout data.
    pub winner: Option<&'a str>,
    /// Name of the target column in the flattened output.
    pub target: &'a str,
}

/// Load the three tables of a dataset directory.
pub fn fetch_data(paths: &DatasetPaths) -> Result<MatchupDataset> {
    let units = read_csv(&paths.units)?;
    let matches = read_csv(&paths.matches)?;
    let holdout = read_csv(&paths.holdout)?;
    info!(
        units = units.height(),
        matches = matches.height(),
        holdout = holdout.height(),
        "loaded matchup dataset"
    );
    Ok(MatchupDataset {
        units,
        matches,
        holdout,
    })
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    Ok(CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?)
}

/// Flatten matchups into one row per fight.
///
/// Every unit column except the id appears twice in the output, suffixed
/// `_1` and `_2` for the first and second combatant. The target column is
/// `1` when the first combatant won and `0` otherwise; when
/// `columns.winner` is `None` (holdout data) the target is all null.
pub fn convert_data(
    pairs: &DataFrame,
    units: &DataFrame,
    columns: &MatchupColumns,
) -> Result<DataFrame> {
    let unit_rows = id_index(units, columns.unit_id)?;
    let first_ids = id_column(pairs, columns.first)?;
    let second_ids = id_column(pairs, columns.second)?;

    let first_rows = lookup_rows(&first_ids, &unit_rows)?;
    let second_rows = lookup_rows(&second_ids, &unit_rows)?;

    let mut out: Vec<Column> = Vec::new();
    for (suffix, rows) in [("_1", &first_rows), ("_2", &second_rows)] {
        for col in units.get_columns() {
            if col.name().as_str() == columns.unit_id {
                continue;
            }
            let taken = col.as_materialized_series().take(rows)?;
            let name = format!("{}{}", col.name(), suffix);
            out.push(taken.with_name(name.as_str().into()).into_column());
        }
    }

    let target: Series = match columns.winner {
        Some(winner) => {
            let winner_ids = id_column(pairs, winner)?;
            let flags: Vec<i64> = winner_ids
                .iter()
                .zip(first_ids.iter())
                .map(|(w, f)| i64::from(w == f))
                .collect();
            Series::new(columns.target.into(), flags)
        }
        None => Series::new(columns.target.into(), vec![None::<i64>; pairs.height()]),
    };
    out.push(target.into_column());

    Ok(DataFrame::new(out)?)
}

/// Map each unit id to its row position.
fn id_index(units: &DataFrame, unit_id: &str) -> Result<HashMap<i64, IdxSize>> {
    let ids = id_column(units, unit_id)?;
    let mut index = HashMap::with_capacity(ids.len());
    for (row, id) in ids.into_iter().enumerate() {
        index.entry(id).or_insert(row as IdxSize);
    }
    Ok(index)
}

fn id_column(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    let series = df
        .column(name)
        .map_err(|_| PrepError::ColumnNotFound(name.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Int64)
        .map_err(|_| PrepError::NonNumericFeature(name.to_string()))?;
    let chunked = series
        .i64()
        .map_err(|_| PrepError::NonNumericFeature(name.to_string()))?;

    let mut ids = Vec::with_capacity(chunked.len());
    for value in chunked {
        match value {
            Some(v) => ids.push(v),
            None => return Err(PrepError::NoValidValues(name.to_string())),
        }
    }
    Ok(ids)
}

fn lookup_rows(ids: &[i64], index: &HashMap<i64, IdxSize>) -> Result<IdxCa> {
    let mut rows = Vec::with_capacity(ids.len());
    for &id in ids {
        match index.get(&id) {
            Some(&row) => rows.push(row),
            None => return Err(PrepError::UnknownUnit(id)),
        }
    }
    Ok(IdxCa::from_vec("idx".into(), rows))
}
