//! Missing-value imputation.
//!
//! [`NaFiller`] owns the per-column fill state created during fit so train
//! and test tables are imputed consistently.

mod na_filler;

pub use na_filler::{NaFiller, FLAG_SUFFIX, MISSING_SENTINEL};
