//! Missing-value imputation.
//!
//! Numeric columns are filled with their median, every other column with its
//! mode. Imputation always produces a new table; the caller decides when to
//! adopt it.

mod statistical;

pub use statistical::{Imputation, ImputationMethod, ImputationStep, StatisticalImputer};

use crate::error::Result;
use polars::prelude::DataFrame;

/// Shorthand for [`StatisticalImputer::impute`].
pub fn impute(df: &DataFrame) -> Result<DataFrame> {
    StatisticalImputer::impute(df)
}
