//! Descriptive statistics for numeric columns.
//!
//! Everything is computed over present values only, with the sample
//! (n - 1) standard deviation and interpolated quartiles.

use crate::error::{AnalysisError, Result};
use crate::utils::{
    column_series, is_numeric_dtype, mean, quantile_sorted, sample_std, sorted_present_values,
};
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

/// Summary statistics of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStatistics {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub q1: f64,
    pub q3: f64,
    pub min: f64,
    pub max: f64,
}

/// First, second and third quartile of a column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

/// Statistics for every numeric column of a table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableDescription {
    pub columns: Vec<ColumnStatistics>,
    /// Numeric columns whose statistics could not be computed.
    pub unavailable: Vec<String>,
}

impl TableDescription {
    pub fn get(&self, column: &str) -> Option<&ColumnStatistics> {
        self.columns.iter().find(|stats| stats.column == column)
    }
}

/// Describe a numeric Series.
///
/// Signals [`AnalysisError::InsufficientData`] if no value is present.
pub fn describe(series: &Series) -> Result<ColumnStatistics> {
    let sorted = sorted_present_values(series)?;
    let n = sorted.len();

    Ok(ColumnStatistics {
        column: series.name().to_string(),
        count: n,
        mean: mean(&sorted),
        median: quantile_sorted(&sorted, 0.5),
        std: sample_std(&sorted),
        q1: quantile_sorted(&sorted, 0.25),
        q3: quantile_sorted(&sorted, 0.75),
        min: sorted[0],
        max: sorted[n - 1],
    })
}

/// Describe a column looked up by exact name.
pub fn describe_column(df: &DataFrame, name: &str) -> Result<ColumnStatistics> {
    describe(column_series(df, name)?)
}

/// Describe every numeric column, in table order.
///
/// Columns without present values are listed in
/// [`TableDescription::unavailable`] instead of failing the whole table.
pub fn describe_table(df: &DataFrame) -> Result<TableDescription> {
    let mut description = TableDescription::default();

    for column in df.get_columns() {
        if !is_numeric_dtype(column.dtype()) {
            continue;
        }
        match describe(column.as_materialized_series()) {
            Ok(stats) => description.columns.push(stats),
            Err(e) if e.is_recoverable() => {
                debug!("Skipping statistics for '{}': {}", column.name(), e);
                description.unavailable.push(column.name().to_string());
            }
            Err(e) => return Err(e),
        }
    }

    Ok(description)
}

/// Quartiles of a numeric Series.
pub fn quartiles(series: &Series) -> Result<Quartiles> {
    let sorted = sorted_present_values(series)?;
    Ok(Quartiles {
        q1: quantile_sorted(&sorted, 0.25),
        q2: quantile_sorted(&sorted, 0.5),
        q3: quantile_sorted(&sorted, 0.75),
    })
}

/// Arbitrary quantiles of a numeric Series, in the order requested.
pub fn quantiles(series: &Series, probabilities: &[f64]) -> Result<Vec<f64>> {
    if let Some(p) = probabilities.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(AnalysisError::InvalidConfig(format!(
            "quantile {} is outside [0, 1]",
            p
        )));
    }
    let sorted = sorted_present_values(series)?;
    Ok(probabilities
        .iter()
        .map(|p| quantile_sorted(&sorted, *p))
        .collect())
}
