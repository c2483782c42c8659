//! Outlier detection with Tukey's IQR fences.
//!
//! Quartiles are interpolated between order statistics. Values strictly
//! outside `[Q1 - k*IQR, Q3 + k*IQR]` are outliers; `k` defaults to 1.5.

use crate::config::DEFAULT_OUTLIER_MULTIPLIER;
use crate::error::{AnalysisError, Result};
use crate::utils::{column_series, quantile_sorted, sorted_present_values};
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

/// Quartiles, fences and outlier count of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    pub column: String,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub outlier_count: usize,
    /// Number of non-missing values the report was computed from.
    pub present_count: usize,
}

impl OutlierReport {
    /// Check whether a value falls outside the fences.
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower_bound || value > self.upper_bound
    }

    /// Share of present values that are outliers, in `[0, 1]`.
    pub fn outlier_fraction(&self) -> f64 {
        self.outlier_count as f64 / self.present_count as f64
    }
}

/// Detects outliers with a configurable fence multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierDetector {
    multiplier: f64,
}

impl Default for OutlierDetector {
    fn default() -> Self {
        Self {
            multiplier: DEFAULT_OUTLIER_MULTIPLIER,
        }
    }
}

impl OutlierDetector {
    /// Create a detector. The multiplier must be positive and finite.
    pub fn new(multiplier: f64) -> Result<Self> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "outlier multiplier must be positive, got {}",
                multiplier
            )));
        }
        Ok(Self { multiplier })
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Compute the outlier report of a numeric Series.
    ///
    /// Missing values are dropped first. A Series without present values
    /// yields [`AnalysisError::InsufficientData`].
    pub fn detect(&self, series: &Series) -> Result<OutlierReport> {
        let sorted = sorted_present_values(series)?;
        let q1 = quantile_sorted(&sorted, 0.25);
        let q3 = quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        let lower_bound = q1 - self.multiplier * iqr;
        let upper_bound = q3 + self.multiplier * iqr;

        let outlier_count = sorted
            .iter()
            .filter(|v| **v < lower_bound || **v > upper_bound)
            .count();

        debug!(
            "Outliers in '{}': {} of {} outside [{:.2}, {:.2}]",
            series.name(),
            outlier_count,
            sorted.len(),
            lower_bound,
            upper_bound
        );

        Ok(OutlierReport {
            column: series.name().to_string(),
            q1,
            q3,
            iqr,
            lower_bound,
            upper_bound,
            outlier_count,
            present_count: sorted.len(),
        })
    }

    /// Compute the outlier report of a column looked up by exact name.
    pub fn detect_column(&self, df: &DataFrame, name: &str) -> Result<OutlierReport> {
        self.detect(column_series(df, name)?)
    }
}

/// Outlier report with the default 1.5 multiplier.
pub fn detect(series: &Series) -> Result<OutlierReport> {
    OutlierDetector::default().detect(series)
}
