//! Correlation analysis over numeric columns.
//!
//! Three coefficients are supported:
//!
//! - **Pearson**: linear association.
//! - **Spearman**: Pearson over average ranks; monotonic association.
//! - **Kendall**: tau-b, tie-corrected concordance.
//!
//! Every pair is computed pairwise-complete: only rows where both columns
//! are present take part, so different pairs can use different rows.
//! Rank-based methods are the better choice for ordinal targets such as an
//! air-quality category encoded 0-3.

use crate::error::{AnalysisError, Result};
use crate::utils::{column_series, numeric_column_names, optional_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Correlation coefficient to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    #[default]
    Pearson,
    Spearman,
    Kendall,
}

impl CorrelationMethod {
    pub const ALL: [CorrelationMethod; 3] = [
        CorrelationMethod::Pearson,
        CorrelationMethod::Spearman,
        CorrelationMethod::Kendall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "pearson",
            CorrelationMethod::Spearman => "spearman",
            CorrelationMethod::Kendall => "kendall",
        }
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrelationMethod {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pearson" => Ok(CorrelationMethod::Pearson),
            "spearman" => Ok(CorrelationMethod::Spearman),
            "kendall" => Ok(CorrelationMethod::Kendall),
            other => Err(AnalysisError::InvalidConfig(format!(
                "unknown correlation method '{}'",
                other
            ))),
        }
    }
}

/// One off-diagonal entry of a correlation matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationPair {
    pub column_x: String,
    pub column_y: String,
    pub coefficient: f64,
}

/// Square, symmetric matrix of coefficients over the numeric columns.
///
/// `values[i][j]` is `None` when the coefficient is undefined: one of the
/// columns is constant over the shared rows, or fewer than two rows are
/// shared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub method: CorrelationMethod,
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Coefficient for a pair of columns.
    pub fn get(&self, a: &str, b: &str) -> Result<f64> {
        let i = self
            .index_of(a)
            .ok_or_else(|| AnalysisError::ColumnNotFound(a.to_string()))?;
        let j = self
            .index_of(b)
            .ok_or_else(|| AnalysisError::ColumnNotFound(b.to_string()))?;
        self.values[i][j].ok_or_else(|| AnalysisError::UndefinedCorrelation {
            a: a.to_string(),
            b: b.to_string(),
        })
    }

    /// Defined off-diagonal pairs, strongest first.
    pub fn pairs(&self) -> Vec<CorrelationPair> {
        let mut pairs = Vec::new();
        for i in 0..self.len() {
            for j in (i + 1)..self.len() {
                if let Some(coefficient) = self.values[i][j] {
                    pairs.push(CorrelationPair {
                        column_x: self.columns[i].clone(),
                        column_y: self.columns[j].clone(),
                        coefficient,
                    });
                }
            }
        }
        pairs.sort_by(|a, b| {
            b.coefficient
                .abs()
                .partial_cmp(&a.coefficient.abs())
                .unwrap_or(Ordering::Equal)
        });
        pairs
    }
}

/// Correlation matrix of all numeric columns, in table order.
pub fn correlate(df: &DataFrame, method: CorrelationMethod) -> Result<CorrelationMatrix> {
    let columns = numeric_column_names(df);
    let series_values = columns
        .iter()
        .map(|name| optional_values(column_series(df, name)?))
        .collect::<Result<Vec<_>>>()?;

    let size = columns.len();
    let mut values = vec![vec![None; size]; size];

    for i in 0..size {
        for j in i..size {
            let result = if i == j {
                self_correlation(&columns[i], &series_values[i])
            } else {
                pair_coefficient(
                    &columns[i],
                    &columns[j],
                    &series_values[i],
                    &series_values[j],
                    method,
                )
            };

            match result {
                Ok(r) => {
                    values[i][j] = Some(r);
                    values[j][i] = Some(r);
                }
                Err(e) if e.is_recoverable() => {
                    debug!("{} correlation left undefined: {}", method, e);
                }
                Err(e) => return Err(e),
            }
        }
    }

    Ok(CorrelationMatrix {
        method,
        columns,
        values,
    })
}

/// Correlation matrices for every supported method.
pub fn correlate_all(df: &DataFrame) -> Result<Vec<CorrelationMatrix>> {
    CorrelationMethod::ALL
        .iter()
        .map(|method| correlate(df, *method))
        .collect()
}

/// Coefficient between two named columns.
pub fn correlate_pair(
    df: &DataFrame,
    column_a: &str,
    column_b: &str,
    method: CorrelationMethod,
) -> Result<f64> {
    let x = optional_values(column_series(df, column_a)?)?;
    let y = optional_values(column_series(df, column_b)?)?;
    pair_coefficient(column_a, column_b, &x, &y, method)
}

fn self_correlation(name: &str, values: &[Option<f64>]) -> Result<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.len() < 2 {
        return Err(AnalysisError::InsufficientData(name.to_string()));
    }
    if is_constant(&present) {
        return Err(AnalysisError::UndefinedCorrelation {
            a: name.to_string(),
            b: name.to_string(),
        });
    }
    Ok(1.0)
}

fn pair_coefficient(
    name_a: &str,
    name_b: &str,
    a: &[Option<f64>],
    b: &[Option<f64>],
    method: CorrelationMethod,
) -> Result<f64> {
    let (x, y): (Vec<f64>, Vec<f64>) = a
        .iter()
        .zip(b.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip();

    if x.len() < 2 {
        return Err(AnalysisError::InsufficientData(format!(
            "{} / {}",
            name_a, name_b
        )));
    }
    if is_constant(&x) || is_constant(&y) {
        return Err(AnalysisError::UndefinedCorrelation {
            a: name_a.to_string(),
            b: name_b.to_string(),
        });
    }

    let r = match method {
        CorrelationMethod::Pearson => pearson(&x, &y),
        CorrelationMethod::Spearman => pearson(&average_ranks(&x), &average_ranks(&y)),
        CorrelationMethod::Kendall => kendall_tau_b(&x, &y),
    };
    Ok(r.clamp(-1.0, 1.0))
}

fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|v| *v == values[0])
}

/// Pearson coefficient. Both inputs must be non-constant and of equal length.
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    sxy / (sxx * syy).sqrt()
}

/// 1-based ranks; tied values share the mean of their positions.
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(Ordering::Equal)
    });

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end hold equal values; ranks are start+1..=end
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

/// Kendall's tau-b.
// TODO: switch to Knight's O(n log n) merge-sort variant for tables with tens of thousands of rows.
fn kendall_tau_b(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    let (mut concordant, mut discordant) = (0i64, 0i64);
    let (mut ties_x, mut ties_y) = (0i64, 0i64);

    for i in 0..n {
        for j in (i + 1)..n {
            let dx = x[i] - x[j];
            let dy = y[i] - y[j];
            if dx == 0.0 && dy == 0.0 {
                continue;
            } else if dx == 0.0 {
                ties_x += 1;
            } else if dy == 0.0 {
                ties_y += 1;
            } else if (dx > 0.0) == (dy > 0.0) {
                concordant += 1;
            } else {
                discordant += 1;
            }
        }
    }

    tau_b_from_counts(concordant, discordant, ties_x, ties_y)
}

/// Tau-b from pair counts. Ties in both columns are not counted.
///
/// Each factor of the denominator can reach n(n-1)/2, so the product is
/// taken in `f64`.
fn tau_b_from_counts(concordant: i64, discordant: i64, ties_x: i64, ties_y: i64) -> f64 {
    let untied_x = (concordant + discordant + ties_x) as f64;
    let untied_y = (concordant + discordant + ties_y) as f64;
    (concordant - discordant) as f64 / (untied_x * untied_y).sqrt()
}
