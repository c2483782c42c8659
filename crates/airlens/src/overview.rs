//! Dataset overview: shape, types, missing counts and plot-ready summaries.

use crate::error::{AnalysisError, Result};
use crate::utils::{
    column_series, is_numeric_dtype, missing_count, numeric_column_names, quantile_sorted,
    sorted_present_values,
};
use polars::prelude::*;
use serde::Serialize;
use tracing::warn;

/// Default number of histogram bins.
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// Default number of preview rows.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Shape and per-column summary of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOverview {
    pub rows: usize,
    pub columns: usize,
    pub column_info: Vec<ColumnInfo>,
}

impl DatasetOverview {
    /// Missing cells across the whole table.
    pub fn total_missing(&self) -> usize {
        self.column_info.iter().map(|c| c.null_count).sum()
    }
}

/// Name, type and missing count of one column. NaN counts as missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub null_count: usize,
    pub numeric: bool,
}

/// One equal-width histogram bin. `end` is inclusive for the last bin only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Five-number summary for a box plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxPlotSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

pub fn overview(df: &DataFrame) -> DatasetOverview {
    let column_info = df
        .get_columns()
        .iter()
        .map(|column| ColumnInfo {
            name: column.name().to_string(),
            dtype: column.dtype().to_string(),
            null_count: missing_count(column.as_materialized_series()),
            numeric: is_numeric_dtype(column.dtype()),
        })
        .collect();

    DatasetOverview {
        rows: df.height(),
        columns: df.width(),
        column_info,
    }
}

/// First `n` rows of the table.
pub fn preview(df: &DataFrame, n: usize) -> DataFrame {
    df.head(Some(n))
}

/// Numeric column names, in table order.
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    numeric_column_names(df)
}

/// Equal-width histogram of the present values of a numeric Series.
///
/// A constant column yields a single bin holding every value.
pub fn histogram(series: &Series, bins: usize) -> Result<Vec<HistogramBin>> {
    if bins == 0 {
        return Err(AnalysisError::InvalidConfig(
            "histogram needs at least one bin".to_string(),
        ));
    }

    let values = sorted_present_values(series)?;
    let min = values[0];
    let max = values[values.len() - 1];

    if max == min {
        return Ok(vec![HistogramBin {
            start: min,
            end: max,
            count: values.len(),
        }]);
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];

    for value in &values {
        let index = (((value - min) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }

    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(idx, count)| HistogramBin {
            start: min + idx as f64 * width,
            end: if idx + 1 == bins {
                max
            } else {
                min + (idx as f64 + 1.0) * width
            },
            count,
        })
        .collect())
}

pub fn box_plot(series: &Series) -> Result<BoxPlotSummary> {
    let sorted = sorted_present_values(series)?;
    Ok(BoxPlotSummary {
        min: sorted[0],
        q1: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q3: quantile_sorted(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    })
}

/// Histogram and box plot of one column, or the reason they are missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDistribution {
    pub column: String,
    pub histogram: Option<Vec<HistogramBin>>,
    pub box_plot: Option<BoxPlotSummary>,
    pub omitted: Option<OmittedPlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OmittedPlot {
    pub reason: String,
    pub code: &'static str,
}

/// Plot summaries of a named column.
///
/// A column without numbers (text, or nothing present) comes back with
/// `omitted` set instead of failing. An unknown column name or a bad bin
/// count is still an error.
pub fn column_distribution(df: &DataFrame, name: &str, bins: usize) -> Result<ColumnDistribution> {
    let plots = column_series(df, name).and_then(|series| {
        let histogram = histogram(series, bins)
            .map_err(|e| e.with_context(format!("Building histogram of '{}'", name)))?;
        let box_plot = box_plot(series)
            .map_err(|e| e.with_context(format!("Building box plot of '{}'", name)))?;
        Ok((histogram, box_plot))
    });

    match plots {
        Ok((histogram, box_plot)) => Ok(ColumnDistribution {
            column: name.to_string(),
            histogram: Some(histogram),
            box_plot: Some(box_plot),
            omitted: None,
        }),
        Err(e) if e.is_omittable() => {
            warn!("Distribution of '{}' omitted: {}", name, e);
            Ok(ColumnDistribution {
                column: name.to_string(),
                histogram: None,
                box_plot: None,
                omitted: Some(OmittedPlot {
                    reason: e.to_string(),
                    code: e.error_code(),
                }),
            })
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df![
            "City" => [Some("Laval"), None, Some("Montréal"), Some("Laval")],
            "PM2.5" => [Some(12.0), Some(30.0), None, Some(8.0)],
            "AQI" => [1i64, 2, 3, 1],
        ]
        .unwrap()
    }

    #[test]
    fn test_overview_shape_and_missing() {
        let info = overview(&sample());
        assert_eq!(info.rows, 4);
        assert_eq!(info.columns, 3);
        assert_eq!(info.total_missing(), 2);

        let city = &info.column_info[0];
        assert_eq!(city.name, "City");
        assert_eq!(city.null_count, 1);
        assert!(!city.numeric);
        assert!(info.column_info[1].numeric);
        assert!(info.column_info[2].numeric);
    }

    #[test]
    fn test_overview_counts_nan_as_missing() {
        let df = df![
            "CO" => [Some(0.4), Some(f64::NAN), None, Some(1.1)],
        ]
        .unwrap();
        let info = overview(&df);
        assert_eq!(info.column_info[0].null_count, 2);
        assert_eq!(info.total_missing(), 2);
    }

    #[test]
    fn test_preview_and_numeric_columns() {
        let df = sample();
        assert_eq!(preview(&df, 2).height(), 2);
        assert_eq!(preview(&df, 50).height(), 4);
        assert_eq!(numeric_columns(&df), vec!["PM2.5", "AQI"]);
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let series = Series::new("v".into(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 10.0]);
        let bins = histogram(&series, 5).unwrap();

        assert_eq!(bins.len(), 5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 10);
        assert_eq!(bins[0].start, 0.0);
        assert_eq!(bins[4].end, 10.0);
        // max lands in the last bin
        assert_eq!(bins[4].count, 2);
    }

    #[test]
    fn test_histogram_constant_column_single_bin() {
        let series = Series::new("co".into(), &[Some(5.0), None, Some(5.0)]);
        let bins = histogram(&series, DEFAULT_HISTOGRAM_BINS).unwrap();
        assert_eq!(
            bins,
            vec![HistogramBin {
                start: 5.0,
                end: 5.0,
                count: 2
            }]
        );
    }

    #[test]
    fn test_histogram_errors() {
        let series = Series::new("v".into(), &[1.0, 2.0]);
        assert!(matches!(
            histogram(&series, 0),
            Err(AnalysisError::InvalidConfig(_))
        ));
        let empty = Series::new("v".into(), &[Option::<f64>::None]);
        assert!(matches!(
            histogram(&empty, 10),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_box_plot() {
        let series = Series::new("pm10".into(), &[4.0, 1.0, 3.0, 2.0]);
        let summary = box_plot(&series).unwrap();
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 4.0);
        assert_eq!(summary.median, 2.5);
        assert!((summary.q1 - 1.75).abs() < 1e-12);
        assert!((summary.q3 - 3.25).abs() < 1e-12);
    }

    #[test]
    fn test_column_distribution_of_numeric_column() {
        let dist = column_distribution(&sample(), "PM2.5", 4).unwrap();
        assert_eq!(dist.column, "PM2.5");
        assert!(dist.omitted.is_none());
        let bins = dist.histogram.unwrap();
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
        assert_eq!(dist.box_plot.unwrap().median, 12.0);
    }

    #[test]
    fn test_column_distribution_degrades_without_numbers() {
        let text = column_distribution(&sample(), "City", 10).unwrap();
        assert!(text.histogram.is_none());
        assert!(text.box_plot.is_none());
        assert_eq!(text.omitted.unwrap().code, "NON_NUMERIC_COLUMN");

        let df = df![
            "PM10" => [Option::<f64>::None, None],
        ]
        .unwrap();
        let empty = column_distribution(&df, "PM10", 10).unwrap();
        assert_eq!(empty.omitted.unwrap().code, "INSUFFICIENT_DATA");
    }

    #[test]
    fn test_column_distribution_caller_errors() {
        assert!(matches!(
            column_distribution(&sample(), "Ozone", 10),
            Err(AnalysisError::ColumnNotFound(_))
        ));
        assert!(matches!(
            column_distribution(&sample(), "PM2.5", 0).map_err(|e| e.root().error_code()),
            Err("INVALID_CONFIG")
        ));
    }
}
