//! Statistical imputation: median for numeric columns, mode for the rest.

use crate::error::{Result, ResultExt};
use crate::utils::{
    DtypeCategory, bool_mode, fill_bool_nulls, fill_numeric_nulls, fill_string_nulls,
    get_dtype_category, missing_count, quantile_sorted, sorted_present_values,
};
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

/// How a column's missing values were filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationMethod {
    Median,
    Mode,
}

/// One column filled by the imputer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImputationStep {
    pub column: String,
    pub method: ImputationMethod,
    /// Fill value rendered as text.
    pub fill_value: String,
    /// Number of cells that were missing and are now filled.
    pub filled: usize,
}

impl std::fmt::Display for ImputationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let method = match self.method {
            ImputationMethod::Median => "median",
            ImputationMethod::Mode => "mode",
        };
        write!(
            f,
            "Filled {} missing value(s) in '{}' with {}: {}",
            self.filled, self.column, method, self.fill_value
        )
    }
}

/// A cleaned copy of a table plus what was done to it.
#[derive(Debug, Clone)]
pub struct Imputation {
    pub df: DataFrame,
    pub steps: Vec<ImputationStep>,
}

/// Median/mode imputer for whole tables.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Return a copy of `df` with every fillable missing value filled.
    ///
    /// The input is never modified.
    pub fn impute(df: &DataFrame) -> Result<DataFrame> {
        Ok(Self::impute_with_steps(df)?.df)
    }

    /// Like [`StatisticalImputer::impute`], also reporting each filled column.
    pub fn impute_with_steps(df: &DataFrame) -> Result<Imputation> {
        let mut out = df.clone();
        let mut steps = Vec::new();

        for column in df.get_columns() {
            let series = column.as_materialized_series();
            let missing = missing_count(series);
            if missing == 0 {
                continue;
            }

            let name = series.name().to_string();
            let filled = match get_dtype_category(series.dtype()) {
                DtypeCategory::Numeric => Self::fill_median(series, missing)?,
                DtypeCategory::Boolean => Self::fill_bool_mode(series, missing)?,
                DtypeCategory::String => Self::fill_string_mode(series, missing)?,
                DtypeCategory::Other => {
                    debug!(
                        "Column '{}' has dtype {}, not imputed",
                        name,
                        series.dtype()
                    );
                    continue;
                }
            };

            if let Some((series, step)) = filled {
                out.replace(&name, series)
                    .context(format!("Replacing imputed column '{}'", name))?;
                debug!("{}", step);
                steps.push(step);
            } else {
                debug!("Column '{}' has no present values, left unchanged", name);
            }
        }

        Ok(Imputation { df: out, steps })
    }

    /// Median of present values. `None` when the column is entirely missing.
    pub fn median(series: &Series) -> Result<Option<f64>> {
        match sorted_present_values(series) {
            Ok(sorted) => Ok(Some(quantile_sorted(&sorted, 0.5))),
            Err(e) if e.is_recoverable() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn fill_median(series: &Series, missing: usize) -> Result<Option<(Series, ImputationStep)>> {
        let Some(median) = Self::median(series)? else {
            return Ok(None);
        };
        let filled = fill_numeric_nulls(series, median)?;
        let step = ImputationStep {
            column: series.name().to_string(),
            method: ImputationMethod::Median,
            fill_value: format!("{}", median),
            filled: missing,
        };
        Ok(Some((filled, step)))
    }

    fn fill_string_mode(
        series: &Series,
        missing: usize,
    ) -> Result<Option<(Series, ImputationStep)>> {
        let Some(mode) = crate::utils::string_mode(series) else {
            return Ok(None);
        };
        let filled = fill_string_nulls(series, &mode)?;
        let step = ImputationStep {
            column: series.name().to_string(),
            method: ImputationMethod::Mode,
            fill_value: mode,
            filled: missing,
        };
        Ok(Some((filled, step)))
    }

    fn fill_bool_mode(series: &Series, missing: usize) -> Result<Option<(Series, ImputationStep)>> {
        let Some(mode) = bool_mode(series) else {
            return Ok(None);
        };
        let filled = fill_bool_nulls(series, mode)?;
        let step = ImputationStep {
            column: series.name().to_string(),
            method: ImputationMethod::Mode,
            fill_value: mode.to_string(),
            filled: missing,
        };
        Ok(Some((filled, step)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .cast(&DataType::Float64)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect()
    }

    fn str_values(df: &DataFrame, name: &str) -> Vec<Option<String>> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    #[test]
    fn test_numeric_median_fill() {
        let df = df![
            "values" => [Some(1.0), None, Some(3.0), None, Some(5.0)],
        ]
        .unwrap();

        let imputed = StatisticalImputer::impute(&df).unwrap();

        // Median of [1, 3, 5] = 3
        assert_eq!(
            f64_values(&imputed, "values"),
            vec![Some(1.0), Some(3.0), Some(3.0), Some(3.0), Some(5.0)]
        );
    }

    #[test]
    fn test_numeric_median_even_count_interpolates() {
        let df = df!["values" => [Some(1i64), Some(2), None, Some(4), Some(10)]].unwrap();
        let imputed = StatisticalImputer::impute(&df).unwrap();
        // Median of [1, 2, 4, 10] = 3
        assert_eq!(f64_values(&imputed, "values")[2], Some(3.0));
    }

    #[test]
    fn test_categorical_mode_fill() {
        let df = df!["city" => [Some("a"), Some("b"), None, Some("a")]].unwrap();
        let imputed = StatisticalImputer::impute(&df).unwrap();
        assert_eq!(
            str_values(&imputed, "city"),
            vec![
                Some("a".to_string()),
                Some("b".to_string()),
                Some("a".to_string()),
                Some("a".to_string())
            ]
        );
    }

    #[test]
    fn test_boolean_mode_fill_keeps_dtype() {
        let df = df!["flag" => [Some(true), None, Some(true), Some(false)]].unwrap();
        let imputed = StatisticalImputer::impute(&df).unwrap();
        let flag = imputed.column("flag").unwrap();
        assert_eq!(flag.dtype(), &DataType::Boolean);
        assert_eq!(flag.null_count(), 0);
    }

    #[test]
    fn test_all_null_columns_left_unchanged() {
        let df = df![
            "empty_num" => [Option::<f64>::None, None, None],
            "empty_cat" => [Option::<&str>::None, None, None],
        ]
        .unwrap();

        let result = StatisticalImputer::impute_with_steps(&df).unwrap();
        assert!(result.steps.is_empty());
        assert_eq!(result.df.column("empty_num").unwrap().null_count(), 3);
        assert_eq!(result.df.column("empty_cat").unwrap().null_count(), 3);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let df = df!["values" => [Some(1.0), None, Some(3.0)]].unwrap();
        let _ = StatisticalImputer::impute(&df).unwrap();
        assert_eq!(df.column("values").unwrap().null_count(), 1);
    }

    #[test]
    fn test_complete_columns_untouched() {
        let df = df![
            "ints" => [1i64, 2, 3],
            "city" => ["x", "y", "z"],
        ]
        .unwrap();
        let result = StatisticalImputer::impute_with_steps(&df).unwrap();
        assert!(result.steps.is_empty());
        assert!(result.df.equals(&df));
        assert_eq!(result.df.column("ints").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_impute_is_idempotent() {
        let df = df![
            "pm25" => [Some(12.0), None, Some(30.0), Some(8.0)],
            "city" => [None, Some("Laval"), Some("Laval"), Some("Montréal")],
        ]
        .unwrap();

        let once = StatisticalImputer::impute(&df).unwrap();
        let twice = StatisticalImputer::impute(&once).unwrap();
        assert!(once.equals_missing(&twice));
        assert_eq!(once.column("pm25").unwrap().null_count(), 0);
        assert_eq!(once.column("city").unwrap().null_count(), 0);
    }

    #[test]
    fn test_steps_describe_fills() {
        let df = df![
            "pm10" => [Some(10.0), None, Some(30.0)],
            "city" => [Some("Laval"), None, Some("Laval")],
        ]
        .unwrap();

        let result = StatisticalImputer::impute_with_steps(&df).unwrap();
        assert_eq!(result.steps.len(), 2);
        assert_eq!(result.steps[0].column, "pm10");
        assert_eq!(result.steps[0].method, ImputationMethod::Median);
        assert_eq!(result.steps[0].fill_value, "20");
        assert_eq!(result.steps[0].filled, 1);
        assert_eq!(result.steps[1].method, ImputationMethod::Mode);
        assert_eq!(result.steps[1].fill_value, "Laval");
        assert!(result.steps[1].to_string().contains("mode"));
    }

    #[test]
    fn test_nan_is_filled_like_null() {
        let df = df!["co" => [Some(1.0), Some(f64::NAN), None, Some(3.0)]].unwrap();
        let result = StatisticalImputer::impute_with_steps(&df).unwrap();
        assert_eq!(result.steps[0].filled, 2);
        assert_eq!(
            f64_values(&result.df, "co"),
            vec![Some(1.0), Some(2.0), Some(2.0), Some(3.0)]
        );
    }

    #[test]
    fn test_temporal_columns_left_unchanged() {
        let dates = Series::new("date".into(), &[Some(19_000i32), None, Some(19_002)])
            .cast(&DataType::Date)
            .unwrap();
        let df = DataFrame::new(vec![
            dates.into(),
            Series::new("pm25".into(), &[Some(10.0), None, Some(20.0)]).into(),
        ])
        .unwrap();

        let result = StatisticalImputer::impute_with_steps(&df).unwrap();
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.steps[0].column, "pm25");

        let date = result.df.column("date").unwrap();
        assert_eq!(date.dtype(), &DataType::Date);
        assert_eq!(date.null_count(), 1);
        assert_eq!(f64_values(&result.df, "pm25")[1], Some(15.0));
    }

    #[test]
    fn test_median_helper() {
        let series = Series::new("v".into(), &[Some(4.0), None, Some(2.0)]);
        assert_eq!(StatisticalImputer::median(&series).unwrap(), Some(3.0));
        let empty = Series::new("v".into(), &[Option::<f64>::None]);
        assert_eq!(StatisticalImputer::median(&empty).unwrap(), None);
    }
}
