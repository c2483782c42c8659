//! Targeted analyses of an air-quality table.

use crate::correlation::{CorrelationMethod, correlate_pair};
use crate::error::Result;
use crate::outliers::{OutlierDetector, OutlierReport};
use crate::schema::{AliasTable, Concept, require_concept};
use crate::statistics::{Quartiles, describe_column, quartiles};
use crate::utils::column_series;
use polars::prelude::DataFrame;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Sections of an [`AirQualityReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSection {
    Particulates,
    HumidityTarget,
    DensityPm25,
    CoQuartiles,
}

impl fmt::Display for ReportSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportSection::Particulates => "particulates",
            ReportSection::HumidityTarget => "humidity_target",
            ReportSection::DensityPm25 => "density_pm25",
            ReportSection::CoQuartiles => "co_quartiles",
        };
        f.write_str(name)
    }
}

/// Central tendency, spread and outliers of one particulate column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticulateSummary {
    pub column: String,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub outliers: OutlierReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticulateSection {
    pub pm25: ParticulateSummary,
    pub pm10: ParticulateSummary,
}

/// A single coefficient between two resolved columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationSection {
    pub column_x: String,
    pub column_y: String,
    pub method: CorrelationMethod,
    pub coefficient: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuartileSection {
    pub column: String,
    #[serde(flatten)]
    pub quartiles: Quartiles,
}

/// A section left out of the report, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OmittedSection {
    pub section: ReportSection,
    pub reason: String,
    pub code: &'static str,
}

/// Air-quality analyses over one table.
///
/// Every section is computed independently. A section whose columns are
/// missing, empty or constant is listed in `omitted` and the rest of the
/// report is still produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AirQualityReport {
    pub particulates: Option<ParticulateSection>,
    pub humidity_target: Option<CorrelationSection>,
    pub density_pm25: Option<CorrelationSection>,
    pub co_quartiles: Option<QuartileSection>,
    pub omitted: Vec<OmittedSection>,
}

impl AirQualityReport {
    pub fn build(df: &DataFrame, aliases: &AliasTable, detector: &OutlierDetector) -> Result<Self> {
        let mut report = Self::default();

        report.particulates = report.section(ReportSection::Particulates, || {
            Ok(ParticulateSection {
                pm25: particulate(df, aliases, detector, Concept::Pm25)?,
                pm10: particulate(df, aliases, detector, Concept::Pm10)?,
            })
        })?;

        report.humidity_target = report.section(ReportSection::HumidityTarget, || {
            pair_section(
                df,
                aliases,
                Concept::Humidity,
                Concept::Target,
                CorrelationMethod::Spearman,
            )
        })?;

        report.density_pm25 = report.section(ReportSection::DensityPm25, || {
            pair_section(
                df,
                aliases,
                Concept::PopulationDensity,
                Concept::Pm25,
                CorrelationMethod::Pearson,
            )
        })?;

        report.co_quartiles = report.section(ReportSection::CoQuartiles, || {
            let column = require_concept(df, aliases, Concept::CarbonMonoxide)?;
            let quartiles = quartiles(column_series(df, &column)?)?;
            Ok(QuartileSection { column, quartiles })
        })?;

        Ok(report)
    }

    pub fn is_complete(&self) -> bool {
        self.omitted.is_empty()
    }

    /// Run one section, recording it as omitted if it cannot be computed.
    fn section<T>(
        &mut self,
        section: ReportSection,
        compute: impl FnOnce() -> Result<T>,
    ) -> Result<Option<T>> {
        match compute() {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_omittable() => {
                if e.is_silent() {
                    debug!("Section {} omitted: {}", section, e);
                } else {
                    warn!("Section {} omitted: {}", section, e);
                }
                self.omitted.push(OmittedSection {
                    section,
                    reason: e.to_string(),
                    code: e.error_code(),
                });
                Ok(None)
            }
            Err(e) => Err(e.with_context(format!("Computing report section {}", section))),
        }
    }
}

fn particulate(
    df: &DataFrame,
    aliases: &AliasTable,
    detector: &OutlierDetector,
    concept: Concept,
) -> Result<ParticulateSummary> {
    let column = require_concept(df, aliases, concept)?;
    let stats = describe_column(df, &column)?;
    let outliers = detector.detect_column(df, &column)?;
    Ok(ParticulateSummary {
        column,
        mean: stats.mean,
        median: stats.median,
        std: stats.std,
        outliers,
    })
}

fn pair_section(
    df: &DataFrame,
    aliases: &AliasTable,
    x: Concept,
    y: Concept,
    method: CorrelationMethod,
) -> Result<CorrelationSection> {
    let column_x = require_concept(df, aliases, x)?;
    let column_y = require_concept(df, aliases, y)?;
    let coefficient = correlate_pair(df, &column_x, &column_y, method)?;
    Ok(CorrelationSection {
        column_x,
        column_y,
        method,
        coefficient,
    })
}
