//! Report generation.
//!
//! [`AirQualityReport`] gathers the targeted analyses of a pollution table:
//! particulate summaries with outliers, the humidity/target and
//! density/PM2.5 coefficients, and CO quartiles. It serializes to JSON for
//! the `--json` CLI flag.
//!
//! # Example
//!
//! ```rust,ignore
//! use airlens::reporting::AirQualityReport;
//!
//! let report = AirQualityReport::build(&df, &AliasTable::default(), &OutlierDetector::default())?;
//! for omitted in &report.omitted {
//!     println!("{}: {}", omitted.section, omitted.reason);
//! }
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

mod air_quality;

pub use air_quality::{
    AirQualityReport, CorrelationSection, OmittedSection, ParticulateSection, ParticulateSummary,
    QuartileSection, ReportSection,
};
