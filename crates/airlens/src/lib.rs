//! Air-Quality Exploration Library
//!
//! Statistical exploration of tabular air-pollution data, built with Rust and
//! Polars.
//!
//! # Overview
//!
//! This library provides the analysis engine behind the `airlens` CLI:
//!
//! - **Schema Resolution**: Finds the PM2.5, PM10, humidity... columns through
//!   case-insensitive alias sets
//! - **Imputation**: Median fill for numeric columns, mode fill for the rest
//! - **Outlier Detection**: Tukey's IQR fences with a configurable multiplier
//! - **Descriptive Statistics**: Mean, median, sample std and quartiles
//! - **Correlation**: Pearson, Spearman and Kendall tau-b, pairwise-complete
//! - **Sessions**: A raw table plus a working copy that cleaning replaces
//!   atomically
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use airlens::{CorrelationMethod, ExplorerConfig, Session};
//!
//! let config = ExplorerConfig::builder()
//!     .data_path("data/pollution.csv")
//!     .build()?;
//!
//! let mut session = Session::open(config)?;
//! for step in session.impute()? {
//!     println!("{}", step);
//! }
//!
//! let matrix = airlens::correlate(session.working(), CorrelationMethod::Spearman)?;
//! for pair in matrix.pairs().iter().take(5) {
//!     println!("{} / {}: {:.3}", pair.column_x, pair.column_y, pair.coefficient);
//! }
//!
//! let report = session.report()?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```
//!
//! # Missing Data
//!
//! Every computation drops missing values (nulls and NaN) before it runs.
//! Correlations use only the rows where both columns are present. A column
//! with nothing left yields [`AnalysisError::InsufficientData`]; callers
//! that render several results can treat it as "skip this one" through
//! [`AnalysisError::is_recoverable`].

pub mod config;
pub mod correlation;
pub mod error;
pub mod imputers;
pub mod loader;
pub mod outliers;
pub mod overview;
pub mod reporting;
pub mod schema;
pub mod session;
pub mod statistics;
pub mod utils;

// Re-exports for convenient access
pub use config::{ConfigValidationError, ExplorerConfig, ExplorerConfigBuilder};
pub use correlation::{
    CorrelationMatrix, CorrelationMethod, CorrelationPair, correlate, correlate_all,
    correlate_pair,
};
pub use error::{AnalysisError, Result as AnalysisResult, ResultExt};
pub use imputers::{Imputation, ImputationMethod, ImputationStep, StatisticalImputer};
pub use loader::load_csv;
pub use outliers::{OutlierDetector, OutlierReport};
pub use overview::{
    BoxPlotSummary, ColumnDistribution, ColumnInfo, DatasetOverview, HistogramBin, OmittedPlot,
};
pub use reporting::{AirQualityReport, OmittedSection, ReportSection};
pub use schema::{AliasSet, AliasTable, Concept};
pub use session::{CleaningAction, CleaningRecord, Session};
pub use statistics::{ColumnStatistics, Quartiles, TableDescription};
pub use utils::{DtypeCategory, get_dtype_category, is_numeric_dtype};
