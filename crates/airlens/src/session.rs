//! Working-table state for one exploration session.
//!
//! A [`Session`] holds the table exactly as loaded plus a working copy that
//! analyses read from. Cleaning never edits the working table in place: an
//! imputed copy is built first and then swapped in with one assignment, so
//! readers always see either the old table or the new one.

use crate::config::ExplorerConfig;
use crate::error::Result;
use crate::imputers::{ImputationStep, StatisticalImputer};
use crate::loader::load_csv;
use crate::outliers::OutlierDetector;
use crate::reporting::AirQualityReport;
use crate::schema::{Concept, resolve_concept};
use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::info;

/// A cleaning operation applied to the working table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningAction {
    Impute,
    Reset,
}

/// Entry in the session's cleaning history.
#[derive(Debug, Clone, Serialize)]
pub struct CleaningRecord {
    pub action: CleaningAction,
    pub applied_at: DateTime<Utc>,
    pub steps: Vec<ImputationStep>,
}

/// Raw table, working table and configuration of one user.
#[derive(Debug, Clone)]
pub struct Session {
    raw: DataFrame,
    working: DataFrame,
    config: ExplorerConfig,
    history: Vec<CleaningRecord>,
}

static_assertions::assert_impl_all!(Session: Send, Sync);

impl Session {
    /// Load the configured CSV and start a session on it.
    pub fn open(config: ExplorerConfig) -> Result<Self> {
        config.validate()?;
        let raw = load_csv(&config.data_path, config.infer_schema_length)?;
        Self::from_frame(raw, config)
    }

    /// Start a session on an in-memory table.
    pub fn from_frame(df: DataFrame, config: ExplorerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            working: df.clone(),
            raw: df,
            config,
            history: Vec::new(),
        })
    }

    /// The table as loaded. Never modified.
    pub fn raw(&self) -> &DataFrame {
        &self.raw
    }

    /// The table analyses read from.
    pub fn working(&self) -> &DataFrame {
        &self.working
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn history(&self) -> &[CleaningRecord] {
        &self.history
    }

    /// Whether the working table differs from the raw one.
    pub fn is_cleaned(&self) -> bool {
        !self.working.equals_missing(&self.raw)
    }

    /// Fill missing values of the working table.
    ///
    /// Returns the columns that were filled. On error the working table is
    /// left as it was.
    pub fn impute(&mut self) -> Result<&[ImputationStep]> {
        let imputation = StatisticalImputer::impute_with_steps(&self.working)?;
        self.working = imputation.df;

        info!("Imputation filled {} column(s)", imputation.steps.len());
        self.history.push(CleaningRecord {
            action: CleaningAction::Impute,
            applied_at: Utc::now(),
            steps: imputation.steps,
        });

        Ok(self
            .history
            .last()
            .map(|record| record.steps.as_slice())
            .unwrap_or_default())
    }

    /// Restore the working table from the raw table.
    pub fn reset(&mut self) {
        self.working = self.raw.clone();
        info!("Working table reset to the loaded data");
        self.history.push(CleaningRecord {
            action: CleaningAction::Reset,
            applied_at: Utc::now(),
            steps: Vec::new(),
        });
    }

    /// Find the working-table column for a concept.
    pub fn resolve(&self, concept: Concept) -> Option<String> {
        resolve_concept(&self.working, &self.config.aliases, concept)
    }

    /// Outlier detector using the configured fence multiplier.
    pub fn outlier_detector(&self) -> Result<OutlierDetector> {
        OutlierDetector::new(self.config.outlier_multiplier)
    }

    /// Targeted air-quality analyses over the working table.
    pub fn report(&self) -> Result<AirQualityReport> {
        AirQualityReport::build(
            &self.working,
            &self.config.aliases,
            &self.outlier_detector()?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use polars::prelude::*;

    fn table() -> DataFrame {
        df![
            "PM2.5" => [Some(12.0), None, Some(30.0), Some(8.0)],
            "City" => [Some("Laval"), Some("Laval"), None, Some("Montréal")],
        ]
        .unwrap()
    }

    #[test]
    fn test_impute_replaces_working_table_only() {
        let mut session = Session::from_frame(table(), ExplorerConfig::default()).unwrap();
        assert!(!session.is_cleaned());

        let steps = session.impute().unwrap().to_vec();
        assert_eq!(steps.len(), 2);

        assert_eq!(session.working().column("PM2.5").unwrap().null_count(), 0);
        assert_eq!(session.working().column("City").unwrap().null_count(), 0);
        assert_eq!(session.raw().column("PM2.5").unwrap().null_count(), 1);
        assert!(session.is_cleaned());
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].action, CleaningAction::Impute);
    }

    #[test]
    fn test_reset_restores_raw() {
        let mut session = Session::from_frame(table(), ExplorerConfig::default()).unwrap();
        session.impute().unwrap();
        session.reset();

        assert!(session.working().equals_missing(session.raw()));
        assert!(!session.is_cleaned());
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[1].action, CleaningAction::Reset);
    }

    #[test]
    fn test_impute_twice_is_stable() {
        let mut session = Session::from_frame(table(), ExplorerConfig::default()).unwrap();
        session.impute().unwrap();
        let first = session.working().clone();
        let steps = session.impute().unwrap();
        assert!(steps.is_empty());
        assert!(session.working().equals_missing(&first));
    }

    #[test]
    fn test_resolve_against_working_table() {
        let session = Session::from_frame(table(), ExplorerConfig::default()).unwrap();
        assert_eq!(session.resolve(Concept::Pm25).as_deref(), Some("PM2.5"));
        assert_eq!(session.resolve(Concept::Humidity), None);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ExplorerConfig {
            outlier_multiplier: -1.0,
            ..ExplorerConfig::default()
        };
        let err = Session::from_frame(table(), config).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn test_open_missing_file() {
        let config = ExplorerConfig::builder()
            .data_path("no/such/pollution.csv")
            .build()
            .unwrap();
        assert!(matches!(
            Session::open(config),
            Err(AnalysisError::LoadFailure { .. })
        ));
    }
}
