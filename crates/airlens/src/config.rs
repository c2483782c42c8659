//! Configuration for an exploration session.
//!
//! Uses the builder pattern; [`ExplorerConfigBuilder::build`] validates the
//! values before handing out a config.

use crate::schema::AliasTable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default location of the air-quality snapshot.
pub const DEFAULT_DATA_PATH: &str = "data/pollution.csv";

/// Tukey's fence multiplier.
pub const DEFAULT_OUTLIER_MULTIPLIER: f64 = 1.5;

/// Configuration for an exploration session.
///
/// # Example
///
/// ```rust,ignore
/// use airlens::config::ExplorerConfig;
///
/// let config = ExplorerConfig::builder()
///     .data_path("data/pollution.csv")
///     .histogram_bins(30)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// CSV file loaded once per session.
    /// Default: "data/pollution.csv"
    pub data_path: PathBuf,

    /// Number of rows the CSV reader looks at to infer column types.
    /// Default: 100
    pub infer_schema_length: usize,

    /// Multiplier applied to the IQR to place the outlier fences.
    /// Default: 1.5
    pub outlier_multiplier: f64,

    /// Number of equal-width bins for histograms.
    /// Default: 20
    pub histogram_bins: usize,

    /// Number of rows shown in the data preview.
    /// Default: 5
    pub preview_rows: usize,

    /// Alias sets used to find the PM2.5, PM10, humidity... columns.
    pub aliases: AliasTable,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            infer_schema_length: 100,
            outlier_multiplier: DEFAULT_OUTLIER_MULTIPLIER,
            histogram_bins: 20,
            preview_rows: 5,
            aliases: AliasTable::default(),
        }
    }
}

impl ExplorerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ExplorerConfigBuilder {
        ExplorerConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.outlier_multiplier.is_finite() || self.outlier_multiplier <= 0.0 {
            return Err(ConfigValidationError::InvalidMultiplier(
                self.outlier_multiplier,
            ));
        }

        if self.infer_schema_length == 0 {
            return Err(ConfigValidationError::MustBePositive {
                field: "infer_schema_length".to_string(),
            });
        }

        if self.histogram_bins == 0 {
            return Err(ConfigValidationError::MustBePositive {
                field: "histogram_bins".to_string(),
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid outlier multiplier: {0} (must be a positive finite number)")]
    InvalidMultiplier(f64),

    #[error("Invalid value for '{field}': must be at least 1")]
    MustBePositive { field: String },
}

/// Builder for [`ExplorerConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ExplorerConfigBuilder {
    data_path: Option<PathBuf>,
    infer_schema_length: Option<usize>,
    outlier_multiplier: Option<f64>,
    histogram_bins: Option<usize>,
    preview_rows: Option<usize>,
    aliases: Option<AliasTable>,
}

impl ExplorerConfigBuilder {
    /// Set the CSV file to load.
    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    /// Set how many rows are used for schema inference.
    pub fn infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Set the IQR fence multiplier.
    pub fn outlier_multiplier(mut self, multiplier: f64) -> Self {
        self.outlier_multiplier = Some(multiplier);
        self
    }

    /// Set the number of histogram bins.
    pub fn histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = Some(bins);
        self
    }

    /// Set the number of preview rows.
    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = Some(rows);
        self
    }

    /// Replace the alias table.
    pub fn aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = Some(aliases);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ExplorerConfig` or an error if validation fails.
    pub fn build(self) -> Result<ExplorerConfig, ConfigValidationError> {
        let config = ExplorerConfig {
            data_path: self
                .data_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            infer_schema_length: self.infer_schema_length.unwrap_or(100),
            outlier_multiplier: self
                .outlier_multiplier
                .unwrap_or(DEFAULT_OUTLIER_MULTIPLIER),
            histogram_bins: self.histogram_bins.unwrap_or(20),
            preview_rows: self.preview_rows.unwrap_or(5),
            aliases: self.aliases.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AliasSet, Concept};

    #[test]
    fn test_default_config() {
        let config = ExplorerConfig::default();
        assert_eq!(config.data_path, PathBuf::from("data/pollution.csv"));
        assert_eq!(config.outlier_multiplier, 1.5);
        assert_eq!(config.histogram_bins, 20);
        assert_eq!(config.preview_rows, 5);
        assert!(config.aliases.get(Concept::Pm25).is_some());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = ExplorerConfig::builder()
            .data_path("other.csv")
            .outlier_multiplier(3.0)
            .histogram_bins(8)
            .preview_rows(10)
            .build()
            .unwrap();

        assert_eq!(config.data_path, PathBuf::from("other.csv"));
        assert_eq!(config.outlier_multiplier, 3.0);
        assert_eq!(config.histogram_bins, 8);
        assert_eq!(config.preview_rows, 10);
    }

    #[test]
    fn test_validation_rejects_bad_multiplier() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = ExplorerConfig::builder().outlier_multiplier(bad).build();
            assert!(matches!(
                result,
                Err(ConfigValidationError::InvalidMultiplier(_))
            ));
        }
    }

    #[test]
    fn test_validation_rejects_zero_bins() {
        let result = ExplorerConfig::builder().histogram_bins(0).build();
        assert!(matches!(
            result,
            Err(ConfigValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_config_from_partial_json() {
        let json = r#"{
            "data_path": "custom/air.csv",
            "histogram_bins": 12,
            "aliases": { "humidity": ["rh"] }
        }"#;

        let config: ExplorerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.data_path, PathBuf::from("custom/air.csv"));
        assert_eq!(config.histogram_bins, 12);
        assert_eq!(config.outlier_multiplier, 1.5);
        assert_eq!(
            config.aliases.get(Concept::Humidity),
            Some(&AliasSet::new(["rh"]))
        );
        assert!(config.aliases.get(Concept::Pm25).is_some());
        assert!(config.validate().is_ok());
    }
}
