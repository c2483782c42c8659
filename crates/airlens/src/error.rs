//! Error types for the analysis engine.
//!
//! Errors fall into two groups. Fatal errors (`LoadFailure`, I/O and Polars
//! failures) stop the session-level operation that raised them. Recoverable
//! errors (`InsufficientData`, `UndefinedCorrelation`, `UnresolvedColumn`)
//! withhold a single result; callers omit that result and carry on.
//!
//! Errors serialize as `{ code, message }` so a front end can branch on the
//! code without parsing messages.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the analysis engine.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The raw CSV could not be read or parsed.
    #[error("Failed to load '{path}': {reason}")]
    LoadFailure { path: String, reason: String },

    /// A statistic was requested on a column with no present values.
    #[error("Not enough present values in '{0}' to compute a result")]
    InsufficientData(String),

    /// A correlation involves a zero-variance column.
    #[error("Correlation between '{a}' and '{b}' is undefined (zero variance)")]
    UndefinedCorrelation { a: String, b: String },

    /// An alias set matched no column in the table.
    #[error("No column matches '{0}'")]
    UnresolvedColumn(String),

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A numeric operation was requested on a categorical column.
    #[error("Column '{0}' is not numeric")]
    NonNumericColumn(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalysisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for front-end handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::LoadFailure { .. } => "LOAD_FAILURE",
            Self::InsufficientData(_) => "INSUFFICIENT_DATA",
            Self::UndefinedCorrelation { .. } => "UNDEFINED_CORRELATION",
            Self::UnresolvedColumn(_) => "UNRESOLVED_COLUMN",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::NonNumericColumn(_) => "NON_NUMERIC_COLUMN",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// The innermost error, with any context layers peeled off.
    pub fn root(&self) -> &AnalysisError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this error only withholds a single result.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.root(),
            Self::InsufficientData(_) | Self::UndefinedCorrelation { .. } | Self::UnresolvedColumn(_)
        )
    }

    /// Check if the affected output should be dropped without telling the user.
    pub fn is_silent(&self) -> bool {
        matches!(self.root(), Self::UnresolvedColumn(_))
    }

    /// Check if the affected output can be left out of a larger result.
    ///
    /// Besides the recoverable errors, this covers a column that exists but
    /// holds no numbers.
    pub fn is_omittable(&self) -> bool {
        self.is_recoverable() || matches!(self.root(), Self::NonNumericColumn(_))
    }

    /// Check if this error halts the session.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.root(),
            Self::LoadFailure { .. } | Self::Io(_) | Self::Polars(_)
        )
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for AnalysisError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalysisError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

impl From<crate::config::ConfigValidationError> for AnalysisError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        AnalysisError::InvalidConfig(err.to_string())
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            AnalysisError::InsufficientData("pm10".to_string()).error_code(),
            "INSUFFICIENT_DATA"
        );
        assert_eq!(
            AnalysisError::UndefinedCorrelation {
                a: "co".to_string(),
                b: "no2".to_string()
            }
            .error_code(),
            "UNDEFINED_CORRELATION"
        );
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(AnalysisError::InsufficientData("x".to_string()).is_recoverable());
        assert!(AnalysisError::UnresolvedColumn("PM2.5".to_string()).is_recoverable());
        assert!(
            !AnalysisError::LoadFailure {
                path: "data.csv".to_string(),
                reason: "missing".to_string()
            }
            .is_recoverable()
        );
    }

    #[test]
    fn test_silent_only_for_unresolved() {
        assert!(AnalysisError::UnresolvedColumn("Humidity".to_string()).is_silent());
        assert!(!AnalysisError::InsufficientData("x".to_string()).is_silent());
    }

    #[test]
    fn test_omittable_covers_text_columns() {
        assert!(AnalysisError::NonNumericColumn("Ville".to_string()).is_omittable());
        assert!(
            AnalysisError::NonNumericColumn("Ville".to_string())
                .with_context("Building histogram")
                .is_omittable()
        );
        assert!(AnalysisError::InsufficientData("co".to_string()).is_omittable());
        assert!(!AnalysisError::ColumnNotFound("pm25".to_string()).is_omittable());
    }

    #[test]
    fn test_fatal_classification() {
        let err = AnalysisError::LoadFailure {
            path: "data/pollution.csv".to_string(),
            reason: "No such file".to_string(),
        };
        assert!(err.is_fatal());
        assert!(!AnalysisError::ColumnNotFound("x".to_string()).is_fatal());
    }

    #[test]
    fn test_error_serialization() {
        let error = AnalysisError::ColumnNotFound("pm25".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("pm25"));
    }

    #[test]
    fn test_with_context_preserves_code_and_class() {
        let error = AnalysisError::InsufficientData("co".to_string())
            .with_context("Computing CO quartiles");
        assert!(error.to_string().contains("Computing CO quartiles"));
        assert_eq!(error.error_code(), "INSUFFICIENT_DATA");
        assert!(error.is_recoverable());
    }
}
