//! CSV loading.
//!
//! Parsing is tried three ways before giving up: with quote handling,
//! without it, and finally on content with doubled quotes and blank lines
//! cleaned out. Every failure surfaces as [`AnalysisError::LoadFailure`].

use crate::error::{AnalysisError, Result};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Load a CSV file with a header row.
///
/// Column types are inferred from the first `infer_schema_length` rows.
pub fn load_csv(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    let failure = |reason: String| AnalysisError::LoadFailure {
        path: path.display().to_string(),
        reason,
    };

    if !path.is_file() {
        return Err(failure("file does not exist".to_string()));
    }

    let df = read_with_fallbacks(path, infer_schema_length).map_err(failure)?;
    info!(
        "Loaded {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

fn read_with_fallbacks(path: &Path, infer_schema_length: usize) -> std::result::Result<DataFrame, String> {
    let options = || {
        CsvReadOptions::default()
            .with_infer_schema_length(Some(infer_schema_length))
            .with_has_header(true)
    };

    match options()
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Standard loading failed: {}", e),
    }

    match options()
        .with_parse_options(CsvParseOptions::default().with_quote_char(None))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Loading without quotes failed: {}", e),
    }

    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    options()
        .into_reader_with_file_handle(Cursor::new(clean_csv_content(&content)))
        .finish()
        .map_err(|e| e.to_string())
}

/// Collapse doubled quotes and drop blank lines.
pub fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
