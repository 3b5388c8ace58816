//! Error types for the sales report pipeline.
//!
//! One error type per layer:
//!
//! - [`TableError`] - reading input tables (CSV, spreadsheets)
//! - [`TransformError`] - the report transformer (schema, mode, projection)
//! - [`ExportError`] - writing report artifacts
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP surface errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Table Source Errors
// =============================================================================

/// Errors while loading an input table.
#[derive(Debug, Error)]
pub enum TableError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV.
    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Spreadsheet could not be opened or read.
    #[error("Failed to read workbook '{name}': {message}")]
    Workbook { name: String, message: String },

    /// Empty file.
    #[error("Input file '{0}' is empty")]
    EmptyFile(String),

    /// No header row found.
    #[error("No headers found in '{0}'")]
    NoHeaders(String),

    /// Extension not handled by any reader.
    #[error("Unsupported input format: '{0}' (expected .csv, .txt, .tsv, .xlsx, .xlsm, .xls, .xlsb or .ods)")]
    UnsupportedFormat(String),
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors raised by the report transformer.
///
/// Numeric coercion problems are not errors: malformed amounts count as zero.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    /// Required input columns are absent.
    #[error("Missing required columns in input: {missing:?}")]
    MissingColumns { missing: Vec<String> },

    /// Unrecognized mode token.
    #[error("Invalid mode '{0}': use 'debito', 'credito' or 'split'")]
    InvalidMode(String),

    /// Expected output columns are not available after aggregation.
    #[error("Output columns for mode '{mode}' not found after aggregation: expected {expected:?}, available {available:?}")]
    SchemaProjection {
        mode: String,
        expected: Vec<String>,
        available: Vec<String>,
    },
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing a report artifact.
#[derive(Debug, Error)]
pub enum ExportError {
    /// IO error.
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    /// Workbook writer error.
    #[error("XLSX error: {0}")]
    Xlsx(String),

    /// CSV writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unknown output format token or extension.
    #[error("Unsupported output format: '{0}' (expected xlsx, csv or json)")]
    UnsupportedFormat(String),
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ExportError::Xlsx(err.to_string())
    }
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::generate_report`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input table error.
    #[error("Input error: {0}")]
    Table(#[from] TableError),

    /// Transformation error.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Output error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Nothing to load.
    #[error("No input files given")]
    NoInputFiles,
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for table loading.
pub type TableResult<T> = Result<T, TableError>;

/// Result type for the transformer.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for report export.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
