//! # Salesreport - per-customer sales reports
//!
//! Salesreport turns sales transaction exports (CSV or spreadsheets) into
//! one line per customer for a chosen report mode: debit sales, credit
//! notes, or positive and negative amounts side by side.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ CSV / XLSX  │────▶│   Parser    │────▶│  Transform  │────▶│   Export    │
//! │  (1..n)     │     │  (auto-enc) │     │ (by mode)   │     │ XLSX/CSV/JS │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salesreport::{generate_report, Mode, OutputTarget, ReportFormat, TransformOptions};
//! use std::path::Path;
//!
//! let options = TransformOptions::new(Mode::Credit);
//! let target = OutputTarget::in_dir(Path::new("."), Mode::Credit, ReportFormat::Xlsx);
//! let summary = generate_report(&["ventas.csv"], &options, &target).unwrap();
//! println!("{} customers", summary.rows);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Columns, modes, rows and the report table
//! - [`parser`] - CSV and spreadsheet loading with auto-detection
//! - [`validation`] - Required column checks
//! - [`transform`] - Consolidation, aggregation and the pipeline
//! - [`export`] - Report writers
//! - [`config`] - Environment settings
//! - [`api`] - HTTP API server and log streaming

// Core modules
pub mod error;
pub mod models;

// Input
pub mod parser;

// Validation
pub mod validation;

// Transformation
pub mod transform;

// Output
pub mod export;

// Settings
pub mod config;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ExportError, ExportResult, PipelineError, PipelineResult, ServerError, ServerResult, TableError,
    TableResult, TransformError, TransformResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    AggregatedRow, Cell, GrossAmounts, Grouping, InputRow, Mode, OutputColumn, Report,
    REQUIRED_COLUMNS,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, load_table, load_tables, parse_bytes,
    InputFormat, SourceInfo, Table,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{missing_columns, validate_columns};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    aggregate, clean_document_type, consolidate_customer_names, generate_report, project,
    split_gross_amount, subtract_discount, transform_table, OutputTarget, ReportSummary,
    TransformOptions, TransformOutput, TransformStats, Transformer, FINAL_CONSUMER,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{default_file_name, default_output_path, write_report, ReportFormat};

// =============================================================================
// Re-exports - Config & API
// =============================================================================

pub use config::Settings;

pub use api::types::{error_response, ReportResponse};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
