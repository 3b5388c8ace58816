//! REST API types for report requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::export::ReportFormat;
use crate::models::{Grouping, Mode};
use crate::parser::SourceInfo;
use crate::transform::pipeline::{TransformOptions, TransformOutput, TransformStats};

/// Query string of `POST /api/report`.
///
/// `mode` stays a raw token, empty when absent, so a missing or unknown value
/// surfaces as an invalid mode error rather than a generic query rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub discount: bool,
    #[serde(default)]
    pub group_by: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

/// Response sent after a successful JSON report request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    /// Unique job identifier
    pub job_id: String,

    pub generated_at: DateTime<Utc>,

    pub mode: Mode,

    /// Header texts, in order
    pub columns: Vec<&'static str>,

    /// One object per customer, keyed by header text
    pub rows: Vec<Value>,

    pub metadata: ResponseMetadata,
}

/// Metadata about the run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub subtract_discount: bool,
    pub grouping: Grouping,
    pub format: ReportFormat,
    /// True when no row passed the mode filter
    pub header_only: bool,
    pub stats: TransformStats,
    pub sources: Vec<SourceMetadata>,
}

/// Uploaded file metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    pub name: String,
    pub encoding: Option<String>,
    pub delimiter: Option<String>,
    pub row_count: usize,
}

impl From<&SourceInfo> for SourceMetadata {
    fn from(info: &SourceInfo) -> Self {
        Self {
            name: info.name.clone(),
            encoding: info.encoding.clone(),
            delimiter: info.delimiter.map(|d| d.to_string()),
            row_count: info.row_count,
        }
    }
}

impl ReportResponse {
    pub fn new(output: TransformOutput, options: &TransformOptions, sources: &[SourceInfo]) -> Self {
        let report = output.report;
        ReportResponse {
            job_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            mode: report.mode,
            columns: report.headers(),
            rows: report.to_records(),
            metadata: ResponseMetadata {
                subtract_discount: options.subtract_discount,
                grouping: options.grouping,
                format: ReportFormat::Json,
                header_only: report.is_empty(),
                stats: output.stats,
                sources: sources.iter().map(SourceMetadata::from).collect(),
            },
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}
