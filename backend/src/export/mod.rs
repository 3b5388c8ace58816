//! Report artifacts: XLSX, CSV and JSON writers.
//!
//! Every writer emits the full header of the report's mode, including for
//! reports without rows.

use rust_xlsxwriter::{Format, Workbook};
use serde_json::{json, Value};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ExportError, ExportResult};
use crate::models::{Cell, Mode, Report};

/// Worksheet name used in XLSX reports.
pub const SHEET_NAME: &str = "Reporte";

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Xlsx,
    Csv,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Xlsx => "xlsx",
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }

    /// Format implied by a file extension.
    pub fn from_path(path: &Path) -> ExportResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse()
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ReportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xlsx" => Ok(ReportFormat::Xlsx),
            "csv" => Ok(ReportFormat::Csv),
            "json" => Ok(ReportFormat::Json),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Default artifact name for a mode, e.g. `reporte_debito.xlsx`.
pub fn default_file_name(mode: Mode, format: ReportFormat) -> String {
    format!("{}.{}", mode.report_stem(), format.extension())
}

/// Default artifact path inside `dir`.
pub fn default_output_path(dir: &Path, mode: Mode, format: ReportFormat) -> PathBuf {
    dir.join(default_file_name(mode, format))
}

/// Write `report` to `path`, creating parent directories as needed.
pub fn write_report(report: &Report, path: &Path, format: ReportFormat) -> ExportResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    match format {
        ReportFormat::Xlsx => {
            let bytes = xlsx_bytes(report)?;
            fs::write(path, bytes)?;
        }
        ReportFormat::Csv => {
            let file = fs::File::create(path)?;
            write_csv(report, file)?;
        }
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&report_json(report))?;
            fs::write(path, json)?;
        }
    }
    Ok(())
}

/// Render the report as an XLSX workbook with a single sheet.
pub fn xlsx_bytes(report: &Report) -> ExportResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet().set_name(SHEET_NAME)?;

    for (col, header) in report.headers().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (row_idx, row) in report.rows.iter().enumerate() {
        // rust_xlsxwriter uses 0-based row/col as u32/u16; row 0 is the header
        let row32 = (row_idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Number(n) => {
                    worksheet.write_number(row32, col as u16, *n)?;
                }
                Cell::Text(s) => {
                    worksheet.write_string(row32, col as u16, s)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Write the report as CSV: header row then data rows.
pub fn write_csv<W: Write>(report: &Report, writer: W) -> ExportResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(report.headers())?;
    for row in &report.rows {
        csv_writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// JSON document: mode, ordered columns and one object per row.
pub fn report_json(report: &Report) -> Value {
    json!({
        "mode": report.mode.token(),
        "columns": report.headers(),
        "rows": report.to_records(),
    })
}
