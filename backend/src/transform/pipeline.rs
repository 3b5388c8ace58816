//! High-level pipeline API for sales reports.
//!
//! [`Transformer`] is the in-memory core: schema validation, mode filter,
//! customer name consolidation, document type cleaning, aggregation,
//! optional discount subtraction and projection onto the mode's columns.
//! [`generate_report`] wraps it with loading and writing.
//!
//! # Example
//!
//! ```rust,ignore
//! use salesreport::{generate_report, Mode, OutputTarget, ReportFormat, TransformOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = TransformOptions::new(Mode::Debit).with_discount(true);
//!     let target = OutputTarget::in_dir(Path::new("out"), Mode::Debit, ReportFormat::Xlsx);
//!     let summary = generate_report(&["enero.xlsx", "febrero.xlsx"], &options, &target)?;
//!
//!     println!("{} customers written to {}", summary.rows, summary.output.display());
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::discount::subtract_discount;
use super::grouper::aggregate;
use super::names::{consolidate_customer_names, FINAL_CONSUMER_RULE};
use super::projector::project;
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::{ExportResult, PipelineResult, TransformResult};
use crate::export::{default_output_path, write_report, ReportFormat};
use crate::models::{Grouping, InputRow, Mode, Report};
use crate::parser::{load_tables, Table};
use crate::validation::validate_columns;

/// Options for one transformation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformOptions {
    /// Report mode
    pub mode: Mode,

    /// Subtract the absolute aggregated discount from the amount columns
    #[serde(default)]
    pub subtract_discount: bool,

    /// Group key
    #[serde(default)]
    pub grouping: Grouping,
}

impl TransformOptions {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            subtract_discount: false,
            grouping: Grouping::default(),
        }
    }

    pub fn with_discount(mut self, subtract_discount: bool) -> Self {
        self.subtract_discount = subtract_discount;
        self
    }

    pub fn with_grouping(mut self, grouping: Grouping) -> Self {
        self.grouping = grouping;
        self
    }
}

/// Counters collected during a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformStats {
    /// Rows in the input table
    pub input_rows: usize,
    /// Rows kept by the mode filter
    pub retained_rows: usize,
    /// Customer names rewritten to the canonical final consumer
    pub consolidated_names: usize,
    /// Report lines produced
    pub groups: usize,
}

/// Report plus run statistics
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub report: Report,
    pub stats: TransformStats,
}

/// The report transformer.
#[derive(Debug, Clone)]
pub struct Transformer {
    options: TransformOptions,
}

impl Transformer {
    pub fn new(options: TransformOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Transform a table into the report for the configured mode.
    ///
    /// The table is never modified; filtering and normalization work on a
    /// private copy of its rows. Returns a header-only report when no row
    /// passes the mode filter.
    pub fn run(&self, table: &Table) -> TransformResult<TransformOutput> {
        let mode = self.options.mode;
        log_info(format!("Processing {} rows for '{}'...", table.len(), mode.display_name()));

        // 1. Required columns, before anything mode-specific
        validate_columns(&table.headers)?;

        let mut stats = TransformStats {
            input_rows: table.len(),
            ..Default::default()
        };

        // 2. Mode filter
        let mut rows: Vec<InputRow> = table
            .records
            .iter()
            .map(InputRow::from_record)
            .filter(|row| mode.keeps(row.units))
            .collect();
        stats.retained_rows = rows.len();
        log_info_indent(format!("{} rows kept by the '{}' filter", rows.len(), mode), 1);

        if rows.is_empty() {
            log_warning(format!(
                "No rows for '{}': the report will only contain headers",
                mode.display_name()
            ));
            return Ok(TransformOutput {
                report: Report::empty(mode),
                stats,
            });
        }

        // 3. Customer names
        stats.consolidated_names = consolidate_customer_names(&mut rows);
        log_info_indent(
            format!(
                "{} customer names consolidated into '{}'",
                stats.consolidated_names,
                FINAL_CONSUMER_RULE.canonical()
            ),
            1,
        );

        // 4. Aggregate (document types are cleaned per group)
        let mut aggregated = aggregate(&rows, mode, self.options.grouping);
        stats.groups = aggregated.len();
        log_info_indent(
            format!("{} customers after grouping by {}", aggregated.len(), self.options.grouping),
            1,
        );

        // 5. Discount
        if self.options.subtract_discount {
            subtract_discount(&mut aggregated);
            log_info_indent("Discount subtracted from gross amounts", 1);
        }

        // 6. Output columns
        let report = project(&aggregated, mode)?;
        log_success(format!("Report ready: {} rows", report.len()));

        Ok(TransformOutput { report, stats })
    }
}

/// Transform a table with the given options, discarding statistics.
pub fn transform_table(table: &Table, options: &TransformOptions) -> TransformResult<Report> {
    Transformer::new(options.clone()).run(table).map(|out| out.report)
}

/// Where a report is written.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTarget {
    pub path: PathBuf,
    pub format: ReportFormat,
}

impl OutputTarget {
    /// The mode's default file name inside `dir`.
    pub fn in_dir(dir: &Path, mode: Mode, format: ReportFormat) -> Self {
        Self {
            path: default_output_path(dir, mode, format),
            format,
        }
    }

    /// An explicit file; the format follows its extension.
    pub fn file(path: impl Into<PathBuf>) -> ExportResult<Self> {
        let path = path.into();
        let format = ReportFormat::from_path(&path)?;
        Ok(Self { path, format })
    }
}

/// Result of a complete load → transform → write run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub mode: Mode,
    pub output: PathBuf,
    pub format: ReportFormat,
    /// Data rows written
    pub rows: usize,
    /// True when only the header was written
    pub header_only: bool,
    pub stats: TransformStats,
}

/// Load `inputs`, build the report and write it to `target`.
pub fn generate_report<P: AsRef<Path>>(
    inputs: &[P],
    options: &TransformOptions,
    target: &OutputTarget,
) -> PipelineResult<ReportSummary> {
    log_info(format!("📖 Reading {} input file(s)...", inputs.len()));
    let table = load_tables(inputs)?;
    for source in &table.sources {
        let detail = match (&source.encoding, source.delimiter) {
            (Some(enc), Some(delim)) => format!(" ({}, separator '{}')", enc, format_delimiter(delim)),
            _ => String::new(),
        };
        log_success(format!("{}: {} rows{}", source.name, source.row_count, detail));
    }

    let output = Transformer::new(options.clone()).run(&table)?;

    log_info(format!("💾 Writing {}...", target.path.display()));
    write_report(&output.report, &target.path, target.format)?;
    log_success(format!("Report saved to {}", target.path.display()));

    Ok(ReportSummary {
        mode: options.mode,
        output: target.path.clone(),
        format: target.format,
        rows: output.report.len(),
        header_only: output.report.is_empty(),
        stats: output.stats,
    })
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}
