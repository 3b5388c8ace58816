//! Select and order report columns.

use std::collections::HashMap;

use crate::error::{TransformError, TransformResult};
use crate::models::{AggregatedRow, Cell, Mode, OutputColumn, Report};

/// Project aggregated rows onto the output schema of `mode`.
///
/// Every row must supply every column of the schema; otherwise the result is
/// [`TransformError::SchemaProjection`] listing expected and available columns.
pub fn project(rows: &[AggregatedRow], mode: Mode) -> TransformResult<Report> {
    let schema = mode.output_schema();
    let mut report = Report::empty(mode);

    for row in rows {
        let mut available: HashMap<OutputColumn, Cell> = row.cells().into_iter().collect();

        let missing = schema.iter().any(|column| !available.contains_key(column));
        if missing {
            let available_names = row
                .cells()
                .into_iter()
                .map(|(column, _)| column.header().to_string())
                .collect();
            return Err(TransformError::SchemaProjection {
                mode: mode.token().to_string(),
                expected: schema.iter().map(|c| c.header().to_string()).collect(),
                available: available_names,
            });
        }

        let cells = schema
            .iter()
            .filter_map(|column| available.remove(column))
            .collect();
        report.rows.push(cells);
    }

    Ok(report)
}
