//! Spreadsheet input (xlsx, xlsm, xls, xlsb, ods) via calamine.
//!
//! Only the first worksheet is read. Its first row is the header.

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader, Sheets};
use serde_json::{json, Map, Value};
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use super::{InputFormat, SourceInfo, Table};
use crate::error::{TableError, TableResult};

/// Load the first worksheet of a workbook on disk.
pub fn load_workbook(path: &Path) -> TableResult<Table> {
    let name = path.display().to_string();
    let workbook = open_workbook_auto(path).map_err(|e| TableError::Workbook {
        name: name.clone(),
        message: e.to_string(),
    })?;
    read_first_sheet(workbook, &name)
}

/// Load the first worksheet of an in-memory workbook.
pub fn parse_workbook_bytes(bytes: Vec<u8>, name: &str) -> TableResult<Table> {
    if bytes.is_empty() {
        return Err(TableError::EmptyFile(name.to_string()));
    }
    let workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| TableError::Workbook {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    read_first_sheet(workbook, name)
}

fn read_first_sheet<RS: Read + Seek>(mut workbook: Sheets<RS>, name: &str) -> TableResult<Table> {
    let sheet_names = workbook.sheet_names().to_vec();
    let first = sheet_names
        .first()
        .ok_or_else(|| TableError::EmptyFile(name.to_string()))?;

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| TableError::Workbook {
            name: name.to_string(),
            message: format!("Failed to read sheet '{}': {}", first, e),
        })?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| TableError::EmptyFile(name.to_string()))?;

    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| match cell_to_value(cell) {
            Value::String(s) => s.trim().to_string(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(TableError::NoHeaders(name.to_string()));
    }

    let mut records = Vec::new();
    for row in rows {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }

        let mut obj = Map::new();
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = row.get(i).map(cell_to_value).unwrap_or(Value::Null);
            obj.insert(header.clone(), value);
        }
        records.push(Value::Object(obj));
    }

    let headers: Vec<String> = headers.into_iter().filter(|h| !h.is_empty()).collect();
    let source = SourceInfo {
        name: name.to_string(),
        format: InputFormat::Spreadsheet,
        encoding: None,
        delimiter: None,
        row_count: records.len(),
    };

    Ok(Table {
        headers,
        records,
        sources: vec![source],
    })
}

/// Convert a calamine cell into a JSON value.
fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => {
            if s.trim().is_empty() {
                Value::Null
            } else {
                Value::String(s.clone())
            }
        }
        Data::Float(n) => {
            // Integral floats keep their integer form so identifiers print without ".0"
            if n.fract() == 0.0 && n.abs() < 1e15 {
                json!(*n as i64)
            } else {
                json!(n)
            }
        }
        Data::Int(n) => json!(n),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => json!(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(e) => Value::String(format!("#{:?}", e)),
    }
}
