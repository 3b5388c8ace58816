//! Input table loading with encoding and delimiter auto-detection.
//!
//! Reads CSV exports and spreadsheets into a [`Table`]: a header list plus
//! one JSON object per row, keyed by header. Several files are concatenated
//! row-wise. No report-specific logic here.

pub mod xlsx;

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult, TableError, TableResult};

/// Kind of input file, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Csv,
    Spreadsheet,
}

impl InputFormat {
    /// Detect the format from a file name.
    pub fn from_name(name: &str) -> TableResult<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" | "txt" | "tsv" => Ok(InputFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(InputFormat::Spreadsheet),
            _ => Err(TableError::UnsupportedFormat(name.to_string())),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Csv => f.write_str("csv"),
            InputFormat::Spreadsheet => f.write_str("spreadsheet"),
        }
    }
}

/// Where a block of rows came from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    /// File name or path as given
    pub name: String,
    pub format: InputFormat,
    /// Detected encoding (CSV only)
    pub encoding: Option<String>,
    /// Detected delimiter (CSV only)
    pub delimiter: Option<char>,
    pub row_count: usize,
}

/// Rows with named columns, loaded from one or more files.
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Column headers, in first-seen order
    pub headers: Vec<String>,
    /// One JSON object per row
    pub records: Vec<Value>,
    /// Files that contributed rows
    pub sources: Vec<SourceInfo>,
}

impl Table {
    pub fn new(headers: Vec<String>, records: Vec<Value>) -> Self {
        Self {
            headers,
            records,
            sources: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Append another table's rows. Headers are merged; nothing is deduplicated.
    pub fn append(&mut self, other: Table) {
        for header in other.headers {
            if !self.has_column(&header) {
                self.headers.push(header);
            }
        }
        self.records.extend(other.records);
        self.sources.extend(other.sources);
    }

    /// Concatenate tables row-wise, in order.
    pub fn concat(tables: impl IntoIterator<Item = Table>) -> Table {
        let mut combined = Table::default();
        for table in tables {
            combined.append(table);
        }
        combined
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding. A leading BOM is dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let text = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ';';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

fn cell_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Value::Null
    } else {
        Value::String(trimmed.to_string())
    }
}

/// Parse CSV text with an explicit delimiter.
///
/// Empty cells become `null`; every other cell is kept as a string.
pub fn parse_csv_str(content: &str, delimiter: char) -> TableResult<(Vec<String>, Vec<Value>)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| TableError::Parse {
            line: 1,
            message: format!("Cannot read header: {}", e),
        })?
        .iter()
        .map(|s| s.trim().trim_matches('"').to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(TableError::Parse {
            line: 1,
            message: "No headers found".to_string(),
        });
    }

    let mut records = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| TableError::Parse {
            line: e.position().map(|p| p.line() as usize).unwrap_or(idx + 2),
            message: e.to_string(),
        })?;

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let mut obj = Map::new();
        for (i, header) in headers.iter().enumerate() {
            obj.insert(header.clone(), cell_value(record.get(i).unwrap_or("")));
        }
        records.push(Value::Object(obj));
    }

    Ok((headers, records))
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_csv_bytes(bytes: &[u8], name: &str) -> TableResult<Table> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);

    if content.trim().is_empty() {
        return Err(TableError::EmptyFile(name.to_string()));
    }

    let delimiter = detect_delimiter(&content);
    let (headers, records) = parse_csv_str(&content, delimiter)?;

    let source = SourceInfo {
        name: name.to_string(),
        format: InputFormat::Csv,
        encoding: Some(encoding),
        delimiter: Some(delimiter),
        row_count: records.len(),
    };

    Ok(Table {
        headers,
        records,
        sources: vec![source],
    })
}

/// Parse an in-memory upload, dispatching on the file name's extension.
pub fn parse_bytes(bytes: &[u8], name: &str) -> TableResult<Table> {
    match InputFormat::from_name(name)? {
        InputFormat::Csv => parse_csv_bytes(bytes, name),
        InputFormat::Spreadsheet => xlsx::parse_workbook_bytes(bytes.to_vec(), name),
    }
}

/// Load one input file.
pub fn load_table<P: AsRef<Path>>(path: P) -> TableResult<Table> {
    let path = path.as_ref();
    let name = path.display().to_string();

    match InputFormat::from_name(&name)? {
        InputFormat::Csv => {
            let bytes = std::fs::read(path)?;
            parse_csv_bytes(&bytes, &name)
        }
        InputFormat::Spreadsheet => xlsx::load_workbook(path),
    }
}

/// Load several input files and concatenate them row-wise.
pub fn load_tables<P: AsRef<Path>>(paths: &[P]) -> PipelineResult<Table> {
    if paths.is_empty() {
        return Err(PipelineError::NoInputFiles);
    }

    let mut tables = Vec::with_capacity(paths.len());
    for path in paths {
        tables.push(load_table(path)?);
    }
    Ok(Table::concat(tables))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_simple_csv() {
        let (headers, rows) = parse_csv_str("name;age\nAlice;30\nBob;25", ';').unwrap();

        assert_eq!(headers, vec!["name", "age"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "Alice");
        assert_eq!(rows[1]["age"], "25");
    }

    #[test]
    fn test_quoted_values() {
        let csv = "name;value\n\"PEREZ; ANA\";\"Hello World\"";
        let (_, rows) = parse_csv_str(csv, ';').unwrap();

        assert_eq!(rows[0]["name"], "PEREZ; ANA");
        assert_eq!(rows[0]["value"], "Hello World");
    }

    #[test]
    fn test_empty_lines_skipped() {
        let (_, rows) = parse_csv_str("a;b\n1;2\n\n;\n3;4\n", ';').unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_missing_values_are_null() {
        let (_, rows) = parse_csv_str("a;b;c\n1;;3\n4", ';').unwrap();

        assert_eq!(rows[0]["a"], "1");
        assert_eq!(rows[0]["b"], Value::Null);
        assert_eq!(rows[1]["c"], Value::Null);
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("a|b|c"), '|');
    }

    #[test]
    fn test_bom_is_dropped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"UNIDADES,IVA\n1,2\n");
        let table = parse_csv_bytes(&bytes, "bom.csv").unwrap();
        assert_eq!(table.headers, vec!["UNIDADES", "IVA"]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        assert_eq!(decode_content(bytes, "iso-8859-1"), "Société");
    }

    #[test]
    fn test_empty_file_error() {
        let err = parse_csv_bytes(b"  \n", "vacio.csv").unwrap_err();
        assert!(matches!(err, TableError::EmptyFile(_)));
    }

    #[test]
    fn test_input_format_from_name() {
        assert_eq!(InputFormat::from_name("a.CSV").unwrap(), InputFormat::Csv);
        assert_eq!(InputFormat::from_name("dir/b.xlsx").unwrap(), InputFormat::Spreadsheet);
        assert!(matches!(
            InputFormat::from_name("c.pdf"),
            Err(TableError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_concat_merges_headers_and_keeps_duplicates() {
        let a = Table::new(
            vec!["x".into(), "y".into()],
            vec![json!({"x": "1", "y": "2"})],
        );
        let b = Table::new(
            vec!["y".into(), "z".into()],
            vec![json!({"y": "2", "z": "3"}), json!({"y": "2", "z": "3"})],
        );
        let table = Table::concat(vec![a, b]);

        assert_eq!(table.headers, vec!["x", "y", "z"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.records[1], table.records[2]);
    }

    #[test]
    fn test_load_tables_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("enero.csv");
        let second = dir.path().join("febrero.csv");
        std::fs::File::create(&first).unwrap().write_all(b"a;b\n1;2\n").unwrap();
        std::fs::File::create(&second).unwrap().write_all(b"a;b\n3;4\n5;6\n").unwrap();

        let table = load_tables(&[first, second]).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.sources.len(), 2);
        assert_eq!(table.sources[1].row_count, 2);
        assert_eq!(table.records[2]["a"], "5");
    }

    #[test]
    fn test_load_tables_requires_paths() {
        let paths: Vec<&str> = Vec::new();
        assert!(matches!(load_tables(&paths), Err(PipelineError::NoInputFiles)));
    }
}
