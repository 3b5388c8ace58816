//! Domain models for the sales report pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`Mode`] - Report mode (debit, credit, split) with its filter and schema
//! - [`OutputColumn`] - Columns of the produced report
//! - [`Grouping`] - Group key used by the aggregation engine
//! - [`InputRow`] - One typed sales transaction
//! - [`AggregatedRow`] - One customer after aggregation
//! - [`Report`] - Final table, always carrying the full header of its mode

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::TransformError;

// =============================================================================
// Input Columns
// =============================================================================

pub const COL_UNITS: &str = "UNIDADES";
pub const COL_CUSTOMER_NAME: &str = "NOMBRECLIENTE";
pub const COL_DOCUMENT_TYPE: &str = "TIPO_DE_DOCUMENTO";
pub const COL_IDENTIFICATION: &str = "IDENTIFICACION";
pub const COL_LAST_NAME_1: &str = "PRIMER_APELLIDO";
pub const COL_LAST_NAME_2: &str = "SEGUNDO_APELLIDO";
pub const COL_FIRST_NAME: &str = "PRIMER_NOMBRE";
pub const COL_OTHER_NAMES: &str = "OTROS_NOMBRES";
pub const COL_GROSS_AMOUNT: &str = "MontoBruto";
pub const COL_DISCOUNT: &str = "Descuento";
pub const COL_VAT: &str = "IVA";

/// Columns every input table must carry, by exact name.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    COL_UNITS,
    COL_CUSTOMER_NAME,
    COL_DOCUMENT_TYPE,
    COL_IDENTIFICATION,
    COL_LAST_NAME_1,
    COL_LAST_NAME_2,
    COL_FIRST_NAME,
    COL_OTHER_NAMES,
    COL_GROSS_AMOUNT,
    COL_DISCOUNT,
    COL_VAT,
];

// =============================================================================
// Output Columns
// =============================================================================

/// A column of the produced report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputColumn {
    DocumentType,
    Identification,
    CustomerName,
    LastName1,
    LastName2,
    FirstName,
    OtherNames,
    GrossAmount,
    GrossAmountPositive,
    GrossAmountNegative,
    Discount,
    Vat,
}

impl OutputColumn {
    /// Header text written to report artifacts.
    pub fn header(&self) -> &'static str {
        match self {
            Self::DocumentType => "TIPO DE DOCUMENTO",
            Self::Identification => "IDENTIFICACION",
            Self::CustomerName => "NOMBRECLIENTE",
            Self::LastName1 => "PRIMER_APELLIDO",
            Self::LastName2 => "SEGUNDO_APELLIDO",
            Self::FirstName => "PRIMER_NOMBRE",
            Self::OtherNames => "OTROS_NOMBRES",
            Self::GrossAmount => "MontoBruto",
            Self::GrossAmountPositive => "MontoBruto Positivo",
            Self::GrossAmountNegative => "MontoBruto Negativo",
            Self::Discount => "Descuento",
            Self::Vat => "Iva",
        }
    }
}

impl fmt::Display for OutputColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

const DEBIT_CREDIT_SCHEMA: [OutputColumn; 10] = [
    OutputColumn::DocumentType,
    OutputColumn::Identification,
    OutputColumn::CustomerName,
    OutputColumn::LastName1,
    OutputColumn::LastName2,
    OutputColumn::FirstName,
    OutputColumn::OtherNames,
    OutputColumn::GrossAmount,
    OutputColumn::Discount,
    OutputColumn::Vat,
];

const SPLIT_SCHEMA: [OutputColumn; 11] = [
    OutputColumn::DocumentType,
    OutputColumn::Identification,
    OutputColumn::CustomerName,
    OutputColumn::LastName1,
    OutputColumn::LastName2,
    OutputColumn::FirstName,
    OutputColumn::OtherNames,
    OutputColumn::GrossAmountPositive,
    OutputColumn::GrossAmountNegative,
    OutputColumn::Discount,
    OutputColumn::Vat,
];

// =============================================================================
// Mode
// =============================================================================

/// Report mode.
///
/// Each variant carries its row predicate, its output schema and the
/// default name of the artifact it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Rows with `units > 0`.
    #[serde(rename = "debito")]
    Debit,
    /// Rows with `units < 0`.
    #[serde(rename = "credito")]
    Credit,
    /// All rows, gross amount split into positive and negative sums.
    #[serde(rename = "split")]
    Split,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Debit, Mode::Credit, Mode::Split];

    /// Token accepted by [`Mode::from_str`].
    pub fn token(&self) -> &'static str {
        match self {
            Mode::Debit => "debito",
            Mode::Credit => "credito",
            Mode::Split => "split",
        }
    }

    /// Name used in log messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Debit => "Débito",
            Mode::Credit => "Crédito",
            Mode::Split => "Positivos y Negativos",
        }
    }

    /// Whether a row with the given unit count belongs to this mode.
    pub fn keeps(&self, units: f64) -> bool {
        match self {
            Mode::Debit => units > 0.0,
            Mode::Credit => units < 0.0,
            Mode::Split => true,
        }
    }

    /// Ordered output columns for this mode.
    pub fn output_schema(&self) -> &'static [OutputColumn] {
        match self {
            Mode::Debit | Mode::Credit => &DEBIT_CREDIT_SCHEMA,
            Mode::Split => &SPLIT_SCHEMA,
        }
    }

    /// Default artifact name, without extension.
    pub fn report_stem(&self) -> &'static str {
        match self {
            Mode::Debit => "reporte_debito",
            Mode::Credit => "reporte_credito",
            Mode::Split => "reporte_negativos_positivos",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Mode {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debito" => Ok(Mode::Debit),
            "credito" => Ok(Mode::Credit),
            "split" => Ok(Mode::Split),
            _ => Err(TransformError::InvalidMode(s.to_string())),
        }
    }
}

// =============================================================================
// Grouping
// =============================================================================

/// Key used to collapse rows into one report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Grouping {
    /// Customer name alone. Distinct customers sharing a name are merged.
    #[serde(rename = "name")]
    Name,
    /// Customer name and identification.
    #[default]
    #[serde(rename = "name-id")]
    NameAndIdentification,
}

impl Grouping {
    pub fn token(&self) -> &'static str {
        match self {
            Grouping::Name => "name",
            Grouping::NameAndIdentification => "name-id",
        }
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Grouping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" | "nombre" => Ok(Grouping::Name),
            "name-id" | "name_id" | "nombre-id" => Ok(Grouping::NameAndIdentification),
            other => Err(format!("Invalid grouping '{}': use 'name' or 'name-id'", other)),
        }
    }
}

// =============================================================================
// Value Coercion
// =============================================================================

/// String representation of a cell. Null and missing cells become empty.
pub fn text_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Numeric value of a cell. Anything that is not a finite number counts as zero.
pub fn numeric_value(value: Option<&Value>) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        Some(Value::Bool(true)) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

// =============================================================================
// Input Row
// =============================================================================

/// One sales transaction, typed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InputRow {
    pub units: f64,
    pub customer_name: String,
    pub document_type: String,
    pub identification: String,
    pub last_name_1: String,
    pub last_name_2: String,
    pub first_name: String,
    pub other_names: String,
    pub gross_amount: f64,
    pub discount: f64,
    pub vat: f64,
}

impl InputRow {
    /// Build a typed row from a record keyed by input column names.
    pub fn from_record(record: &Value) -> Self {
        let get = |col: &str| record.get(col);
        Self {
            units: numeric_value(get(COL_UNITS)),
            customer_name: text_value(get(COL_CUSTOMER_NAME)),
            document_type: text_value(get(COL_DOCUMENT_TYPE)),
            identification: text_value(get(COL_IDENTIFICATION)),
            last_name_1: text_value(get(COL_LAST_NAME_1)),
            last_name_2: text_value(get(COL_LAST_NAME_2)),
            first_name: text_value(get(COL_FIRST_NAME)),
            other_names: text_value(get(COL_OTHER_NAMES)),
            gross_amount: numeric_value(get(COL_GROSS_AMOUNT)),
            discount: numeric_value(get(COL_DISCOUNT)),
            vat: numeric_value(get(COL_VAT)),
        }
    }
}

// =============================================================================
// Aggregated Row
// =============================================================================

/// Summed gross amount of a group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GrossAmounts {
    /// Debit and credit reports.
    Total { gross: f64 },
    /// Split reports: positive and negative parts summed separately.
    Split { positive: f64, negative: f64 },
}

impl GrossAmounts {
    /// Sum of every amount column.
    pub fn net(&self) -> f64 {
        match self {
            GrossAmounts::Total { gross } => *gross,
            GrossAmounts::Split { positive, negative } => positive + negative,
        }
    }
}

/// One report line: a customer after aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRow {
    /// Cleaned document type of the first row in the group.
    pub document_type: String,
    pub identification: String,
    pub customer_name: String,
    pub last_name_1: String,
    pub last_name_2: String,
    pub first_name: String,
    pub other_names: String,
    pub amounts: GrossAmounts,
    pub discount: f64,
    pub vat: f64,
}

impl AggregatedRow {
    /// Columns this row can supply, under their output names.
    pub fn cells(&self) -> Vec<(OutputColumn, Cell)> {
        let mut cells = vec![
            (OutputColumn::DocumentType, Cell::text(&self.document_type)),
            (OutputColumn::Identification, Cell::text(&self.identification)),
            (OutputColumn::CustomerName, Cell::text(&self.customer_name)),
            (OutputColumn::LastName1, Cell::text(&self.last_name_1)),
            (OutputColumn::LastName2, Cell::text(&self.last_name_2)),
            (OutputColumn::FirstName, Cell::text(&self.first_name)),
            (OutputColumn::OtherNames, Cell::text(&self.other_names)),
        ];
        match self.amounts {
            GrossAmounts::Total { gross } => {
                cells.push((OutputColumn::GrossAmount, Cell::Number(gross)));
            }
            GrossAmounts::Split { positive, negative } => {
                cells.push((OutputColumn::GrossAmountPositive, Cell::Number(positive)));
                cells.push((OutputColumn::GrossAmountNegative, Cell::Number(negative)));
            }
        }
        cells.push((OutputColumn::Discount, Cell::Number(self.discount)));
        cells.push((OutputColumn::Vat, Cell::Number(self.vat)));
        cells
    }
}

// =============================================================================
// Report
// =============================================================================

/// A report cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn text(s: &str) -> Self {
        Cell::Text(s.to_string())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(_) => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Final report table.
///
/// `columns` always equals the mode's output schema, even with zero rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub mode: Mode,
    pub columns: Vec<OutputColumn>,
    pub rows: Vec<Vec<Cell>>,
}

impl Report {
    /// A zero-row report carrying the full header of `mode`.
    pub fn empty(mode: Mode) -> Self {
        Self {
            mode,
            columns: mode.output_schema().to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Header texts in column order.
    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.header()).collect()
    }

    /// Position of a column in the report.
    pub fn column_index(&self, column: OutputColumn) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    /// Cell of a given row and column.
    pub fn cell(&self, row: usize, column: OutputColumn) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Rows as JSON objects keyed by header text, in column order.
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                for (column, cell) in self.columns.iter().zip(row) {
                    let value = match cell {
                        Cell::Number(n) => serde_json::json!(n),
                        Cell::Text(s) => Value::String(s.clone()),
                    };
                    obj.insert(column.header().to_string(), value);
                }
                Value::Object(obj)
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("debito".parse::<Mode>(), Ok(Mode::Debit));
        assert_eq!(" CREDITO ".parse::<Mode>(), Ok(Mode::Credit));
        assert_eq!("split".parse::<Mode>(), Ok(Mode::Split));
        assert_eq!(
            "debit".parse::<Mode>(),
            Err(TransformError::InvalidMode("debit".into()))
        );
    }

    #[test]
    fn test_mode_predicates() {
        assert!(Mode::Debit.keeps(1.0));
        assert!(!Mode::Debit.keeps(0.0));
        assert!(!Mode::Debit.keeps(-1.0));
        assert!(Mode::Credit.keeps(-0.5));
        assert!(!Mode::Credit.keeps(0.0));
        assert!(Mode::Split.keeps(0.0));
    }

    #[test]
    fn test_output_schemas() {
        let debit: Vec<_> = Mode::Debit.output_schema().iter().map(|c| c.header()).collect();
        assert_eq!(
            debit,
            vec![
                "TIPO DE DOCUMENTO", "IDENTIFICACION", "NOMBRECLIENTE", "PRIMER_APELLIDO",
                "SEGUNDO_APELLIDO", "PRIMER_NOMBRE", "OTROS_NOMBRES", "MontoBruto",
                "Descuento", "Iva",
            ]
        );
        assert_eq!(Mode::Credit.output_schema(), Mode::Debit.output_schema());

        let split = Mode::Split.output_schema();
        assert_eq!(split.len(), 11);
        assert_eq!(split[7], OutputColumn::GrossAmountPositive);
        assert_eq!(split[8], OutputColumn::GrossAmountNegative);
        assert!(!split.contains(&OutputColumn::GrossAmount));
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(numeric_value(Some(&json!(12.5))), 12.5);
        assert_eq!(numeric_value(Some(&json!(" -3 "))), -3.0);
        assert_eq!(numeric_value(Some(&json!("abc"))), 0.0);
        assert_eq!(numeric_value(Some(&json!("NaN"))), 0.0);
        assert_eq!(numeric_value(Some(&json!("inf"))), 0.0);
        assert_eq!(numeric_value(Some(&Value::Null)), 0.0);
        assert_eq!(numeric_value(None), 0.0);
    }

    #[test]
    fn test_text_coercion() {
        assert_eq!(text_value(Some(&json!("ANA"))), "ANA");
        assert_eq!(text_value(Some(&json!(900123))), "900123");
        assert_eq!(text_value(Some(&Value::Null)), "");
        assert_eq!(text_value(None), "");
    }

    #[test]
    fn test_input_row_from_record() {
        let record = json!({
            "UNIDADES": "2",
            "NOMBRECLIENTE": "ANA PEREZ",
            "TIPO_DE_DOCUMENTO": "13 Cedula",
            "IDENTIFICACION": 1010,
            "MontoBruto": 100,
            "Descuento": "x",
            "IVA": 19.0
        });
        let row = InputRow::from_record(&record);
        assert_eq!(row.units, 2.0);
        assert_eq!(row.customer_name, "ANA PEREZ");
        assert_eq!(row.identification, "1010");
        assert_eq!(row.first_name, "");
        assert_eq!(row.gross_amount, 100.0);
        assert_eq!(row.discount, 0.0);
        assert_eq!(row.vat, 19.0);
    }

    #[test]
    fn test_empty_report_keeps_header() {
        let report = Report::empty(Mode::Split);
        assert!(report.is_empty());
        assert_eq!(report.headers().len(), 11);
        assert!(report.to_records().is_empty());
    }

    #[test]
    fn test_report_records_use_headers() {
        let row = AggregatedRow {
            document_type: "Cedula".into(),
            identification: "1".into(),
            customer_name: "ANA".into(),
            last_name_1: String::new(),
            last_name_2: String::new(),
            first_name: String::new(),
            other_names: String::new(),
            amounts: GrossAmounts::Total { gross: 10.0 },
            discount: 1.0,
            vat: 2.0,
        };
        let report = Report {
            mode: Mode::Debit,
            columns: Mode::Debit.output_schema().to_vec(),
            rows: vec![row.cells().into_iter().map(|(_, c)| c).collect()],
        };
        let records = report.to_records();
        assert_eq!(records[0]["NOMBRECLIENTE"], "ANA");
        assert_eq!(records[0]["MontoBruto"], 10.0);
        assert_eq!(report.cell(0, OutputColumn::Vat), Some(&Cell::Number(2.0)));
    }

    #[test]
    fn test_grouping_parse() {
        assert_eq!("name".parse::<Grouping>(), Ok(Grouping::Name));
        assert_eq!("name-id".parse::<Grouping>(), Ok(Grouping::NameAndIdentification));
        assert!("x".parse::<Grouping>().is_err());
        assert_eq!(Grouping::default(), Grouping::NameAndIdentification);
    }
}
