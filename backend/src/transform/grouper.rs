//! Collapse transaction rows into one line per customer.
//!
//! # Architecture
//!
//! ```text
//! Input rows (filtered, normalized)        →  Aggregated rows
//! ┌──────────────────────────────────┐       ┌───────────────────────────┐
//! │ ANA  1010  MontoBruto 100        │       │ ANA 1010  MontoBruto 130  │
//! │ ANA  1010  MontoBruto  30        │  →    ├───────────────────────────┤
//! │ LUIS 2020  MontoBruto -40        │       │ LUIS 2020 MontoBruto -40  │
//! └──────────────────────────────────┘       └───────────────────────────┘
//! ```
//!
//! Text fields take the value of the first row of the group (input order);
//! amounts are summed. In split mode each row's gross amount is divided
//! into its positive and negative part *before* summing, so a customer with
//! both sales and returns shows both totals.
//!
//! Groups come out ordered by key.

use std::collections::BTreeMap;

use super::doctype::clean_document_type;
use crate::models::{AggregatedRow, GrossAmounts, Grouping, InputRow, Mode};

/// Positive and negative part of an amount. One side is always zero.
pub fn split_gross_amount(gross: f64) -> (f64, f64) {
    if gross > 0.0 {
        (gross, 0.0)
    } else {
        (0.0, gross.min(0.0))
    }
}

/// Group key of a row under the given grouping.
fn group_key(row: &InputRow, grouping: Grouping) -> (String, String) {
    match grouping {
        Grouping::Name => (row.customer_name.clone(), String::new()),
        Grouping::NameAndIdentification => (row.customer_name.clone(), row.identification.clone()),
    }
}

/// Aggregate rows into one [`AggregatedRow`] per distinct group key.
pub fn aggregate(rows: &[InputRow], mode: Mode, grouping: Grouping) -> Vec<AggregatedRow> {
    let mut groups: BTreeMap<(String, String), GroupBuilder> = BTreeMap::new();

    for row in rows {
        groups
            .entry(group_key(row, grouping))
            .or_insert_with(|| GroupBuilder::new(row, mode))
            .add(row);
    }

    groups.into_values().map(GroupBuilder::build).collect()
}

/// Accumulates one group.
struct GroupBuilder {
    document_type: String,
    identification: String,
    customer_name: String,
    last_name_1: String,
    last_name_2: String,
    first_name: String,
    other_names: String,
    split: bool,
    gross: f64,
    positive: f64,
    negative: f64,
    discount: f64,
    vat: f64,
}

impl GroupBuilder {
    fn new(first: &InputRow, mode: Mode) -> Self {
        Self {
            document_type: clean_document_type(&first.document_type).into_owned(),
            identification: first.identification.clone(),
            customer_name: first.customer_name.clone(),
            last_name_1: first.last_name_1.clone(),
            last_name_2: first.last_name_2.clone(),
            first_name: first.first_name.clone(),
            other_names: first.other_names.clone(),
            split: mode == Mode::Split,
            gross: 0.0,
            positive: 0.0,
            negative: 0.0,
            discount: 0.0,
            vat: 0.0,
        }
    }

    fn add(&mut self, row: &InputRow) {
        if self.split {
            let (positive, negative) = split_gross_amount(row.gross_amount);
            self.positive += positive;
            self.negative += negative;
        } else {
            self.gross += row.gross_amount;
        }
        self.discount += row.discount;
        self.vat += row.vat;
    }

    fn build(self) -> AggregatedRow {
        let amounts = if self.split {
            GrossAmounts::Split {
                positive: self.positive,
                negative: self.negative,
            }
        } else {
            GrossAmounts::Total { gross: self.gross }
        };

        AggregatedRow {
            document_type: self.document_type,
            identification: self.identification,
            customer_name: self.customer_name,
            last_name_1: self.last_name_1,
            last_name_2: self.last_name_2,
            first_name: self.first_name,
            other_names: self.other_names,
            amounts,
            discount: self.discount,
            vat: self.vat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, id: &str, gross: f64, discount: f64, vat: f64) -> InputRow {
        InputRow {
            units: 1.0,
            customer_name: name.to_string(),
            identification: id.to_string(),
            document_type: "13 Cédula".to_string(),
            gross_amount: gross,
            discount,
            vat,
            ..Default::default()
        }
    }

    #[test]
    fn test_sums_per_customer() {
        let rows = vec![
            row("ANA", "1", 100.0, 10.0, 19.0),
            row("LUIS", "2", 40.0, 0.0, 7.6),
            row("ANA", "1", 50.0, 5.0, 9.0),
        ];
        let grouped = aggregate(&rows, Mode::Debit, Grouping::NameAndIdentification);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].customer_name, "ANA");
        assert_eq!(grouped[0].amounts, GrossAmounts::Total { gross: 150.0 });
        assert_eq!(grouped[0].discount, 15.0);
        assert_eq!(grouped[0].vat, 28.0);
        assert_eq!(grouped[0].document_type, "Cédula");
    }

    #[test]
    fn test_first_row_wins_for_text_fields() {
        let mut first = row("ANA", "1", 1.0, 0.0, 0.0);
        first.first_name = "ANA".into();
        first.document_type = "31 NIT".into();
        let mut second = row("ANA", "1", 1.0, 0.0, 0.0);
        second.first_name = "ANITA".into();

        let grouped = aggregate(&[first, second], Mode::Debit, Grouping::Name);
        assert_eq!(grouped[0].first_name, "ANA");
        assert_eq!(grouped[0].document_type, "NIT");
    }

    #[test]
    fn test_grouping_by_name_merges_identifications() {
        let rows = vec![row("ANA", "1", 10.0, 0.0, 0.0), row("ANA", "2", 20.0, 0.0, 0.0)];

        let by_name = aggregate(&rows, Mode::Debit, Grouping::Name);
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].identification, "1");
        assert_eq!(by_name[0].amounts.net(), 30.0);

        let by_name_id = aggregate(&rows, Mode::Debit, Grouping::NameAndIdentification);
        assert_eq!(by_name_id.len(), 2);
    }

    #[test]
    fn test_split_before_grouping() {
        let rows = vec![
            row("ANA", "1", 100.0, 0.0, 0.0),
            row("ANA", "1", -30.0, 0.0, 0.0),
            row("ANA", "1", 20.0, 0.0, 0.0),
        ];
        let grouped = aggregate(&rows, Mode::Split, Grouping::NameAndIdentification);

        assert_eq!(
            grouped[0].amounts,
            GrossAmounts::Split {
                positive: 120.0,
                negative: -30.0
            }
        );
    }

    #[test]
    fn test_split_gross_amount() {
        assert_eq!(split_gross_amount(5.0), (5.0, 0.0));
        assert_eq!(split_gross_amount(-5.0), (0.0, -5.0));
        assert_eq!(split_gross_amount(0.0), (0.0, 0.0));
    }

    #[test]
    fn test_groups_ordered_by_key() {
        let rows = vec![row("ZOE", "9", 1.0, 0.0, 0.0), row("ANA", "1", 1.0, 0.0, 0.0)];
        let grouped = aggregate(&rows, Mode::Credit, Grouping::NameAndIdentification);
        let names: Vec<_> = grouped.iter().map(|r| r.customer_name.as_str()).collect();
        assert_eq!(names, vec!["ANA", "ZOE"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[], Mode::Split, Grouping::Name).is_empty());
    }
}
