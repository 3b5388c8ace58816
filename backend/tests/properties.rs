// Property-based tests for the report transformer.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;
use salesreport::{
    aggregate, consolidate_customer_names, split_gross_amount, subtract_discount,
    GrossAmounts, Grouping, InputRow, Mode, Table, TransformOptions, Transformer, FINAL_CONSUMER,
    REQUIRED_COLUMNS,
};
use serde_json::json;

const EPSILON: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Amount with two decimals.
fn arb_amount() -> impl Strategy<Value = f64> {
    (-100_000i64..100_000).prop_map(|cents| cents as f64 / 100.0)
}

fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => prop::sample::select(vec!["ANA", "LUIS", "MARIA PEREZ"]).prop_map(String::from),
        1 => prop::sample::select(vec![
            "cliente final",
            "CONSUMIDOR FINAL",
            "Consumidor Finall",
            "CLIENTE CONSUMIDOR FINAL",
        ])
        .prop_map(String::from),
        1 => r"[A-Z]{1,8}",
    ]
}

fn arb_mode() -> impl Strategy<Value = Mode> {
    prop::sample::select(Mode::ALL.to_vec())
}

fn arb_grouping() -> impl Strategy<Value = Grouping> {
    prop_oneof![Just(Grouping::Name), Just(Grouping::NameAndIdentification)]
}

fn arb_row() -> impl Strategy<Value = InputRow> {
    (
        -3i32..4,
        arb_name(),
        prop::sample::select(vec!["13 CC", "31 NIT", "CE", ""]),
        prop::sample::select(vec!["1", "2", "222222222"]),
        arb_amount(),
        arb_amount(),
        arb_amount(),
    )
        .prop_map(|(units, name, doc, id, gross, discount, vat)| InputRow {
            units: units as f64,
            customer_name: name,
            document_type: doc.to_string(),
            identification: id.to_string(),
            gross_amount: gross,
            discount,
            vat,
            ..InputRow::default()
        })
}

fn arb_rows() -> impl Strategy<Value = Vec<InputRow>> {
    prop::collection::vec(arb_row(), 0..40)
}

fn to_table(rows: &[InputRow]) -> Table {
    let records = rows
        .iter()
        .map(|r| {
            json!({
                "UNIDADES": r.units,
                "NOMBRECLIENTE": r.customer_name,
                "TIPO_DE_DOCUMENTO": r.document_type,
                "IDENTIFICACION": r.identification,
                "PRIMER_APELLIDO": r.last_name_1,
                "SEGUNDO_APELLIDO": r.last_name_2,
                "PRIMER_NOMBRE": r.first_name,
                "OTROS_NOMBRES": r.other_names,
                "MontoBruto": r.gross_amount,
                "Descuento": r.discount,
                "IVA": r.vat,
            })
        })
        .collect();
    Table::new(REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(), records)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON * (1.0 + a.abs().max(b.abs()))
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config())]

    #[test]
    fn split_parts_add_up(gross in arb_amount()) {
        let (positive, negative) = split_gross_amount(gross);
        prop_assert!(positive >= 0.0);
        prop_assert!(negative <= 0.0);
        prop_assert!(positive == 0.0 || negative == 0.0);
        prop_assert_eq!(positive + negative, gross);
    }

    #[test]
    fn filter_keeps_exactly_the_mode_rows(rows in arb_rows(), mode in arb_mode()) {
        let out = Transformer::new(TransformOptions::new(mode)).run(&to_table(&rows)).unwrap();
        let expected = rows.iter().filter(|r| mode.keeps(r.units)).count();
        prop_assert_eq!(out.stats.retained_rows, expected);
        prop_assert_eq!(out.stats.input_rows, rows.len());
    }

    #[test]
    fn aggregation_preserves_sums(rows in arb_rows(), mode in arb_mode(), grouping in arb_grouping()) {
        let aggregated = aggregate(&rows, mode, grouping);

        let gross: f64 = rows.iter().map(|r| r.gross_amount).sum();
        let discount: f64 = rows.iter().map(|r| r.discount).sum();
        let vat: f64 = rows.iter().map(|r| r.vat).sum();

        prop_assert!(close(aggregated.iter().map(|a| a.amounts.net()).sum(), gross));
        prop_assert!(close(aggregated.iter().map(|a| a.discount).sum(), discount));
        prop_assert!(close(aggregated.iter().map(|a| a.vat).sum(), vat));
    }

    #[test]
    fn split_totals_have_fixed_signs(rows in arb_rows(), grouping in arb_grouping()) {
        for row in aggregate(&rows, Mode::Split, grouping) {
            match row.amounts {
                GrossAmounts::Split { positive, negative } => {
                    prop_assert!(positive >= 0.0);
                    prop_assert!(negative <= 0.0);
                }
                GrossAmounts::Total { .. } => prop_assert!(false, "split mode produced a total"),
            }
        }
    }

    #[test]
    fn discount_is_subtracted_once(rows in arb_rows(), mode in arb_mode()) {
        let before = aggregate(&rows, mode, Grouping::Name);
        let mut after = before.clone();
        subtract_discount(&mut after);

        for (b, a) in before.iter().zip(&after) {
            let d = b.discount.abs();
            prop_assert_eq!(a.discount, d);
            match (b.amounts, a.amounts) {
                (GrossAmounts::Total { gross: g0 }, GrossAmounts::Total { gross: g1 }) => {
                    prop_assert_eq!(g1, g0 - d);
                }
                (
                    GrossAmounts::Split { positive: p0, negative: n0 },
                    GrossAmounts::Split { positive: p1, negative: n1 },
                ) => {
                    prop_assert_eq!(p1, p0 - d);
                    prop_assert_eq!(n1, n0 - d);
                }
                _ => prop_assert!(false, "amount shape changed"),
            }
        }
    }

    #[test]
    fn report_columns_match_mode(rows in arb_rows(), mode in arb_mode(), discount in any::<bool>()) {
        let options = TransformOptions::new(mode).with_discount(discount);
        let out = Transformer::new(options).run(&to_table(&rows)).unwrap();

        prop_assert_eq!(out.report.columns.as_slice(), mode.output_schema());
        for row in &out.report.rows {
            prop_assert_eq!(row.len(), mode.output_schema().len());
        }
        prop_assert_eq!(out.report.is_empty(), out.stats.retained_rows == 0);
        prop_assert_eq!(out.report.len(), out.stats.groups);
    }

    #[test]
    fn consolidation_is_idempotent(mut rows in arb_rows()) {
        consolidate_customer_names(&mut rows);
        let once = rows.clone();
        prop_assert_eq!(consolidate_customer_names(&mut rows), 0);
        prop_assert_eq!(rows, once);
    }

    #[test]
    fn final_consumer_names_disappear(mut rows in arb_rows()) {
        consolidate_customer_names(&mut rows);
        for row in &rows {
            let upper = row.customer_name.to_uppercase();
            let lead = ["CLIENTE", "CONSUMIDOR"].iter().filter_map(|w| upper.find(w)).min();
            let last_final = upper.rfind("FINAL");
            if matches!((lead, last_final), (Some(l), Some(f)) if l < f) {
                prop_assert_eq!(row.customer_name.as_str(), FINAL_CONSUMER);
            }
        }
    }

    #[test]
    fn one_line_per_key(rows in arb_rows(), grouping in arb_grouping()) {
        let aggregated = aggregate(&rows, Mode::Split, grouping);
        let mut keys: Vec<(String, String)> = aggregated
            .iter()
            .map(|a| match grouping {
                Grouping::Name => (a.customer_name.clone(), String::new()),
                Grouping::NameAndIdentification => (a.customer_name.clone(), a.identification.clone()),
            })
            .collect();
        let total = keys.len();
        keys.dedup();
        prop_assert_eq!(keys.len(), total);
    }
}
