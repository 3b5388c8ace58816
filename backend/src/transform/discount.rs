//! Post-aggregation discount subtraction.

use crate::models::{AggregatedRow, GrossAmounts};

/// Subtract each group's absolute discount from its amount column(s).
///
/// In split mode the same discount is subtracted from both the positive and
/// the negative total. The discount column keeps the absolute value.
pub fn subtract_discount(rows: &mut [AggregatedRow]) {
    for row in rows.iter_mut() {
        let discount = row.discount.abs();
        row.discount = discount;
        row.amounts = match row.amounts {
            GrossAmounts::Total { gross } => GrossAmounts::Total {
                gross: gross - discount,
            },
            GrossAmounts::Split { positive, negative } => GrossAmounts::Split {
                positive: positive - discount,
                negative: negative - discount,
            },
        };
    }
}
