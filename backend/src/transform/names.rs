//! Customer name consolidation.
//!
//! Upstream systems record sales to anonymous buyers under many spellings
//! ("cliente final", "Consumidor Finall", "CLIENTES VARIOS CLIENTES VARIOS",
//! ...). Every one of them is rewritten to [`FINAL_CONSUMER`] so that they
//! aggregate into a single customer.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::InputRow;

/// Canonical name for anonymous buyers.
pub const FINAL_CONSUMER: &str = "CONSUMIDOR FINAL";

/// Names rewritten to [`FINAL_CONSUMER`] on exact (case-insensitive) match.
///
/// The repeated-token entries are literal garbage strings seen in exports.
pub const FINAL_CONSUMER_ALIASES: [&str; 6] = [
    "CLIENTE CLIENTE",
    "CLIENTE CONSUMIDOR CLIENTE CONSUMID CLIENTE CONSUMID",
    "CLIENTE CONSUMIDOR CLIENTE CONSUMID CLIENTE CONSUMID CLIENTE CONSUMID",
    "CLIENTE UNO",
    "CLIENTES VARIOS CLIENTES VARIOS",
    FINAL_CONSUMER,
];

const FINAL_CONSUMER_PATTERN: &str = r"(?i)(cliente|consumidor).*finall?";

/// The standard consolidation policy.
pub static FINAL_CONSUMER_RULE: Lazy<ConsolidationRule> = Lazy::new(ConsolidationRule::standard);

/// Regex plus exact-name allowlist, both case-insensitive.
#[derive(Debug, Clone)]
pub struct ConsolidationRule {
    pattern: Regex,
    aliases: Vec<String>,
    canonical: String,
}

impl ConsolidationRule {
    /// The final-consumer rule.
    pub fn standard() -> Self {
        Self {
            pattern: Regex::new(FINAL_CONSUMER_PATTERN).expect("Invalid final consumer pattern"),
            aliases: FINAL_CONSUMER_ALIASES.iter().map(|a| a.to_uppercase()).collect(),
            canonical: FINAL_CONSUMER.to_string(),
        }
    }

    /// Name that matching rows are rewritten to.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Whether `name` denotes the canonical customer.
    pub fn matches(&self, name: &str) -> bool {
        if self.pattern.is_match(name) {
            return true;
        }
        let upper = name.trim().to_uppercase();
        self.aliases.iter().any(|alias| *alias == upper)
    }

    /// Rewrite `customer_name` of matching rows. Returns how many rows changed.
    pub fn apply(&self, rows: &mut [InputRow]) -> usize {
        let mut changed = 0;
        for row in rows.iter_mut() {
            if row.customer_name != self.canonical && self.matches(&row.customer_name) {
                row.customer_name = self.canonical.clone();
                changed += 1;
            }
        }
        changed
    }
}

impl Default for ConsolidationRule {
    fn default() -> Self {
        Self::standard()
    }
}

/// Apply the standard rule to `rows`.
pub fn consolidate_customer_names(rows: &mut [InputRow]) -> usize {
    FINAL_CONSUMER_RULE.apply(rows)
}
