//! Transformation module.
//!
//! This module turns a sales table into a per-customer report:
//! - Names: final consumer consolidation
//! - Doctype: document type code stripping
//! - Grouper: mode-aware aggregation
//! - Discount: post-aggregation discount subtraction
//! - Projector: output column selection
//! - Pipeline: the transformer and the end-to-end report run

pub mod discount;
pub mod doctype;
pub mod grouper;
pub mod names;
pub mod pipeline;
pub mod projector;

pub use discount::subtract_discount;
pub use doctype::clean_document_type;
pub use grouper::{aggregate, split_gross_amount};
pub use names::{consolidate_customer_names, ConsolidationRule, FINAL_CONSUMER, FINAL_CONSUMER_RULE};
pub use pipeline::*;
pub use projector::project;
