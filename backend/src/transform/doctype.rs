//! Document type cleaning.
//!
//! Exports prefix the document type with its numeric code ("13 Cédula de
//! ciudadanía", "31NIT"). The report keeps only the label.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static LEADING_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\s*").expect("Invalid document code pattern"));

/// Strip a leading run of digits and the whitespace after it.
pub fn clean_document_type(doc_type: &str) -> Cow<'_, str> {
    LEADING_CODE.replace(doc_type, "")
}
