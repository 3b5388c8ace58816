//! Required-column validation for input tables.
//!
//! Runs once, before any mode-specific processing. Every column in
//! [`REQUIRED_COLUMNS`] must be present by exact, case-sensitive name.
//!
//! # Example
//!
//! ```rust,ignore
//! use salesreport::validation::validate_columns;
//!
//! let headers = vec!["UNIDADES".to_string()];
//! let err = validate_columns(&headers).unwrap_err();
//! println!("{}", err); // Missing required columns in input: ["NOMBRECLIENTE", ...]
//! ```

use crate::error::{TransformError, TransformResult};
use crate::models::REQUIRED_COLUMNS;

/// Required columns absent from `headers`, in required-column order.
pub fn missing_columns<S: AsRef<str>>(headers: &[S]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h.as_ref() == **required))
        .map(|c| c.to_string())
        .collect()
}

/// Fail with [`TransformError::MissingColumns`] if any required column is absent.
pub fn validate_columns<S: AsRef<str>>(headers: &[S]) -> TransformResult<()> {
    let missing = missing_columns(headers);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(TransformError::MissingColumns { missing })
    }
}
