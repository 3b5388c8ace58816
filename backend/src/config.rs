//! Runtime settings from the environment.
//!
//! | Variable                    | Default   | Values                 |
//! |-----------------------------|-----------|------------------------|
//! | `SALESREPORT_OUTPUT_DIR`    | `.`       | any directory          |
//! | `SALESREPORT_FORMAT`        | `xlsx`    | `xlsx`, `csv`, `json`  |
//! | `SALESREPORT_GROUP_BY`      | `name-id` | `name-id`, `name`      |
//! | `SALESREPORT_PORT`          | `3000`    | TCP port               |
//! | `SALESREPORT_MAX_UPLOAD_MB` | `50`      | upload body limit, MiB |
//!
//! CLI flags take precedence over these values.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::api::logs::log_warning;
use crate::export::ReportFormat;
use crate::models::Grouping;

pub const ENV_OUTPUT_DIR: &str = "SALESREPORT_OUTPUT_DIR";
pub const ENV_FORMAT: &str = "SALESREPORT_FORMAT";
pub const ENV_GROUP_BY: &str = "SALESREPORT_GROUP_BY";
pub const ENV_PORT: &str = "SALESREPORT_PORT";
pub const ENV_MAX_UPLOAD_MB: &str = "SALESREPORT_MAX_UPLOAD_MB";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3000;

/// Default request body limit for uploads, in MiB
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub format: ReportFormat,
    pub grouping: Grouping,
    pub port: u16,
    /// Request body limit of `POST /api/report`, in MiB
    pub max_upload_mb: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            format: ReportFormat::default(),
            grouping: Grouping::default(),
            port: DEFAULT_PORT,
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
        }
    }
}

impl Settings {
    /// Read settings from the process environment, loading `.env` first.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup. Invalid values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let output_dir = lookup(ENV_OUTPUT_DIR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        Self {
            output_dir,
            format: parse_or(ENV_FORMAT, lookup(ENV_FORMAT), defaults.format),
            grouping: parse_or(ENV_GROUP_BY, lookup(ENV_GROUP_BY), defaults.grouping),
            port: parse_or(ENV_PORT, lookup(ENV_PORT), defaults.port),
            max_upload_mb: parse_or(ENV_MAX_UPLOAD_MB, lookup(ENV_MAX_UPLOAD_MB), defaults.max_upload_mb)
                .max(1),
        }
    }

    /// Upload limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            log_warning(format!("Ignoring {}='{}', using '{}'", key, raw, default));
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(settings(&[]), Settings::default());
        assert_eq!(Settings::default().port, 3000);
        assert_eq!(Settings::default().grouping, Grouping::NameAndIdentification);
    }

    #[test]
    fn test_values_are_read() {
        let s = settings(&[
            (ENV_OUTPUT_DIR, "/tmp/reportes"),
            (ENV_FORMAT, "CSV"),
            (ENV_GROUP_BY, "name"),
            (ENV_PORT, "8080"),
            (ENV_MAX_UPLOAD_MB, "200"),
        ]);
        assert_eq!(s.output_dir, PathBuf::from("/tmp/reportes"));
        assert_eq!(s.format, ReportFormat::Csv);
        assert_eq!(s.grouping, Grouping::Name);
        assert_eq!(s.port, 8080);
        assert_eq!(s.max_upload_bytes(), 200 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let s = settings(&[
            (ENV_FORMAT, "pdf"),
            (ENV_PORT, "abc"),
            (ENV_OUTPUT_DIR, "  "),
            (ENV_MAX_UPLOAD_MB, "lots"),
        ]);
        assert_eq!(s, Settings::default());
        assert_eq!(settings(&[(ENV_MAX_UPLOAD_MB, "0")]).max_upload_mb, 1);
    }
}
