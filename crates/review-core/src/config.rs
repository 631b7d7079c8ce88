//! Review settings
//!
//! Defaults match the hosted reviewer; every field can be overridden from the
//! environment or by the server's command-line arguments.

use std::str::FromStr;

use crate::error::ConfigError;

pub const DEFAULT_AUTHOR: &str = "ADGM-Agent";
pub const DEFAULT_INITIALS: &str = "AA";
pub const DEFAULT_MAX_ENRICHED_ISSUES: usize = 6;
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 20_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewConfig {
    /// Author recorded on every inserted comment
    pub author: String,
    pub initials: String,
    /// Upper bound on knowledge lookups per document
    pub max_enriched_issues: usize,
    pub lookup_timeout_ms: u64,
    /// Append the "ADGM Compliance Review Comments" section to each document
    pub append_review_summary: bool,
    /// Scan flattened table rows as well as paragraphs
    pub include_tables: bool,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            author: DEFAULT_AUTHOR.to_string(),
            initials: DEFAULT_INITIALS.to_string(),
            max_enriched_issues: DEFAULT_MAX_ENRICHED_ISSUES,
            lookup_timeout_ms: DEFAULT_LOOKUP_TIMEOUT_MS,
            append_review_summary: false,
            include_tables: true,
        }
    }
}

impl ReviewConfig {
    /// Load configuration from environment variables
    ///
    /// Expected variables (all optional):
    /// - REVIEW_AUTHOR: comment author name
    /// - REVIEW_INITIALS: comment author initials
    /// - REVIEW_MAX_LOOKUPS: knowledge lookups per document
    /// - REVIEW_LOOKUP_TIMEOUT_MS: per-lookup timeout
    /// - REVIEW_APPEND_SUMMARY: "true"/"1" to append the review section
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ReviewConfig::from_env`] with an explicit variable source
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            author: get("REVIEW_AUTHOR")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.author),
            initials: get("REVIEW_INITIALS")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.initials),
            max_enriched_issues: parse_var(&get, "REVIEW_MAX_LOOKUPS")?
                .unwrap_or(defaults.max_enriched_issues),
            lookup_timeout_ms: parse_var(&get, "REVIEW_LOOKUP_TIMEOUT_MS")?
                .unwrap_or(defaults.lookup_timeout_ms),
            append_review_summary: match get("REVIEW_APPEND_SUMMARY") {
                Some(value) => parse_flag("REVIEW_APPEND_SUMMARY", &value)?,
                None => defaults.append_review_summary,
            },
            include_tables: defaults.include_tables,
        })
    }
}

fn parse_var<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match get(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
