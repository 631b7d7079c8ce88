use lazy_static::lazy_static;
use regex::Regex;

use super::Finding;
use crate::patterns::ISO_DATE_PATTERN;

lazy_static! {
    static ref ISO_DATE: Regex = Regex::new(ISO_DATE_PATTERN).unwrap();
}

/// Informational flag for YYYY-MM-DD dates
pub fn check_date_format(text: &str) -> Option<Finding> {
    let first = ISO_DATE.find(text)?;

    Some(Finding {
        section: "Dates",
        location_hint: "Throughout document",
        message: format!(
            "Date(s) found in YYYY-MM-DD format (e.g. {}). Confirm ADGM preferred format.",
            first.as_str()
        ),
        suggestion: "Use consistent date formatting as required by filings.",
    })
}
