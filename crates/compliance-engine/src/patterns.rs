//! Phrase tables and matching helpers for the red-flag checks
//!
//! One table per check so each check's coverage can be tested and extended
//! on its own. All tables are lowercase.

use regex::Regex;

/// Courts and venues that are not the home jurisdiction
pub const WRONG_JURISDICTION_PHRASES: &[&str] = &[
    "uae federal courts",
    "uae federal court",
    "u.a.e. federal",
    "u.a.e federal",
    "uae federal",
    "federal courts",
    "dubai courts",
    "abu dhabi courts",
    "sharjah courts",
];

/// Phrases that indicate a signature block is present
pub const SIGNATURE_PHRASES: &[&str] = &[
    "signature",
    "signed by",
    "for and on behalf",
    "authorized signatory",
    "authorised signatory",
];

/// Vague, optional or non-binding wording (matched as whole words)
pub const AMBIGUOUS_PHRASES: &[&str] = &[
    "reasonable endeavours",
    "best efforts",
    "as may be agreed",
    "at the discretion of",
    "subject to applicable laws",
    "time is of the essence",
    "attempt to",
    "endeavour",
    "endeavor",
    "may",
    "might",
    "could",
];

/// Beneficial-ownership declaration wording (matched as whole words)
pub const OWNERSHIP_PHRASES: &[&str] = &[
    "ubo",
    "ultimate beneficial owner",
    "ultimate owner",
];

/// The home jurisdiction's own name and abbreviation (matched as whole words)
pub const HOME_JURISDICTION_PHRASES: &[&str] = &["adgm", "abu dhabi global market"];

/// ISO-style numeric dates: 4-digit year, 2-digit month, 2-digit day.
/// ASCII digits only; `\d` would also match Arabic-Indic numerals.
pub const ISO_DATE_PATTERN: &str = r"[0-9]{4}-[0-9]{2}-[0-9]{2}";

/// Return the first phrase of `table` contained in already-lowercased text
pub fn first_substring_match(text_lower: &str, table: &[&'static str]) -> Option<&'static str> {
    table.iter().copied().find(|phrase| text_lower.contains(phrase))
}

/// Compile one case-insensitive whole-word matcher per phrase
pub fn compile_word_matchers(table: &[&'static str]) -> Vec<(&'static str, Regex)> {
    table
        .iter()
        .map(|phrase| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(phrase));
            // Escaped literal phrases always compile
            (*phrase, Regex::new(&pattern).expect("escaped phrase is a valid regex"))
        })
        .collect()
}

/// Phrases whose matcher hits `text`, in table order
pub fn whole_word_matches(text: &str, matchers: &[(&'static str, Regex)]) -> Vec<&'static str> {
    matchers
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(phrase, _)| *phrase)
        .collect()
}
