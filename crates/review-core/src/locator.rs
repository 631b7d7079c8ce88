//! Location resolver: which paragraph an issue's comment is anchored to

use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{Issue, IssueCategory};

lazy_static! {
    /// Clause numbers such as "12.3" or "Clause 4.1.2"
    static ref CLAUSE_NUMBER: Regex = Regex::new(r"(?i)(?:clause\s*)?(\d+(?:\.\d+)+)").unwrap();
}

pub const JURISDICTION_KEYWORDS: &[&str] = &["jurisdiction", "court", "adgm"];
pub const SIGNATURE_KEYWORDS: &[&str] = &[
    "signature",
    "signed by",
    "for and on behalf",
    "authorized signatory",
];
pub const OWNERSHIP_KEYWORDS: &[&str] = &["ubo", "ultimate beneficial owner", "ownership"];

/// Search keywords for an issue category, in priority order
pub fn keywords_for(category: IssueCategory) -> &'static [&'static str] {
    match category {
        IssueCategory::JurisdictionMismatch | IssueCategory::MissingJurisdictionClause => {
            JURISDICTION_KEYWORDS
        }
        IssueCategory::MissingSignature => SIGNATURE_KEYWORDS,
        IssueCategory::MissingOwnershipDeclaration => OWNERSHIP_KEYWORDS,
        IssueCategory::AmbiguousLanguage
        | IssueCategory::DateFormat
        | IssueCategory::ProcessingFailure => &[],
    }
}

/// Index of the first non-empty paragraph carrying a clause number
pub fn first_clause_paragraph(paragraphs: &[String]) -> Option<usize> {
    paragraphs
        .iter()
        .position(|p| !p.trim().is_empty() && CLAUSE_NUMBER.is_match(p))
}

/// Resolve the paragraph for `issue` among all body paragraphs.
///
/// Keywords are tried one at a time, each scanning from the first paragraph;
/// then the first clause-numbered paragraph; then paragraph 0. `None` only
/// when the document has no paragraphs.
pub fn locate(issue: &Issue, paragraphs: &[String]) -> Option<usize> {
    let lowered: Vec<String> = paragraphs.iter().map(|p| p.to_lowercase()).collect();

    keywords_for(issue.category)
        .iter()
        .find_map(|keyword| lowered.iter().position(|p| p.contains(keyword)))
        .or_else(|| first_clause_paragraph(paragraphs))
        .or(if paragraphs.is_empty() { None } else { Some(0) })
}
