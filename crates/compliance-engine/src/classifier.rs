//! Document type classification by weighted keyword scoring
//!
//! Score per label = 3 × (keywords found in the text) + 2 × (keywords found
//! in the filename). The highest score wins; ties go to the label declared
//! first in [`DOC_TYPE_KEYWORDS`].

use shared_types::DocumentType;

const TEXT_WEIGHT: u32 = 3;
const FILENAME_WEIGHT: u32 = 2;

/// Keyword table per label, in tie-break order
pub const DOC_TYPE_KEYWORDS: &[(DocumentType, &[&str])] = &[
    (
        DocumentType::ArticlesOfAssociation,
        &["articles of association", "aoa", "articles"],
    ),
    (
        DocumentType::MemorandumOfAssociation,
        &["memorandum of association", "moa", "memorandum"],
    ),
    (
        DocumentType::BoardResolution,
        &["board resolution", "resolution of the board", "directors resolution"],
    ),
    (
        DocumentType::UboDeclarationForm,
        &["ubo", "ultimate beneficial owner", "ubo declaration", "beneficial owner"],
    ),
    (
        DocumentType::RegisterOfMembersAndDirectors,
        &[
            "register of members",
            "register of directors",
            "register of members and directors",
        ],
    ),
    (
        DocumentType::IncorporationApplicationForm,
        &["incorporation application", "application for incorporation"],
    ),
    (
        DocumentType::ShareholderResolutionTemplates,
        &["shareholder resolution", "shareholder resolution template"],
    ),
    (
        DocumentType::LicenseApplication,
        &[
            "license application",
            "licence application",
            "application for a licence",
            "application for a license",
        ],
    ),
    (DocumentType::BusinessPlan, &["business plan"]),
    (DocumentType::ProofOfAddress, &["proof of address", "utility bill"]),
    (
        DocumentType::EmploymentContract,
        &["employment contract", "contract of employment", "employment agreement"],
    ),
    (
        DocumentType::OfferLetter,
        &["offer letter", "letter of offer", "offer of employment"],
    ),
    (
        DocumentType::EmployeeHandbook,
        &["employee handbook", "staff handbook"],
    ),
];

/// Generic terms tried in order when no label scores at all
pub const FALLBACK_TERMS: &[(DocumentType, &[&str])] = &[
    (DocumentType::ArticlesOfAssociation, &["articles", "association"]),
    (DocumentType::MemorandumOfAssociation, &["memorandum", "moa"]),
    (DocumentType::BoardResolution, &["resolution", "resolved"]),
];

/// Score every label against the text and filename, in table order
pub fn score_labels(text: &str, filename: &str) -> Vec<(DocumentType, u32)> {
    let text_lower = text.to_lowercase();
    let filename_lower = filename.to_lowercase();

    DOC_TYPE_KEYWORDS
        .iter()
        .map(|(doc_type, keywords)| {
            let in_text = keywords.iter().filter(|kw| text_lower.contains(*kw)).count() as u32;
            let in_name = keywords
                .iter()
                .filter(|kw| filename_lower.contains(*kw))
                .count() as u32;
            (*doc_type, TEXT_WEIGHT * in_text + FILENAME_WEIGHT * in_name)
        })
        .collect()
}

/// Map document text (plus its filename) to a document type label
///
/// An empty body still scores on the filename, so an image-only upload
/// named after its type keeps its label.
pub fn classify(text: &str, filename: &str) -> DocumentType {
    let mut best: Option<(DocumentType, u32)> = None;
    for (doc_type, score) in score_labels(text, filename) {
        // Strictly greater keeps the first-declared label on ties
        if score > 0 && best.map_or(true, |(_, top)| score > top) {
            best = Some((doc_type, score));
        }
    }

    match best {
        Some((doc_type, _)) => doc_type,
        None => fallback_label(&text.to_lowercase()),
    }
}

fn fallback_label(text_lower: &str) -> DocumentType {
    FALLBACK_TERMS
        .iter()
        .find(|(_, terms)| terms.iter().any(|term| text_lower.contains(term)))
        .map(|(doc_type, _)| *doc_type)
        .unwrap_or(DocumentType::Unknown)
}
