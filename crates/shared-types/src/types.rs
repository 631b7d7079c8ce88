use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }

    /// Sort key for presenting issues most-severe first
    pub fn rank(&self) -> u8 {
        match self {
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of document labels the classifier can produce.
///
/// Declaration order is significant: it breaks classifier score ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DocumentType {
    #[serde(rename = "Articles of Association")]
    ArticlesOfAssociation,
    #[serde(rename = "Memorandum of Association")]
    MemorandumOfAssociation,
    #[serde(rename = "Board Resolution")]
    BoardResolution,
    #[serde(rename = "UBO Declaration Form")]
    UboDeclarationForm,
    #[serde(rename = "Register of Members and Directors")]
    RegisterOfMembersAndDirectors,
    #[serde(rename = "Incorporation Application Form")]
    IncorporationApplicationForm,
    #[serde(rename = "Shareholder Resolution Templates")]
    ShareholderResolutionTemplates,
    #[serde(rename = "License Application")]
    LicenseApplication,
    #[serde(rename = "Business Plan")]
    BusinessPlan,
    #[serde(rename = "Proof of Address")]
    ProofOfAddress,
    #[serde(rename = "Employment Contract")]
    EmploymentContract,
    #[serde(rename = "Offer Letter")]
    OfferLetter,
    #[serde(rename = "Employee Handbook")]
    EmployeeHandbook,
    Unknown,
}

impl DocumentType {
    /// Every label in declaration order, `Unknown` last
    pub const ALL: [DocumentType; 14] = [
        DocumentType::ArticlesOfAssociation,
        DocumentType::MemorandumOfAssociation,
        DocumentType::BoardResolution,
        DocumentType::UboDeclarationForm,
        DocumentType::RegisterOfMembersAndDirectors,
        DocumentType::IncorporationApplicationForm,
        DocumentType::ShareholderResolutionTemplates,
        DocumentType::LicenseApplication,
        DocumentType::BusinessPlan,
        DocumentType::ProofOfAddress,
        DocumentType::EmploymentContract,
        DocumentType::OfferLetter,
        DocumentType::EmployeeHandbook,
        DocumentType::Unknown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DocumentType::ArticlesOfAssociation => "Articles of Association",
            DocumentType::MemorandumOfAssociation => "Memorandum of Association",
            DocumentType::BoardResolution => "Board Resolution",
            DocumentType::UboDeclarationForm => "UBO Declaration Form",
            DocumentType::RegisterOfMembersAndDirectors => "Register of Members and Directors",
            DocumentType::IncorporationApplicationForm => "Incorporation Application Form",
            DocumentType::ShareholderResolutionTemplates => "Shareholder Resolution Templates",
            DocumentType::LicenseApplication => "License Application",
            DocumentType::BusinessPlan => "Business Plan",
            DocumentType::ProofOfAddress => "Proof of Address",
            DocumentType::EmploymentContract => "Employment Contract",
            DocumentType::OfferLetter => "Offer Letter",
            DocumentType::EmployeeHandbook => "Employee Handbook",
            DocumentType::Unknown => "Unknown",
        }
    }

    /// Look up a label by its display name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|dt| dt.name().eq_ignore_ascii_case(wanted))
    }

    /// Articles, Memorandum, or any label whose name mentions incorporation
    pub fn is_incorporation_family(&self) -> bool {
        let name = self.name().to_lowercase();
        name.starts_with("articles")
            || name.starts_with("memorandum")
            || name.contains("incorporation")
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Regulatory processes that carry a required-document checklist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Process {
    #[serde(rename = "Company Incorporation")]
    CompanyIncorporation,
    #[serde(rename = "Licensing")]
    Licensing,
    #[serde(rename = "Employment Contracts")]
    EmploymentContracts,
}

impl Process {
    /// Priority order used when inferring a process from observed labels
    pub const ALL: [Process; 3] = [
        Process::CompanyIncorporation,
        Process::Licensing,
        Process::EmploymentContracts,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Process::CompanyIncorporation => "Company Incorporation",
            Process::Licensing => "Licensing",
            Process::EmploymentContracts => "Employment Contracts",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which compliance check produced an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    JurisdictionMismatch,
    MissingSignature,
    AmbiguousLanguage,
    MissingOwnershipDeclaration,
    MissingJurisdictionClause,
    DateFormat,
    ProcessingFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Issue {
    pub document: String, // Label (or filename for processing failures)
    pub category: IssueCategory,
    pub section: String,
    pub location_hint: String,
    pub issue: String,
    pub severity: Severity,
    pub suggestion: String,
}

/// An issue after the orchestrator tried to anchor it in the document
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnnotatedIssue {
    #[serde(flatten)]
    pub issue: Issue,
    pub attached_to_paragraph_index: Option<usize>,
    pub attached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>, // Knowledge-lookup enrichment
}

impl AnnotatedIssue {
    pub fn unattached(issue: Issue) -> Self {
        Self {
            issue,
            attached_to_paragraph_index: None,
            attached: false,
            guidance: None,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DocumentReport {
    pub filename: String,
    pub document_type: DocumentType,
    pub issues_found: Vec<AnnotatedIssue>,
    pub num_paragraphs: usize,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BatchSummary {
    pub process: Process,
    pub documents_uploaded: usize,
    pub required_documents: usize,
    pub missing_documents: Vec<DocumentType>,
    pub individual_reports: Vec<DocumentReport>,
}

impl BatchSummary {
    /// Total issues across every document in the batch
    pub fn total_issues(&self) -> usize {
        self.individual_reports
            .iter()
            .map(|r| r.issues_found.len())
            .sum()
    }

    /// Issue tally for one severity across the batch
    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.individual_reports
            .iter()
            .flat_map(|r| r.issues_found.iter())
            .filter(|i| i.issue.severity == severity)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_type_serializes_as_display_name() {
        let json = serde_json::to_string(&DocumentType::UboDeclarationForm).unwrap();
        assert_eq!(json, "\"UBO Declaration Form\"");
    }

    #[test]
    fn test_document_type_from_name_roundtrip() {
        for dt in DocumentType::ALL {
            assert_eq!(DocumentType::from_name(dt.name()), Some(dt));
        }
        assert_eq!(
            DocumentType::from_name("articles of association"),
            Some(DocumentType::ArticlesOfAssociation)
        );
        assert_eq!(DocumentType::from_name("Lease"), None);
    }

    #[test]
    fn test_incorporation_family() {
        assert!(DocumentType::ArticlesOfAssociation.is_incorporation_family());
        assert!(DocumentType::MemorandumOfAssociation.is_incorporation_family());
        assert!(DocumentType::IncorporationApplicationForm.is_incorporation_family());
        assert!(!DocumentType::BoardResolution.is_incorporation_family());
        assert!(!DocumentType::UboDeclarationForm.is_incorporation_family());
        assert!(!DocumentType::Unknown.is_incorporation_family());
    }

    #[test]
    fn test_annotated_issue_flattens_issue_fields() {
        let issue = Issue {
            document: "Articles of Association".to_string(),
            category: IssueCategory::DateFormat,
            section: "Dates".to_string(),
            location_hint: "Throughout document".to_string(),
            issue: "Date found".to_string(),
            severity: Severity::Low,
            suggestion: "Use one format".to_string(),
        };
        let value = serde_json::to_value(AnnotatedIssue::unattached(issue)).unwrap();
        assert_eq!(value["severity"], "Low");
        assert_eq!(value["category"], "date_format");
        assert_eq!(value["attached"], false);
        assert!(value["attached_to_paragraph_index"].is_null());
        assert!(value.get("guidance").is_none());
    }

    #[test]
    fn test_severity_rank_orders_high_first() {
        let mut severities = vec![Severity::Low, Severity::High, Severity::Medium];
        severities.sort_by_key(|s| s.rank());
        assert_eq!(severities, vec![Severity::High, Severity::Medium, Severity::Low]);
    }
}
