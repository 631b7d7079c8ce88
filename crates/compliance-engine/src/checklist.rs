//! Required-document checklists per regulatory process

use shared_types::{DocumentType, Process};

/// Which checklist a batch is measured against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProcessChoice {
    /// Infer the process from the labels observed in the batch
    #[default]
    Auto,
    Specific(Process),
}

impl ProcessChoice {
    /// Parse "auto", "Auto-detect" or a process name (case-insensitive)
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("auto") || trimmed.eq_ignore_ascii_case("auto-detect") {
            return Some(ProcessChoice::Auto);
        }
        Process::from_name(trimmed).map(ProcessChoice::Specific)
    }

    pub fn resolve(&self, observed: &[DocumentType]) -> Process {
        match self {
            ProcessChoice::Auto => infer_process(observed),
            ProcessChoice::Specific(process) => *process,
        }
    }
}

/// Ordered required labels for a process
pub fn required_documents(process: Process) -> &'static [DocumentType] {
    match process {
        Process::CompanyIncorporation => &[
            DocumentType::ArticlesOfAssociation,
            DocumentType::MemorandumOfAssociation,
            DocumentType::IncorporationApplicationForm,
            DocumentType::UboDeclarationForm,
            DocumentType::RegisterOfMembersAndDirectors,
        ],
        Process::Licensing => &[
            DocumentType::LicenseApplication,
            DocumentType::BusinessPlan,
            DocumentType::ProofOfAddress,
        ],
        Process::EmploymentContracts => &[
            DocumentType::EmploymentContract,
            DocumentType::OfferLetter,
            DocumentType::EmployeeHandbook,
        ],
    }
}

/// First process (in priority order) whose checklist shares a label with
/// the observed set; Company Incorporation when nothing overlaps.
pub fn infer_process(observed: &[DocumentType]) -> Process {
    Process::ALL
        .iter()
        .copied()
        .find(|process| {
            required_documents(*process)
                .iter()
                .any(|required| observed.contains(required))
        })
        .unwrap_or(Process::CompanyIncorporation)
}

/// Required labels not observed, in checklist order
pub fn missing_documents(process: Process, observed: &[DocumentType]) -> Vec<DocumentType> {
    required_documents(process)
        .iter()
        .copied()
        .filter(|required| !observed.contains(required))
        .collect()
}
