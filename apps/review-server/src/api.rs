//! API handlers for the review server
//!
//! Provides REST endpoints for:
//! - Batch review of uploaded .docx files
//! - Checklist listing
//! - Health

use axum::{extract::State, Json};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use compliance_engine::{required_documents, ProcessChoice};
use review_core::ReviewFile;
use shared_types::{BatchSummary, DocumentType, Process, Severity};

use crate::error::ServerError;
use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "review-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct ChecklistResponse {
    pub success: bool,
    pub processes: Vec<ChecklistInfo>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct ChecklistInfo {
    pub process: Process,
    pub required_documents: Vec<DocumentType>,
}

/// Handler: GET /api/checklists
pub async fn handle_list_checklists() -> Json<ChecklistResponse> {
    let processes: Vec<ChecklistInfo> = Process::ALL
        .iter()
        .map(|process| ChecklistInfo {
            process: *process,
            required_documents: required_documents(*process).to_vec(),
        })
        .collect();

    let count = processes.len();

    Json(ChecklistResponse {
        success: true,
        processes,
        count,
    })
}

/// One uploaded file
#[derive(Deserialize)]
pub struct UploadedFile {
    pub filename: String,
    /// Raw .docx bytes, standard base64
    pub content_base64: String,
}

/// Review request body
#[derive(Deserialize)]
pub struct ReviewRequest {
    pub files: Vec<UploadedFile>,

    /// "auto" (default) or a process name such as "Company Incorporation"
    #[serde(default = "default_process")]
    pub process: String,
}

fn default_process() -> String {
    "auto".to_string()
}

#[derive(Serialize)]
pub struct ReviewedFile {
    pub filename: String,
    pub content_base64: String,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct IssueCounts {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl IssueCounts {
    fn from_summary(summary: &BatchSummary) -> Self {
        Self {
            total: summary.total_issues(),
            high: summary.count_by_severity(Severity::High),
            medium: summary.count_by_severity(Severity::Medium),
            low: summary.count_by_severity(Severity::Low),
        }
    }
}

#[derive(Serialize)]
pub struct ReviewResponse {
    pub success: bool,
    pub summary: BatchSummary,
    pub issue_counts: IssueCounts,
    pub reviewed_docs: Vec<ReviewedFile>,
}

/// Handler: POST /api/review
pub async fn handle_review(
    State(state): State<AppState>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>, ServerError> {
    info!(
        "Review request: files={}, process={}",
        req.files.len(),
        req.process
    );

    let choice = ProcessChoice::parse(&req.process).ok_or_else(|| {
        ServerError::InvalidRequest(format!(
            "Unknown process '{}'. Use 'auto' or one of: {}",
            req.process,
            Process::ALL
                .iter()
                .map(|p| p.name())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    })?;

    let files = req
        .files
        .into_iter()
        .map(|file| {
            let content = STANDARD.decode(file.content_base64.trim()).map_err(|e| {
                ServerError::InvalidRequest(format!(
                    "File '{}' is not valid base64: {}",
                    file.filename, e
                ))
            })?;
            debug!("Decoded {} ({} bytes)", file.filename, content.len());
            Ok(ReviewFile::new(file.filename, content))
        })
        .collect::<Result<Vec<_>, ServerError>>()?;

    let outcome = state.reviewer.review_batch(&files, choice).await;
    let issue_counts = IssueCounts::from_summary(&outcome.summary);

    info!(
        "Review complete: process={}, issues={}, missing={}",
        outcome.summary.process,
        issue_counts.total,
        outcome.summary.missing_documents.len()
    );

    let reviewed_docs = outcome
        .reviewed_docs
        .into_iter()
        .map(|doc| ReviewedFile {
            filename: doc.filename,
            content_base64: STANDARD.encode(doc.content),
        })
        .collect();

    Ok(Json(ReviewResponse {
        success: true,
        summary: outcome.summary,
        issue_counts,
        reviewed_docs,
    }))
}
