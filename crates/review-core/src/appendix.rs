//! Plain-text review section appended after the document body

use chrono::{DateTime, Utc};
use docx_core::DocxDocument;
use shared_types::Issue;

pub const APPENDIX_HEADING: &str = "ADGM Compliance Review Comments";
pub const NO_ISSUES_LINE: &str =
    "No compliance issues found. Document appears to be compliant with ADGM requirements.";

/// Lines of the review section, one paragraph each
pub fn appendix_lines(issues: &[Issue], generated_at: DateTime<Utc>) -> Vec<String> {
    let mut lines = vec![
        APPENDIX_HEADING.to_string(),
        format!("Generated on: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        String::new(),
    ];

    if issues.is_empty() {
        lines.push(NO_ISSUES_LINE.to_string());
        return lines;
    }

    let mut sorted: Vec<&Issue> = issues.iter().collect();
    sorted.sort_by_key(|issue| issue.severity.rank());

    for (n, issue) in sorted.iter().enumerate() {
        lines.push(format!("{}. {} Priority Issue", n + 1, issue.severity));
        lines.push(format!("Document: {}", issue.document));
        lines.push(format!("Location: {}", issue.location_hint));
        lines.push(format!("Issue: {}", issue.issue));
        lines.push(format!("Recommendation: {}", issue.suggestion));
        lines.push(String::new());
    }
    lines
}

/// Start a new page and write the review section; returns the heading's index
pub fn append_review_appendix(
    doc: &mut DocxDocument,
    issues: &[Issue],
    generated_at: DateTime<Utc>,
) -> usize {
    doc.add_page_break();
    let mut lines = appendix_lines(issues, generated_at).into_iter();
    let heading = doc.add_paragraph(&lines.next().unwrap_or_default());
    for line in lines {
        doc.add_paragraph(&line);
    }
    heading
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use shared_types::{IssueCategory, Severity};

    fn issue(severity: Severity, text: &str) -> Issue {
        Issue {
            document: "Articles of Association".into(),
            category: IssueCategory::AmbiguousLanguage,
            section: "Language".into(),
            location_hint: "Throughout document".into(),
            issue: text.into(),
            severity,
            suggestion: "Fix it".into(),
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn test_no_issues() {
        assert_eq!(
            appendix_lines(&[], at()),
            vec![
                APPENDIX_HEADING.to_string(),
                "Generated on: 2026-01-02 03:04:05 UTC".to_string(),
                String::new(),
                NO_ISSUES_LINE.to_string(),
            ]
        );
    }

    #[test]
    fn test_sorted_high_to_low_keeping_detection_order() {
        let issues = [
            issue(Severity::Low, "low one"),
            issue(Severity::High, "high one"),
            issue(Severity::Medium, "medium"),
            issue(Severity::High, "high two"),
        ];
        let lines = appendix_lines(&issues, at());
        let headers: Vec<&String> = lines.iter().filter(|l| l.contains("Priority Issue")).collect();
        assert_eq!(
            headers,
            vec![
                "1. High Priority Issue",
                "2. High Priority Issue",
                "3. Medium Priority Issue",
                "4. Low Priority Issue",
            ]
        );
        let descriptions: Vec<&String> = lines.iter().filter(|l| l.starts_with("Issue: ")).collect();
        assert_eq!(descriptions[0], "Issue: high one");
        assert_eq!(descriptions[1], "Issue: high two");
    }

    #[test]
    fn test_appended_after_body_on_new_page() {
        let mut doc = DocxDocument::new_blank().unwrap();
        doc.add_paragraph("Body");
        let heading = append_review_appendix(&mut doc, &[issue(Severity::Low, "x")], at());
        assert_eq!(heading, 2);
        assert_eq!(doc.paragraph_text(1).as_deref(), Some("\n"));
        assert_eq!(doc.paragraph_text(2).as_deref(), Some(APPENDIX_HEADING));
        assert_eq!(doc.paragraph_text(0).as_deref(), Some("Body"));
    }
}
