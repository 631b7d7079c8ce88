//! Text extraction for classification and red-flag detection

use crate::document::DocxDocument;

/// Cell delimiter used when a table row is flattened to one line
pub const CELL_DELIMITER: &str = " | ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Append flattened table rows after the paragraph text
    pub include_tables: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            include_tables: true,
        }
    }
}

/// A non-empty body paragraph and its index among all body paragraphs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedParagraph {
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Paragraph text joined by '\n', then table rows if requested
    pub text: String,
    /// Non-empty paragraphs only; indices still count the empty ones
    pub paragraphs: Vec<IndexedParagraph>,
    /// Number of body paragraphs, empty ones included
    pub paragraph_count: usize,
}

/// Flatten a document into review text
///
/// # Arguments
///
/// * `doc` - Parsed document
/// * `options` - Whether table rows are appended after the body paragraphs
///
/// # Returns
///
/// The newline-joined text (empty paragraphs kept as empty lines), the
/// non-empty paragraphs with their body indices, and the paragraph count.
pub fn extract(doc: &DocxDocument, options: ExtractOptions) -> Extraction {
    let all = doc.paragraphs();
    let paragraph_count = all.len();

    let mut lines = all.clone();
    if options.include_tables {
        lines.extend(table_rows(doc));
    }

    let paragraphs = all
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(index, text)| IndexedParagraph { index, text })
        .collect();

    Extraction {
        text: lines.join("\n"),
        paragraphs,
        paragraph_count,
    }
}

/// One line per table row: trimmed non-empty cells joined by [`CELL_DELIMITER`]
pub fn table_rows(doc: &DocxDocument) -> Vec<String> {
    doc.tables()
        .into_iter()
        .flatten()
        .filter_map(|row| {
            let cells: Vec<&str> = row
                .iter()
                .map(|cell| cell.trim())
                .filter(|cell| !cell.is_empty())
                .collect();
            if cells.is_empty() {
                None
            } else {
                Some(cells.join(CELL_DELIMITER))
            }
        })
        .collect()
}
