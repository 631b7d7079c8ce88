//! BM25 index over local reference texts, built with Tantivy in RAM

use std::fs;
use std::path::Path;

use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::*;
use tantivy::tokenizer::{
    Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, StopWordFilter, TextAnalyzer,
};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};

use crate::error::LookupError;

/// Used when the reference folder holds no readable documents
pub const PLACEHOLDER_SOURCE: &str = "placeholder";
pub const PLACEHOLDER_TEXT: &str = "ADGM Companies Regulations 2020: sample placeholder text.";

/// Lowercased words with English stop words removed
const REFERENCE_ANALYZER: &str = "reference_en";
const WRITER_HEAP_BYTES: usize = 50_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDocument {
    /// Path (or label) the text was loaded from
    pub source: String,
    pub text: String,
}

/// A retrieved reference and its BM25 score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredReference<'a> {
    pub document: &'a ReferenceDocument,
    pub score: f32,
}

/// Reference texts plus their keyword index
///
/// Built once when the lookup is constructed; searches share one reader.
pub struct ReferenceCorpus {
    documents: Vec<ReferenceDocument>,
    index: Index,
    reader: IndexReader,
    id_field: Field,
    content_field: Field,
}

impl ReferenceCorpus {
    /// Index `documents` in memory
    ///
    /// An empty list is replaced by a single placeholder reference so that
    /// lookups always have something to cite.
    ///
    /// # Arguments
    ///
    /// * `documents` - Reference texts; positions become stored ids
    ///
    /// # Errors
    ///
    /// Returns `LookupError::Corpus` if:
    /// - The English stop-word list is unavailable
    /// - The index writer cannot be created
    /// - A document cannot be added or the commit fails
    pub fn from_documents(mut documents: Vec<ReferenceDocument>) -> Result<Self, LookupError> {
        if documents.is_empty() {
            documents.push(ReferenceDocument {
                source: PLACEHOLDER_SOURCE.to_string(),
                text: PLACEHOLDER_TEXT.to_string(),
            });
        }

        let mut schema_builder = Schema::builder();
        let id_field = schema_builder.add_text_field("id", STRING | STORED);
        let content_indexing = TextFieldIndexing::default()
            .set_tokenizer(REFERENCE_ANALYZER)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions);
        let content_field = schema_builder.add_text_field(
            "content",
            TextOptions::default().set_indexing_options(content_indexing),
        );
        let schema = schema_builder.build();

        let index = Index::create_in_ram(schema);
        let stop_words = StopWordFilter::new(Language::English)
            .ok_or_else(|| LookupError::Corpus("English stop words unavailable".to_string()))?;
        index.tokenizers().register(
            REFERENCE_ANALYZER,
            TextAnalyzer::builder(SimpleTokenizer::default())
                .filter(RemoveLongFilter::limit(40))
                .filter(LowerCaser)
                .filter(stop_words)
                .build(),
        );

        let mut writer: IndexWriter = index.writer(WRITER_HEAP_BYTES)?;
        for (position, document) in documents.iter().enumerate() {
            let mut doc = TantivyDocument::new();
            doc.add_text(id_field, position.to_string());
            doc.add_text(content_field, &document.text);
            writer.add_document(doc)?;
        }
        writer.commit()?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        tracing::debug!(documents = documents.len(), "Built reference index");

        Ok(Self {
            documents,
            index,
            reader,
            id_field,
            content_field,
        })
    }

    /// Load and index every `.txt` and `.md` file under `dir`, recursively
    ///
    /// Files are ordered by path. A missing folder is not an error: the
    /// corpus falls back to the placeholder reference.
    ///
    /// # Arguments
    ///
    /// * `dir` - Reference folder
    ///
    /// # Errors
    ///
    /// Returns `LookupError::Corpus` if an existing folder cannot be listed
    /// or the index cannot be built. Unreadable files are skipped.
    pub fn load(dir: &Path) -> Result<Self, LookupError> {
        let mut documents = Vec::new();
        if dir.exists() {
            collect_files(dir, &mut documents)?;
        } else {
            tracing::warn!(path = %dir.display(), "Reference folder not found, using placeholder");
        }
        documents.sort_by(|a, b| a.source.cmp(&b.source));
        Self::from_documents(documents)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[ReferenceDocument] {
        &self.documents
    }

    /// Rank references against a free-text question
    ///
    /// The question is parsed leniently, so punctuation and stray query
    /// syntax in generated questions never cause an error. Only references
    /// sharing at least one indexed term with the question are returned.
    ///
    /// # Arguments
    ///
    /// * `query` - Natural-language question
    /// * `top_k` - Maximum number of references to return
    ///
    /// # Returns
    ///
    /// Matching references sorted by descending BM25 score. A search
    /// failure is logged and yields no references.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<ScoredReference<'_>> {
        if top_k == 0 || query.trim().is_empty() {
            return Vec::new();
        }
        match self.try_search(query, top_k) {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(error = %e, "Reference search failed");
                Vec::new()
            }
        }
    }

    fn try_search(&self, query: &str, top_k: usize) -> tantivy::Result<Vec<ScoredReference<'_>>> {
        let searcher = self.reader.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.content_field]);
        let (query, _ignored) = parser.parse_query_lenient(query);

        let top_docs = searcher.search(&query, &TopDocs::with_limit(top_k))?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            let position = doc
                .get_first(self.id_field)
                .and_then(|v| v.as_str())
                .and_then(|id| id.parse::<usize>().ok());
            if let Some(document) = position.and_then(|p| self.documents.get(p)) {
                results.push(ScoredReference { document, score });
            }
        }
        Ok(results)
    }
}

fn collect_files(dir: &Path, out: &mut Vec<ReferenceDocument>) -> Result<(), LookupError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| LookupError::Corpus(format!("{}: {}", dir.display(), e)))?;

    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };

        if path.is_dir() {
            collect_files(&path, out)?;
            continue;
        }

        let is_reference = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("txt") || ext.eq_ignore_ascii_case("md"))
            .unwrap_or(false);
        if !is_reference {
            continue;
        }

        match fs::read(&path) {
            Ok(bytes) => out.push(ReferenceDocument {
                source: path.display().to_string(),
                text: String::from_utf8_lossy(&bytes).into_owned(),
            }),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping reference file"),
        }
    }
    Ok(())
}
