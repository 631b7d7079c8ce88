//! Native Word comments anchored to body paragraphs

use chrono::{DateTime, Utc};

use crate::document::{DocxDocument, WordNames, XmlPart, WORDPROCESSING_NS};
use crate::error::{AnnotationError, DocxError};
use crate::package::{self, COMMENTS_CONTENT_TYPE, COMMENTS_REL_TYPE, RELS_CONTENT_TYPE};
use crate::xml::{XmlDocument, XmlElement, XmlNode};

const DEFAULT_COMMENTS_PART: &str = "word/comments.xml";

/// A comment definition from the comments part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: u32,
    pub author: String,
    pub initials: String,
    pub date: Option<String>,
    pub text: String,
}

/// Comment markers found directly inside one paragraph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentAnchors {
    pub range_starts: Vec<u32>,
    pub range_ends: Vec<u32>,
    pub references: Vec<u32>,
}

impl CommentAnchors {
    /// Ids with a start marker, an end marker and a reference run
    pub fn complete(&self) -> Vec<u32> {
        self.range_starts
            .iter()
            .copied()
            .filter(|id| self.range_ends.contains(id) && self.references.contains(id))
            .collect()
    }
}

/// Who a new comment is attributed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentAuthor {
    pub name: String,
    pub initials: String,
}

impl CommentAuthor {
    pub fn new(name: impl Into<String>, initials: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initials: initials.into(),
        }
    }
}

impl DocxDocument {
    /// Attach `body` as a Word comment spanning paragraph `paragraph_index`.
    ///
    /// Creates the comments part (with its relationship and content type)
    /// when the package has none. The new id is one more than the largest
    /// existing id, or 0 for the first comment. Range markers wrap the
    /// paragraph's runs and a reference run is appended after them; a
    /// paragraph without runs gets one synthesized first.
    ///
    /// # Arguments
    ///
    /// * `paragraph_index` - Body paragraph index, as in [`DocxDocument::paragraphs`]
    /// * `body` - Comment text; each line becomes its own comment paragraph
    /// * `author` - Name and initials recorded on the comment
    ///
    /// # Returns
    ///
    /// The id of the new comment.
    ///
    /// # Errors
    ///
    /// - `AnnotationError::ParagraphOutOfRange` if the index is past the body
    /// - `AnnotationError::InvalidCommentId` if an existing id is not numeric
    /// - `AnnotationError::MalformedMarkup` if the comments part cannot be read
    ///
    /// No paragraph is modified when an error is returned.
    pub fn attach_comment(
        &mut self,
        paragraph_index: usize,
        body: &str,
        author: &CommentAuthor,
    ) -> Result<u32, AnnotationError> {
        self.attach_comment_at(paragraph_index, body, author, Utc::now())
    }

    /// [`DocxDocument::attach_comment`] with an explicit comment date
    pub fn attach_comment_at(
        &mut self,
        paragraph_index: usize,
        body: &str,
        author: &CommentAuthor,
        date: DateTime<Utc>,
    ) -> Result<u32, AnnotationError> {
        // Validate everything before touching any part
        let slot = self.paragraph_slot(paragraph_index).ok_or_else(|| {
            AnnotationError::ParagraphOutOfRange {
                index: paragraph_index,
                count: self.paragraph_count(),
            }
        })?;
        self.load_comments_part()?;
        let comments = self
            .comments
            .as_mut()
            .ok_or_else(|| AnnotationError::MalformedMarkup("comments part unavailable".into()))?;
        let comment_names = WordNames::for_root(&comments.xml.root);
        let id = next_comment_id(&comments.xml.root, &comment_names)?;

        let definition = comment_definition(&comment_names, id, body, author, date);
        comments.xml.root.children.push(XmlNode::Element(definition));
        comments.modified = true;

        let names = self.names.clone();
        let paragraph = match self.body.children.get_mut(slot) {
            Some(XmlNode::Element(el)) => el,
            _ => {
                return Err(AnnotationError::MalformedMarkup(format!(
                    "paragraph {} is not an element",
                    paragraph_index
                )))
            }
        };
        anchor_paragraph(&names, paragraph, id);
        self.document_modified = true;

        tracing::debug!(comment_id = id, paragraph = paragraph_index, "Attached comment");
        Ok(id)
    }

    /// Append a visible "[COMMENT] ..." paragraph when anchoring is impossible
    pub fn add_fallback_note(&mut self, body: &str) -> usize {
        self.add_paragraph(&format!("[COMMENT] {}", body))
    }

    /// Existing comment definitions, in document order
    ///
    /// # Errors
    ///
    /// Returns `DocxError::XmlError` if the comments part is not well-formed
    /// or a definition has a missing or non-numeric id.
    pub fn comments(&self) -> Result<Vec<Comment>, DocxError> {
        let owned;
        let part = match &self.comments {
            Some(part) => &part.xml,
            None => match self.comments_part_name() {
                Some(name) => match self.package.parse_part(&name)? {
                    Some(xml) => {
                        owned = xml;
                        &owned
                    }
                    None => return Ok(Vec::new()),
                },
                None => return Ok(Vec::new()),
            },
        };

        let names = WordNames::for_root(&part.root);
        let attr = |el: &XmlElement, local: &str| {
            el.attribute(&names.q(local))
                .map(|v| v.into_owned())
                .unwrap_or_default()
        };

        part.root
            .child_elements()
            .filter(|el| names.is(el, "comment"))
            .map(|el| -> Result<Comment, DocxError> {
                let raw_id = attr(el, "id");
                let id: u32 = raw_id
                    .parse()
                    .map_err(|_| DocxError::XmlError(format!("invalid comment id {:?}", raw_id)))?;
                let text = el
                    .child_elements()
                    .filter(|p| names.is(p, "p"))
                    .map(|p| names.paragraph_text(p))
                    .collect::<Vec<_>>()
                    .join("\n");
                Ok(Comment {
                    id,
                    author: attr(el, "author"),
                    initials: attr(el, "initials"),
                    date: el.attribute(&names.q("date")).map(|v| v.into_owned()),
                    text,
                })
            })
            .collect()
    }

    /// Comment markers that are direct children of paragraph `index`
    pub fn comment_anchors(&self, index: usize) -> Option<CommentAnchors> {
        let slot = self.paragraph_slot(index)?;
        let paragraph = match self.body.children.get(slot)? {
            XmlNode::Element(el) => el,
            _ => return None,
        };

        let names = &self.names;
        let id_of = |el: &XmlElement| {
            el.attribute(&names.q("id"))
                .and_then(|v| v.parse::<u32>().ok())
        };

        let mut anchors = CommentAnchors::default();
        for child in paragraph.child_elements() {
            if names.is(child, "commentRangeStart") {
                anchors.range_starts.extend(id_of(child));
            } else if names.is(child, "commentRangeEnd") {
                anchors.range_ends.extend(id_of(child));
            } else if names.is(child, "r") {
                for reference in child
                    .child_elements()
                    .filter(|el| names.is(el, "commentReference"))
                {
                    anchors.references.extend(id_of(reference));
                }
            }
        }
        Some(anchors)
    }

    fn comments_part_name(&self) -> Option<String> {
        package::find_relationship(&self.relationships.xml.root, |t| t == COMMENTS_REL_TYPE)
            .and_then(|rel| rel.attribute("Target").map(|t| t.into_owned()))
            .map(|target| package::resolve_target(&self.main_part, &target))
    }

    /// Make `self.comments` available, creating the part if needed
    fn load_comments_part(&mut self) -> Result<(), AnnotationError> {
        if self.comments.is_some() {
            return Ok(());
        }

        if let Some(name) = self.comments_part_name() {
            let existing = self
                .package
                .parse_part(&name)
                .map_err(|e| AnnotationError::MalformedMarkup(format!("{}: {}", name, e)))?;
            let (xml, modified) = match existing {
                Some(xml) => (xml, false),
                // Dangling relationship: supply the part it points at
                None => (empty_comments(), true),
            };
            self.comments = Some(XmlPart {
                name,
                xml,
                modified,
            });
            return Ok(());
        }

        let name = self.unused_comments_part_name();
        let dir = self
            .main_part
            .rsplit_once('/')
            .map(|(dir, _)| format!("{}/", dir))
            .unwrap_or_default();
        let target = name.strip_prefix(&dir).unwrap_or(&name).to_string();

        package::add_relationship(&mut self.relationships.xml.root, COMMENTS_REL_TYPE, &target);
        self.relationships.modified = true;

        package::ensure_override(&mut self.content_types.xml.root, &name, COMMENTS_CONTENT_TYPE);
        package::ensure_default(&mut self.content_types.xml.root, "rels", RELS_CONTENT_TYPE);
        self.content_types.modified = true;

        tracing::debug!(part = %name, "Created comments part");
        self.comments = Some(XmlPart {
            name,
            xml: empty_comments(),
            modified: true,
        });
        Ok(())
    }

    fn unused_comments_part_name(&self) -> String {
        if !self.package.contains(DEFAULT_COMMENTS_PART) {
            return DEFAULT_COMMENTS_PART.to_string();
        }
        (1..)
            .map(|n| format!("word/comments{}.xml", n))
            .find(|name| !self.package.contains(name))
            .unwrap_or_else(|| DEFAULT_COMMENTS_PART.to_string())
    }
}

fn empty_comments() -> XmlDocument {
    XmlDocument::new(XmlElement::new("w:comments").with_attribute("xmlns:w", WORDPROCESSING_NS))
}

fn next_comment_id(root: &XmlElement, names: &WordNames) -> Result<u32, AnnotationError> {
    let mut max: Option<u32> = None;
    for comment in root.child_elements().filter(|el| names.is(el, "comment")) {
        let raw = comment
            .attribute(&names.q("id"))
            .ok_or_else(|| AnnotationError::InvalidCommentId("<missing>".into()))?;
        let id: u32 = raw
            .trim()
            .parse()
            .map_err(|_| AnnotationError::InvalidCommentId(raw.to_string()))?;
        max = Some(max.map_or(id, |m| m.max(id)));
    }
    match max {
        None => Ok(0),
        Some(m) => m
            .checked_add(1)
            .ok_or_else(|| AnnotationError::InvalidCommentId(m.to_string())),
    }
}

fn comment_definition(
    names: &WordNames,
    id: u32,
    body: &str,
    author: &CommentAuthor,
    date: DateTime<Utc>,
) -> XmlElement {
    let mut comment = XmlElement::new(names.q("comment"))
        .with_attribute(&names.q("id"), &id.to_string())
        .with_attribute(&names.q("author"), &author.name)
        .with_attribute(&names.q("date"), &date.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .with_attribute(&names.q("initials"), &author.initials);
    for line in body.split('\n') {
        comment = comment.with_child(names.paragraph(line));
    }
    comment
}

/// Children that hold a run, directly or through a wrapper such as a hyperlink
fn is_run_bearing(names: &WordNames, el: &XmlElement) -> bool {
    names.is(el, "r") || (!names.is(el, "pPr") && el.contains_named(&names.q("r")))
}

fn anchor_paragraph(names: &WordNames, paragraph: &mut XmlElement, id: u32) {
    let run_slots: Vec<usize> = paragraph
        .children
        .iter()
        .enumerate()
        .filter(|(_, node)| matches!(node, XmlNode::Element(el) if is_run_bearing(names, el)))
        .map(|(slot, _)| slot)
        .collect();

    let (first, last) = match (run_slots.first(), run_slots.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            let text = names.paragraph_text(paragraph);
            paragraph
                .children
                .push(XmlNode::Element(names.text_run(&text)));
            let slot = paragraph.children.len() - 1;
            (slot, slot)
        }
    };

    let id = id.to_string();
    let marker = |local: &str| {
        XmlNode::Element(XmlElement::new(names.q(local)).with_attribute(&names.q("id"), &id))
    };

    // End first so `first` stays valid
    paragraph.children.insert(last + 1, marker("commentRangeEnd"));
    paragraph.children.insert(first, marker("commentRangeStart"));

    let reference = XmlElement::new(names.q("r")).with_child(
        XmlElement::new(names.q("commentReference")).with_attribute(&names.q("id"), &id),
    );
    paragraph.children.push(XmlNode::Element(reference));
}
