//! WordprocessingML document model
//!
//! Paragraph indices count only the direct `w:p` children of `w:body`, in
//! document order. Appending content never changes existing indices.

use crate::error::DocxError;
use crate::package::{
    self, Package, CONTENT_TYPES_PART, OFFICE_DOCUMENT_REL_SUFFIX, PACKAGE_RELS_PART,
};
use crate::xml::{XmlDocument, XmlElement, XmlNode};

pub const WORDPROCESSING_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const DEFAULT_MAIN_PART: &str = "word/document.xml";

/// Qualified-name helper for the WordprocessingML namespace prefix of a part
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WordNames {
    prefix: String,
}

impl WordNames {
    pub(crate) fn for_root(root: &XmlElement) -> Self {
        let prefix = root
            .namespace_prefix(WORDPROCESSING_NS)
            .unwrap_or_else(|| "w".to_string());
        Self { prefix }
    }

    pub(crate) fn q(&self, local: &str) -> String {
        if self.prefix.is_empty() {
            local.to_string()
        } else {
            format!("{}:{}", self.prefix, local)
        }
    }

    pub(crate) fn is(&self, element: &XmlElement, local: &str) -> bool {
        match element.name.split_once(':') {
            Some((prefix, name)) => prefix == self.prefix && name == local,
            None => self.prefix.is_empty() && element.name == local,
        }
    }

    /// `<w:r>` carrying `text`, with tabs and line breaks as their own elements
    pub(crate) fn text_run(&self, text: &str) -> XmlElement {
        let mut run = XmlElement::new(self.q("r"));
        let mut pending = String::new();
        for ch in text.chars() {
            let special = match ch {
                '\t' => Some("tab"),
                '\n' => Some("br"),
                _ => None,
            };
            match special {
                Some(local) => {
                    if !pending.is_empty() {
                        run = run.with_child(self.text_element(&pending));
                        pending.clear();
                    }
                    run = run.with_child(XmlElement::new(self.q(local)));
                }
                None => pending.push(ch),
            }
        }
        if !pending.is_empty() {
            run = run.with_child(self.text_element(&pending));
        }
        run
    }

    fn text_element(&self, text: &str) -> XmlElement {
        XmlElement::new(self.q("t"))
            .with_attribute("xml:space", "preserve")
            .with_text(text)
    }

    pub(crate) fn paragraph(&self, text: &str) -> XmlElement {
        let paragraph = XmlElement::new(self.q("p"));
        if text.is_empty() {
            paragraph
        } else {
            paragraph.with_child(self.text_run(text))
        }
    }

    /// Visible text of a paragraph (or any run container)
    pub(crate) fn paragraph_text(&self, paragraph: &XmlElement) -> String {
        let mut out = String::new();
        self.collect_text(paragraph, &mut out);
        out
    }

    fn collect_text(&self, container: &XmlElement, out: &mut String) {
        for child in container.child_elements() {
            if self.is(child, "r") {
                self.run_text(child, out);
            } else if self.is(child, "pPr")
                || self.is(child, "del")
                || self.is(child, "moveFrom")
            {
                continue;
            } else {
                // hyperlink, ins, smartTag, sdt, fldSimple ...
                self.collect_text(child, out);
            }
        }
    }

    fn run_text(&self, run: &XmlElement, out: &mut String) {
        for child in run.child_elements() {
            if self.is(child, "t") {
                out.push_str(&child.text());
            } else if self.is(child, "tab") {
                out.push('\t');
            } else if self.is(child, "br") || self.is(child, "cr") {
                out.push('\n');
            } else if self.is(child, "noBreakHyphen") {
                out.push('-');
            }
        }
    }
}

/// A parsed XML part and whether it must be rewritten on save
#[derive(Debug, Clone)]
pub(crate) struct XmlPart {
    pub name: String,
    pub xml: XmlDocument,
    pub modified: bool,
}

/// An opened .docx package
#[derive(Debug, Clone)]
pub struct DocxDocument {
    pub(crate) package: Package,
    pub(crate) main_part: String,
    /// Main part with `w:body` lifted out
    pub(crate) document: XmlDocument,
    pub(crate) body: XmlElement,
    body_slot: usize,
    pub(crate) document_modified: bool,
    pub(crate) names: WordNames,
    pub(crate) relationships: XmlPart,
    pub(crate) content_types: XmlPart,
    pub(crate) comments: Option<XmlPart>,
}

impl DocxDocument {
    /// Open a .docx package from raw bytes
    ///
    /// The main document part is found through the package relationships
    /// (falling back to `word/document.xml`). Its body, its relationship part
    /// and `[Content_Types].xml` are parsed for editing; every other part is
    /// kept as opaque bytes.
    ///
    /// # Arguments
    ///
    /// * `bytes` - Complete .docx file contents
    ///
    /// # Errors
    ///
    /// Returns `DocxError::ParseError` if:
    /// - The bytes are not a zip archive, or decompress past the package limits
    /// - The main document part or `[Content_Types].xml` is missing
    /// - The main part has no `w:body`
    ///
    /// Returns `DocxError::XmlError` if one of the edited parts is not
    /// well-formed XML.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        Self::from_package(Package::read(bytes)?)
    }

    /// Empty single-section A4 document
    pub fn new_blank() -> Result<Self, DocxError> {
        let mut package = Package::default();
        package.set(CONTENT_TYPES_PART, BLANK_CONTENT_TYPES.as_bytes().to_vec());
        package.set(PACKAGE_RELS_PART, BLANK_PACKAGE_RELS.as_bytes().to_vec());
        package.set(DEFAULT_MAIN_PART, BLANK_DOCUMENT.as_bytes().to_vec());
        package.set(
            "word/_rels/document.xml.rels",
            BLANK_DOCUMENT_RELS.as_bytes().to_vec(),
        );
        Self::from_package(package)
    }

    fn from_package(package: Package) -> Result<Self, DocxError> {
        let main_part = main_part_name(&package)?;
        let parse_error = |part: &str, e: DocxError| DocxError::ParseError(format!("{}: {}", part, e));

        let mut document = package
            .parse_part(&main_part)
            .map_err(|e| parse_error(&main_part, e))?
            .ok_or_else(|| DocxError::ParseError(format!("missing main part {}", main_part)))?;

        let names = WordNames::for_root(&document.root);
        if !names.is(&document.root, "document") {
            return Err(DocxError::ParseError(format!(
                "main part root is <{}>, expected a WordprocessingML document",
                document.root.name
            )));
        }

        let body_slot = document
            .root
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(el) if names.is(el, "body")))
            .ok_or_else(|| DocxError::ParseError("document has no body".into()))?;
        let body = match document.root.children.remove(body_slot) {
            XmlNode::Element(el) => el,
            _ => return Err(DocxError::ParseError("document has no body".into())),
        };

        let content_types = package
            .parse_part(CONTENT_TYPES_PART)
            .map_err(|e| parse_error(CONTENT_TYPES_PART, e))?
            .ok_or_else(|| DocxError::ParseError(format!("missing {}", CONTENT_TYPES_PART)))?;

        let rels_name = package::rels_part_for(&main_part);
        let relationships = package
            .parse_part(&rels_name)
            .map_err(|e| parse_error(&rels_name, e))?
            .unwrap_or_else(package::empty_relationships);

        tracing::debug!(
            main_part = %main_part,
            parts = package.part_names().count(),
            "Opened docx package"
        );

        Ok(Self {
            package,
            main_part,
            document,
            body,
            body_slot,
            document_modified: false,
            names,
            relationships: XmlPart {
                name: rels_name,
                xml: relationships,
                modified: false,
            },
            content_types: XmlPart {
                name: CONTENT_TYPES_PART.to_string(),
                xml: content_types,
                modified: false,
            },
            comments: None,
        })
    }

    /// Serialize back to .docx bytes. Untouched parts are copied verbatim
    /// and the zip entry order is preserved.
    ///
    /// # Errors
    ///
    /// Returns `DocxError::SerializationError` if an edited part cannot be
    /// written or the zip archive cannot be finished.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let mut package = self.package.clone();

        if self.document_modified {
            let mut root = self.document.root.clone();
            root.children
                .insert(self.body_slot, XmlNode::Element(self.body.clone()));
            package.set(&self.main_part, self.document.with_root(root).to_bytes()?);
        }

        let parts = [Some(&self.relationships), Some(&self.content_types), self.comments.as_ref()];
        for part in parts.into_iter().flatten() {
            if part.modified {
                package.set(&part.name, part.xml.to_bytes()?);
            }
        }

        package.write()
    }

    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    fn paragraph_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.body
            .child_elements()
            .filter(move |el| self.names.is(el, "p"))
    }

    /// Position within `w:body` children of paragraph `index`
    pub(crate) fn paragraph_slot(&self, index: usize) -> Option<usize> {
        self.body
            .children
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node, XmlNode::Element(el) if self.names.is(el, "p")))
            .nth(index)
            .map(|(slot, _)| slot)
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraph_elements().count()
    }

    /// Text of every body paragraph, empty ones included
    pub fn paragraphs(&self) -> Vec<String> {
        self.paragraph_elements()
            .map(|p| self.names.paragraph_text(p))
            .collect()
    }

    pub fn paragraph_text(&self, index: usize) -> Option<String> {
        self.paragraph_elements()
            .nth(index)
            .map(|p| self.names.paragraph_text(p))
    }

    /// Body tables as rows of cell text; a cell's paragraphs are joined by '\n'
    pub fn tables(&self) -> Vec<Vec<Vec<String>>> {
        self.body
            .child_elements()
            .filter(|el| self.names.is(el, "tbl"))
            .map(|table| {
                table
                    .child_elements()
                    .filter(|el| self.names.is(el, "tr"))
                    .map(|row| {
                        row.child_elements()
                            .filter(|el| self.names.is(el, "tc"))
                            .map(|cell| {
                                cell.child_elements()
                                    .filter(|el| self.names.is(el, "p"))
                                    .map(|p| self.names.paragraph_text(p))
                                    .collect::<Vec<_>>()
                                    .join("\n")
                            })
                            .collect()
                    })
                    .collect()
            })
            .collect()
    }

    /// Insert a body-level element before the trailing section properties
    fn push_block(&mut self, element: XmlElement) {
        let slot = match self.body.children.iter().rposition(
            |node| matches!(node, XmlNode::Element(el) if self.names.is(el, "sectPr")),
        ) {
            Some(slot) => slot,
            None => self.body.children.len(),
        };
        self.body.children.insert(slot, XmlNode::Element(element));
        self.document_modified = true;
    }

    /// Append a plain paragraph and return its index
    pub fn add_paragraph(&mut self, text: &str) -> usize {
        let paragraph = self.names.paragraph(text);
        self.push_block(paragraph);
        self.paragraph_count() - 1
    }

    /// Append a paragraph holding only a page break and return its index
    pub fn add_page_break(&mut self) -> usize {
        let names = self.names.clone();
        let paragraph = XmlElement::new(names.q("p")).with_child(
            XmlElement::new(names.q("r"))
                .with_child(XmlElement::new(names.q("br")).with_attribute(&names.q("type"), "page")),
        );
        self.push_block(paragraph);
        self.paragraph_count() - 1
    }

    /// Append a simple grid table
    pub fn add_table<R, C>(&mut self, rows: &[R])
    where
        R: AsRef<[C]>,
        C: AsRef<str>,
    {
        let names = self.names.clone();
        let columns = rows.iter().map(|r| r.as_ref().len()).max().unwrap_or(0);

        let mut grid = XmlElement::new(names.q("tblGrid"));
        for _ in 0..columns {
            grid = grid.with_child(XmlElement::new(names.q("gridCol")));
        }

        let mut table = XmlElement::new(names.q("tbl"))
            .with_child(
                XmlElement::new(names.q("tblPr")).with_child(
                    XmlElement::new(names.q("tblW"))
                        .with_attribute(&names.q("w"), "0")
                        .with_attribute(&names.q("type"), "auto"),
                ),
            )
            .with_child(grid);

        for row in rows {
            let mut tr = XmlElement::new(names.q("tr"));
            for cell in row.as_ref() {
                // A cell must hold at least one paragraph
                tr = tr.with_child(
                    XmlElement::new(names.q("tc")).with_child(names.paragraph(cell.as_ref())),
                );
            }
            table = table.with_child(tr);
        }

        self.push_block(table);
    }
}

fn main_part_name(package: &Package) -> Result<String, DocxError> {
    let rels = package
        .parse_part(PACKAGE_RELS_PART)
        .map_err(|e| DocxError::ParseError(format!("{}: {}", PACKAGE_RELS_PART, e)))?;

    let target = rels.as_ref().and_then(|rels| {
        package::find_relationship(&rels.root, |t| t.ends_with(OFFICE_DOCUMENT_REL_SUFFIX))
            .and_then(|rel| rel.attribute("Target").map(|t| t.into_owned()))
    });

    Ok(match target {
        Some(target) => package::resolve_target("", &target),
        None => DEFAULT_MAIN_PART.to_string(),
    })
}

const BLANK_CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const BLANK_PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const BLANK_DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body><w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#;

const BLANK_DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blank_document_is_empty() {
        let doc = DocxDocument::new_blank().unwrap();
        assert_eq!(doc.paragraph_count(), 0);
        assert!(doc.tables().is_empty());
        assert_eq!(doc.main_part(), "word/document.xml");
    }

    #[test]
    fn test_add_paragraph_returns_sequential_indices() {
        let mut doc = DocxDocument::new_blank().unwrap();
        assert_eq!(doc.add_paragraph("First"), 0);
        assert_eq!(doc.add_paragraph(""), 1);
        assert_eq!(doc.add_paragraph("Third"), 2);
        assert_eq!(doc.paragraphs(), vec!["First", "", "Third"]);
    }

    #[test]
    fn test_paragraphs_stay_before_section_properties() {
        let mut doc = DocxDocument::new_blank().unwrap();
        doc.add_paragraph("Body text");
        doc.add_table(&[["a", "b"]]);
        let last = doc.body.child_elements().last().unwrap();
        assert!(doc.names.is(last, "sectPr"));
    }

    #[test]
    fn test_page_break_paragraph() {
        let mut doc = DocxDocument::new_blank().unwrap();
        doc.add_paragraph("Body");
        assert_eq!(doc.add_page_break(), 1);
        assert_eq!(doc.paragraph_text(1).as_deref(), Some("\n"));
    }

    #[test]
    fn test_tabs_and_breaks_round_trip() {
        let mut doc = DocxDocument::new_blank().unwrap();
        doc.add_paragraph("Name:\tValue\nSecond line");
        let reopened = DocxDocument::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(
            reopened.paragraph_text(0).as_deref(),
            Some("Name:\tValue\nSecond line")
        );
    }

    #[test]
    fn test_tables_read_back() {
        let mut doc = DocxDocument::new_blank().unwrap();
        doc.add_table(&[vec!["Name", "Shares"], vec!["A. Holder", "100"]]);
        let reopened = DocxDocument::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(
            reopened.tables(),
            vec![vec![
                vec!["Name".to_string(), "Shares".to_string()],
                vec!["A. Holder".to_string(), "100".to_string()],
            ]]
        );
        // Table cell paragraphs are not body paragraphs
        assert_eq!(reopened.paragraph_count(), 0);
    }

    #[test]
    fn test_text_from_hyperlinks_and_insertions_but_not_deletions() {
        let names = WordNames {
            prefix: "w".to_string(),
        };
        let p = XmlDocument::parse(
            br#"<w:p xmlns:w="urn:w"><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>See </w:t></w:r><w:hyperlink><w:r><w:t>link</w:t></w:r></w:hyperlink><w:del><w:r><w:delText>gone</w:delText></w:r></w:del><w:ins><w:r><w:t>!</w:t></w:r></w:ins></w:p>"#,
        )
        .unwrap()
        .root;
        assert_eq!(names.paragraph_text(&p), "See link!");
    }

    #[test]
    fn test_custom_namespace_prefix() {
        let xml = br#"<x:document xmlns:x="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><x:body><x:p><x:r><x:t>Hi</x:t></x:r></x:p></x:body></x:document>"#;
        let root = XmlDocument::parse(xml).unwrap().root;
        let names = WordNames::for_root(&root);
        assert_eq!(names.q("p"), "x:p");
        let body = root.find_child("x:body").unwrap();
        assert_eq!(names.paragraph_text(body.find_child("x:p").unwrap()), "Hi");
    }

    #[test]
    fn test_unmodified_document_bytes_are_copied() {
        let doc = DocxDocument::new_blank().unwrap();
        let reopened = DocxDocument::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(
            reopened.package.get("word/document.xml"),
            Some(BLANK_DOCUMENT.as_bytes())
        );
    }

    #[test]
    fn test_rejects_non_docx() {
        assert!(matches!(
            DocxDocument::from_bytes(b"PK but not really"),
            Err(DocxError::ParseError(_))
        ));

        let mut package = Package::default();
        package.set(CONTENT_TYPES_PART, BLANK_CONTENT_TYPES.as_bytes().to_vec());
        let bytes = package.write().unwrap();
        let err = DocxDocument::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("word/document.xml"));
    }
}
