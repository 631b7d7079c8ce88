//! OPC zip container: ordered part storage plus relationship helpers

use std::io::{Cursor, Read, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::DocxError;
use crate::xml::{XmlDocument, XmlElement, XmlNode};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const PACKAGE_RELS_PART: &str = "_rels/.rels";

pub const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

pub const OFFICE_DOCUMENT_REL_SUFFIX: &str = "/officeDocument";
pub const COMMENTS_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";
pub const COMMENTS_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.comments+xml";
pub const RELS_CONTENT_TYPE: &str = "application/vnd.openxmlformats-package.relationships+xml";

/// Largest single part accepted after decompression
pub const MAX_PART_BYTES: u64 = 64 * 1024 * 1024;
/// Largest decompressed package accepted
pub const MAX_PACKAGE_BYTES: u64 = 256 * 1024 * 1024;

/// Decompression bounds applied while reading a package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageLimits {
    pub max_part_bytes: u64,
    pub max_total_bytes: u64,
}

impl Default for PackageLimits {
    fn default() -> Self {
        Self {
            max_part_bytes: MAX_PART_BYTES,
            max_total_bytes: MAX_PACKAGE_BYTES,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
}

/// Zip entries in their original order
#[derive(Debug, Clone, Default)]
pub struct Package {
    entries: Vec<Entry>,
}

impl Package {
    /// Read every entry of a zip container with the default limits
    ///
    /// # Errors
    ///
    /// Returns `DocxError::ParseError` if the bytes are not a zip archive, an
    /// entry cannot be decompressed, or the decompressed content exceeds
    /// [`MAX_PART_BYTES`] per part or [`MAX_PACKAGE_BYTES`] in total.
    pub fn read(bytes: &[u8]) -> Result<Self, DocxError> {
        Self::read_with_limits(bytes, PackageLimits::default())
    }

    /// Read every entry, decompressing at most `limits` bytes
    ///
    /// Sizes declared by the archive are never trusted; each entry is read
    /// through a bounded reader.
    pub fn read_with_limits(bytes: &[u8], limits: PackageLimits) -> Result<Self, DocxError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| DocxError::ParseError(format!("not a zip package: {}", e)))?;

        let mut entries = Vec::new();
        let mut total: u64 = 0;
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| DocxError::ParseError(format!("zip entry {}: {}", i, e)))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();

            let mut data = Vec::new();
            file.by_ref()
                .take(limits.max_part_bytes + 1)
                .read_to_end(&mut data)
                .map_err(|e| DocxError::ParseError(format!("{}: {}", name, e)))?;

            let size = data.len() as u64;
            if size > limits.max_part_bytes {
                return Err(DocxError::ParseError(format!(
                    "{}: part exceeds {} bytes",
                    name, limits.max_part_bytes
                )));
            }
            total += size;
            if total > limits.max_total_bytes {
                return Err(DocxError::ParseError(format!(
                    "package exceeds {} bytes",
                    limits.max_total_bytes
                )));
            }

            entries.push(Entry {
                name,
                data,
                compression: file.compression(),
            });
        }

        Ok(Self { entries })
    }

    pub fn write(&self) -> Result<Vec<u8>, DocxError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for entry in &self.entries {
            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = FileOptions::default().compression_method(method);
            writer
                .start_file(entry.name.as_str(), options)
                .map_err(|e| DocxError::SerializationError(format!("{}: {}", entry.name, e)))?;
            writer
                .write_all(&entry.data)
                .map_err(|e| DocxError::SerializationError(format!("{}: {}", entry.name, e)))?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| DocxError::SerializationError(e.to_string()))?;
        Ok(cursor.into_inner())
    }

    fn position(&self, name: &str) -> Option<usize> {
        // Part names are case-insensitive
        self.entries
            .iter()
            .position(|e| e.name.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.position(name).map(|i| self.entries[i].data.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Replace a part's bytes, or append a new part at the end
    pub fn set(&mut self, name: &str, data: Vec<u8>) {
        match self.position(name) {
            Some(i) => self.entries[i].data = data,
            None => self.entries.push(Entry {
                name: name.to_string(),
                data,
                compression: CompressionMethod::Deflated,
            }),
        }
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn parse_part(&self, name: &str) -> Result<Option<XmlDocument>, DocxError> {
        self.get(name).map(XmlDocument::parse).transpose()
    }
}

/// `word/document.xml` -> `word/_rels/document.xml.rels`
pub fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the directory of its source part
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize(absolute.split('/'));
    }
    let dir = source_part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    normalize(dir.split('/').chain(target.split('/')))
}

fn normalize<'a>(segments: impl Iterator<Item = &'a str>) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in segments {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            s => out.push(s),
        }
    }
    out.join("/")
}

/// Target of the first relationship whose type satisfies `matches`
pub fn find_relationship<'a>(
    rels: &'a XmlElement,
    matches: impl Fn(&str) -> bool,
) -> Option<&'a XmlElement> {
    rels.child_elements().find(|rel| {
        rel.name == "Relationship"
            && rel
                .attribute("Type")
                .map(|t| matches(t.as_ref()))
                .unwrap_or(false)
    })
}

/// Append a relationship with a fresh `rIdN` id and return that id
pub fn add_relationship(rels: &mut XmlElement, rel_type: &str, target: &str) -> String {
    let next = rels
        .child_elements()
        .filter_map(|rel| rel.attribute("Id"))
        .filter_map(|id| id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()))
        .max()
        .map_or(1, |n| n + 1);
    let id = format!("rId{}", next);

    rels.children.push(XmlNode::Element(
        XmlElement::new("Relationship")
            .with_attribute("Id", &id)
            .with_attribute("Type", rel_type)
            .with_attribute("Target", target),
    ));
    id
}

pub fn empty_relationships() -> XmlDocument {
    XmlDocument::new(XmlElement::new("Relationships").with_attribute("xmlns", RELATIONSHIPS_NS))
}

/// Add an Override for `/part_name` unless one is present
pub fn ensure_override(content_types: &mut XmlElement, part_name: &str, content_type: &str) {
    let absolute = format!("/{}", part_name);
    let present = content_types.child_elements().any(|el| {
        el.name == "Override"
            && el
                .attribute("PartName")
                .map(|p| p.eq_ignore_ascii_case(&absolute))
                .unwrap_or(false)
    });
    if !present {
        content_types.children.push(XmlNode::Element(
            XmlElement::new("Override")
                .with_attribute("PartName", &absolute)
                .with_attribute("ContentType", content_type),
        ));
    }
}

/// Add a Default for `extension` unless one is present
pub fn ensure_default(content_types: &mut XmlElement, extension: &str, content_type: &str) {
    let present = content_types.child_elements().any(|el| {
        el.name == "Default"
            && el
                .attribute("Extension")
                .map(|e| e.eq_ignore_ascii_case(extension))
                .unwrap_or(false)
    });
    if !present {
        content_types.children.insert(
            0,
            XmlNode::Element(
                XmlElement::new("Default")
                    .with_attribute("Extension", extension)
                    .with_attribute("ContentType", content_type),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rels_part_for() {
        assert_eq!(rels_part_for("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(rels_part_for("document.xml"), "_rels/document.xml.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("word/document.xml", "comments.xml"), "word/comments.xml");
        assert_eq!(resolve_target("word/document.xml", "../customXml/item1.xml"), "customXml/item1.xml");
        assert_eq!(resolve_target("word/document.xml", "/word/comments.xml"), "word/comments.xml");
        assert_eq!(resolve_target("", "word/document.xml"), "word/document.xml");
    }

    #[test]
    fn test_add_relationship_picks_next_id() {
        let mut rels = empty_relationships().root;
        assert_eq!(add_relationship(&mut rels, "urn:a", "a.xml"), "rId1");
        rels.children.push(XmlNode::Element(
            XmlElement::new("Relationship").with_attribute("Id", "rId7"),
        ));
        assert_eq!(add_relationship(&mut rels, "urn:b", "b.xml"), "rId8");
        assert!(find_relationship(&rels, |t| t == "urn:b").is_some());
    }

    #[test]
    fn test_ensure_override_is_idempotent() {
        let mut types = XmlElement::new("Types");
        ensure_override(&mut types, "word/comments.xml", COMMENTS_CONTENT_TYPE);
        ensure_override(&mut types, "word/comments.xml", COMMENTS_CONTENT_TYPE);
        assert_eq!(types.child_elements().count(), 1);
    }

    #[test]
    fn test_package_preserves_entry_order() {
        let mut package = Package::default();
        package.set("b.xml", b"<b/>".to_vec());
        package.set("a.xml", b"<a/>".to_vec());
        package.set("B.XML", b"<b2/>".to_vec());

        let bytes = package.write().unwrap();
        let reread = Package::read(&bytes).unwrap();
        let names: Vec<_> = reread.part_names().collect();
        assert_eq!(names, vec!["b.xml", "a.xml"]);
        assert_eq!(reread.get("b.xml"), Some(&b"<b2/>"[..]));
    }

    #[test]
    fn test_read_rejects_non_zip() {
        assert!(matches!(
            Package::read(b"plain text"),
            Err(DocxError::ParseError(_))
        ));
    }

    /// Single empty stored entry whose central directory claims a zip64
    /// uncompressed size of 2^62 bytes
    fn oversized_declaration_zip() -> Vec<u8> {
        let name = b"word/document.xml";
        let mut out = Vec::new();

        // Local file header
        out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        out.extend_from_slice(&20u16.to_le_bytes());
        out.extend_from_slice(&[0u8; 2 + 2 + 2 + 2]); // flags, method, time, date
        out.extend_from_slice(&0u32.to_le_bytes()); // crc32 of empty data
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name);

        // Central directory
        let cd_offset = out.len() as u32;
        out.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        out.extend_from_slice(&45u16.to_le_bytes());
        out.extend_from_slice(&45u16.to_le_bytes());
        out.extend_from_slice(&[0u8; 2 + 2 + 2 + 2]);
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&u32::MAX.to_le_bytes()); // size lives in zip64 extra
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&12u16.to_le_bytes());
        out.extend_from_slice(&[0u8; 2 + 2 + 2 + 4]); // comment, disk, attrs
        out.extend_from_slice(&0u32.to_le_bytes()); // local header offset
        out.extend_from_slice(name);
        out.extend_from_slice(&0x0001u16.to_le_bytes());
        out.extend_from_slice(&8u16.to_le_bytes());
        out.extend_from_slice(&(1u64 << 62).to_le_bytes());
        let cd_size = out.len() as u32 - cd_offset;

        // End of central directory
        out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        out.extend_from_slice(&[0u8; 4]);
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&cd_size.to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    #[test]
    fn test_declared_size_is_not_trusted() {
        // Must return (either way) instead of allocating the declared size
        match Package::read(&oversized_declaration_zip()) {
            Ok(package) => assert_eq!(package.get("word/document.xml"), Some(&b""[..])),
            Err(e) => assert!(matches!(e, DocxError::ParseError(_))),
        }
    }

    #[test]
    fn test_part_limit_stops_decompression() {
        let mut package = Package::default();
        package.set("word/document.xml", vec![b'a'; 1024 * 1024]);
        let bytes = package.write().unwrap();
        assert!(bytes.len() < 64 * 1024);

        let limits = PackageLimits {
            max_part_bytes: 64 * 1024,
            max_total_bytes: MAX_PACKAGE_BYTES,
        };
        let err = Package::read_with_limits(&bytes, limits).unwrap_err();
        assert!(matches!(err, DocxError::ParseError(ref m) if m.contains("part exceeds")));
    }

    #[test]
    fn test_total_limit_spans_entries() {
        let mut package = Package::default();
        package.set("a.xml", vec![b'a'; 600]);
        package.set("b.xml", vec![b'b'; 600]);
        let bytes = package.write().unwrap();

        let limits = PackageLimits {
            max_part_bytes: 1000,
            max_total_bytes: 1000,
        };
        let err = Package::read_with_limits(&bytes, limits).unwrap_err();
        assert!(matches!(err, DocxError::ParseError(ref m) if m.contains("package exceeds")));

        let roomy = PackageLimits {
            max_part_bytes: 1000,
            max_total_bytes: 1200,
        };
        assert!(Package::read_with_limits(&bytes, roomy).is_ok());
    }
}
