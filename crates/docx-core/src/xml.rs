//! Minimal owned XML tree over quick-xml events
//!
//! Text and attribute values are stored exactly as they appear in the markup
//! (still escaped), so untouched content serializes back byte-for-byte apart
//! from insignificant formatting inside tags.

use std::borrow::Cow;

use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::DocxError;

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Escaped character data
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub name: String,
    /// Attribute values in escaped form
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add an attribute, escaping the value
    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.set_attribute(key, value);
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder: add a text node, escaping the content
    pub fn with_text(mut self, text: &str) -> Self {
        self.children.push(XmlNode::Text(escape(text).into_owned()));
        self
    }

    /// Unescaped attribute value
    pub fn attribute(&self, key: &str) -> Option<Cow<'_, str>> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| unescape(v).unwrap_or(Cow::Borrowed(v.as_str())))
    }

    pub fn set_attribute(&mut self, key: &str, value: &str) {
        let escaped = escape(value).into_owned();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = escaped,
            None => self.attributes.push((key.to_string(), escaped)),
        }
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn find_child(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements().find(|el| el.name == name)
    }

    pub fn find_child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find_map(|node| match node {
            XmlNode::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    /// Unescaped concatenation of this element's direct text children
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                XmlNode::Text(raw) => out.push_str(&unescape(raw).unwrap_or(Cow::Borrowed(raw))),
                XmlNode::CData(data) => out.push_str(data),
                _ => {}
            }
        }
        out
    }

    /// True if this element or any descendant is named `name`
    pub fn contains_named(&self, name: &str) -> bool {
        self.child_elements()
            .any(|el| el.name == name || el.contains_named(name))
    }

    /// Collect every descendant element named `name`, depth-first
    pub fn descendants_named<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlElement>) {
        for el in self.child_elements() {
            if el.name == name {
                out.push(el);
            }
            el.descendants_named(name, out);
        }
    }

    /// Prefix bound to namespace `uri` on this element ("" for a default namespace)
    pub fn namespace_prefix(&self, uri: &str) -> Option<String> {
        self.attributes.iter().find_map(|(key, value)| {
            if value != uri {
                return None;
            }
            if key == "xmlns" {
                Some(String::new())
            } else {
                key.strip_prefix("xmlns:").map(str::to_string)
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Declaration {
    version: String,
    encoding: Option<String>,
    standalone: Option<String>,
}

impl Default for Declaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: Some("UTF-8".to_string()),
            standalone: Some("yes".to_string()),
        }
    }
}

/// A parsed XML part: optional declaration plus a single root element
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    declaration: Option<Declaration>,
    pub root: XmlElement,
}

impl XmlDocument {
    /// Wrap a root element with the standard part declaration
    pub fn new(root: XmlElement) -> Self {
        Self {
            declaration: Some(Declaration::default()),
            root,
        }
    }

    /// Same declaration, different root
    pub fn with_root(&self, root: XmlElement) -> Self {
        Self {
            declaration: self.declaration.clone(),
            root,
        }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, DocxError> {
        let mut reader = Reader::from_reader(bytes);
        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;
        let mut declaration = None;

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                DocxError::XmlError(format!("at byte {}: {}", reader.buffer_position(), e))
            })?;

            match event {
                Event::Decl(decl) => declaration = Some(read_declaration(&decl)?),
                Event::Start(start) => stack.push(element_from_start(&start)?),
                Event::Empty(start) => {
                    let element = element_from_start(&start)?;
                    attach(&mut stack, &mut root, XmlNode::Element(element))?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| DocxError::XmlError("unbalanced end tag".into()))?;
                    attach(&mut stack, &mut root, XmlNode::Element(element))?;
                }
                Event::Text(text) => {
                    // Whitespace outside the root element is not kept
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Text(utf8(&text)?));
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::CData(utf8(&data)?));
                    }
                }
                Event::Comment(comment) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Comment(utf8(&comment)?));
                    }
                }
                Event::PI(pi) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(XmlNode::ProcessingInstruction(utf8(&pi)?));
                    }
                }
                Event::DocType(_) => {}
                Event::Eof => break,
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(DocxError::XmlError(format!(
                "unclosed element <{}>",
                stack[stack.len() - 1].name
            )));
        }
        let root = root.ok_or_else(|| DocxError::XmlError("no root element".into()))?;

        Ok(Self { declaration, root })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let mut writer = Writer::new(Vec::new());

        if let Some(decl) = &self.declaration {
            emit(
                &mut writer,
                Event::Decl(BytesDecl::new(
                    &decl.version,
                    decl.encoding.as_deref(),
                    decl.standalone.as_deref(),
                )),
            )?;
            writer.get_mut().extend_from_slice(b"\r\n");
        }
        write_element(&mut writer, &self.root)?;

        Ok(writer.into_inner())
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    node: XmlNode,
) -> Result<(), DocxError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    match (root.is_some(), node) {
        (false, XmlNode::Element(element)) => {
            *root = Some(element);
            Ok(())
        }
        (true, XmlNode::Element(element)) => Err(DocxError::XmlError(format!(
            "second root element <{}>",
            element.name
        ))),
        _ => Ok(()),
    }
}

fn utf8(bytes: &[u8]) -> Result<String, DocxError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| DocxError::XmlError(format!("invalid UTF-8: {}", e)))
}

fn read_declaration(decl: &BytesDecl<'_>) -> Result<Declaration, DocxError> {
    let version = decl
        .version()
        .map_err(|e| DocxError::XmlError(e.to_string()))
        .and_then(|v| utf8(&v))?;
    let encoding = match decl.encoding() {
        Some(Ok(value)) => Some(utf8(&value)?),
        _ => None,
    };
    let standalone = match decl.standalone() {
        Some(Ok(value)) => Some(utf8(&value)?),
        _ => None,
    };
    Ok(Declaration {
        version,
        encoding,
        standalone,
    })
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, DocxError> {
    let mut element = XmlElement::new(utf8(start.name().as_ref())?);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| DocxError::XmlError(format!("bad attribute: {}", e)))?;
        element
            .attributes
            .push((utf8(attr.key.as_ref())?, utf8(&attr.value)?));
    }
    Ok(element)
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), DocxError> {
    writer
        .write_event(event)
        .map_err(|e| DocxError::XmlError(e.to_string()))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<(), DocxError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        // Values are already escaped
        start.push_attribute((key.as_bytes(), value.as_bytes()));
    }

    if element.children.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for child in &element.children {
        match child {
            XmlNode::Element(el) => write_element(writer, el)?,
            XmlNode::Text(raw) => emit(writer, Event::Text(BytesText::from_escaped(raw.as_str())))?,
            XmlNode::CData(data) => emit(writer, Event::CData(BytesCData::new(data.as_str())))?,
            XmlNode::Comment(raw) => {
                emit(writer, Event::Comment(BytesText::from_escaped(raw.as_str())))?
            }
            XmlNode::ProcessingInstruction(raw) => {
                emit(writer, Event::PI(BytesText::from_escaped(raw.as_str())))?
            }
        }
    }
    emit(writer, Event::End(BytesEnd::new(element.name.as_str())))
}
