/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! XML parser that builds [`Tree`]s.
//!
//! Wraps [`quick-xml`]'s pull reader. Namespace declarations are resolved
//! while the tree is built, so every element and prefixed attribute carries
//! its namespace URI and can be moved between trees without losing it.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, BytesText, Event};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::namespace;
use crate::tree::{Attribute, ElementData, NodeData, NodeId, QualName, Tree};

/// Parse a complete document.
///
/// # Example
///
/// ```rust
/// use weft_dom::parse;
///
/// let doc = parse("<root><child/></root>").unwrap();
/// let root = doc.document_element().unwrap();
/// assert_eq!(doc.tree().local_name(root), Some("root"));
/// ```
///
/// # Errors
///
/// Returns [`Error::Parse`] with line and column for malformed markup and
/// [`Error::EmptyDocument`] when there is no root element.
pub fn parse(content: &str) -> Result<Document> {
    parse_tree(content).map(Document::from_tree)
}

/// Parse a complete document into a bare [`Tree`].
pub fn parse_tree(content: &str) -> Result<Tree> {
    TreeBuilder::new(content, ParseMode::Document, &[]).parse()
}

/// Parse a sequence of top-level nodes.
///
/// The document node of the returned tree holds the fragment's nodes; text
/// and several elements are allowed at the top level. `default_namespace`
/// becomes the namespace of unprefixed elements that do not declare one, so
/// a fragment meant for an XHTML page can be written without `xmlns`.
pub fn parse_fragment(content: &str, default_namespace: Option<&str>) -> Result<Tree> {
    let scope: Vec<(Option<String>, String)> = default_namespace
        .map(|ns| vec![(None, ns.to_string())])
        .unwrap_or_default();
    TreeBuilder::new(content, ParseMode::Fragment, &scope).parse()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseMode {
    Document,
    Fragment,
}

/// Internal parser state.
struct TreeBuilder<'a> {
    /// The source content being parsed.
    source: &'a str,

    /// The quick-xml reader.
    reader: Reader<&'a [u8]>,

    mode: ParseMode,

    tree: Tree,

    /// Open elements; the document node is at the bottom.
    stack: Vec<NodeId>,

    /// Namespace bindings per open element, innermost last.
    scopes: Vec<Vec<(Option<String>, String)>>,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str, mode: ParseMode, initial: &[(Option<String>, String)]) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        let tree = Tree::new();
        let root = tree.root();
        Self {
            source,
            reader,
            mode,
            tree,
            stack: vec![root],
            scopes: vec![initial.to_vec()],
        }
    }

    fn parse(mut self) -> Result<Tree> {
        loop {
            // Capture position before reading the event
            let event_start = self.reader.buffer_position() as usize;

            match self.reader.read_event() {
                Ok(Event::Start(e)) => {
                    let element = self.handle_start(&e, event_start)?;
                    self.stack.push(element);
                }
                Ok(Event::End(_)) => {
                    if self.stack.len() <= 1 {
                        return Err(self.error_at(event_start, "unexpected closing tag"));
                    }
                    self.stack.pop();
                    self.scopes.pop();
                }
                Ok(Event::Empty(e)) => {
                    self.handle_start(&e, event_start)?;
                    self.scopes.pop();
                }
                Ok(Event::Text(e)) => {
                    self.handle_text(&e, event_start)?;
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e).to_string();
                    self.append_text(text, event_start)?;
                }
                Ok(Event::Comment(e)) => {
                    let text = String::from_utf8_lossy(&e).to_string();
                    let node = self.tree.create_comment(text);
                    self.append(node)?;
                }
                Ok(Event::PI(e)) => {
                    let target = String::from_utf8_lossy(e.target()).to_string();
                    let data = String::from_utf8_lossy(e.content()).trim().to_string();
                    let node = self.tree.create_processing_instruction(target, data);
                    self.append(node)?;
                }
                Ok(Event::DocType(e)) => {
                    let content = String::from_utf8_lossy(&e).trim().to_string();
                    let node = self.tree.create_doctype(content);
                    self.append(node)?;
                }
                Ok(Event::Decl(_)) => {
                    // The declaration is regenerated by the serializer on request
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    let position = self.reader.error_position() as usize;
                    return Err(self.error_at(position, e.to_string()));
                }
            }
        }

        if self.stack.len() > 1 {
            let open = self.stack[self.stack.len() - 1];
            let name = self.tree.tag_name(open).unwrap_or_default();
            return Err(self.error_at(
                self.source.len(),
                format!("unexpected end of input, expected closing tag </{}>", name),
            ));
        }

        if self.mode == ParseMode::Document && self.tree.document_element().is_none() {
            return Err(Error::EmptyDocument);
        }

        Ok(self.tree)
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> Error {
        Error::parse_at(self.source, offset, message)
    }

    fn current(&self) -> NodeId {
        self.stack[self.stack.len() - 1]
    }

    fn append(&mut self, node: NodeId) -> Result<()> {
        let parent = self.current();
        self.tree.append_child(parent, node)
    }

    fn handle_start(&mut self, e: &BytesStart<'_>, event_start: usize) -> Result<NodeId> {
        let at_top = self.stack.len() == 1;
        if at_top
            && self.mode == ParseMode::Document
            && self.tree.document_element().is_some()
        {
            return Err(self.error_at(event_start, "multiple root elements"));
        }

        let qualified = String::from_utf8_lossy(e.name().as_ref()).to_string();

        // Collect raw attributes first: declarations on this element are in
        // scope for its own name and attributes.
        let mut raw = Vec::new();
        let mut declared = Vec::new();
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|err| {
                self.error_at(event_start, format!("attribute error: {}", err))
            })?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr
                .unescape_value()
                .map_err(|err| {
                    self.error_at(event_start, format!("invalid attribute value: {}", err))
                })?
                .into_owned();
            if key == "xmlns" {
                declared.push((None, value.clone()));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declared.push((Some(prefix.to_string()), value.clone()));
            }
            raw.push((key, value));
        }
        self.scopes.push(declared);

        let element_prefix = qualified.split_once(':').map(|(p, _)| p);
        let element_ns = self.resolve(element_prefix);
        if element_prefix.is_some() && element_ns.is_none() {
            return Err(self.error_at(
                event_start,
                format!("unbound namespace prefix in element <{}>", qualified),
            ));
        }

        let mut attributes = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            let ns = match key.split_once(':') {
                Some(("xmlns", _)) => Some(namespace::XMLNS.to_string()),
                None if key == "xmlns" => Some(namespace::XMLNS.to_string()),
                Some((prefix, _)) => match self.resolve(Some(prefix)) {
                    Some(ns) => Some(ns),
                    None => {
                        return Err(self.error_at(
                            event_start,
                            format!("unbound namespace prefix in attribute {}", key),
                        ));
                    }
                },
                None => None,
            };
            attributes.push(Attribute {
                name: QualName::new(ns.as_deref(), &key),
                value,
            });
        }

        let node = self.tree.create_element_ns(element_ns.as_deref(), &qualified);
        if let NodeData::Element(ElementData { attributes: slot, .. }) = self.tree.data_mut(node) {
            *slot = attributes;
        }
        self.append(node)?;
        Ok(node)
    }

    /// Resolve a prefix against the open scopes, innermost first.
    fn resolve(&self, prefix: Option<&str>) -> Option<String> {
        if prefix == Some("xml") {
            return Some(namespace::XML.to_string());
        }
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.clone())
            .filter(|uri| !uri.is_empty())
    }

    fn handle_text(&mut self, e: &BytesText<'_>, event_start: usize) -> Result<()> {
        let text = e
            .unescape()
            .map_err(|err| self.error_at(event_start, format!("invalid text content: {}", err)))?
            .into_owned();
        self.append_text(text, event_start)
    }

    fn append_text(&mut self, text: String, event_start: usize) -> Result<()> {
        if self.stack.len() == 1 && self.mode == ParseMode::Document {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(self.error_at(event_start, "text outside of the root element"));
        }
        // Merge with an adjacent text node (CDATA next to text)
        let parent = self.current();
        if let Some(last) = self.tree.last_child(parent) {
            if let NodeData::Text(existing) = self.tree.data_mut(last) {
                existing.push_str(&text);
                return Ok(());
            }
        }
        let node = self.tree.create_text(text);
        self.append(node)
    }
}
