/*
 * tree.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Arena-backed document tree.
//!
//! Nodes live in an [`indextree::Arena`] and refer to each other through
//! [`NodeId`] handles. Detaching a node only unlinks it; the node stays
//! allocated for the lifetime of the tree, so an id held across a mutation
//! can always be queried safely. Whether a node is still part of the
//! document is a dynamic question ([`Tree::is_ancestor`],
//! [`Tree::is_connected`]), never something a walker may assume.

use std::fmt;

use indextree::Arena;

use crate::error::{Error, Result};
use crate::namespace;

/// Handle of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(indextree::NodeId);

impl NodeId {
    /// One-based allocation index of the node.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}

/// A namespace-qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualName {
    /// Prefix as written in the source, if any.
    pub prefix: Option<String>,
    /// Local part of the name.
    pub local: String,
    /// Resolved namespace URI.
    pub namespace: Option<String>,
}

impl QualName {
    /// Split a `prefix:local` string and attach a namespace URI.
    pub fn new(namespace: Option<&str>, qualified: &str) -> Self {
        let (prefix, local) = match qualified.split_once(':') {
            Some((p, l)) => (Some(p.to_string()), l.to_string()),
            None => (None, qualified.to_string()),
        };
        Self {
            prefix,
            local,
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
        }
    }

    /// The name as written: `prefix:local` or `local`.
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.local),
            None => self.local.clone(),
        }
    }

    /// Compare against a qualified name string without allocating.
    pub fn matches(&self, qualified: &str) -> bool {
        match &self.prefix {
            Some(p) => qualified
                .strip_prefix(p.as_str())
                .and_then(|rest| rest.strip_prefix(':'))
                .is_some_and(|rest| rest == self.local),
            None => qualified == self.local,
        }
    }
}

impl fmt::Display for QualName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "{}:{}", p, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// An element attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

impl Attribute {
    /// True for `xmlns` and `xmlns:*` declarations.
    pub fn is_namespace_declaration(&self) -> bool {
        match &self.name.prefix {
            Some(p) => p == "xmlns",
            None => self.name.local == "xmlns",
        }
    }
}

/// Element name plus attributes, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub name: QualName,
    pub attributes: Vec<Attribute>,
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The document node; always the first node of a tree.
    Document,
    /// A detached container whose children are spliced on insertion.
    Fragment,
    /// `<!DOCTYPE ...>` content.
    Doctype(String),
    Element(ElementData),
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, data: String },
}

/// A mutable document tree.
#[derive(Debug, Clone)]
pub struct Tree {
    arena: Arena<NodeData>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree holding only the document node.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = NodeId(arena.new_node(NodeData::Document));
        Self { arena, root }
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of allocated nodes, detached ones included.
    pub fn len(&self) -> usize {
        self.arena.count()
    }

    /// A tree always holds its document node.
    pub fn is_empty(&self) -> bool {
        false
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        NodeId(self.arena.new_node(data))
    }

    fn node(&self, id: NodeId) -> &indextree::Node<NodeData> {
        &self.arena[id.0]
    }

    /// Check that `id` was allocated by this tree.
    pub fn contains_id(&self, id: NodeId) -> bool {
        self.arena.get(id.0).is_some()
    }

    // ---- creation -------------------------------------------------------

    /// Create a detached element without a namespace.
    pub fn create_element(&mut self, qualified: &str) -> NodeId {
        self.create_element_ns(None, qualified)
    }

    /// Create a detached element in `namespace`.
    pub fn create_element_ns(&mut self, namespace: Option<&str>, qualified: &str) -> NodeId {
        self.push(NodeData::Element(ElementData {
            name: QualName::new(namespace, qualified),
            attributes: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(text.into()))
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.push(NodeData::Fragment)
    }

    pub fn create_doctype(&mut self, content: impl Into<String>) -> NodeId {
        self.push(NodeData::Doctype(content.into()))
    }

    pub fn create_processing_instruction(
        &mut self,
        target: impl Into<String>,
        data: impl Into<String>,
    ) -> NodeId {
        self.push(NodeData::ProcessingInstruction {
            target: target.into(),
            data: data.into(),
        })
    }

    // ---- inspection -----------------------------------------------------

    pub fn data(&self, id: NodeId) -> &NodeData {
        self.node(id).get()
    }

    pub fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.arena[id.0].get_mut()
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Element(_))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Text(_))
    }

    pub fn is_fragment(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Fragment)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id) {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.data_mut(id) {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Local name of an element.
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.local.as_str())
    }

    /// Namespace URI of an element.
    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        self.element(id).and_then(|e| e.name.namespace.as_deref())
    }

    /// Qualified tag name of an element.
    pub fn tag_name(&self, id: NodeId) -> Option<String> {
        self.element(id).map(|e| e.name.qualified())
    }

    // ---- navigation -----------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent().map(NodeId)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child().map(NodeId)
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child().map(NodeId)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling().map(NodeId)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).previous_sibling().map(NodeId)
    }

    /// Parent if it is an element.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.is_element(*p))
    }

    /// The children of `id`, materialized at call time.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        id.0.children(&self.arena).map(NodeId).collect()
    }

    /// Element children of `id`, materialized at call time.
    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        id.0.children(&self.arena)
            .map(NodeId)
            .filter(|c| self.is_element(*c))
            .collect()
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        self.first_child(id).is_some()
    }

    /// Following siblings of `id` in document order.
    pub fn following_siblings(&self, id: NodeId) -> Vec<NodeId> {
        id.0.following_siblings(&self.arena)
            .skip(1)
            .map(NodeId)
            .collect()
    }

    /// Preceding siblings of `id`, nearest first.
    pub fn preceding_siblings(&self, id: NodeId) -> Vec<NodeId> {
        id.0.preceding_siblings(&self.arena)
            .skip(1)
            .map(NodeId)
            .collect()
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        id.0.ancestors(&self.arena).skip(1).map(NodeId).collect()
    }

    /// All descendants of `id` in document order, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        id.0.descendants(&self.arena).skip(1).map(NodeId).collect()
    }

    /// The first element child of the document node.
    pub fn document_element(&self) -> Option<NodeId> {
        self.child_elements(self.root()).into_iter().next()
    }

    /// True if `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        node.0
            .ancestors(&self.arena)
            .skip(1)
            .any(|p| p == ancestor.0)
    }

    /// True if `node` is reachable from the document node.
    pub fn is_connected(&self, node: NodeId) -> bool {
        node == self.root() || self.is_ancestor(self.root(), node)
    }

    /// Position of `id` among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        self.parent(id)?;
        Some(id.0.preceding_siblings(&self.arena).count() - 1)
    }

    // ---- structural mutation -------------------------------------------

    /// Unlink `id` from its parent and siblings. The subtree stays intact.
    pub fn detach(&mut self, id: NodeId) {
        id.0.detach(&mut self.arena);
    }

    /// Link a non-fragment node before `before` (or at the end), moving it
    /// out of its current position first.
    fn link(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) -> Result<()> {
        let linked = match before {
            Some(b) => b.0.checked_insert_before(child.0, &mut self.arena),
            None => parent.0.checked_append(child.0, &mut self.arena),
        };
        linked.map_err(|_| Error::HierarchyRequest)
    }

    fn check_hierarchy(&self, parent: NodeId, child: NodeId) -> Result<()> {
        if child == parent || self.is_ancestor(child, parent) {
            return Err(Error::HierarchyRequest);
        }
        Ok(())
    }

    /// Insert `child` before `reference`, or append when `reference` is `None`.
    ///
    /// A fragment contributes its children and is left empty.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        if let Some(r) = reference {
            if self.parent(r) != Some(parent) {
                return Err(Error::NotAChild);
            }
            if r == child {
                return Ok(());
            }
        }
        if self.is_fragment(child) {
            for grandchild in self.children(child) {
                self.check_hierarchy(parent, grandchild)?;
            }
            for grandchild in self.children(child) {
                self.link(parent, grandchild, reference)?;
            }
            return Ok(());
        }
        self.check_hierarchy(parent, child)?;
        self.link(parent, child, reference)
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` directly after `reference`.
    pub fn insert_after(&mut self, reference: NodeId, child: NodeId) -> Result<()> {
        let parent = self.parent(reference).ok_or(Error::Detached)?;
        let next = self.next_sibling(reference);
        self.insert_before(parent, child, next)
    }

    /// Put `replacement` where `old` is and detach `old`.
    pub fn replace_node(&mut self, old: NodeId, replacement: NodeId) -> Result<()> {
        if old == replacement {
            return Ok(());
        }
        let parent = self.parent(old).ok_or(Error::Detached)?;
        self.insert_before(parent, replacement, Some(old))?;
        self.detach(old);
        Ok(())
    }

    /// Detach every child of `id`.
    pub fn remove_children(&mut self, id: NodeId) {
        while let Some(child) = self.first_child(id) {
            self.detach(child);
        }
    }

    // ---- text -----------------------------------------------------------

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        match self.data(id) {
            NodeData::Text(t) | NodeData::Comment(t) => return t.clone(),
            _ => {}
        }
        id.0.descendants(&self.arena)
            .filter_map(|d| match self.arena[d].get() {
                NodeData::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all children of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        if let NodeData::Text(t) = self.data_mut(id) {
            *t = text.to_string();
            return;
        }
        self.remove_children(id);
        if !text.is_empty() {
            let node = self.create_text(text);
            id.0.append(node.0, &mut self.arena);
        }
    }

    // ---- attributes -----------------------------------------------------

    /// Attributes of an element, empty for other nodes.
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match self.data(id) {
            NodeData::Element(e) => &e.attributes,
            _ => &[],
        }
    }

    /// Look up an attribute by qualified name.
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.name.matches(name))
            .map(|a| a.value.as_str())
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    /// Qualified names of all attributes, in order.
    pub fn attribute_names(&self, id: NodeId) -> Vec<String> {
        self.attributes(id)
            .iter()
            .map(|a| a.name.qualified())
            .collect()
    }

    /// Set an attribute by qualified name, creating it when missing.
    ///
    /// A prefix on a new attribute is resolved against the in-scope
    /// declarations of the element.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        let existing = self
            .element(id)
            .ok_or(Error::NotAnElement)?
            .attributes
            .iter()
            .position(|a| a.name.matches(name));
        if let Some(index) = existing {
            if let Some(e) = self.element_mut(id) {
                e.attributes[index].value = value.to_string();
            }
            return Ok(());
        }
        let namespace = match name.split_once(':') {
            Some(("xml", _)) => Some(namespace::XML.to_string()),
            Some(("xmlns", _)) => Some(namespace::XMLNS.to_string()),
            Some((prefix, _)) => self.lookup_namespace(id, Some(prefix)),
            None => None,
        };
        if let Some(e) = self.element_mut(id) {
            e.attributes.push(Attribute {
                name: QualName::new(namespace.as_deref(), name),
                value: value.to_string(),
            });
        }
        Ok(())
    }

    /// Remove an attribute by qualified name. Returns whether it existed.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        match self.element_mut(id) {
            Some(e) => {
                let before = e.attributes.len();
                e.attributes.retain(|a| !a.name.matches(name));
                e.attributes.len() != before
            }
            None => false,
        }
    }

    /// Value of the `id` attribute.
    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.get_attribute(id, "id")
    }

    /// Resolve a prefix (or the default namespace for `None`) at `id`.
    pub fn lookup_namespace(&self, id: NodeId, prefix: Option<&str>) -> Option<String> {
        if prefix == Some("xml") {
            return Some(namespace::XML.to_string());
        }
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if let Some(e) = self.element(current) {
                for attr in &e.attributes {
                    let declares = match (prefix, &attr.name.prefix) {
                        (None, None) => attr.name.local == "xmlns",
                        (Some(p), Some(ap)) => ap == "xmlns" && attr.name.local == p,
                        _ => false,
                    };
                    if declares {
                        return Some(attr.value.clone()).filter(|v| !v.is_empty());
                    }
                }
                if e.name.prefix.as_deref() == prefix && e.name.namespace.is_some() {
                    return e.name.namespace.clone();
                }
            }
            cursor = self.parent(current);
        }
        None
    }

    // ---- copying --------------------------------------------------------

    /// Deep-copy `id` within this tree. The copy is detached.
    pub fn clone_node(&mut self, id: NodeId) -> NodeId {
        let data = self.data(id).clone();
        let copy = self.push(data);
        for child in self.children(id) {
            let child_copy = self.clone_node(child);
            copy.0.append(child_copy.0, &mut self.arena);
        }
        copy
    }

    /// Deep-copy a node of another tree into this one.
    ///
    /// The copy is detached. A document node arrives as a fragment, so
    /// inserting it splices the document's top-level nodes.
    pub fn import_node(&mut self, source: &Tree, id: NodeId) -> NodeId {
        let data = match source.data(id) {
            NodeData::Document => NodeData::Fragment,
            other => other.clone(),
        };
        let copy = self.push(data);
        for child in source.children(id) {
            let child_copy = self.import_node(source, child);
            copy.0.append(child_copy.0, &mut self.arena);
        }
        copy
    }
}
