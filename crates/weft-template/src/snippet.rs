/*
 * snippet.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Snippets, assets and id-keyed collections.
//!
//! A snippet is content spliced at an element addressed by its `id`. When
//! the content's first element carries the same id, it replaces the target;
//! otherwise it is appended to the target's children.

use std::collections::BTreeMap;

use weft_dom::{Document, Identity, NodeId, Tree, namespace, parse_fragment};

use crate::error::SnippetError;
use crate::options::RenderOptions;

/// Result type for snippet operations.
pub type Result<T> = std::result::Result<T, SnippetError>;

/// Content that can be spliced at a target element.
pub trait Snippet {
    /// Splice into `target` and return the node now standing where the
    /// target was: the target itself when appending, the new element when
    /// replacing.
    fn apply_to(&self, tree: &mut Tree, target: NodeId) -> Result<NodeId>;
}

impl<S: Snippet + ?Sized> Snippet for Box<S> {
    fn apply_to(&self, tree: &mut Tree, target: NodeId) -> Result<NodeId> {
        (**self).apply_to(tree, target)
    }
}

/// Splice `content` at `target` under the replace-or-append rule.
///
/// `content` may be a fragment; a container-namespace element is unwrapped
/// first.
pub(crate) fn splice(
    tree: &mut Tree,
    target: NodeId,
    content: NodeId,
) -> weft_dom::Result<NodeId> {
    let content = unwrap_container(tree, content)?;
    let first_element = if tree.is_fragment(content) {
        tree.child_elements(content).first().copied()
    } else {
        Some(content).filter(|c| tree.is_element(*c))
    };

    let target_id = tree.element_id(target);
    let replacement =
        first_element.filter(|e| target_id.is_some() && tree.element_id(*e) == target_id);
    match replacement {
        Some(element) => {
            tracing::trace!(id = ?target_id, "Replacing target");
            tree.replace_node(target, content)?;
            Ok(element)
        }
        None => {
            tree.append_child(target, content)?;
            Ok(target)
        }
    }
}

/// Move the children of a container element into a fragment.
pub(crate) fn unwrap_container(tree: &mut Tree, content: NodeId) -> weft_dom::Result<NodeId> {
    if tree.namespace_uri(content) != Some(namespace::CONTAINER) {
        return Ok(content);
    }
    let fragment = tree.create_fragment();
    for child in tree.children(content) {
        tree.append_child(fragment, child)?;
    }
    Ok(fragment)
}

/// A snippet with arbitrary content.
///
/// All top-level nodes of the content tree are spliced.
#[derive(Debug, Clone)]
pub struct ContentSnippet {
    content: Tree,
}

impl ContentSnippet {
    pub fn new(content: Tree) -> Self {
        Self { content }
    }

    pub fn from_document(document: Document) -> Self {
        Self::new(document.into_tree())
    }

    /// Parse markup as XHTML content. Several top-level nodes are allowed.
    pub fn parse(markup: &str) -> Result<Self> {
        Ok(Self::new(parse_fragment(markup, Some(namespace::XHTML))?))
    }
}

impl Snippet for ContentSnippet {
    fn apply_to(&self, tree: &mut Tree, target: NodeId) -> Result<NodeId> {
        let content = tree.import_node(&self.content, self.content.root());
        Ok(splice(tree, target, content)?)
    }
}

/// A snippet wrapped in a container-namespace root element.
///
/// ```xml
/// <snippet xmlns="urn:weft:container">
///   <p xmlns="http://www.w3.org/1999/xhtml">content</p>
/// </snippet>
/// ```
#[derive(Debug, Clone)]
pub struct ContainerSnippet {
    content: Tree,
    container: NodeId,
}

impl ContainerSnippet {
    pub fn new(document: Document) -> Result<Self> {
        let content = document.into_tree();
        let container = content
            .document_element()
            .ok_or(SnippetError::EmptySnippet)?;
        let found = content.namespace_uri(container);
        if found != Some(namespace::CONTAINER) {
            return Err(SnippetError::WrongNamespace {
                expected: namespace::CONTAINER,
                found: found.map(str::to_string),
            });
        }
        let blank = content.children(container).into_iter().all(|child| {
            content.is_text(child) && content.text_content(child).trim().is_empty()
        });
        if blank {
            return Err(SnippetError::EmptySnippet);
        }
        Ok(Self { content, container })
    }

    pub fn parse(markup: &str) -> Result<Self> {
        Self::new(Document::parse(markup)?)
    }
}

impl Snippet for ContainerSnippet {
    fn apply_to(&self, tree: &mut Tree, target: NodeId) -> Result<NodeId> {
        let content = tree.import_node(&self.content, self.container);
        Ok(splice(tree, target, content)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Stylesheet,
    Script,
}

/// A stylesheet or script reference, appended to its target as a `link`
/// or `script` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    kind: AssetKind,
    url: String,
}

impl Asset {
    pub fn stylesheet(href: impl Into<String>) -> Self {
        Self {
            kind: AssetKind::Stylesheet,
            url: href.into(),
        }
    }

    pub fn script(src: impl Into<String>) -> Self {
        Self {
            kind: AssetKind::Script,
            url: src.into(),
        }
    }

    /// Pick the kind from the URL's extension: `.css` or `.js`/`.mjs`.
    pub fn from_url(url: impl Into<String>) -> Option<Self> {
        let url = url.into();
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let extension = path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("css") => Some(Self::stylesheet(url)),
            Some("js" | "mjs") => Some(Self::script(url)),
            _ => None,
        }
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Snippet for Asset {
    fn apply_to(&self, tree: &mut Tree, target: NodeId) -> Result<NodeId> {
        let ns = tree.namespace_uri(target).map(str::to_string);
        let element = match self.kind {
            AssetKind::Stylesheet => {
                let link = tree.create_element_ns(ns.as_deref(), "link");
                tree.set_attribute(link, "rel", "stylesheet")?;
                tree.set_attribute(link, "href", &self.url)?;
                link
            }
            AssetKind::Script => {
                let script = tree.create_element_ns(ns.as_deref(), "script");
                tree.set_attribute(script, "src", &self.url)?;
                script
            }
        };
        tree.append_child(target, element)?;
        Ok(target)
    }
}

/// Kind name of a collection entry, used in lookup errors.
pub trait CollectionItem {
    const KIND: &'static str;
}

impl CollectionItem for Box<dyn Snippet> {
    const KIND: &'static str = "snippet";
}

impl CollectionItem for Asset {
    const KIND: &'static str = "asset";
}

/// Items grouped by target id, in registration order per id.
pub struct IdCollection<T> {
    entries: BTreeMap<Identity, Vec<T>>,
}

pub type SnippetCollection = IdCollection<Box<dyn Snippet>>;
pub type AssetList = IdCollection<Asset>;

impl<T> Default for IdCollection<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: CollectionItem> IdCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: Identity, item: T) {
        self.entries.entry(id).or_default().push(item);
    }

    /// Register under a raw id string, validating it first.
    pub fn insert(&mut self, id: &str, item: T) -> Result<()> {
        self.add(Identity::new(id)?, item);
        Ok(())
    }

    /// Items for `id`; an unregistered id is an error.
    pub fn get(&self, id: &str) -> Result<&[T]> {
        self.find(id).ok_or_else(|| SnippetError::UnknownId {
            kind: T::KIND,
            id: id.to_string(),
        })
    }

    pub fn find(&self, id: &str) -> Option<&[T]> {
        let key = Identity::new(id).ok()?;
        self.entries.get(&key).map(Vec::as_slice)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Number of distinct ids.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &Identity> {
        self.entries.keys()
    }
}

impl SnippetCollection {
    /// Box and register a snippet.
    pub fn add_snippet(&mut self, id: Identity, snippet: impl Snippet + 'static) {
        self.add(id, Box::new(snippet));
    }
}

/// Splice every registered item at the element children of `element`
/// whose id matches, then descend.
pub fn apply<T: Snippet + CollectionItem>(
    tree: &mut Tree,
    element: NodeId,
    collection: &IdCollection<T>,
    options: &RenderOptions,
) -> Result<()> {
    tracing::debug!(ids = collection.len(), kind = T::KIND, "Applying snippets");
    apply_children(tree, element, collection, options.max_depth, 0)
}

fn apply_children<T: Snippet + CollectionItem>(
    tree: &mut Tree,
    element: NodeId,
    collection: &IdCollection<T>,
    max_depth: usize,
    depth: usize,
) -> Result<()> {
    if depth > max_depth {
        return Err(SnippetError::DepthLimitExceeded { max_depth });
    }
    // Resume after the original child: nodes spliced in by a replacement
    // are not revisited, so a same-id replacement is applied once.
    let mut cursor = tree.first_child(element);
    while let Some(child) = cursor {
        cursor = tree.next_sibling(child);
        if !tree.is_element(child) {
            continue;
        }
        let mut current = child;
        let items = tree.element_id(child).and_then(|id| collection.find(id));
        if let Some(items) = items {
            for item in items {
                current = item.apply_to(tree, current)?;
                if !tree.is_element(current) {
                    break;
                }
            }
        }
        if tree.is_element(current) && tree.has_children(current) {
            apply_children(tree, current, collection, max_depth, depth + 1)?;
        }
    }
    Ok(())
}
