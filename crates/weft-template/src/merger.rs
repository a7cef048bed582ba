/*
 * merger.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Document merging.
//!
//! A [`MergeList`] maps ids to subordinate documents. Merging splices each
//! document at the element of the target tree carrying its id, after first
//! merging the document's own nested ids. Content whose first element has
//! the target's id replaces the target; other content is appended to it.

use std::collections::{BTreeMap, HashSet};

use weft_dom::{Document, Identity, NodeId, SnapshotNodeList, Tree};
use weft_select::{Selector, XPathSelector};

use crate::error::MergeError;
use crate::options::RenderOptions;
use crate::snippet::{splice, unwrap_container};

/// Result type for merging.
pub type Result<T> = std::result::Result<T, MergeError>;

/// Elements below the context that carry an `id`.
const ID_QUERY: &str = ".//*[@id]";

/// Subordinate documents keyed by target id, in registration order per id.
#[derive(Debug, Clone, Default)]
pub struct MergeList {
    entries: BTreeMap<Identity, Vec<Document>>,
}

impl MergeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under its own identity.
    pub fn add(&mut self, document: Document) -> Result<()> {
        let id = document
            .identity()
            .cloned()
            .ok_or(MergeError::MissingIdentity)?;
        self.entries.entry(id).or_default().push(document);
        Ok(())
    }

    /// Register a document under `id`.
    pub fn insert(&mut self, id: &str, document: Document) -> Result<()> {
        let id = Identity::new(id)?;
        self.entries.entry(id).or_default().push(document);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&[Document]> {
        let key = Identity::new(id).ok()?;
        self.entries.get(&key).map(Vec::as_slice)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of distinct ids.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Merge every document of `list` into `tree`.
///
/// Target ids are checked for duplicates before the tree is touched. An id
/// reached a second time during the walk, through nested content, is also
/// a [`MergeError::DuplicateId`].
///
/// # Example
///
/// ```rust
/// use weft_dom::Document;
/// use weft_template::{MergeList, RenderOptions, merger};
///
/// let mut target = Document::parse(r#"<body><main id="content"/></body>"#).unwrap();
/// let mut list = MergeList::new();
/// list.add(Document::parse("<p>Hi</p>").unwrap().with_identity("content").unwrap())
///     .unwrap();
///
/// merger::merge(target.tree_mut(), &list, &RenderOptions::default()).unwrap();
/// assert_eq!(
///     target.to_xml_string(),
///     r#"<body><main id="content"><p>Hi</p></main></body>"#
/// );
/// ```
pub fn merge(tree: &mut Tree, list: &MergeList, options: &RenderOptions) -> Result<()> {
    let root = tree.document_element().ok_or(MergeError::EmptyDocument)?;
    if list.is_empty() {
        return Err(MergeError::EmptyList);
    }
    tracing::debug!(ids = list.len(), "Merging documents");
    check_targets(tree, root, list)?;

    let mut merger = Merger {
        list,
        seen: HashSet::new(),
        max_depth: options.max_depth,
    };
    merger.merge_into(tree, root, 0)
}

/// Fail on the first target id that occurs twice.
fn check_targets(tree: &Tree, root: NodeId, list: &MergeList) -> Result<()> {
    let mut seen = HashSet::new();
    for node in &XPathSelector::new(ID_QUERY).select(tree, root)? {
        let Some(id) = tree.element_id(node) else {
            continue;
        };
        if list.contains(id) && !seen.insert(id) {
            return Err(MergeError::DuplicateId { id: id.to_string() });
        }
    }
    Ok(())
}

struct Merger<'a> {
    list: &'a MergeList,
    /// Ids merged so far in this call.
    seen: HashSet<String>,
    max_depth: usize,
}

impl Merger<'_> {
    fn merge_into(&mut self, tree: &mut Tree, context: NodeId, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(MergeError::DepthLimitExceeded {
                max_depth: self.max_depth,
            });
        }
        let targets = XPathSelector::new(ID_QUERY).select(tree, context)?;
        let mut targets = SnapshotNodeList::new(targets);

        while let Some(target) = targets.next_within(tree, context) {
            let Some(id) = tree.element_id(target).map(str::to_string) else {
                continue;
            };
            let Some(documents) = self.list.get(&id) else {
                continue;
            };
            if !self.seen.insert(id.clone()) {
                return Err(MergeError::DuplicateId { id });
            }
            tracing::trace!(id = %id, documents = documents.len(), "Merging at target");

            let mut current = target;
            for document in documents {
                let Some(source) = document.document_element() else {
                    continue;
                };
                let imported = tree.import_node(document.tree(), source);
                let content = unwrap_container(tree, imported)?;
                // Top-level elements are the replacement candidates; only
                // what lies below them is merged here.
                let roots = if tree.is_fragment(content) {
                    tree.child_elements(content)
                } else {
                    vec![content]
                };
                for root in roots {
                    self.merge_into(tree, root, depth + 1)?;
                }
                current = splice(tree, current, content)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(markup: &str) -> Document {
        Document::parse(markup).unwrap()
    }

    fn part(id: &str, markup: &str) -> Document {
        doc(markup).with_identity(id).unwrap()
    }

    fn merged(target: &str, parts: Vec<Document>) -> Result<String> {
        let mut target = doc(target);
        let mut list = MergeList::new();
        for p in parts {
            list.add(p)?;
        }
        merge(target.tree_mut(), &list, &RenderOptions::default())?;
        Ok(target.to_xml_string())
    }

    #[test]
    fn test_append_and_replace() {
        let out = merged(
            r#"<body><nav id="nav">menu</nav><main id="main"/></body>"#,
            vec![
                part("nav", r#"<ul id="nav"><li>a</li></ul>"#),
                part("main", "<article>text</article>"),
            ],
        )
        .unwrap();
        assert_eq!(
            out,
            r#"<body><ul id="nav"><li>a</li></ul><main id="main"><article>text</article></main></body>"#
        );
    }

    #[test]
    fn test_nested_ids_resolve_depth_first() {
        let out = merged(
            r#"<body><main id="main"/></body>"#,
            vec![
                part("main", r#"<section><aside id="side"/></section>"#),
                part("side", "<b>side</b>"),
            ],
        )
        .unwrap();
        assert_eq!(
            out,
            r#"<body><main id="main"><section><aside id="side"><b>side</b></aside></section></main></body>"#
        );
    }

    #[test]
    fn test_container_is_unwrapped() {
        let out = merged(
            r#"<body><main id="main"/></body>"#,
            vec![part(
                "main",
                r#"<c:doc xmlns:c="urn:weft:container"><p>1</p><p>2</p></c:doc>"#,
            )],
        )
        .unwrap();
        assert_eq!(out, r#"<body><main id="main"><p>1</p><p>2</p></main></body>"#);
    }

    #[test]
    fn test_container_with_same_id_replaces_target() {
        let out = merged(
            r#"<body><div id="x">old</div></body>"#,
            vec![part(
                "x",
                r#"<c:doc xmlns:c="urn:weft:container"><section id="x">new</section></c:doc>"#,
            )],
        )
        .unwrap();
        assert_eq!(out, r#"<body><section id="x">new</section></body>"#);
    }

    #[test]
    fn test_padded_container_replacement_merges_nested_ids() {
        let out = merged(
            r#"<body><div id="x">old</div><div id="z"/></body>"#,
            vec![
                part(
                    "x",
                    "<c:doc xmlns:c=\"urn:weft:container\">\n  <section id=\"x\"><p id=\"y\"/></section>\n</c:doc>",
                ),
                part("y", "<b>y</b>"),
                part("z", "<i>z</i>"),
            ],
        )
        .unwrap();
        assert_eq!(
            out,
            "<body>\n  <section id=\"x\"><p id=\"y\"><b>y</b></p></section>\n<div id=\"z\"><i>z</i></div></body>"
        );
    }

    #[test]
    fn test_several_documents_for_one_id() {
        let out = merged(
            r#"<body><div id="x"/></body>"#,
            vec![
                part("x", "<i>1</i>"),
                part("x", r#"<section id="x"/>"#),
                part("x", "<i>3</i>"),
            ],
        )
        .unwrap();
        assert_eq!(out, r#"<body><section id="x"><i>3</i></section></body>"#);
    }

    #[test]
    fn test_duplicate_target_leaves_tree_untouched() {
        let mut target = doc(r#"<body><div id="x"/><p id="y"/><div id="x"/></body>"#);
        let before = target.to_xml_string();
        let mut list = MergeList::new();
        list.add(part("y", "<b/>")).unwrap();
        list.add(part("x", "<b/>")).unwrap();
        let err = merge(target.tree_mut(), &list, &RenderOptions::default()).unwrap_err();
        assert!(matches!(err, MergeError::DuplicateId { id } if id == "x"));
        assert_eq!(target.to_xml_string(), before);
    }

    #[test]
    fn test_cycle_is_duplicate() {
        let err = merged(
            r#"<body><div id="a"/></body>"#,
            vec![
                part("a", r#"<section><p id="b"/></section>"#),
                part("b", r#"<div><span id="a"/></div>"#),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, MergeError::DuplicateId { id } if id == "a"));
    }

    #[test]
    fn test_precondition_errors() {
        let mut empty = Document::new();
        let mut list = MergeList::new();
        list.insert("x", doc("<b/>")).unwrap();
        let err = merge(empty.tree_mut(), &list, &RenderOptions::default()).unwrap_err();
        assert!(matches!(err, MergeError::EmptyDocument));

        let mut target = doc("<body/>");
        let err = merge(target.tree_mut(), &MergeList::new(), &RenderOptions::default())
            .unwrap_err();
        assert!(matches!(err, MergeError::EmptyList));

        let err = MergeList::new().add(doc("<b/>")).unwrap_err();
        assert!(matches!(err, MergeError::MissingIdentity));
        let err = MergeList::new().insert("", doc("<b/>")).unwrap_err();
        assert!(matches!(err, MergeError::Tree(weft_dom::Error::InvalidIdentity(_))));
    }

    #[test]
    fn test_unmatched_ids_are_ignored() {
        let out = merged(
            r#"<body><div id="other">keep</div></body>"#,
            vec![part("x", "<b/>")],
        )
        .unwrap();
        assert_eq!(out, r#"<body><div id="other">keep</div></body>"#);
    }
}
