/*
 * document.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Documents: a tree plus identity and named snapshots.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::parser;
use crate::serializer::{self, SerializeOptions};
use crate::tree::{NodeId, Tree};

/// Stable name of a document, used as the key when merging.
///
/// Follows the HTML5 `id` rules: non-empty, no ASCII whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() || value.contains([' ', '\t', '\n', '\x0C', '\r']) {
            return Err(Error::InvalidIdentity(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Identity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A mutable document.
///
/// The identity may be assigned once. Snapshots are full copies of the
/// tree taken under a label and can be restored any number of times.
#[derive(Debug, Clone, Default)]
pub struct Document {
    tree: Tree,
    identity: Option<Identity>,
    snapshots: BTreeMap<String, Tree>,
}

impl Document {
    /// An empty document without a root element.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tree(tree: Tree) -> Self {
        Self {
            tree,
            identity: None,
            snapshots: BTreeMap::new(),
        }
    }

    /// Parse markup into a document. See [`parser::parse`].
    pub fn parse(content: &str) -> Result<Self> {
        parser::parse(content)
    }

    /// Assign the identity. Fails if one is already set, even if equal.
    pub fn set_identity(&mut self, identity: Identity) -> Result<()> {
        if let Some(existing) = &self.identity {
            return Err(Error::IdentityAlreadySet(existing.to_string()));
        }
        self.identity = Some(identity);
        Ok(())
    }

    /// Builder form of [`Document::set_identity`].
    pub fn with_identity(mut self, identity: &str) -> Result<Self> {
        self.set_identity(Identity::new(identity)?)?;
        Ok(self)
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }

    pub fn document_element(&self) -> Option<NodeId> {
        self.tree.document_element()
    }

    /// Store a copy of the current tree under `label`, replacing any
    /// earlier snapshot with the same label.
    pub fn snapshot(&mut self, label: impl Into<String>) {
        let label = label.into();
        tracing::trace!(label = %label, "Taking document snapshot");
        self.snapshots.insert(label, self.tree.clone());
    }

    /// Replace the tree with the snapshot stored under `label`.
    ///
    /// The snapshot itself is kept, so a document can be reset repeatedly.
    pub fn restore(&mut self, label: &str) -> Result<()> {
        let saved = self
            .snapshots
            .get(label)
            .ok_or_else(|| Error::UnknownSnapshot(label.to_string()))?;
        tracing::trace!(label, "Restoring document snapshot");
        self.tree = saved.clone();
        Ok(())
    }

    /// Drop a snapshot. Returns whether it existed.
    pub fn discard_snapshot(&mut self, label: &str) -> bool {
        self.snapshots.remove(label).is_some()
    }

    pub fn snapshot_labels(&self) -> impl Iterator<Item = &str> {
        self.snapshots.keys().map(String::as_str)
    }

    /// Serialize with default options.
    pub fn to_xml_string(&self) -> String {
        serializer::serialize(&self.tree, &SerializeOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_validation() {
        assert!(Identity::new("main").is_ok());
        assert!(Identity::new("a-b_c.d").is_ok());
        assert_eq!(
            Identity::new(""),
            Err(Error::InvalidIdentity(String::new()))
        );
        assert!(Identity::new("two words").is_err());
        assert!(Identity::new("tab\there").is_err());
        assert!("line\nbreak".parse::<Identity>().is_err());
    }

    #[test]
    fn test_identity_is_set_once() {
        let mut doc = Document::parse("<root/>").unwrap();
        assert!(doc.identity().is_none());
        doc.set_identity(Identity::new("one").unwrap()).unwrap();
        let err = doc.set_identity(Identity::new("one").unwrap()).unwrap_err();
        assert_eq!(err, Error::IdentityAlreadySet("one".to_string()));
        assert_eq!(doc.identity().map(Identity::as_str), Some("one"));
    }

    #[test]
    fn test_snapshot_and_restore() {
        let mut doc = Document::parse("<root><a/></root>").unwrap();
        doc.snapshot("clean");

        let root = doc.document_element().unwrap();
        let extra = doc.tree_mut().create_element("b");
        doc.tree_mut().append_child(root, extra).unwrap();
        assert_eq!(doc.to_xml_string(), "<root><a/><b/></root>");

        doc.restore("clean").unwrap();
        assert_eq!(doc.to_xml_string(), "<root><a/></root>");

        // restoring twice works because the snapshot is kept
        doc.tree_mut().remove_children(root);
        doc.restore("clean").unwrap();
        assert_eq!(doc.to_xml_string(), "<root><a/></root>");
    }

    #[test]
    fn test_restore_unknown_snapshot() {
        let mut doc = Document::parse("<root/>").unwrap();
        assert_eq!(
            doc.restore("missing"),
            Err(Error::UnknownSnapshot("missing".to_string()))
        );
    }

    #[test]
    fn test_snapshot_labels_and_discard() {
        let mut doc = Document::parse("<root/>").unwrap();
        doc.snapshot("b");
        doc.snapshot("a");
        assert_eq!(doc.snapshot_labels().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(doc.discard_snapshot("a"));
        assert!(!doc.discard_snapshot("a"));
    }
}
