/*
 * node_list.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Iteration-stable node lists.
//!
//! A [`SnapshotNodeList`] copies node ids once, at construction, and then
//! walks that copy. Tree walkers that replace, remove or multiply nodes
//! while iterating use it so that they advance over what the tree looked
//! like before the mutation instead of over the live structure.

use crate::error::{Error, Result};
use crate::tree::{NodeId, Tree};

/// Cursor over a snapshot of node ids.
#[derive(Debug, Clone, Default)]
pub struct SnapshotNodeList {
    nodes: Vec<NodeId>,
    /// Index of the entry returned by the next call to `next`.
    position: usize,
}

impl SnapshotNodeList {
    /// Snapshot an arbitrary sequence of nodes.
    pub fn new(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
            position: 0,
        }
    }

    /// Snapshot the current children of `parent`.
    pub fn from_children(tree: &Tree, parent: NodeId) -> Self {
        Self::new(tree.children(parent))
    }

    /// Snapshot the current element children of `parent`.
    pub fn from_child_elements(tree: &Tree, parent: NodeId) -> Self {
        Self::new(tree.child_elements(parent))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.position < self.nodes.len()
    }

    /// Identity membership, not structural equality.
    pub fn has_node(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Drop `node` from the snapshot (the tree is not touched).
    ///
    /// When the node was already passed, the cursor moves back one slot so
    /// the entry after it is not skipped.
    pub fn remove_node(&mut self, node: NodeId) -> Result<()> {
        let index = self
            .nodes
            .iter()
            .position(|n| *n == node)
            .ok_or(Error::NodeNotFound)?;
        self.nodes.remove(index);
        if index < self.position {
            self.position -= 1;
        }
        Ok(())
    }

    /// Advance to the next entry that is still a descendant of `context`.
    pub fn next_within(&mut self, tree: &Tree, context: NodeId) -> Option<NodeId> {
        for node in self.by_ref() {
            if tree.is_ancestor(context, node) {
                return Some(node);
            }
        }
        None
    }

    /// Move the cursor back to the start.
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// The snapshot contents, independent of the cursor.
    pub fn as_slice(&self) -> &[NodeId] {
        &self.nodes
    }
}

impl Iterator for SnapshotNodeList {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.nodes.get(self.position).copied()?;
        self.position += 1;
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> (Tree, NodeId, [NodeId; 3]) {
        let mut tree = Tree::new();
        let parent = tree.create_element("p");
        tree.append_child(tree.root(), parent).unwrap();
        let nodes = [
            tree.create_element("a"),
            tree.create_element("b"),
            tree.create_element("c"),
        ];
        for n in nodes {
            tree.append_child(parent, n).unwrap();
        }
        (tree, parent, nodes)
    }

    #[test]
    fn test_snapshot_ignores_later_insertions() {
        let (mut tree, parent, [a, b, c]) = abc();
        let mut list = SnapshotNodeList::from_children(&tree, parent);
        let extra = tree.create_element("x");
        tree.append_child(parent, extra).unwrap();
        let seen: Vec<_> = list.by_ref().collect();
        assert_eq!(seen, vec![a, b, c]);
        assert!(!list.has_next());
    }

    #[test]
    fn test_removal_ahead_of_cursor() {
        let (mut tree, parent, [a, b, c]) = abc();
        let mut list = SnapshotNodeList::from_children(&tree, parent);
        assert_eq!(list.next(), Some(a));
        tree.detach(b);
        list.remove_node(b).unwrap();
        assert_eq!(list.next(), Some(c));
        assert_eq!(list.next(), None);
    }

    #[test]
    fn test_removal_behind_cursor_does_not_skip() {
        let (tree, parent, [a, b, c]) = abc();
        let mut list = SnapshotNodeList::from_children(&tree, parent);
        assert_eq!(list.next(), Some(a));
        assert_eq!(list.next(), Some(b));
        list.remove_node(a).unwrap();
        assert_eq!(list.next(), Some(c));
    }

    #[test]
    fn test_remove_unknown_node() {
        let (mut tree, parent, _) = abc();
        let mut list = SnapshotNodeList::from_children(&tree, parent);
        let stranger = tree.create_element("z");
        assert_eq!(list.remove_node(stranger), Err(Error::NodeNotFound));
    }

    #[test]
    fn test_next_within_skips_detached_nodes() {
        let (mut tree, parent, [a, b, c]) = abc();
        let mut list = SnapshotNodeList::from_children(&tree, parent);
        assert_eq!(list.next_within(&tree, parent), Some(a));
        tree.detach(b);
        assert_eq!(list.next_within(&tree, parent), Some(c));
        assert_eq!(list.next_within(&tree, parent), None);
    }

    #[test]
    fn test_membership_is_identity() {
        let (mut tree, parent, [a, ..]) = abc();
        let list = SnapshotNodeList::from_children(&tree, parent);
        let twin = tree.clone_node(a);
        assert!(list.has_node(a));
        assert!(!list.has_node(twin));
        assert_eq!(list.len(), 3);
    }
}
