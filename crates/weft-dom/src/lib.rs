/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Mutable XML/XHTML document trees for weft.
//!
//! This crate provides the tree every weft walker mutates. Nodes live in an
//! arena and are addressed by [`NodeId`]; detaching a node never frees it,
//! so an id held across a mutation stays valid and can be asked whether it
//! is still attached.
//!
//! # Overview
//!
//! The main types are:
//! - [`Tree`]: the node arena with navigation, mutation and attribute access
//! - [`Document`]: a tree plus an optional [`Identity`] and named snapshots
//! - [`SnapshotNodeList`]: an iteration-stable cursor over captured node ids
//!
//! # Example
//!
//! ```rust
//! use weft_dom::{parse, serialize, SerializeOptions};
//!
//! let mut doc = parse(r#"<ul><li id="first">one</li></ul>"#).unwrap();
//! let list = doc.document_element().unwrap();
//!
//! let tree = doc.tree_mut();
//! let item = tree.create_element("li");
//! tree.set_text_content(item, "two");
//! tree.append_child(list, item).unwrap();
//!
//! assert_eq!(
//!     serialize(doc.tree(), &SerializeOptions::default()),
//!     r#"<ul><li id="first">one</li><li>two</li></ul>"#
//! );
//! ```

pub mod document;
pub mod error;
pub mod namespace;
pub mod node_list;
pub mod parser;
pub mod serializer;
pub mod tree;

// Re-export main types
pub use document::{Document, Identity};
pub use error::{Error, Result};
pub use node_list::SnapshotNodeList;
pub use parser::{parse, parse_fragment, parse_tree};
pub use serializer::{SerializeOptions, serialize, serialize_node};
pub use tree::{Attribute, ElementData, NodeData, NodeId, QualName, Tree};
