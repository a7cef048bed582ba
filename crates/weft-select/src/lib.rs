/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Node selection for weft trees.
//!
//! A [`Selector`] turns a context node into a [`Selection`]: the matching
//! nodes in document order, materialized once. Two selectors are provided:
//! - [`XPathSelector`]: an XPath 1.0 subset with namespace prefix registration
//! - [`CssSelector`]: CSS selectors, translated to XPath
//!
//! # Example
//!
//! ```rust
//! use weft_select::{CssSelector, Selector};
//!
//! let doc = weft_dom::parse(
//!     r#"<html xmlns="http://www.w3.org/1999/xhtml"><p class="a b"/><p/></html>"#,
//! )
//! .unwrap();
//! let tree = doc.tree();
//! let selection = CssSelector::new("p.b").select(tree, tree.root()).unwrap();
//! assert_eq!(selection.len(), 1);
//! ```

pub mod css;
pub mod error;
pub mod selection;
pub mod xpath;

use weft_dom::{NodeId, Tree};

pub use css::CssSelector;
pub use error::{Result, SelectorError};
pub use selection::Selection;
pub use xpath::{XNode, XPathSelector, XPathValue};

/// Query capability over a tree.
pub trait Selector {
    /// Run the query with `context` as the context node.
    fn select(&self, tree: &Tree, context: NodeId) -> Result<Selection>;
}

impl<S: Selector + ?Sized> Selector for Box<S> {
    fn select(&self, tree: &Tree, context: NodeId) -> Result<Selection> {
        (**self).select(tree, context)
    }
}

impl<S: Selector + ?Sized> Selector for &S {
    fn select(&self, tree: &Tree, context: NodeId) -> Result<Selection> {
        (**self).select(tree, context)
    }
}
