/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! XPath 1.0 subset.
//!
//! # Submodules
//!
//! - [`lexer`]: tokenizer
//! - [`ast`]: compiled expression types
//! - [`parser`]: recursive descent parser, resolves namespace prefixes
//! - [`eval`]: evaluator over a [`Tree`]

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

use std::collections::BTreeMap;

use weft_dom::{NodeId, Tree, namespace};

pub use eval::{XNode, XPathValue};

use crate::error::{Result, SelectorError};
use crate::{Selection, Selector};

/// Selector backed by an XPath expression.
///
/// Unprefixed name tests match elements in no namespace. Register a prefix
/// to address namespaced elements; `html` is bound to the XHTML namespace
/// unless registered otherwise.
///
/// # Example
///
/// ```rust
/// use weft_select::{Selector, XPathSelector};
///
/// let doc = weft_dom::parse(r#"<ul><li id="a"/><li/></ul>"#).unwrap();
/// let selection = XPathSelector::new("//li[@id]")
///     .select(doc.tree(), doc.tree().root())
///     .unwrap();
/// assert_eq!(selection.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPathSelector {
    query: String,
    namespaces: BTreeMap<String, String>,
}

impl XPathSelector {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            namespaces: BTreeMap::new(),
        }
    }

    /// Bind `prefix` to `uri` for this selector.
    pub fn register_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.namespaces.insert(prefix.into(), uri.into());
    }

    /// Builder form of [`XPathSelector::register_namespace`].
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.register_namespace(prefix, uri);
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    fn namespace_table(&self) -> BTreeMap<String, String> {
        let mut table = self.namespaces.clone();
        table
            .entry("html".to_string())
            .or_insert_with(|| namespace::XHTML.to_string());
        table
    }

    /// Check the query without running it.
    pub fn compile(&self) -> Result<ast::Expr> {
        parser::parse(&self.query, &self.namespace_table())
    }

    /// Evaluate to any XPath value, not only node sets.
    pub fn evaluate(&self, tree: &Tree, context: NodeId) -> Result<XPathValue> {
        let expr = self.compile()?;
        eval::Evaluator::new(tree, context, &self.query).evaluate(&expr, context)
    }

    /// String value of the first node in `value`, or the value converted
    /// to a string.
    pub fn string_value(&self, tree: &Tree, context: NodeId, value: &XPathValue) -> String {
        let evaluator = eval::Evaluator::new(tree, context, &self.query);
        match value {
            XPathValue::Nodes(nodes) => nodes
                .first()
                .map(|n| evaluator.string_value(*n))
                .unwrap_or_default(),
            XPathValue::Boolean(b) => b.to_string(),
            XPathValue::Number(n) => n.to_string(),
            XPathValue::String(s) => s.clone(),
        }
    }
}

impl Selector for XPathSelector {
    fn select(&self, tree: &Tree, context: NodeId) -> Result<Selection> {
        let value = self.evaluate(tree, context)?;
        let XPathValue::Nodes(nodes) = value else {
            return Err(SelectorError::NotANodeSet {
                query: self.query.clone(),
            });
        };
        let ids = nodes
            .into_iter()
            .map(|n| match n {
                XNode::Node(id) => Ok(id),
                XNode::Attribute(..) => Err(SelectorError::NotANodeSet {
                    query: self.query.clone(),
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::trace!(query = %self.query, matched = ids.len(), "XPath selection");
        Ok(Selection::new(ids))
    }
}
