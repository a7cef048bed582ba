/*
 * transform.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Selector-driven tree transformations.
//!
//! - [`Transformation`] - a selector paired with a function applied to each
//!   match
//! - [`TransformBatch`] - an ordered list of transformations run together
//!
//! A batch runs in insertion order and stops at the first transformation
//! whose selector matches nothing; that transformation and every later one
//! leave the tree alone.
//!
//! # Example
//!
//! ```rust
//! use weft_select::CssSelector;
//! use weft_template::transform::{TransformBatch, Transformation};
//!
//! let mut doc = weft_dom::parse("<ul><li>a</li><li class=\"x\">b</li></ul>").unwrap();
//! let mut batch = TransformBatch::new();
//! batch.push(Transformation::remove(CssSelector::new(".x")));
//! batch.push(Transformation::set_text(CssSelector::new("li"), "z"));
//!
//! let root = doc.tree().root();
//! batch.execute(doc.tree_mut(), root).unwrap();
//! assert_eq!(doc.to_xml_string(), "<ul><li>z</li></ul>");
//! ```

use weft_dom::{NodeId, Tree};
use weft_select::Selector;

use crate::error::TemplateResult;
use crate::snippet::Snippet;

type ApplyFn = Box<dyn Fn(&mut Tree, NodeId) -> TemplateResult<()>>;

/// A selector and the function applied to every node it selects.
///
/// The selection is taken once, before the first call. Each match is
/// visited exactly once even when an earlier call detaches it.
pub struct Transformation {
    name: String,
    selector: Box<dyn Selector>,
    apply: ApplyFn,
}

impl Transformation {
    pub fn new(
        selector: impl Selector + 'static,
        apply: impl Fn(&mut Tree, NodeId) -> TemplateResult<()> + 'static,
    ) -> Self {
        Self {
            name: "custom".to_string(),
            selector: Box::new(selector),
            apply: Box::new(apply),
        }
    }

    /// Name used in log events.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Detach every match.
    pub fn remove(selector: impl Selector + 'static) -> Self {
        Self::new(selector, |tree, node| {
            tree.detach(node);
            Ok(())
        })
        .named("remove")
    }

    /// Replace the content of every match with `text`.
    pub fn set_text(selector: impl Selector + 'static, text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(selector, move |tree, node| {
            tree.set_text_content(node, &text);
            Ok(())
        })
        .named("set-text")
    }

    pub fn set_attribute(
        selector: impl Selector + 'static,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let value = value.into();
        Self::new(selector, move |tree, node| {
            tree.set_attribute(node, &name, &value)?;
            Ok(())
        })
        .named("set-attribute")
    }

    pub fn remove_attribute(selector: impl Selector + 'static, name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(selector, move |tree, node| {
            tree.remove_attribute(node, &name);
            Ok(())
        })
        .named("remove-attribute")
    }

    /// Splice `snippet` at every match.
    pub fn insert_snippet(
        selector: impl Selector + 'static,
        snippet: impl Snippet + 'static,
    ) -> Self {
        Self::new(selector, move |tree, node| {
            snippet.apply_to(tree, node)?;
            Ok(())
        })
        .named("insert-snippet")
    }

    /// Select below `context` and apply to every match. Returns the number
    /// of matches.
    pub fn apply(&self, tree: &mut Tree, context: NodeId) -> TemplateResult<usize> {
        let selection = self.selector.select(tree, context)?;
        for node in &selection {
            (self.apply)(tree, node)?;
        }
        Ok(selection.len())
    }
}

/// Transformations run in insertion order.
#[derive(Default)]
pub struct TransformBatch {
    transformations: Vec<Transformation>,
}

impl TransformBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, transformation: Transformation) {
        self.transformations.push(transformation);
    }

    pub fn extend(&mut self, transformations: impl IntoIterator<Item = Transformation>) {
        self.transformations.extend(transformations);
    }

    pub fn len(&self) -> usize {
        self.transformations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformations.is_empty()
    }

    /// Run the batch. Returns how many transformations were applied.
    pub fn execute(&self, tree: &mut Tree, context: NodeId) -> TemplateResult<usize> {
        process(tree, context, &self.transformations)
    }

    pub fn names(&self) -> Vec<&str> {
        self.transformations.iter().map(|t| t.name()).collect()
    }
}

/// Run `transformations` in order, stopping at the first empty selection.
/// Returns how many transformations were applied.
pub fn process(
    tree: &mut Tree,
    context: NodeId,
    transformations: &[Transformation],
) -> TemplateResult<usize> {
    for (index, transformation) in transformations.iter().enumerate() {
        let matched = transformation.apply(tree, context)?;
        if matched == 0 {
            tracing::debug!(
                transform = transformation.name(),
                skipped = transformations.len() - index,
                "Empty selection, stopping batch"
            );
            return Ok(index);
        }
        tracing::debug!(transform = transformation.name(), matched, "Applied transform");
    }
    Ok(transformations.len())
}
