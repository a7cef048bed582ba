/*
 * template.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The [`Template`] facade: a document plus the options every operation
//! on it shares.

use std::path::Path;

use weft_dom::{Document, NodeId, SerializeOptions, serialize};

use crate::binding::Value;
use crate::error::{TemplateError, TemplateResult};
use crate::formdata::{self, FormData};
use crate::loader;
use crate::merger::{self, MergeList};
use crate::options::RenderOptions;
use crate::snippet::{self, AssetList, SnippetCollection};
use crate::transform::{self, Transformation};
use crate::viewmodel;

/// A document being rendered.
///
/// # Example
///
/// ```rust
/// use weft_template::Template;
/// use weft_template::binding::ObjectModel;
///
/// let mut template = Template::parse(
///     r#"<ul><li property="items">item</li></ul>"#,
/// )
/// .unwrap();
/// let model = ObjectModel::new().field("items", vec!["a", "b"]).into_value();
/// template.apply_view_model(&model).unwrap();
///
/// assert_eq!(
///     template.render(),
///     r#"<ul><li property="items">a</li><li property="items">b</li></ul>"#
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct Template {
    document: Document,
    options: RenderOptions,
    output: SerializeOptions,
}

impl Template {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            options: RenderOptions::default(),
            output: SerializeOptions::default(),
        }
    }

    pub fn parse(markup: &str) -> TemplateResult<Self> {
        Ok(Self::new(Document::parse(markup)?))
    }

    pub fn load(path: &Path) -> TemplateResult<Self> {
        Ok(Self::new(loader::load_document(path)?))
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_output(mut self, output: SerializeOptions) -> Self {
        self.output = output;
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    fn root_element(&self) -> TemplateResult<NodeId> {
        self.document
            .document_element()
            .ok_or(TemplateError::Tree(weft_dom::Error::EmptyDocument))
    }

    pub fn apply_view_model(&mut self, model: &Value) -> TemplateResult<()> {
        let root = self.root_element()?;
        viewmodel::render(self.document.tree_mut(), root, model, &self.options)?;
        Ok(())
    }

    pub fn apply_snippets(&mut self, snippets: &SnippetCollection) -> TemplateResult<()> {
        let root = self.root_element()?;
        snippet::apply(self.document.tree_mut(), root, snippets, &self.options)?;
        Ok(())
    }

    pub fn apply_assets(&mut self, assets: &AssetList) -> TemplateResult<()> {
        let root = self.root_element()?;
        snippet::apply(self.document.tree_mut(), root, assets, &self.options)?;
        Ok(())
    }

    pub fn merge(&mut self, list: &MergeList) -> TemplateResult<()> {
        merger::merge(self.document.tree_mut(), list, &self.options)?;
        Ok(())
    }

    /// Returns how many transformations were applied.
    pub fn apply_transformations(
        &mut self,
        transformations: &[Transformation],
    ) -> TemplateResult<usize> {
        let root = self.document.tree().root();
        transform::process(self.document.tree_mut(), root, transformations)
    }

    /// Returns how many form controls were filled.
    pub fn apply_form_data(&mut self, data: &FormData) -> TemplateResult<usize> {
        let root = self.document.tree().root();
        formdata::fill(self.document.tree_mut(), root, data)
    }

    pub fn snapshot(&mut self, label: impl Into<String>) {
        self.document.snapshot(label);
    }

    pub fn restore(&mut self, label: &str) -> TemplateResult<()> {
        self.document.restore(label)?;
        Ok(())
    }

    /// Serialize with the output options.
    pub fn render(&self) -> String {
        serialize(self.document.tree(), &self.output)
    }
}
