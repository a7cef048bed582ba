/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for rendering, merging, snippets and loading.

use std::path::PathBuf;

use thiserror::Error;
use weft_select::SelectorError;

/// Errors raised while binding a view model into a tree.
#[derive(Debug, Error)]
pub enum ViewModelError {
    /// A `prefix` attribute that is not `name: member`.
    #[error("Invalid prefix declaration {value:?}: expected \"name: member\"")]
    PrefixSyntax { value: String },

    #[error("Cannot resolve member '{member}' for prefix '{prefix}'")]
    PrefixResolvingFailed { prefix: String, member: String },

    #[error("Member '{member}' for prefix '{prefix}' is a {kind}, not an object")]
    PrefixNotAnObject {
        prefix: String,
        member: String,
        kind: &'static str,
    },

    #[error("No model is bound to prefix '{prefix}'")]
    NoModelForPrefix { prefix: String },

    #[error("Cannot resolve resource '{resource}'")]
    ResourceResolvingFailed { resource: String },

    #[error("Resource '{resource}' is a {kind}, not an object")]
    ResourceNotAnObject {
        resource: String,
        kind: &'static str,
    },

    #[error("Cannot resolve property '{property}'")]
    ResolvingPropertyFailed { property: String },

    #[error("Property '{property}' resolved to a {kind}, which cannot be bound")]
    UnsupportedTypeForProperty {
        property: String,
        kind: &'static str,
    },

    /// An object bound through a `typeof` template has no type name.
    #[error("Object bound to property '{property}' does not report a type")]
    MissingTypeOf { property: String },

    #[error("No template for property '{property}' with typeof '{type_name}'")]
    NoMatch { property: String, type_name: String },

    #[error("Property '{property}' cannot repeat the root element")]
    IterableForRootElement { property: String },

    /// The text accessor of a bound object did not return a string.
    #[error("Text of the bound object must be a string, got a {kind}")]
    StringRequired { kind: &'static str },

    #[error("Attribute '{attribute}' cannot be set from a {kind}")]
    WrongTypeForAttribute {
        attribute: String,
        kind: &'static str,
    },

    /// The top-level model is not an object.
    #[error("The view model must be an object, got a {kind}")]
    ModelNotAnObject { kind: &'static str },

    #[error("Maximum render depth of {max_depth} exceeded")]
    DepthLimitExceeded { max_depth: usize },

    #[error(transparent)]
    Tree(#[from] weft_dom::Error),
}

/// Errors raised by the document merger.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The target tree has no root element.
    #[error("Cannot merge into an empty document")]
    EmptyDocument,

    #[error("Merge list is empty")]
    EmptyList,

    /// Two merge targets share one id.
    #[error("Duplicate merge target id '{id}'")]
    DuplicateId { id: String },

    /// `MergeList::add` needs a document with an identity.
    #[error("Document has no identity to merge under")]
    MissingIdentity,

    #[error("Maximum merge depth of {max_depth} exceeded")]
    DepthLimitExceeded { max_depth: usize },

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error(transparent)]
    Tree(#[from] weft_dom::Error),
}

/// Errors raised by snippets, assets and id-keyed collections.
#[derive(Debug, Error)]
pub enum SnippetError {
    #[error("No {kind} registered for id '{id}'")]
    UnknownId { kind: &'static str, id: String },

    /// A container snippet whose root is outside the container namespace.
    #[error("Snippet root must be in the {expected} namespace, found {found:?}")]
    WrongNamespace {
        expected: &'static str,
        found: Option<String>,
    },

    #[error("Snippet container is empty")]
    EmptySnippet,

    #[error("Maximum snippet depth of {max_depth} exceeded")]
    DepthLimitExceeded { max_depth: usize },

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error(transparent)]
    Tree(#[from] weft_dom::Error),
}

/// Errors raised while reading templates, snippets and models from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported media type for {}", path.display())]
    UnsupportedMediaType { path: PathBuf },

    #[error("Cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: weft_dom::Error,
    },

    #[error("Invalid JSON model in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot walk snippet directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Snippet(#[from] SnippetError),
}

/// Any error raised by the template pipeline.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error(transparent)]
    ViewModel(#[from] ViewModelError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Snippet(#[from] SnippetError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error(transparent)]
    Tree(#[from] weft_dom::Error),
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;
