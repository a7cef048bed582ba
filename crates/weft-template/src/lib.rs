/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template rendering for weft documents.
//!
//! A template is a well-formed XHTML (or other XML) document. This crate
//! fills it in several independent passes:
//!
//! - [`viewmodel`]: binds a view model through `prefix`, `resource`,
//!   `property` and `typeof` attributes
//! - [`merger`]: splices subordinate documents at elements with matching ids
//! - [`snippet`]: splices reusable content and asset references by id
//! - [`transform`]: applies functions to selector matches
//! - [`formdata`]: fills form controls from submitted values
//!
//! [`Template`] bundles a document with its options and exposes every pass.
//!
//! # Example
//!
//! ```rust
//! use weft_template::{Template, binding::json_to_value};
//!
//! let mut template = Template::parse(
//!     r#"<article><h1 property="title">Title</h1><p property="draft">Draft</p></article>"#,
//! )
//! .unwrap();
//! let model = json_to_value(serde_json::json!({ "title": "Weft", "draft": false }));
//! template.apply_view_model(&model).unwrap();
//!
//! assert_eq!(
//!     template.render(),
//!     r#"<article><h1 property="title">Weft</h1></article>"#
//! );
//! ```

pub mod binding;
pub mod error;
pub mod formdata;
pub mod loader;
pub mod merger;
pub mod options;
pub mod snippet;
pub mod template;
pub mod transform;
pub mod viewmodel;

pub use binding::{Binding, JsonModel, ObjectModel, Signal, Value};
pub use error::{
    LoadError, MergeError, SnippetError, TemplateError, TemplateResult, ViewModelError,
};
pub use formdata::FormData;
pub use merger::MergeList;
pub use options::RenderOptions;
pub use snippet::{
    Asset, AssetList, ContainerSnippet, ContentSnippet, IdCollection, Snippet, SnippetCollection,
};
pub use template::Template;
pub use transform::{TransformBatch, Transformation};
