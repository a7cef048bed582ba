/*
 * namespace.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Reserved namespace identifiers.
//!
//! These are markers, not configuration: the merger and the snippet
//! processor recognize [`CONTAINER`] to unwrap fragments, and [`XHTML`]
//! is the implicit content namespace of rendered pages.

/// The XHTML namespace.
pub const XHTML: &str = "http://www.w3.org/1999/xhtml";

/// The namespace bound to the reserved `xml` prefix.
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

/// The namespace of `xmlns` declarations.
pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";

/// Container namespace for mergeable documents and snippets.
///
/// An element in this namespace is a wrapper only; its children are
/// spliced and the element itself is dropped.
pub const CONTAINER: &str = "urn:weft:container";

/// HTML elements that never have content and serialize self-closed.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Check whether `local` names an HTML void element.
pub fn is_void_element(local: &str) -> bool {
    VOID_ELEMENTS.contains(&local)
}
