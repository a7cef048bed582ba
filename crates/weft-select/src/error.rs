/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for selector compilation and evaluation.

use thiserror::Error;

/// Result type alias for selector operations.
pub type Result<T> = std::result::Result<T, SelectorError>;

/// Errors raised while compiling or running a selector.
///
/// Every variant carries the query text it was raised for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// Malformed XPath. `column` is 1-based and counts characters.
    #[error("Invalid XPath expression {query:?} at column {column}: {message}")]
    Syntax {
        message: String,
        query: String,
        column: usize,
    },

    #[error("Unknown namespace prefix '{prefix}' in {query:?}")]
    UnknownPrefix { prefix: String, query: String },

    #[error("Unknown XPath function '{name}' in {query:?}")]
    UnknownFunction { name: String, query: String },

    /// The expression evaluated to a string, number or boolean, or to
    /// attribute nodes.
    #[error("XPath expression {query:?} does not select tree nodes")]
    NotANodeSet { query: String },

    /// Malformed or unsupported CSS selector.
    #[error("Invalid CSS selector {selector:?} at column {column}: {message}")]
    CssSyntax {
        message: String,
        selector: String,
        column: usize,
    },
}

impl SelectorError {
    /// Build a syntax error from a byte offset into `query`.
    pub(crate) fn syntax(query: &str, offset: usize, message: impl Into<String>) -> Self {
        SelectorError::Syntax {
            message: message.into(),
            query: query.to_string(),
            column: column_of(query, offset),
        }
    }

    pub(crate) fn css(selector: &str, offset: usize, message: impl Into<String>) -> Self {
        SelectorError::CssSyntax {
            message: message.into(),
            selector: selector.to_string(),
            column: column_of(selector, offset),
        }
    }
}

fn column_of(text: &str, offset: usize) -> usize {
    let mut end = offset.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].chars().count() + 1
}
