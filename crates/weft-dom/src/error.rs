/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for tree construction, parsing and document bookkeeping.

use thiserror::Error;

/// Result type alias for weft-dom operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the tree, the parser and [`Document`](crate::Document).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed markup. Line and column are 1-based.
    #[error("XML syntax error at line {line}, column {column}: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
        /// Byte offset into the parsed source.
        offset: usize,
    },

    /// The markup contained no root element.
    #[error("Empty XML document: no root element found")]
    EmptyDocument,

    /// An identity string that is not a legal HTML5 `id` value.
    #[error("Invalid identity {0:?}: must be non-empty and contain no whitespace")]
    InvalidIdentity(String),

    /// The document identity can only be assigned once.
    #[error("Document identity is already set to {0:?}")]
    IdentityAlreadySet(String),

    /// Restoring a snapshot label that was never taken.
    #[error("Unknown snapshot: {0}")]
    UnknownSnapshot(String),

    /// A node was not present in a [`SnapshotNodeList`](crate::SnapshotNodeList).
    #[error("Node not found in node list")]
    NodeNotFound,

    /// Inserting a node below itself would create a cycle.
    #[error("Cannot insert a node into itself or one of its descendants")]
    HierarchyRequest,

    /// The reference node of an insertion is not a child of the given parent.
    #[error("Reference node is not a child of the parent node")]
    NotAChild,

    /// The operation needs the node to have a parent.
    #[error("Node is not attached to a parent")]
    Detached,

    /// The operation is only defined for element nodes.
    #[error("Node is not an element")]
    NotAnElement,
}

impl Error {
    /// Build a parse error, computing line and column from a byte offset.
    pub fn parse_at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_column(source, offset);
        Error::Parse {
            message: message.into(),
            line,
            column,
            offset,
        }
    }
}

/// Translate a byte offset into a 1-based (line, column) pair.
///
/// Columns count characters, not bytes.
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut end = offset.min(source.len());
    while !source.is_char_boundary(end) {
        end -= 1;
    }
    let before = &source[..end];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |p| p + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column_first_line() {
        assert_eq!(line_column("<root/>", 0), (1, 1));
        assert_eq!(line_column("<root/>", 5), (1, 6));
    }

    #[test]
    fn test_line_column_later_lines() {
        let src = "<a>\n  <b>\n</a>";
        assert_eq!(line_column(src, 4), (2, 1));
        assert_eq!(line_column(src, 6), (2, 3));
        assert_eq!(line_column(src, 10), (3, 1));
    }

    #[test]
    fn test_line_column_clamps_offset() {
        assert_eq!(line_column("ab", 99), (1, 3));
    }

    #[test]
    fn test_parse_error_display() {
        let err = Error::parse_at("<a>\n<b", 5, "unexpected end");
        assert_eq!(
            err.to_string(),
            "XML syntax error at line 2, column 2: unexpected end"
        );
    }
}
