/*
 * ast.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Compiled XPath expressions.
//!
//! Namespace prefixes are resolved during parsing, so name tests hold
//! URIs and evaluation never needs the prefix table.

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    Arithmetic(ArithmeticOp, Box<Expr>, Box<Expr>),
    Negate(Box<Expr>),
    Union(Box<Expr>, Box<Expr>),
    Path(LocationPath),
    Literal(String),
    Number(f64),
    Call(Function, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
}

/// Where a location path starts.
#[derive(Debug, Clone, PartialEq)]
pub enum PathStart {
    /// `/...`: the root of the context node's tree.
    Root,
    /// A relative path.
    Context,
    /// A filter expression such as `(a | b)[1]`.
    Filter {
        primary: Box<Expr>,
        predicates: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    pub start: PathStart,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    /// The step `//` abbreviates.
    pub fn descendant_or_self_node() -> Self {
        Step {
            axis: Axis::DescendantOrSelf,
            test: NodeTest::Node,
            predicates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfAxis,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Attribute,
}

impl Axis {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "self" => Axis::SelfAxis,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            "following-sibling" => Axis::FollowingSibling,
            "preceding-sibling" => Axis::PrecedingSibling,
            "attribute" => Axis::Attribute,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// `*`
    Any,
    /// `name` or `prefix:name`, prefix already resolved.
    Name {
        namespace: Option<String>,
        local: String,
    },
    /// `prefix:*`
    Namespace(String),
    /// `node()`
    Node,
    /// `text()`
    Text,
    /// `comment()`
    Comment,
}

/// Supported core functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Not,
    True,
    False,
    Count,
    Position,
    Last,
    String,
    Concat,
    Contains,
    StartsWith,
    Substring,
    NormalizeSpace,
    StringLength,
    LocalName,
    Name,
    Boolean,
    Number,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "not" => Function::Not,
            "true" => Function::True,
            "false" => Function::False,
            "count" => Function::Count,
            "position" => Function::Position,
            "last" => Function::Last,
            "string" => Function::String,
            "concat" => Function::Concat,
            "contains" => Function::Contains,
            "starts-with" => Function::StartsWith,
            "substring" => Function::Substring,
            "normalize-space" => Function::NormalizeSpace,
            "string-length" => Function::StringLength,
            "local-name" => Function::LocalName,
            "name" => Function::Name,
            "boolean" => Function::Boolean,
            "number" => Function::Number,
            _ => return None,
        })
    }

    /// Accepted argument counts, inclusive.
    pub fn arity(self) -> (usize, usize) {
        match self {
            Function::True | Function::False | Function::Position | Function::Last => (0, 0),
            Function::Not | Function::Count | Function::Boolean => (1, 1),
            Function::String
            | Function::NormalizeSpace
            | Function::StringLength
            | Function::LocalName
            | Function::Name
            | Function::Number => (0, 1),
            Function::Contains | Function::StartsWith => (2, 2),
            Function::Substring => (2, 3),
            Function::Concat => (2, usize::MAX),
        }
    }
}
