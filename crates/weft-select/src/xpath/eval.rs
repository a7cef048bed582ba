/*
 * eval.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Expression evaluation against a [`Tree`].

use std::collections::HashMap;

use weft_dom::{NodeData, NodeId, Tree};

use super::ast::{
    ArithmeticOp, Axis, CompareOp, Expr, Function, LocationPath, NodeTest, PathStart, Step,
};
use crate::error::{Result, SelectorError};

/// A node as XPath sees it: tree nodes plus attributes, which are not
/// nodes of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XNode {
    Node(NodeId),
    /// Owner element and attribute index.
    Attribute(NodeId, usize),
}

/// Result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathValue {
    /// Nodes in document order, without duplicates.
    Nodes(Vec<XNode>),
    Boolean(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, Copy)]
struct Context {
    node: XNode,
    position: usize,
    size: usize,
}

/// Evaluates compiled expressions within one connected part of a tree.
pub struct Evaluator<'t> {
    tree: &'t Tree,
    query: &'t str,
    /// Topmost ancestor of the context node; `/` resolves to it.
    top: NodeId,
    /// Preorder position of every node below `top`.
    order: HashMap<NodeId, usize>,
}

impl<'t> Evaluator<'t> {
    pub fn new(tree: &'t Tree, context: NodeId, query: &'t str) -> Self {
        let top = tree.ancestors(context).last().copied().unwrap_or(context);
        let order = std::iter::once(top)
            .chain(tree.descendants(top))
            .enumerate()
            .map(|(i, n)| (n, i))
            .collect();
        Self {
            tree,
            query,
            top,
            order,
        }
    }

    pub fn evaluate(&self, expr: &Expr, context: NodeId) -> Result<XPathValue> {
        self.eval(
            expr,
            Context {
                node: XNode::Node(context),
                position: 1,
                size: 1,
            },
        )
    }

    fn not_nodes(&self) -> SelectorError {
        SelectorError::NotANodeSet {
            query: self.query.to_string(),
        }
    }

    fn eval(&self, expr: &Expr, ctx: Context) -> Result<XPathValue> {
        Ok(match expr {
            Expr::Or(l, r) => XPathValue::Boolean(
                self.to_boolean(&self.eval(l, ctx)?) || self.to_boolean(&self.eval(r, ctx)?),
            ),
            Expr::And(l, r) => XPathValue::Boolean(
                self.to_boolean(&self.eval(l, ctx)?) && self.to_boolean(&self.eval(r, ctx)?),
            ),
            Expr::Compare(op, l, r) => {
                let left = self.eval(l, ctx)?;
                let right = self.eval(r, ctx)?;
                XPathValue::Boolean(self.compare(*op, &left, &right))
            }
            Expr::Arithmetic(op, l, r) => {
                let left = self.to_number(&self.eval(l, ctx)?);
                let right = self.to_number(&self.eval(r, ctx)?);
                XPathValue::Number(match op {
                    ArithmeticOp::Add => left + right,
                    ArithmeticOp::Sub => left - right,
                })
            }
            Expr::Negate(inner) => XPathValue::Number(-self.to_number(&self.eval(inner, ctx)?)),
            Expr::Union(l, r) => {
                let mut nodes = self.nodes_of(self.eval(l, ctx)?)?;
                nodes.extend(self.nodes_of(self.eval(r, ctx)?)?);
                XPathValue::Nodes(self.document_order(nodes))
            }
            Expr::Path(path) => XPathValue::Nodes(self.eval_path(path, ctx)?),
            Expr::Literal(s) => XPathValue::String(s.clone()),
            Expr::Number(n) => XPathValue::Number(*n),
            Expr::Call(function, args) => self.call(*function, args, ctx)?,
        })
    }

    fn nodes_of(&self, value: XPathValue) -> Result<Vec<XNode>> {
        match value {
            XPathValue::Nodes(nodes) => Ok(nodes),
            _ => Err(self.not_nodes()),
        }
    }

    fn eval_path(&self, path: &LocationPath, ctx: Context) -> Result<Vec<XNode>> {
        let mut current = match &path.start {
            PathStart::Root => vec![XNode::Node(self.top)],
            PathStart::Context => vec![ctx.node],
            PathStart::Filter {
                primary,
                predicates,
            } => {
                let nodes = self.nodes_of(self.eval(primary, ctx)?)?;
                let nodes = self.document_order(nodes);
                self.filter(nodes, predicates)?
            }
        };
        for step in &path.steps {
            let mut next = Vec::new();
            for node in current {
                next.extend(self.apply_step(node, step)?);
            }
            current = self.document_order(next);
        }
        Ok(current)
    }

    fn apply_step(&self, node: XNode, step: &Step) -> Result<Vec<XNode>> {
        let candidates = self
            .axis(node, step.axis)
            .into_iter()
            .filter(|x| self.test(*x, step.axis, &step.test))
            .collect();
        self.filter(candidates, &step.predicates)
    }

    /// Apply predicates in order; positions follow the order of `nodes`.
    fn filter(&self, mut nodes: Vec<XNode>, predicates: &[Expr]) -> Result<Vec<XNode>> {
        for predicate in predicates {
            let size = nodes.len();
            let mut kept = Vec::with_capacity(size);
            for (i, node) in nodes.into_iter().enumerate() {
                let ctx = Context {
                    node,
                    position: i + 1,
                    size,
                };
                let keep = match self.eval(predicate, ctx)? {
                    XPathValue::Number(n) => (i + 1) as f64 == n,
                    other => self.to_boolean(&other),
                };
                if keep {
                    kept.push(node);
                }
            }
            nodes = kept;
        }
        Ok(nodes)
    }

    /// Nodes along `axis`, reverse axes nearest first.
    fn axis(&self, node: XNode, axis: Axis) -> Vec<XNode> {
        let tree = self.tree;
        let wrap = |ids: Vec<NodeId>| ids.into_iter().map(XNode::Node).collect::<Vec<_>>();
        match node {
            XNode::Node(n) => match axis {
                Axis::Child => wrap(tree.children(n)),
                Axis::Descendant => wrap(tree.descendants(n)),
                Axis::DescendantOrSelf => {
                    let mut out = vec![node];
                    out.extend(wrap(tree.descendants(n)));
                    out
                }
                Axis::SelfAxis => vec![node],
                Axis::Parent => wrap(tree.parent(n).into_iter().collect()),
                Axis::Ancestor => wrap(tree.ancestors(n)),
                Axis::AncestorOrSelf => {
                    let mut out = vec![node];
                    out.extend(wrap(tree.ancestors(n)));
                    out
                }
                Axis::FollowingSibling => wrap(tree.following_siblings(n)),
                Axis::PrecedingSibling => wrap(tree.preceding_siblings(n)),
                Axis::Attribute => tree
                    .attributes(n)
                    .iter()
                    .enumerate()
                    .filter(|(_, a)| !a.is_namespace_declaration())
                    .map(|(i, _)| XNode::Attribute(n, i))
                    .collect(),
            },
            XNode::Attribute(owner, _) => match axis {
                Axis::SelfAxis => vec![node],
                Axis::Parent => vec![XNode::Node(owner)],
                Axis::Ancestor => {
                    let mut out = vec![XNode::Node(owner)];
                    out.extend(wrap(tree.ancestors(owner)));
                    out
                }
                Axis::AncestorOrSelf => {
                    let mut out = vec![node, XNode::Node(owner)];
                    out.extend(wrap(tree.ancestors(owner)));
                    out
                }
                _ => Vec::new(),
            },
        }
    }

    fn test(&self, node: XNode, axis: Axis, test: &NodeTest) -> bool {
        let principal_attribute = axis == Axis::Attribute;
        match node {
            XNode::Node(n) => match test {
                NodeTest::Node => true,
                NodeTest::Text => self.tree.is_text(n),
                NodeTest::Comment => matches!(self.tree.data(n), NodeData::Comment(_)),
                _ if principal_attribute => false,
                NodeTest::Any => self.tree.is_element(n),
                NodeTest::Name { namespace, local } => self.tree.element(n).is_some_and(|e| {
                    e.name.local == *local && e.name.namespace.as_deref() == namespace.as_deref()
                }),
                NodeTest::Namespace(uri) => self.tree.namespace_uri(n) == Some(uri.as_str()),
            },
            XNode::Attribute(owner, i) => {
                let Some(attr) = self.tree.attributes(owner).get(i) else {
                    return false;
                };
                match test {
                    NodeTest::Node => true,
                    NodeTest::Text | NodeTest::Comment => false,
                    _ if !principal_attribute => false,
                    NodeTest::Any => true,
                    NodeTest::Name { namespace, local } => {
                        attr.name.local == *local
                            && attr.name.namespace.as_deref() == namespace.as_deref()
                    }
                    NodeTest::Namespace(uri) => {
                        attr.name.namespace.as_deref() == Some(uri.as_str())
                    }
                }
            }
        }
    }

    fn order_key(&self, node: XNode) -> (usize, usize) {
        match node {
            XNode::Node(n) => (self.order.get(&n).copied().unwrap_or(usize::MAX), 0),
            XNode::Attribute(n, i) => (self.order.get(&n).copied().unwrap_or(usize::MAX), i + 1),
        }
    }

    fn document_order(&self, mut nodes: Vec<XNode>) -> Vec<XNode> {
        nodes.sort_by_key(|n| self.order_key(*n));
        nodes.dedup();
        nodes
    }

    // ---- conversions ----------------------------------------------------

    pub fn string_value(&self, node: XNode) -> String {
        match node {
            XNode::Node(n) => match self.tree.data(n) {
                NodeData::Text(t) | NodeData::Comment(t) => t.clone(),
                NodeData::ProcessingInstruction { data, .. } => data.clone(),
                NodeData::Doctype(_) => String::new(),
                NodeData::Document | NodeData::Fragment | NodeData::Element(_) => {
                    self.tree.text_content(n)
                }
            },
            XNode::Attribute(owner, i) => self
                .tree
                .attributes(owner)
                .get(i)
                .map(|a| a.value.clone())
                .unwrap_or_default(),
        }
    }

    fn to_boolean(&self, value: &XPathValue) -> bool {
        match value {
            XPathValue::Nodes(nodes) => !nodes.is_empty(),
            XPathValue::Boolean(b) => *b,
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::String(s) => !s.is_empty(),
        }
    }

    fn to_number(&self, value: &XPathValue) -> f64 {
        match value {
            XPathValue::Nodes(_) => str_to_number(&self.to_string(value)),
            XPathValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => str_to_number(s),
        }
    }

    fn to_string(&self, value: &XPathValue) -> String {
        match value {
            XPathValue::Nodes(nodes) => nodes
                .first()
                .map(|n| self.string_value(*n))
                .unwrap_or_default(),
            XPathValue::Boolean(b) => b.to_string(),
            XPathValue::Number(n) => format_number(*n),
            XPathValue::String(s) => s.clone(),
        }
    }

    // ---- comparisons ----------------------------------------------------

    fn compare(&self, op: CompareOp, left: &XPathValue, right: &XPathValue) -> bool {
        match (left, right) {
            (XPathValue::Nodes(a), XPathValue::Nodes(b)) => {
                let right_strings: Vec<String> = b.iter().map(|y| self.string_value(*y)).collect();
                a.iter().any(|x| {
                    let sx = XPathValue::String(self.string_value(*x));
                    right_strings
                        .iter()
                        .any(|sy| self.compare_scalars(op, &sx, &XPathValue::String(sy.clone())))
                })
            }
            (XPathValue::Nodes(a), XPathValue::Boolean(_)) => {
                self.compare_scalars(op, &XPathValue::Boolean(!a.is_empty()), right)
            }
            (XPathValue::Boolean(_), XPathValue::Nodes(b)) => {
                self.compare_scalars(op, left, &XPathValue::Boolean(!b.is_empty()))
            }
            (XPathValue::Nodes(a), scalar) => a
                .iter()
                .any(|x| self.compare_scalars(op, &self.atomize(*x, scalar), scalar)),
            (scalar, XPathValue::Nodes(b)) => b
                .iter()
                .any(|y| self.compare_scalars(op, scalar, &self.atomize(*y, scalar))),
            _ => self.compare_scalars(op, left, right),
        }
    }

    /// Convert a node to the type of the scalar it is compared with.
    fn atomize(&self, node: XNode, other: &XPathValue) -> XPathValue {
        let s = self.string_value(node);
        match other {
            XPathValue::Number(_) => XPathValue::Number(str_to_number(&s)),
            _ => XPathValue::String(s),
        }
    }

    fn compare_scalars(&self, op: CompareOp, left: &XPathValue, right: &XPathValue) -> bool {
        match op {
            CompareOp::Eq | CompareOp::NotEq => {
                let equal = if matches!(left, XPathValue::Boolean(_))
                    || matches!(right, XPathValue::Boolean(_))
                {
                    self.to_boolean(left) == self.to_boolean(right)
                } else if matches!(left, XPathValue::Number(_))
                    || matches!(right, XPathValue::Number(_))
                {
                    self.to_number(left) == self.to_number(right)
                } else {
                    self.to_string(left) == self.to_string(right)
                };
                if op == CompareOp::Eq { equal } else { !equal }
            }
            CompareOp::Lt => self.to_number(left) < self.to_number(right),
            CompareOp::Le => self.to_number(left) <= self.to_number(right),
            CompareOp::Gt => self.to_number(left) > self.to_number(right),
            CompareOp::Ge => self.to_number(left) >= self.to_number(right),
        }
    }

    // ---- functions ------------------------------------------------------

    fn call(&self, function: Function, args: &[Expr], ctx: Context) -> Result<XPathValue> {
        let arg = |i: usize| self.eval(&args[i], ctx);
        let string_arg = |i: usize| -> Result<String> {
            match args.get(i) {
                Some(expr) => Ok(self.to_string(&self.eval(expr, ctx)?)),
                None => Ok(self.string_value(ctx.node)),
            }
        };
        let node_arg = |i: usize| -> Result<Option<XNode>> {
            match args.get(i) {
                Some(expr) => Ok(self.nodes_of(self.eval(expr, ctx)?)?.first().copied()),
                None => Ok(Some(ctx.node)),
            }
        };

        Ok(match function {
            Function::Not => XPathValue::Boolean(!self.to_boolean(&arg(0)?)),
            Function::True => XPathValue::Boolean(true),
            Function::False => XPathValue::Boolean(false),
            Function::Count => XPathValue::Number(self.nodes_of(arg(0)?)?.len() as f64),
            Function::Position => XPathValue::Number(ctx.position as f64),
            Function::Last => XPathValue::Number(ctx.size as f64),
            Function::String => XPathValue::String(string_arg(0)?),
            Function::Concat => {
                let mut out = String::new();
                for i in 0..args.len() {
                    out.push_str(&string_arg(i)?);
                }
                XPathValue::String(out)
            }
            Function::Contains => XPathValue::Boolean(string_arg(0)?.contains(&string_arg(1)?)),
            Function::StartsWith => {
                XPathValue::Boolean(string_arg(0)?.starts_with(&string_arg(1)?))
            }
            Function::Substring => {
                let s = string_arg(0)?;
                let start = self.to_number(&arg(1)?).round();
                let end = match args.get(2) {
                    Some(_) => start + self.to_number(&arg(2)?).round(),
                    None => f64::INFINITY,
                };
                let out = s
                    .chars()
                    .enumerate()
                    .filter(|(i, _)| {
                        let p = (*i + 1) as f64;
                        p >= start && p < end
                    })
                    .map(|(_, c)| c)
                    .collect();
                XPathValue::String(out)
            }
            Function::NormalizeSpace => XPathValue::String(
                string_arg(0)?.split_whitespace().collect::<Vec<_>>().join(" "),
            ),
            Function::StringLength => XPathValue::Number(string_arg(0)?.chars().count() as f64),
            Function::LocalName => XPathValue::String(
                node_arg(0)?
                    .map(|n| self.node_name(n, false))
                    .unwrap_or_default(),
            ),
            Function::Name => XPathValue::String(
                node_arg(0)?
                    .map(|n| self.node_name(n, true))
                    .unwrap_or_default(),
            ),
            Function::Boolean => XPathValue::Boolean(self.to_boolean(&arg(0)?)),
            Function::Number => match args.first() {
                Some(_) => XPathValue::Number(self.to_number(&arg(0)?)),
                None => XPathValue::Number(str_to_number(&self.string_value(ctx.node))),
            },
        })
    }

    fn node_name(&self, node: XNode, qualified: bool) -> String {
        let name = match node {
            XNode::Node(n) => match self.tree.data(n) {
                NodeData::Element(e) => &e.name,
                NodeData::ProcessingInstruction { target, .. } => return target.clone(),
                _ => return String::new(),
            },
            XNode::Attribute(owner, i) => match self.tree.attributes(owner).get(i) {
                Some(a) => &a.name,
                None => return String::new(),
            },
        };
        if qualified {
            name.qualified()
        } else {
            name.local.clone()
        }
    }
}

fn str_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    let valid = !trimmed.is_empty()
        && trimmed
            .strip_prefix('-')
            .unwrap_or(trimmed)
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.');
    if !valid {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_str_to_number() {
        assert_eq!(str_to_number(" 42 "), 42.0);
        assert_eq!(str_to_number("-1.5"), -1.5);
        assert!(str_to_number("1e3").is_nan());
        assert!(str_to_number("").is_nan());
        assert!(str_to_number("abc").is_nan());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }
}
