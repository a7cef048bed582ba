/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Recursive descent parser for the supported XPath subset.

use std::collections::BTreeMap;

use weft_dom::namespace;

use super::ast::{
    ArithmeticOp, Axis, CompareOp, Expr, Function, LocationPath, NodeTest, PathStart, Step,
};
use super::lexer::{Token, TokenKind, tokenize};
use crate::error::{Result, SelectorError};

/// Parse `query`, resolving prefixes against `namespaces`.
pub fn parse(query: &str, namespaces: &BTreeMap<String, String>) -> Result<Expr> {
    let tokens = tokenize(query)?;
    let mut parser = Parser {
        query,
        tokens,
        pos: 0,
        namespaces,
    };
    if parser.tokens.is_empty() {
        return Err(SelectorError::syntax(query, 0, "empty expression"));
    }
    let expr = parser.parse_or()?;
    if let Some(token) = parser.peek_token() {
        return Err(SelectorError::syntax(
            query,
            token.offset,
            "unexpected token after expression",
        ));
    }
    Ok(expr)
}

struct Parser<'a> {
    query: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    namespaces: &'a BTreeMap<String, String>,
}

impl Parser<'_> {
    fn peek_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.peek_token().map(|t| &t.kind)
    }

    fn peek_at(&self, ahead: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + ahead).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Offset used for errors at the current position.
    fn offset(&self) -> usize {
        self.peek_token()
            .map_or(self.query.len(), |t| t.offset)
    }

    fn error(&self, message: impl Into<String>) -> SelectorError {
        SelectorError::syntax(self.query, self.offset(), message)
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_equality()?;
        while self.eat(&TokenKind::And) {
            let right = self.parse_equality()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Eq) => CompareOp::Eq,
                Some(TokenKind::NotEq) => CompareOp::NotEq,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_relational()?;
            left = Expr::Compare(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Lt) => CompareOp::Lt,
                Some(TokenKind::Le) => CompareOp::Le,
                Some(TokenKind::Gt) => CompareOp::Gt,
                Some(TokenKind::Ge) => CompareOp::Ge,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_additive()?;
            left = Expr::Compare(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Plus) => ArithmeticOp::Add,
                Some(TokenKind::Minus) => ArithmeticOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::Arithmetic(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.eat(&TokenKind::Minus) {
            let inner = self.parse_unary()?;
            return Ok(Expr::Negate(Box::new(inner)));
        }
        self.parse_union()
    }

    fn parse_union(&mut self) -> Result<Expr> {
        let mut left = self.parse_path()?;
        while self.eat(&TokenKind::Pipe) {
            let right = self.parse_path()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn starts_filter(&self) -> bool {
        match self.peek() {
            Some(TokenKind::LParen | TokenKind::Literal(_) | TokenKind::Number(_)) => true,
            Some(TokenKind::Name { prefix: None, local }) => {
                self.peek_at(1) == Some(&TokenKind::LParen)
                    && !matches!(local.as_str(), "node" | "text" | "comment")
            }
            Some(TokenKind::Name { prefix: Some(_), local }) => {
                local != "*" && self.peek_at(1) == Some(&TokenKind::LParen)
            }
            _ => false,
        }
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                TokenKind::Name { .. }
                    | TokenKind::Star
                    | TokenKind::At
                    | TokenKind::Dot
                    | TokenKind::DotDot
            )
        )
    }

    fn parse_path(&mut self) -> Result<Expr> {
        if self.starts_filter() {
            let primary = self.parse_primary()?;
            let predicates = self.parse_predicates()?;
            let mut steps = Vec::new();
            if matches!(self.peek(), Some(TokenKind::Slash | TokenKind::DoubleSlash)) {
                self.parse_relative_steps(&mut steps, false)?;
            }
            if predicates.is_empty() && steps.is_empty() {
                return Ok(primary);
            }
            return Ok(Expr::Path(LocationPath {
                start: PathStart::Filter {
                    primary: Box::new(primary),
                    predicates,
                },
                steps,
            }));
        }

        let mut steps = Vec::new();
        match self.peek() {
            Some(TokenKind::Slash) => {
                self.pos += 1;
                if self.starts_step() {
                    self.parse_relative_steps(&mut steps, true)?;
                }
                Ok(Expr::Path(LocationPath {
                    start: PathStart::Root,
                    steps,
                }))
            }
            Some(TokenKind::DoubleSlash) => {
                self.pos += 1;
                steps.push(Step::descendant_or_self_node());
                self.parse_relative_steps(&mut steps, true)?;
                Ok(Expr::Path(LocationPath {
                    start: PathStart::Root,
                    steps,
                }))
            }
            _ if self.starts_step() => {
                self.parse_relative_steps(&mut steps, true)?;
                Ok(Expr::Path(LocationPath {
                    start: PathStart::Context,
                    steps,
                }))
            }
            Some(_) => Err(self.error("expected an expression")),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    /// Parse `step (('/' | '//') step)*`. When `leading_step` is false the
    /// sequence starts with a separator instead.
    fn parse_relative_steps(&mut self, steps: &mut Vec<Step>, leading_step: bool) -> Result<()> {
        if leading_step {
            steps.push(self.parse_step()?);
        }
        loop {
            match self.peek() {
                Some(TokenKind::Slash) => {
                    self.pos += 1;
                }
                Some(TokenKind::DoubleSlash) => {
                    self.pos += 1;
                    steps.push(Step::descendant_or_self_node());
                }
                _ => return Ok(()),
            }
            steps.push(self.parse_step()?);
        }
    }

    fn parse_step(&mut self) -> Result<Step> {
        if self.eat(&TokenKind::Dot) {
            return Ok(Step {
                axis: Axis::SelfAxis,
                test: NodeTest::Node,
                predicates: Vec::new(),
            });
        }
        if self.eat(&TokenKind::DotDot) {
            return Ok(Step {
                axis: Axis::Parent,
                test: NodeTest::Node,
                predicates: Vec::new(),
            });
        }

        let axis = if self.eat(&TokenKind::At) {
            Axis::Attribute
        } else if let (Some(TokenKind::Name { prefix: None, local }), Some(TokenKind::ColonColon)) =
            (self.peek(), self.peek_at(1))
        {
            let axis = Axis::from_name(local)
                .ok_or_else(|| self.error(format!("unsupported axis '{}'", local)))?;
            self.pos += 2;
            axis
        } else {
            Axis::Child
        };

        let test = self.parse_node_test()?;
        let predicates = self.parse_predicates()?;
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn parse_node_test(&mut self) -> Result<NodeTest> {
        let offset = self.offset();
        match self.advance().map(|t| t.kind) {
            Some(TokenKind::Star) => Ok(NodeTest::Any),
            Some(TokenKind::Name {
                prefix: None,
                local,
            }) if self.peek() == Some(&TokenKind::LParen)
                && matches!(local.as_str(), "node" | "text" | "comment") =>
            {
                self.pos += 1;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(match local.as_str() {
                    "node" => NodeTest::Node,
                    "text" => NodeTest::Text,
                    _ => NodeTest::Comment,
                })
            }
            Some(TokenKind::Name {
                prefix: Some(prefix),
                local,
            }) => {
                let uri = self.resolve_prefix(&prefix)?;
                if local == "*" {
                    Ok(NodeTest::Namespace(uri))
                } else {
                    Ok(NodeTest::Name {
                        namespace: Some(uri),
                        local,
                    })
                }
            }
            Some(TokenKind::Name {
                prefix: None,
                local,
            }) => Ok(NodeTest::Name {
                namespace: None,
                local,
            }),
            _ => Err(SelectorError::syntax(self.query, offset, "expected a node test")),
        }
    }

    fn resolve_prefix(&self, prefix: &str) -> Result<String> {
        if prefix == "xml" {
            return Ok(namespace::XML.to_string());
        }
        self.namespaces
            .get(prefix)
            .cloned()
            .ok_or_else(|| SelectorError::UnknownPrefix {
                prefix: prefix.to_string(),
                query: self.query.to_string(),
            })
    }

    fn parse_predicates(&mut self) -> Result<Vec<Expr>> {
        let mut predicates = Vec::new();
        while self.eat(&TokenKind::LBracket) {
            predicates.push(self.parse_or()?);
            self.expect(&TokenKind::RBracket, "']'")?;
        }
        Ok(predicates)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let offset = self.offset();
        match self.advance().map(|t| t.kind) {
            Some(TokenKind::LParen) => {
                let inner = self.parse_or()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            Some(TokenKind::Literal(s)) => Ok(Expr::Literal(s)),
            Some(TokenKind::Number(n)) => Ok(Expr::Number(n)),
            Some(TokenKind::Name { prefix, local }) => {
                let name = match prefix {
                    Some(p) => format!("{}:{}", p, local),
                    None => local,
                };
                let function = Function::from_name(&name).ok_or_else(|| {
                    SelectorError::UnknownFunction {
                        name: name.clone(),
                        query: self.query.to_string(),
                    }
                })?;
                self.expect(&TokenKind::LParen, "'('")?;
                let mut args = Vec::new();
                if !self.eat(&TokenKind::RParen) {
                    loop {
                        args.push(self.parse_or()?);
                        if self.eat(&TokenKind::Comma) {
                            continue;
                        }
                        self.expect(&TokenKind::RParen, "')' or ','")?;
                        break;
                    }
                }
                let (min, max) = function.arity();
                if args.len() < min || args.len() > max {
                    return Err(SelectorError::syntax(
                        self.query,
                        offset,
                        format!("wrong number of arguments for {}()", name),
                    ));
                }
                Ok(Expr::Call(function, args))
            }
            _ => Err(SelectorError::syntax(self.query, offset, "expected an expression")),
        }
    }
}
