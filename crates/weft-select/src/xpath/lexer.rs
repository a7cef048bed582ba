/*
 * lexer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! XPath tokenizer.

use crate::error::{Result, SelectorError};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Dot,
    DotDot,
    Comma,
    Pipe,
    Plus,
    Minus,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Star,
    ColonColon,
    And,
    Or,
    Literal(String),
    Number(f64),
    /// `local`, `prefix:local` or `prefix:*` (local is `"*"`).
    Name {
        prefix: Option<String>,
        local: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset into the query.
    pub offset: usize,
}

/// Split `query` into tokens.
///
/// `and` and `or` are operators only after a token that can end an
/// operand; elsewhere they are plain names.
pub fn tokenize(query: &str) -> Result<Vec<Token>> {
    let bytes = query.as_bytes();
    let mut tokens: Vec<Token> = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }
        let start = pos;
        let next = bytes.get(pos + 1).copied();
        let kind = match c {
            b'/' if next == Some(b'/') => {
                pos += 2;
                TokenKind::DoubleSlash
            }
            b'/' => single(&mut pos, TokenKind::Slash),
            b'[' => single(&mut pos, TokenKind::LBracket),
            b']' => single(&mut pos, TokenKind::RBracket),
            b'(' => single(&mut pos, TokenKind::LParen),
            b')' => single(&mut pos, TokenKind::RParen),
            b'@' => single(&mut pos, TokenKind::At),
            b',' => single(&mut pos, TokenKind::Comma),
            b'|' => single(&mut pos, TokenKind::Pipe),
            b'+' => single(&mut pos, TokenKind::Plus),
            b'-' => single(&mut pos, TokenKind::Minus),
            b'=' => single(&mut pos, TokenKind::Eq),
            b'*' => single(&mut pos, TokenKind::Star),
            b'!' if next == Some(b'=') => {
                pos += 2;
                TokenKind::NotEq
            }
            b'<' if next == Some(b'=') => {
                pos += 2;
                TokenKind::Le
            }
            b'<' => single(&mut pos, TokenKind::Lt),
            b'>' if next == Some(b'=') => {
                pos += 2;
                TokenKind::Ge
            }
            b'>' => single(&mut pos, TokenKind::Gt),
            b':' if next == Some(b':') => {
                pos += 2;
                TokenKind::ColonColon
            }
            b'.' if next == Some(b'.') => {
                pos += 2;
                TokenKind::DotDot
            }
            b'.' if next.is_some_and(|n| n.is_ascii_digit()) => lex_number(query, &mut pos)?,
            b'.' => single(&mut pos, TokenKind::Dot),
            b'0'..=b'9' => lex_number(query, &mut pos)?,
            b'\'' | b'"' => {
                let close = query[pos + 1..]
                    .find(c as char)
                    .ok_or_else(|| {
                        SelectorError::syntax(query, start, "unterminated string literal")
                    })?;
                let literal = query[pos + 1..pos + 1 + close].to_string();
                pos += close + 2;
                TokenKind::Literal(literal)
            }
            _ if is_name_start(query, pos) => lex_name(query, &mut pos)?,
            _ => {
                let ch = query[pos..].chars().next().unwrap_or('?');
                return Err(SelectorError::syntax(
                    query,
                    start,
                    format!("unexpected character '{}'", ch),
                ));
            }
        };

        let kind = match kind {
            TokenKind::Name { prefix: None, local }
                if (local == "and" || local == "or") && ends_operand(tokens.last()) =>
            {
                if local == "and" {
                    TokenKind::And
                } else {
                    TokenKind::Or
                }
            }
            other => other,
        };
        tokens.push(Token {
            kind,
            offset: start,
        });
    }

    Ok(tokens)
}

fn single(pos: &mut usize, kind: TokenKind) -> TokenKind {
    *pos += 1;
    kind
}

fn ends_operand(previous: Option<&Token>) -> bool {
    matches!(
        previous.map(|t| &t.kind),
        Some(
            TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::Literal(_)
                | TokenKind::Number(_)
                | TokenKind::Name { .. }
                | TokenKind::Star
                | TokenKind::Dot
                | TokenKind::DotDot
        )
    )
}

fn lex_number(query: &str, pos: &mut usize) -> Result<TokenKind> {
    let start = *pos;
    let bytes = query.as_bytes();
    while *pos < bytes.len() && (bytes[*pos].is_ascii_digit() || bytes[*pos] == b'.') {
        *pos += 1;
    }
    query[start..*pos]
        .parse::<f64>()
        .map(TokenKind::Number)
        .map_err(|_| SelectorError::syntax(query, start, "malformed number"))
}

fn is_name_start(query: &str, pos: usize) -> bool {
    query[pos..]
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '.')
}

fn take_ncname<'q>(query: &'q str, pos: &mut usize) -> &'q str {
    let start = *pos;
    let len: usize = query[start..]
        .chars()
        .take_while(|c| is_name_char(*c))
        .map(char::len_utf8)
        .sum();
    *pos += len;
    &query[start..*pos]
}

fn lex_name(query: &str, pos: &mut usize) -> Result<TokenKind> {
    let first = take_ncname(query, pos);
    let rest = &query[*pos..];
    // A single colon starts the local part; `::` belongs to an axis.
    if rest.starts_with(':') && !rest.starts_with("::") {
        let colon = *pos;
        *pos += 1;
        if query[*pos..].starts_with('*') {
            *pos += 1;
            return Ok(TokenKind::Name {
                prefix: Some(first.to_string()),
                local: "*".to_string(),
            });
        }
        if !is_name_start(query, *pos) {
            return Err(SelectorError::syntax(
                query,
                colon,
                "expected a local name after the prefix",
            ));
        }
        let local = take_ncname(query, pos);
        return Ok(TokenKind::Name {
            prefix: Some(first.to_string()),
            local: local.to_string(),
        });
    }
    Ok(TokenKind::Name {
        prefix: None,
        local: first.to_string(),
    })
}
