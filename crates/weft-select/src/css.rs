/*
 * css.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! CSS selectors, translated to XPath.
//!
//! Matching is relative to the context node: a selector finds descendants
//! of the context, like `querySelectorAll`. Type selectors compare local
//! names, so `p` matches both `<p>` and an XHTML `<p>`.

use weft_dom::{NodeId, Tree};

use crate::error::{Result, SelectorError};
use crate::xpath::XPathSelector;
use crate::{Selection, Selector};

/// Selector backed by a CSS selector group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssSelector {
    selector: String,
}

impl CssSelector {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// The equivalent XPath expression.
    pub fn to_xpath(&self) -> Result<String> {
        to_xpath(&self.selector)
    }
}

impl Selector for CssSelector {
    fn select(&self, tree: &Tree, context: NodeId) -> Result<Selection> {
        let xpath = self.to_xpath()?;
        tracing::trace!(css = %self.selector, xpath = %xpath, "Translated CSS selector");
        XPathSelector::new(xpath).select(tree, context)
    }
}

/// Translate a CSS selector group to an XPath expression.
///
/// # Example
///
/// ```rust
/// assert_eq!(
///     weft_select::css::to_xpath("ul > li").unwrap(),
///     "descendant::*[local-name()='ul']/*[local-name()='li']"
/// );
/// ```
pub fn to_xpath(selector: &str) -> Result<String> {
    let mut translator = Translator {
        source: selector,
        pos: 0,
    };
    translator.group()
}

struct Translator<'a> {
    source: &'a str,
    pos: usize,
}

impl Translator<'_> {
    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos != start
    }

    fn error(&self, message: impl Into<String>) -> SelectorError {
        SelectorError::css(self.source, self.pos, message)
    }

    fn group(&mut self) -> Result<String> {
        let mut alternatives = Vec::new();
        loop {
            self.skip_whitespace();
            alternatives.push(self.complex()?);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                None => break,
                Some(c) => {
                    self.pos -= c.len_utf8();
                    return Err(self.error(format!("unexpected '{}'", c)));
                }
            }
        }
        Ok(alternatives.join(" | "))
    }

    /// `compound (combinator compound)*`
    fn complex(&mut self) -> Result<String> {
        let mut xpath = format!("descendant::{}", self.compound()?);
        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                Some(c @ ('>' | '+' | '~')) => {
                    self.bump();
                    self.skip_whitespace();
                    c
                }
                Some(',') | None => break,
                Some(_) if had_space => ' ',
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            };
            let next = self.compound()?;
            match combinator {
                '>' => xpath.push_str(&format!("/{}", next)),
                '+' => xpath.push_str(&format!("/following-sibling::*[1][self::{}]", next)),
                '~' => xpath.push_str(&format!("/following-sibling::{}", next)),
                _ => xpath.push_str(&format!("/descendant::{}", next)),
            }
        }
        Ok(xpath)
    }

    /// A compound selector as an XPath node test with predicates.
    fn compound(&mut self) -> Result<String> {
        let start = self.pos;
        let mut conditions = Vec::new();

        match self.peek() {
            Some('*') => {
                self.bump();
            }
            Some(c) if is_ident_start(c) => {
                let name = self.ident()?;
                if self.peek() == Some('|') {
                    return Err(self.error("namespaced type selectors are not supported"));
                }
                conditions.push(format!("local-name()='{}'", name));
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    let id = self.ident()?;
                    conditions.push(format!("@id={}", literal(self, &id)?));
                }
                Some('.') => {
                    self.bump();
                    let class = self.ident()?;
                    conditions.push(word_match("@class", &literal(self, &format!(" {} ", class))?));
                }
                Some('[') => {
                    self.bump();
                    conditions.push(self.attribute()?);
                }
                Some(':') => {
                    self.bump();
                    conditions.push(self.pseudo_class()?);
                }
                _ => break,
            }
        }

        if self.pos == start {
            return Err(match self.peek() {
                Some(c) => self.error(format!("expected a selector, found '{}'", c)),
                None => self.error("expected a selector"),
            });
        }

        let mut test = String::from("*");
        for condition in conditions {
            test.push('[');
            test.push_str(&condition);
            test.push(']');
        }
        Ok(test)
    }

    fn ident(&mut self) -> Result<String> {
        let start = self.pos;
        match self.peek() {
            Some(c) if is_ident_start(c) => {}
            Some(c) => return Err(self.error(format!("expected an identifier, found '{}'", c))),
            None => return Err(self.error("expected an identifier")),
        }
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        Ok(self.source[start..self.pos].to_string())
    }

    /// The inside of `[...]`; the opening bracket is consumed.
    fn attribute(&mut self) -> Result<String> {
        self.skip_whitespace();
        let name = self.ident()?;
        let rest = &self.source[self.pos..];
        if rest.starts_with('|') && !rest.starts_with("|=") {
            return Err(self.error("namespaced attribute selectors are not supported"));
        }
        self.skip_whitespace();
        let attr = format!("@{}", name);

        let operator = match self.peek() {
            Some(']') => {
                self.bump();
                return Ok(attr);
            }
            Some('=') => {
                self.bump();
                "="
            }
            Some(c @ ('~' | '|' | '^' | '$' | '*')) => {
                self.bump();
                if self.bump() != Some('=') {
                    return Err(self.error(format!("expected '=' after '{}'", c)));
                }
                match c {
                    '~' => "~=",
                    '|' => "|=",
                    '^' => "^=",
                    '$' => "$=",
                    _ => "*=",
                }
            }
            Some(c) => return Err(self.error(format!("unexpected '{}' in attribute selector", c))),
            None => return Err(self.error("unterminated attribute selector")),
        };

        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.bump();
                }
                let value = self.source[start..self.pos].to_string();
                if self.bump().is_none() {
                    return Err(self.error("unterminated string"));
                }
                value
            }
            _ => self.ident()?,
        };
        self.skip_whitespace();
        if self.bump() != Some(']') {
            return Err(self.error("expected ']'"));
        }

        let lit = literal(self, &value)?;
        Ok(match operator {
            "=" => format!("{}={}", attr, lit),
            "~=" => word_match(&attr, &literal(self, &format!(" {} ", value))?),
            "|=" => format!(
                "{attr}={lit} or starts-with({attr},{dash})",
                dash = literal(self, &format!("{}-", value))?
            ),
            "^=" => format!("starts-with({},{})", attr, lit),
            "$=" => format!(
                "substring({attr},string-length({attr})-{len}+1)={lit}",
                len = value.chars().count()
            ),
            _ => format!("contains({},{})", attr, lit),
        })
    }

    fn pseudo_class(&mut self) -> Result<String> {
        let name = self.ident()?;
        Ok(match name.as_str() {
            "first-child" => "not(preceding-sibling::*)".to_string(),
            "last-child" => "not(following-sibling::*)".to_string(),
            "only-child" => "not(preceding-sibling::*) and not(following-sibling::*)".to_string(),
            "empty" => "not(*) and not(text())".to_string(),
            other => {
                return Err(self.error(format!("unsupported pseudo-class ':{}'", other)));
            }
        })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

/// Whitespace-separated word match, `padded` is the quoted word with a
/// space on either side.
fn word_match(attr: &str, padded: &str) -> String {
    format!("contains(concat(' ',normalize-space({}),' '),{})", attr, padded)
}

/// Quote `value` as an XPath literal.
fn literal(translator: &Translator<'_>, value: &str) -> Result<String> {
    if !value.contains('\'') {
        Ok(format!("'{}'", value))
    } else if !value.contains('"') {
        Ok(format!("\"{}\"", value))
    } else {
        Err(translator.error("values containing both quote characters are not supported"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_type_and_universal() {
        assert_eq!(to_xpath("div").unwrap(), "descendant::*[local-name()='div']");
        assert_eq!(to_xpath("*").unwrap(), "descendant::*");
    }

    #[test]
    fn test_id_and_class() {
        assert_eq!(
            to_xpath("p#main.note").unwrap(),
            "descendant::*[local-name()='p'][@id='main']\
             [contains(concat(' ',normalize-space(@class),' '),' note ')]"
        );
    }

    #[test]
    fn test_combinators() {
        assert_eq!(
            to_xpath("ul li").unwrap(),
            "descendant::*[local-name()='ul']/descendant::*[local-name()='li']"
        );
        assert_eq!(
            to_xpath("h1 + p").unwrap(),
            "descendant::*[local-name()='h1']/following-sibling::*[1][self::*[local-name()='p']]"
        );
        assert_eq!(
            to_xpath("h1~p").unwrap(),
            "descendant::*[local-name()='h1']/following-sibling::*[local-name()='p']"
        );
    }

    #[test]
    fn test_attribute_operators() {
        assert_eq!(to_xpath("[href]").unwrap(), "descendant::*[@href]");
        assert_eq!(
            to_xpath("a[href^='http']").unwrap(),
            "descendant::*[local-name()='a'][starts-with(@href,'http')]"
        );
        assert_eq!(
            to_xpath("[lang|=en]").unwrap(),
            "descendant::*[@lang='en' or starts-with(@lang,'en-')]"
        );
        assert_eq!(
            to_xpath("[src$=\".png\"]").unwrap(),
            "descendant::*[substring(@src,string-length(@src)-4+1)='.png']"
        );
    }

    #[test]
    fn test_group() {
        assert_eq!(
            to_xpath("h1, h2").unwrap(),
            "descendant::*[local-name()='h1'] | descendant::*[local-name()='h2']"
        );
    }

    #[test]
    fn test_pseudo_classes() {
        assert_eq!(
            to_xpath("li:first-child").unwrap(),
            "descendant::*[local-name()='li'][not(preceding-sibling::*)]"
        );
        assert!(matches!(
            to_xpath("li:hover").unwrap_err(),
            SelectorError::CssSyntax { column: 9, .. }
        ));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(
            to_xpath("").unwrap_err(),
            SelectorError::CssSyntax { column: 1, .. }
        ));
        assert!(matches!(
            to_xpath("div >").unwrap_err(),
            SelectorError::CssSyntax { column: 6, .. }
        ));
        assert!(matches!(
            to_xpath("[a=b").unwrap_err(),
            SelectorError::CssSyntax { .. }
        ));
        assert!(matches!(
            to_xpath("svg|rect").unwrap_err(),
            SelectorError::CssSyntax { .. }
        ));
    }
}
