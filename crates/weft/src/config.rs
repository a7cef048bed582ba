/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * weft.toml loading
 */

//! Project configuration.
//!
//! An optional `weft.toml` supplies defaults for every command:
//!
//! ```toml
//! [render]
//! max-depth = 256
//!
//! [output]
//! xml-declaration = true
//! html-compatible = true
//!
//! [namespaces]
//! svg = "http://www.w3.org/2000/svg"
//! ```
//!
//! Command-line flags override values read from the file.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use weft_dom::SerializeOptions;
use weft_select::XPathSelector;
use weft_template::RenderOptions;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "weft.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub render: RenderOptions,
    pub output: SerializeOptions,
    /// Prefix to namespace URI bindings for XPath queries.
    pub namespaces: BTreeMap<String, String>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub max_depth: Option<usize>,
    pub xml_declaration: bool,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read `path`, or `weft.toml` in the working directory if present.
    ///
    /// An explicit path must exist; a missing default file yields the
    /// default configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };
        debug!("Reading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(max_depth) = overrides.max_depth {
            self.render.max_depth = max_depth;
        }
        if overrides.xml_declaration {
            self.output.xml_declaration = true;
        }
        self
    }

    /// An XPath selector with the configured namespaces registered.
    pub fn xpath(&self, query: &str) -> XPathSelector {
        let mut selector = XPathSelector::new(query);
        for (prefix, uri) in &self.namespaces {
            selector.register_namespace(prefix.as_str(), uri.as_str());
        }
        selector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_full_file() {
        let config = Config::from_toml(
            r#"
[render]
max-depth = 16

[output]
xml-declaration = true
html-compatible = false

[namespaces]
svg = "http://www.w3.org/2000/svg"
"#,
        )
        .unwrap();
        assert_eq!(config.render.max_depth, 16);
        assert!(config.output.xml_declaration);
        assert!(!config.output.html_compatible);
        assert_eq!(
            config.namespaces.get("svg").map(String::as_str),
            Some("http://www.w3.org/2000/svg")
        );
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        assert!(Config::from_toml("[server]\nport = 1").is_err());
    }

    #[test]
    fn test_overrides_win() {
        let config = Config::from_toml("[render]\nmax-depth = 16").unwrap();
        let config = config.with_overrides(Overrides {
            max_depth: Some(4),
            xml_declaration: true,
        });
        assert_eq!(config.render.max_depth, 4);
        assert!(config.output.xml_declaration);

        let untouched = Config::default().with_overrides(Overrides::default());
        assert_eq!(untouched, Config::default());
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read config file"));
    }

    #[test]
    fn test_xpath_uses_configured_namespaces() {
        let mut config = Config::default();
        config
            .namespaces
            .insert("svg".to_string(), "http://www.w3.org/2000/svg".to_string());
        let doc = weft_dom::parse(
            r#"<div xmlns:s="http://www.w3.org/2000/svg"><s:rect/><s:rect/></div>"#,
        )
        .unwrap();
        let selection = weft_select::Selector::select(
            &config.xpath("//svg:rect"),
            doc.tree(),
            doc.tree().root(),
        )
        .unwrap();
        assert_eq!(selection.len(), 2);
    }
}
