/*
 * select.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Select command implementation
 */

//! Select command implementation.
//!
//! Prints every match of an XPath or CSS query, one per line. Elements are
//! serialized with the configured output options; attributes print their
//! value. XPath expressions that evaluate to a string, number or boolean
//! print that value.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use weft_dom::{Tree, serialize_node};
use weft_select::{CssSelector, Selector, XNode, XPathValue};
use weft_template::{LoadError, loader};

use super::{exit_with_parse_error, write_output};
use crate::config::Config;

/// Arguments for the select command
#[derive(Debug)]
pub struct SelectArgs {
    /// Document to query
    pub file: PathBuf,
    /// XPath expression, or CSS selector with `css`
    pub query: String,
    /// Treat the query as a CSS selector
    pub css: bool,
    /// Output file path
    pub output: Option<PathBuf>,
}

/// Execute the select command
pub fn execute(args: SelectArgs, config: &Config) -> Result<()> {
    let lines = run(&args, config)?;
    if lines.is_empty() {
        info!("No matches for {}", args.query);
        return Ok(());
    }
    write_output(args.output.as_ref(), &lines.join("\n"))
}

pub(crate) fn run(args: &SelectArgs, config: &Config) -> Result<Vec<String>> {
    let document = match loader::load_document(&args.file) {
        Ok(document) => document,
        Err(LoadError::Parse { path, source }) => exit_with_parse_error(&path, &source),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to load {}", args.file.display()));
        }
    };
    let tree = document.tree();
    let context = tree.root();

    if args.css {
        let selection = CssSelector::new(args.query.as_str())
            .select(tree, context)
            .with_context(|| format!("Invalid CSS selector '{}'", args.query))?;
        debug!("{} match(es)", selection.len());
        return Ok(selection
            .iter()
            .map(|node| serialize_node(tree, node, &config.output))
            .collect());
    }

    let selector = config.xpath(&args.query);
    let value = selector
        .evaluate(tree, context)
        .with_context(|| format!("Invalid XPath expression '{}'", args.query))?;
    Ok(match value {
        XPathValue::Nodes(nodes) => {
            debug!("{} match(es)", nodes.len());
            nodes
                .into_iter()
                .map(|node| format_node(tree, node, config))
                .collect()
        }
        other => vec![selector.string_value(tree, context, &other)],
    })
}

fn format_node(tree: &Tree, node: XNode, config: &Config) -> String {
    match node {
        XNode::Node(id) => serialize_node(tree, id, &config.output),
        XNode::Attribute(owner, index) => tree
            .attributes(owner)
            .get(index)
            .map(|attr| attr.value.clone())
            .unwrap_or_default(),
    }
}
