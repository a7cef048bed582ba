/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Command implementations for the weft CLI

pub mod check;
pub mod merge;
pub mod render;
pub mod select;
pub mod snippets;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use weft_template::{LoadError, Template, loader};

use crate::config::Config;

/// Load a template file with the configured options.
pub(crate) fn load_template(path: &Path, config: &Config) -> Result<Template> {
    let document = match loader::load_document(path) {
        Ok(document) => document,
        Err(LoadError::Parse { path, source }) => exit_with_parse_error(&path, &source),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to load template {}", path.display()));
        }
    };
    Ok(Template::new(document)
        .with_options(config.render)
        .with_output(config.output))
}

/// Write `content` to `output`, or to stdout when no path is given.
pub(crate) fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write output file {}", path.display()))?;
            info!("Output: {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Print a source-annotated parse error and exit.
///
/// Parse errors carry their own "Error:" heading, so they bypass anyhow.
pub(crate) fn exit_with_parse_error(path: &Path, error: &weft_dom::Error) -> ! {
    let display = path.display().to_string();
    let color = std::io::stderr().is_terminal();
    let report = std::fs::read_to_string(path).ok().and_then(|content| {
        crate::diagnostic::render_parse_error(&display, &content, error, color)
    });
    match report {
        Some(report) => eprint!("{}", report),
        None => eprintln!("Error: {}: {}", display, error),
    }
    std::process::exit(1);
}
