/*
 * merge.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Merge command implementation
 */

//! Merge command implementation.
//!
//! Every part is keyed by its root `id`, or its file stem when the root has
//! none, and spliced into the target at the element with that id.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use weft_template::{MergeList, loader};

use super::{load_template, write_output};
use crate::config::Config;

/// Arguments for the merge command
#[derive(Debug)]
pub struct MergeArgs {
    /// Target document
    pub target: PathBuf,
    /// Part files, or directories of part files
    pub parts: Vec<PathBuf>,
    /// Output file path
    pub output: Option<PathBuf>,
}

/// Execute the merge command
pub fn execute(args: MergeArgs, config: &Config) -> Result<()> {
    let merged = run(&args, config)?;
    write_output(args.output.as_ref(), &merged)
}

pub(crate) fn run(args: &MergeArgs, config: &Config) -> Result<String> {
    info!("Merging {} part(s) into {}", args.parts.len(), args.target.display());
    let mut template = load_template(&args.target, config)?;

    let mut list = MergeList::new();
    for path in expand_parts(&args.parts)? {
        let document = loader::load_mergeable(&path)
            .with_context(|| format!("Failed to load part {}", path.display()))?;
        debug!(
            "Part {} targets #{}",
            path.display(),
            document
                .identity()
                .map(ToString::to_string)
                .unwrap_or_default()
        );
        list.add(document)
            .with_context(|| format!("Failed to register part {}", path.display()))?;
    }

    template
        .merge(&list)
        .with_context(|| format!("Failed to merge into {}", args.target.display()))?;
    Ok(template.render())
}

/// Replace directories by the markup files they contain.
fn expand_parts(parts: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for part in parts {
        if part.is_dir() {
            files.extend(list_dir(part)?);
        } else {
            files.push(part.clone());
        }
    }
    Ok(files)
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    loader::markup_files(dir).with_context(|| format!("Failed to read directory {}", dir.display()))
}
