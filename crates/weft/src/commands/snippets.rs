/*
 * snippets.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Snippets command implementation
 */

//! Snippets command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use weft_template::loader;

use super::{load_template, write_output};
use crate::config::Config;

/// Arguments for the snippets command
#[derive(Debug)]
pub struct SnippetsArgs {
    /// Template file
    pub template: PathBuf,
    /// Directory of snippet files
    pub dir: PathBuf,
    /// Only list the snippet ids found in the directory
    pub list: bool,
    /// Output file path
    pub output: Option<PathBuf>,
}

/// Execute the snippets command
pub fn execute(args: SnippetsArgs, config: &Config) -> Result<()> {
    let result = run(&args, config)?;
    write_output(args.output.as_ref(), &result)
}

pub(crate) fn run(args: &SnippetsArgs, config: &Config) -> Result<String> {
    let snippets = loader::load_snippet_dir(&args.dir)
        .with_context(|| format!("Failed to load snippets from {}", args.dir.display()))?;
    if args.list {
        let ids: Vec<String> = snippets.ids().map(ToString::to_string).collect();
        return Ok(ids.join("\n"));
    }

    info!(
        "Applying {} snippet id(s) to {}",
        snippets.len(),
        args.template.display()
    );
    let mut template = load_template(&args.template, config)?;
    template
        .apply_snippets(&snippets)
        .with_context(|| format!("Failed to apply snippets to {}", args.template.display()))?;
    debug!("Snippets applied");
    Ok(template.render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("page.xml");
        fs::write(&template, r#"<page><nav id="nav"/><footer id="footer">x</footer></page>"#)
            .unwrap();
        let snippets = dir.path().join("snippets");
        fs::create_dir(&snippets).unwrap();
        fs::write(snippets.join("nav.xml"), "<a>home</a>").unwrap();
        fs::write(snippets.join("footer.xml"), r#"<footer id="footer">y</footer>"#).unwrap();
        (dir, template, snippets)
    }

    #[test]
    fn test_apply_snippets() {
        let (_dir, template, snippets) = setup();
        let args = SnippetsArgs {
            template,
            dir: snippets,
            list: false,
            output: None,
        };
        assert_eq!(
            run(&args, &Config::default()).unwrap(),
            r#"<page><nav id="nav"><a>home</a></nav><footer id="footer">y</footer></page>"#
        );
    }

    #[test]
    fn test_list_snippet_ids() {
        let (_dir, template, snippets) = setup();
        let args = SnippetsArgs {
            template,
            dir: snippets,
            list: true,
            output: None,
        };
        assert_eq!(run(&args, &Config::default()).unwrap(), "footer\nnav");
    }
}
