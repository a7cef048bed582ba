/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Render command implementation
 */

//! Render command implementation.
//!
//! `weft render` fills a template in this order:
//! - snippets from `--snippets DIR`
//! - asset references from `--asset ID=URL`
//! - the JSON view model from `--model FILE`

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use weft_template::{Asset, AssetList, loader};

use super::{load_template, write_output};
use crate::config::Config;

/// Arguments for the render command
#[derive(Debug)]
pub struct RenderArgs {
    /// Template file
    pub template: PathBuf,
    /// JSON view model
    pub model: Option<PathBuf>,
    /// Snippet directory
    pub snippets: Option<PathBuf>,
    /// Asset references as `ID=URL`
    pub assets: Vec<String>,
    /// Output file path
    pub output: Option<PathBuf>,
}

/// Execute the render command
pub fn execute(args: RenderArgs, config: &Config) -> Result<()> {
    let rendered = run(&args, config)?;
    write_output(args.output.as_ref(), &rendered)
}

pub(crate) fn run(args: &RenderArgs, config: &Config) -> Result<String> {
    info!("Rendering {}", args.template.display());
    let mut template = load_template(&args.template, config)?;

    if let Some(dir) = &args.snippets {
        let snippets = loader::load_snippet_dir(dir)
            .with_context(|| format!("Failed to load snippets from {}", dir.display()))?;
        debug!("Loaded {} snippet id(s)", snippets.len());
        template
            .apply_snippets(&snippets)
            .context("Failed to apply snippets")?;
    }

    if !args.assets.is_empty() {
        let assets = parse_assets(&args.assets)?;
        template
            .apply_assets(&assets)
            .context("Failed to apply assets")?;
    }

    if let Some(path) = &args.model {
        let model = loader::load_model(path)
            .with_context(|| format!("Failed to load view model {}", path.display()))?;
        template
            .apply_view_model(&model)
            .with_context(|| format!("Failed to render {}", args.template.display()))?;
    }

    Ok(template.render())
}

/// Parse `ID=URL` pairs. The asset kind follows the URL's extension.
fn parse_assets(pairs: &[String]) -> Result<AssetList> {
    let mut assets = AssetList::new();
    for pair in pairs {
        let Some((id, url)) = pair.split_once('=') else {
            bail!("Invalid asset '{}': expected ID=URL", pair);
        };
        let Some(asset) = Asset::from_url(url) else {
            bail!(
                "Cannot tell the asset kind of '{}': expected a .css or .js URL",
                url
            );
        };
        assets
            .insert(id, asset)
            .with_context(|| format!("Invalid asset target id '{}'", id))?;
    }
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_parse_assets() {
        let assets =
            parse_assets(&["head=site.css".to_string(), "head=app.js?v=2".to_string()]).unwrap();
        assert_eq!(assets.len(), 1);
        assert!(assets.contains("head"));

        assert!(parse_assets(&["site.css".to_string()]).is_err());
        assert!(parse_assets(&["head=site.txt".to_string()]).is_err());
        assert!(parse_assets(&["=site.css".to_string()]).is_err());
    }

    #[test]
    fn test_run_full_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("page.xhtml");
        fs::write(
            &template,
            r#"<html xmlns="http://www.w3.org/1999/xhtml"><head id="head"/><body><h1 property="title">T</h1><div id="footer"/></body></html>"#,
        )
        .unwrap();
        let model = dir.path().join("model.json");
        fs::write(&model, r#"{"title": "Hello"}"#).unwrap();
        let snippets = dir.path().join("snippets");
        fs::create_dir(&snippets).unwrap();
        fs::write(
            snippets.join("footer.xhtml"),
            r#"<p xmlns="http://www.w3.org/1999/xhtml">Bye</p>"#,
        )
        .unwrap();

        let args = RenderArgs {
            template,
            model: Some(model),
            snippets: Some(snippets),
            assets: vec!["head=site.css".to_string()],
            output: None,
        };
        let rendered = run(&args, &Config::default()).unwrap();
        assert_eq!(
            rendered,
            r#"<html xmlns="http://www.w3.org/1999/xhtml"><head id="head"><link rel="stylesheet" href="site.css"/></head><body><h1 property="title">Hello</h1><div id="footer"><p xmlns="http://www.w3.org/1999/xhtml">Bye</p></div></body></html>"#
        );
    }

    #[test]
    fn test_run_reports_binding_errors() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("page.xhtml");
        fs::write(&template, r#"<div><p property="missing"/></div>"#).unwrap();
        let model = dir.path().join("model.json");
        fs::write(&model, "{}").unwrap();

        let args = RenderArgs {
            template,
            model: Some(model),
            snippets: None,
            assets: Vec::new(),
            output: None,
        };
        let err = run(&args, &Config::default()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to render"));
        assert!(format!("{:#}", err).contains("Cannot resolve property 'missing'"));
    }
}
