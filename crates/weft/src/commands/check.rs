/*
 * check.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Check command implementation
 */

//! Check command implementation.
//!
//! Parses each file and reports syntax errors against the source.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use weft_template::loader::MediaType;

use crate::diagnostic::render_parse_error;

/// Arguments for the check command
#[derive(Debug)]
pub struct CheckArgs {
    /// Files to check
    pub files: Vec<PathBuf>,
    /// Only report failures
    pub quiet: bool,
}

/// Execute the check command
pub fn execute(args: CheckArgs) -> Result<()> {
    let color = std::io::stderr().is_terminal();
    let mut failed = 0;
    for path in &args.files {
        match check_file(path, color)? {
            Some(report) => {
                eprint!("{}", report);
                failed += 1;
            }
            None if !args.quiet => info!("{}: ok", path.display()),
            None => {}
        }
    }
    if failed > 0 {
        bail!("{} of {} file(s) failed to parse", failed, args.files.len());
    }
    Ok(())
}

/// Parse one file. Returns the rendered report when it is malformed.
pub(crate) fn check_file(path: &Path, color: bool) -> Result<Option<String>> {
    if MediaType::from_path(path).is_none() {
        warn!("{}: not a markup file extension, parsing anyway", path.display());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    debug!("Checking {} ({} bytes)", path.display(), content.len());

    match weft_dom::parse(&content) {
        Ok(_) => Ok(None),
        Err(error) => {
            let display = path.display().to_string();
            let report = render_parse_error(&display, &content, &error, color)
                .unwrap_or_else(|| format!("Error: {}: {}\n", display, error));
            Ok(Some(report))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_well_formed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.xhtml");
        fs::write(&path, "<p>fine</p>").unwrap();
        assert!(check_file(&path, false).unwrap().is_none());
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.xhtml");
        fs::write(&path, "<p>\n<b>unclosed</p>").unwrap();
        let report = check_file(&path, false).unwrap().unwrap();
        assert!(report.contains("XML syntax error"));
        assert!(report.contains("bad.xhtml"));
    }

    #[test]
    fn test_empty_file_is_reported_without_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xml");
        fs::write(&path, "").unwrap();
        let report = check_file(&path, false).unwrap().unwrap();
        assert!(report.starts_with("Error: "));
        assert!(report.contains("no root element"));
    }

    #[test]
    fn test_failures_fail_the_command() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.xml");
        fs::write(&good, "<a/>").unwrap();
        let bad = dir.path().join("bad.xml");
        fs::write(&bad, "<a>").unwrap();
        let err = execute(CheckArgs {
            files: vec![good, bad],
            quiet: true,
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 file(s) failed to parse");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_file(&dir.path().join("nope.xml"), false).is_err());
    }
}
