/*
 * loader.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Reading documents, snippets and view models from disk.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use weft_dom::{Document, Identity, namespace};

use crate::binding::{Value, json_to_value};
use crate::error::LoadError;
use crate::snippet::{ContainerSnippet, ContentSnippet, Snippet, SnippetCollection};

/// Result type for loading.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Markup media types, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Xml,
    Xhtml,
    /// XHTML served under an `.html` name; must still be well-formed.
    Html,
    Svg,
}

impl MediaType {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "xml" => Some(Self::Xml),
            "xhtml" => Some(Self::Xhtml),
            "html" | "htm" => Some(Self::Html),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Xml => "application/xml",
            Self::Xhtml => "application/xhtml+xml",
            Self::Html => "text/html",
            Self::Svg => "image/svg+xml",
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a markup file.
pub fn load_document(path: &Path) -> Result<Document> {
    let media_type = MediaType::from_path(path).ok_or_else(|| LoadError::UnsupportedMediaType {
        path: path.to_path_buf(),
    })?;
    tracing::debug!(path = %path.display(), mime = media_type.mime(), "Loading document");
    let content = read(path)?;
    Document::parse(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// The key of a loaded file: the root element's `id`, or the file stem.
fn identity_for(document: &Document, path: &Path) -> Result<Identity> {
    let root_id = document
        .document_element()
        .and_then(|root| document.tree().element_id(root))
        .map(str::to_string);
    let key = root_id.or_else(|| {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
    });
    Identity::new(key.unwrap_or_default()).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a document for merging, with its identity taken from the root
/// `id` or the file stem.
pub fn load_mergeable(path: &Path) -> Result<Document> {
    let mut document = load_document(path)?;
    let identity = identity_for(&document, path)?;
    document
        .set_identity(identity)
        .map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(document)
}

/// Load a snippet file and the id it targets.
///
/// A root in the container namespace makes a [`ContainerSnippet`]; any
/// other root a [`ContentSnippet`].
pub fn load_snippet(path: &Path) -> Result<(Identity, Box<dyn Snippet>)> {
    let document = load_document(path)?;
    let identity = identity_for(&document, path)?;
    let in_container = document
        .document_element()
        .and_then(|root| document.tree().namespace_uri(root))
        == Some(namespace::CONTAINER);
    let snippet: Box<dyn Snippet> = if in_container {
        Box::new(ContainerSnippet::new(document)?)
    } else {
        Box::new(ContentSnippet::from_document(document))
    };
    Ok((identity, snippet))
}

/// Load every markup file below `dir` as a snippet, in file name order.
/// Files of other media types are skipped.
pub fn load_snippet_dir(dir: &Path) -> Result<SnippetCollection> {
    let mut collection = SnippetCollection::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if MediaType::from_path(path).is_none() {
            tracing::trace!(path = %path.display(), "Skipping non-markup file");
            continue;
        }
        let (identity, snippet) = load_snippet(path)?;
        tracing::debug!(path = %path.display(), id = %identity, "Loaded snippet");
        collection.add(identity, snippet);
    }
    Ok(collection)
}

/// Read a JSON view model.
pub fn load_model(path: &Path) -> Result<Value> {
    let content = read(path)?;
    let json: serde_json::Value =
        serde_json::from_str(&content).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(json_to_value(json))
}

/// Paths of the markup files directly in `dir`, sorted.
pub fn markup_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && MediaType::from_path(entry.path()).is_some() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_from_extension() {
        assert_eq!(MediaType::from_path(Path::new("a/page.XHTML")), Some(MediaType::Xhtml));
        assert_eq!(MediaType::from_path(Path::new("icon.svg")), Some(MediaType::Svg));
        assert_eq!(MediaType::from_path(Path::new("index.htm")), Some(MediaType::Html));
        assert_eq!(MediaType::from_path(Path::new("style.css")), None);
        assert_eq!(MediaType::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_unsupported_media_type() {
        let err = load_document(Path::new("notes.txt")).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported media type for notes.txt");
    }

    #[test]
    fn test_identity_prefers_root_id() {
        let with_id = Document::parse(r#"<div id="nav"/>"#).unwrap();
        let without = Document::parse("<div/>").unwrap();
        let path = Path::new("parts/footer.xhtml");
        assert_eq!(identity_for(&with_id, path).unwrap().as_str(), "nav");
        assert_eq!(identity_for(&without, path).unwrap().as_str(), "footer");
        assert!(identity_for(&without, Path::new("my part.xml")).is_err());
    }
}
