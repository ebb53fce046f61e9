//! Informational pages (terms, FAQ, delivery, returns, privacy).
//!
//! Markdown files with YAML front matter are loaded from `<content_dir>/pages`
//! at startup and rendered to HTML once. The file stem is the page slug.
//!
//! ```markdown
//! ---
//! title: Livraison
//! description: Délais et zones de livraison
//! updated_at: 2026-03-01
//! ---
//!
//! Nous livrons à Brazzaville et Pointe-Noire...
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use comrak::{Options, markdown_to_html};
use gray_matter::{Matter, ParsedEntity, engine::YAML};
use serde::{Deserialize, Serialize};

/// Front matter of a page.
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_at: Option<NaiveDate>,
}

/// A rendered page, as served by `GET /api/pages/{slug}`.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub updated_at: Option<NaiveDate>,
    pub html: String,
}

/// Content store holding every page in memory.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    pages: Arc<HashMap<String, Page>>,
}

impl ContentStore {
    /// Load all pages under `content_dir/pages`.
    ///
    /// A missing directory yields an empty store. Files that fail to parse
    /// are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Io` if the directory exists but cannot be read.
    pub fn load(content_dir: &Path) -> Result<Self, ContentError> {
        let dir = content_dir.join("pages");
        let mut pages = HashMap::new();

        if !dir.exists() {
            tracing::warn!(dir = %dir.display(), "Pages directory does not exist");
            return Ok(Self::default());
        }

        let entries = std::fs::read_dir(&dir).map_err(|e| ContentError::Io(e.to_string()))?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "md") {
                continue;
            }
            match load_page(&path) {
                Ok(page) => {
                    tracing::debug!(slug = %page.slug, "Loaded page");
                    pages.insert(page.slug.clone(), page);
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Failed to load page");
                }
            }
        }

        Ok(Self {
            pages: Arc::new(pages),
        })
    }

    /// Get a page by slug.
    #[must_use]
    pub fn get_page(&self, slug: &str) -> Option<&Page> {
        self.pages.get(slug)
    }

    /// Number of loaded pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

fn load_page(path: &Path) -> Result<Page, ContentError> {
    let source = std::fs::read_to_string(path).map_err(|e| ContentError::Io(e.to_string()))?;

    let slug = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ContentError::Parse("Invalid filename".to_string()))?;

    parse_page(slug, &source)
}

/// Parse front matter and render the body of one page.
fn parse_page(slug: &str, source: &str) -> Result<Page, ContentError> {
    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<PageMeta> = matter
        .parse(source)
        .map_err(|e| ContentError::Parse(format!("Failed to parse front matter: {e}")))?;
    let meta = parsed
        .data
        .ok_or_else(|| ContentError::Parse("Missing front matter".to_string()))?;

    Ok(Page {
        slug: slug.to_owned(),
        title: meta.title,
        description: meta.description,
        updated_at: meta.updated_at,
        html: render_markdown(&parsed.content),
    })
}

/// Render markdown with the GFM extensions used by the pages. Raw HTML is
/// escaped.
fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.header_ids = Some(String::new());

    markdown_to_html(content, &options)
}

/// Content loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const LIVRAISON: &str = "---
title: Livraison
description: Délais et zones de livraison
updated_at: 2026-03-01
---

## Zones

| Ville | Délai |
|---|---|
| Brazzaville | 48 h |
";

    #[test]
    fn test_parse_page() {
        let page = parse_page("livraison", LIVRAISON).unwrap();

        assert_eq!(page.slug, "livraison");
        assert_eq!(page.title, "Livraison");
        assert_eq!(page.description.as_deref(), Some("Délais et zones de livraison"));
        assert_eq!(page.updated_at, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert!(page.html.contains("<table>"));
        assert!(page.html.contains("Brazzaville"));
    }

    #[test]
    fn test_parse_page_requires_front_matter() {
        let err = parse_page("faq", "# Questions fréquentes\n").unwrap_err();
        assert!(matches!(err, ContentError::Parse(_)));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let page = parse_page("x", "---\ntitle: X\n---\n<script>alert(1)</script>\n").unwrap();
        assert!(!page.html.contains("<script>"));
    }

    #[test]
    fn test_missing_directory_gives_empty_store() {
        let store = ContentStore::load(Path::new("/nonexistent/mayombe-content")).unwrap();
        assert!(store.is_empty());
        assert!(store.get_page("faq").is_none());
    }

    #[test]
    fn test_bundled_pages_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("content");
        let store = ContentStore::load(&dir).unwrap();

        for slug in [
            "conditions-generales",
            "faq",
            "livraison",
            "retours",
            "confidentialite",
        ] {
            let page = store.get_page(slug).unwrap();
            assert!(!page.title.is_empty());
            assert!(!page.html.is_empty());
        }
    }
}
