//! Render backend trait and shared types.
//!
//! The [`RenderBackend`] trait defines the three transforms every page goes
//! through: markdown conversion, template rendering and minification. The
//! production implementation is [`StandardBackend`](super::StandardBackend).
//! Page tasks share one backend by reference across worker threads, hence
//! the `Sync` bound.

use crate::document::Document;
use crate::types::IndexEntry;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    Missing(PathBuf),
    #[error("template parse error: {0}")]
    Parse(String),
    #[error("template render error: {0}")]
    Render(String),
}

#[derive(Error, Debug)]
#[error("{kind} minification failed: {reason}")]
pub struct MinifyError {
    pub kind: MinifyKind,
    pub reason: String,
}

/// Template or minify failure while producing a page.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Minify(#[from] MinifyError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinifyKind {
    Html,
    Css,
}

impl fmt::Display for MinifyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MinifyKind::Html => f.write_str("HTML"),
            MinifyKind::Css => f.write_str("CSS"),
        }
    }
}

/// Data handed to the `page` template.
///
/// Field names are the template's vocabulary: `{{site_name}}`, `{{title}}`,
/// `{{added}}`, `{{index}}`, `{{filebase}}`, `{{{body}}}`, and
/// `{{#each entries}}` with `title`, `added`, `date` and `link` per entry.
#[derive(Debug, Serialize)]
pub struct PageContext<'a> {
    pub site_name: &'a str,
    pub title: &'a str,
    pub added: i64,
    pub index: bool,
    pub filebase: &'a str,
    pub body: Cow<'a, str>,
    pub entries: &'a [IndexEntry],
}

impl<'a> PageContext<'a> {
    pub fn new(site_name: &'a str, doc: &'a Document, entries: &'a [IndexEntry]) -> Self {
        Self {
            site_name,
            title: &doc.title,
            added: doc.added,
            index: doc.is_index,
            filebase: &doc.file_base,
            body: String::from_utf8_lossy(&doc.body),
            entries,
        }
    }
}

/// Trait for render backends.
pub trait RenderBackend: Sync {
    /// Convert a markdown body to HTML. Pure and infallible.
    fn markdown(&self, source: &[u8]) -> Vec<u8>;

    /// Render a page through the `page` template.
    fn render_page(&self, page: &PageContext<'_>) -> Result<Vec<u8>, TemplateError>;

    /// Minify HTML or CSS.
    fn minify(&self, kind: MinifyKind, input: &[u8]) -> Result<Vec<u8>, MinifyError>;
}

/// Template then minify: the path shared by posts and the index page.
pub fn render_document(
    backend: &impl RenderBackend,
    page: &PageContext<'_>,
) -> Result<Vec<u8>, RenderError> {
    let html = backend.render_page(page)?;
    Ok(backend.minify(MinifyKind::Html, &html)?)
}
