//! Index page aggregation.
//!
//! Runs once, after every page task has finished. Takes the single index
//! document and the entries of all published posts, dates and sorts the
//! entries (newest first), and renders `index.html` through the same
//! template/minify path as the posts.

use crate::config::SiteConfig;
use crate::document::{Document, INDEX_FILE_BASE};
use crate::render::{PageContext, RenderBackend, RenderError, render_document};
use crate::types::IndexEntry;
use chrono::{Local, TimeZone};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// `MM DD YYYY`, zero padded.
pub const DATE_FORMAT: &str = "%m %d %Y";

#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("no index document: mark one page with `index: true`")]
    NoIndex,
    #[error("more than one index document: {}", list_paths(.0))]
    MultipleIndexes(Vec<PathBuf>),
    #[error("cannot render index page: {0}")]
    Render(#[from] RenderError),
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn list_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Exactly one index document must exist.
pub fn resolve_index(mut docs: Vec<Document>) -> Result<Document, AggregationError> {
    match docs.len() {
        0 => Err(AggregationError::NoIndex),
        1 => Ok(docs.remove(0)),
        _ => Err(AggregationError::MultipleIndexes(
            docs.into_iter().map(|d| d.source).collect(),
        )),
    }
}

/// Format `added` as a calendar date in `tz`.
///
/// Timestamps the zone cannot represent yield an empty string.
pub fn display_date<Tz: TimeZone>(added: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    tz.timestamp_opt(added, 0)
        .earliest()
        .map(|dt| dt.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Newest first. Stable: entries with equal `added` keep their order.
pub fn sort_entries(entries: &mut [IndexEntry]) {
    entries.sort_by(|a, b| b.added.cmp(&a.added));
}

/// Fill in display dates, sort, and prepare the entries for rendering.
pub fn prepare_entries<Tz: TimeZone>(mut entries: Vec<IndexEntry>, tz: &Tz) -> Vec<IndexEntry>
where
    Tz::Offset: std::fmt::Display,
{
    for entry in &mut entries {
        entry.display_date = display_date(entry.added, tz);
    }
    sort_entries(&mut entries);
    entries
}

/// Render and write `<out>/index.html`.
pub fn aggregate(
    index_doc: &Document,
    entries: Vec<IndexEntry>,
    config: &SiteConfig,
    backend: &impl RenderBackend,
) -> Result<PathBuf, AggregationError> {
    let entries = prepare_entries(entries, &Local);
    let html = render_document(backend, &PageContext::new(&config.name, index_doc, &entries))?;

    let output = config.output.join(format!("{INDEX_FILE_BASE}.html"));
    fs::write(&output, html).map_err(|source| AggregationError::Write {
        path: output.clone(),
        source,
    })?;
    Ok(output)
}
