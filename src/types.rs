//! Shared types passed between pipeline stages.
//!
//! Page tasks produce [`Outcome`]s, the aggregator consumes [`IndexEntry`]s,
//! and every stage can report progress as a [`BuildEvent`].

use crate::assets::AssetGroup;
use crate::document::{Document, FrontmatterError};
use crate::render::RenderError;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// One published post as listed on the index page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub title: String,
    /// Unix seconds, the sort key.
    pub added: i64,
    /// `MM DD YYYY`, filled in by the aggregator.
    #[serde(rename = "date")]
    pub display_date: String,
    /// Output file name relative to the site root, e.g. `hello_world.html`.
    pub link: String,
}

impl IndexEntry {
    pub fn new(title: impl Into<String>, added: i64, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            added,
            display_date: String::new(),
            link: link.into(),
        }
    }
}

/// Result of compiling one source document.
#[derive(Debug)]
pub enum Outcome {
    /// The index document; rendered after every post is known.
    IndexDeferred(Document),
    /// A post was written to disk.
    PostPublished(IndexEntry),
    /// The task failed; siblings are unaffected.
    Failed(TaskError),
}

/// A failure local to one task. Reported, never fatal to the build.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid frontmatter in {path}: {source}")]
    Frontmatter {
        path: PathBuf,
        source: FrontmatterError,
    },
    #[error("{path}: title {title:?} does not produce a usable file name")]
    EmptySlug { path: PathBuf, title: String },
    #[error("{path}: added timestamp {added} is out of range")]
    Timestamp { path: PathBuf, added: i64 },
    #[error("{path}: {slug}.html is claimed by {other}")]
    SlugCollision {
        path: PathBuf,
        slug: String,
        other: PathBuf,
    },
    #[error("{path}: {slug}.html is reserved")]
    ReservedSlug { path: PathBuf, slug: String },
    #[error("syntax theme {name:?}: {reason}")]
    SyntaxTheme { name: String, reason: String },
    #[error("cannot render {path}: {source}")]
    Render {
        path: PathBuf,
        source: RenderError,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot list {path}: {source}")]
    List {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("cannot copy {path}: {source}")]
    Copy {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Progress reported by the pipeline while it runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    Discovered { documents: usize, workers: usize },
    PagePublished { title: String, link: String },
    IndexDeferred { source: PathBuf },
    StylesMerged { sources: usize, output: PathBuf },
    AssetsCopied { group: AssetGroup, files: usize },
    IndexWritten { entries: usize, output: PathBuf },
    TaskFailed { message: String },
}

impl BuildEvent {
    pub fn is_failure(&self) -> bool {
        matches!(self, BuildEvent::TaskFailed { .. })
    }
}
