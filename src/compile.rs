//! Page compilation: one source file in, one [`Outcome`] out.
//!
//! ```text
//! read → decode frontmatter → markdown → index? ──yes──→ IndexDeferred
//!                                           │
//!                                           no
//!                                           ↓
//!               claim slug → template → minify → write <slug>.html → PostPublished
//! ```
//!
//! Every failure becomes [`Outcome::Failed`]; a task never panics and never
//! affects its siblings. A post that fails after claiming its slug releases
//! it again.

use crate::config::SiteConfig;
use crate::document::Document;
use crate::naming::{ClaimRejected, SlugClaims};
use crate::render::{PageContext, RenderBackend, render_document};
use crate::types::{IndexEntry, Outcome, TaskError};
use chrono::DateTime;
use std::fs;
use std::path::{Path, PathBuf};

/// Compile the document at `path`.
pub fn compile_page(
    path: &Path,
    config: &SiteConfig,
    backend: &impl RenderBackend,
    claims: &SlugClaims,
) -> Outcome {
    let doc = match Document::load(path, backend) {
        Ok(doc) => doc,
        Err(e) => return Outcome::Failed(e),
    };
    if doc.is_index {
        return Outcome::IndexDeferred(doc);
    }
    match publish(&doc, config, backend, claims) {
        Ok(link) => Outcome::PostPublished(IndexEntry::new(doc.title, doc.added, link)),
        Err(e) => Outcome::Failed(e),
    }
}

/// Render a post and write it. Returns the link relative to the site root.
fn publish(
    doc: &Document,
    config: &SiteConfig,
    backend: &impl RenderBackend,
    claims: &SlugClaims,
) -> Result<String, TaskError> {
    if doc.file_base.is_empty() {
        return Err(TaskError::EmptySlug {
            path: doc.source.clone(),
            title: doc.title.clone(),
        });
    }
    if DateTime::from_timestamp(doc.added, 0).is_none() {
        return Err(TaskError::Timestamp {
            path: doc.source.clone(),
            added: doc.added,
        });
    }
    claims
        .claim(&doc.file_base, &doc.source)
        .map_err(|rejected| match rejected {
            ClaimRejected::Taken(other) => TaskError::SlugCollision {
                path: doc.source.clone(),
                slug: doc.file_base.clone(),
                other,
            },
            ClaimRejected::Reserved => TaskError::ReservedSlug {
                path: doc.source.clone(),
                slug: doc.file_base.clone(),
            },
        })?;

    write_post(doc, config, backend)
        .inspect_err(|_| claims.release(&doc.file_base, &doc.source))
}

fn write_post(
    doc: &Document,
    config: &SiteConfig,
    backend: &impl RenderBackend,
) -> Result<String, TaskError> {
    let html = render_document(backend, &PageContext::new(&config.name, doc, &[])).map_err(
        |source| TaskError::Render {
            path: doc.source.clone(),
            source,
        },
    )?;

    let link = format!("{}.html", doc.file_base);
    let output: PathBuf = config.output.join(&link);
    fs::write(&output, html).map_err(|source| TaskError::Write {
        path: output.clone(),
        source,
    })?;
    Ok(link)
}
