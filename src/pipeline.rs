//! Build coordination: discovery, parallel dispatch, barrier, aggregation.
//!
//! ```text
//! Init ─→ Discovering ─→ Dispatched ─→ Barrier ─→ Aggregating ─→ Done
//!   │          │                                       │
//!   └──────────┴──────────────→ Aborted ←──────────────┘
//! ```
//!
//! Every document gets its own task, and so do the stylesheet merge and each
//! [`AssetGroup`]. All of them run inside one `rayon` scope on a pool sized
//! by [`effective_workers`]; the end of the scope is the barrier. Page
//! outcomes travel over a channel bounded to the document count, so no
//! producer ever blocks, and are put back into discovery order before the
//! index is built. Same-timestamp posts therefore list in file-name order on
//! every run.
//!
//! Task failures are reported and collected in [`BuildSummary::failures`];
//! only [`BuildError`]s abort the build.

use crate::assets::{self, AssetGroup};
use crate::compile::compile_page;
use crate::config::{ConfigError, SiteConfig, effective_workers};
use crate::document::Document;
use crate::index::{self, AggregationError};
use crate::naming::SlugClaims;
use crate::render::{RenderBackend, StandardBackend, TemplateError};
use crate::types::{BuildEvent, IndexEntry, Outcome, TaskError};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Sender, sync_channel};
use thiserror::Error;
use walkdir::WalkDir;

/// Source documents are `*.md` files directly inside `<in>/src/`.
pub const SOURCE_EXTENSION: &str = "md";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("cannot list {dir}: {source}")]
    Discovery {
        dir: PathBuf,
        source: walkdir::Error,
    },
    #[error("no documents in {dir}: run `inkpress new-page` first")]
    NoDocuments { dir: PathBuf },
    #[error("cannot start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

/// What a finished build produced.
#[derive(Debug)]
pub struct BuildSummary {
    /// Post pages written, in index order.
    pub pages: Vec<PathBuf>,
    pub index: PathBuf,
    /// `None` when the stylesheet merge failed.
    pub stylesheet: Option<PathBuf>,
    pub assets_copied: usize,
    pub failures: Vec<TaskError>,
}

enum AssetOutcome {
    Styles(Result<PathBuf, TaskError>),
    Copied(AssetGroup, Result<usize, TaskError>),
}

fn emit(events: Option<&Sender<BuildEvent>>, event: BuildEvent) {
    if let Some(tx) = events {
        // A closed receiver only means nobody is listening
        let _ = tx.send(event);
    }
}

fn report_failure(events: Option<&Sender<BuildEvent>>, err: &TaskError) {
    emit(
        events,
        BuildEvent::TaskFailed {
            message: err.to_string(),
        },
    );
}

/// List source documents, sorted by file name.
pub fn discover_documents(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let mut documents = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| BuildError::Discovery {
            dir: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION)
        {
            documents.push(path.to_path_buf());
        }
    }
    if documents.is_empty() {
        return Err(BuildError::NoDocuments {
            dir: dir.to_path_buf(),
        });
    }
    Ok(documents)
}

/// Build the site with the production render backend.
pub fn build(
    config: &SiteConfig,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildSummary, BuildError> {
    config.ensure_layout()?;
    let backend = StandardBackend::from_config(config)?;
    build_with_backend(config, &backend, events)
}

/// Build the site using a specific backend (allows testing with mock).
///
/// Expects the directory layout to exist already.
pub fn build_with_backend(
    config: &SiteConfig,
    backend: &impl RenderBackend,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildSummary, BuildError> {
    let documents = discover_documents(&config.src_dir())?;
    let workers = effective_workers(config);
    emit(
        events.as_ref(),
        BuildEvent::Discovered {
            documents: documents.len(),
            workers,
        },
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()?;
    let claims = SlugClaims::new();
    let (outcome_tx, outcome_rx) = sync_channel(documents.len());
    let (asset_tx, asset_rx) = sync_channel(1 + AssetGroup::ALL.len());

    pool.scope(|s| {
        let claims = &claims;
        for (position, path) in documents.iter().enumerate() {
            let tx = outcome_tx.clone();
            let events = events.clone();
            s.spawn(move |_| {
                let outcome = compile_page(path, config, backend, claims);
                match &outcome {
                    Outcome::PostPublished(entry) => emit(
                        events.as_ref(),
                        BuildEvent::PagePublished {
                            title: entry.title.clone(),
                            link: entry.link.clone(),
                        },
                    ),
                    Outcome::IndexDeferred(doc) => emit(
                        events.as_ref(),
                        BuildEvent::IndexDeferred {
                            source: doc.source.clone(),
                        },
                    ),
                    Outcome::Failed(err) => report_failure(events.as_ref(), err),
                }
                let _ = tx.send((position, outcome));
            });
        }

        let tx = asset_tx.clone();
        let styles_events = events.clone();
        s.spawn(move |_| {
            let result = assets::merge_styles(config, backend);
            match &result {
                Ok(output) => emit(
                    styles_events.as_ref(),
                    BuildEvent::StylesMerged {
                        sources: config.css_merge_order.len(),
                        output: output.clone(),
                    },
                ),
                Err(err) => report_failure(styles_events.as_ref(), err),
            }
            let _ = tx.send(AssetOutcome::Styles(result));
        });

        for group in AssetGroup::ALL {
            let tx = asset_tx.clone();
            let events = events.clone();
            s.spawn(move |_| {
                let result = assets::copy_asset_dir(group, config);
                match &result {
                    Ok(files) => emit(
                        events.as_ref(),
                        BuildEvent::AssetsCopied {
                            group,
                            files: *files,
                        },
                    ),
                    Err(err) => report_failure(events.as_ref(), err),
                }
                let _ = tx.send(AssetOutcome::Copied(group, result));
            });
        }
    });
    drop(outcome_tx);
    drop(asset_tx);

    let mut outcomes: Vec<(usize, Outcome)> = outcome_rx.into_iter().collect();
    outcomes.sort_by_key(|(position, _)| *position);

    let mut index_docs: Vec<Document> = Vec::new();
    let mut entries: Vec<IndexEntry> = Vec::new();
    let mut failures = Vec::new();
    for (_, outcome) in outcomes {
        match outcome {
            Outcome::IndexDeferred(doc) => index_docs.push(doc),
            Outcome::PostPublished(entry) => entries.push(entry),
            Outcome::Failed(err) => failures.push(err),
        }
    }

    let mut stylesheet = None;
    let mut assets_copied = 0;
    for outcome in asset_rx {
        match outcome {
            AssetOutcome::Styles(Ok(path)) => stylesheet = Some(path),
            AssetOutcome::Copied(_, Ok(files)) => assets_copied += files,
            AssetOutcome::Styles(Err(err)) | AssetOutcome::Copied(_, Err(err)) => {
                failures.push(err)
            }
        }
    }

    let index_doc = index::resolve_index(index_docs)?;
    let entry_count = entries.len();
    let mut sorted = entries.clone();
    index::sort_entries(&mut sorted);
    let pages = sorted
        .iter()
        .map(|entry| config.output.join(&entry.link))
        .collect();

    let index_path = index::aggregate(&index_doc, entries, config, backend)?;
    emit(
        events.as_ref(),
        BuildEvent::IndexWritten {
            entries: entry_count,
            output: index_path.clone(),
        },
    );

    Ok(BuildSummary {
        pages,
        index: index_path,
        stylesheet,
        assets_copied,
        failures,
    })
}
