//! # Inkpress
//!
//! A small static blog generator. A directory of markdown files with YAML
//! frontmatter becomes a set of minified HTML pages, one index page listing
//! every post newest first, a merged stylesheet, and verbatim copies of
//! images and fonts.
//!
//! # Architecture: One Parallel Build
//!
//! ```text
//! site.yaml ─→ SiteConfig ─→ discover <in>/src/*.md
//!                                  │
//!        ┌──────────────┬──────────┴───────┬──────────────┐
//!        ↓              ↓                  ↓              ↓
//!   page task …    page task         merge styles    copy img / fonts
//!        │              │                  │              │
//!        └──────────────┴──── barrier ─────┴──────────────┘
//!                                  ↓
//!                    index page (sorted, dated entries)
//! ```
//!
//! Every task runs on a bounded `rayon` pool and reports one outcome. A task
//! failure is reported and the rest of the build goes on; only configuration,
//! discovery and index problems abort it.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | YAML config loading, validation, directory layout, syntax theme |
//! | [`document`] | Frontmatter codec and the parsed source document |
//! | [`naming`] | Title → slug, and concurrent slug ownership |
//! | [`render`] | Markdown, template and minify backend (`StandardBackend` + trait) |
//! | [`compile`] | One source document → one page or a deferred index |
//! | [`index`] | Entry dating and sorting, `index.html` rendering |
//! | [`assets`] | `all.css` merge and image/font copies |
//! | [`pipeline`] | Discovery, dispatch, barrier and aggregation |
//! | [`types`] | Outcomes, entries, task errors and progress events |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Runtime Templates
//!
//! Pages are rendered through a handlebars template read from
//! `<in>/tmp/page`, so the site's look changes without rebuilding the
//! binary. Strict mode turns a misspelled field into an error instead of an
//! empty string.
//!
//! ## No Global State
//!
//! The config and the render backend are built once and passed by reference
//! into every task. Tests swap in a mock backend through
//! [`pipeline::build_with_backend`].

pub mod assets;
pub mod compile;
pub mod config;
pub mod document;
pub mod index;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
