//! Text transforms behind a stable interface.
//!
//! | Operation | Crate |
//! |---|---|
//! | **Markdown → HTML** | `pulldown-cmark` |
//! | **Page template** | `handlebars` (strict mode, template `page`) |
//! | **HTML minify** | `minify-html` |
//! | **CSS minify** | `lightningcss` |
//!
//! The module is split into:
//! - **Backend**: [`RenderBackend`] trait, error types, [`PageContext`]
//! - **Standard**: [`StandardBackend`], the production implementation

pub mod backend;
pub mod standard;

pub use backend::{
    MinifyError, MinifyKind, PageContext, RenderBackend, RenderError, TemplateError,
    render_document,
};
pub use standard::StandardBackend;
