//! CLI output formatting for the build.
//!
//! # Output Format
//!
//! ```text
//! Building 3 documents on 8 workers
//!     Published Hello World → hello_world.html
//!     Index deferred (site/src/index.md)
//!     Merged 2 stylesheets → public/all.css
//!     Copied 1 images
//!     Copied 0 fonts
//!     Published Second Post → second_post.html
//! inkpress: cannot read site/src/broken.md: ...
//!     Index lists 2 posts → public/index.html
//!
//! Built 2 pages, 1 asset files, 1 failure
//! ```
//!
//! Progress lines go to stdout, failures to stderr with the program-name
//! prefix. Order between tasks follows completion, not discovery.
//!
//! # Architecture
//!
//! Every `format_*` function is pure and returns strings, so the CLI's
//! printer thread does the I/O and tests check the text.

use crate::pipeline::BuildSummary;
use crate::types::BuildEvent;
use std::fmt::Display;
use std::path::Path;

/// Prefix for everything written to stderr.
pub const PROGRAM_PREFIX: &str = "inkpress: ";

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Prefix an error message with the program name.
pub fn format_error(err: &impl Display) -> String {
    format!("{PROGRAM_PREFIX}{err}")
}

/// Format one pipeline event as a single line.
pub fn format_event(event: &BuildEvent) -> String {
    match event {
        BuildEvent::Discovered { documents, workers } => format!(
            "Building {} on {}",
            plural(*documents, "document", "documents"),
            plural(*workers, "worker", "workers")
        ),
        BuildEvent::PagePublished { title, link } => {
            format!("{}Published {} → {}", indent(1), title, link)
        }
        BuildEvent::IndexDeferred { source } => {
            format!("{}Index deferred ({})", indent(1), source.display())
        }
        BuildEvent::StylesMerged { sources, output } => format!(
            "{}Merged {} → {}",
            indent(1),
            plural(*sources, "stylesheet", "stylesheets"),
            output.display()
        ),
        BuildEvent::AssetsCopied { group, files } => {
            format!("{}Copied {} {}", indent(1), files, group)
        }
        BuildEvent::IndexWritten { entries, output } => format!(
            "{}Index lists {} → {}",
            indent(1),
            plural(*entries, "post", "posts"),
            output.display()
        ),
        BuildEvent::TaskFailed { message } => format_error(message),
    }
}

/// Format the closing summary lines of a build.
pub fn format_summary(summary: &BuildSummary) -> Vec<String> {
    let mut lines = vec![String::new()];
    let mut headline = format!(
        "Built {}, {}",
        plural(summary.pages.len(), "page", "pages"),
        plural(summary.assets_copied, "asset file", "asset files")
    );
    if !summary.failures.is_empty() {
        headline.push_str(&format!(
            ", {}",
            plural(summary.failures.len(), "failure", "failures")
        ));
    }
    lines.push(headline);
    if summary.stylesheet.is_none() {
        lines.push(format!("{}Stylesheet not written", indent(1)));
    }
    lines.push(format!(
        "{}Index: {}",
        indent(1),
        display_relative(&summary.index)
    ));
    lines
}

/// Report where `new-page` wrote its file.
pub fn format_created(path: &Path) -> String {
    format!("Created {}", path.display())
}

fn display_relative(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
