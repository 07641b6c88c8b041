//! Static assets: the merged stylesheet and verbatim directory copies.
//!
//! Both run as independent tasks next to the page tasks and share nothing
//! with them except the read-only config.
//!
//! ```text
//! <in>/css/reset.css ┐
//! <in>/css/main.css  ┼─ concatenate (css-merge-order) ─ + theme ─ minify ─→ <out>/all.css
//! syntax theme       ┘
//!
//! <in>/img/*   ─ copy ─→ <out>/img/*
//! <in>/fonts/* ─ copy ─→ <out>/fonts/*
//! ```

use crate::config::{FONTS_DIR, IMG_DIR, MERGED_STYLESHEET, SiteConfig};
use crate::render::{MinifyKind, RenderBackend, RenderError};
use crate::types::TaskError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A directory copied verbatim from input to output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetGroup {
    Images,
    Fonts,
}

impl AssetGroup {
    pub const ALL: [AssetGroup; 2] = [AssetGroup::Images, AssetGroup::Fonts];

    pub fn dir_name(self) -> &'static str {
        match self {
            AssetGroup::Images => IMG_DIR,
            AssetGroup::Fonts => FONTS_DIR,
        }
    }
}

impl fmt::Display for AssetGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetGroup::Images => f.write_str("images"),
            AssetGroup::Fonts => f.write_str("fonts"),
        }
    }
}

/// Concatenate the configured stylesheets, append the syntax theme, minify,
/// and write `<out>/all.css`.
///
/// An unreadable source or a theme that does not compile aborts the merge;
/// nothing is written in that case.
pub fn merge_styles(config: &SiteConfig, backend: &impl RenderBackend) -> Result<PathBuf, TaskError> {
    let css_dir = config.css_dir();
    let mut merged = Vec::new();
    for name in &config.css_merge_order {
        let path = css_dir.join(name);
        let content = fs::read(&path).map_err(|source| TaskError::Read { path, source })?;
        merged.extend_from_slice(&content);
        merged.push(b'\n');
    }
    if let Some(theme) = &config.syntax {
        let css = theme.to_css().map_err(|reason| TaskError::SyntaxTheme {
            name: theme.name.clone(),
            reason,
        })?;
        merged.extend_from_slice(css.as_bytes());
    }

    let output = config.output.join(MERGED_STYLESHEET);
    let minified = backend
        .minify(MinifyKind::Css, &merged)
        .map_err(|e| TaskError::Render {
            path: output.clone(),
            source: RenderError::Minify(e),
        })?;
    fs::write(&output, minified).map_err(|source| TaskError::Write {
        path: output.clone(),
        source,
    })?;
    Ok(output)
}

/// Copy every regular file of `<in>/<group>/` into `<out>/<group>/`.
///
/// Not recursive. Stops at the first failure; files copied before it stay.
/// Returns the number of files copied.
pub fn copy_asset_dir(group: AssetGroup, config: &SiteConfig) -> Result<usize, TaskError> {
    let from = config.input.join(group.dir_name());
    let to = config.output.join(group.dir_name());
    fs::create_dir_all(&to).map_err(|source| TaskError::Write {
        path: to.clone(),
        source,
    })?;
    copy_files(&from, &to)
}

fn copy_files(from: &Path, to: &Path) -> Result<usize, TaskError> {
    let mut copied = 0;
    for entry in WalkDir::new(from)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| TaskError::List {
            path: from.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let dest = to.join(entry.file_name());
        fs::copy(entry.path(), &dest).map_err(|source| TaskError::Copy {
            path: entry.path().to_path_buf(),
            source,
        })?;
        copied += 1;
    }
    Ok(copied)
}
