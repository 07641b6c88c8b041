//! Site configuration module.
//!
//! Handles loading, validating and resolving the site's YAML config file.
//! The file is read once at startup; the resulting [`SiteConfig`] is never
//! mutated afterwards and is shared by reference with every build task.
//!
//! ## Configuration Options
//!
//! ```yaml
//! # All options are optional - defaults shown below
//! name: My Site            # Site name, available to templates as site_name
//! in: site                 # Input directory (relative to this file)
//! out: public              # Output directory (relative to this file)
//! css-merge-order: []      # Stylesheets from <in>/css, merged in this order
//! syntax-theme: theme.yaml # Code block colors (relative to this file)
//! max-workers: 4           # Parallel build workers (omit for auto = CPU cores)
//! ```
//!
//! ## Directory Layout
//!
//! ```text
//! <in>/
//! ├── src/      # Markdown source documents
//! ├── img/      # Images, copied to <out>/img/
//! ├── css/      # Stylesheets, merged into <out>/all.css
//! ├── fonts/    # Fonts, copied to <out>/fonts/
//! └── tmp/      # Templates (`page`)
//! ```
//!
//! Missing directories are created by [`SiteConfig::ensure_layout`].
//!
//! ## Syntax Theme
//!
//! ```yaml
//! name: paper
//! styles:
//!   keyword: "bold #204a87"
//!   comment: "italic #8f5902"
//!   normal: "#000000 bg:#f8f8f8"
//! ```
//!
//! Keys are limited to `keyword`, `name`, `literal`, `string`, `number`,
//! `operator`, `punctuation`, `comment` and `normal`. Each value is a list of
//! `bold`, `italic`, `underline`, `#rrggbb` (text color) and `bg:#rrggbb`
//! (background). The theme is compiled to CSS and appended to `all.css`.
//!
//! Unknown keys are rejected everywhere to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SRC_DIR: &str = "src";
pub const IMG_DIR: &str = "img";
pub const CSS_DIR: &str = "css";
pub const FONTS_DIR: &str = "fonts";
pub const TEMPLATE_DIR: &str = "tmp";
pub const PAGE_TEMPLATE_FILE: &str = "page";
pub const MERGED_STYLESHEET: &str = "all.css";

/// Input subdirectories created on startup.
pub const INPUT_DIRS: &[&str] = &[SRC_DIR, IMG_DIR, CSS_DIR, FONTS_DIR, TEMPLATE_DIR];

/// Output subdirectories created on startup.
pub const OUTPUT_DIRS: &[&str] = &[IMG_DIR, FONTS_DIR];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("invalid syntax theme {path}: {reason}")]
    SyntaxTheme { path: PathBuf, reason: String },
}

/// Site configuration loaded from the YAML config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Site name, exposed to templates.
    pub name: String,
    /// Input directory.
    #[serde(rename = "in")]
    pub input: PathBuf,
    /// Output directory.
    #[serde(rename = "out")]
    pub output: PathBuf,
    /// Stylesheets from `<in>/css`, concatenated in exactly this order.
    pub css_merge_order: Vec<String>,
    /// Path of the syntax theme file.
    #[serde(alias = "chroma-style", skip_serializing_if = "Option::is_none")]
    pub syntax_theme: Option<PathBuf>,
    /// Maximum number of parallel build workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
    /// The theme loaded from `syntax_theme`.
    #[serde(skip)]
    pub syntax: Option<SyntaxTheme>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "My Site".to_string(),
            input: PathBuf::from("site"),
            output: PathBuf::from("public"),
            css_merge_order: Vec::new(),
            syntax_theme: None,
            max_workers: None,
            syntax: None,
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Validation("name must not be empty".into()));
        }
        if self.input.as_os_str().is_empty() || self.output.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "in and out must not be empty".into(),
            ));
        }
        if self.input == self.output {
            return Err(ConfigError::Validation(
                "in and out must be different directories".into(),
            ));
        }
        if self.max_workers == Some(0) {
            return Err(ConfigError::Validation(
                "max-workers must be at least 1".into(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for file in &self.css_merge_order {
            if file.is_empty() || file.contains(['/', '\\']) || file == "." || file == ".." {
                return Err(ConfigError::Validation(format!(
                    "css-merge-order entry {file:?} must be a file name inside {CSS_DIR}/"
                )));
            }
            if !seen.insert(file) {
                return Err(ConfigError::Validation(format!(
                    "css-merge-order lists {file:?} more than once"
                )));
            }
        }
        Ok(())
    }

    /// Resolve relative `in`, `out` and `syntax-theme` against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.input, &mut self.output] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        if let Some(theme) = &mut self.syntax_theme
            && theme.is_relative()
        {
            *theme = base.join(&*theme);
        }
    }

    /// Create the input and output directory layout.
    pub fn ensure_layout(&self) -> Result<(), ConfigError> {
        let input = INPUT_DIRS.iter().map(|dir| self.input.join(dir));
        let output = OUTPUT_DIRS.iter().map(|dir| self.output.join(dir));
        for path in input.chain(output) {
            fs::create_dir_all(&path).map_err(|source| ConfigError::CreateDir { path, source })?;
        }
        Ok(())
    }

    pub fn src_dir(&self) -> PathBuf {
        self.input.join(SRC_DIR)
    }

    pub fn css_dir(&self) -> PathBuf {
        self.input.join(CSS_DIR)
    }

    pub fn template_path(&self) -> PathBuf {
        self.input.join(TEMPLATE_DIR).join(PAGE_TEMPLATE_FILE)
    }
}

/// Resolve the effective worker count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_workers(config: &SiteConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_workers.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Syntax theme
// =============================================================================

/// Token classes a syntax theme can style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    Keyword,
    Name,
    Literal,
    String,
    Number,
    Operator,
    Punctuation,
    Comment,
    Normal,
}

impl TokenClass {
    /// CSS selector for the scope-named spans inside the `.highlight` block.
    ///
    /// Code blocks carry one span per token, classed with the token's scope
    /// atoms (`string quoted double rust`), so each class selects by scope.
    /// Operators and numbers are narrower than keywords and literals and win
    /// on specificity.
    pub fn selector(self) -> &'static str {
        match self {
            TokenClass::Keyword => ".highlight .keyword,.highlight .storage",
            TokenClass::Name => ".highlight .entity.name,.highlight .variable",
            TokenClass::Literal => ".highlight .constant",
            TokenClass::String => ".highlight .string",
            TokenClass::Number => ".highlight .constant.numeric",
            TokenClass::Operator => ".highlight .keyword.operator",
            TokenClass::Punctuation => ".highlight .punctuation",
            TokenClass::Comment => ".highlight .comment",
            TokenClass::Normal => ".highlight",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyntaxTheme {
    pub name: String,
    #[serde(default)]
    pub styles: BTreeMap<TokenClass, String>,
}

impl SyntaxTheme {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let invalid = |reason: String| ConfigError::SyntaxTheme {
            path: path.to_path_buf(),
            reason,
        };
        let theme: SyntaxTheme = serde_yaml::from_str(&content).map_err(|e| invalid(e.to_string()))?;
        theme.to_css().map_err(invalid)?;
        Ok(theme)
    }

    /// Compile the theme to CSS rules.
    pub fn to_css(&self) -> Result<String, String> {
        let mut css = String::new();
        for (class, entry) in &self.styles {
            let declarations = style_declarations(entry)?;
            let _ = write!(css, "{}{{{}}}", class.selector(), declarations);
        }
        Ok(css)
    }
}

/// Translate a style entry like `bold #ff0000 bg:#ffffff` into CSS.
fn style_declarations(entry: &str) -> Result<String, String> {
    let mut out = Vec::new();
    for token in entry.split_whitespace() {
        let declaration = match token {
            "bold" => "font-weight:bold".to_string(),
            "italic" => "font-style:italic".to_string(),
            "underline" => "text-decoration:underline".to_string(),
            _ if token.starts_with("bg:") && is_hex_color(&token[3..]) => {
                format!("background-color:{}", &token[3..])
            }
            _ if is_hex_color(token) => format!("color:{token}"),
            _ => return Err(format!("unrecognised style {token:?}")),
        };
        out.push(declaration);
    }
    Ok(out.join(";"))
}

fn is_hex_color(s: &str) -> bool {
    s.strip_prefix('#').is_some_and(|hex| {
        matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
    })
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a YAML mapping.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<serde_yaml::Value, ConfigError> {
    Ok(serde_yaml::to_value(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Mappings are merged key-by-key (overlay keys override base keys).
/// - Non-mapping values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
/// - A null overlay (an empty file) leaves base untouched.
pub fn merge_yaml(base: serde_yaml::Value, overlay: serde_yaml::Value) -> serde_yaml::Value {
    use serde_yaml::Value;
    match (base, overlay) {
        (Value::Mapping(mut base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => merge_yaml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged);
            }
            Value::Mapping(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<serde_yaml::Value>) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_yaml(base, ov),
        None => base,
    };
    let config: SiteConfig = serde_yaml::from_value(merged)?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path`.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// resolves relative paths against the file's directory, validates the
/// result and loads the syntax theme if one is named.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let overlay: serde_yaml::Value = serde_yaml::from_str(&content)?;
    let mut config = resolve_config(Some(overlay))?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    config.resolve_paths(base);
    if let Some(theme_path) = &config.syntax_theme {
        config.syntax = Some(SyntaxTheme::load(theme_path)?);
    }
    Ok(config)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_yaml() -> &'static str {
    r##"# inkpress configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.
# Relative paths are resolved against the directory of this file.

# Site name, available to templates as {{site_name}} and used as the title
# of a freshly created index page.
name: My Site

# Input directory. Subdirectories are created when missing:
#   src/    markdown pages (exactly one must have `index: true`)
#   img/    images, copied verbatim to <out>/img/
#   css/    stylesheets, merged into <out>/all.css
#   fonts/  fonts, copied verbatim to <out>/fonts/
#   tmp/    the `page` handlebars template
in: site

# Output directory.
out: public

# Stylesheets from <in>/css/, concatenated in this exact order and minified.
css-merge-order: []

# Syntax theme for code blocks (YAML: name + styles).
# syntax-theme: theme.yaml

# Maximum parallel build workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max-workers: 4
"##
}
