//! Shared test utilities for the inkpress test suite.
//!
//! [`TestSite`] is an empty site laid out in a temp directory, with writers
//! for source documents, stylesheets and assets. [`setup_fixtures`] copies
//! the complete example site under `fixtures/` instead.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let site = TestSite::new();
//! site.write_index("Home");
//! site.write_post("first.md", "First Post", 1_577_880_000);
//! let summary = build_with_backend(&site.config, &MockBackend::new(), None).unwrap();
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::{CSS_DIR, SiteConfig};

/// Page template used by tests that render through the real backend.
pub const TEST_TEMPLATE: &str = "<!DOCTYPE html><html><head><title>{{title}}</title></head>\
<body><h1>{{site_name}}</h1>{{{body}}}\
{{#each entries}}<a href=\"{{link}}\">{{date}} {{title}}</a>{{/each}}</body></html>";

// =========================================================================
// Fixture setup
// =========================================================================

/// An empty site in a temp directory with the full input/output layout.
pub struct TestSite {
    _tmp: TempDir,
    pub config: SiteConfig,
}

impl TestSite {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let config = SiteConfig {
            name: "Test Site".into(),
            input: tmp.path().join("site"),
            output: tmp.path().join("public"),
            ..SiteConfig::default()
        };
        config.ensure_layout().unwrap();
        Self { _tmp: tmp, config }
    }

    pub fn write_source(&self, name: &str, content: &str) -> PathBuf {
        let path = self.config.src_dir().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn write_index(&self, title: &str) -> PathBuf {
        self.write_source(
            "index.md",
            &format!("---\ntitle: {title}\nindex: true\n---\nWelcome\n"),
        )
    }

    pub fn write_post(&self, name: &str, title: &str, added: i64) -> PathBuf {
        self.write_source(
            name,
            &format!("---\ntitle: {title}\nadded: {added}\n---\nBody of {title}\n"),
        )
    }

    pub fn write_css(&self, name: &str, content: &str) {
        fs::write(self.config.input.join(CSS_DIR).join(name), content).unwrap();
    }

    pub fn write_asset(&self, dir: &str, name: &str, bytes: &[u8]) {
        fs::write(self.config.input.join(dir).join(name), bytes).unwrap();
    }

    pub fn write_template(&self, source: &str) {
        fs::write(self.config.template_path(), source).unwrap();
    }
}

/// Copy `fixtures/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use crate::pipeline::build;

    #[test]
    fn fixture_site_builds_end_to_end() {
        let tmp = setup_fixtures();
        let config = load_config(&tmp.path().join("site.yaml")).unwrap();
        let summary = build(&config, None).unwrap();

        assert!(summary.failures.is_empty(), "{:?}", summary.failures);
        assert_eq!(summary.pages.len(), 2);
        let index = fs::read_to_string(&summary.index).unwrap();
        let newer = index.find("second_post.html").unwrap();
        let older = index.find("hello_world.html").unwrap();
        assert!(newer < older);
    }

    #[test]
    fn test_site_renders_with_real_backend() {
        let site = TestSite::new();
        site.write_template(TEST_TEMPLATE);
        site.write_index("Home");
        site.write_post("a.md", "Only Post", 0);

        let summary = build(&site.config, None).unwrap();
        let post = fs::read_to_string(site.config.output.join("only_post.html")).unwrap();
        assert!(post.contains("<title>Only Post</title>"));
        assert!(post.contains("Body of Only Post"));
        assert!(summary.stylesheet.is_some());
    }
}
