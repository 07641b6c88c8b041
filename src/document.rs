//! Source documents and their frontmatter.
//!
//! A source file is a YAML metadata block followed by a markdown body:
//!
//! ```text
//! ---
//! title: Hello World
//! added: 1577880000
//! ---
//! The markdown body starts here.
//! ```
//!
//! The block is delimited by the literal `---\n`. At most two delimiters are
//! consumed, so a `---\n` inside the body is left alone. A file that does not
//! start with the delimiter has no metadata: the whole file is body.
//!
//! ## Metadata keys
//!
//! | Key | Type | Default |
//! |-----|------|---------|
//! | `title` | string | `""` |
//! | `added` | unix seconds | `0` |
//! | `index` | bool | `false` |
//! | `filebase` | string | slug of `title`, or `index` |
//!
//! Unknown keys are rejected to catch typos early. An explicit `filebase`
//! must already be a slug, so it can never name a path outside the output
//! directory.

use crate::naming::slugify;
use crate::render::RenderBackend;
use crate::types::TaskError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Frontmatter delimiter.
pub const DELIMITER: &[u8] = b"---\n";

/// Output file base of the index document.
pub const INDEX_FILE_BASE: &str = "index";

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("missing closing `---` delimiter")]
    Unterminated,
    #[error("metadata is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("filebase {0:?} is not a slug (lowercase letters, digits and `_` only)")]
    UnsafeFileBase(String),
}

/// Split `input` into decoded metadata and the remaining body.
pub fn decode<T>(input: &[u8]) -> Result<(T, &[u8]), FrontmatterError>
where
    T: DeserializeOwned + Default,
{
    let Some(rest) = input.strip_prefix(DELIMITER) else {
        return Ok((T::default(), input));
    };
    let end = find(rest, DELIMITER).ok_or(FrontmatterError::Unterminated)?;
    let yaml = std::str::from_utf8(&rest[..end])?;
    let body = &rest[end + DELIMITER.len()..];

    if yaml.trim().is_empty() {
        return Ok((T::default(), body));
    }
    Ok((serde_yaml::from_str(yaml)?, body))
}

/// Inverse of [`decode`]: delimiter, YAML, delimiter, body.
pub fn encode<T: Serialize>(meta: &T, body: &[u8]) -> Result<Vec<u8>, FrontmatterError> {
    let yaml = serde_yaml::to_string(meta)?;
    let mut out = Vec::with_capacity(yaml.len() + body.len() + 2 * DELIMITER.len());
    out.extend_from_slice(DELIMITER);
    out.extend_from_slice(yaml.as_bytes());
    out.extend_from_slice(DELIMITER);
    out.extend_from_slice(body);
    Ok(out)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// On-disk metadata block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Frontmatter {
    pub title: String,
    pub added: i64,
    pub index: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub filebase: String,
}

/// One parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    /// Unix seconds.
    pub added: i64,
    pub is_index: bool,
    /// Markdown after parsing; HTML after [`Document::load`].
    pub body: Vec<u8>,
    /// Output file name without `.html`.
    pub file_base: String,
    /// Where the document was read from. Empty for documents built in memory.
    pub source: PathBuf,
}

impl Document {
    /// Parse a source file's bytes without touching the body.
    pub fn parse(input: &[u8], source: &Path) -> Result<Self, FrontmatterError> {
        let (meta, body): (Frontmatter, _) = decode(input)?;
        Self::from_parts(meta, body.to_vec(), source.to_path_buf())
    }

    /// Read, parse, and convert the markdown body to HTML.
    pub fn load(path: &Path, backend: &impl RenderBackend) -> Result<Self, TaskError> {
        let input = fs::read(path).map_err(|source| TaskError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut doc = Self::parse(&input, path).map_err(|source| TaskError::Frontmatter {
            path: path.to_path_buf(),
            source,
        })?;
        doc.body = backend.markdown(&doc.body);
        Ok(doc)
    }

    /// A fresh index document titled after the site.
    pub fn new_index(site_name: &str) -> Self {
        Self {
            title: site_name.to_string(),
            added: 0,
            is_index: true,
            body: Vec::new(),
            file_base: INDEX_FILE_BASE.to_string(),
            source: PathBuf::new(),
        }
    }

    /// A fresh, empty post.
    pub fn new_post(title: &str, added: i64) -> Self {
        Self {
            title: title.to_string(),
            added,
            is_index: false,
            body: Vec::new(),
            file_base: slugify(title),
            source: PathBuf::new(),
        }
    }

    fn from_parts(
        meta: Frontmatter,
        body: Vec<u8>,
        source: PathBuf,
    ) -> Result<Self, FrontmatterError> {
        let file_base = if !meta.filebase.is_empty() {
            if slugify(&meta.filebase) != meta.filebase {
                return Err(FrontmatterError::UnsafeFileBase(meta.filebase));
            }
            meta.filebase
        } else if meta.index {
            INDEX_FILE_BASE.to_string()
        } else {
            slugify(&meta.title)
        };
        Ok(Self {
            title: meta.title,
            added: meta.added,
            is_index: meta.index,
            body,
            file_base,
            source,
        })
    }

    pub fn frontmatter(&self) -> Frontmatter {
        Frontmatter {
            title: self.title.clone(),
            added: self.added,
            index: self.is_index,
            filebase: self.file_base.clone(),
        }
    }

    /// Encode back into source form.
    pub fn to_source(&self) -> Result<Vec<u8>, FrontmatterError> {
        encode(&self.frontmatter(), &self.body)
    }

    /// Write `<file_base>.md` into `dir`, refusing to overwrite.
    pub fn create_in(&self, dir: &Path) -> Result<PathBuf, TaskError> {
        let path = dir.join(format!("{}.md", self.file_base));
        let data = self.to_source().map_err(|source| TaskError::Frontmatter {
            path: path.clone(),
            source,
        })?;
        let write_err = |source| TaskError::Write {
            path: path.clone(),
            source,
        };
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(write_err)?;
        file.write_all(&data).map_err(write_err)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::tests::MockBackend;
    use tempfile::TempDir;

    fn parse(input: &str) -> Document {
        Document::parse(input.as_bytes(), Path::new("src/post.md")).unwrap()
    }

    // =========================================================================
    // Codec
    // =========================================================================

    #[test]
    fn decode_splits_metadata_and_body() {
        let (meta, body): (Frontmatter, _) =
            decode(b"---\ntitle: Hello\nadded: 5\n---\nBody text\n").unwrap();
        assert_eq!(meta.title, "Hello");
        assert_eq!(meta.added, 5);
        assert_eq!(body, b"Body text\n");
    }

    #[test]
    fn decode_without_delimiter_is_all_body() {
        let input = b"# Just markdown\n";
        let (meta, body): (Frontmatter, _) = decode(input).unwrap();
        assert_eq!(meta, Frontmatter::default());
        assert_eq!(body, input);
    }

    #[test]
    fn decode_keeps_later_delimiters_in_body() {
        let (_, body): (Frontmatter, _) =
            decode(b"---\ntitle: A\n---\nabove\n---\nbelow\n").unwrap();
        assert_eq!(body, b"above\n---\nbelow\n");
    }

    #[test]
    fn decode_empty_metadata_block() {
        let (meta, body): (Frontmatter, _) = decode(b"---\n---\nbody").unwrap();
        assert_eq!(meta, Frontmatter::default());
        assert_eq!(body, b"body");
    }

    #[test]
    fn decode_unterminated_block_is_error() {
        let result: Result<(Frontmatter, _), _> = decode(b"---\ntitle: A\nno closing\n");
        assert!(matches!(result, Err(FrontmatterError::Unterminated)));
    }

    #[test]
    fn decode_rejects_unknown_keys() {
        let result: Result<(Frontmatter, _), _> = decode(b"---\ntitel: A\n---\n");
        assert!(matches!(result, Err(FrontmatterError::Yaml(_))));
    }

    #[test]
    fn decode_rejects_wrong_types() {
        let result: Result<(Frontmatter, _), _> = decode(b"---\nadded: yesterday\n---\n");
        assert!(matches!(result, Err(FrontmatterError::Yaml(_))));
    }

    #[test]
    fn encode_then_decode_restores_document() {
        let mut doc = Document::new_post("Hello World", 1_577_880_000);
        doc.body = b"Some *markdown*\n---\nwith a rule\n".to_vec();
        let bytes = doc.to_source().unwrap();
        assert!(bytes.starts_with(DELIMITER));

        let back = Document::parse(&bytes, Path::new("")).unwrap();
        assert_eq!(back, doc);
    }

    // =========================================================================
    // Document
    // =========================================================================

    #[test]
    fn file_base_derived_from_title() {
        let doc = parse("---\ntitle: Hello World\n---\n");
        assert_eq!(doc.file_base, "hello_world");
        assert!(!doc.is_index);
    }

    #[test]
    fn explicit_filebase_wins() {
        let doc = parse("---\ntitle: Hello World\nfilebase: greeting\n---\n");
        assert_eq!(doc.file_base, "greeting");
    }

    #[test]
    fn explicit_filebase_must_be_a_slug() {
        for filebase in ["../../escaped", "/tmp/x", "nested/post", "Hello World"] {
            let input = format!("---\ntitle: Hi\nfilebase: {filebase:?}\n---\n");
            let result = Document::parse(input.as_bytes(), Path::new("src/a.md"));
            assert!(
                matches!(&result, Err(FrontmatterError::UnsafeFileBase(f)) if f == filebase),
                "{filebase} accepted: {result:?}"
            );
        }
    }

    #[test]
    fn index_document_uses_fixed_file_base() {
        let doc = parse("---\ntitle: My Blog\nindex: true\n---\nWelcome\n");
        assert!(doc.is_index);
        assert_eq!(doc.file_base, "index");
        assert_eq!(doc.body, b"Welcome\n");
    }

    #[test]
    fn parse_records_source() {
        let doc = parse("no frontmatter");
        assert_eq!(doc.source, PathBuf::from("src/post.md"));
        assert_eq!(doc.title, "");
    }

    #[test]
    fn load_converts_body_through_backend() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("post.md");
        fs::write(&path, "---\ntitle: Post\nadded: 3\n---\nhello").unwrap();

        let doc = Document::load(&path, &MockBackend::new()).unwrap();
        assert_eq!(doc.title, "Post");
        assert_eq!(doc.body, b"hello");
        assert_eq!(doc.source, path);
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let result = Document::load(&tmp.path().join("nope.md"), &MockBackend::new());
        assert!(matches!(result, Err(TaskError::Read { .. })));
    }

    #[test]
    fn load_bad_frontmatter_is_frontmatter_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.md");
        fs::write(&path, "---\ntitle: [unclosed\n---\n").unwrap();
        let result = Document::load(&path, &MockBackend::new());
        assert!(matches!(result, Err(TaskError::Frontmatter { path: p, .. }) if p == path));
    }

    #[test]
    fn new_index_is_titled_after_site() {
        let doc = Document::new_index("My Blog");
        assert!(doc.is_index);
        assert_eq!(doc.title, "My Blog");
        assert_eq!(doc.file_base, "index");
    }

    #[test]
    fn create_in_writes_source_file() {
        let tmp = TempDir::new().unwrap();
        let doc = Document::new_post("First Post", 42);
        let path = doc.create_in(tmp.path()).unwrap();
        assert_eq!(path, tmp.path().join("first_post.md"));

        let back = Document::parse(&fs::read(&path).unwrap(), &path).unwrap();
        assert_eq!(back.title, "First Post");
        assert_eq!(back.added, 42);
    }

    #[test]
    fn create_in_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        let doc = Document::new_post("Twice", 1);
        doc.create_in(tmp.path()).unwrap();
        let result = doc.create_in(tmp.path());
        assert!(matches!(result, Err(TaskError::Write { .. })));
    }
}
