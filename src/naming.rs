//! Output file naming.
//!
//! Every post is written to `<slug>.html` in the output directory, where the
//! slug is derived from the post title:
//!
//! - `"Hello World"` → `hello_world`
//! - `"Rust 2024: What's New?"` → `rust_2024_whats_new`
//! - `"Über"` → `ber` (non-ASCII letters are dropped)
//!
//! Distinct titles can collapse onto the same slug (`"C++"` and `"C"` both
//! become `c`). Page tasks run concurrently, so [`SlugClaims`] records which
//! source document owns each output name; the first claim wins and later
//! ones are refused instead of silently overwriting the file.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::path::{Path, PathBuf};

/// Slugs no post may claim. `index` belongs to the generated index page.
pub const RESERVED_SLUGS: &[&str] = &["index"];

/// Derive a filesystem-safe slug from a title.
///
/// ASCII uppercase is lowercased, spaces become underscores, ASCII letters,
/// digits and underscores are kept, and everything else is dropped.
pub fn slugify(title: &str) -> String {
    title
        .chars()
        .filter_map(|c| match c {
            'A'..='Z' => Some(c.to_ascii_lowercase()),
            ' ' => Some('_'),
            'a'..='z' | '0'..='9' | '_' => Some(c),
            _ => None,
        })
        .collect()
}

/// Why a slug could not be claimed.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimRejected {
    /// Another source document already owns this slug.
    Taken(PathBuf),
    /// The slug is in [`RESERVED_SLUGS`].
    Reserved,
}

/// Concurrent registry of output names, keyed by slug.
#[derive(Debug, Default)]
pub struct SlugClaims {
    owners: DashMap<String, PathBuf>,
}

impl SlugClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `slug` for `source`.
    ///
    /// Claiming the same slug twice for the same source is not an error, so
    /// a task may retry without tripping over itself.
    pub fn claim(&self, slug: &str, source: &Path) -> Result<(), ClaimRejected> {
        if RESERVED_SLUGS.contains(&slug) {
            return Err(ClaimRejected::Reserved);
        }
        match self.owners.entry(slug.to_string()) {
            Entry::Occupied(owner) if owner.get() != source => {
                Err(ClaimRejected::Taken(owner.get().clone()))
            }
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(source.to_path_buf());
                Ok(())
            }
        }
    }

    /// Give `slug` back if `source` still holds it, so a later claimant can
    /// take it after this source failed to produce its page.
    pub fn release(&self, slug: &str, source: &Path) {
        self.owners.remove_if(slug, |_, owner| owner == source);
    }

    /// Number of claimed slugs.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_underscores_spaces() {
        assert_eq!(slugify("Hello World"), "hello_world");
    }

    #[test]
    fn drops_punctuation() {
        assert_eq!(slugify("Rust 2024: What's New?"), "rust_2024_whats_new");
    }

    #[test]
    fn keeps_existing_underscores_and_digits() {
        assert_eq!(slugify("snake_case_42"), "snake_case_42");
    }

    #[test]
    fn drops_non_ascii_letters() {
        assert_eq!(slugify("Über Café"), "ber_caf");
    }

    #[test]
    fn dashes_are_dropped_not_converted() {
        assert_eq!(slugify("follow-up"), "followup");
    }

    #[test]
    fn punctuation_only_title_is_empty() {
        assert_eq!(slugify("?!"), "");
    }

    #[test]
    fn distinct_titles_can_collide() {
        assert_eq!(slugify("C++"), slugify("C"));
    }

    // =========================================================================
    // SlugClaims
    // =========================================================================

    #[test]
    fn first_claim_wins() {
        let claims = SlugClaims::new();
        assert!(claims.claim("c", Path::new("src/c.md")).is_ok());
        assert_eq!(
            claims.claim("c", Path::new("src/cpp.md")),
            Err(ClaimRejected::Taken(PathBuf::from("src/c.md")))
        );
        assert_eq!(claims.len(), 1);
    }

    #[test]
    fn same_source_can_reclaim() {
        let claims = SlugClaims::new();
        claims.claim("post", Path::new("src/post.md")).unwrap();
        assert!(claims.claim("post", Path::new("src/post.md")).is_ok());
    }

    #[test]
    fn released_slug_can_be_claimed_again() {
        let claims = SlugClaims::new();
        claims.claim("c", Path::new("src/c.md")).unwrap();
        claims.release("c", Path::new("src/cpp.md"));
        assert!(claims.claim("c", Path::new("src/cpp.md")).is_err());

        claims.release("c", Path::new("src/c.md"));
        assert!(claims.is_empty());
        assert!(claims.claim("c", Path::new("src/cpp.md")).is_ok());
    }

    #[test]
    fn index_is_reserved() {
        let claims = SlugClaims::new();
        assert_eq!(
            claims.claim("index", Path::new("src/index_post.md")),
            Err(ClaimRejected::Reserved)
        );
        assert!(claims.is_empty());
    }

    #[test]
    fn concurrent_claims_have_exactly_one_winner() {
        use rayon::prelude::*;

        let claims = SlugClaims::new();
        let winners = (0..64)
            .into_par_iter()
            .filter(|i| {
                let source = PathBuf::from(format!("src/{i}.md"));
                claims.claim("shared", &source).is_ok()
            })
            .count();
        assert_eq!(winners, 1);
    }
}
