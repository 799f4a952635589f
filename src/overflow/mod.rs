//! Overflow delivery for oversized pull-request bodies.
//!
//! Text within the size threshold passes through untouched. Anything larger
//! is stored as a gist under [`OVERFLOW_FILENAME`] and replaced by a short
//! reference; [`OverflowDelivery::resolve`] turns that reference back into
//! the original text.

pub mod github;
pub mod memory;

pub use github::GitHubGistStore;
pub use memory::MemoryGistStore;

use crate::error::{LibrarianError, Result};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

/// Filename the full content is stored under
pub const OVERFLOW_FILENAME: &str = "pr-body.md";

/// Threshold used when the configured size is zero or negative
pub const DEFAULT_MAX_CONTENT_SIZE: usize = 65_536;

const REFERENCE_PREFIX: &str =
    "This pull request body is too large to display inline. The full content is available at ";

/// A created gist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedGist {
    pub id: String,
    /// Browsable URL; its last path segment is the gist id
    pub url: String,
}

/// Filename to content mapping of a gist
pub type GistFiles = BTreeMap<String, String>;

/// Trait for paste/gist stores
pub trait GistStore: Send + Sync {
    /// Create a gist from the given files
    fn create_gist<'a>(
        &'a self,
        files: &'a GistFiles,
    ) -> Pin<Box<dyn Future<Output = Result<CreatedGist>> + Send + 'a>>;

    /// Fetch the files of gist `id`
    fn fetch_gist<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<GistFiles>> + Send + 'a>>;
}

/// The reference text substituted for overflowed content
pub fn overflow_reference(url: &str) -> String {
    format!("{}{}", REFERENCE_PREFIX, url)
}

/// Extract the gist id from an overflow reference, if `text` is one
pub fn parse_reference(text: &str) -> Option<&str> {
    let url = text.strip_prefix(REFERENCE_PREFIX)?;
    if url.is_empty() || url.chars().any(char::is_whitespace) {
        return None;
    }
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty() && !id.contains(':'))
}

/// Wraps rendered text so it fits the hosting size limit
pub struct OverflowDelivery<S> {
    store: S,
    max_content_size: usize,
}

impl<S: GistStore> OverflowDelivery<S> {
    /// A non-positive `max_content_size` selects [`DEFAULT_MAX_CONTENT_SIZE`]
    pub fn new(store: S, max_content_size: i64) -> Self {
        let max_content_size = usize::try_from(max_content_size)
            .ok()
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_MAX_CONTENT_SIZE);
        OverflowDelivery {
            store,
            max_content_size,
        }
    }

    pub fn max_content_size(&self) -> usize {
        self.max_content_size
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Return `text` unchanged when it fits, otherwise a gist reference.
    ///
    /// Text that already has the shape of a reference is always stored so
    /// that `resolve` never misreads it.
    pub async fn deliver(&self, text: &str) -> Result<String> {
        if text.len() <= self.max_content_size && parse_reference(text).is_none() {
            return Ok(text.to_string());
        }

        let mut files = GistFiles::new();
        files.insert(OVERFLOW_FILENAME.to_string(), text.to_string());

        let gist = self.store.create_gist(&files).await.map_err(|e| match e {
            LibrarianError::OverflowStore(_) => e,
            other => LibrarianError::overflow_store(other.to_string()),
        })?;

        let reference = overflow_reference(&gist.url);
        match parse_reference(&reference) {
            Some(id) if id == gist.id => Ok(reference),
            _ => Err(LibrarianError::overflow_store(format!(
                "gist URL '{}' does not identify gist '{}'",
                gist.url, gist.id
            ))),
        }
    }

    /// Undo `deliver`: dereference a gist reference, pass anything else through
    pub async fn resolve(&self, text: &str) -> Result<String> {
        let Some(id) = parse_reference(text) else {
            return Ok(text.to_string());
        };

        let mut files = self.store.fetch_gist(id).await?;
        files
            .remove(OVERFLOW_FILENAME)
            .ok_or_else(|| LibrarianError::content_not_found(id, OVERFLOW_FILENAME))
    }
}
