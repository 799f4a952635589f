use crate::error::{LibrarianError, Result};
use crate::overflow::{CreatedGist, GistFiles, GistStore};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-process gist store for tests and offline runs
pub struct MemoryGistStore {
    gists: Mutex<HashMap<String, GistFiles>>,
    created: AtomicUsize,
    refusal: Option<String>,
}

impl MemoryGistStore {
    /// Create a new empty store
    pub fn new() -> Self {
        MemoryGistStore {
            gists: Mutex::new(HashMap::new()),
            created: AtomicUsize::new(0),
            refusal: None,
        }
    }

    /// A store whose gist creation always fails
    pub fn failing() -> Self {
        Self::refusing("gist creation disabled")
    }

    /// Store for `--offline` runs.
    ///
    /// Nothing created here outlives the process, so a reference to it could
    /// never be resolved. Creation fails and oversized bodies abort the run.
    pub fn offline() -> Self {
        Self::refusing("body exceeds the inline limit and offline runs cannot publish overflow content; rerun without --offline")
    }

    fn refusing(reason: &str) -> Self {
        MemoryGistStore {
            refusal: Some(reason.to_string()),
            ..Self::new()
        }
    }

    /// Seed a gist file directly
    pub fn insert(&self, id: &str, filename: &str, content: &str) -> Result<()> {
        self.gists
            .lock()
            .map_err(|_| LibrarianError::overflow_store("gist store lock poisoned"))?
            .entry(id.to_string())
            .or_default()
            .insert(filename.to_string(), content.to_string());
        Ok(())
    }

    /// Number of gists created through [`GistStore::create_gist`]
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl Default for MemoryGistStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GistStore for MemoryGistStore {
    fn create_gist<'a>(
        &'a self,
        files: &'a GistFiles,
    ) -> Pin<Box<dyn Future<Output = Result<CreatedGist>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(reason) = &self.refusal {
                return Err(LibrarianError::overflow_store(reason.clone()));
            }
            let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
            let id = format!("gist{}", n);
            self.gists
                .lock()
                .map_err(|_| LibrarianError::overflow_store("gist store lock poisoned"))?
                .insert(id.clone(), files.clone());
            Ok(CreatedGist {
                url: format!("memory://gists/{}", id),
                id,
            })
        })
    }

    fn fetch_gist<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<GistFiles>> + Send + 'a>> {
        Box::pin(async move {
            self.gists
                .lock()
                .map_err(|_| LibrarianError::transport("gist store lock poisoned"))?
                .get(id)
                .cloned()
                .ok_or_else(|| LibrarianError::transport(format!("gist '{}' not found", id)))
        })
    }
}
