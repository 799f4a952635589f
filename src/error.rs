use thiserror::Error;

/// Unified error type for librarian-release operations
#[derive(Error, Debug)]
pub enum LibrarianError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed version '{version}': {reason}")]
    MalformedVersion { version: String, reason: String },

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Overflow store error: {0}")]
    OverflowStore(String),

    #[error("Content '{filename}' not found in gist '{gist_id}'")]
    ContentNotFound { gist_id: String, filename: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{operation} failed for library '{library_id}': {source}")]
    Library {
        library_id: String,
        operation: String,
        #[source]
        source: Box<LibrarianError>,
    },
}

/// Convenience type alias for Results in librarian-release
pub type Result<T> = std::result::Result<T, LibrarianError>;

impl LibrarianError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        LibrarianError::Config(msg.into())
    }

    /// Create a malformed version error
    pub fn malformed_version(version: impl Into<String>, reason: impl Into<String>) -> Self {
        LibrarianError::MalformedVersion {
            version: version.into(),
            reason: reason.into(),
        }
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        LibrarianError::Tag(msg.into())
    }

    /// Create an overflow store error with context
    pub fn overflow_store(msg: impl Into<String>) -> Self {
        LibrarianError::OverflowStore(msg.into())
    }

    /// Create a content-not-found error for a gist lookup
    pub fn content_not_found(gist_id: impl Into<String>, filename: impl Into<String>) -> Self {
        LibrarianError::ContentNotFound {
            gist_id: gist_id.into(),
            filename: filename.into(),
        }
    }

    /// Create a transport error with context
    pub fn transport(msg: impl Into<String>) -> Self {
        LibrarianError::Transport(msg.into())
    }

    /// Wrap this error with the library and operation it occurred in
    pub fn for_library(self, library_id: impl Into<String>, operation: impl Into<String>) -> Self {
        LibrarianError::Library {
            library_id: library_id.into(),
            operation: operation.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any library wrappers
    pub fn root(&self) -> &LibrarianError {
        match self {
            LibrarianError::Library { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns true if the error is a malformed version, wrapped or not
    pub fn is_malformed_version(&self) -> bool {
        matches!(self.root(), LibrarianError::MalformedVersion { .. })
    }
}
