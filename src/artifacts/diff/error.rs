//! Typed errors surfaced by the diff engine
//!
//! Every diff operation returns a typed result; callers match on the kind
//! instead of reading a shared error slot. Collaborator failures are folded
//! into the kind that describes where they happened.

/// Failure kinds of a diff build
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Configuration unreadable or index unavailable
    #[error("invalid repository: {0}")]
    InvalidRepo(String),

    /// stat/open/read failed on a working-directory path
    #[error("I/O failure on '{path}': {message}")]
    Io { path: String, message: String },

    /// File size exceeds the platform's addressable range
    #[error("file size overflow on '{0}'")]
    Overflow(String),

    /// A backing tree/index/workdir iterator failed
    #[error("iterator failure: {0}")]
    Iterator(String),

    /// The filter pipeline failed to load or apply
    #[error("filter failure on '{path}': {message}")]
    Filter { path: String, message: String },

    /// Submodule lookup failed during coincident classification
    #[error("submodule failure on '{path}': {message}")]
    Submodule { path: String, message: String },

    /// A consumer callback requested stop
    #[error("operation stopped by caller")]
    UserAbort,
}

pub type DiffResult<T> = Result<T, DiffError>;
