//! Error types for content addressing operations.

/// Errors that can occur during chunking or digest computation.
#[derive(Debug, thiserror::Error)]
pub enum CasError {
    /// The input could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
