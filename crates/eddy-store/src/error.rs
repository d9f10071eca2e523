//! Error types for chunk storage operations.

use eddy_types::Digest;

/// Errors that can occur during chunk storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested chunk was not found.
    #[error("chunk not found: {0}")]
    NotFound(Digest),

    /// Chunk bytes do not hash to the declared digest.
    ///
    /// Raised both when a put supplies mismatching bytes and when data
    /// read back from storage fails verification. Never downgraded: a
    /// mismatching chunk is not data.
    #[error("chunk integrity mismatch: declared {declared}, actual {actual}")]
    IntegrityMismatch {
        /// The digest the chunk was addressed by.
        declared: Digest,
        /// The digest computed from the actual bytes.
        actual: Digest,
    },

    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A wire message carried a malformed digest string.
    #[error("malformed digest on the wire: {0}")]
    MalformedDigest(#[from] eddy_types::ParseDigestError),

    /// The remote peer answered a request with the wrong response shape.
    #[error("unexpected response to {0} call")]
    UnexpectedResponse(&'static str),
}
