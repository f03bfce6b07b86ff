//! Error types for the hand-off pipeline.

use kernel::KernelError;

/// Geometry-layer failures. They propagate to the caller unchanged.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    /// Null, wrongly typed or out-of-range geometry argument.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The curve sampler did not converge or produced no points.
    #[error("discretization failed: {0}")]
    Discretization(String),
}

impl From<KernelError> for GeometryError {
    fn from(e: KernelError) -> Self {
        match e {
            KernelError::NotDone(msg) => GeometryError::Discretization(msg),
            other => GeometryError::InvalidInput(other.to_string()),
        }
    }
}

/// Archive encoding/decoding failures.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Missing structural fields, unknown format, or a referenced file
    /// that is not in the container.
    #[error("archive corrupt: {0}")]
    Corrupt(String),

    #[error("archive version {found} is newer than supported version {supported}")]
    FutureVersion { found: u32, supported: u32 },

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("exchange file error: {0}")]
    Exchange(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<KernelError> for ArchiveError {
    fn from(e: KernelError) -> Self {
        match e {
            KernelError::Io(io) => ArchiveError::Io(io),
            KernelError::Parse(_) | KernelError::Json(_) => ArchiveError::Exchange(e.to_string()),
            other => ArchiveError::Geometry(other.into()),
        }
    }
}

/// Client-side failures when talking to a running viewer.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// The viewer answered, but not with the expected acknowledgement.
    #[error("viewer rejected request: {0}")]
    Rejected(String),
}
