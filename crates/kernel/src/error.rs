/// Errors from kernel operations.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("shape is null")]
    NullShape,

    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("discretizer not done: {0}")]
    NotDone(String),

    #[error("unknown discretization algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("unknown exchange format: {0}")]
    UnknownFormat(String),

    #[error("exchange format {0} is export-only")]
    NotImportable(String),

    #[error("invalid exchange file: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KernelError {
    /// Check a tolerance-like argument: finite and strictly positive.
    pub fn check_positive(name: &'static str, value: f64) -> Result<f64, KernelError> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(KernelError::InvalidParameter { name, value })
        }
    }
}
