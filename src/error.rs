use thiserror::Error;

/// Errors raised at the edges of the engine.
///
/// The sample path itself never fails: out of range values saturate. These
/// variants cover conversions from raw bytes (settings files, UI indices) and
/// persistence.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no processor function with index {0}")]
    InvalidFunction(u8),

    #[error("no oscillator shape with index {0}")]
    InvalidShape(u8),

    #[error("no edit mode with index {0}")]
    InvalidEditMode(u8),

    #[error("parameter index {0} out of range")]
    ParameterIndex(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
