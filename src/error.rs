use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the simulation core.
///
/// Runtime edge cases (empty systems, degenerate bounds, non-positive spawn
/// counts) are absorbed by clamping and never surface here. Errors are
/// reserved for construction and configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Configuration file could not be parsed or serialized.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    /// Propagated I/O errors from config load/save.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
