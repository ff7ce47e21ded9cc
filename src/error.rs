use thiserror::Error;

/// Per-fetch failure classification. One bad image never halts the show;
/// the controller decides escalation from the variant, not from strings.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Missing file, unknown session key, or out-of-range index.
    #[error("not found: {0}")]
    NotFound(String),

    /// Corrupt or unsupported image content.
    #[error("invalid image content: {0}")]
    Format(String),

    /// Remote unreachable, timed out, or answered with a server error.
    #[error("network failure: {0}")]
    Network(String),

    /// Underlying local IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
