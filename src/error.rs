use thiserror::Error;

/// Failures reported synchronously by configuration and request admission.
///
/// A failed call has no effect: no instance is built for `InvalidConfig`, and
/// the queue and active job are untouched for `InvalidArgument`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypewriterError {
    /// A timing or probability field is missing or malformed.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// A `write`/`append` call was given a bad target or start delay.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T, E = TypewriterError> = std::result::Result<T, E>;
