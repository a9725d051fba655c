use thiserror::Error;

/// Failures from the external collaborators of a notification run.
///
/// Components surface these from their `try_*` methods; the plain methods
/// log them and fall back to an empty value instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("could not parse changelog page: {0}")]
    Parse(String),

    #[error("summarization failed: {0}")]
    Summarization(String),

    #[error("chat API error: {0}")]
    Messaging(String),
}

pub type Result<T> = std::result::Result<T, Error>;
