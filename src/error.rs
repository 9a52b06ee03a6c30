//! Error kinds shared by the URL builder and the table scraper.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Network failure or non-success HTTP status.
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    /// A scraper stage was called before the stage it depends on.
    #[error("{0}")]
    State(&'static str),

    /// The expected HTML element is missing from the page.
    #[error("{0}")]
    NotFound(String),

    /// Structurally insufficient data, or a parameter constraint was violated.
    #[error("{0}")]
    Validation(String),

    /// An argument has the wrong shape (e.g. an empty ATC list, a malformed age list).
    #[error("{0}")]
    InvalidArgument(String),

    /// The query could not be serialized to JSON.
    #[error("failed to encode query: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn fetch(url: &str, message: impl std::fmt::Display) -> Self {
        Error::Fetch {
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}
