use thiserror::Error;

/// Errors raised by a [`crate::VisionProvider`] implementation.
///
/// These never cross the extraction boundary: [`crate::VisionExtractor`]
/// converts them into [`crate::FailureKind::Provider`] results.
#[derive(Debug, Error)]
pub enum VisionError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("provider returned status {status}: {body}")]
    Provider { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required part of the provider response was absent.
    #[error("provider response missing {0}")]
    MissingField(&'static str),
}

impl From<reqwest::Error> for VisionError {
    /// Strips the request URL so failure reasons carry no endpoint details.
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}
