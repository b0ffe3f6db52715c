//! Error types shared by the research pipeline.
//!
//! Page fetch failures never show up here: the fetcher turns them into text.
//! Everything below is either degraded to placeholder text or propagated,
//! depending on the configured [`crate::config::FailurePolicy`].

/// Errors raised by the collaborators and stages of a research run.
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    /// The language model call failed (transport, quota, timeout, bad payload).
    #[error("language model error: {0}")]
    Model(String),

    /// The web search provider failed to return results.
    #[error("search provider error: {0}")]
    Search(String),

    /// The model's search-query list did not match the expected format.
    #[error("malformed search queries: {0}")]
    MalformedQueries(String),

    /// An HTTP client could not be constructed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid or missing configuration.
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ResearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_model() {
        let err = ResearchError::Model("HTTP 429 Too Many Requests".into());
        assert_eq!(
            err.to_string(),
            "language model error: HTTP 429 Too Many Requests"
        );
    }

    #[test]
    fn display_search() {
        let err = ResearchError::Search("connection refused".into());
        assert_eq!(err.to_string(), "search provider error: connection refused");
    }

    #[test]
    fn display_malformed_queries() {
        let err = ResearchError::MalformedQueries("expected a list".into());
        assert_eq!(err.to_string(), "malformed search queries: expected a list");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ResearchError>();
    }
}
