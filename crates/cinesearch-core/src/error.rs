use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("{service} request failed: {message}")]
    Transport { service: &'static str, message: String },

    #[error("Embedding service error (HTTP {status}): {message}")]
    EmbeddingService {
        status: u16,
        message: String,
        estimated_time: Option<f64>,
    },

    #[error("Unexpected embedding response: {0}")]
    UnexpectedEmbedding(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector store error (HTTP {status}): {message}")]
    VectorStore { status: u16, message: String },

    #[error("Malformed match '{id}': {reason}")]
    MalformedMatch { id: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether a retry of the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport { .. } => true,
            Error::EmbeddingService { status, estimated_time, .. } => {
                estimated_time.is_some() || *status == 429 || *status >= 500
            }
            Error::VectorStore { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(Error::Transport { service: "embedding", message: "reset".into() }.is_transient());
        assert!(Error::VectorStore { status: 503, message: String::new() }.is_transient());
        assert!(Error::VectorStore { status: 429, message: String::new() }.is_transient());
        assert!(!Error::VectorStore { status: 400, message: String::new() }.is_transient());
        assert!(Error::EmbeddingService { status: 200, message: "loading".into(), estimated_time: Some(20.0) }.is_transient());
        assert!(!Error::EmbeddingService { status: 401, message: "bad token".into(), estimated_time: None }.is_transient());
        assert!(!Error::InvalidQuery("empty".into()).is_transient());
    }
}
