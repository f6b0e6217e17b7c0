use async_trait::async_trait;

use crate::error::Result;
use crate::types::{EmbeddingVector, RawMatch, VectorQuery};

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier of the backing model, used in logs.
    fn model_id(&self) -> &str;
    async fn embed(&self, text: &str) -> Result<EmbeddingVector>;
}

/// Read-only nearest-neighbor access to a movie index.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Matches in descending relevance, at most `request.top_k` of them.
    async fn query(&self, request: &VectorQuery) -> Result<Vec<RawMatch>>;
}
