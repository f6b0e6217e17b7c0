//! Vector store backends.
//!
//! `PineconeIndex` talks to the hosted index. Setting `APP_USE_MEMORY_INDEX`
//! to a JSON file path swaps in a `MemoryIndex` loaded from that file.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use cinesearch_core::config::{Credentials, Service, Settings};
use cinesearch_core::error::{Error, Result};
use cinesearch_core::traits::{Embedder, VectorStore};

mod hosted;
mod memory;

pub use hosted::{IndexDescription, IndexSpec, PineconeIndex, ServerlessSpec};
pub use memory::{cosine_similarity, MemoryIndex, MemoryRecord};

pub const MEMORY_INDEX_ENV: &str = "APP_USE_MEMORY_INDEX";

pub fn memory_index_path() -> Option<PathBuf> {
    std::env::var(MEMORY_INDEX_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

/// Open the configured store. The embedder is only used to fill in vectors
/// for in-memory records that lack them.
pub async fn get_default_store(
    settings: &Settings,
    credentials: Option<&Credentials>,
    embedder: &dyn Embedder,
) -> Result<Arc<dyn VectorStore>> {
    if let Some(path) = memory_index_path() {
        info!(path = %path.display(), "using in-memory index");
        return Ok(Arc::new(MemoryIndex::load(&path, embedder).await?));
    }
    let api_key = credentials
        .ok_or_else(|| Error::MissingCredential("vector store key is required".into()))?
        .key(Service::VectorStore)?;
    let index = PineconeIndex::connect(&settings.vector_store, &settings.http, api_key)
        .await?
        .expect_dimension(settings.embedding.dimension)?;
    Ok(Arc::new(index))
}
