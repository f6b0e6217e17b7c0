//! Semantic movie search: embed the query text, filter and rank through the
//! vector store, then project matches into display records.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use cinesearch_core::config::{Config, Credentials, Service, Settings};
use cinesearch_core::error::Result;
use cinesearch_core::format::format;
use cinesearch_core::traits::{Embedder, VectorStore};
use cinesearch_core::types::{Query, ResultRecord, VectorQuery};
use cinesearch_embed::{get_default_embedder, use_fake_embeddings};
use cinesearch_vector::{get_default_store, memory_index_path};

pub struct SearchOrchestrator {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl SearchOrchestrator {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Build both service handles once from configuration.
    ///
    /// Only the API keys of the hosted backends actually selected are
    /// resolved.
    pub async fn from_settings(config: &Config, settings: &Settings) -> Result<Self> {
        let credentials = Credentials::resolve_for(config, settings, &required_services())?;
        let embedder = get_default_embedder(settings, Some(&credentials))?;
        let store = get_default_store(settings, Some(&credentials), embedder.as_ref()).await?;
        Ok(Self::new(embedder, store))
    }

    /// Run one search. Returns at most `query.top_k()` records in the
    /// store's relevance order; no matches is an empty list.
    pub async fn search(&self, query: &Query) -> Result<Vec<ResultRecord>> {
        let started = Instant::now();
        let vector = self.embedder.embed(query.text()).await?;
        let filter = query.filter();
        debug!(model = self.embedder.model_id(), dim = vector.len(), filter = %filter.to_json(), "query embedded");

        let request = VectorQuery { vector, top_k: query.top_k(), filter, include_metadata: true };
        let matches = self.store.query(&request).await?;

        let mut records = format(&matches);
        records.truncate(query.top_k());
        info!(
            matches = matches.len(),
            results = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search complete"
        );
        Ok(records)
    }
}

/// Hosted services selected by the `APP_USE_FAKE_EMBEDDINGS` and
/// `APP_USE_MEMORY_INDEX` switches.
pub fn required_services() -> Vec<Service> {
    let mut services = Vec::new();
    if !use_fake_embeddings() {
        services.push(Service::Embedding);
    }
    if memory_index_path().is_none() {
        services.push(Service::VectorStore);
    }
    services
}
