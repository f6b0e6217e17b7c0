//! Query embedding clients.
//!
//! `HostedEmbedder` calls a remote feature-extraction endpoint; `FakeEmbedder`
//! is selected instead when `APP_USE_FAKE_EMBEDDINGS=1`.

use std::sync::Arc;
use tracing::info;

use cinesearch_core::config::{Credentials, Service, Settings};
use cinesearch_core::error::{Error, Result};
use cinesearch_core::traits::Embedder;

mod fake;
mod hosted;

pub use fake::FakeEmbedder;
pub use hosted::{ApiFailure, EmbeddingResponse, HostedEmbedder};

pub const FAKE_EMBEDDINGS_ENV: &str = "APP_USE_FAKE_EMBEDDINGS";
pub const DEFAULT_DIM: usize = 1024;

pub fn use_fake_embeddings() -> bool {
    std::env::var(FAKE_EMBEDDINGS_ENV)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn get_default_embedder(settings: &Settings, credentials: Option<&Credentials>) -> Result<Arc<dyn Embedder>> {
    if use_fake_embeddings() {
        let dim = settings.embedding.dimension.unwrap_or(DEFAULT_DIM);
        info!(dim, "using fake embedder");
        return Ok(Arc::new(FakeEmbedder::new(dim)));
    }
    let api_key = credentials
        .ok_or_else(|| Error::MissingCredential("embedding service key is required".into()))?
        .key(Service::Embedding)?;
    let embedder = HostedEmbedder::new(&settings.embedding, &settings.http, api_key)?;
    info!(endpoint = %settings.embedding.endpoint, "using hosted embedder");
    Ok(Arc::new(embedder))
}
