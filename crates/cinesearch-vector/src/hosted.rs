//! Pinecone-compatible serverless index client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use cinesearch_core::config::{HttpSettings, VectorStoreSettings};
use cinesearch_core::error::{Error, Result};
use cinesearch_core::filter::FilterPredicate;
use cinesearch_core::retry::RetryPolicy;
use cinesearch_core::traits::VectorStore;
use cinesearch_core::types::{RawMatch, VectorQuery};

const SERVICE: &str = "vector store";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    #[serde(skip_serializing_if = "no_clauses")]
    filter: &'a FilterPredicate,
    include_metadata: bool,
    include_values: bool,
}

fn no_clauses(filter: &&FilterPredicate) -> bool {
    filter.is_empty()
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<RawMatch>,
}

#[derive(Debug, Deserialize)]
pub struct IndexDescription {
    pub host: String,
    #[serde(default)]
    pub dimension: Option<usize>,
    #[serde(default)]
    pub spec: Option<IndexSpec>,
}

#[derive(Debug, Deserialize)]
pub struct IndexSpec {
    #[serde(default)]
    pub serverless: Option<ServerlessSpec>,
}

#[derive(Debug, Deserialize)]
pub struct ServerlessSpec {
    pub cloud: String,
    pub region: String,
}

/// Process-wide handle to one index; built once, then query-only.
pub struct PineconeIndex {
    client: reqwest::Client,
    host: String,
    dimension: Option<usize>,
    api_key: String,
    api_version: String,
    retry: RetryPolicy,
}

impl PineconeIndex {
    /// Resolve the data-plane host (unless configured) and build the handle.
    pub async fn connect(settings: &VectorStoreSettings, http: &HttpSettings, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        let mut index = Self {
            client,
            host: String::new(),
            dimension: None,
            api_key: api_key.into(),
            api_version: settings.api_version.clone(),
            retry: RetryPolicy::from_settings(http),
        };

        index.host = match settings.host.as_deref().filter(|h| !h.trim().is_empty()) {
            Some(host) => normalize_host(host),
            None => {
                let described = index.describe(&settings.control_plane_url, &settings.index_name).await?;
                if let Some(serverless) = described.spec.as_ref().and_then(|s| s.serverless.as_ref()) {
                    if serverless.cloud != settings.cloud || serverless.region != settings.region {
                        warn!(
                            expected_cloud = %settings.cloud,
                            expected_region = %settings.region,
                            actual_cloud = %serverless.cloud,
                            actual_region = %serverless.region,
                            "index lives outside the configured cloud/region"
                        );
                    }
                }
                index.dimension = described.dimension;
                normalize_host(&described.host)
            }
        };
        info!(index = %settings.index_name, host = %index.host, dimension = ?index.dimension, "vector index ready");
        Ok(index)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Vector width reported by the control plane; unknown when the host is configured.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Fail fast when the index width differs from the query embedding width.
    pub fn expect_dimension(self, embedding_dim: Option<usize>) -> Result<Self> {
        if let (Some(expected), Some(actual)) = (self.dimension, embedding_dim) {
            if expected != actual {
                return Err(Error::DimensionMismatch { expected, actual });
            }
        }
        Ok(self)
    }

    /// Control-plane lookup of an index by name.
    pub async fn describe(&self, control_plane_url: &str, index_name: &str) -> Result<IndexDescription> {
        let url = format!("{}/indexes/{}", control_plane_url.trim_end_matches('/'), index_name);
        let url = url.as_str();
        self.retry.run("describe_index", move || self.describe_once(url)).await
    }

    async fn describe_once(&self, url: &str) -> Result<IndexDescription> {
        let resp = self
            .client
            .get(url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", &self.api_version)
            .send()
            .await
            .map_err(transport)?;
        decode(resp).await
    }

    async fn query_once(&self, request: &VectorQuery) -> Result<Vec<RawMatch>> {
        let body = QueryRequest {
            vector: request.vector.as_slice(),
            top_k: request.top_k,
            filter: &request.filter,
            include_metadata: request.include_metadata,
            include_values: false,
        };
        let resp = self
            .client
            .post(format!("{}/query", self.host))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", &self.api_version)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let parsed: QueryResponse = decode(resp).await?;
        Ok(parsed.matches)
    }
}

#[async_trait]
impl VectorStore for PineconeIndex {
    async fn query(&self, request: &VectorQuery) -> Result<Vec<RawMatch>> {
        debug!(top_k = request.top_k, filter = %request.filter.to_json(), "vector query");
        self.retry.run("query", move || self.query_once(request)).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    let body = resp.text().await.map_err(transport)?;
    if !status.is_success() {
        return Err(Error::VectorStore { status: status.as_u16(), message: body });
    }
    serde_json::from_str(&body).map_err(|e| Error::VectorStore {
        status: status.as_u16(),
        message: format!("unreadable response: {e}"),
    })
}

fn transport(e: reqwest::Error) -> Error {
    Error::Transport { service: SERVICE, message: e.to_string() }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}
