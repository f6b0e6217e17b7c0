//! Client for a hosted feature-extraction endpoint (Hugging Face inference API shape).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use cinesearch_core::config::{EmbeddingSettings, HttpSettings};
use cinesearch_core::error::{Error, Result};
use cinesearch_core::retry::RetryPolicy;
use cinesearch_core::traits::Embedder;
use cinesearch_core::types::{validate_text, EmbeddingVector};

const SERVICE: &str = "embedding";

/// Response body, classified by shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingResponse {
    Vector(Vec<f32>),
    Batch(Vec<Vec<f32>>),
    Failure(ApiFailure),
}

#[derive(Debug, Deserialize)]
pub struct ApiFailure {
    pub error: Value,
    #[serde(default)]
    pub estimated_time: Option<f64>,
}

impl ApiFailure {
    fn message(&self) -> String {
        match &self.error {
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}

impl EmbeddingResponse {
    /// Turn a classified body into a vector or a typed error.
    pub fn into_vector(self, status: u16) -> Result<EmbeddingVector> {
        match self {
            EmbeddingResponse::Vector(v) if !v.is_empty() => Ok(EmbeddingVector::new(v)),
            EmbeddingResponse::Vector(_) => Err(Error::UnexpectedEmbedding("empty vector".into())),
            EmbeddingResponse::Batch(mut rows) if rows.len() == 1 && !rows[0].is_empty() => {
                Ok(EmbeddingVector::new(rows.remove(0)))
            }
            EmbeddingResponse::Batch(rows) => Err(Error::UnexpectedEmbedding(format!(
                "expected a single embedding row, got {}",
                rows.len()
            ))),
            EmbeddingResponse::Failure(f) => Err(Error::EmbeddingService {
                status,
                message: f.message(),
                estimated_time: f.estimated_time,
            }),
        }
    }
}

pub struct HostedEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    wait_for_model: bool,
    dimension: Option<usize>,
    retry: RetryPolicy,
}

impl HostedEmbedder {
    pub fn new(settings: &EmbeddingSettings, http: &HttpSettings, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            api_key: api_key.into(),
            wait_for_model: settings.wait_for_model,
            dimension: settings.dimension,
            retry: RetryPolicy::from_settings(http),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn request(&self, text: &str) -> Result<EmbeddingVector> {
        let mut req = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "inputs": text }));
        if self.wait_for_model {
            req = req.header("x-wait-for-model", "true");
        }
        let resp = req.send().await.map_err(transport)?;
        let status = resp.status();
        let body = resp.text().await.map_err(transport)?;
        debug!(status = status.as_u16(), bytes = body.len(), "embedding response");

        match serde_json::from_str::<EmbeddingResponse>(&body) {
            Ok(parsed) => parsed.into_vector(status.as_u16()),
            Err(_) if !status.is_success() => Err(Error::EmbeddingService {
                status: status.as_u16(),
                message: preview(&body),
                estimated_time: None,
            }),
            Err(_) => Err(Error::UnexpectedEmbedding(preview(&body))),
        }
    }
}

#[async_trait]
impl Embedder for HostedEmbedder {
    fn model_id(&self) -> &str {
        &self.endpoint
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        validate_text(text)?;
        let vector = self.retry.run("embed", move || self.request(text)).await?;
        if let Some(expected) = self.dimension {
            if vector.len() != expected {
                return Err(Error::DimensionMismatch { expected, actual: vector.len() });
            }
        }
        Ok(vector)
    }
}

fn transport(e: reqwest::Error) -> Error {
    Error::Transport { service: SERVICE, message: e.to_string() }
}

fn preview(body: &str) -> String {
    const LIMIT: usize = 200;
    if body.chars().count() <= LIMIT {
        body.to_string()
    } else {
        format!("{}...", body.chars().take(LIMIT).collect::<String>())
    }
}
