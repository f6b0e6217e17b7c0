//! Brute-force in-memory movie index for offline development and tests.
//!
//! Records are scanned linearly: the predicate is applied first, survivors
//! are ranked by cosine similarity and the best `top_k` are returned.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::info;

use cinesearch_core::error::{Error, Result};
use cinesearch_core::traits::{Embedder, VectorStore};
use cinesearch_core::types::{meta_keys, RawMatch, VectorQuery, MAX_QUERY_CHARS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    /// Embedding; computed from title and overview at load time when absent.
    #[serde(default)]
    pub values: Option<Vec<f32>>,
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Default)]
pub struct MemoryIndex {
    records: Vec<(String, Vec<f32>, Map<String, Value>)>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, values: Vec<f32>, metadata: Map<String, Value>) {
        self.records.push((id.into(), values, metadata));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Build from records, embedding the ones that carry no vector.
    pub async fn from_records(records: Vec<MemoryRecord>, embedder: &dyn Embedder) -> Result<Self> {
        let mut index = Self::new();
        for record in records {
            let values = match record.values {
                Some(v) => v,
                None => embedder.embed(&document_text(&record.metadata)).await?.into_inner(),
            };
            index.insert(record.id, values, record.metadata);
        }
        Ok(index)
    }

    /// Load a JSON array of [`MemoryRecord`]s.
    pub async fn load(path: &Path, embedder: &dyn Embedder) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let records: Vec<MemoryRecord> = serde_json::from_str(&raw)?;
        let index = Self::from_records(records, embedder).await?;
        info!(path = %path.display(), records = index.len(), "loaded in-memory index");
        Ok(index)
    }
}

#[async_trait]
impl VectorStore for MemoryIndex {
    async fn query(&self, request: &VectorQuery) -> Result<Vec<RawMatch>> {
        let q = request.vector.as_slice();
        let mut scored = Vec::new();
        for (id, values, metadata) in &self.records {
            if values.len() != q.len() {
                return Err(Error::DimensionMismatch { expected: values.len(), actual: q.len() });
            }
            if !request.filter.matches(metadata) {
                continue;
            }
            scored.push((cosine_similarity(q, values), id, metadata));
        }
        // stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(request.top_k);

        Ok(scored
            .into_iter()
            .map(|(score, id, metadata)| RawMatch {
                id: id.clone(),
                score,
                metadata: request.include_metadata.then(|| metadata.clone()),
            })
            .collect())
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

fn document_text(metadata: &Map<String, Value>) -> String {
    let field = |key: &str| metadata.get(key).and_then(Value::as_str).unwrap_or_default();
    let text = format!("{}. {}", field(meta_keys::TITLE), field(meta_keys::OVERVIEW));
    text.chars().take(MAX_QUERY_CHARS).collect()
}
