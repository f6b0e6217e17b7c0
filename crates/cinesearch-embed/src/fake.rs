use async_trait::async_trait;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use cinesearch_core::error::Result;
use cinesearch_core::traits::Embedder;
use cinesearch_core::types::{validate_text, EmbeddingVector};

/// Deterministic hashed bag-of-words embedder for offline runs and tests.
///
/// Identical texts map to identical L2-normalized vectors and texts sharing
/// words land closer together, which is enough to exercise ranking.
pub struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let token = token.to_lowercase();
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn model_id(&self) -> &str {
        "fake:xxhash64"
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        validate_text(text)?;
        Ok(EmbeddingVector::new(self.embed_sync(text)))
    }
}
