use autopilot_foundation::MatchError;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Injected text-embedding capability. A real deployment would wrap a
/// pretrained sentence-embedding model; the core only depends on this one
/// method.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, MatchError>;
    fn dimension(&self) -> usize;
}

/// Deterministic bag-of-words hashing embedder. Not a real semantic model —
/// a pretrained embedding model is out of scope for this core — but it gives
/// the fusion score a stable, dependency-free semantic term: words hash to
/// fixed buckets with a sign, and the resulting vector is L2-normalized so
/// `cos(embed(Q), embed(Q)) == 1`.
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        assert!(dim > 0, "embedding dimension must be positive");
        Self { dim }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, MatchError> {
        let mut vector = vec![0f32; self.dim];
        for token in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let hash = hasher.finish();
            let bucket = (hash % self.dim as u64) as usize;
            let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vector.iter_mut() {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
