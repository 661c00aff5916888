use crate::embedder::Embedder;
use autopilot_corpus::Corpus;
use autopilot_foundation::MatchError;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

const QUERY_CACHE_CAPACITY: usize = 4096;

/// Chunk embeddings are precomputed once at load; query embeddings are
/// cached by normalized string since ASR repeats the same partial often.
pub struct SemanticIndex {
    embedder: Box<dyn Embedder>,
    chunk_embeddings: Vec<Vec<f32>>,
    query_cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl SemanticIndex {
    pub fn build(embedder: Box<dyn Embedder>, corpus: &Corpus) -> Result<Self, MatchError> {
        let mut chunk_embeddings = Vec::with_capacity(corpus.len_chunks());
        for idx in 0..corpus.len_chunks() as u32 {
            let chunk = corpus
                .chunk_by_index(idx)
                .expect("dense chunk index invariant enforced at load");
            chunk_embeddings.push(embedder.embed(&chunk.text)?);
        }
        Ok(Self {
            embedder,
            chunk_embeddings,
            query_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(QUERY_CACHE_CAPACITY).unwrap(),
            )),
        })
    }

    pub(crate) fn query_embedding(&self, normalized_query: &str) -> Result<Vec<f32>, MatchError> {
        if let Some(cached) = self.query_cache.lock().get(normalized_query) {
            return Ok(cached.clone());
        }
        let embedding = self.embedder.embed(normalized_query)?;
        self.query_cache
            .lock()
            .put(normalized_query.to_string(), embedding.clone());
        Ok(embedding)
    }

    pub(crate) fn cosine_to_chunk(&self, query_embedding: &[f32], chunk_index: usize) -> f32 {
        cosine(query_embedding, &self.chunk_embeddings[chunk_index])
            .max(0.0)
            .min(1.0)
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_score_one() {
        let v = vec![0.6, 0.8];
        assert!((cosine(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_scores_zero() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
