use crate::embedder::Embedder;
use crate::phonetic::PhoneticScorer;
use crate::semantic::SemanticIndex;
use autopilot_corpus::model::ChunkId;
use autopilot_corpus::{normalize, Corpus};
use autopilot_foundation::MatchError;
use std::sync::Arc;
use tracing::warn;

const SEMANTIC_WEIGHT: f32 = 0.4;
const PHONETIC_WEIGHT: f32 = 0.6;
const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Clone)]
pub struct MatchResult {
    pub chunk_index: u32,
    pub chunk_id: ChunkId,
    pub score: f32,
}

/// Hybrid semantic+phonetic ranker over the fixed chunk corpus (spec §4.3).
/// Holds its caches behind a lightweight mutex rather than true
/// thread-locals: only `NavigationWorker` calls this in the default
/// topology, so contention never happens in practice.
pub struct SpeechMatcher {
    corpus: Arc<Corpus>,
    semantic: SemanticIndex,
    phonetic: PhoneticScorer,
    top_k: usize,
}

impl SpeechMatcher {
    pub fn new(corpus: Arc<Corpus>, embedder: Box<dyn Embedder>) -> Result<Self, MatchError> {
        Self::with_top_k(corpus, embedder, DEFAULT_TOP_K)
    }

    pub fn with_top_k(
        corpus: Arc<Corpus>,
        embedder: Box<dyn Embedder>,
        top_k: usize,
    ) -> Result<Self, MatchError> {
        let semantic = SemanticIndex::build(embedder, &corpus)?;
        Ok(Self {
            corpus,
            semantic,
            phonetic: PhoneticScorer::new(),
            top_k,
        })
    }

    /// Empty query returns an empty result (spec §4.3 failure semantics).
    /// An embedding failure on the query falls back to phonetic-only scoring
    /// for the whole call and is logged at warn.
    pub fn top_matches(&self, query: &str) -> Vec<MatchResult> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        let normalized = normalize(query);
        let query_tokens: Vec<&str> = normalized.split_whitespace().collect();

        let query_embedding = match self.semantic.query_embedding(&normalized) {
            Ok(embedding) => Some(embedding),
            Err(err) => {
                warn!(error = %err, "query embedding failed, falling back to phonetic-only score");
                None
            }
        };

        let mut scored = Vec::with_capacity(self.corpus.len_chunks());
        for idx in 0..self.corpus.len_chunks() as u32 {
            let chunk = self
                .corpus
                .chunk_by_index(idx)
                .expect("dense chunk index invariant enforced at load");
            let chunk_tokens = chunk.tokens();

            let phon = self
                .phonetic
                .score(&normalized, &query_tokens, &chunk.chunk_id, &chunk_tokens);

            let fused = match &query_embedding {
                Some(q_emb) => {
                    let sem = self.semantic.cosine_to_chunk(q_emb, idx as usize);
                    SEMANTIC_WEIGHT * sem + PHONETIC_WEIGHT * phon
                }
                None => phon,
            };

            scored.push(MatchResult {
                chunk_index: idx,
                chunk_id: chunk.chunk_id.clone(),
                score: fused,
            });
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk_index.cmp(&b.chunk_index))
        });
        scored.truncate(self.top_k);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashingEmbedder;
    use autopilot_corpus::model::{Chunk, TranscriptId, TranscriptItem};

    fn test_corpus() -> Arc<Corpus> {
        let transcripts = vec![
            TranscriptItem {
                transcript_index: 0,
                transcript_id: TranscriptId("t0".into()),
                text: "the ability to say no".into(),
                early_forward: true,
            },
            TranscriptItem {
                transcript_index: 1,
                transcript_id: TranscriptId("t1".into()),
                text: "have you ever struggled when you tried to say no to someone".into(),
                early_forward: true,
            },
        ];
        let chunks = vec![
            Chunk {
                chunk_index: 0,
                chunk_id: ChunkId("c0".into()),
                source_transcripts: vec![TranscriptId("t0".into())],
                text: "the ability to say no have you".into(),
            },
            Chunk {
                chunk_index: 1,
                chunk_id: ChunkId("c1".into()),
                source_transcripts: vec![TranscriptId("t1".into())],
                text: "have you ever struggled when you tried".into(),
            },
        ];
        Arc::new(Corpus::new(transcripts, chunks))
    }

    #[test]
    fn empty_query_returns_empty() {
        let matcher =
            SpeechMatcher::new(test_corpus(), Box::new(HashingEmbedder::default())).unwrap();
        assert!(matcher.top_matches("   ").is_empty());
    }

    #[test]
    fn exact_query_ranks_its_own_chunk_first() {
        let matcher =
            SpeechMatcher::new(test_corpus(), Box::new(HashingEmbedder::default())).unwrap();
        let results = matcher.top_matches("have you ever struggled when you tried");
        assert_eq!(results[0].chunk_id, ChunkId("c1".into()));
        assert!(results[0].score > 0.9);
    }

    #[test]
    fn scores_are_bounded() {
        let matcher =
            SpeechMatcher::new(test_corpus(), Box::new(HashingEmbedder::default())).unwrap();
        for result in matcher.top_matches("the ability to say no") {
            assert!((0.0..=1.0).contains(&result.score));
        }
    }

    /// A mis-hearing of "hands" as "hence" must still rank the chunk that
    /// actually says "hands" first, even against a decoy chunk with the same
    /// bag-of-words overlap with the query. Only the phonetic term tells
    /// them apart, so this exercises fusion, not phonetic scoring alone.
    #[test]
    fn phonetically_close_chunk_beats_an_equally_semantic_decoy() {
        let transcripts = vec![TranscriptItem {
            transcript_index: 0,
            transcript_id: TranscriptId("t0".into()),
            text: "please go to the next hands slide".into(),
            early_forward: true,
        }];
        let chunks = vec![
            Chunk {
                chunk_index: 0,
                chunk_id: ChunkId("hands-chunk".into()),
                source_transcripts: vec![TranscriptId("t0".into())],
                text: "please go to the next hands slide".into(),
            },
            Chunk {
                chunk_index: 1,
                chunk_id: ChunkId("decoy-chunk".into()),
                source_transcripts: vec![TranscriptId("t0".into())],
                text: "please go to the next zxcvbn slide".into(),
            },
        ];
        let corpus = Arc::new(Corpus::new(transcripts, chunks));
        let matcher = SpeechMatcher::new(corpus, Box::new(HashingEmbedder::default())).unwrap();

        let results = matcher.top_matches("please go to the next hence slide");
        assert_eq!(results[0].chunk_id, ChunkId("hands-chunk".into()));
        assert!(results[0].score > results[1].score);
    }
}
