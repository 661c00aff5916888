use autopilot_corpus::model::ChunkId;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

const WORD_CACHE_CAPACITY: usize = 65_536;
const SENTENCE_CACHE_CAPACITY: usize = 65_536;

/// Gross articulation classes for ASCII letters. Two letters "share a
/// group" if any group in this table contains both — a letter in two
/// groups (e.g. `P`) is cheap to substitute with a member of either. This is
/// the fixed table for the session; see the module docs for provenance.
const GROUPS: &[&[u8]] = &[
    b"AEIOUY",
    b"BP",
    b"CKQ",
    b"DT",
    b"LR",
    b"MN",
    b"GJ",
    b"FPV",
    b"SXZ",
    b"CSZ",
    b"W",
];

fn share_any_group(a: u8, b: u8) -> bool {
    let a = a.to_ascii_uppercase();
    let b = b.to_ascii_uppercase();
    if a == b {
        return true;
    }
    GROUPS.iter().any(|g| g.contains(&a) && g.contains(&b))
}

fn substitution_cost(a: u8, b: u8) -> usize {
    if share_any_group(a, b) {
        0
    } else {
        1
    }
}

/// Grouped Levenshtein distance between two words: substitution is free
/// when both letters share a phonetic group, 1 otherwise; insert/delete
/// always cost 1.
fn word_edit_distance(w1: &str, w2: &str) -> usize {
    let a = w1.as_bytes();
    let b = w2.as_bytes();
    let (m, n) = (a.len(), b.len());
    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for (i, row) in dp.iter_mut().enumerate().take(m + 1) {
        row[0] = i;
    }
    for j in 0..=n {
        dp[0][j] = j;
    }
    for i in 1..=m {
        for j in 1..=n {
            let sub = dp[i - 1][j - 1] + substitution_cost(a[i - 1], b[j - 1]);
            let del = dp[i - 1][j] + 1;
            let ins = dp[i][j - 1] + 1;
            dp[i][j] = sub.min(del).min(ins);
        }
    }
    dp[m][n]
}

fn word_similarity(w1: &str, w2: &str) -> f32 {
    let max_len = w1.len().max(w2.len());
    if max_len == 0 {
        return 1.0;
    }
    let distance = word_edit_distance(w1, w2) as f32;
    (1.0 - distance / max_len as f32).clamp(0.0, 1.0)
}

/// Phonetic half of the fusion score: a sentence-level Levenshtein over word
/// tokens, where substitution cost between two words is `1 - word_similarity`.
/// Both the per-word distance and the final per-(query, chunk) score are
/// memoized in bounded LRU caches, per spec §4.3.
pub struct PhoneticScorer {
    word_cache: Mutex<LruCache<(String, String), f32>>,
    sentence_cache: Mutex<LruCache<(String, ChunkId), f32>>,
}

impl PhoneticScorer {
    pub fn new() -> Self {
        Self {
            word_cache: Mutex::new(LruCache::new(NonZeroUsize::new(WORD_CACHE_CAPACITY).unwrap())),
            sentence_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(SENTENCE_CACHE_CAPACITY).unwrap(),
            )),
        }
    }

    fn word_similarity_cached(&self, w1: &str, w2: &str) -> f32 {
        let key = if w1 <= w2 {
            (w1.to_string(), w2.to_string())
        } else {
            (w2.to_string(), w1.to_string())
        };
        if let Some(sim) = self.word_cache.lock().get(&key) {
            return *sim;
        }
        let sim = word_similarity(w1, w2);
        self.word_cache.lock().put(key, sim);
        sim
    }

    /// `normalized_query` is the cache key's query half; `query_tokens` and
    /// `chunk_tokens` are its and the chunk's whitespace-split words.
    pub fn score(
        &self,
        normalized_query: &str,
        query_tokens: &[&str],
        chunk_id: &ChunkId,
        chunk_tokens: &[&str],
    ) -> f32 {
        let key = (normalized_query.to_string(), chunk_id.clone());
        if let Some(score) = self.sentence_cache.lock().get(&key) {
            return *score;
        }
        let score = self.sentence_score(query_tokens, chunk_tokens);
        self.sentence_cache.lock().put(key, score);
        score
    }

    fn sentence_score(&self, q: &[&str], c: &[&str]) -> f32 {
        let (m, n) = (q.len(), c.len());
        if m == 0 && n == 0 {
            return 1.0;
        }
        let mut dp = vec![vec![0f32; n + 1]; m + 1];
        for (i, row) in dp.iter_mut().enumerate().take(m + 1) {
            row[0] = i as f32;
        }
        for j in 0..=n {
            dp[0][j] = j as f32;
        }
        for i in 1..=m {
            for j in 1..=n {
                let sim = self.word_similarity_cached(q[i - 1], c[j - 1]);
                let sub = dp[i - 1][j - 1] + (1.0 - sim);
                let del = dp[i - 1][j] + 1.0;
                let ins = dp[i][j - 1] + 1.0;
                dp[i][j] = sub.min(del).min(ins);
            }
        }
        let max_len = m.max(n) as f32;
        (1.0 - dp[m][n] / max_len).clamp(0.0, 1.0)
    }
}

impl Default for PhoneticScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_word_has_zero_distance() {
        assert_eq!(word_edit_distance("hands", "hands"), 0);
    }

    #[test]
    fn phonetic_near_miss_is_cheap() {
        // 'd'/'t' share the dentals group, so "hands" -> "hants" -> "hence"-ish
        // substitutions should be much cheaper than raw Levenshtein.
        let cheap = word_edit_distance("hands", "hants");
        assert!(cheap <= 1);
    }

    #[test]
    fn unrelated_letters_cost_full_substitution() {
        assert_eq!(word_edit_distance("hands", "handz"), 0); // s/z share a group
        assert!(word_edit_distance("cat", "dog") >= 2);
    }

    #[test]
    fn hence_scores_close_to_hands() {
        let scorer = PhoneticScorer::new();
        let query = vec!["let", "me", "see", "your", "hence"];
        let chunk_id = ChunkId("c0".into());
        let chunk = vec!["let", "me", "see", "your", "hands"];
        let score = scorer.score("let me see your hence", &query, &chunk_id, &chunk);
        assert!(score >= 0.7, "expected >= 0.7, got {score}");
    }

    #[test]
    fn self_similarity_is_one() {
        let scorer = PhoneticScorer::new();
        let tokens = vec!["the", "ability", "to", "say", "no"];
        let chunk_id = ChunkId("c1".into());
        let score = scorer.score("the ability to say no", &tokens, &chunk_id, &tokens);
        assert!((score - 1.0).abs() < 1e-6);
    }
}
