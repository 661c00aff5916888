use autopilot_corpus::model::ChunkId;
use autopilot_corpus::Corpus;
use autopilot_match::SpeechMatcher;
use std::sync::Arc;
use tracing::debug;

/// One decision per hypothesis: hold position, or advance to a specific
/// transcript index. `Forward` never carries a target behind `current_idx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Stay,
    Forward(u32),
}

/// `min_confidence` is the spec's opt-in safety gate (§4.4, §9 open
/// questions): the reference does not score-gate decisions, so this
/// defaults to `None` (no gate) and must be explicitly enabled.
#[derive(Debug, Clone, Default)]
pub struct NavigatorConfig {
    pub min_confidence: Option<f32>,
}

/// Reconciles noisy partial ASR hypotheses with presentation position
/// (spec §4.4). Owns `current_idx`, which only this component touches, and
/// is never shared across threads in the default topology.
pub struct RealtimeNavigator {
    corpus: Arc<Corpus>,
    matcher: SpeechMatcher,
    config: NavigatorConfig,
    current_idx: u32,
    /// The `(chunk_id, resulting current_idx)` of the last `Forward` this
    /// navigator emitted. Keyed on the *outcome*, not just the chunk, so a
    /// repeat match of the same chunk after a jump can still drive a
    /// distinct later boundary (e.g. a Case-3 early-forward that only
    /// applies once `current_idx` has moved onto that chunk's transcript).
    last_acted: Option<(ChunkId, u32)>,
}

impl RealtimeNavigator {
    pub fn new(corpus: Arc<Corpus>, matcher: SpeechMatcher, config: NavigatorConfig) -> Self {
        Self {
            corpus,
            matcher,
            config,
            current_idx: 0,
            last_acted: None,
        }
    }

    pub fn current_idx(&self) -> u32 {
        self.current_idx
    }

    /// Runs the matcher, then the three-case decision procedure. Never
    /// panics: any input that can't be resolved to a concrete chunk/
    /// transcript degrades to `Stay`, per the spec's "stay is safe" policy.
    pub fn decide(&mut self, normalized_query: &str) -> Decision {
        let matches = self.matcher.top_matches(normalized_query);
        let Some(top) = matches.first() else {
            return Decision::Stay;
        };

        if let Some(min_confidence) = self.config.min_confidence {
            if top.score < min_confidence {
                debug!(score = top.score, min_confidence, "below confidence floor");
                return Decision::Stay;
            }
        }

        let Some(chunk) = self.corpus.chunk_by_id(&top.chunk_id) else {
            return Decision::Stay;
        };
        let Some(expected_idx) = self.corpus.transcript_index_of(chunk.first_source()) else {
            return Decision::Stay;
        };

        let is_current_source = expected_idx == self.current_idx;
        let next_chunk = self.corpus.chunk_by_index(chunk.chunk_index + 1);
        let is_next_source_different = next_chunk
            .map(|next| next.first_source() != chunk.first_source())
            .unwrap_or(false);
        let current_early_forward = self
            .corpus
            .transcript_by_index(self.current_idx)
            .map(|t| t.early_forward)
            .unwrap_or(false);

        // Case 2 — forward jump: a different, later transcript matched.
        if !is_current_source && expected_idx > self.current_idx {
            let target = expected_idx;
            // Idempotence: don't re-fire the same chunk->target jump twice.
            if self.last_acted.as_ref() != Some(&(chunk.chunk_id.clone(), target)) {
                self.current_idx = target;
                self.last_acted = Some((chunk.chunk_id.clone(), target));
                return Decision::Forward(self.current_idx);
            }
            return Decision::Stay;
        }

        // Case 3 — forward early: still mid-slide, but this is the last
        // window before a boundary and the slide is marked fluid.
        if is_current_source && current_early_forward && is_next_source_different {
            let target = self.current_idx + 1;
            // Idempotence: don't re-fire the same chunk->target boundary
            // twice, even though the chunk here may be the one a prior
            // Case-2 jump already landed on.
            if self.last_acted.as_ref() != Some(&(chunk.chunk_id.clone(), target)) {
                self.current_idx = target;
                self.last_acted = Some((chunk.chunk_id.clone(), target));
                return Decision::Forward(self.current_idx);
            }
            return Decision::Stay;
        }

        // Case 1 — stay: mid-slide, a backward match, or anything else we
        // can't confidently advance on.
        Decision::Stay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autopilot_corpus::model::{Chunk, TranscriptId, TranscriptItem};
    use autopilot_match::HashingEmbedder;

    fn scenario_corpus() -> Arc<Corpus> {
        let t = |i: u32, id: &str, text: &str, ef: bool| TranscriptItem {
            transcript_index: i,
            transcript_id: TranscriptId(id.into()),
            text: text.into(),
            early_forward: ef,
        };
        let transcripts = vec![
            t(0, "t0", "the ability to say no", true),
            t(
                1,
                "t1",
                "have you ever struggled when you tried to say no to someone",
                true,
            ),
            t(
                2,
                "t2",
                "or perhaps you couldnt say no to a person because you felt bad for them",
                true,
            ),
        ];

        let c = |idx: u32, id: &str, sources: &[&str], text: &str| Chunk {
            chunk_index: idx,
            chunk_id: ChunkId(id.into()),
            source_transcripts: sources.iter().map(|s| TranscriptId((*s).into())).collect(),
            text: text.into(),
        };
        let chunks = vec![
            c(0, "c0", &["t0"], "the ability to say no have you"),
            c(1, "c1", &["t0", "t1"], "ability to say no have you ever"),
            c(
                2,
                "c2",
                &["t1"],
                "ever struggled when you tried to say",
            ),
            c(3, "c3", &["t1"], "struggled when you tried to say no"),
            c(
                4,
                "c4",
                &["t1", "t2"],
                "tried to say no to someone or",
            ),
            c(5, "c5", &["t2"], "to someone or perhaps you couldnt say"),
            c(6, "c6", &["t2"], "or perhaps you couldnt say no to"),
        ];
        Arc::new(Corpus::new(transcripts, chunks))
    }

    fn navigator(current_idx: u32) -> RealtimeNavigator {
        let corpus = scenario_corpus();
        let matcher =
            SpeechMatcher::new(Arc::clone(&corpus), Box::new(HashingEmbedder::default()))
                .unwrap();
        let mut nav = RealtimeNavigator::new(corpus, matcher, NavigatorConfig::default());
        nav.current_idx = current_idx;
        nav
    }

    #[test]
    fn backward_match_never_rewinds() {
        let mut nav = navigator(2);
        let decision = nav.decide("the ability");
        assert_eq!(decision, Decision::Stay);
        assert_eq!(nav.current_idx(), 2);
    }

    #[test]
    fn forward_jump_skips_ahead() {
        let mut nav = navigator(0);
        let decision = nav.decide("or perhaps you couldnt");
        assert_eq!(decision, Decision::Forward(2));
        assert_eq!(nav.current_idx(), 2);
    }

    #[test]
    fn repeated_hypothesis_forwards_exactly_once() {
        let mut nav = navigator(1);
        let query = "tried to say no to someone or";
        assert_eq!(nav.decide(query), Decision::Forward(2));
        assert_eq!(nav.decide(query), Decision::Stay);
        assert_eq!(nav.decide(query), Decision::Stay);
        assert_eq!(nav.current_idx(), 2);
    }

    #[test]
    fn a_case3_boundary_can_still_fire_through_the_chunk_a_jump_landed_on() {
        // c4 ("tried to say no to someone or") sources t1 then t2. Starting
        // before t1, the same query first drives a Case-2 jump onto t1 via
        // c4, then on a repeat of that *same* query/chunk, current_idx has
        // now moved onto t1 so the early-forward Case-3 boundary out of c4
        // legitimately applies too. Idempotence must not suppress it just
        // because c4 was also the chunk behind the earlier jump.
        let mut nav = navigator(0);
        let query = "tried to say no to someone or";
        assert_eq!(nav.decide(query), Decision::Forward(1));
        assert_eq!(nav.decide(query), Decision::Forward(2));
        assert_eq!(nav.decide(query), Decision::Stay);
        assert_eq!(nav.current_idx(), 2);
    }

    #[test]
    fn current_idx_is_monotonic_across_a_session() {
        let mut nav = navigator(0);
        let mut last = nav.current_idx();
        for query in [
            "the ability to say no",
            "have you ever struggled",
            "the ability",
            "or perhaps you couldnt",
            "tried to say no to someone or",
        ] {
            nav.decide(query);
            assert!(nav.current_idx() >= last);
            last = nav.current_idx();
        }
    }
}
