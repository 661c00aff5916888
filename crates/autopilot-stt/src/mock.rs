use crate::plugin::SttPlugin;
use crate::types::TranscriptionEvent;
use async_trait::async_trait;
use autopilot_foundation::SttError;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_UTTERANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Deterministic STT stand-in for tests: emits a pre-scripted sequence of
/// growing partials, one per `accept_frame` call, and a final on
/// `finalize_utterance` (or once the script is exhausted).
#[derive(Debug)]
pub struct MockSttPlugin {
    script: Vec<String>,
    cursor: usize,
    utterance_id: u64,
    last_emitted: Option<String>,
}

impl MockSttPlugin {
    pub fn new(script: Vec<String>) -> Self {
        Self {
            script,
            cursor: 0,
            utterance_id: NEXT_UTTERANCE_ID.fetch_add(1, Ordering::Relaxed),
            last_emitted: None,
        }
    }

    pub fn single_shot(text: impl Into<String>) -> Self {
        Self::new(vec![text.into()])
    }
}

#[async_trait]
impl SttPlugin for MockSttPlugin {
    fn id(&self) -> &'static str {
        "mock"
    }

    async fn accept_frame(
        &mut self,
        _samples: &[i16],
    ) -> Result<Option<TranscriptionEvent>, SttError> {
        if self.cursor >= self.script.len() {
            return Ok(None);
        }
        let text = self.script[self.cursor].clone();
        self.cursor += 1;
        self.last_emitted = Some(text.clone());
        Ok(Some(TranscriptionEvent::Partial {
            utterance_id: self.utterance_id,
            text,
        }))
    }

    async fn finalize_utterance(&mut self) -> Result<Option<TranscriptionEvent>, SttError> {
        let text = match self.last_emitted.take() {
            Some(text) => text,
            None => return Ok(None),
        };
        self.cursor = 0;
        Ok(Some(TranscriptionEvent::Final {
            utterance_id: self.utterance_id,
            text,
        }))
    }

    fn reset(&mut self) {
        self.cursor = 0;
        self.last_emitted = None;
        self.utterance_id = NEXT_UTTERANCE_ID.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emits_script_then_a_final_on_finalize() {
        let mut plugin = MockSttPlugin::new(vec!["hello".into(), "hello world".into()]);
        let first = plugin.accept_frame(&[]).await.unwrap().unwrap();
        assert_eq!(first.text(), "hello");
        assert!(!first.is_final());

        let second = plugin.accept_frame(&[]).await.unwrap().unwrap();
        assert_eq!(second.text(), "hello world");

        assert!(plugin.accept_frame(&[]).await.unwrap().is_none());

        let fin = plugin.finalize_utterance().await.unwrap().unwrap();
        assert_eq!(fin.text(), "hello world");
        assert!(fin.is_final());
    }

    #[tokio::test]
    async fn reset_clears_script_cursor() {
        let mut plugin = MockSttPlugin::new(vec!["hi".into()]);
        plugin.accept_frame(&[]).await.unwrap();
        plugin.reset();
        let again = plugin.accept_frame(&[]).await.unwrap().unwrap();
        assert_eq!(again.text(), "hi");
    }
}
