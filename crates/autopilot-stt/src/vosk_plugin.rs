//! Optional local recognizer backed by the `vosk` crate (libvosk bindings).
//! Compiled only with `--features vosk`; requires a model directory on disk.

use crate::plugin::SttPlugin;
use crate::types::TranscriptionEvent;
use async_trait::async_trait;
use autopilot_foundation::SttError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use vosk::{CompleteResult, Model, Recognizer};

static NEXT_UTTERANCE_ID: AtomicU64 = AtomicU64::new(1);

pub struct VoskSttPlugin {
    model_path: PathBuf,
    sample_rate_hz: f32,
    recognizer: Option<Recognizer>,
    utterance_id: u64,
    last_partial: String,
}

impl VoskSttPlugin {
    pub fn new(model_path: impl Into<PathBuf>, sample_rate_hz: f32) -> Self {
        Self {
            model_path: model_path.into(),
            sample_rate_hz,
            recognizer: None,
            utterance_id: NEXT_UTTERANCE_ID.fetch_add(1, Ordering::Relaxed),
            last_partial: String::new(),
        }
    }

    fn ensure_recognizer(&mut self) -> Result<&mut Recognizer, SttError> {
        if self.recognizer.is_none() {
            let path = self.model_path.display().to_string();
            let model = Model::new(&path).ok_or_else(|| SttError::ModelNotFound { path })?;
            let recognizer = Recognizer::new(&model, self.sample_rate_hz)
                .ok_or_else(|| SttError::InitFailed("vosk recognizer init failed".into()))?;
            self.recognizer = Some(recognizer);
        }
        Ok(self.recognizer.as_mut().expect("just initialized"))
    }
}

#[async_trait]
impl SttPlugin for VoskSttPlugin {
    fn id(&self) -> &'static str {
        "vosk"
    }

    async fn accept_frame(
        &mut self,
        samples: &[i16],
    ) -> Result<Option<TranscriptionEvent>, SttError> {
        let utterance_id = self.utterance_id;
        let recognizer = self.ensure_recognizer()?;
        let complete = matches!(recognizer.accept_waveform(samples), Ok(_));
        if complete {
            let result = recognizer.result();
            let text = match result {
                CompleteResult::Single(single) => single.text.to_string(),
                CompleteResult::Multiple(alts) => alts
                    .alternatives
                    .first()
                    .map(|a| a.text.to_string())
                    .unwrap_or_default(),
            };
            if text.is_empty() {
                return Ok(None);
            }
            self.last_partial.clear();
            return Ok(Some(TranscriptionEvent::Final { utterance_id, text }));
        }

        let partial = recognizer.partial_result();
        let text = partial.partial.to_string();
        if text.is_empty() || text == self.last_partial {
            return Ok(None);
        }
        self.last_partial = text.clone();
        Ok(Some(TranscriptionEvent::Partial { utterance_id, text }))
    }

    async fn finalize_utterance(&mut self) -> Result<Option<TranscriptionEvent>, SttError> {
        let utterance_id = self.utterance_id;
        let recognizer = self.ensure_recognizer()?;
        let result = recognizer.final_result();
        let text = match result {
            CompleteResult::Single(single) => single.text.to_string(),
            CompleteResult::Multiple(alts) => alts
                .alternatives
                .first()
                .map(|a| a.text.to_string())
                .unwrap_or_default(),
        };
        self.last_partial.clear();
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(TranscriptionEvent::Final { utterance_id, text }))
    }

    fn reset(&mut self) {
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.reset();
        }
        self.last_partial.clear();
        self.utterance_id = NEXT_UTTERANCE_ID.fetch_add(1, Ordering::Relaxed);
    }
}
