use crate::plugin::SttPlugin;
use crate::types::{Hypothesis, TranscriptionEvent};
use autopilot_audio::AudioFrame;
use autopilot_corpus::normalize;
use autopilot_foundation::{PilotError, ShutdownSignal};
use autopilot_telemetry::PipelineMetrics;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Drives an [`SttPlugin`] off `audio_q`, dedupes consecutive partials that
/// normalize identically, and forwards settled [`Hypothesis`]es to the
/// matcher's `speech_q`. Meant to own its own OS thread (spec §5); the
/// plugin's async methods are driven through a small current-thread Tokio
/// runtime so a blocking STT backend doesn't need a surrounding executor.
pub struct RecognizerWorker<P: SttPlugin> {
    plugin: P,
    metrics: Arc<PipelineMetrics>,
}

impl<P: SttPlugin> RecognizerWorker<P> {
    pub fn new(plugin: P, metrics: Arc<PipelineMetrics>) -> Self {
        Self { plugin, metrics }
    }

    pub fn run(
        mut self,
        audio_q: Receiver<AudioFrame>,
        speech_q: Sender<Hypothesis>,
        shutdown: ShutdownSignal,
    ) -> Result<(), PilotError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| PilotError::Fatal(format!("failed to start recognizer runtime: {e}")))?;

        let mut in_utterance = false;
        let mut last_normalized: Option<String> = None;

        loop {
            if shutdown.is_cancelled() {
                break;
            }
            match audio_q.recv_timeout(Duration::from_millis(200)) {
                Ok(frame) => {
                    if frame.speech {
                        in_utterance = true;
                        if let Some(event) = rt.block_on(self.plugin.accept_frame(&frame.samples))?
                        {
                            self.emit(event, &speech_q, &mut last_normalized);
                        }
                    } else if in_utterance {
                        in_utterance = false;
                        if let Some(event) = rt.block_on(self.plugin.finalize_utterance())? {
                            self.emit(event, &speech_q, &mut last_normalized);
                        }
                        self.plugin.reset();
                        last_normalized = None;
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        Ok(())
    }

    fn emit(
        &self,
        event: TranscriptionEvent,
        speech_q: &Sender<Hypothesis>,
        last_normalized: &mut Option<String>,
    ) {
        let hypothesis: Hypothesis = event.into();
        let normalized = normalize(&hypothesis.text);
        let is_repeat = last_normalized.as_deref() == Some(normalized.as_str());
        self.metrics.record_hypothesis(is_repeat);

        if is_repeat && !hypothesis.is_final {
            debug!(text = %hypothesis.text, "deduped repeat partial");
            return;
        }
        *last_normalized = Some(normalized);

        // Navigation only ever cares about the latest hypothesis (spec §5), so
        // a full speech_q yields to it by evicting the oldest queued entry
        // rather than discarding this one.
        if let Err(err) = speech_q.try_send(hypothesis) {
            match err {
                crossbeam_channel::TrySendError::Full(hypothesis) => {
                    self.metrics
                        .hypotheses_dropped
                        .fetch_add(1, Ordering::Relaxed);
                    warn!("speech_q full, dropping oldest hypothesis");
                    let _ = speech_q.try_recv();
                    if speech_q.try_send(hypothesis).is_err() {
                        warn!("speech_q still full after eviction, dropped hypothesis");
                    }
                }
                crossbeam_channel::TrySendError::Disconnected(_) => {
                    warn!("speech_q disconnected, dropped hypothesis");
                }
            }
        }
    }
}
