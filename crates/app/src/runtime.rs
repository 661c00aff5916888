//! Wires the three pipeline stages (spec §5) onto their own OS threads and
//! hands back a handle `main` can hold for the lifetime of the process.

use crate::config::Settings;
use async_trait::async_trait;
use autopilot_actuator::{Actuator, KeypressActuator, NoOpActuator};
use autopilot_audio::{AudioStreamer, AudioStreamerConfig};
use autopilot_corpus::{load_corpus, Corpus};
use autopilot_foundation::{PilotError, ShutdownSignal, SttError};
use autopilot_match::{HashingEmbedder, SpeechMatcher};
use autopilot_nav::{Decision, NavigatorConfig, RealtimeNavigator};
use autopilot_stt::{Hypothesis, MockSttPlugin, RecognizerWorker, SttPlugin, TranscriptionEvent};
use autopilot_telemetry::PipelineMetrics;
use autopilot_vad::VadConfig;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::info;

#[cfg(feature = "vosk")]
use autopilot_stt::VoskSttPlugin;

const AUDIO_QUEUE_CAPACITY: usize = 64;
const SPEECH_QUEUE_CAPACITY: usize = 16;

/// Selects the recognizer backend at startup instead of monomorphizing
/// `RecognizerWorker` per backend, mirroring the reference's plugin
/// selection layer without dragging its full registry/failover machinery
/// in (spec's Non-goals exclude multi-backend failover).
enum SttBackend {
    Mock(MockSttPlugin),
    #[cfg(feature = "vosk")]
    Vosk(VoskSttPlugin),
}

#[async_trait]
impl SttPlugin for SttBackend {
    fn id(&self) -> &'static str {
        match self {
            SttBackend::Mock(p) => p.id(),
            #[cfg(feature = "vosk")]
            SttBackend::Vosk(p) => p.id(),
        }
    }

    async fn accept_frame(
        &mut self,
        samples: &[i16],
    ) -> Result<Option<TranscriptionEvent>, SttError> {
        match self {
            SttBackend::Mock(p) => p.accept_frame(samples).await,
            #[cfg(feature = "vosk")]
            SttBackend::Vosk(p) => p.accept_frame(samples).await,
        }
    }

    async fn finalize_utterance(&mut self) -> Result<Option<TranscriptionEvent>, SttError> {
        match self {
            SttBackend::Mock(p) => p.finalize_utterance().await,
            #[cfg(feature = "vosk")]
            SttBackend::Vosk(p) => p.finalize_utterance().await,
        }
    }

    fn reset(&mut self) {
        match self {
            SttBackend::Mock(p) => p.reset(),
            #[cfg(feature = "vosk")]
            SttBackend::Vosk(p) => p.reset(),
        }
    }
}

fn build_stt_backend(settings: &Settings) -> SttBackend {
    #[cfg(feature = "vosk")]
    if let Some(path) = &settings.stt_model_path {
        return SttBackend::Vosk(VoskSttPlugin::new(path, settings.sample_rate_hz as f32));
    }
    let _ = settings;
    SttBackend::Mock(MockSttPlugin::new(Vec::new()))
}

fn build_actuator(settings: &Settings) -> Arc<dyn Actuator> {
    match settings.actuator.as_str() {
        "noop" => Arc::new(NoOpActuator::new()),
        _ => Arc::new(KeypressActuator::new()),
    }
}

/// Everything `main` needs to keep alive and eventually tear down. Dropping
/// `_audio_streamer` stops the microphone stream; the two worker threads
/// exit once `shutdown` is cancelled and their channels observe it.
pub struct AppHandle {
    pub metrics: Arc<PipelineMetrics>,
    _audio_streamer: AudioStreamer,
    stt_handle: JoinHandle<Result<(), PilotError>>,
    nav_handle: JoinHandle<Result<(), PilotError>>,
}

impl AppHandle {
    pub fn shutdown(self, shutdown: ShutdownSignal) {
        shutdown.cancel();
        if let Err(err) = self.stt_handle.join() {
            tracing::warn!(?err, "recognizer thread panicked during shutdown");
        }
        if let Err(err) = self.nav_handle.join() {
            tracing::warn!(?err, "navigation thread panicked during shutdown");
        }
    }
}

pub fn start(settings: &Settings, shutdown: ShutdownSignal) -> Result<AppHandle, PilotError> {
    let corpus: Arc<Corpus> =
        Arc::new(load_corpus(&settings.transcript_path, &settings.chunks_path)?);
    info!(chunks = corpus.len_chunks(), "corpus loaded");

    let metrics = Arc::new(PipelineMetrics::default());
    let (audio_tx, audio_rx) = crossbeam_channel::bounded(AUDIO_QUEUE_CAPACITY);
    let (speech_tx, speech_rx) = crossbeam_channel::bounded::<Hypothesis>(SPEECH_QUEUE_CAPACITY);

    let vad = VadConfig {
        aggressiveness: settings.vad_aggressiveness,
        sample_rate_hz: settings.sample_rate_hz,
        frame_size_samples: (settings.sample_rate_hz as u64 * settings.frame_duration_ms as u64
            / 1000) as usize,
        hangover_frames: settings.hangover_frames,
    };
    let mut audio_streamer = AudioStreamer::new(AudioStreamerConfig {
        device_name: settings.device.clone(),
        vad,
        hangover_frames: settings.hangover_frames,
    });
    audio_streamer.start(audio_tx, metrics.clone())?;

    let stt_plugin = build_stt_backend(settings);
    let recognizer = RecognizerWorker::new(stt_plugin, metrics.clone());
    let stt_shutdown = shutdown.clone();
    let stt_handle = std::thread::Builder::new()
        .name("autopilot-recognizer".into())
        .spawn(move || recognizer.run(audio_rx, speech_tx, stt_shutdown))
        .map_err(|e| PilotError::Fatal(format!("failed to spawn recognizer thread: {e}")))?;

    let embedder = Box::new(HashingEmbedder::new(settings.embedding_dim));
    let matcher = SpeechMatcher::with_top_k(corpus.clone(), embedder, settings.top_k)?;
    let navigator_config = NavigatorConfig {
        min_confidence: settings.min_confidence,
    };
    let navigator = RealtimeNavigator::new(corpus, matcher, navigator_config);
    let actuator = build_actuator(settings);
    let nav_metrics = metrics.clone();
    let nav_shutdown = shutdown.clone();
    let nav_handle = std::thread::Builder::new()
        .name("autopilot-navigator".into())
        .spawn(move || run_navigation_worker(navigator, actuator, speech_rx, nav_shutdown, nav_metrics))
        .map_err(|e| PilotError::Fatal(format!("failed to spawn navigation thread: {e}")))?;

    Ok(AppHandle {
        metrics,
        _audio_streamer: audio_streamer,
        stt_handle,
        nav_handle,
    })
}

/// Thread C (spec §5): turns settled hypotheses into navigation decisions
/// and, on `Forward`, a single actuator call advancing by the delta from
/// the previous position.
fn run_navigation_worker(
    mut navigator: RealtimeNavigator,
    actuator: Arc<dyn Actuator>,
    speech_q: crossbeam_channel::Receiver<Hypothesis>,
    shutdown: ShutdownSignal,
    metrics: Arc<PipelineMetrics>,
) -> Result<(), PilotError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|e| PilotError::Fatal(format!("failed to start navigator runtime: {e}")))?;

    loop {
        if shutdown.is_cancelled() {
            break;
        }
        match speech_q.recv_timeout(std::time::Duration::from_millis(200)) {
            Ok(hypothesis) => {
                let previous = navigator.current_idx();
                let decision = navigator.decide(&hypothesis.text);
                metrics.record_decision(matches!(decision, Decision::Forward(_)));
                if let Decision::Forward(new_idx) = decision {
                    let delta = new_idx.saturating_sub(previous);
                    if delta > 0 {
                        if let Err(err) = rt.block_on(actuator.advance(delta)) {
                            tracing::warn!(?err, "actuator advance failed");
                        }
                    }
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(())
}
