use crate::device::DeviceManager;
use autopilot_foundation::AudioError;
use autopilot_telemetry::PipelineMetrics;
use autopilot_vad::{EnergyVad, VadConfig, VadEngine, VadState};
use cpal::traits::{DeviceTrait, StreamTrait};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// One VAD-gated window of 16-bit mono PCM handed to the recognizer via
/// `audio_q`. `speech` carries the VAD's classification of the window itself
/// so the recognizer doesn't need to re-run VAD on material already gated.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Vec<i16>,
    pub captured_at: Instant,
    pub speech: bool,
}

#[derive(Debug, Clone)]
pub struct AudioStreamerConfig {
    pub device_name: Option<String>,
    pub vad: VadConfig,
    /// Trailing silence windows still forwarded after speech ends, so the
    /// recognizer sees the tail of the utterance (spec §4.1 hangover).
    pub hangover_frames: u32,
}

impl Default for AudioStreamerConfig {
    fn default() -> Self {
        Self {
            device_name: None,
            vad: VadConfig::default(),
            hangover_frames: 1,
        }
    }
}

/// Owns the microphone device callback. Per the spec's concurrency model this
/// is meant to live on a single dedicated thread: the only blocking point is
/// the OS delivering audio, everything else (segmentation, VAD, enqueue) runs
/// inline in the callback.
pub struct AudioStreamer {
    config: AudioStreamerConfig,
    running: Arc<AtomicBool>,
    stream: Option<cpal::Stream>,
}

impl AudioStreamer {
    pub fn new(config: AudioStreamerConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            stream: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Opens the input device and starts forwarding VAD-gated frames onto
    /// `audio_q`. Idempotent: calling `start` again while already running is
    /// a no-op. Device-open failure is fatal and returned to the caller;
    /// once running, a mid-stream read error is logged and the callback
    /// keeps going without enqueuing a corrupted frame.
    pub fn start(
        &mut self,
        audio_q: Sender<AudioFrame>,
        metrics: Arc<PipelineMetrics>,
    ) -> Result<(), AudioError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let manager = DeviceManager::new()?;
        let device = manager.open_input(self.config.device_name.as_deref())?;
        let supported = device
            .default_input_config()
            .map_err(|_| AudioError::FormatNotSupported {
                format: "no usable default input config".into(),
            })?;

        let channels = supported.channels() as usize;
        let mut vad_config = self.config.vad.clone();
        vad_config.sample_rate_hz = supported.sample_rate().0;
        let frame_size = vad_config.frame_size_samples;
        let hangover_frames = self.config.hangover_frames;
        let sample_format = supported.sample_format();
        let stream_config: cpal::StreamConfig = supported.into();

        let running = Arc::clone(&self.running);
        let err_metrics = Arc::clone(&metrics);
        let err_fn = move |err: cpal::StreamError| {
            err_metrics
                .audio_errors
                .fetch_add(1, Ordering::Relaxed);
            warn!(error = %err, "audio stream error, continuing");
        };

        let stream = match sample_format {
            cpal::SampleFormat::I16 => {
                let mut vad = EnergyVad::new(vad_config);
                let mut pending = Vec::with_capacity(frame_size * 2);
                let mut hangover_remaining = 0u32;
                let audio_q = audio_q.clone();
                let metrics = Arc::clone(&metrics);
                let running = Arc::clone(&running);
                device.build_input_stream(
                    &stream_config,
                    move |data: &[i16], _| {
                        if !running.load(Ordering::Relaxed) {
                            return;
                        }
                        let mono = downmix_i16(data, channels);
                        process_mono(
                            &mono,
                            &mut pending,
                            frame_size,
                            &mut vad,
                            hangover_frames,
                            &mut hangover_remaining,
                            &audio_q,
                            &metrics,
                        );
                    },
                    err_fn,
                    None,
                )?
            }
            cpal::SampleFormat::F32 => {
                let mut vad = EnergyVad::new(vad_config);
                let mut pending = Vec::with_capacity(frame_size * 2);
                let mut hangover_remaining = 0u32;
                let audio_q = audio_q.clone();
                let metrics = Arc::clone(&metrics);
                let running = Arc::clone(&running);
                device.build_input_stream(
                    &stream_config,
                    move |data: &[f32], _| {
                        if !running.load(Ordering::Relaxed) {
                            return;
                        }
                        let mono = downmix_f32(data, channels);
                        process_mono(
                            &mono,
                            &mut pending,
                            frame_size,
                            &mut vad,
                            hangover_frames,
                            &mut hangover_remaining,
                            &audio_q,
                            &metrics,
                        );
                    },
                    err_fn,
                    None,
                )?
            }
            other => {
                self.running.store(false, Ordering::SeqCst);
                return Err(AudioError::FormatNotSupported {
                    format: format!("{other:?}"),
                });
            }
        };

        stream.play()?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Safe to call from any thread that observes the streamer has started;
    /// dropping the `cpal::Stream` tears down the device callback.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.stream = None;
    }
}

fn downmix_i16(data: &[i16], channels: usize) -> Vec<i16> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

fn downmix_f32(data: &[f32], channels: usize) -> Vec<i16> {
    let to_i16 = |s: f32| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
    if channels <= 1 {
        return data.iter().copied().map(to_i16).collect();
    }
    data.chunks(channels)
        .map(|frame| {
            let sum: f32 = frame.iter().sum();
            to_i16(sum / frame.len() as f32)
        })
        .collect()
}

/// Buffers incoming mono samples into fixed-size VAD frames, classifies each,
/// and forwards speech (plus a short trailing hangover) onto `audio_q`.
/// A full queue drops the newest frame and counts it, per spec §5 backpressure.
#[allow(clippy::too_many_arguments)]
fn process_mono(
    mono: &[i16],
    pending: &mut Vec<i16>,
    frame_size: usize,
    vad: &mut EnergyVad,
    hangover_frames: u32,
    hangover_remaining: &mut u32,
    audio_q: &Sender<AudioFrame>,
    metrics: &PipelineMetrics,
) {
    pending.extend_from_slice(mono);
    while pending.len() >= frame_size {
        let frame: Vec<i16> = pending.drain(..frame_size).collect();
        metrics.increment_capture_frames();

        let state = match vad.classify(&frame) {
            Ok(state) => state,
            Err(_) => continue,
        };

        let admit = match state {
            VadState::Speech => {
                *hangover_remaining = hangover_frames;
                metrics.mark_speaking();
                true
            }
            VadState::Silence if *hangover_remaining > 0 => {
                *hangover_remaining -= 1;
                true
            }
            VadState::Silence => false,
        };

        if !admit {
            continue;
        }

        let audio_frame = AudioFrame {
            samples: frame,
            captured_at: Instant::now(),
            speech: matches!(state, VadState::Speech),
        };

        if audio_q.try_send(audio_frame).is_err() {
            metrics.increment_dropped_frames();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_passthrough_is_unchanged() {
        let data = vec![1i16, 2, 3, 4];
        assert_eq!(downmix_i16(&data, 1), data);
    }

    #[test]
    fn stereo_downmix_averages_channels() {
        let data = vec![10i16, -10, 20, 0];
        assert_eq!(downmix_i16(&data, 2), vec![0, 10]);
    }

    #[test]
    fn process_mono_drops_silence_without_hangover() {
        let (tx, rx) = crossbeam_channel::bounded(4);
        let metrics = PipelineMetrics::new();
        let mut vad = EnergyVad::new(VadConfig {
            frame_size_samples: 8,
            ..Default::default()
        });
        let mut pending = Vec::new();
        let mut hangover = 0u32;
        let silence = vec![0i16; 8];
        process_mono(&silence, &mut pending, 8, &mut vad, 1, &mut hangover, &tx, &metrics);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn process_mono_forwards_hangover_after_speech() {
        let (tx, rx) = crossbeam_channel::bounded(4);
        let metrics = PipelineMetrics::new();
        let mut vad = EnergyVad::new(VadConfig {
            frame_size_samples: 8,
            ..Default::default()
        });
        let mut pending = Vec::new();
        let mut hangover = 0u32;
        // settle the noise floor near zero, then a loud frame, then silence.
        for _ in 0..5 {
            process_mono(&vec![1i16; 8], &mut pending, 8, &mut vad, 1, &mut hangover, &tx, &metrics);
            rx.try_recv().ok();
        }
        process_mono(&vec![20_000i16; 8], &mut pending, 8, &mut vad, 1, &mut hangover, &tx, &metrics);
        assert!(rx.try_recv().is_ok());
        process_mono(&vec![0i16; 8], &mut pending, 8, &mut vad, 1, &mut hangover, &tx, &metrics);
        assert!(rx.try_recv().is_ok(), "hangover frame should still be forwarded");
        process_mono(&vec![0i16; 8], &mut pending, 8, &mut vad, 1, &mut hangover, &tx, &metrics);
        assert!(rx.try_recv().is_err(), "hangover budget exhausted");
    }
}
