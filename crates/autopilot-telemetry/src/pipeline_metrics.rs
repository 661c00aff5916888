use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared metrics for cross-thread pipeline monitoring.
#[derive(Clone)]
pub struct PipelineMetrics {
    // Event counters
    pub capture_frames: Arc<AtomicU64>,
    pub capture_frames_dropped: Arc<AtomicU64>,
    pub hypotheses_emitted: Arc<AtomicU64>,
    pub hypotheses_deduped: Arc<AtomicU64>,
    pub hypotheses_dropped: Arc<AtomicU64>,
    pub match_calls: Arc<AtomicU64>,
    pub decisions_stay: Arc<AtomicU64>,
    pub decisions_forward: Arc<AtomicU64>,

    // Frame rate tracking
    pub capture_fps: Arc<AtomicU64>, // frames/sec * 10

    // Pipeline stage activity (decays on inactivity, used for dashboards)
    pub stage_capture: Arc<AtomicBool>,
    pub stage_recognize: Arc<AtomicBool>,
    pub stage_navigate: Arc<AtomicBool>,

    // Error counters
    pub audio_errors: Arc<AtomicU64>,
    pub stt_errors: Arc<AtomicU64>,
    pub match_embedding_failures: Arc<AtomicU64>,

    pub last_speech_time: Arc<RwLock<Option<Instant>>>,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self {
            capture_frames: Arc::new(AtomicU64::new(0)),
            capture_frames_dropped: Arc::new(AtomicU64::new(0)),
            hypotheses_emitted: Arc::new(AtomicU64::new(0)),
            hypotheses_deduped: Arc::new(AtomicU64::new(0)),
            hypotheses_dropped: Arc::new(AtomicU64::new(0)),
            match_calls: Arc::new(AtomicU64::new(0)),
            decisions_stay: Arc::new(AtomicU64::new(0)),
            decisions_forward: Arc::new(AtomicU64::new(0)),
            capture_fps: Arc::new(AtomicU64::new(0)),
            stage_capture: Arc::new(AtomicBool::new(false)),
            stage_recognize: Arc::new(AtomicBool::new(false)),
            stage_navigate: Arc::new(AtomicBool::new(false)),
            audio_errors: Arc::new(AtomicU64::new(0)),
            stt_errors: Arc::new(AtomicU64::new(0)),
            match_embedding_failures: Arc::new(AtomicU64::new(0)),
            last_speech_time: Arc::new(RwLock::new(None)),
        }
    }
}

impl PipelineMetrics {
    pub fn increment_capture_frames(&self) {
        self.capture_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_dropped_frames(&self) {
        self.capture_frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hypothesis(&self, deduped: bool) {
        if deduped {
            self.hypotheses_deduped.fetch_add(1, Ordering::Relaxed);
        } else {
            self.hypotheses_emitted.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_decision(&self, forwarded: bool) {
        if forwarded {
            self.decisions_forward.fetch_add(1, Ordering::Relaxed);
        } else {
            self.decisions_stay.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn update_capture_fps(&self, fps: f64) {
        self.capture_fps
            .store((fps * 10.0) as u64, Ordering::Relaxed);
    }

    pub fn mark_speaking(&self) {
        *self.last_speech_time.write() = Some(Instant::now());
    }
}

/// Tracks frames-per-second in a rolling one-second window, grounded on the
/// same tick-and-reset shape used for audio level reporting elsewhere in the
/// pipeline.
#[derive(Debug)]
pub struct FpsTracker {
    last_update: Instant,
    frame_count: u64,
}

impl FpsTracker {
    pub fn new() -> Self {
        Self {
            last_update: Instant::now(),
            frame_count: 0,
        }
    }

    pub fn tick(&mut self) -> Option<f64> {
        self.frame_count += 1;
        let elapsed = self.last_update.elapsed();

        if elapsed >= Duration::from_secs(1) {
            let fps = self.frame_count as f64 / elapsed.as_secs_f64();
            self.last_update = Instant::now();
            self.frame_count = 0;
            Some(fps)
        } else {
            None
        }
    }
}

impl Default for FpsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_counters_split_by_kind() {
        let m = PipelineMetrics::default();
        m.record_decision(false);
        m.record_decision(true);
        m.record_decision(true);
        assert_eq!(m.decisions_stay.load(Ordering::Relaxed), 1);
        assert_eq!(m.decisions_forward.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn fps_tracker_waits_a_full_second_before_reporting() {
        let mut tracker = FpsTracker::new();
        assert_eq!(tracker.tick(), None);
    }
}
