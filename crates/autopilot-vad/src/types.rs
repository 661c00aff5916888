/// Silence/speech classification of a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadState {
    Silence,
    Speech,
}

impl Default for VadState {
    fn default() -> Self {
        Self::Silence
    }
}

/// VAD tuning. `aggressiveness` is the spec's 0–3 knob; higher rejects more
/// borderline-quiet audio as silence, mirroring WebRTC-style VAD presets.
#[derive(Debug, Clone)]
pub struct VadConfig {
    pub aggressiveness: u8,
    pub sample_rate_hz: u32,
    pub frame_size_samples: usize,
    /// Frames of trailing silence folded into the preceding speech run
    /// before a SpeechEnd is considered settled (spec §4.1 hangover window).
    pub hangover_frames: u32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            aggressiveness: 2,
            sample_rate_hz: 16_000,
            frame_size_samples: 3_200, // 200ms @ 16kHz
            hangover_frames: 1,
        }
    }
}

impl VadConfig {
    /// Onset threshold in dBFS above the noise floor. Aggressiveness 0 is
    /// permissive (admits quieter speech); 3 is strict.
    pub fn onset_threshold_db(&self) -> f32 {
        match self.aggressiveness {
            0 => 3.0,
            1 => 6.0,
            2 => 9.0,
            _ => 12.0,
        }
    }

    pub fn offset_threshold_db(&self) -> f32 {
        self.onset_threshold_db() - 3.0
    }
}
