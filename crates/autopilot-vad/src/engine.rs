use crate::energy::EnergyCalculator;
use crate::types::{VadConfig, VadState};
use autopilot_foundation::VadError;

/// Common interface so the streamer can swap VAD implementations without
/// caring how speech/silence is actually classified.
pub trait VadEngine: Send {
    fn classify(&mut self, frame: &[i16]) -> Result<VadState, VadError>;
    fn reset(&mut self);
    fn required_frame_size_samples(&self) -> usize;
}

/// Energy-based VAD with an adaptive noise floor (EMA) and the
/// aggressiveness-derived onset/offset thresholds of [`VadConfig`].
pub struct EnergyVad {
    config: VadConfig,
    energy_calc: EnergyCalculator,
    noise_floor_db: f32,
    ema_alpha: f32,
    state: VadState,
}

impl EnergyVad {
    pub fn new(config: VadConfig) -> Self {
        Self {
            noise_floor_db: -50.0,
            ema_alpha: 0.02,
            energy_calc: EnergyCalculator::new(),
            state: VadState::Silence,
            config,
        }
    }

    fn update_floor(&mut self, energy_db: f32) {
        // Only chase the floor downward/slowly when we are not currently in
        // speech, so a loud utterance doesn't drag the floor up mid-sentence.
        if self.state == VadState::Silence {
            self.noise_floor_db =
                self.ema_alpha * energy_db + (1.0 - self.ema_alpha) * self.noise_floor_db;
        }
    }
}

impl VadEngine for EnergyVad {
    fn classify(&mut self, frame: &[i16]) -> Result<VadState, VadError> {
        if frame.len() != self.config.frame_size_samples {
            return Err(VadError::InvalidFrameSize {
                expected: self.config.frame_size_samples,
                actual: frame.len(),
            });
        }

        let energy_db = self.energy_calc.calculate_dbfs(frame);
        let above_floor = energy_db - self.noise_floor_db;

        self.state = match self.state {
            VadState::Silence => {
                if above_floor >= self.config.onset_threshold_db() {
                    VadState::Speech
                } else {
                    VadState::Silence
                }
            }
            VadState::Speech => {
                if above_floor < self.config.offset_threshold_db() {
                    VadState::Silence
                } else {
                    VadState::Speech
                }
            }
        };

        self.update_floor(energy_db);
        Ok(self.state)
    }

    fn reset(&mut self) {
        self.state = VadState::Silence;
        self.noise_floor_db = -50.0;
    }

    fn required_frame_size_samples(&self) -> usize {
        self.config.frame_size_samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_at_level(samples: usize, amplitude: i16) -> Vec<i16> {
        vec![amplitude; samples]
    }

    #[test]
    fn classifies_silence_as_silence() {
        let config = VadConfig {
            frame_size_samples: 320,
            ..Default::default()
        };
        let mut vad = EnergyVad::new(config);
        let frame = frame_at_level(320, 0);
        assert_eq!(vad.classify(&frame).unwrap(), VadState::Silence);
    }

    #[test]
    fn loud_frame_after_silence_floor_triggers_speech() {
        let config = VadConfig {
            frame_size_samples: 320,
            ..Default::default()
        };
        let mut vad = EnergyVad::new(config);
        // settle the floor on near-silence first
        for _ in 0..20 {
            vad.classify(&frame_at_level(320, 5)).unwrap();
        }
        let state = vad.classify(&frame_at_level(320, 20_000)).unwrap();
        assert_eq!(state, VadState::Speech);
    }

    #[test]
    fn wrong_frame_size_is_an_error() {
        let mut vad = EnergyVad::new(VadConfig {
            frame_size_samples: 320,
            ..Default::default()
        });
        let err = vad.classify(&[0i16; 10]).unwrap_err();
        assert!(matches!(err, VadError::InvalidFrameSize { .. }));
    }
}
