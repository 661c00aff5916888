use serde::{Deserialize, Serialize};

/// Layered configuration: built-in defaults, then an optional `autopilot.toml`
/// in the working directory, then `AUTOPILOT_*` environment variables
/// (double underscore separates nesting, e.g. `AUTOPILOT_VAD__AGGRESSIVENESS`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path to `{user}_transcript.json`.
    pub transcript_path: String,
    /// Path to `{user}_chunks.json`.
    pub chunks_path: String,
    /// Input device name; `None` uses the host's default input device.
    pub device: Option<String>,

    pub sample_rate_hz: u32,
    pub frame_duration_ms: u32,
    pub vad_aggressiveness: u8,
    pub hangover_frames: u32,

    pub top_k: usize,
    /// Opt-in safety gate (spec §9 open question); `None` means no gate,
    /// matching the reference's behavior.
    pub min_confidence: Option<f32>,

    /// Externally configurable embedding model identifier (spec §6). The
    /// default `HashingEmbedder` ignores this; it exists so a real
    /// embedding backend can be selected without touching the rest of the
    /// pipeline.
    pub embedding_model: String,
    pub embedding_dim: usize,

    /// Path to the local STT model directory, used only when built with
    /// `--features vosk`.
    pub stt_model_path: Option<String>,

    /// "noop" or "keypress".
    pub actuator: String,

    /// `None` uses the default 7-day retention; `Some(0)` disables pruning.
    pub log_retention_days: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            transcript_path: "transcript.json".into(),
            chunks_path: "chunks.json".into(),
            device: None,
            sample_rate_hz: 16_000,
            frame_duration_ms: 200,
            vad_aggressiveness: 2,
            hangover_frames: 1,
            top_k: 5,
            min_confidence: None,
            embedding_model: "hashing-bow".into(),
            embedding_dim: 256,
            stt_model_path: None,
            actuator: "keypress".into(),
            log_retention_days: None,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, String> {
        let defaults = Settings::default();
        let builder = config::Config::builder()
            .set_default("transcript_path", defaults.transcript_path)
            .map_err(|e| e.to_string())?
            .set_default("chunks_path", defaults.chunks_path)
            .map_err(|e| e.to_string())?
            .set_default("sample_rate_hz", defaults.sample_rate_hz as i64)
            .map_err(|e| e.to_string())?
            .set_default("frame_duration_ms", defaults.frame_duration_ms as i64)
            .map_err(|e| e.to_string())?
            .set_default("vad_aggressiveness", defaults.vad_aggressiveness as i64)
            .map_err(|e| e.to_string())?
            .set_default("hangover_frames", defaults.hangover_frames as i64)
            .map_err(|e| e.to_string())?
            .set_default("top_k", defaults.top_k as i64)
            .map_err(|e| e.to_string())?
            .set_default("embedding_model", defaults.embedding_model)
            .map_err(|e| e.to_string())?
            .set_default("embedding_dim", defaults.embedding_dim as i64)
            .map_err(|e| e.to_string())?
            .set_default("actuator", defaults.actuator)
            .map_err(|e| e.to_string())?
            .add_source(config::File::with_name("autopilot").required(false))
            .add_source(
                config::Environment::with_prefix("AUTOPILOT")
                    .separator("__")
                    .try_parsing(true),
            );

        let raw = builder.build().map_err(|e| e.to_string())?;
        let mut settings: Settings = raw.try_deserialize().map_err(|e| e.to_string())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Clamps out-of-range values to safe defaults (logging a warning) and
    /// rejects configuration that can never be made safe.
    pub fn validate(&mut self) -> Result<(), String> {
        if self.transcript_path.trim().is_empty() {
            return Err("transcript_path: must not be empty".into());
        }
        if self.chunks_path.trim().is_empty() {
            return Err("chunks_path: must not be empty".into());
        }
        if self.top_k == 0 {
            return Err("top_k: must be at least 1".into());
        }

        if self.vad_aggressiveness > 3 {
            tracing::warn!(
                value = self.vad_aggressiveness,
                "vad_aggressiveness out of range, clamping to 3"
            );
            self.vad_aggressiveness = 3;
        }

        if let Some(conf) = self.min_confidence {
            if !(0.0..=1.0).contains(&conf) {
                tracing::warn!(value = conf, "min_confidence out of range, clamping");
                self.min_confidence = Some(conf.clamp(0.0, 1.0));
            }
        }

        if self.actuator != "noop" && self.actuator != "keypress" {
            tracing::warn!(value = %self.actuator, "unknown actuator, defaulting to keypress");
            self.actuator = "keypress".into();
        }

        if self.embedding_dim == 0 {
            return Err("embedding_dim: must be at least 1".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    struct EnvVarGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let previous = env::var(key).ok();
            env::set_var(key, value);
            Self { key, previous }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match self.previous.take() {
                Some(prev) => env::set_var(self.key, prev),
                None => env::remove_var(self.key),
            }
        }
    }

    #[test]
    #[serial]
    fn default_settings_load_without_a_file() {
        let settings = Settings::new().unwrap();
        assert_eq!(settings.sample_rate_hz, 16_000);
        assert_eq!(settings.top_k, 5);
        assert_eq!(settings.actuator, "keypress");
    }

    #[test]
    #[serial]
    fn env_override_is_applied() {
        let _guard = EnvVarGuard::set("AUTOPILOT_TOP_K", "3");
        let settings = Settings::new().unwrap();
        assert_eq!(settings.top_k, 3);
    }

    #[test]
    fn validate_rejects_empty_transcript_path() {
        let mut settings = Settings {
            transcript_path: "".into(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_clamps_out_of_range_aggressiveness() {
        let mut settings = Settings {
            vad_aggressiveness: 9,
            ..Settings::default()
        };
        settings.validate().unwrap();
        assert_eq!(settings.vad_aggressiveness, 3);
    }

    #[test]
    fn validate_falls_back_to_keypress_for_unknown_actuator() {
        let mut settings = Settings {
            actuator: "bogus".into(),
            ..Settings::default()
        };
        settings.validate().unwrap();
        assert_eq!(settings.actuator, "keypress");
    }
}
