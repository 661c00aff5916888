use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PilotError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Stt(#[from] SttError),

    #[error(transparent)]
    Vad(#[from] VadError),

    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Actuator(#[from] ActuatorError),

    #[error("Component failed health check: {component}")]
    HealthCheckFailed { component: String },

    #[error("Shutdown requested")]
    ShutdownRequested,

    #[error("Fatal error, cannot recover: {0}")]
    Fatal(String),

    #[error("Transient error, will retry: {0}")]
    Transient(String),
}

impl From<tokio::task::JoinError> for PilotError {
    fn from(err: tokio::task::JoinError) -> Self {
        PilotError::Transient(format!("Task join failed: {}", err))
    }
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Device not found: {name:?}")]
    DeviceNotFound { name: Option<String> },

    #[error("Device disconnected")]
    DeviceDisconnected,

    #[error("Format not supported: {format}")]
    FormatNotSupported { format: String },

    #[error("Queue full, dropped frame (count now {count})")]
    QueueFull { count: u64 },

    #[error("CPAL error: {0}")]
    Cpal(#[from] cpal::StreamError),

    #[error("Build stream error: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Play stream error: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("Supported stream configs error: {0}")]
    SupportedStreamConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("Fatal error, cannot recover: {0}")]
    Fatal(String),
}

#[derive(Debug, Error)]
pub enum SttError {
    #[error("Plugin not available: {plugin}: {reason}")]
    NotAvailable { plugin: String, reason: String },

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("Engine init failed: {0}")]
    InitFailed(String),

    #[error("Model not found: {path}")]
    ModelNotFound { path: String },
}

#[derive(Debug, Error)]
pub enum VadError {
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Invalid frame size: expected {expected}, got {actual}")]
    InvalidFrameSize { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration parsing error: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invariant violated in {field}: {reason}")]
    Invariant { field: String, reason: String },
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Embedding failed: {0}")]
    EmbeddingFailed(String),
}

#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("Actuator backend unavailable: {0}")]
    Unavailable(String),

    #[error("Advance failed: {0}")]
    AdvanceFailed(String),
}

#[derive(Debug, Clone)]
pub enum RecoveryStrategy {
    Retry { max_attempts: u32, delay: Duration },
    Fallback { to: String },
    Restart,
    Ignore,
    Fatal,
}

impl PilotError {
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            PilotError::Audio(AudioError::DeviceDisconnected) => RecoveryStrategy::Retry {
                max_attempts: 5,
                delay: Duration::from_secs(2),
            },
            PilotError::Audio(AudioError::DeviceNotFound { .. }) => RecoveryStrategy::Fallback {
                to: "default".into(),
            },
            PilotError::Audio(AudioError::QueueFull { .. }) => RecoveryStrategy::Ignore,
            PilotError::Match(MatchError::EmbeddingFailed(_)) => RecoveryStrategy::Ignore,
            PilotError::Fatal(_) | PilotError::ShutdownRequested => RecoveryStrategy::Fatal,
            _ => RecoveryStrategy::Restart,
        }
    }
}
