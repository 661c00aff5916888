pub mod mock;
pub mod plugin;
pub mod types;
#[cfg(feature = "vosk")]
pub mod vosk_plugin;
pub mod worker;

pub use mock::MockSttPlugin;
pub use plugin::SttPlugin;
pub use types::{Hypothesis, TranscriptionEvent};
pub use worker::RecognizerWorker;
#[cfg(feature = "vosk")]
pub use vosk_plugin::VoskSttPlugin;
