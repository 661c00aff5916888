use crate::types::TranscriptionEvent;
use async_trait::async_trait;
use autopilot_foundation::SttError;

/// Common interface for speech recognition backends. Audio arrives as
/// fixed-size 16kHz mono frames already gated by VAD; a plugin buffers what
/// it needs internally and emits partials as confidence allows, finals on
/// [`SttPlugin::finalize_utterance`].
#[async_trait]
pub trait SttPlugin: Send {
    fn id(&self) -> &'static str;

    async fn accept_frame(
        &mut self,
        samples: &[i16],
    ) -> Result<Option<TranscriptionEvent>, SttError>;

    async fn finalize_utterance(&mut self) -> Result<Option<TranscriptionEvent>, SttError>;

    fn reset(&mut self);
}
