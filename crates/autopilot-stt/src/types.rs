/// A recognition result from an [`crate::SttPlugin`]. Partials are
/// overwritten by the next partial or superseded by a final for the same
/// utterance; only finals are guaranteed stable.
#[derive(Debug, Clone)]
pub enum TranscriptionEvent {
    Partial { utterance_id: u64, text: String },
    Final { utterance_id: u64, text: String },
}

impl TranscriptionEvent {
    pub fn text(&self) -> &str {
        match self {
            TranscriptionEvent::Partial { text, .. } | TranscriptionEvent::Final { text, .. } => {
                text
            }
        }
    }

    pub fn utterance_id(&self) -> u64 {
        match self {
            TranscriptionEvent::Partial { utterance_id, .. }
            | TranscriptionEvent::Final { utterance_id, .. } => *utterance_id,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, TranscriptionEvent::Final { .. })
    }
}

/// A speech hypothesis as handed to the matcher: plain text plus whether it
/// is a settled final or a still-mutable partial.
#[derive(Debug, Clone)]
pub struct Hypothesis {
    pub utterance_id: u64,
    pub text: String,
    pub is_final: bool,
}

impl From<TranscriptionEvent> for Hypothesis {
    fn from(event: TranscriptionEvent) -> Self {
        Hypothesis {
            utterance_id: event.utterance_id(),
            is_final: event.is_final(),
            text: event.text().to_string(),
        }
    }
}
