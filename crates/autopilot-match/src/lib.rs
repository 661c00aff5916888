pub mod embedder;
pub mod matcher;
pub mod phonetic;
pub mod semantic;

pub use embedder::{Embedder, HashingEmbedder};
pub use matcher::{MatchResult, SpeechMatcher};
