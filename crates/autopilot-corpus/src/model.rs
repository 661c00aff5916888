//! In-memory corpus: transcripts, chunks, and the precomputed indexes
//! listed in spec §3. Loaded once at session start, held immutably.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TranscriptId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub String);

#[derive(Debug, Clone)]
pub struct TranscriptItem {
    pub transcript_index: u32,
    pub transcript_id: TranscriptId,
    pub text: String,
    pub early_forward: bool,
}

#[derive(Debug, Clone)]
pub struct Chunk {
    pub chunk_index: u32,
    pub chunk_id: ChunkId,
    /// Distinct transcripts whose words appear in this window, in the order
    /// the words appear. 1 or 2 elements.
    pub source_transcripts: Vec<TranscriptId>,
    pub text: String,
}

impl Chunk {
    pub fn first_source(&self) -> &TranscriptId {
        &self.source_transcripts[0]
    }

    pub fn tokens(&self) -> Vec<&str> {
        self.text.split_whitespace().collect()
    }
}

/// Immutable corpus plus the precomputed lookup indexes of spec §3.
pub struct Corpus {
    pub transcripts: Vec<TranscriptItem>,
    pub chunks: Vec<Chunk>,
    by_chunk_id: HashMap<ChunkId, usize>,
    by_transcript_id: HashMap<TranscriptId, usize>,
}

impl Corpus {
    /// Builds indexes over already-validated transcripts/chunks. Prefer
    /// [`crate::loader::load_corpus`] unless you've validated the §3
    /// invariants yourself (e.g. in tests).
    pub fn new(transcripts: Vec<TranscriptItem>, chunks: Vec<Chunk>) -> Self {
        let by_chunk_id = chunks
            .iter()
            .enumerate()
            .map(|(i, c)| (c.chunk_id.clone(), i))
            .collect();
        let by_transcript_id = transcripts
            .iter()
            .enumerate()
            .map(|(i, t)| (t.transcript_id.clone(), i))
            .collect();
        Self {
            transcripts,
            chunks,
            by_chunk_id,
            by_transcript_id,
        }
    }

    pub fn chunk_by_id(&self, id: &ChunkId) -> Option<&Chunk> {
        self.by_chunk_id.get(id).map(|&i| &self.chunks[i])
    }

    pub fn chunk_by_index(&self, index: u32) -> Option<&Chunk> {
        self.chunks.get(index as usize)
    }

    pub fn transcript_by_id(&self, id: &TranscriptId) -> Option<&TranscriptItem> {
        self.by_transcript_id.get(id).map(|&i| &self.transcripts[i])
    }

    pub fn transcript_by_index(&self, index: u32) -> Option<&TranscriptItem> {
        self.transcripts.get(index as usize)
    }

    pub fn transcript_index_of(&self, id: &TranscriptId) -> Option<u32> {
        self.transcript_by_id(id).map(|t| t.transcript_index)
    }

    pub fn len_chunks(&self) -> usize {
        self.chunks.len()
    }
}
