//! Parses and validates the two immutable JSON input files (spec §6) into
//! a [`Corpus`]. Rejects anything that violates the §3/§8 invariants with a
//! field-named diagnostic rather than panicking or silently coercing.

use crate::model::{Chunk, ChunkId, Corpus, TranscriptId, TranscriptItem};
use autopilot_foundation::CorpusError;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct TranscriptRecord {
    transcript_index: u32,
    transcript_id: String,
    transcript: String,
    #[serde(default)]
    early_forward: bool,
}

#[derive(Debug, Deserialize)]
struct ChunkRecord {
    chunk_index: u32,
    chunk_id: String,
    source_transcripts: Vec<String>,
    chunk: String,
}

pub fn load_corpus(
    transcript_path: impl AsRef<Path>,
    chunk_path: impl AsRef<Path>,
) -> Result<Corpus, CorpusError> {
    let transcript_records: Vec<TranscriptRecord> = read_json(transcript_path.as_ref())?;
    let chunk_records: Vec<ChunkRecord> = read_json(chunk_path.as_ref())?;
    build_corpus(transcript_records, chunk_records)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, CorpusError> {
    let data = std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| CorpusError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn build_corpus(
    transcript_records: Vec<TranscriptRecord>,
    chunk_records: Vec<ChunkRecord>,
) -> Result<Corpus, CorpusError> {
    let transcripts = validate_transcripts(transcript_records)?;
    let known_ids: std::collections::HashSet<&str> = transcripts
        .iter()
        .map(|t| t.transcript_id.0.as_str())
        .collect();
    let chunks = validate_chunks(chunk_records, &known_ids)?;
    Ok(Corpus::new(transcripts, chunks))
}

fn invariant(field: &str, reason: impl Into<String>) -> CorpusError {
    CorpusError::Invariant {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn validate_transcripts(
    records: Vec<TranscriptRecord>,
) -> Result<Vec<TranscriptItem>, CorpusError> {
    if records.is_empty() {
        return Err(invariant("transcript_index", "corpus has no transcripts"));
    }

    let mut seen_ids = std::collections::HashSet::new();
    let mut items = Vec::with_capacity(records.len());

    for (expected_index, rec) in records.into_iter().enumerate() {
        if rec.transcript_index as usize != expected_index {
            return Err(invariant(
                "transcript_index",
                format!(
                    "expected dense ascending index {}, got {}",
                    expected_index, rec.transcript_index
                ),
            ));
        }
        if !seen_ids.insert(rec.transcript_id.clone()) {
            return Err(invariant(
                "transcript_id",
                format!("duplicate transcript_id {:?}", rec.transcript_id),
            ));
        }

        items.push(TranscriptItem {
            transcript_index: rec.transcript_index,
            transcript_id: TranscriptId(rec.transcript_id),
            text: rec.transcript,
            early_forward: rec.early_forward,
        });
    }

    Ok(items)
}

fn validate_chunks(
    records: Vec<ChunkRecord>,
    known_transcript_ids: &std::collections::HashSet<&str>,
) -> Result<Vec<Chunk>, CorpusError> {
    let mut seen_ids = std::collections::HashSet::new();
    let mut chunks = Vec::with_capacity(records.len());

    for (expected_index, rec) in records.into_iter().enumerate() {
        if rec.chunk_index as usize != expected_index {
            return Err(invariant(
                "chunk_index",
                format!(
                    "expected dense ascending index {}, got {}",
                    expected_index, rec.chunk_index
                ),
            ));
        }
        if !seen_ids.insert(rec.chunk_id.clone()) {
            return Err(invariant(
                "chunk_id",
                format!("duplicate chunk_id {:?}", rec.chunk_id),
            ));
        }
        if rec.source_transcripts.is_empty() || rec.source_transcripts.len() > 2 {
            return Err(invariant(
                "source_transcripts",
                format!(
                    "chunk {} has {} source transcripts, expected 1 or 2",
                    rec.chunk_id,
                    rec.source_transcripts.len()
                ),
            ));
        }
        for id in &rec.source_transcripts {
            if !known_transcript_ids.contains(id.as_str()) {
                return Err(invariant(
                    "source_transcripts",
                    format!("chunk {} references unknown transcript {}", rec.chunk_id, id),
                ));
            }
        }
        let token_count = rec.chunk.split_whitespace().count();
        if token_count != 7 {
            return Err(invariant(
                "chunk",
                format!(
                    "chunk {} has {} tokens, expected 7",
                    rec.chunk_id, token_count
                ),
            ));
        }

        chunks.push(Chunk {
            chunk_index: rec.chunk_index,
            chunk_id: ChunkId(rec.chunk_id),
            source_transcripts: rec
                .source_transcripts
                .into_iter()
                .map(TranscriptId)
                .collect(),
            text: rec.chunk,
        });
    }

    for pair in chunks.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let prev_tail: Vec<&str> = prev.tokens().into_iter().skip(1).collect();
        let next_head: Vec<&str> = next.tokens().into_iter().take(6).collect();
        if prev_tail != next_head {
            return Err(invariant(
                "chunk",
                format!(
                    "consecutive chunks {} and {} do not overlap by 6 tokens",
                    prev.chunk_id.0, next.chunk_id.0
                ),
            ));
        }
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    const TRANSCRIPTS: &str = r#"[
        {"transcript_index": 0, "transcript_id": "t0", "transcript": "the ability to say no", "early_forward": true},
        {"transcript_index": 1, "transcript_id": "t1", "transcript": "have you ever struggled when you tried to say no to someone", "early_forward": true}
    ]"#;

    const CHUNKS: &str = r#"[
        {"chunk_index": 0, "chunk_id": "c0", "source_transcripts": ["t0"], "chunk": "the ability to say no have you"},
        {"chunk_index": 1, "chunk_id": "c1", "source_transcripts": ["t0", "t1"], "chunk": "ability to say no have you ever"}
    ]"#;

    #[test]
    fn loads_a_well_formed_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let tp = write_fixture(&dir, "t.json", TRANSCRIPTS);
        let cp = write_fixture(&dir, "c.json", CHUNKS);

        let corpus = load_corpus(&tp, &cp).unwrap();
        assert_eq!(corpus.transcripts.len(), 2);
        assert_eq!(corpus.len_chunks(), 2);
        assert_eq!(
            corpus.chunk_by_index(1).unwrap().source_transcripts.len(),
            2
        );
    }

    #[test]
    fn rejects_non_dense_transcript_index() {
        let bad = r#"[{"transcript_index": 1, "transcript_id": "t0", "transcript": "x", "early_forward": false}]"#;
        let records: Vec<TranscriptRecord> = serde_json::from_str(bad).unwrap();
        let err = validate_transcripts(records).unwrap_err();
        assert!(matches!(err, CorpusError::Invariant { field, .. } if field == "transcript_index"));
    }

    #[test]
    fn rejects_chunk_referencing_unknown_transcript() {
        let known: std::collections::HashSet<&str> = ["t0"].into_iter().collect();
        let bad = r#"[{"chunk_index": 0, "chunk_id": "c0", "source_transcripts": ["tX"], "chunk": "a b c d e f g"}]"#;
        let records: Vec<ChunkRecord> = serde_json::from_str(bad).unwrap();
        let err = validate_chunks(records, &known).unwrap_err();
        assert!(matches!(err, CorpusError::Invariant { field, .. } if field == "source_transcripts"));
    }

    #[test]
    fn rejects_chunk_with_wrong_token_count() {
        let known: std::collections::HashSet<&str> = ["t0"].into_iter().collect();
        let bad = r#"[{"chunk_index": 0, "chunk_id": "c0", "source_transcripts": ["t0"], "chunk": "too few tokens"}]"#;
        let records: Vec<ChunkRecord> = serde_json::from_str(bad).unwrap();
        let err = validate_chunks(records, &known).unwrap_err();
        assert!(matches!(err, CorpusError::Invariant { field, .. } if field == "chunk"));
    }

    #[test]
    fn rejects_non_overlapping_consecutive_chunks() {
        let known: std::collections::HashSet<&str> = ["t0"].into_iter().collect();
        let bad = r#"[
            {"chunk_index": 0, "chunk_id": "c0", "source_transcripts": ["t0"], "chunk": "a b c d e f g"},
            {"chunk_index": 1, "chunk_id": "c1", "source_transcripts": ["t0"], "chunk": "z z z z z z z"}
        ]"#;
        let records: Vec<ChunkRecord> = serde_json::from_str(bad).unwrap();
        let err = validate_chunks(records, &known).unwrap_err();
        assert!(matches!(err, CorpusError::Invariant { field, .. } if field == "chunk"));
    }
}
