//! The persistence collaborator — cached transcription results.
//!
//! The real application keeps media metadata in a document store owned by
//! the host; this crate only needs the three operations below.  The store
//! is the **canonical source of displayed cues**: every producer (the
//! transcription queue, the subtitle-file importer) writes through
//! [`TranscriptStore::save_result`], and every consumer rebuilds its
//! [`CueIndex`](crate::cue::CueIndex) from
//! [`TranscriptStore::load_cached_cues`].  There is deliberately no second
//! display path.
//!
//! Two implementations ship with the crate:
//! * [`MemoryStore`] — `HashMap`-backed, used in tests and as a default.
//! * [`JsonFileStore`] — one JSON document per media file on disk.

pub mod json;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cue::Cue;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

// ---------------------------------------------------------------------------
// FileId
// ---------------------------------------------------------------------------

/// Opaque identifier of a media file in the host's library.
///
/// Assigned by the host application (typically a database key); this crate
/// only compares it and uses it as a store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// All errors that can arise from the transcript store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Reading or writing the underlying storage failed.
    #[error("store i/o failed: {0}")]
    Io(String),

    /// A cached document could not be encoded or decoded.
    #[error("cached transcript is malformed: {0}")]
    Corrupt(String),
}

// ---------------------------------------------------------------------------
// CachedTranscript
// ---------------------------------------------------------------------------

/// The document persisted per media file: the cues plus the metadata needed
/// to decide whether a cached result is still acceptable (model upgrades,
/// language changes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedTranscript {
    /// The transcribed cues, sorted by the producer.
    pub cues: Vec<Cue>,
    /// Model identifier the result was produced with.
    pub model: String,
    /// Language hint used, if any.
    pub language: Option<String>,
    /// Unix timestamp (seconds) of when the result was saved.
    pub saved_at_unix: u64,
}

// ---------------------------------------------------------------------------
// TranscriptStore trait
// ---------------------------------------------------------------------------

/// Async persistence interface for transcription results.
///
/// `save_result` must be atomic from the caller's perspective: the cues and
/// the on-file "has transcript" marker are committed together or not at
/// all.  The queue relies on this to report a task `Failed` when the result
/// cannot be durably stored — the UI must never claim success for data it
/// cannot later retrieve.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Persist `cues` (with model/language metadata) for `file`, replacing
    /// any previously cached result.
    async fn save_result(
        &self,
        file: &FileId,
        cues: &[Cue],
        model: &str,
        language: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Load the cached cues for `file`, or `None` when nothing is cached.
    async fn load_cached_cues(&self, file: &FileId) -> Result<Option<Vec<Cue>>, StoreError>;

    /// Remove any cached result for `file`.  Removing a file that has no
    /// cached result is not an error.
    async fn delete_cached(&self, file: &FileId) -> Result<(), StoreError>;
}

// Compile-time assertion: Box<dyn TranscriptStore> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn TranscriptStore>) {}
};

/// Seconds since the Unix epoch, saturating at 0 for a clock set before
/// 1970.
pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
