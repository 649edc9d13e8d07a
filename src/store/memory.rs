//! In-memory transcript store.
//!
//! Used as the default store in tests and for hosts that keep transcripts
//! in their own database and only need this crate's queue semantics.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::cue::Cue;

use super::{unix_now, CachedTranscript, FileId, StoreError, TranscriptStore};

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// `HashMap`-backed [`TranscriptStore`].
///
/// Saving a result replaces the whole document for that file id, so the
/// atomicity contract holds trivially.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<FileId, CachedTranscript>>,
    /// When set, the next `save_result` fails once — exercises the
    /// "inference succeeded but persistence failed" task path.
    #[cfg(test)]
    fail_next_save: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files with a cached transcript.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Arrange for the next `save_result` call to fail.
    #[cfg(test)]
    pub fn fail_next_save(&self) {
        self.fail_next_save
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl TranscriptStore for MemoryStore {
    async fn save_result(
        &self,
        file: &FileId,
        cues: &[Cue],
        model: &str,
        language: Option<&str>,
    ) -> Result<(), StoreError> {
        #[cfg(test)]
        if self
            .fail_next_save
            .swap(false, std::sync::atomic::Ordering::SeqCst)
        {
            return Err(StoreError::Io("injected save failure".into()));
        }

        let doc = CachedTranscript {
            cues: cues.to_vec(),
            model: model.to_string(),
            language: language.map(str::to_string),
            saved_at_unix: unix_now(),
        };
        self.inner.lock().unwrap().insert(file.clone(), doc);
        Ok(())
    }

    async fn load_cached_cues(&self, file: &FileId) -> Result<Option<Vec<Cue>>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .get(file)
            .map(|doc| doc.cues.clone()))
    }

    async fn delete_cached(&self, file: &FileId) -> Result<(), StoreError> {
        self.inner.lock().unwrap().remove(file);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::CueId;

    fn sample_cues() -> Vec<Cue> {
        vec![
            Cue::new(CueId::new(1), 0.0, 2.0, "one"),
            Cue::new(CueId::new(2), 2.0, 4.0, "two"),
        ]
    }

    #[tokio::test]
    async fn save_then_load_returns_cues() {
        let store = MemoryStore::new();
        let file = FileId::from("ep-01");

        store
            .save_result(&file, &sample_cues(), "whisper-small", Some("fr"))
            .await
            .unwrap();

        let loaded = store.load_cached_cues(&file).await.unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].text, "one");
    }

    #[tokio::test]
    async fn load_unknown_file_is_none() {
        let store = MemoryStore::new();
        let loaded = store.load_cached_cues(&FileId::from("ghost")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn save_replaces_previous_result() {
        let store = MemoryStore::new();
        let file = FileId::from("ep-01");

        store
            .save_result(&file, &sample_cues(), "whisper-small", None)
            .await
            .unwrap();
        let retranscribed = vec![Cue::new(CueId::new(9), 0.0, 1.0, "better")];
        store
            .save_result(&file, &retranscribed, "whisper-large", None)
            .await
            .unwrap();

        let loaded = store.load_cached_cues(&file).await.unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].text, "better");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_cached_result() {
        let store = MemoryStore::new();
        let file = FileId::from("ep-01");

        store
            .save_result(&file, &sample_cues(), "whisper-small", None)
            .await
            .unwrap();
        store.delete_cached(&file).await.unwrap();

        assert!(store.load_cached_cues(&file).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_of_unknown_file_is_ok() {
        let store = MemoryStore::new();
        assert!(store.delete_cached(&FileId::from("ghost")).await.is_ok());
    }

    #[tokio::test]
    async fn injected_failure_fails_exactly_once() {
        let store = MemoryStore::new();
        let file = FileId::from("ep-01");
        store.fail_next_save();

        let err = store
            .save_result(&file, &sample_cues(), "m", None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));

        // Next save succeeds again.
        store
            .save_result(&file, &sample_cues(), "m", None)
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
    }
}
