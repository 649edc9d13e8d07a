//! File-backed transcript store — one JSON document per media file.
//!
//! Documents live under the application data directory (see
//! [`AppPaths`](crate::config::AppPaths)) and are written via a temp file
//! in the same directory followed by a rename, so a crash mid-write never
//! leaves a half-written document where a reader could find it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::AppPaths;
use crate::cue::Cue;

use super::{unix_now, CachedTranscript, FileId, StoreError, TranscriptStore};

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

/// [`TranscriptStore`] persisting each file's transcript as
/// `<dir>/<encoded file id>.json`.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Store documents under `dir` (created lazily on first save).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store documents under the platform-appropriate transcripts dir.
    pub fn at_default_location() -> Self {
        Self::new(AppPaths::new().transcripts_dir)
    }

    fn doc_path(&self, file: &FileId) -> PathBuf {
        // File ids are host database keys and may contain path separators;
        // flatten the two characters that matter on every platform.
        let encoded: String = file
            .as_str()
            .chars()
            .map(|c| match c {
                '/' | '\\' => '_',
                other => other,
            })
            .collect();
        self.dir.join(format!("{encoded}.json"))
    }

    async fn write_atomic(&self, path: &Path, bytes: Vec<u8>) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl TranscriptStore for JsonFileStore {
    async fn save_result(
        &self,
        file: &FileId,
        cues: &[Cue],
        model: &str,
        language: Option<&str>,
    ) -> Result<(), StoreError> {
        let doc = CachedTranscript {
            cues: cues.to_vec(),
            model: model.to_string(),
            language: language.map(str::to_string),
            saved_at_unix: unix_now(),
        };
        let bytes =
            serde_json::to_vec_pretty(&doc).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let path = self.doc_path(file);
        self.write_atomic(&path, bytes).await?;
        log::debug!("store: saved transcript for {file} ({} cues)", cues.len());
        Ok(())
    }

    async fn load_cached_cues(&self, file: &FileId) -> Result<Option<Vec<Cue>>, StoreError> {
        let path = self.doc_path(file);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        let doc: CachedTranscript =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(Some(doc.cues))
    }

    async fn delete_cached(&self, file: &FileId) -> Result<(), StoreError> {
        let path = self.doc_path(file);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
