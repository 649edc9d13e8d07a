//! The transcription backend seam.
//!
//! The speech model runtime lives outside this crate.  [`TranscriptionBackend`]
//! is the capability the queue drives: check model residency, load a model,
//! and run inference producing timed [`Cue`]s while reporting progress over a
//! channel.  Both long-running calls take a [`CancellationToken`] and must
//! observe it at their suspension points — cancellation is cooperative,
//! never a forced kill, and must stop consuming CPU/IO within a bounded
//! time.
//!
//! [`MockBackend`] (`#[cfg(test)]`) is a fully scriptable double used to
//! test the queue without any model.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cue::Cue;
use crate::store::FileId;

// ---------------------------------------------------------------------------
// BackendError
// ---------------------------------------------------------------------------

/// All errors that can arise from a transcription backend.
///
/// Messages must be human-readable and non-empty — they surface directly
/// in the queue view's failed-task rows.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The model could not be loaded (missing file, failed first-time
    /// download, incompatible format).  A cancelled load must not leave a
    /// partial model behind that blocks subsequent loads.
    #[error("model load failed: {0}")]
    ModelLoad(String),

    /// Inference itself failed.
    #[error("transcription failed: {0}")]
    Inference(String),

    /// The operation observed its cancellation token and stopped.  Not an
    /// error from the user's point of view.
    #[error("transcription cancelled")]
    Cancelled,
}

// ---------------------------------------------------------------------------
// TranscriptionBackend trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface to the speech-to-text runtime.
///
/// # Contract
///
/// - `load_model` and `transcribe` check `cancel` at every suspension
///   point and return [`BackendError::Cancelled`] promptly once it fires.
/// - `transcribe` sends monotonically non-decreasing progress values in
///   `0.0..=1.0` on `progress`; dropped receivers must not fail the run
///   (use `try_send`/ignore errors).
/// - The backend resolves `file` to its audio itself — bookmark/security
///   scoping belongs to the host, not this crate.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Whether `model` is already loaded and ready for inference.
    fn is_model_resident(&self, model: &str) -> bool;

    /// Load `model`, downloading it first if necessary.
    async fn load_model(&self, model: &str, cancel: &CancellationToken)
        -> Result<(), BackendError>;

    /// Transcribe the audio of `file` into timed cues.
    async fn transcribe(
        &self,
        file: &FileId,
        model: &str,
        language: Option<&str>,
        progress: mpsc::Sender<f32>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Cue>, BackendError>;
}

// Compile-time assertion: Box<dyn TranscriptionBackend> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn TranscriptionBackend>) {}
};

// ---------------------------------------------------------------------------
// MockBackend  (test-only)
// ---------------------------------------------------------------------------

/// Scripted backend behaviour for one `transcribe` call.
#[cfg(test)]
#[derive(Clone)]
pub enum MockScript {
    /// Emit `progress_steps` evenly spaced progress events, then succeed
    /// with `cues`.
    Succeed {
        cues: Vec<Cue>,
        progress_steps: usize,
    },
    /// Fail inference with the given message.
    FailInference(String),
    /// Park until the cancellation token fires, then report `Cancelled`.
    /// Models a stuck inference that stays cancellable.
    HangUntilCancelled,
}

/// A test double in the spirit of a scripted mock: model residency,
/// load behaviour and transcription behaviour are all configurable, and
/// call counts are recorded.
#[cfg(test)]
pub struct MockBackend {
    model_resident: std::sync::atomic::AtomicBool,
    /// `Some(msg)` makes `load_model` fail with that message.
    fail_load: std::sync::Mutex<Option<String>>,
    script: std::sync::Mutex<MockScript>,
    load_calls: std::sync::atomic::AtomicUsize,
    transcribe_calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockBackend {
    /// A backend whose model is not resident and whose transcription
    /// succeeds with `cues`.
    pub fn succeeding(cues: Vec<Cue>) -> Self {
        Self::with_script(MockScript::Succeed {
            cues,
            progress_steps: 4,
        })
    }

    pub fn with_script(script: MockScript) -> Self {
        Self {
            model_resident: std::sync::atomic::AtomicBool::new(false),
            fail_load: std::sync::Mutex::new(None),
            script: std::sync::Mutex::new(script),
            load_calls: std::sync::atomic::AtomicUsize::new(0),
            transcribe_calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn set_model_resident(&self, resident: bool) {
        self.model_resident
            .store(resident, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn fail_loads_with(&self, message: impl Into<String>) {
        *self.fail_load.lock().unwrap() = Some(message.into());
    }

    pub fn set_script(&self, script: MockScript) {
        *self.script.lock().unwrap() = script;
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn transcribe_calls(&self) -> usize {
        self.transcribe_calls
            .load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl TranscriptionBackend for MockBackend {
    fn is_model_resident(&self, _model: &str) -> bool {
        self.model_resident.load(std::sync::atomic::Ordering::SeqCst)
    }

    async fn load_model(
        &self,
        _model: &str,
        cancel: &CancellationToken,
    ) -> Result<(), BackendError> {
        self.load_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if cancel.is_cancelled() {
            return Err(BackendError::Cancelled);
        }
        if let Some(msg) = self.fail_load.lock().unwrap().clone() {
            return Err(BackendError::ModelLoad(msg));
        }
        self.set_model_resident(true);
        Ok(())
    }

    async fn transcribe(
        &self,
        _file: &FileId,
        _model: &str,
        _language: Option<&str>,
        progress: mpsc::Sender<f32>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Cue>, BackendError> {
        self.transcribe_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let script = self.script.lock().unwrap().clone();
        match script {
            MockScript::Succeed {
                cues,
                progress_steps,
            } => {
                for step in 1..=progress_steps {
                    if cancel.is_cancelled() {
                        return Err(BackendError::Cancelled);
                    }
                    let _ = progress.try_send(step as f32 / progress_steps as f32);
                    // Yield so the queue's select loop can drain progress
                    // events between steps.
                    tokio::task::yield_now().await;
                }
                Ok(cues)
            }
            MockScript::FailInference(msg) => Err(BackendError::Inference(msg)),
            MockScript::HangUntilCancelled => {
                cancel.cancelled().await;
                Err(BackendError::Cancelled)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::CueId;

    fn cues() -> Vec<Cue> {
        vec![Cue::new(CueId::new(1), 0.0, 1.0, "hi")]
    }

    #[test]
    fn box_dyn_backend_compiles() {
        // If this test compiles, the trait is object-safe.
        let backend: Box<dyn TranscriptionBackend> = Box::new(MockBackend::succeeding(cues()));
        assert!(!backend.is_model_resident("m"));
    }

    #[tokio::test]
    async fn succeeding_script_emits_progress_then_cues() {
        let backend = MockBackend::succeeding(cues());
        let (tx, mut rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        let result = backend
            .transcribe(&FileId::from("f"), "m", None, tx, &cancel)
            .await
            .unwrap();
        assert_eq!(result.len(), 1);

        let mut events = Vec::new();
        while let Ok(p) = rx.try_recv() {
            events.push(p);
        }
        assert_eq!(events, vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[tokio::test]
    async fn load_makes_model_resident() {
        let backend = MockBackend::succeeding(cues());
        assert!(!backend.is_model_resident("m"));

        backend
            .load_model("m", &CancellationToken::new())
            .await
            .unwrap();
        assert!(backend.is_model_resident("m"));
        assert_eq!(backend.load_calls(), 1);
    }

    #[tokio::test]
    async fn failing_load_reports_model_load_error() {
        let backend = MockBackend::succeeding(cues());
        backend.fail_loads_with("model download failed");

        let err = backend
            .load_model("m", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::ModelLoad(_)));
        assert!(err.to_string().contains("model download failed"));
    }

    #[tokio::test]
    async fn hanging_script_returns_once_cancelled() {
        let backend = std::sync::Arc::new(MockBackend::with_script(MockScript::HangUntilCancelled));
        let cancel = CancellationToken::new();
        let (tx, _rx) = mpsc::channel(16);

        let backend2 = std::sync::Arc::clone(&backend);
        let cancel2 = cancel.clone();
        let handle = tokio::spawn(async move {
            backend2
                .transcribe(&FileId::from("f"), "m", None, tx, &cancel2)
                .await
        });

        cancel.cancel();
        let result = handle.await.unwrap();
        assert!(matches!(result, Err(BackendError::Cancelled)));
    }
}
