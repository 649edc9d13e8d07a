//! Transcription task model and lifecycle state machine.
//!
//! A [`TranscriptionTask`] is one unit of work: one media file to
//! transcribe.  The task itself is a pure state holder — all transitions
//! are performed by the [`TranscriptionQueue`](crate::transcribe::TranscriptionQueue),
//! which is the sole writer of [`TaskState`].
//!
//! The state machine:
//!
//! ```text
//! Queued ──model not resident──▶ LoadingModel ──ready──▶ Transcribing
//!        ──model resident──────────────────────────────▶ Transcribing
//!
//! Transcribing ──backend success + saved──▶ Completed
//! LoadingModel / Transcribing ──error────▶ Failed(message)
//! any non-terminal ──user cancel─────────▶ Cancelled
//! Completed / Failed / Cancelled ──retry─▶ Queued   (cache invalidated)
//! ```

use std::time::SystemTime;

use crate::store::FileId;

// ---------------------------------------------------------------------------
// TaskId
// ---------------------------------------------------------------------------

/// Opaque identifier of a queued transcription task.
///
/// Assigned monotonically by the queue; stable for the task's lifetime
/// (including across retries).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TaskState
// ---------------------------------------------------------------------------

/// Lifecycle states of a transcription task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskState {
    /// Waiting in the queue for the active slot.
    Queued,

    /// The backend is loading (possibly downloading) the model.
    LoadingModel {
        /// Model identifier being loaded.
        model: String,
    },

    /// Inference is running; `progress` is in `0.0..=1.0`.
    Transcribing { progress: f32 },

    /// The result was produced **and** durably stored.
    Completed,

    /// The backend, model load, or persistence failed.  The message is
    /// human-readable and non-empty.
    Failed { message: String },

    /// The user cancelled the task.  Distinct from `Failed`: the UI must
    /// not render this as an error.
    Cancelled,
}

impl TaskState {
    /// Returns `true` for `Completed`, `Failed` and `Cancelled` — states a
    /// task only leaves via an explicit retry.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed { .. } | TaskState::Cancelled
        )
    }

    /// Returns `true` while the task occupies the queue's active slot.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TaskState::LoadingModel { .. } | TaskState::Transcribing { .. }
        )
    }

    /// A short human-readable label suitable for a queue/progress view.
    pub fn label(&self) -> &'static str {
        match self {
            TaskState::Queued => "Queued",
            TaskState::LoadingModel { .. } => "Loading model",
            TaskState::Transcribing { .. } => "Transcribing",
            TaskState::Completed => "Done",
            TaskState::Failed { .. } => "Failed",
            TaskState::Cancelled => "Cancelled",
        }
    }
}

// ---------------------------------------------------------------------------
// TranscriptionTask
// ---------------------------------------------------------------------------

/// One transcription job for one media file.
#[derive(Debug, Clone)]
pub struct TranscriptionTask {
    /// Queue-assigned identifier.
    pub id: TaskId,
    /// The media file this task targets.
    pub file_id: FileId,
    /// Name shown in the queue view (usually the media file's title).
    pub display_name: String,
    /// Current lifecycle state.  Written only by the queue.
    pub state: TaskState,
    /// When the task was enqueued.
    pub created_at: SystemTime,
}

impl TranscriptionTask {
    pub(crate) fn new(id: TaskId, file_id: FileId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            file_id,
            display_name: display_name.into(),
            state: TaskState::Queued,
            created_at: SystemTime::now(),
        }
    }
}

/// Equality tuned for UI diffing: two tasks are equal when their ids match,
/// **except** that two `Transcribing` tasks also compare `progress` and
/// `display_name`, so list diffing re-renders a row on every progress
/// update but not on incidental metadata the row does not show.
impl PartialEq for TranscriptionTask {
    fn eq(&self, other: &Self) -> bool {
        match (&self.state, &other.state) {
            (
                TaskState::Transcribing { progress: a },
                TaskState::Transcribing { progress: b },
            ) => self.id == other.id && a == b && self.display_name == other.display_name,
            _ => self.id == other.id,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
