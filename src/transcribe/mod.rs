//! Transcription subsystem — task model, backend seam and the queue.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                  TranscriptionQueue                         │
//! │                                                            │
//! │  enqueue ─▶ [Queued, Queued, …]     active slot (≤ 1)      │
//! │                     │                     │                │
//! │                     └──── driver loop ────┘                │
//! │                              │                             │
//! │            ┌─────────────────┴──────────────┐             │
//! │            ▼                                ▼             │
//! │  TranscriptionBackend (trait)      TranscriptStore (trait) │
//! │  load_model / transcribe           save_result             │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! One task at a time is driven through
//! `Queued → LoadingModel → Transcribing → Completed`, with `Failed` and
//! `Cancelled` as the other terminal states.  The queue is the only writer
//! of task state; the UI observes snapshots over a watch channel.

pub mod backend;
pub mod queue;
pub mod task;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use backend::{BackendError, TranscriptionBackend};
pub use queue::{QueueError, TranscriptionQueue};
pub use task::{TaskId, TaskState, TranscriptionTask};

// test-only re-export so queue tests can import MockBackend without the
// full `crate::transcribe::backend::MockBackend` path.
#[cfg(test)]
pub use backend::MockBackend;
