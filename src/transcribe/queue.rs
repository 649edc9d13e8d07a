//! Transcription queue manager — serialized, cancellable job execution.
//!
//! [`TranscriptionQueue`] owns the ordered task collection and is the only
//! writer of [`TaskState`].  Its driver loop (spawned via
//! [`run`](TranscriptionQueue::run)) pops the earliest queued task whenever
//! the single active slot is empty, drives the backend through model load
//! and inference, and persists the result through the store.
//!
//! # Task flow
//!
//! ```text
//! enqueue(file)
//!   └─▶ Queued ──driver claims slot──▶ LoadingModel (model not resident)
//!                                        └─▶ Transcribing(progress)
//!                                              ├─ Ok + saved  → Completed
//!                                              ├─ Ok + save ✗ → Failed
//!                                              ├─ backend ✗   → Failed
//!                                              └─ token fired → Cancelled
//! ```
//!
//! The active slot is the only mutable state shared across concurrent
//! callers; it is checked-and-set under a single mutex guard, so no second
//! task can ever start while one is active.  Cancellation is cooperative:
//! the task's [`CancellationToken`] is handed to the backend and raced in
//! a `select!`, so even a stuck backend stays cancellable sub-second.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::{mpsc, watch, Notify};
use tokio_util::sync::CancellationToken;

use crate::config::TranscriptionConfig;
use crate::store::{FileId, StoreError, TranscriptStore};

use super::backend::{BackendError, TranscriptionBackend};
use super::task::{TaskId, TaskState, TranscriptionTask};

// ---------------------------------------------------------------------------
// QueueError
// ---------------------------------------------------------------------------

/// Errors returned by queue operations.
///
/// Backend and persistence failures during execution never surface here —
/// they are translated into [`TaskState::Failed`] at the driver boundary.
#[derive(Debug, Error)]
pub enum QueueError {
    /// No task with the given id exists in the queue.
    #[error("unknown task {0}")]
    UnknownTask(TaskId),

    /// Retry requires the task to be in a terminal state.
    #[error("{0} is not in a terminal state")]
    NotTerminal(TaskId),

    /// Invalidating the cached result failed; the retry was not started.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// TranscriptionQueue
// ---------------------------------------------------------------------------

struct ActiveSlot {
    id: TaskId,
    cancel: CancellationToken,
}

struct QueueInner {
    /// Insertion order doubles as FIFO order for `Queued` tasks.
    tasks: Vec<TranscriptionTask>,
    /// The single currently-executing task.  `claim_next` checks-and-sets
    /// this under one guard; `finish` clears it.
    active: Option<ActiveSlot>,
    next_id: u64,
}

/// Handle to the transcription queue.
///
/// Cheap to clone (`Arc` internals); construct once at startup and pass by
/// handle to every consumer — there is deliberately no global instance.
/// Spawn the driver with [`run`](Self::run):
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use lingoplay::config::TranscriptionConfig;
/// # use lingoplay::store::{MemoryStore, TranscriptStore};
/// # use lingoplay::transcribe::{TranscriptionBackend, TranscriptionQueue};
/// # fn make_backend() -> Arc<dyn TranscriptionBackend> { unimplemented!() }
/// # async fn example() {
/// let store: Arc<dyn TranscriptStore> = Arc::new(MemoryStore::new());
/// let queue = TranscriptionQueue::new(make_backend(), store, TranscriptionConfig::default());
///
/// let shutdown = tokio_util::sync::CancellationToken::new();
/// tokio::spawn(queue.clone().run(shutdown.clone()));
///
/// let task_id = queue.enqueue("file-1".into(), "Episode 1");
/// # let _ = task_id;
/// # }
/// ```
#[derive(Clone)]
pub struct TranscriptionQueue {
    inner: Arc<Mutex<QueueInner>>,
    backend: Arc<dyn TranscriptionBackend>,
    store: Arc<dyn TranscriptStore>,
    config: TranscriptionConfig,
    /// Wakes the driver when a task becomes runnable.
    wake: Arc<Notify>,
    snapshot_tx: watch::Sender<Vec<TranscriptionTask>>,
}

impl TranscriptionQueue {
    /// Create a new queue over the given backend and store.
    pub fn new(
        backend: Arc<dyn TranscriptionBackend>,
        store: Arc<dyn TranscriptStore>,
        config: TranscriptionConfig,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Mutex::new(QueueInner {
                tasks: Vec::new(),
                active: None,
                next_id: 1,
            })),
            backend,
            store,
            config,
            wake: Arc::new(Notify::new()),
            snapshot_tx,
        }
    }

    // -----------------------------------------------------------------------
    // Queue operations
    // -----------------------------------------------------------------------

    /// Enqueue `file_id` for transcription.
    ///
    /// Idempotent: when a non-terminal task already targets `file_id`, its
    /// id is returned and no duplicate is created.  A terminal task for the
    /// same file does not block a fresh enqueue (it stays in the list for
    /// inspection until removed).
    pub fn enqueue(&self, file_id: FileId, display_name: impl Into<String>) -> TaskId {
        let id = {
            let mut inner = self.inner.lock().unwrap();

            if let Some(existing) = inner
                .tasks
                .iter()
                .find(|t| t.file_id == file_id && !t.state.is_terminal())
            {
                log::debug!("queue: {file_id} already queued as {}", existing.id);
                return existing.id;
            }

            let id = TaskId::new(inner.next_id);
            inner.next_id += 1;
            inner
                .tasks
                .push(TranscriptionTask::new(id, file_id.clone(), display_name));
            id
        };

        log::info!("queue: enqueued {id} for {file_id}");
        self.publish();
        self.wake.notify_one();
        id
    }

    /// Cancel the task, transitioning it to [`TaskState::Cancelled`].
    ///
    /// If the task is active, its token is fired and the backend unwinds
    /// cooperatively; the active slot clears as the driver finishes, so the
    /// next queued task starts.  Cancelling an already-terminal task is a
    /// no-op.
    pub fn cancel_task(&self, id: TaskId) -> Result<(), QueueError> {
        {
            let mut inner = self.inner.lock().unwrap();

            let task = inner
                .tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(QueueError::UnknownTask(id))?;

            if task.state.is_terminal() {
                return Ok(());
            }
            task.state = TaskState::Cancelled;

            if let Some(slot) = inner.active.as_ref().filter(|s| s.id == id) {
                slot.cancel.cancel();
            }
        }

        log::info!("queue: cancelled {id}");
        self.publish();
        Ok(())
    }

    /// Delete the task from the collection entirely.
    ///
    /// An active task is cancelled first (cancel-then-remove); its slot
    /// clears once the driver unwinds.
    pub fn remove_task(&self, id: TaskId) -> Result<(), QueueError> {
        {
            let mut inner = self.inner.lock().unwrap();

            let idx = inner
                .tasks
                .iter()
                .position(|t| t.id == id)
                .ok_or(QueueError::UnknownTask(id))?;

            if let Some(slot) = inner.active.as_ref().filter(|s| s.id == id) {
                slot.cancel.cancel();
            }
            inner.tasks.remove(idx);
        }

        log::info!("queue: removed {id}");
        self.publish();
        Ok(())
    }

    /// Reset a terminal task to `Queued` and invalidate the file's cached
    /// result.
    ///
    /// The cache is deleted **before** the task re-enters the queue so a
    /// re-transcription can never race a stale cached result.  When the
    /// deletion fails the retry is not started and the task keeps its
    /// terminal state.
    pub async fn retry(&self, id: TaskId) -> Result<(), QueueError> {
        let file_id = {
            let inner = self.inner.lock().unwrap();
            let task = inner
                .tasks
                .iter()
                .find(|t| t.id == id)
                .ok_or(QueueError::UnknownTask(id))?;
            if !task.state.is_terminal() {
                return Err(QueueError::NotTerminal(id));
            }
            task.file_id.clone()
        };

        self.store.delete_cached(&file_id).await?;

        {
            let mut inner = self.inner.lock().unwrap();
            // The task may have been removed while we awaited the store.
            let task = inner
                .tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(QueueError::UnknownTask(id))?;
            task.state = TaskState::Queued;
        }

        log::info!("queue: retrying {id} ({file_id})");
        self.publish();
        self.wake.notify_one();
        Ok(())
    }

    /// The task currently associated with `file_id`, preferring a live task
    /// over retained terminal ones.
    pub fn task_for_file(&self, file_id: &FileId) -> Option<TranscriptionTask> {
        let inner = self.inner.lock().unwrap();
        inner
            .tasks
            .iter()
            .find(|t| t.file_id == *file_id && !t.state.is_terminal())
            .or_else(|| inner.tasks.iter().rev().find(|t| t.file_id == *file_id))
            .cloned()
    }

    /// Look up a task by id.
    pub fn get_task(&self, id: TaskId) -> Option<TranscriptionTask> {
        self.inner
            .lock()
            .unwrap()
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    /// Snapshot of all tasks in insertion order.
    pub fn tasks(&self) -> Vec<TranscriptionTask> {
        self.inner.lock().unwrap().tasks.clone()
    }

    /// Subscribe to task-list snapshots; the UI re-renders its queue view
    /// on every change notification.
    pub fn subscribe(&self) -> watch::Receiver<Vec<TranscriptionTask>> {
        self.snapshot_tx.subscribe()
    }

    // -----------------------------------------------------------------------
    // Driver loop
    // -----------------------------------------------------------------------

    /// Run the driver until `shutdown` fires.
    ///
    /// Spawn as a tokio task from startup wiring.  Exactly one driver per
    /// queue should run; the active-slot check makes a second driver
    /// harmless but pointless.
    pub async fn run(self, shutdown: CancellationToken) {
        log::info!("queue: driver started");

        loop {
            match self.claim_next(&shutdown) {
                Some((id, file_id, token)) => {
                    self.execute(id, &file_id, token).await;
                }
                None => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = self.wake.notified() => {}
                    }
                }
            }
            if shutdown.is_cancelled() {
                break;
            }
        }

        log::info!("queue: driver stopped");
    }

    /// Atomically claim the earliest queued task for execution.
    ///
    /// The empty-slot check and the slot assignment happen under one guard —
    /// this is the invariant that serializes task starts.
    fn claim_next(
        &self,
        shutdown: &CancellationToken,
    ) -> Option<(TaskId, FileId, CancellationToken)> {
        let mut inner = self.inner.lock().unwrap();
        if inner.active.is_some() {
            return None;
        }

        let task = inner
            .tasks
            .iter()
            .find(|t| t.state == TaskState::Queued)?;
        let id = task.id;
        let file_id = task.file_id.clone();

        // Child token: per-task cancellation, and queue shutdown cancels
        // whatever is in flight.
        let token = shutdown.child_token();
        inner.active = Some(ActiveSlot {
            id,
            cancel: token.clone(),
        });
        Some((id, file_id, token))
    }

    /// Drive one task through model load, inference and persistence.
    async fn execute(&self, id: TaskId, file_id: &FileId, token: CancellationToken) {
        let model = self.config.model.clone();
        let language = self.config.language.clone();
        log::debug!("queue: executing {id} for {file_id}");

        // ── 1. Model load (skipped when already resident) ────────────────
        if !self.backend.is_model_resident(&model) {
            self.set_state(id, TaskState::LoadingModel { model: model.clone() });

            let loaded = tokio::select! {
                res = self.backend.load_model(&model, &token) => res,
                _ = token.cancelled() => Err(BackendError::Cancelled),
            };
            if let Err(e) = loaded {
                self.finish(id, Err(e));
                return;
            }
        }

        // ── 2. Inference, forwarding progress into the task state ────────
        self.set_state(id, TaskState::Transcribing { progress: 0.0 });

        let (progress_tx, mut progress_rx) = mpsc::channel::<f32>(16);
        let fut = self
            .backend
            .transcribe(file_id, &model, language.as_deref(), progress_tx, &token);
        tokio::pin!(fut);

        let result = loop {
            tokio::select! {
                res = &mut fut => break res,
                Some(p) = progress_rx.recv() => {
                    self.set_state(id, TaskState::Transcribing { progress: p.clamp(0.0, 1.0) });
                }
                _ = token.cancelled() => break Err(BackendError::Cancelled),
            }
        };

        // ── 3. Persist; a save failure fails the task even though the
        //       inference succeeded — unreachable data is not a success ──
        let outcome = match result {
            Ok(cues) if token.is_cancelled() => {
                // Cancel landed between the backend finishing and us
                // observing the result — honour the cancellation.
                drop(cues);
                Err(BackendError::Cancelled)
            }
            Ok(cues) => {
                log::debug!("queue: {id} produced {} cues", cues.len());
                match self
                    .store
                    .save_result(file_id, &cues, &model, language.as_deref())
                    .await
                {
                    Ok(()) => Ok(()),
                    Err(e) => Err(BackendError::Inference(format!(
                        "transcription succeeded but saving the result failed: {e}"
                    ))),
                }
            }
            Err(e) => Err(e),
        };

        self.finish(id, outcome);
    }

    // -----------------------------------------------------------------------
    // State helpers
    // -----------------------------------------------------------------------

    /// Update a task's state, unless the task is already terminal (a user
    /// cancellation must not be overwritten by a late progress event) or
    /// has been removed.
    fn set_state(&self, id: TaskId, state: TaskState) {
        {
            let mut inner = self.inner.lock().unwrap();
            let Some(task) = inner.tasks.iter_mut().find(|t| t.id == id) else {
                return;
            };
            if task.state.is_terminal() {
                return;
            }
            task.state = state;
        }
        self.publish();
    }

    /// Record the task's terminal state and clear the active slot.
    fn finish(&self, id: TaskId, outcome: Result<(), BackendError>) {
        {
            let mut inner = self.inner.lock().unwrap();

            if inner.active.as_ref().is_some_and(|s| s.id == id) {
                inner.active = None;
            }

            if let Some(task) = inner.tasks.iter_mut().find(|t| t.id == id) {
                // cancel_task may already have marked the task.
                if !task.state.is_terminal() {
                    task.state = match outcome {
                        Ok(()) => TaskState::Completed,
                        Err(BackendError::Cancelled) => TaskState::Cancelled,
                        Err(e) => TaskState::Failed {
                            message: e.to_string(),
                        },
                    };
                }
                log::info!("queue: {id} finished as {}", task.state.label());
            }
        }

        self.publish();
        // The slot is free — let the driver pick up the next queued task.
        self.wake.notify_one();
    }

    fn publish(&self) {
        let snapshot = self.inner.lock().unwrap().tasks.clone();
        self.snapshot_tx.send_replace(snapshot);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
