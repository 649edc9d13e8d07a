//! Shared synchronization state.
//!
//! [`SyncState`] is the single source of truth for the subtitle view:
//! which cue is active, whether auto-scroll is suspended, and which word
//! (if any) is selected for lookup.
//!
//! [`SharedSyncState`] is a type alias for `Arc<Mutex<SyncState>>` — cheap
//! to clone and safe to share between the polling loop and the UI-facing
//! coordinator.  Lock for short critical sections only; never hold the
//! lock across an `.await` point.

use std::sync::{Arc, Mutex};

use crate::cue::CueId;

// ---------------------------------------------------------------------------
// ScrollMode
// ---------------------------------------------------------------------------

/// Whether the subtitle view follows the active cue or the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    /// The view auto-scrolls to keep the active cue visible.
    Auto,

    /// The user scrolled manually; auto-scroll is suspended and resumes
    /// when the countdown reaches zero.
    UserScrolling {
        /// Whole seconds until auto-scroll resumes.
        remaining_secs: u32,
    },
}

impl ScrollMode {
    /// Returns `true` while auto-scroll is suspended.
    pub fn is_user_scrolling(&self) -> bool {
        matches!(self, ScrollMode::UserScrolling { .. })
    }
}

// ---------------------------------------------------------------------------
// WordSelection
// ---------------------------------------------------------------------------

/// A word the user tapped for dictionary lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordSelection {
    /// The cue the word belongs to.
    pub cue: CueId,
    /// Index into [`Cue::words`](crate::cue::Cue::words).
    pub word_index: usize,
}

// ---------------------------------------------------------------------------
// SyncState
// ---------------------------------------------------------------------------

/// Synchronization state for the currently-viewed media file.
///
/// Invariant: `selection.is_some()` implies playback was paused by the
/// scroll coordinator, and must be resumed exactly once on dismissal iff
/// `was_playing_before_selection` was captured as `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    /// The cue active at the last valid playback-time sample.
    pub current_cue: Option<CueId>,
    /// Auto-scroll vs. user-scroll.
    pub scroll: ScrollMode,
    /// Active word selection, if any.
    pub selection: Option<WordSelection>,
    /// Whether playback was running when the current selection began.
    pub was_playing_before_selection: bool,
}

impl SyncState {
    pub fn new() -> Self {
        Self {
            current_cue: None,
            scroll: ScrollMode::Auto,
            selection: None,
            was_playing_before_selection: false,
        }
    }

    /// Reset everything — called on file switch.  The caller is
    /// responsible for tearing down any running countdown first (see
    /// [`ScrollCoordinator::reset`](crate::sync::ScrollCoordinator::reset)).
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// SharedSyncState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`SyncState`].
pub type SharedSyncState = Arc<Mutex<SyncState>>;

/// Construct a new [`SharedSyncState`] in its initial state.
pub fn new_shared_sync_state() -> SharedSyncState {
    Arc::new(Mutex::new(SyncState::new()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
