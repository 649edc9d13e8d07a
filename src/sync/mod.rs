//! Playback-to-subtitle synchronization.
//!
//! Two cooperating pieces share one [`SyncState`]:
//!
//! * [`PlaybackSync`] — a 100 ms polling loop that samples the media
//!   engine's clock, resolves the active cue through the
//!   [`CueIndex`](crate::cue::CueIndex), and updates
//!   [`SyncState::current_cue`].  Suspended while the user scrolls.
//! * [`ScrollCoordinator`] — the auto-scroll / user-scroll / word-selection
//!   state machine: countdown-based auto-resume after a manual scroll,
//!   pause-on-word-selection with exactly-once resume, and tap-to-seek.
//!
//! Both sides read and write the state behind a single mutex from the
//! UI-affine coordination context; the state is reset wholesale on file
//! switch.

pub mod engine;
pub mod scroll;
pub mod state;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use engine::PlaybackSync;
pub use scroll::ScrollCoordinator;
pub use state::{new_shared_sync_state, ScrollMode, SharedSyncState, SyncState, WordSelection};
