//! Timed subtitle cues and the active-cue lookup index.
//!
//! A [`Cue`] is one timed transcript line.  A [`CueIndex`] is an immutable,
//! time-sorted collection of cues for a single media file with O(log n)
//! active-cue lookup, rebuilt wholesale whenever the displayed file changes
//! or a re-transcription completes.
//!
//! # Quick start
//!
//! ```rust
//! use lingoplay::cue::{Cue, CueId, CueIndex};
//!
//! let index = CueIndex::build(vec![
//!     Cue::new(CueId::new(1), 0.0, 2.0, "hello"),
//!     Cue::new(CueId::new(2), 2.0, 4.0, "world"),
//! ]);
//!
//! assert_eq!(index.active_cue_at(2.5).map(|c| c.text.as_str()), Some("world"));
//! assert!(index.active_cue_at(9.0).is_none());
//! ```

pub mod index;
pub mod line;

pub use index::{CueIndex, DEFAULT_EPSILON_SECS};
pub use line::{Cue, CueId};
