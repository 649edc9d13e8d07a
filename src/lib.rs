//! lingoplay — transcription queue and subtitle-sync engine for a
//! language-learning media player.
//!
//! This crate is the playback-side core of a desktop audio/video player for
//! language learners: it serializes long-running, cancellable on-device
//! transcription jobs and keeps a scrolling subtitle view synchronized with
//! advancing playback time.  The GUI, the media decoder, the persistent
//! database and the speech model itself are all collaborators injected at
//! construction — this crate defines their seams and owns the logic between
//! them.
//!
//! # Architecture
//!
//! ```text
//! media file ──▶ TranscriptionQueue ──▶ TranscriptionBackend (trait)
//!                      │                        │
//!                      │  Completed             ▼
//!                      └──────────────▶ TranscriptStore (trait)
//!                                              │
//!                                              ▼  load_cached_cues
//!                                         CueIndex ◀── PlaybackSync (poll)
//!                                              │            │
//!                                              ▼            ▼
//!                                     ScrollCoordinator ── SyncState ──▶ UI
//! ```
//!
//! # Module map
//!
//! * [`config`] — settings structs, defaults, TOML persistence.
//! * [`cue`] — timed subtitle cues and the binary-search [`cue::CueIndex`].
//! * [`player`] — the opaque [`player::MediaEngine`] collaborator.
//! * [`store`] — the [`store::TranscriptStore`] persistence collaborator.
//! * [`transcribe`] — task model, backend seam and the
//!   [`transcribe::TranscriptionQueue`].
//! * [`sync`] — the 100 ms playback polling loop and the
//!   scroll/word-selection state machine.

pub mod config;
pub mod cue;
pub mod player;
pub mod store;
pub mod sync;
pub mod transcribe;
