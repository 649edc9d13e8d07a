//! Scroll and word-selection state machine.
//!
//! [`ScrollCoordinator`] arbitrates between the polling loop and the user:
//!
//! * **Manual scroll** suspends auto-scroll and starts a countdown
//!   (default 3 s, ticking once per second).  Scrolling again restarts the
//!   countdown from the full duration — debounce by restart, not
//!   accumulation.  Reaching zero returns the view to [`ScrollMode::Auto`];
//!   a cancelled countdown never fires its final transition.
//! * **Word selection** pauses playback on the first selection (capturing
//!   whether it was playing), keeps that capture across re-selections, and
//!   resumes exactly once on dismissal iff playback was running before.
//! * **Cue tap** seeks to the cue's start and snaps back to auto-scroll —
//!   unless a word is selected, in which case the tap is suppressed so a
//!   lookup gesture can't turn into an accidental seek.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::cue::Cue;
use crate::player::MediaEngine;

use super::state::{ScrollMode, SharedSyncState, WordSelection};

// ---------------------------------------------------------------------------
// ScrollCoordinator
// ---------------------------------------------------------------------------

/// UI-facing coordinator for scroll mode and word selection.
///
/// Owns the countdown timer; all mutations of the shared [`SyncState`]
/// (crate's sync state) happen from the UI-affine coordination context that
/// calls these methods, so reads and writes never race the polling loop's
/// short lock sections.
pub struct ScrollCoordinator {
    state: SharedSyncState,
    player: Arc<dyn MediaEngine>,
    pause_secs: u32,
    /// Token of the countdown currently running, if any.  Replaced (and
    /// the old one cancelled) on every restart.
    countdown: Mutex<Option<CancellationToken>>,
}

impl ScrollCoordinator {
    /// Create a coordinator over the shared state and the host player.
    ///
    /// `pause_secs` is how long auto-scroll stays suspended after the last
    /// manual scroll (see [`ScrollConfig`](crate::config::ScrollConfig)).
    pub fn new(state: SharedSyncState, player: Arc<dyn MediaEngine>, pause_secs: u32) -> Self {
        Self {
            state,
            player,
            pause_secs,
            countdown: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Manual scroll + countdown
    // -----------------------------------------------------------------------

    /// The user scrolled the subtitle list manually.
    ///
    /// Enters (or re-enters) `UserScrolling` with a full countdown.  Any
    /// countdown already running is cancelled first, so repeated scrolling
    /// keeps pushing the auto-resume out — never accumulating, never
    /// firing early.
    pub fn user_scrolled(&self) {
        let secs = self.pause_secs;
        if secs == 0 {
            // A zero pause means auto-scroll is never suspended.
            return;
        }

        let token = CancellationToken::new();
        {
            let mut guard = self.countdown.lock().unwrap();
            if let Some(old) = guard.take() {
                old.cancel();
            }
            *guard = Some(token.clone());
        }

        self.state.lock().unwrap().scroll = ScrollMode::UserScrolling {
            remaining_secs: secs,
        };
        log::debug!("scroll: user scrolling, auto-resume in {secs}s");

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            for remaining in (0..secs).rev() {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                }

                let mut st = state.lock().unwrap();
                // The token may have been cancelled between the sleep
                // completing and us taking the lock; a dead countdown must
                // not fire its transition.
                if token.is_cancelled() {
                    return;
                }
                st.scroll = if remaining == 0 {
                    log::debug!("scroll: countdown elapsed, back to auto");
                    ScrollMode::Auto
                } else {
                    ScrollMode::UserScrolling {
                        remaining_secs: remaining,
                    }
                };
            }
        });
    }

    // -----------------------------------------------------------------------
    // Word selection
    // -----------------------------------------------------------------------

    /// The user tapped `word_index` of `cue` for lookup.
    ///
    /// The first selection captures whether playback was running and
    /// pauses it; switching to a different word while a selection is
    /// active neither re-captures nor re-pauses.
    pub fn select_word(&self, cue: &Cue, word_index: usize) {
        let word_count = cue.words().len();
        if word_index >= word_count {
            log::warn!(
                "scroll: word index {word_index} out of range for {} ({word_count} words)",
                cue.id
            );
            return;
        }

        let pause_now = {
            let mut st = self.state.lock().unwrap();
            let first_selection = st.selection.is_none();

            st.selection = Some(WordSelection {
                cue: cue.id,
                word_index,
            });

            if first_selection {
                let playing = self.player.is_playing();
                st.was_playing_before_selection = playing;
                playing
            } else {
                false
            }
        };

        if pause_now {
            log::debug!("scroll: word selected while playing, pausing");
            self.player.pause();
        }
    }

    /// The user dismissed the word selection (tapped elsewhere, closed the
    /// lookup popover).
    ///
    /// Resumes playback exactly once iff it was playing when the selection
    /// began.  Dismissing with no active selection is a no-op.
    pub fn deselect_word(&self) {
        let resume = {
            let mut st = self.state.lock().unwrap();
            if st.selection.is_none() {
                return;
            }
            st.selection = None;
            std::mem::take(&mut st.was_playing_before_selection)
        };

        if resume {
            log::debug!("scroll: selection dismissed, resuming playback");
            self.player.play();
        }
    }

    // -----------------------------------------------------------------------
    // Cue tap-to-seek
    // -----------------------------------------------------------------------

    /// The user tapped a cue row (not a word) to jump there.
    ///
    /// Suppressed while a word selection is active.  Otherwise seeks to
    /// the cue's start, cancels any running countdown and returns the view
    /// to auto-scroll immediately.
    pub fn tap_cue(&self, cue: &Cue) {
        {
            let st = self.state.lock().unwrap();
            if st.selection.is_some() {
                log::debug!("scroll: cue tap suppressed during word selection");
                return;
            }
        }

        self.cancel_countdown();
        self.state.lock().unwrap().scroll = ScrollMode::Auto;

        log::debug!("scroll: seeking to {} at {:.3}s", cue.id, cue.start);
        self.player.seek(cue.start);
    }

    // -----------------------------------------------------------------------
    // File switch
    // -----------------------------------------------------------------------

    /// Tear down for a file switch: drop any countdown and reset the whole
    /// sync state.  Deliberately does not touch the player transport — the
    /// host decides what switching files does to playback.
    pub fn reset(&self) {
        self.cancel_countdown();
        self.state.lock().unwrap().reset();
    }

    fn cancel_countdown(&self) {
        if let Some(token) = self.countdown.lock().unwrap().take() {
            token.cancel();
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
    use crate::player::FakePlayer;
    use crate::sync::state::new_shared_sync_state;

    fn cue() -> Cue {
        Cue::new(CueId::new(1), 10.0, 12.0, "je ne sais pas")
    }

    fn coordinator(player: Arc<FakePlayer>) -> (ScrollCoordinator, SharedSyncState) {
        let state = new_shared_sync_state();
        let coord = ScrollCoordinator::new(Arc::clone(&state), player, 3);
        (coord, state)
    }

    fn mode(state: &SharedSyncState) -> ScrollMode {
        state.lock().unwrap().scroll
    }

    // ---- countdown ---

    #[tokio::test(start_paused = true)]
    async fn countdown_ticks_down_then_returns_to_auto() {
        let (coord, state) = coordinator(Arc::new(FakePlayer::new()));

        coord.user_scrolled();
        assert_eq!(mode(&state), ScrollMode::UserScrolling { remaining_secs: 3 });

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(mode(&state), ScrollMode::UserScrolling { remaining_secs: 2 });

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(mode(&state), ScrollMode::UserScrolling { remaining_secs: 1 });

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(mode(&state), ScrollMode::Auto);
    }

    /// Scrolling again restarts the countdown from the full duration and
    /// kills the previous timer (which would otherwise fire Auto early).
    #[tokio::test(start_paused = true)]
    async fn rescroll_restarts_countdown_from_full_duration() {
        let (coord, state) = coordinator(Arc::new(FakePlayer::new()));

        // t = 0
        coord.user_scrolled();
        tokio::time::sleep(Duration::from_millis(1100)).await; // t = 1.1
        assert_eq!(mode(&state), ScrollMode::UserScrolling { remaining_secs: 2 });

        tokio::time::sleep(Duration::from_millis(400)).await; // t = 1.5
        coord.user_scrolled();
        assert_eq!(mode(&state), ScrollMode::UserScrolling { remaining_secs: 3 });

        tokio::time::sleep(Duration::from_millis(1100)).await; // t = 2.6
        assert_eq!(mode(&state), ScrollMode::UserScrolling { remaining_secs: 2 });

        // t = 3.6 — the *original* timer would have hit Auto at t = 3.0;
        // it must be dead.
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(mode(&state), ScrollMode::UserScrolling { remaining_secs: 1 });

        tokio::time::sleep(Duration::from_millis(1000)).await; // t = 4.6
        assert_eq!(mode(&state), ScrollMode::Auto);
    }

    // ---- word selection pause/resume ---

    #[tokio::test]
    async fn first_selection_while_playing_pauses_once() {
        let player = Arc::new(FakePlayer::playing(true));
        let (coord, state) = coordinator(Arc::clone(&player));

        coord.select_word(&cue(), 2);
        assert_eq!(player.pause_calls(), 1);
        assert!(state.lock().unwrap().was_playing_before_selection);

        // Selecting a different word must not pause again.
        coord.select_word(&cue(), 0);
        assert_eq!(player.pause_calls(), 1);

        // Dismissal resumes exactly once and clears the capture.
        coord.deselect_word();
        assert_eq!(player.play_calls(), 1);
        assert!(!state.lock().unwrap().was_playing_before_selection);
        assert!(state.lock().unwrap().selection.is_none());

        // A second dismissal does nothing.
        coord.deselect_word();
        assert_eq!(player.play_calls(), 1);
    }

    #[tokio::test]
    async fn selection_while_paused_never_touches_transport() {
        let player = Arc::new(FakePlayer::playing(false));
        let (coord, _state) = coordinator(Arc::clone(&player));

        coord.select_word(&cue(), 1);
        coord.deselect_word();

        assert_eq!(player.pause_calls(), 0);
        assert_eq!(player.play_calls(), 0);
    }

    #[tokio::test]
    async fn reselection_keeps_original_capture() {
        let player = Arc::new(FakePlayer::playing(true));
        let (coord, state) = coordinator(Arc::clone(&player));

        coord.select_word(&cue(), 0);
        assert_eq!(player.pause_calls(), 1);

        // Player is now paused; re-selecting must not overwrite the
        // "was playing" capture with false.
        coord.select_word(&cue(), 3);
        assert!(state.lock().unwrap().was_playing_before_selection);

        coord.deselect_word();
        assert_eq!(player.play_calls(), 1);
    }

    #[tokio::test]
    async fn out_of_range_word_index_is_ignored() {
        let player = Arc::new(FakePlayer::playing(true));
        let (coord, state) = coordinator(Arc::clone(&player));

        // "je ne sais pas" has 4 words; index 4 is out of range.
        coord.select_word(&cue(), 4);

        assert!(state.lock().unwrap().selection.is_none());
        assert_eq!(player.pause_calls(), 0);
    }

    // ---- cue tap-to-seek ---

    #[tokio::test(start_paused = true)]
    async fn tap_cue_seeks_and_cancels_countdown() {
        let player = Arc::new(FakePlayer::new());
        let (coord, state) = coordinator(Arc::clone(&player));

        coord.user_scrolled();
        assert!(mode(&state).is_user_scrolling());

        coord.tap_cue(&cue());
        assert_eq!(mode(&state), ScrollMode::Auto);
        assert_eq!(player.seeks(), vec![10.0]);

        // The cancelled countdown must stay silent.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(mode(&state), ScrollMode::Auto);
    }

    #[tokio::test]
    async fn tap_cue_is_suppressed_during_word_selection() {
        let player = Arc::new(FakePlayer::playing(true));
        let (coord, _state) = coordinator(Arc::clone(&player));

        coord.select_word(&cue(), 1);
        coord.tap_cue(&cue());

        assert!(player.seeks().is_empty());
    }

    // ---- reset ---

    #[tokio::test(start_paused = true)]
    async fn reset_clears_state_and_kills_countdown_without_resuming() {
        let player = Arc::new(FakePlayer::playing(true));
        let (coord, state) = coordinator(Arc::clone(&player));

        coord.select_word(&cue(), 0);
        coord.user_scrolled();
        coord.reset();

        let st = state.lock().unwrap().clone();
        assert_eq!(st, crate::sync::SyncState::new());
        // File switch is not a dismissal — no resume.
        assert_eq!(player.play_calls(), 0);

        // Dead countdown never fires.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(mode(&state), ScrollMode::Auto);
    }
}
