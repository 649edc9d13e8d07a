//! The playback polling loop.
//!
//! The media engine reports time via a pull-based `current_time` accessor
//! with no change notification fine-grained enough for sub-second subtitle
//! sync, so [`PlaybackSync`] samples it on a fixed 100 ms interval: latency
//! stays bounded to one tick without a tight loop burning CPU.
//!
//! Each tick: skip if the user is scrolling, sample the clock, drop
//! invalid samples (a single bad reading must never kill the session),
//! resolve the active cue via the [`CueIndex`] and update the shared state
//! only when the cue actually changed.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::SyncConfig;
use crate::cue::CueIndex;
use crate::player::MediaEngine;

use super::state::SharedSyncState;

// ---------------------------------------------------------------------------
// PlaybackSync
// ---------------------------------------------------------------------------

/// Polls the media engine and keeps
/// [`SyncState::current_cue`](crate::sync::SyncState::current_cue) in step
/// with playback.
///
/// One engine runs per currently-viewed file; it is torn down (via its
/// cancellation token) and rebuilt with a fresh index on file switch —
/// the index itself is immutable and freely shared.
pub struct PlaybackSync {
    player: Arc<dyn MediaEngine>,
    index: Arc<CueIndex>,
    state: SharedSyncState,
    poll_interval: Duration,
    epsilon: f64,
}

impl PlaybackSync {
    /// Create a sync engine for one file's cue index.
    pub fn new(
        player: Arc<dyn MediaEngine>,
        index: Arc<CueIndex>,
        state: SharedSyncState,
        config: &SyncConfig,
    ) -> Self {
        Self {
            player,
            index,
            state,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            epsilon: config.epsilon_secs,
        }
    }

    /// Run the polling loop until `cancel` fires.
    ///
    /// Spawn as a tokio task for the lifetime of the playback view.  With
    /// an empty index the loop performs no lookups but still ticks, so it
    /// remains cleanly cancellable.
    pub async fn run(self, cancel: CancellationToken) {
        log::debug!(
            "sync: polling started ({} cues, every {:?})",
            self.index.len(),
            self.poll_interval
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        // A delayed tick must not cause a burst of catch-up samples.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            self.tick();
        }

        log::debug!("sync: polling stopped");
    }

    /// One polling step.
    fn tick(&self) {
        // While the user scrolls, the view position is theirs — don't move
        // the current cue underneath them.
        if self.state.lock().unwrap().scroll.is_user_scrolling() {
            return;
        }

        if self.index.is_empty() {
            return;
        }

        let time = self.player.current_time();
        if !time.is_finite() || time < 0.0 {
            // Transient engine states (seeking, teardown) can produce junk
            // samples; skip them and keep polling.
            log::warn!("sync: skipping invalid time sample {time}");
            return;
        }

        let cue = self.index.active_cue(time, self.epsilon).map(|c| c.id);

        let mut st = self.state.lock().unwrap();
        if st.current_cue != cue {
            log::debug!("sync: current cue -> {cue:?} at {time:.3}s");
            st.current_cue = cue;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
