//! The opaque media-engine collaborator.
//!
//! Audio/video decode and rendering live outside this crate.  The sync
//! engine and the scroll coordinator only ever need the small pull-based
//! surface below: a current-time accessor, transport control and a playing
//! flag.  The host application implements [`MediaEngine`] over its real
//! player; tests use [`FakePlayer`].
//!
//! The engine reports time via a pull-based accessor with no fine-grained
//! change notification, which is why the sync side polls it (see
//! [`crate::sync::PlaybackSync`]).

#[cfg(test)]
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// MediaEngine trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface to the host media player.
///
/// Implementations must be `Send + Sync` so they can be held behind an
/// `Arc<dyn MediaEngine>` and called from the polling loop and the UI
/// coordination context alike.
pub trait MediaEngine: Send + Sync {
    /// Current playback position in seconds.
    ///
    /// May return a transiently invalid value (negative, NaN) while the
    /// engine is seeking or tearing down; callers must skip such samples.
    fn current_time(&self) -> f64;

    /// Jump playback to `time` seconds.
    fn seek(&self, time: f64);

    /// Whether playback is currently advancing.
    fn is_playing(&self) -> bool;

    /// Pause playback.  No-op when already paused.
    fn pause(&self);

    /// Resume playback.  No-op when already playing.
    fn play(&self);
}

// Compile-time assertion: Box<dyn MediaEngine> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn MediaEngine>) {}
};

// ---------------------------------------------------------------------------
// FakePlayer  (test-only)
// ---------------------------------------------------------------------------

/// A scripted media engine for unit tests.
///
/// The clock is set explicitly with [`set_time`](FakePlayer::set_time);
/// transport calls are counted so tests can assert pause/resume happened
/// exactly once.
#[cfg(test)]
#[derive(Default)]
pub struct FakePlayer {
    inner: Mutex<FakePlayerState>,
}

#[cfg(test)]
#[derive(Default)]
struct FakePlayerState {
    time: f64,
    playing: bool,
    pause_calls: usize,
    play_calls: usize,
    seeks: Vec<f64>,
}

#[cfg(test)]
impl FakePlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fake that reports `playing` from the start.
    pub fn playing(playing: bool) -> Self {
        let fake = Self::default();
        fake.inner.lock().unwrap().playing = playing;
        fake
    }

    pub fn set_time(&self, time: f64) {
        self.inner.lock().unwrap().time = time;
    }

    pub fn pause_calls(&self) -> usize {
        self.inner.lock().unwrap().pause_calls
    }

    pub fn play_calls(&self) -> usize {
        self.inner.lock().unwrap().play_calls
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.inner.lock().unwrap().seeks.clone()
    }
}

#[cfg(test)]
impl MediaEngine for FakePlayer {
    fn current_time(&self) -> f64 {
        self.inner.lock().unwrap().time
    }

    fn seek(&self, time: f64) {
        let mut st = self.inner.lock().unwrap();
        st.time = time;
        st.seeks.push(time);
    }

    fn is_playing(&self) -> bool {
        self.inner.lock().unwrap().playing
    }

    fn pause(&self) {
        let mut st = self.inner.lock().unwrap();
        st.playing = false;
        st.pause_calls += 1;
    }

    fn play(&self) {
        let mut st = self.inner.lock().unwrap();
        st.playing = true;
        st.play_calls += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_dyn_media_engine_compiles() {
        // If this test compiles, the trait is object-safe.
        let engine: Box<dyn MediaEngine> = Box::new(FakePlayer::new());
        let _ = engine.current_time();
    }

    #[test]
    fn fake_player_counts_transport_calls() {
        let player = FakePlayer::playing(true);
        player.pause();
        player.pause();
        player.play();

        assert_eq!(player.pause_calls(), 2);
        assert_eq!(player.play_calls(), 1);
        assert!(player.is_playing());
    }

    #[test]
    fn fake_player_seek_moves_clock_and_records() {
        let player = FakePlayer::new();
        player.seek(12.5);
        assert!((player.current_time() - 12.5).abs() < f64::EPSILON);
        assert_eq!(player.seeks(), vec![12.5]);
    }
}
