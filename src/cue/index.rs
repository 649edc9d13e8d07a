//! Immutable, time-sorted cue index with binary-search active-cue lookup.
//!
//! The index is rebuilt wholesale on file switch or re-transcription — it is
//! never mutated in place, so a reference can be shared freely with the
//! polling loop without readers ever observing a half-built index.

use super::line::{Cue, CueId};

/// Default boundary tolerance in seconds.
///
/// Playback time advances in ~100 ms polling steps and cue boundaries come
/// from float arithmetic; without a small tolerance band a sample landing
/// exactly on a boundary would flicker between "no cue" and the next cue.
pub const DEFAULT_EPSILON_SECS: f64 = 0.001;

// ---------------------------------------------------------------------------
// CueIndex
// ---------------------------------------------------------------------------

/// An immutable sequence of cues for one media file, sorted ascending by
/// start time, supporting O(log n) lookup of the cue active at a given
/// playback time.
///
/// Overlapping cues are permitted; lookup favours the most recently started
/// cue (the rightmost cue whose start time is at or before the sample).
#[derive(Debug, Clone, Default)]
pub struct CueIndex {
    cues: Vec<Cue>,
}

impl CueIndex {
    /// Build an index from `cues`.
    ///
    /// The input does **not** need to be sorted — the builder sorts by start
    /// time (stable, so equal-start cues keep their producer order).
    pub fn build(mut cues: Vec<Cue>) -> Self {
        cues.sort_by(|a, b| a.start.total_cmp(&b.start));
        Self { cues }
    }

    /// The cue active at `time` (seconds), or `None` when `time` falls in a
    /// gap between cues, precedes the first cue, or is past the last cue's
    /// end.
    ///
    /// `epsilon` widens the *start* boundary on both sides so that a sample
    /// landing within `epsilon` of a cue's start still resolves to that cue.
    /// The end boundary is exclusive: `time >= cue.end` never matches.
    ///
    /// A non-finite or negative `time` is a caller contract violation; this
    /// implementation logs a warning and returns `None` rather than
    /// panicking, because one bad sample must never take down a long-lived
    /// polling session.
    pub fn active_cue(&self, time: f64, epsilon: f64) -> Option<&Cue> {
        if !time.is_finite() || time < 0.0 {
            log::warn!("active_cue called with invalid time {time}");
            return None;
        }

        // Rightmost cue with start <= time + epsilon.  With overlapping
        // cues this is the most recently started one.
        let idx = self.cues.partition_point(|c| c.start <= time + epsilon);
        if idx == 0 {
            return None;
        }

        let candidate = &self.cues[idx - 1];
        if time >= candidate.start - epsilon && time < candidate.end {
            Some(candidate)
        } else {
            None
        }
    }

    /// [`active_cue`](Self::active_cue) with [`DEFAULT_EPSILON_SECS`].
    pub fn active_cue_at(&self, time: f64) -> Option<&Cue> {
        self.active_cue(time, DEFAULT_EPSILON_SECS)
    }

    /// Look up a cue by id (linear scan — the UI uses this rarely, e.g. to
    /// resolve a tapped cue id back to its text).
    pub fn cue(&self, id: CueId) -> Option<&Cue> {
        self.cues.iter().find(|c| c.id == id)
    }

    /// All cues in ascending start-time order.
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Number of cues in the index.
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Returns `true` when the index holds no cues.
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::CueId;

    fn cue(id: u64, start: f64, end: f64, text: &str) -> Cue {
        Cue::new(CueId::new(id), start, end, text)
    }

    /// Four back-to-back cues covering 0–8 s.
    fn four_cues() -> Vec<Cue> {
        vec![
            cue(1, 0.0, 2.0, "a"),
            cue(2, 2.0, 4.0, "b"),
            cue(3, 4.0, 6.0, "c"),
            cue(4, 6.0, 8.0, "d"),
        ]
    }

    // --- basic lookup ---

    #[test]
    fn lookup_in_middle_of_cue() {
        let index = CueIndex::build(four_cues());
        assert_eq!(index.active_cue_at(2.5).map(|c| c.text.as_str()), Some("b"));
        assert_eq!(index.active_cue_at(5.0).map(|c| c.text.as_str()), Some("c"));
    }

    #[test]
    fn lookup_past_last_cue_is_none() {
        let index = CueIndex::build(four_cues());
        assert!(index.active_cue_at(9.0).is_none());
    }

    #[test]
    fn lookup_before_first_cue_is_none() {
        let cues = vec![cue(1, 5.0, 6.0, "late")];
        let index = CueIndex::build(cues);
        assert!(index.active_cue_at(1.0).is_none());
    }

    #[test]
    fn lookup_in_gap_between_cues_is_none() {
        let cues = vec![cue(1, 0.0, 1.0, "a"), cue(2, 5.0, 6.0, "b")];
        let index = CueIndex::build(cues);
        assert!(index.active_cue_at(3.0).is_none());
    }

    #[test]
    fn every_covered_time_resolves_to_exactly_its_cue() {
        let index = CueIndex::build(four_cues());
        // Sample a grid well inside each cue.
        for (t, expected) in [(0.5, "a"), (1.9, "a"), (2.1, "b"), (7.99, "d")] {
            assert_eq!(
                index.active_cue_at(t).map(|c| c.text.as_str()),
                Some(expected),
                "time {t}"
            );
        }
    }

    // --- boundaries and epsilon ---

    #[test]
    fn exact_start_boundary_resolves_to_starting_cue() {
        let index = CueIndex::build(four_cues());
        // 2.0 is the end of "a" (exclusive) and the start of "b".
        assert_eq!(index.active_cue_at(2.0).map(|c| c.text.as_str()), Some("b"));
    }

    #[test]
    fn sample_just_before_start_within_epsilon_matches() {
        let index = CueIndex::build(vec![cue(1, 1.0, 2.0, "a")]);
        assert!(index.active_cue(0.9995, 0.001).is_some());
        assert!(index.active_cue(0.9, 0.001).is_none());
    }

    #[test]
    fn end_boundary_is_exclusive() {
        let index = CueIndex::build(vec![cue(1, 0.0, 2.0, "a")]);
        assert!(index.active_cue(2.0, 0.0).is_none());
        assert!(index.active_cue(1.999, 0.0).is_some());
    }

    // --- overlap: most recently started cue wins ---

    #[test]
    fn overlapping_cues_favour_most_recently_started() {
        let cues = vec![cue(1, 0.0, 10.0, "long"), cue(2, 4.0, 6.0, "inner")];
        let index = CueIndex::build(cues);
        assert_eq!(
            index.active_cue_at(5.0).map(|c| c.text.as_str()),
            Some("inner")
        );
        // Past the inner cue's end there is no fallback to the long cue:
        // the rightmost started cue has ended, so the gap rule applies.
        assert!(index.active_cue_at(7.0).is_none());
    }

    // --- builder sorts ---

    #[test]
    fn build_sorts_unsorted_input() {
        let cues = vec![cue(3, 4.0, 6.0, "c"), cue(1, 0.0, 2.0, "a"), cue(2, 2.0, 4.0, "b")];
        let index = CueIndex::build(cues);
        let starts: Vec<f64> = index.cues().iter().map(|c| c.start).collect();
        assert_eq!(starts, vec![0.0, 2.0, 4.0]);
        assert_eq!(index.active_cue_at(0.5).map(|c| c.text.as_str()), Some("a"));
    }

    // --- degenerate input ---

    #[test]
    fn empty_index_always_returns_none() {
        let index = CueIndex::build(Vec::new());
        assert!(index.is_empty());
        assert!(index.active_cue_at(0.0).is_none());
        assert!(index.active_cue_at(1000.0).is_none());
    }

    #[test]
    fn invalid_time_returns_none_without_panicking() {
        let index = CueIndex::build(four_cues());
        assert!(index.active_cue_at(f64::NAN).is_none());
        assert!(index.active_cue_at(f64::INFINITY).is_none());
        assert!(index.active_cue_at(-1.0).is_none());
    }

    // --- misc accessors ---

    #[test]
    fn cue_lookup_by_id() {
        let index = CueIndex::build(four_cues());
        assert_eq!(
            index.cue(CueId::new(3)).map(|c| c.text.as_str()),
            Some("c")
        );
        assert!(index.cue(CueId::new(99)).is_none());
    }

    #[test]
    fn len_matches_input() {
        let index = CueIndex::build(four_cues());
        assert_eq!(index.len(), 4);
        assert!(!index.is_empty());
    }
}
