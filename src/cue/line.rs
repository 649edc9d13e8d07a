//! The [`Cue`] data type — one timed subtitle/transcript line.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CueId
// ---------------------------------------------------------------------------

/// Opaque identifier of a single cue.
///
/// Assigned by whichever producer created the cue (transcription backend or
/// subtitle-file parser); only compared for equality, never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CueId(u64);

impl CueId {
    /// Wrap a raw producer-assigned id.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cue-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Cue
// ---------------------------------------------------------------------------

/// One timed subtitle/transcript line.  Immutable once created.
///
/// Times are seconds from the start of the media file; `start < end` and
/// both are finite and non-negative.  Producers are expected to uphold this
/// (the transcription backend and the subtitle parser both emit well-formed
/// cues); [`CueIndex::build`](crate::cue::CueIndex::build) tolerates
/// unsorted input but not malformed spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Producer-assigned identifier.
    pub id: CueId,
    /// Start time in seconds (inclusive).
    pub start: f64,
    /// End time in seconds (exclusive), `> start`.
    pub end: f64,
    /// The spoken/displayed text of this line.
    pub text: String,
}

impl Cue {
    /// Create a new cue.
    pub fn new(id: CueId, start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            id,
            start,
            end,
            text: text.into(),
        }
    }

    /// The cue's duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Split the cue text into whitespace-delimited words.
    ///
    /// Word indices handed to the word-selection state machine refer to
    /// positions in this sequence, so the split must stay stable for the
    /// lifetime of the cue — which it is, because cues are immutable.
    pub fn words(&self) -> Vec<&str> {
        self.text.split_whitespace().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_end_minus_start() {
        let cue = Cue::new(CueId::new(1), 1.5, 4.0, "x");
        assert!((cue.duration() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn words_splits_on_whitespace() {
        let cue = Cue::new(CueId::new(1), 0.0, 1.0, "  the quick\tbrown  fox ");
        assert_eq!(cue.words(), vec!["the", "quick", "brown", "fox"]);
    }

    #[test]
    fn words_of_empty_text_is_empty() {
        let cue = Cue::new(CueId::new(1), 0.0, 1.0, "");
        assert!(cue.words().is_empty());
    }

    #[test]
    fn cue_id_display_and_value() {
        let id = CueId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "cue-42");
    }

    #[test]
    fn cue_round_trips_through_json() {
        let cue = Cue::new(CueId::new(7), 0.5, 2.0, "bonjour");
        let json = serde_json::to_string(&cue).unwrap();
        let back: Cue = serde_json::from_str(&json).unwrap();
        assert_eq!(cue, back);
    }
}
