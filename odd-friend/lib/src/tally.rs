//! Per-item feedback counters.
//!
//! Every word and face-part key that has been on screen when feedback was
//! given gets its own [`Stats`]. Counters are created lazily at zero and are
//! never removed within a session.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::trace;

use crate::generate::{FaceParts, Friend, SentenceParts};

/// The reaction recorded for displayed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Like,
    Dislike,
    /// The user moved on with "next" without swiping.
    Neutral,
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Feedback::Like => "like",
            Feedback::Dislike => "dislike",
            Feedback::Neutral => "neutral",
        })
    }
}

/// Counters for one content key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub likes: u64,
    pub dislikes: u64,
    pub neutrals: u64,
}

impl Stats {
    fn bump(&mut self, feedback: Feedback) {
        match feedback {
            Feedback::Like => self.likes += 1,
            Feedback::Dislike => self.dislikes += 1,
            Feedback::Neutral => self.neutrals += 1,
        }
    }

    /// Total number of events recorded for this key.
    pub fn total(&self) -> u64 {
        self.likes + self.dislikes + self.neutrals
    }
}

/// Feedback counters keyed by content key, held for the session only.
///
/// ## Examples
///
/// ```
/// use odd_friend::{Feedback, FeedbackTally};
///
/// let mut tally = FeedbackTally::new();
/// tally.record("brave", Feedback::Like);
/// tally.record("brave", Feedback::Like);
/// assert_eq!(tally.get("brave").likes, 2);
/// ```
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct FeedbackTally {
    stats: HashMap<String, Stats>,
}

impl FeedbackTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one event for `key`, creating its counters if needed.
    pub fn record(&mut self, key: impl Into<String>, feedback: Feedback) {
        let key = key.into();
        trace!(%key, %feedback, "feedback recorded");
        self.stats.entry(key).or_default().bump(feedback);
    }

    /// One increment of `feedback` for every word and every face slot.
    ///
    /// A key shown in two slots (matching eyes) is counted once per slot.
    pub fn record_swipe_feedback(
        &mut self,
        sentence: &SentenceParts,
        face: &FaceParts,
        feedback: Feedback,
    ) {
        for word in sentence.content_keys() {
            self.record(word, feedback);
        }
        for part in face.content_keys() {
            self.record(part, feedback);
        }
    }

    /// [`record_swipe_feedback`](Self::record_swipe_feedback) for a whole friend.
    pub fn record_friend(&mut self, friend: &Friend, feedback: Feedback) {
        self.record_swipe_feedback(&friend.sentence, &friend.face, feedback);
    }

    /// Counters for `key`; zero if it was never recorded.
    pub fn get(&self, key: &str) -> Stats {
        self.stats.get(key).copied().unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.stats.contains_key(key)
    }

    /// Number of distinct keys with counters.
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// All counters sorted by key.
    pub fn entries(&self) -> Vec<(&str, Stats)> {
        let mut entries: Vec<_> = self
            .stats
            .iter()
            .map(|(key, stats)| (key.as_str(), *stats))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AssetId;

    fn face(left: &str, right: &str) -> FaceParts {
        FaceParts {
            head: AssetId::Bundled("heads1".into()),
            left_eye: AssetId::Bundled(left.into()),
            right_eye: AssetId::Bundled(right.into()),
            mouth: AssetId::Bundled("mouths1".into()),
        }
    }

    #[test]
    fn unseen_key_reads_as_zero() {
        let tally = FeedbackTally::new();
        assert_eq!(tally.get("brave"), Stats::default());
        assert!(tally.is_empty());
        assert!(!tally.contains("brave"));
    }

    #[test]
    fn two_likes_on_the_same_word() {
        let mut tally = FeedbackTally::new();
        tally.record("brave", Feedback::Like);
        tally.record("brave", Feedback::Like);

        let stats = tally.get("brave");
        assert_eq!(stats.likes, 2);
        assert_eq!(stats.dislikes, 0);
        assert_eq!(stats.neutrals, 0);
    }

    #[test]
    fn one_of_each() {
        let mut tally = FeedbackTally::new();
        for feedback in [Feedback::Like, Feedback::Dislike, Feedback::Neutral] {
            tally.record("cheese", feedback);
        }
        assert_eq!(
            tally.get("cheese"),
            Stats {
                likes: 1,
                dislikes: 1,
                neutrals: 1
            }
        );
        assert_eq!(tally.get("cheese").total(), 3);
    }

    #[test]
    fn swipe_touches_every_word_and_slot_once() {
        let mut tally = FeedbackTally::new();
        let sentence = SentenceParts::new("brave", "run", "fast");
        tally.record_swipe_feedback(&sentence, &face("eyes1", "eyes2"), Feedback::Dislike);

        assert_eq!(tally.len(), 7);
        for key in ["brave", "run", "fast", "heads1", "eyes1", "eyes2", "mouths1"] {
            assert_eq!(tally.get(key).dislikes, 1, "{key}");
            assert_eq!(tally.get(key).total(), 1, "{key}");
        }
    }

    #[test]
    fn matching_eyes_count_per_slot() {
        let mut tally = FeedbackTally::new();
        let sentence = SentenceParts::new("brave", "run", "fast");
        tally.record_swipe_feedback(&sentence, &face("eyes3", "eyes3"), Feedback::Like);

        assert_eq!(tally.get("eyes3").likes, 2);
        assert_eq!(tally.len(), 6);
    }

    #[test]
    fn entries_are_sorted_and_serialize_by_key() {
        let mut tally = FeedbackTally::new();
        tally.record("verb", Feedback::Neutral);
        tally.record("adjective", Feedback::Like);

        let keys: Vec<&str> = tally.entries().into_iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["adjective", "verb"]);

        let json = serde_json::to_value(&tally).unwrap();
        assert_eq!(json["adjective"]["likes"], 1);
        assert_eq!(json["verb"]["neutrals"], 1);
    }
}
