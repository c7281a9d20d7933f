//! Horizontal swipe detection.
//!
//! The front end reports drag deltas while a gesture is in progress and a
//! release when it ends. A release past the threshold in either direction is
//! a swipe; anything shorter is ignored. The accumulator always resets on
//! release.

use crate::tally::Feedback;

/// Accumulated horizontal distance a release must exceed to count as a swipe.
pub const SWIPE_THRESHOLD: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    /// Right is a like, left is a dislike.
    pub fn feedback(self) -> Feedback {
        match self {
            SwipeDirection::Right => Feedback::Like,
            SwipeDirection::Left => Feedback::Dislike,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SwipeState {
    #[default]
    Idle,
    Accumulating {
        drag: f32,
    },
}

/// Tracks one gesture at a time.
///
/// ## Examples
///
/// ```
/// use odd_friend::{SwipeDirection, SwipeTracker};
///
/// let mut swipe = SwipeTracker::new();
/// swipe.drag(80.0);
/// swipe.drag(70.0);
/// assert_eq!(swipe.release(), Some(SwipeDirection::Right));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SwipeTracker {
    state: SwipeState,
}

impl SwipeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SwipeState {
        self.state
    }

    /// Distance accumulated by the gesture in progress.
    pub fn accumulated(&self) -> f32 {
        match self.state {
            SwipeState::Idle => 0.0,
            SwipeState::Accumulating { drag } => drag,
        }
    }

    pub fn drag(&mut self, delta: f32) {
        self.state = SwipeState::Accumulating {
            drag: self.accumulated() + delta,
        };
    }

    /// End the gesture, reporting a swipe if the threshold was passed.
    pub fn release(&mut self) -> Option<SwipeDirection> {
        let drag = self.accumulated();
        self.reset();

        if drag > SWIPE_THRESHOLD {
            Some(SwipeDirection::Right)
        } else if drag < -SWIPE_THRESHOLD {
            Some(SwipeDirection::Left)
        } else {
            None
        }
    }

    /// Drop the gesture in progress without reporting anything.
    pub fn reset(&mut self) {
        self.state = SwipeState::Idle;
    }
}
