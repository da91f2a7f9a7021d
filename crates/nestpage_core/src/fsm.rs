//! Typed state tracking
//!
//! Two flavours of state machine are used by the pager:
//!
//! - Event-driven states implement [`StateTransitions`] and advance with
//!   [`StateTracker::send`] (surface motion phases).
//! - Derived states are recomputed from inputs on every pass and stored with
//!   [`StateTracker::set`] (header stick state). The tracker only records that
//!   a change happened; it never decides it.
//!
//! Both keep a bounded transition history for debugging.

use std::fmt::Debug;
use std::hash::Hash;

use smallvec::SmallVec;

use crate::events::EventType;

/// Maximum number of transitions kept in history
pub const HISTORY_LIMIT: usize = 32;

/// Trait for state types that change in response to events
pub trait StateTransitions: Clone + Copy + PartialEq + Eq + Hash + Debug + 'static {
    /// Handle an event and return the new state, or None if no transition
    fn on_event(&self, event: EventType) -> Option<Self>;
}

/// Current state plus a bounded history of `(from, to)` transitions
#[derive(Debug, Clone)]
pub struct StateTracker<S> {
    current: S,
    history: SmallVec<[(S, S); 8]>,
}

impl<S: Copy + PartialEq + Debug> StateTracker<S> {
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            history: SmallVec::new(),
        }
    }

    /// Get the current state
    pub fn current(&self) -> S {
        self.current
    }

    /// Check if we're in a specific state
    pub fn is_in(&self, state: S) -> bool {
        self.current == state
    }

    /// Store a recomputed state. Returns true if it differs from the previous one.
    pub fn set(&mut self, next: S) -> bool {
        if next == self.current {
            return false;
        }
        self.record(self.current, next);
        self.current = next;
        true
    }

    /// Get transition history, oldest first
    pub fn history(&self) -> &[(S, S)] {
        &self.history
    }

    fn record(&mut self, from: S, to: S) {
        if self.history.len() == HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history.push((from, to));
    }
}

impl<S: StateTransitions> StateTracker<S> {
    /// Send an event, potentially triggering a transition
    pub fn send(&mut self, event: EventType) -> S {
        if let Some(next) = self.current.on_event(event) {
            self.set(next);
        }
        self.current
    }
}

impl<S: Copy + PartialEq + Debug + Default> Default for StateTracker<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::event_types::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    enum Phase {
        #[default]
        Idle,
        Dragging,
        Decelerating,
    }

    impl StateTransitions for Phase {
        fn on_event(&self, event: EventType) -> Option<Self> {
            match (self, event) {
                (Phase::Idle, DRAG_BEGIN) => Some(Phase::Dragging),
                (Phase::Dragging, DECELERATION_BEGIN) => Some(Phase::Decelerating),
                (Phase::Dragging, DRAG_END) => Some(Phase::Idle),
                (Phase::Decelerating, DECELERATION_END) => Some(Phase::Idle),
                (Phase::Decelerating, DRAG_BEGIN) => Some(Phase::Dragging),
                _ => None,
            }
        }
    }

    #[test]
    fn test_send_follows_transitions() {
        let mut tracker = StateTracker::new(Phase::Idle);

        assert_eq!(tracker.send(DRAG_BEGIN), Phase::Dragging);
        assert_eq!(tracker.send(DECELERATION_BEGIN), Phase::Decelerating);
        assert_eq!(tracker.send(DECELERATION_END), Phase::Idle);

        assert_eq!(
            tracker.history(),
            &[
                (Phase::Idle, Phase::Dragging),
                (Phase::Dragging, Phase::Decelerating),
                (Phase::Decelerating, Phase::Idle),
            ]
        );
    }

    #[test]
    fn test_invalid_event_no_transition() {
        let mut tracker = StateTracker::new(Phase::Idle);

        // DECELERATION_END is not valid while idle
        assert_eq!(tracker.send(DECELERATION_END), Phase::Idle);
        assert!(tracker.is_in(Phase::Idle));
        assert!(tracker.history().is_empty());
    }

    #[test]
    fn test_set_records_only_changes() {
        let mut tracker = StateTracker::new(Phase::Idle);

        assert!(!tracker.set(Phase::Idle));
        assert!(tracker.set(Phase::Dragging));
        assert!(!tracker.set(Phase::Dragging));
        assert_eq!(tracker.history().len(), 1);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut tracker = StateTracker::new(Phase::Idle);
        for _ in 0..HISTORY_LIMIT {
            tracker.set(Phase::Dragging);
            tracker.set(Phase::Idle);
        }
        assert_eq!(tracker.history().len(), HISTORY_LIMIT);
        assert_eq!(
            tracker.history().last(),
            Some(&(Phase::Dragging, Phase::Idle))
        );
        assert_eq!(
            tracker.history().first(),
            Some(&(Phase::Idle, Phase::Dragging))
        );
    }
}
