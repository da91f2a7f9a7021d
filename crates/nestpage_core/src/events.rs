//! Surface event delivery
//!
//! Scroll surfaces report changes through an explicit subscription list.
//! Callbacks run synchronously on the thread that mutated the surface, in
//! registration order. Consumers should enqueue the event rather than touch
//! the surface again from inside the callback.

use slotmap::{new_key_type, SlotMap};

use crate::geometry::{Point, Size};

/// Event type identifier
pub type EventType = u32;

/// Surface event types
pub mod event_types {
    use super::EventType;

    pub const OFFSET_CHANGED: EventType = 1;
    pub const SIZE_CHANGED: EventType = 2;
    /// Finger down and moving
    pub const DRAG_BEGIN: EventType = 10;
    /// Finger lifted
    pub const DRAG_END: EventType = 11;
    /// Inertial motion after release started
    pub const DECELERATION_BEGIN: EventType = 12;
    /// Inertial motion came to rest
    pub const DECELERATION_END: EventType = 13;
    pub const SCROLL_ANIMATION_BEGIN: EventType = 14;
    /// Programmatic animated scroll finished
    pub const SCROLL_ANIMATION_END: EventType = 15;
    /// Motion forcibly stopped by the owner
    pub const MOTION_STOPPED: EventType = 16;
}

/// A change reported by a scroll surface
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SurfaceEvent {
    OffsetChanged { offset: Point },
    SizeChanged { size: Size },
    DragBegan,
    DragEnded { will_decelerate: bool },
    DecelerationEnded,
    ScrollAnimationEnded,
}

impl SurfaceEvent {
    /// True for events that mean the surface stopped moving on its own
    pub fn is_scroll_end(&self) -> bool {
        matches!(
            self,
            SurfaceEvent::DragEnded {
                will_decelerate: false
            } | SurfaceEvent::DecelerationEnded
                | SurfaceEvent::ScrollAnimationEnded
        )
    }
}

new_key_type! {
    /// Handle returned by [`Observers::subscribe`]
    pub struct SubscriptionId;
}

/// Callback invoked for every surface event
pub type SurfaceCallback = Box<dyn FnMut(&SurfaceEvent)>;

/// Subscription list embedded in every scroll surface
pub struct Observers {
    callbacks: SlotMap<SubscriptionId, SurfaceCallback>,
}

impl Observers {
    pub fn new() -> Self {
        Self {
            callbacks: SlotMap::with_key(),
        }
    }

    /// Register a callback
    pub fn subscribe(&mut self, callback: SurfaceCallback) -> SubscriptionId {
        self.callbacks.insert(callback)
    }

    /// Remove a callback. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.callbacks.remove(id).is_some()
    }

    /// Deliver an event to every subscriber
    pub fn emit(&mut self, event: SurfaceEvent) {
        for (_, callback) in self.callbacks.iter_mut() {
            callback(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl Default for Observers {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("subscribers", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_emit_reaches_all_subscribers_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut observers = Observers::new();

        let first = log.clone();
        observers.subscribe(Box::new(move |e: &SurfaceEvent| first.borrow_mut().push(("a", *e))));
        let second = log.clone();
        observers.subscribe(Box::new(move |e: &SurfaceEvent| second.borrow_mut().push(("b", *e))));

        observers.emit(SurfaceEvent::DecelerationEnded);

        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].0, "a");
        assert_eq!(log[1].0, "b");
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut observers = Observers::new();

        let c = count.clone();
        let id = observers.subscribe(Box::new(move |_: &SurfaceEvent| *c.borrow_mut() += 1));

        observers.emit(SurfaceEvent::DragBegan);
        assert!(observers.unsubscribe(id));
        assert!(!observers.unsubscribe(id));
        observers.emit(SurfaceEvent::DragBegan);

        assert_eq!(*count.borrow(), 1);
        assert!(observers.is_empty());
    }

    #[test]
    fn test_scroll_end_classification() {
        assert!(SurfaceEvent::DecelerationEnded.is_scroll_end());
        assert!(SurfaceEvent::ScrollAnimationEnded.is_scroll_end());
        assert!(SurfaceEvent::DragEnded {
            will_decelerate: false
        }
        .is_scroll_end());
        assert!(!SurfaceEvent::DragEnded {
            will_decelerate: true
        }
        .is_scroll_end());
        assert!(!SurfaceEvent::OffsetChanged {
            offset: Point::ZERO
        }
        .is_scroll_end());
    }
}
