//! Scroll surface abstraction
//!
//! Both the horizontal pager and every page's vertical content are
//! [`ContentSurface`]s. The pager never owns a surface exclusively; it holds a
//! shared [`SurfaceHandle`] and observes it through an explicit subscription.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use nestpage_core::{Color, Insets, Point, Size, SubscriptionId, SurfaceCallback};

/// Shared, single-threaded handle to a scroll surface
pub type SurfaceHandle = Rc<RefCell<dyn ContentSurface>>;

/// A scrollable region.
///
/// Offsets follow the usual inset convention: `offset.y == -inset.top` is the
/// resting top position. Implementations must report every offset and content
/// size change to their subscribers, in order, after the new value is visible
/// through the getters.
pub trait ContentSurface {
    fn offset(&self) -> Point;

    /// Move the content. An animated move reports intermediate offsets and
    /// finishes with [`SurfaceEvent::ScrollAnimationEnded`](nestpage_core::SurfaceEvent).
    fn set_offset(&mut self, offset: Point, animated: bool);

    fn content_size(&self) -> Size;

    fn set_content_size(&mut self, size: Size);

    /// Visible size of the surface
    fn viewport_size(&self) -> Size;

    fn inset(&self) -> Insets;

    fn set_inset(&mut self, inset: Insets);

    /// Top edge of the surface in the pager's container space
    fn frame_top(&self) -> f32;

    fn is_dragging(&self) -> bool;

    fn is_decelerating(&self) -> bool;

    /// True while a programmatic animated scroll is running
    fn is_scroll_animating(&self) -> bool {
        false
    }

    /// Pulled past the top resting position
    fn is_top_bouncing(&self) -> bool {
        self.offset().y < -self.inset().top
    }

    /// Pushed past the bottom resting position
    fn is_bottom_bouncing(&self) -> bool {
        let max_y = self.content_size().height - self.viewport_size().height + self.inset().bottom;
        self.offset().y > max_y
    }

    fn is_vertical_bouncing(&self) -> bool {
        self.is_top_bouncing() || self.is_bottom_bouncing()
    }

    /// Background used to paint the transition mask
    fn background(&self) -> Color {
        Color::TRANSPARENT
    }

    /// Halt any inertial or animated motion in place
    fn stop_motion(&mut self);

    /// Duration of a host animation currently driving this surface, if any.
    ///
    /// Hosts that animate offsets outside of [`ContentSurface::set_offset`]
    /// (for example a pull-to-refresh collapse) report it here so header
    /// reparenting can wait for it to finish.
    fn in_flight_animation(&self) -> Option<Duration> {
        None
    }

    fn subscribe(&mut self, callback: SurfaceCallback) -> SubscriptionId;

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

/// Scroll position that puts the content at its top resting position
pub fn top_offset(surface: &dyn ContentSurface) -> Point {
    Point::new(surface.offset().x, -surface.inset().top)
}
