//! Scroll coordination
//!
//! The coordinator turns surface events into header placement:
//!
//! - **Vertical passes** run for offset changes of the current page. They
//!   resolve the stick state, move the pin, reparent the header and drag every
//!   other mounted page along with the pin.
//! - **Horizontal passes** run for pager offset changes. They freeze the
//!   header in the fixed container for the duration of the swipe and promote
//!   the new page once the pager settles on a page boundary.
//!
//! Only gesture memory lives here; everything shared is reached through the
//! [`PagerContext`] passed into each call.

use nestpage_core::{approx_eq, Point, Size, StateTracker, TaskId};
use serde::{Deserialize, Serialize};

use crate::pager::PagerContext;
use crate::surface::{ContentSurface, SurfaceHandle};

/// Largest distance from a page boundary that still counts as settled
pub const SETTLE_EPSILON: f32 = 0.01;

/// Header stick state for a vertical pass
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StickState {
    /// Header scrolls with the content
    #[default]
    Free,
    /// Header parked mid-travel after a page switch, resumes on upward motion
    PartialStick,
    /// Cover scrolled away up to the sticky offset
    FullStick,
}

impl StickState {
    /// Stick state for a content offset. `keeps_stick` wins over the offset.
    pub fn resolve(offset_y: f32, sticky_offset: f32, tab_height: f32, keeps_stick: bool) -> Self {
        if keeps_stick {
            StickState::PartialStick
        } else if offset_y >= -tab_height - sticky_offset {
            StickState::FullStick
        } else {
            StickState::Free
        }
    }
}

/// Page index the pager rests on, if `offset_x` is within
/// [`SETTLE_EPSILON`] of a boundary inside `0..page_count`
pub fn settled_index(offset_x: f32, page_width: f32, page_count: usize) -> Option<usize> {
    if !offset_x.is_finite() || !page_width.is_finite() || page_width <= 0.0 {
        return None;
    }
    let index = (offset_x / page_width + 0.5).floor();
    if (offset_x - index * page_width).abs() >= SETTLE_EPSILON {
        return None;
    }
    if index < 0.0 || index >= page_count as f32 {
        return None;
    }
    Some(index as usize)
}

/// Work postponed to a later tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Deferred {
    /// Re-host a parked header on its page once deceleration is over
    PartialStickRecheck { page: usize, epoch: u64 },
    /// Re-host the header after a host animation finished
    ReattachAfterAnimation,
}

pub(crate) struct ScrollCoordinator {
    last_y: f32,
    horizontal_scrolling: bool,
    /// Page that was current when the horizontal gesture began
    last_surface: Option<(usize, SurfaceHandle)>,
    waiting_for_animation: bool,
    reattach_task: Option<TaskId>,
    recheck_task: Option<TaskId>,
    last_settled: Option<usize>,
    stick: StateTracker<StickState>,
    is_stuck: bool,
}

impl ScrollCoordinator {
    pub fn new() -> Self {
        Self {
            last_y: 0.0,
            horizontal_scrolling: false,
            last_surface: None,
            waiting_for_animation: false,
            reattach_task: None,
            recheck_task: None,
            last_settled: None,
            stick: StateTracker::new(StickState::Free),
            is_stuck: false,
        }
    }

    pub fn reset(&mut self) {
        self.last_y = 0.0;
        self.last_surface = None;
    }

    /// Drop scheduled work along with the gesture memory
    pub fn clear(&mut self) {
        self.reset();
        self.horizontal_scrolling = false;
        self.waiting_for_animation = false;
        self.reattach_task = None;
        self.recheck_task = None;
    }

    /// Forget a page that is being unloaded
    pub fn forget_page(&mut self, index: usize) {
        if matches!(self.last_surface, Some((last, _)) if last == index) {
            self.last_surface = None;
        }
    }

    pub fn is_stuck(&self) -> bool {
        self.is_stuck
    }

    pub fn stick_state(&self) -> StickState {
        self.stick.current()
    }

    pub fn stick_history(&self) -> &[(StickState, StickState)] {
        self.stick.history()
    }

    pub fn is_horizontal_scrolling(&self) -> bool {
        self.horizontal_scrolling
    }

    // ========================================================================
    // Vertical
    // ========================================================================

    /// Run a vertical pass for an offset change of page `index`. The pass
    /// works from the offset the event carried, not the live one.
    pub fn handle_vertical(&mut self, ctx: &mut PagerContext, index: usize, offset: Point) {
        if self.horizontal_scrolling || index != ctx.registry.current_index() {
            return;
        }
        let Some(surface) = ctx.registry.current_surface() else {
            return;
        };
        ctx.pass_offset = Some((index, offset.y));
        self.vertical_pass(ctx, &surface, index, offset.y);
        ctx.pass_offset = None;
    }

    fn vertical_pass(
        &mut self,
        ctx: &mut PagerContext,
        surface: &SurfaceHandle,
        index: usize,
        y: f32,
    ) {
        let inset_top = surface.borrow().inset().top;

        let geometry = *ctx.header.geometry();
        let header_height = geometry.header_height;
        if !approx_eq(inset_top, header_height) {
            tracing::trace!(
                "page {} inset {} does not match header height {}",
                index,
                inset_top,
                header_height
            );
            return;
        }

        let top = ctx.surface_top();

        if ctx.config.header_always_fixed {
            ctx.header.adjust_pin_y(top);
            ctx.header.move_header_to_fixed_by_pin(top);
            return;
        }

        let supplementary = y + header_height;
        if supplementary <= ctx.header.overflow_pin_height() {
            ctx.header.set_keeps_stick(false);
        }

        let state = StickState::resolve(
            y,
            geometry.sticky_offset,
            geometry.tab_height,
            ctx.header.keeps_stick(),
        );
        let previous = self.stick.current();
        if self.stick.set(state) {
            tracing::debug!("stick state {:?} -> {:?} at y {}", previous, state, y);
        }

        match state {
            StickState::PartialStick => self.partial_stick(ctx, surface, index, y, top),
            StickState::FullStick => self.full_stick(ctx, surface, y, top),
            StickState::Free => self.free(ctx, surface, index, y, top),
        }

        self.sync_other_pages(ctx, index, top);

        self.is_stuck = ctx.header.is_stuck(top);
        let header_offset = top - ctx.header_absolute_y();
        tracing::trace!(
            "vertical pass page {} y {} pin {} header {:?}@{}",
            index,
            y,
            ctx.header.pin_y(),
            ctx.header.host(),
            ctx.header.header_y()
        );
        ctx.notify_vertical_scroll(index, header_offset, self.is_stuck);

        self.last_y = y;
    }

    fn partial_stick(
        &mut self,
        ctx: &mut PagerContext,
        surface: &SurfaceHandle,
        index: usize,
        y: f32,
        top: f32,
    ) {
        let may_move_up = !ctx.config.header_moves_only_when_touching_header_during_hover
            || ctx.header_touched;

        if y >= self.last_y && may_move_up {
            // Moving up: the header rides on the page, the pin follows it
            let pin = ctx.header_absolute_y();
            ctx.header.adjust_pin_y(pin);
            if pin <= ctx.header.full_stick_pin(top) {
                self.full_stick(ctx, surface, y, top);
            }
            let overflow = -(ctx.header.pin_y() - top);
            ctx.header.set_overflow_pin_height(overflow);
            ctx.move_header_to_page_by_pin(index);
            return;
        }

        let (decelerating, bouncing) = {
            let s = surface.borrow();
            (s.is_decelerating(), s.is_vertical_bouncing())
        };
        if decelerating && !bouncing {
            // Keep the parked header interactive while the page coasts
            ctx.header.move_header_to_fixed_by_pin(top);
            if let Some(epoch) = ctx.registry.slot(index).map(|slot| slot.epoch) {
                if let Some(stale) = self.recheck_task.take() {
                    ctx.scheduler.cancel(stale);
                }
                self.recheck_task = Some(
                    ctx.scheduler
                        .schedule_next_tick(Deferred::PartialStickRecheck { page: index, epoch }),
                );
            }
        } else {
            ctx.move_header_to_page_by_pin(index);
        }
    }

    fn full_stick(&mut self, ctx: &mut PagerContext, surface: &SurfaceHandle, y: f32, top: f32) {
        let target = ctx.header.full_stick_pin(top);
        let tab_height = ctx.header.geometry().tab_height;
        let decelerating = surface.borrow().is_decelerating();

        if decelerating
            && ctx.header.pin_y() > target
            && ctx.config.interrupts_scrolling_when_transitioning_to_full_stick
            && y > -tab_height
        {
            tracing::debug!("interrupting deceleration at full stick (y {})", y);
            let mut s = surface.borrow_mut();
            let x = s.offset().x;
            s.stop_motion();
            s.set_offset(Point::new(x, -tab_height), false);
            if let Some((_, pass_y)) = ctx.pass_offset.as_mut() {
                *pass_y = -tab_height;
            }
        }

        ctx.header.adjust_pin_y(target);
        ctx.header.move_header_to_fixed_by_pin(top);
    }

    fn free(
        &mut self,
        ctx: &mut PagerContext,
        surface: &SurfaceHandle,
        index: usize,
        y: f32,
        top: f32,
    ) {
        let header_height = ctx.header.header_height();

        // The pin does not follow a pull past the top
        let pin = if y <= -header_height {
            top
        } else {
            -(y + header_height) + top
        };
        ctx.header.adjust_pin_y(pin);

        if ctx.config.header_bounces {
            ctx.move_header_to_page_at(index, 0.0);
        } else if y < -header_height {
            ctx.header.move_header_to_fixed_by_pin(top);
        } else {
            let in_flight = surface
                .borrow()
                .in_flight_animation()
                .filter(|duration| !duration.is_zero());
            if let Some(duration) = in_flight {
                self.waiting_for_animation = true;
                if let Some(stale) = self.reattach_task.take() {
                    ctx.scheduler.cancel(stale);
                }
                tracing::debug!("header reattach deferred by {:?}", duration);
                self.reattach_task = Some(
                    ctx.scheduler
                        .schedule_after(duration, Deferred::ReattachAfterAnimation),
                );
            } else if !self.waiting_for_animation {
                ctx.move_header_to_page_by_pin(index);
            }
        }
    }

    /// Move every other mounted page by the pin's change since the last pass
    fn sync_other_pages(&mut self, ctx: &mut PagerContext, current: usize, top: f32) {
        let pin = ctx.header.pin_y();
        let delta = pin - ctx.header.previous_pin_y();
        ctx.header.set_previous_pin_y(pin);

        let header_height = ctx.header.header_height();
        let keeps_position = ctx.config.keeps_content_scroll_position;

        for surface in ctx.registry.others(current) {
            let mut s = surface.borrow_mut();
            let offset = s.offset();
            let mut y = offset.y - delta;
            if !keeps_position && delta.abs() > f32::EPSILON {
                y = -((pin - top) + header_height);
            }
            if y < -header_height {
                y = -header_height;
            }
            s.set_offset(offset.with_y(y), false);
        }
    }

    // ========================================================================
    // Horizontal
    // ========================================================================

    pub fn handle_horizontal(&mut self, ctx: &mut PagerContext) {
        if ctx.rotating {
            tracing::trace!("pager scroll ignored while rotating");
            return;
        }

        if !self.horizontal_scrolling {
            tracing::debug!("horizontal gesture began on page {}", ctx.registry.current_index());
        }
        self.horizontal_scrolling = true;

        if self.last_surface.is_none() {
            let current = ctx.registry.current_index();
            self.last_surface = ctx.registry.current_surface().map(|s| (current, s));
        }

        let header_height = ctx.header.header_height();
        let pager_width = ctx.pager.borrow().viewport_size().width;
        let mut followed_y = None;

        if let Some((last_index, last)) = self.last_surface.clone() {
            {
                let mut s = last.borrow_mut();
                // A page wider than the pager scrolls horizontally itself
                if s.is_decelerating()
                    && !s.is_vertical_bouncing()
                    && s.content_size().width <= pager_width
                {
                    tracing::debug!("stopping page {} deceleration", last_index);
                    s.stop_motion();
                }
            }

            let (top_bouncing, offset_y) = {
                let s = last.borrow();
                (s.is_top_bouncing(), s.offset().y)
            };
            if top_bouncing && !ctx.config.header_always_fixed {
                let y = -(offset_y + header_height);
                followed_y = Some(y);
                ctx.notify_vertical_scroll(last_index, -y, false);
            }
        }

        let top = ctx.surface_top();
        let header_y = match followed_y {
            Some(y) => y,
            None => ctx.header_absolute_y() - top,
        };
        ctx.header.move_header_to_fixed_at(header_y);

        if let Some((_, last)) = &self.last_surface {
            let s = last.borrow();
            ctx.header.insert_transition_mask(top, &*s);
        }

        let idle = {
            let pager = ctx.pager.borrow();
            !pager.is_scroll_animating() && !pager.is_dragging() && !pager.is_decelerating()
        };
        if idle {
            self.check_settle(ctx);
        }
    }

    /// Check whether the pager rests on a page boundary and promote that page
    pub fn check_settle(&mut self, ctx: &mut PagerContext) {
        let (x, width) = {
            let pager = ctx.pager.borrow();
            (pager.offset().x, pager.viewport_size().width)
        };
        match settled_index(x, width, ctx.page_count()) {
            Some(index) => self.settle(ctx, index),
            None => tracing::trace!("pager at {} is between pages", x),
        }
    }

    fn settle(&mut self, ctx: &mut PagerContext, index: usize) {
        let current = ctx.registry.current_index();
        if !self.horizontal_scrolling && index == current && self.last_settled == Some(index) {
            tracing::trace!("page {} already settled", index);
            return;
        }

        let geometry = *ctx.header.geometry();

        if index != current {
            ctx.registry.set_current_index(index);
            ctx.load_page(index);
            if !ctx.registry.promote_current() {
                tracing::warn!("page {} settled without a surface", index);
            }

            let top = ctx.surface_top();
            let overflow = -(ctx.header.pin_y() - top);
            ctx.header.set_overflow_pin_height(overflow);
            let offset_y = ctx.current_offset_y();
            ctx.header.set_keeps_stick(
                offset_y + geometry.header_height + geometry.sticky_offset > overflow,
            );
        }

        ctx.move_header_to_page_by_pin(index);
        ctx.notify_page_settled(index);
        self.last_settled = Some(index);

        if let Some((_, last)) = self.last_surface.take() {
            let mut s = last.borrow_mut();
            if s.is_top_bouncing() {
                let x = s.offset().x;
                s.set_offset(Point::new(x, -geometry.header_height), false);
            }
        }

        let current = ctx.registry.current_index();
        self.last_surface = ctx.registry.current_surface().map(|s| (current, s));
        self.last_y = ctx.current_offset_y();
        self.horizontal_scrolling = false;
        ctx.header.remove_transition_mask();
    }

    // ========================================================================
    // Deferred work and content size
    // ========================================================================

    pub fn run_deferred(&mut self, ctx: &mut PagerContext, task: Deferred) {
        match task {
            Deferred::PartialStickRecheck { page, epoch } => {
                self.recheck_task = None;
                if self.horizontal_scrolling || !ctx.registry.epoch_matches(page, epoch) {
                    return;
                }
                let Some(surface) = ctx.registry.surface(page) else {
                    return;
                };
                let (dragging, decelerating) = {
                    let s = surface.borrow();
                    (s.is_dragging(), s.is_decelerating())
                };
                if dragging || !decelerating {
                    let current = ctx.registry.current_index();
                    ctx.move_header_to_page_by_pin(current);
                }
            }
            Deferred::ReattachAfterAnimation => {
                self.reattach_task = None;
                if !self.horizontal_scrolling {
                    let current = ctx.registry.current_index();
                    ctx.move_header_to_page_by_pin(current);
                }
                self.waiting_for_animation = false;
            }
        }
    }

    /// Grow a short page so the header can still reach full stick
    pub fn handle_content_size(&mut self, ctx: &mut PagerContext, index: usize, size: Size) {
        if !ctx.config.auto_adjusts_content_size_minimum_height {
            return;
        }
        let Some(surface) = ctx.registry.surface(index) else {
            return;
        };
        let (busy, inset_bottom) = {
            let s = surface.borrow();
            (s.is_dragging() || s.is_decelerating(), s.inset().bottom)
        };
        if busy {
            return;
        }

        let geometry = *ctx.header.geometry();
        let pager_height = ctx.pager.borrow().viewport_size().height;
        let min_height = pager_height
            - geometry.tab_height
            - ctx.surface_top()
            - inset_bottom
            - geometry.sticky_offset;
        if min_height > size.height {
            tracing::debug!(
                "page {} content height {} raised to {}",
                index,
                size.height,
                min_height
            );
            surface
                .borrow_mut()
                .set_content_size(Size::new(size.width, min_height));
        }
    }
}
