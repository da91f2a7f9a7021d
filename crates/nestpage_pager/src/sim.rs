//! Simulated scroll surfaces
//!
//! [`SimSurface`] is an in-memory [`ContentSurface`] with drag, fling,
//! rebound and animated scrolling driven by explicit [`SimSurface::step`]
//! calls. [`SimHarness`] wires a pager, a pool of simulated pages and a
//! recording delegate together so whole gestures can be replayed
//! deterministically.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use nestpage_core::events::event_types::*;
use nestpage_core::{
    Color, EventType, Insets, Observers, Point, Size, StateTracker, StateTransitions,
    SubscriptionId, SurfaceCallback, SurfaceEvent,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::config::PagerConfig;
use crate::host::{HeaderDataProvider, PageProvider, PagerDelegate, ViewToken};
use crate::pager::NestedPager;
use crate::surface::{ContentSurface, SurfaceHandle};

/// Momentum friction in points/second²
pub const DECELERATION: f32 = 1500.0;
/// Momentum stops below this speed (points/second)
pub const VELOCITY_THRESHOLD: f32 = 10.0;
/// Length of an animated `set_offset`
pub const ANIMATION_DURATION: Duration = Duration::from_millis(300);
/// Fraction of the remaining distance covered per second while rebounding or
/// paging
const SETTLE_RATE: f32 = 12.0;
/// Rebound and paging snap to their target within this distance
const SNAP_DISTANCE: f32 = 0.5;

/// Motion phase of a simulated surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionPhase {
    #[default]
    Idle,
    Dragging,
    Decelerating,
    Animating,
}

impl StateTransitions for MotionPhase {
    fn on_event(&self, event: EventType) -> Option<Self> {
        use MotionPhase::*;
        match (self, event) {
            (Idle | Decelerating | Animating, DRAG_BEGIN) => Some(Dragging),
            (Dragging, DRAG_END) => Some(Idle),
            (Dragging, DECELERATION_BEGIN) => Some(Decelerating),
            (Decelerating, DECELERATION_END) => Some(Idle),
            (Idle | Dragging | Decelerating, SCROLL_ANIMATION_BEGIN) => Some(Animating),
            (Animating, SCROLL_ANIMATION_END) => Some(Idle),
            (Decelerating | Animating, MOTION_STOPPED) => Some(Idle),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct SimAnimation {
    from: Point,
    to: Point,
    elapsed: f32,
    duration: f32,
}

/// In-memory scroll surface
pub struct SimSurface {
    offset: Point,
    content_size: Size,
    viewport: Size,
    inset: Insets,
    frame_top: f32,
    background: Color,
    paging: bool,
    velocity: Point,
    settle_target: Option<Point>,
    animation: Option<SimAnimation>,
    phase: StateTracker<MotionPhase>,
    in_flight: Option<Duration>,
    observers: Observers,
}

impl SimSurface {
    pub fn new(viewport: Size, content_size: Size) -> Self {
        Self {
            offset: Point::ZERO,
            content_size,
            viewport,
            inset: Insets::ZERO,
            frame_top: 0.0,
            background: Color::WHITE,
            paging: false,
            velocity: Point::ZERO,
            settle_target: None,
            animation: None,
            phase: StateTracker::new(MotionPhase::Idle),
            in_flight: None,
            observers: Observers::new(),
        }
    }

    pub fn with_frame_top(mut self, frame_top: f32) -> Self {
        self.frame_top = frame_top;
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    /// Releases snap to whole viewport widths
    pub fn with_paging(mut self, paging: bool) -> Self {
        self.paging = paging;
        self
    }

    pub fn shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    pub fn phase(&self) -> MotionPhase {
        self.phase.current()
    }

    pub fn is_idle(&self) -> bool {
        self.phase.is_in(MotionPhase::Idle)
    }

    pub fn velocity(&self) -> Point {
        self.velocity
    }

    pub fn phase_history(&self) -> &[(MotionPhase, MotionPhase)] {
        self.phase.history()
    }

    /// Pretend a host animation is driving the surface
    pub fn set_in_flight_animation(&mut self, duration: Option<Duration>) {
        self.in_flight = duration;
    }

    /// Resting bounds of the offset
    pub fn offset_bounds(&self) -> (Point, Point) {
        let min = Point::new(-self.inset.left, -self.inset.top);
        let max = Point::new(
            (self.content_size.width - self.viewport.width + self.inset.right).max(min.x),
            (self.content_size.height - self.viewport.height + self.inset.bottom).max(min.y),
        );
        (min, max)
    }

    /// Put a finger down. Cancels any motion in progress.
    pub fn begin_drag(&mut self) {
        if self.phase.is_in(MotionPhase::Dragging) {
            return;
        }
        self.velocity = Point::ZERO;
        self.settle_target = None;
        self.animation = None;
        self.phase.send(DRAG_BEGIN);
        self.observers.emit(SurfaceEvent::DragBegan);
    }

    /// Move the content offset by `delta` under the finger
    pub fn drag_by(&mut self, delta: Point) {
        self.begin_drag();
        let next = Point::new(self.offset.x + delta.x, self.offset.y + delta.y);
        self.move_to(next);
    }

    /// Lift the finger with the given offset velocity (points/second)
    pub fn release(&mut self, velocity: Point) {
        if !self.phase.is_in(MotionPhase::Dragging) {
            return;
        }

        let (min, max) = self.offset_bounds();
        let clamped = clamp_point(self.offset, min, max);

        if self.paging {
            let target = clamp_point(self.page_target(velocity.x), min, max);
            if target != self.offset {
                self.settle_target = Some(target);
            }
        } else if clamped != self.offset {
            self.settle_target = Some(clamped);
        } else if velocity.x.abs() > VELOCITY_THRESHOLD || velocity.y.abs() > VELOCITY_THRESHOLD {
            self.velocity = velocity;
        }

        let will_decelerate = self.settle_target.is_some() || self.velocity != Point::ZERO;
        if will_decelerate {
            self.phase.send(DECELERATION_BEGIN);
        } else {
            self.phase.send(DRAG_END);
        }
        self.observers.emit(SurfaceEvent::DragEnded { will_decelerate });
    }

    /// Touch, then release immediately with `velocity`
    pub fn fling(&mut self, velocity: Point) {
        self.begin_drag();
        self.release(velocity);
    }

    /// Advance motion by `dt`. Returns true while still moving.
    pub fn step(&mut self, dt: Duration) -> bool {
        let secs = dt.as_secs_f32();
        match self.phase.current() {
            MotionPhase::Idle | MotionPhase::Dragging => false,
            MotionPhase::Animating => self.step_animation(secs),
            MotionPhase::Decelerating => self.step_deceleration(secs),
        }
    }

    /// Jump a running animated scroll to its end
    pub fn finish_animation(&mut self) -> bool {
        match self.animation.take() {
            Some(animation) => {
                self.complete_animation(animation.to);
                true
            }
            None => false,
        }
    }

    fn page_target(&self, velocity_x: f32) -> Point {
        let width = self.viewport.width;
        if width <= 0.0 {
            return self.offset;
        }
        let position = self.offset.x / width;
        let page = if velocity_x > VELOCITY_THRESHOLD {
            position.ceil()
        } else if velocity_x < -VELOCITY_THRESHOLD {
            position.floor()
        } else {
            position.round()
        };
        Point::new(page * width, self.offset.y)
    }

    fn step_animation(&mut self, secs: f32) -> bool {
        let Some(mut animation) = self.animation.take() else {
            self.phase.send(SCROLL_ANIMATION_END);
            self.observers.emit(SurfaceEvent::ScrollAnimationEnded);
            return false;
        };

        animation.elapsed += secs;
        let t = (animation.elapsed / animation.duration).min(1.0);
        if t >= 1.0 {
            self.complete_animation(animation.to);
            return false;
        }

        // Ease out cubic
        let eased = 1.0 - (1.0 - t).powi(3);
        let next = Point::new(
            animation.from.x + (animation.to.x - animation.from.x) * eased,
            animation.from.y + (animation.to.y - animation.from.y) * eased,
        );
        self.animation = Some(animation);
        self.move_to(next);
        true
    }

    fn complete_animation(&mut self, to: Point) {
        self.move_to(to);
        self.phase.send(SCROLL_ANIMATION_END);
        self.observers.emit(SurfaceEvent::ScrollAnimationEnded);
    }

    fn step_deceleration(&mut self, secs: f32) -> bool {
        if let Some(target) = self.settle_target {
            let k = (secs * SETTLE_RATE).min(1.0);
            let next = Point::new(
                self.offset.x + (target.x - self.offset.x) * k,
                self.offset.y + (target.y - self.offset.y) * k,
            );
            if (target.x - next.x).abs() < SNAP_DISTANCE && (target.y - next.y).abs() < SNAP_DISTANCE
            {
                self.move_to(target);
                self.end_deceleration();
                return false;
            }
            self.move_to(next);
            return true;
        }

        let next = Point::new(
            self.offset.x + self.velocity.x * secs,
            self.offset.y + self.velocity.y * secs,
        );

        let decel = DECELERATION * secs;
        self.velocity.x = apply_friction(self.velocity.x, decel);
        self.velocity.y = apply_friction(self.velocity.y, decel);

        let (min, max) = self.offset_bounds();
        let clamped = clamp_point(next, min, max);
        if clamped != next {
            self.velocity = Point::ZERO;
            self.move_to(clamped);
            self.end_deceleration();
            return false;
        }

        self.move_to(next);

        if self.velocity.x.abs() < VELOCITY_THRESHOLD && self.velocity.y.abs() < VELOCITY_THRESHOLD {
            self.velocity = Point::ZERO;
            self.end_deceleration();
            return false;
        }
        true
    }

    fn end_deceleration(&mut self) {
        self.settle_target = None;
        self.phase.send(DECELERATION_END);
        self.observers.emit(SurfaceEvent::DecelerationEnded);
    }

    fn move_to(&mut self, next: Point) {
        if next != self.offset {
            self.offset = next;
            self.observers
                .emit(SurfaceEvent::OffsetChanged { offset: next });
        }
    }
}

fn apply_friction(velocity: f32, decel: f32) -> f32 {
    if velocity > 0.0 {
        (velocity - decel).max(0.0)
    } else if velocity < 0.0 {
        (velocity + decel).min(0.0)
    } else {
        0.0
    }
}

fn clamp_point(point: Point, min: Point, max: Point) -> Point {
    Point::new(point.x.clamp(min.x, max.x), point.y.clamp(min.y, max.y))
}

impl ContentSurface for SimSurface {
    fn offset(&self) -> Point {
        self.offset
    }

    fn set_offset(&mut self, offset: Point, animated: bool) {
        if animated {
            if offset == self.offset {
                return;
            }
            self.velocity = Point::ZERO;
            self.settle_target = None;
            self.animation = Some(SimAnimation {
                from: self.offset,
                to: offset,
                elapsed: 0.0,
                duration: ANIMATION_DURATION.as_secs_f32(),
            });
            if !self.phase.is_in(MotionPhase::Animating) {
                self.phase.send(SCROLL_ANIMATION_BEGIN);
            }
            return;
        }

        if self.animation.take().is_some() {
            self.phase.send(MOTION_STOPPED);
        }
        self.move_to(offset);
    }

    fn content_size(&self) -> Size {
        self.content_size
    }

    fn set_content_size(&mut self, size: Size) {
        if size != self.content_size {
            self.content_size = size;
            self.observers.emit(SurfaceEvent::SizeChanged { size });
        }
    }

    fn viewport_size(&self) -> Size {
        self.viewport
    }

    fn inset(&self) -> Insets {
        self.inset
    }

    fn set_inset(&mut self, inset: Insets) {
        self.inset = inset;
    }

    fn frame_top(&self) -> f32 {
        self.frame_top
    }

    fn is_dragging(&self) -> bool {
        self.phase.is_in(MotionPhase::Dragging)
    }

    fn is_decelerating(&self) -> bool {
        self.phase.is_in(MotionPhase::Decelerating)
    }

    fn is_scroll_animating(&self) -> bool {
        self.phase.is_in(MotionPhase::Animating)
    }

    fn background(&self) -> Color {
        self.background
    }

    fn stop_motion(&mut self) {
        self.velocity = Point::ZERO;
        self.settle_target = None;
        self.animation = None;
        self.phase.send(MOTION_STOPPED);
    }

    fn in_flight_animation(&self) -> Option<Duration> {
        self.in_flight
    }

    fn subscribe(&mut self, callback: SurfaceCallback) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }
}

// ============================================================================
// Providers
// ============================================================================

struct PagePool {
    viewport: Size,
    frame_top: f32,
    content_heights: Vec<f32>,
    backgrounds: FxHashMap<usize, Color>,
    preload: FxHashSet<usize>,
    preload_all: bool,
    unavailable: FxHashSet<usize>,
    surfaces: FxHashMap<usize, Rc<RefCell<SimSurface>>>,
    requests: FxHashMap<usize, u32>,
}

/// Page provider backed by simulated surfaces.
///
/// Clones share the same pool, so a test can keep one clone to drive the
/// surfaces after handing another to the pager.
#[derive(Clone)]
pub struct SimPages {
    pool: Rc<RefCell<PagePool>>,
}

impl SimPages {
    pub fn new(count: usize, viewport: Size, content_height: f32) -> Self {
        Self {
            pool: Rc::new(RefCell::new(PagePool {
                viewport,
                frame_top: 0.0,
                content_heights: vec![content_height; count],
                backgrounds: FxHashMap::default(),
                preload: FxHashSet::default(),
                preload_all: false,
                unavailable: FxHashSet::default(),
                surfaces: FxHashMap::default(),
                requests: FxHashMap::default(),
            })),
        }
    }

    /// Top edge of every page in container space
    pub fn with_frame_top(self, frame_top: f32) -> Self {
        self.pool.borrow_mut().frame_top = frame_top;
        self
    }

    pub fn with_content_height(self, index: usize, height: f32) -> Self {
        if let Some(slot) = self.pool.borrow_mut().content_heights.get_mut(index) {
            *slot = height;
        }
        self
    }

    pub fn with_background(self, index: usize, color: Color) -> Self {
        self.pool.borrow_mut().backgrounds.insert(index, color);
        self
    }

    pub fn with_preload(self, index: usize) -> Self {
        self.pool.borrow_mut().preload.insert(index);
        self
    }

    pub fn with_preload_all(self) -> Self {
        self.pool.borrow_mut().preload_all = true;
        self
    }

    /// Make `page_at(index)` return nothing
    pub fn mark_unavailable(&self, index: usize) {
        self.pool.borrow_mut().unavailable.insert(index);
    }

    /// Most recently created surface for a page
    pub fn surface(&self, index: usize) -> Option<Rc<RefCell<SimSurface>>> {
        self.pool.borrow().surfaces.get(&index).cloned()
    }

    /// Every surface created so far, by page index
    pub fn surfaces(&self) -> Vec<(usize, Rc<RefCell<SimSurface>>)> {
        let pool = self.pool.borrow();
        let mut surfaces: Vec<_> = pool
            .surfaces
            .iter()
            .map(|(index, surface)| (*index, surface.clone()))
            .collect();
        surfaces.sort_by_key(|(index, _)| *index);
        surfaces
    }

    /// How many times the pager asked for a page
    pub fn requests(&self, index: usize) -> u32 {
        self.pool.borrow().requests.get(&index).copied().unwrap_or(0)
    }
}

impl PageProvider for SimPages {
    fn count(&self) -> usize {
        self.pool.borrow().content_heights.len()
    }

    fn page_at(&mut self, index: usize) -> Option<SurfaceHandle> {
        let mut pool = self.pool.borrow_mut();
        *pool.requests.entry(index).or_insert(0) += 1;
        if pool.unavailable.contains(&index) {
            return None;
        }
        let height = *pool.content_heights.get(index)?;
        let background = pool
            .backgrounds
            .get(&index)
            .copied()
            .unwrap_or(Color::WHITE);
        let surface = SimSurface::new(pool.viewport, Size::new(pool.viewport.width, height))
            .with_frame_top(pool.frame_top)
            .with_background(background)
            .shared();
        pool.surfaces.insert(index, surface.clone());
        Some(surface)
    }

    fn should_preload(&self, index: usize, current_index: usize) -> bool {
        let pool = self.pool.borrow();
        pool.preload_all || index == current_index || pool.preload.contains(&index)
    }
}

/// Header provider with fixed metrics
#[derive(Debug, Clone, Copy)]
pub struct SimHeader {
    pub cover_height: f32,
    pub tab_height: f32,
}

impl SimHeader {
    pub const COVER_VIEW: ViewToken = ViewToken(1);
    pub const TAB_STRIP_VIEW: ViewToken = ViewToken(2);

    pub fn new(cover_height: f32, tab_height: f32) -> Self {
        Self {
            cover_height,
            tab_height,
        }
    }
}

impl HeaderDataProvider for SimHeader {
    fn cover_height(&self) -> f32 {
        self.cover_height
    }

    fn tab_height(&self) -> f32 {
        self.tab_height
    }

    fn cover_view(&mut self) -> Option<ViewToken> {
        Some(Self::COVER_VIEW)
    }

    fn tab_strip_view(&mut self) -> Option<ViewToken> {
        Some(Self::TAB_STRIP_VIEW)
    }
}

/// A delegate notification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    PageSettled {
        index: usize,
    },
    VerticalScroll {
        page: usize,
        header_offset: f32,
        is_stuck: bool,
    },
}

/// Delegate that records every notification. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingDelegate {
    log: Rc<RefCell<Vec<Notification>>>,
}

impl RecordingDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.log.borrow().clone()
    }

    pub fn settled_pages(&self) -> Vec<usize> {
        self.log
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::PageSettled { index } => Some(*index),
                _ => None,
            })
            .collect()
    }

    pub fn last_vertical(&self) -> Option<Notification> {
        self.log
            .borrow()
            .iter()
            .rev()
            .find(|n| matches!(n, Notification::VerticalScroll { .. }))
            .copied()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl PagerDelegate for RecordingDelegate {
    fn on_page_settled(&mut self, index: usize) {
        self.log
            .borrow_mut()
            .push(Notification::PageSettled { index });
    }

    fn on_vertical_scroll(&mut self, page: usize, header_offset: f32, is_stuck: bool) {
        self.log.borrow_mut().push(Notification::VerticalScroll {
            page,
            header_offset,
            is_stuck,
        });
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Shape of a simulated pager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimLayout {
    pub page_count: usize,
    pub width: f32,
    pub height: f32,
    pub content_height: f32,
    pub cover_height: f32,
    pub tab_height: f32,
    /// Top edge of the pages in container space
    pub frame_top: f32,
    pub preload_all: bool,
    /// Simulation frame length in milliseconds
    pub frame_ms: u64,
}

impl Default for SimLayout {
    fn default() -> Self {
        Self {
            page_count: 3,
            width: 300.0,
            height: 600.0,
            content_height: 2000.0,
            cover_height: 100.0,
            tab_height: 40.0,
            frame_top: 0.0,
            preload_all: false,
            frame_ms: 16,
        }
    }
}

/// A pager wired to simulated surfaces
pub struct SimHarness {
    pub pager: NestedPager,
    pub pager_surface: Rc<RefCell<SimSurface>>,
    pub pages: SimPages,
    pub delegate: RecordingDelegate,
    frame: Duration,
}

impl SimHarness {
    /// Build and rebuild a pager for `layout`
    pub fn new(layout: &SimLayout, config: PagerConfig) -> Self {
        let mut pages = SimPages::new(
            layout.page_count,
            Size::new(layout.width, layout.height),
            layout.content_height,
        )
        .with_frame_top(layout.frame_top);
        if layout.preload_all {
            pages = pages.with_preload_all();
        }
        Self::with_pages(layout, config, pages)
    }

    /// Build around a prepared page pool
    pub fn with_pages(layout: &SimLayout, config: PagerConfig, pages: SimPages) -> Self {
        let viewport = Size::new(layout.width, layout.height);
        let pager_surface = SimSurface::new(viewport, viewport)
            .with_paging(true)
            .shared();
        let delegate = RecordingDelegate::new();
        let handle: SurfaceHandle = pager_surface.clone();

        let mut pager = NestedPager::new(
            config,
            handle,
            Box::new(pages.clone()),
            Box::new(SimHeader::new(layout.cover_height, layout.tab_height)),
        )
        .with_delegate(Box::new(delegate.clone()));
        pager.rebuild();

        Self {
            pager,
            pager_surface,
            pages,
            delegate,
            frame: Duration::from_millis(layout.frame_ms.max(1)),
        }
    }

    pub fn frame(&self) -> Duration {
        self.frame
    }

    /// Surface of a mounted or previously mounted page
    pub fn page(&self, index: usize) -> Option<Rc<RefCell<SimSurface>>> {
        self.pages.surface(index)
    }

    pub fn page_offset(&self, index: usize) -> Option<f32> {
        let page = self.page(index)?;
        let y = page.borrow().offset().y;
        Some(y)
    }

    /// Drag a page's content by `dy` and deliver the resulting events
    pub fn drag_page(&mut self, index: usize, dy: f32) -> bool {
        let Some(page) = self.page(index) else {
            return false;
        };
        page.borrow_mut().drag_by(Point::new(0.0, dy));
        self.pager.pump();
        true
    }

    pub fn release_page(&mut self, index: usize, velocity_y: f32) -> bool {
        let Some(page) = self.page(index) else {
            return false;
        };
        page.borrow_mut().release(Point::new(0.0, velocity_y));
        self.pager.pump();
        true
    }

    pub fn fling_page(&mut self, index: usize, velocity_y: f32) -> bool {
        let Some(page) = self.page(index) else {
            return false;
        };
        page.borrow_mut().fling(Point::new(0.0, velocity_y));
        self.pager.pump();
        true
    }

    /// Drag the pager horizontally by `dx`
    pub fn swipe_pager(&mut self, dx: f32) {
        self.pager_surface
            .borrow_mut()
            .drag_by(Point::new(dx, 0.0));
        self.pager.pump();
    }

    pub fn release_pager(&mut self, velocity_x: f32) {
        self.pager_surface
            .borrow_mut()
            .release(Point::new(velocity_x, 0.0));
        self.pager.pump();
    }

    pub fn finish_pager_animation(&mut self) -> bool {
        let finished = self.pager_surface.borrow_mut().finish_animation();
        self.pager.pump();
        finished
    }

    /// Advance every surface and the pager clock by one frame
    pub fn step(&mut self) {
        let dt = self.frame;
        self.pager_surface.borrow_mut().step(dt);
        for (_, page) in self.pages.surfaces() {
            page.borrow_mut().step(dt);
        }
        self.pager.tick(dt);
    }

    /// Step for at least `duration`. Returns the number of frames run.
    pub fn run_for(&mut self, duration: Duration) -> u32 {
        let mut elapsed = Duration::ZERO;
        let mut frames = 0;
        while elapsed < duration {
            self.step();
            elapsed += self.frame;
            frames += 1;
        }
        frames
    }

    /// True when no surface moves and no deferred task is pending. A page held
    /// under a finger counts as idle.
    pub fn is_idle(&self) -> bool {
        self.pager_surface.borrow().is_idle()
            && self
                .pages
                .surfaces()
                .iter()
                .all(|(_, page)| page.borrow().is_idle() || page.borrow().is_dragging())
            && !self.pager.has_pending_tasks()
    }

    /// Step until idle or until `limit` has elapsed. Returns true if idle.
    pub fn run_until_idle(&mut self, limit: Duration) -> bool {
        let mut elapsed = Duration::ZERO;
        while !self.is_idle() {
            if elapsed >= limit {
                return false;
            }
            self.step();
            elapsed += self.frame;
        }
        true
    }
}
