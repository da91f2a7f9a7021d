//! Nested pager
//!
//! [`NestedPager`] owns the shared state of a horizontal pager whose pages are
//! vertical content surfaces sharing one header. Surfaces never call back into
//! the pager directly: their subscriptions only append to an inbox, and
//! [`NestedPager::pump`] drains the inbox in order, one event at a time.
//!
//! ```ignore
//! let mut pager = NestedPager::new(config, pager_surface, pages, header);
//! pager.rebuild();
//!
//! // After the host mutated a surface:
//! pager.pump();
//!
//! // Once per frame:
//! pager.tick(frame_duration);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use nestpage_core::{Insets, Point, Rect, Size, SubscriptionId, SurfaceEvent, TaskScheduler};

use crate::config::PagerConfig;
use crate::coordinator::{Deferred, ScrollCoordinator, StickState};
use crate::error::{PagerError, Result};
use crate::header::{HeaderHost, HeaderState};
use crate::host::{HeaderDataProvider, PageProvider, PagerDelegate};
use crate::registry::{PageRegistry, PageSlot};
use crate::surface::{top_offset, ContentSurface, SurfaceHandle};

/// Upper bound on events handled by a single [`NestedPager::pump`]
const MAX_EVENTS_PER_PUMP: usize = 10_000;

/// Queue shared between the pager and its surface subscriptions
pub(crate) type Inbox = Rc<RefCell<VecDeque<SourcedEvent>>>;

/// Which surface produced an event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SurfaceKey {
    Pager,
    Page { index: usize, epoch: u64 },
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct SourcedEvent {
    pub key: SurfaceKey,
    pub event: SurfaceEvent,
}

/// State shared by the pager and the coordinator
pub(crate) struct PagerContext {
    pub(crate) config: PagerConfig,
    pub(crate) header: HeaderState,
    pub(crate) registry: PageRegistry,
    pub(crate) pager: SurfaceHandle,
    pub(crate) pages: Box<dyn PageProvider>,
    pub(crate) header_data: Box<dyn HeaderDataProvider>,
    pub(crate) delegate: Option<Box<dyn PagerDelegate>>,
    pub(crate) scheduler: TaskScheduler<Deferred>,
    pub(crate) inbox: Inbox,
    pub(crate) rotating: bool,
    pub(crate) header_touched: bool,
    /// Page and offset of the vertical pass in progress
    pub(crate) pass_offset: Option<(usize, f32)>,
    pub(crate) pager_subscription: Option<SubscriptionId>,
}

impl PagerContext {
    pub fn page_count(&self) -> usize {
        self.pages.count()
    }

    /// Top edge of the current page, or of the pager while no page is current
    pub fn surface_top(&self) -> f32 {
        match self.registry.current_surface_ref() {
            Some(surface) => surface.borrow().frame_top(),
            None => self.pager.borrow().frame_top(),
        }
    }

    pub fn anchor_origin(&self, index: usize) -> Option<f32> {
        let slot = self.registry.slot(index)?;
        match self.pass_offset {
            Some((page, offset_y)) if page == index => Some(slot.anchor_origin_at(offset_y)),
            _ => Some(slot.anchor_origin()),
        }
    }

    /// Container-space Y of the header
    pub fn header_absolute_y(&self) -> f32 {
        let origin = match self.header.host() {
            HeaderHost::PerPage(index) => self
                .anchor_origin(index)
                .unwrap_or_else(|| self.surface_top()),
            HeaderHost::Fixed => self.surface_top(),
        };
        self.header.header_absolute_y(origin)
    }

    /// Vertical offset of the current page, or its resting offset if unmounted
    pub fn current_offset_y(&self) -> f32 {
        match self.registry.current_surface_ref() {
            Some(surface) => surface.borrow().offset().y,
            None => -self.header.header_height(),
        }
    }

    pub fn move_header_to_page_by_pin(&mut self, index: usize) -> bool {
        let Some(origin) = self.anchor_origin(index) else {
            return false;
        };
        let top = self.surface_top();
        self.header.move_header_to_page_by_pin(index, top, origin)
    }

    pub fn move_header_to_page_at(&mut self, index: usize, y: f32) -> bool {
        if !self.registry.is_mounted(index) {
            return false;
        }
        self.header.move_header_to_page_at(index, y);
        true
    }

    pub fn notify_page_settled(&mut self, index: usize) {
        tracing::debug!("page {} settled", index);
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.on_page_settled(index);
        }
    }

    pub fn notify_vertical_scroll(&mut self, page: usize, header_offset: f32, is_stuck: bool) {
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.on_vertical_scroll(page, header_offset, is_stuck);
        }
    }

    /// Pull heights from the header provider and re-clamp the sticky offset
    pub fn fetch_header_geometry(&mut self) {
        let cover = self.header_data.cover_height();
        let tab = self.header_data.tab_height();
        self.header
            .recompute_geometry(cover, tab, self.config.sticky_offset);
    }

    pub fn load_page(&mut self, index: usize) -> bool {
        match self.try_load_page(index) {
            Ok(()) | Err(PagerError::AlreadyMounted(_)) => true,
            Err(err) => {
                tracing::debug!("load refused: {}", err);
                false
            }
        }
    }

    pub fn try_load_page(&mut self, index: usize) -> Result<()> {
        let count = self.page_count();
        if index >= count {
            return Err(PagerError::IndexOutOfRange { index, count });
        }
        if self.registry.is_mounted(index) {
            return Err(PagerError::AlreadyMounted(index));
        }
        let surface = self
            .pages
            .page_at(index)
            .ok_or(PagerError::PageUnavailable(index))?;

        let geometry = *self.header.geometry();
        let header_height = geometry.header_height;
        let top = self.surface_top();
        let lead = (-self.header.previous_pin_y() + top).min(geometry.stick_travel());
        let epoch = self.registry.next_epoch();

        let (anchor, subscription, content_size) = {
            let mut s = surface.borrow_mut();
            let inset = s.inset();
            s.set_inset(Insets {
                top: header_height,
                ..inset
            });
            let x = s.offset().x;
            s.set_offset(Point::new(x, -header_height + lead), false);

            let inbox = self.inbox.clone();
            let subscription = s.subscribe(Box::new(move |event: &SurfaceEvent| {
                inbox.borrow_mut().push_back(SourcedEvent {
                    key: SurfaceKey::Page { index, epoch },
                    event: *event,
                });
            }));
            let width = s.viewport_size().width;
            (
                Rect::new(0.0, -header_height, width, header_height),
                subscription,
                s.content_size(),
            )
        };

        // Size check for pages that arrive too short to reach full stick
        self.inbox.borrow_mut().push_back(SourcedEvent {
            key: SurfaceKey::Page { index, epoch },
            event: SurfaceEvent::SizeChanged { size: content_size },
        });

        self.registry.insert(PageSlot {
            index,
            surface,
            subscription,
            epoch,
            anchor,
        });
        tracing::debug!("page {} mounted (epoch {})", index, epoch);
        Ok(())
    }

    pub fn try_unload_page(&mut self, index: usize) -> Result<()> {
        let count = self.page_count();
        if index >= count {
            return Err(PagerError::IndexOutOfRange { index, count });
        }
        if index == self.registry.current_index() {
            return Err(PagerError::CurrentPage(index));
        }
        let Some(origin) = self.anchor_origin(index) else {
            return Err(PagerError::NotMounted(index));
        };

        if self.header.host() == HeaderHost::PerPage(index) {
            let top = self.surface_top();
            self.header.move_header_to_fixed(origin, top);
        }

        if let Some(slot) = self.registry.remove(index) {
            detach(slot);
        }
        tracing::debug!("page {} unmounted", index);
        Ok(())
    }
}

fn detach(slot: PageSlot) {
    match slot.surface.try_borrow_mut() {
        Ok(mut surface) => {
            surface.unsubscribe(slot.subscription);
        }
        Err(_) => tracing::warn!("page {} busy, subscription left behind", slot.index),
    }
}

/// Horizontal pager of vertical pages with a shared sticky header
pub struct NestedPager {
    ctx: PagerContext,
    coordinator: ScrollCoordinator,
}

impl NestedPager {
    /// Create a pager around `pager`, the horizontal surface. Nothing is
    /// loaded until [`NestedPager::rebuild`].
    pub fn new(
        config: PagerConfig,
        pager: SurfaceHandle,
        pages: Box<dyn PageProvider>,
        header_data: Box<dyn HeaderDataProvider>,
    ) -> Self {
        let inbox: Inbox = Rc::new(RefCell::new(VecDeque::new()));
        let sink = inbox.clone();
        let subscription = pager.borrow_mut().subscribe(Box::new(move |event: &SurfaceEvent| {
            sink.borrow_mut().push_back(SourcedEvent {
                key: SurfaceKey::Pager,
                event: *event,
            });
        }));

        Self {
            ctx: PagerContext {
                config,
                header: HeaderState::new(),
                registry: PageRegistry::new(),
                pager,
                pages,
                header_data,
                delegate: None,
                scheduler: TaskScheduler::new(),
                inbox,
                rotating: false,
                header_touched: false,
                pass_offset: None,
                pager_subscription: Some(subscription),
            },
            coordinator: ScrollCoordinator::new(),
        }
    }

    pub fn with_delegate(mut self, delegate: Box<dyn PagerDelegate>) -> Self {
        self.ctx.delegate = Some(delegate);
        self
    }

    pub fn set_delegate(&mut self, delegate: Option<Box<dyn PagerDelegate>>) {
        self.ctx.delegate = delegate;
    }

    pub fn config(&self) -> &PagerConfig {
        &self.ctx.config
    }

    /// Replace the configuration. Geometry changes apply on the next
    /// [`NestedPager::update_layouts`].
    pub fn set_config(&mut self, config: PagerConfig) {
        self.ctx.config = config;
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Tear everything down and load from scratch
    pub fn rebuild(&mut self) {
        self.cleanup();

        self.ctx.fetch_header_geometry();
        let cover = self.ctx.header_data.cover_view();
        let tab_strip = self.ctx.header_data.tab_strip_view();
        self.ctx.header.set_content(cover, tab_strip);

        let count = self.ctx.page_count();
        let mut current = self.ctx.config.default_page_index;
        if current >= count && current != 0 {
            tracing::warn!(
                "default page {} out of range (count {}), using 0",
                current,
                count
            );
            current = 0;
        }
        self.ctx.registry.set_current_index(current);

        if count > 0 {
            self.ctx.load_page(current);
            for index in (0..count).filter(|&i| i != current) {
                if self.ctx.pages.should_preload(index, current) {
                    self.ctx.load_page(index);
                }
            }
        }
        if !self.ctx.registry.promote_current() {
            tracing::warn!("current page {} has no surface", current);
        }
        tracing::debug!(
            "rebuilt with {} page(s), current {}, mounted {:?}",
            count,
            current,
            self.ctx.registry.mounted_indexes()
        );

        self.update_layouts();
    }

    /// Remount every mounted page, keeping the current index
    pub fn rebuild_pages(&mut self) {
        let mounted = self.ctx.registry.mounted_indexes();
        let current = self.ctx.registry.current_index();

        for slot in self.ctx.registry.drain() {
            detach(slot);
        }
        self.ctx.scheduler.clear();
        self.ctx.inbox.borrow_mut().clear();
        self.coordinator.clear();

        if current < self.ctx.page_count() {
            self.ctx.load_page(current);
        }
        for index in mounted.into_iter().filter(|&i| i != current) {
            self.ctx.load_page(index);
        }
        self.ctx.registry.promote_current();
        self.update_layouts();
    }

    /// Re-lay out the header and every mounted page at rest
    pub fn update_layouts(&mut self) {
        let ctx = &mut self.ctx;
        ctx.fetch_header_geometry();

        let viewport = ctx.pager.borrow().viewport_size();
        ctx.header.layout_content(viewport.width);
        let top = ctx.surface_top();
        ctx.header.layout_pin(top);

        let header_height = ctx.header.header_height();
        for index in ctx.registry.mounted_indexes() {
            let Some(slot) = ctx.registry.slot_mut(index) else {
                continue;
            };
            let width = slot.surface.borrow().viewport_size().width;
            slot.anchor = Rect::new(0.0, -header_height, width, header_height);

            let mut s = slot.surface.borrow_mut();
            let inset = s.inset();
            s.set_inset(Insets {
                top: header_height,
                ..inset
            });
            let x = s.offset().x;
            s.set_offset(Point::new(x, -header_height), false);
        }

        let current = ctx.registry.current_index();
        if !ctx.move_header_to_page_at(current, 0.0) {
            ctx.header.move_header_to_fixed_at(0.0);
        }
        let pin = ctx.header.pin_y();
        ctx.header.set_previous_pin_y(pin);
        ctx.header.set_keeps_stick(false);
        self.coordinator.reset();

        let count = ctx.page_count();
        {
            let mut pager = ctx.pager.borrow_mut();
            pager.set_content_size(Size::new(
                viewport.width * count as f32,
                viewport.height,
            ));
            let y = pager.offset().y;
            pager.set_offset(Point::new(viewport.width * current as f32, y), false);
        }
        tracing::trace!("layout: pin {} header height {}", pin, header_height);

        self.pump();
    }

    fn cleanup(&mut self) {
        for slot in self.ctx.registry.drain() {
            detach(slot);
        }
        self.ctx.scheduler.clear();
        self.ctx.inbox.borrow_mut().clear();
        self.ctx.header.remove_transition_mask();
        self.coordinator.clear();
    }

    // ========================================================================
    // Pages
    // ========================================================================

    /// Mount a page. Returns false if out of range, already mounted or the
    /// provider has no surface for it.
    pub fn load_page(&mut self, index: usize) -> bool {
        let loaded = match self.ctx.try_load_page(index) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!("load refused: {}", err);
                false
            }
        };
        self.pump();
        loaded
    }

    /// Unmount a page. The current page cannot be unloaded.
    pub fn unload_page(&mut self, index: usize) -> bool {
        match self.ctx.try_unload_page(index) {
            Ok(()) => {
                self.coordinator.forget_page(index);
                true
            }
            Err(err) => {
                tracing::debug!("unload refused: {}", err);
                false
            }
        }
    }

    pub fn scroll_to_page(&mut self, index: usize, animated: bool) -> bool {
        let count = self.ctx.page_count();
        if index >= count {
            tracing::debug!("scroll to page {} refused (count {})", index, count);
            return false;
        }
        {
            let mut pager = self.ctx.pager.borrow_mut();
            let width = pager.viewport_size().width;
            let y = pager.offset().y;
            pager.set_offset(Point::new(width * index as f32, y), animated);
        }
        self.pump();
        true
    }

    /// Scroll the current page back to its top resting position
    pub fn scroll_to_top(&mut self, animated: bool) -> bool {
        let Some(surface) = self.ctx.registry.current_surface() else {
            return false;
        };
        {
            let mut s = surface.borrow_mut();
            let target = top_offset(&*s);
            s.set_offset(target, animated);
        }
        self.pump();
        true
    }

    pub fn set_rotating(&mut self, rotating: bool) {
        if self.ctx.rotating != rotating {
            tracing::debug!("rotating: {}", rotating);
        }
        self.ctx.rotating = rotating;
    }

    pub fn set_header_touched(&mut self, touched: bool) {
        self.ctx.header_touched = touched;
    }

    // ========================================================================
    // Event loop
    // ========================================================================

    /// Handle every queued surface event. Returns the number handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let next = self.ctx.inbox.borrow_mut().pop_front();
            let Some(sourced) = next else {
                break;
            };
            self.dispatch(sourced);
            handled += 1;
            if handled >= MAX_EVENTS_PER_PUMP {
                tracing::warn!("pump stopped after {} events", handled);
                break;
            }
        }
        handled
    }

    fn dispatch(&mut self, sourced: SourcedEvent) {
        match sourced.key {
            SurfaceKey::Pager => match sourced.event {
                SurfaceEvent::OffsetChanged { .. } => {
                    self.coordinator.handle_horizontal(&mut self.ctx)
                }
                event if event.is_scroll_end() => {
                    if !self.ctx.rotating {
                        self.coordinator.check_settle(&mut self.ctx);
                    }
                }
                _ => {}
            },
            SurfaceKey::Page { index, epoch } => {
                if !self.ctx.registry.epoch_matches(index, epoch) {
                    tracing::trace!("dropping stale event for page {} (epoch {})", index, epoch);
                    return;
                }
                match sourced.event {
                    SurfaceEvent::OffsetChanged { offset } => {
                        self.coordinator
                            .handle_vertical(&mut self.ctx, index, offset)
                    }
                    SurfaceEvent::SizeChanged { size } => {
                        self.coordinator
                            .handle_content_size(&mut self.ctx, index, size)
                    }
                    _ => {}
                }
            }
        }
    }

    /// Advance the virtual clock, run due deferred work, then drain the inbox
    pub fn tick(&mut self, dt: Duration) {
        for task in self.ctx.scheduler.advance(dt) {
            tracing::trace!("running {:?}", task);
            self.coordinator.run_deferred(&mut self.ctx, task);
        }
        self.pump();
    }

    /// Check whether the pager rests on a page and promote it
    pub fn check_settle(&mut self) {
        self.pump();
        self.coordinator.check_settle(&mut self.ctx);
        self.pump();
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn current_index(&self) -> usize {
        self.ctx.registry.current_index()
    }

    pub fn is_stuck(&self) -> bool {
        self.coordinator.is_stuck()
    }

    pub fn header_height(&self) -> f32 {
        self.ctx.header.header_height()
    }

    /// Header pin, host, geometry and mask
    pub fn header(&self) -> &HeaderState {
        &self.ctx.header
    }

    /// Container-space Y of the header
    pub fn header_absolute_y(&self) -> f32 {
        self.ctx.header_absolute_y()
    }

    pub fn stick_state(&self) -> StickState {
        self.coordinator.stick_state()
    }

    pub fn stick_history(&self) -> &[(StickState, StickState)] {
        self.coordinator.stick_history()
    }

    pub fn page_surface(&self, index: usize) -> Option<SurfaceHandle> {
        self.ctx.registry.surface(index)
    }

    pub fn is_page_mounted(&self, index: usize) -> bool {
        self.ctx.registry.is_mounted(index)
    }

    pub fn mounted_pages(&self) -> Vec<usize> {
        self.ctx.registry.mounted_indexes().into_vec()
    }

    pub fn page_count(&self) -> usize {
        self.ctx.page_count()
    }

    pub fn has_pending_tasks(&self) -> bool {
        !self.ctx.scheduler.is_empty()
    }

    /// Number of deferred tasks waiting on the virtual clock
    pub fn pending_tasks(&self) -> usize {
        self.ctx.scheduler.len()
    }

    pub fn is_horizontal_scrolling(&self) -> bool {
        self.coordinator.is_horizontal_scrolling()
    }
}

impl Drop for NestedPager {
    fn drop(&mut self) {
        self.cleanup();
        if let Some(id) = self.ctx.pager_subscription.take() {
            if let Ok(mut pager) = self.ctx.pager.try_borrow_mut() {
                pager.unsubscribe(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimLayout, SimHarness};

    fn harness() -> SimHarness {
        SimHarness::new(&SimLayout::default(), PagerConfig::default())
    }

    #[test]
    fn test_rebuild_mounts_current_page_at_rest() {
        let h = harness();
        assert_eq!(h.pager.current_index(), 0);
        assert_eq!(h.pager.mounted_pages(), vec![0]);
        assert_eq!(h.pager.header_height(), 140.0);
        assert_eq!(h.page_offset(0), Some(-140.0));
        assert_eq!(h.pager.header().host(), HeaderHost::PerPage(0));
        assert_eq!(h.pager.header_absolute_y(), 0.0);

        let page = h.page(0).unwrap();
        assert_eq!(page.borrow().inset().top, 140.0);
    }

    #[test]
    fn test_pager_content_spans_pages() {
        let h = harness();
        let pager = h.pager_surface.borrow();
        assert_eq!(pager.content_size(), Size::new(900.0, 600.0));
        assert_eq!(pager.offset().x, 0.0);
    }

    #[test]
    fn test_default_page_out_of_range_falls_back() {
        let config = PagerConfig {
            default_page_index: 7,
            ..Default::default()
        };
        let h = SimHarness::new(&SimLayout::default(), config);
        assert_eq!(h.pager.current_index(), 0);
        assert!(h.pager.is_page_mounted(0));
    }

    #[test]
    fn test_events_queued_before_unload_are_dropped() {
        let mut h = harness();
        assert!(h.pager.load_page(1));
        let stale = h.page(1).unwrap();
        h.delegate.clear();

        stale
            .borrow_mut()
            .set_content_size(Size::new(300.0, 10.0));
        assert!(h.pager.unload_page(1));
        assert_eq!(h.pager.pump(), 1);

        // The size event was not acted on
        assert_eq!(stale.borrow().content_size().height, 10.0);
        assert!(h.delegate.notifications().is_empty());
    }

    #[test]
    fn test_remount_creates_new_surface() {
        let mut h = harness();
        assert!(h.pager.load_page(2));
        assert!(h.pager.unload_page(2));
        assert!(h.pager.load_page(2));
        assert_eq!(h.pages.requests(2), 2);
        assert!(h.pager.is_page_mounted(2));
    }
}
