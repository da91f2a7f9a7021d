//! Header position state
//!
//! The header is a cover plus a tab strip that is hosted either by one page's
//! anchor (and then scrolls with that page) or by the fixed container that sits
//! at the current page's top edge. Its placement is driven by the *pin*: a
//! zero-height marker in container space that never rubber-bands and is the
//! only value the other pages are synchronized against.
//!
//! All `*_origin` arguments are container-space Y positions of a host's
//! coordinate origin. Local header Y is always relative to the current host.

use nestpage_core::{Color, Rect};
use serde::{Deserialize, Serialize};

use crate::host::ViewToken;
use crate::surface::ContentSurface;

/// Header metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderGeometry {
    pub cover_height: f32,
    pub tab_height: f32,
    /// `cover_height + tab_height`
    pub header_height: f32,
    /// Always within `[0, cover_height]`
    pub sticky_offset: f32,
}

impl HeaderGeometry {
    pub fn new(cover_height: f32, tab_height: f32, sticky_offset: f32) -> Self {
        let cover_height = cover_height.max(0.0);
        let tab_height = tab_height.max(0.0);
        Self {
            cover_height,
            tab_height,
            header_height: cover_height + tab_height,
            sticky_offset: sticky_offset.clamp(0.0, cover_height),
        }
    }

    /// How far the header travels from rest to full stick
    pub fn stick_travel(&self) -> f32 {
        self.cover_height - self.sticky_offset
    }
}

/// Which container currently hosts the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "page", rename_all = "snake_case")]
pub enum HeaderHost {
    /// Under the anchor of the page with this index
    PerPage(usize),
    /// Under the fixed container at the current page's top edge
    Fixed,
}

/// Filler painted between two pages while the previous one is still
/// rebounding from a pull past its top
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionMask {
    pub top: f32,
    pub height: f32,
    pub color: Color,
}

/// Header host tokens and their layout frames
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderContent {
    pub cover: Option<ViewToken>,
    pub tab_strip: Option<ViewToken>,
    pub cover_frame: Rect,
    pub tab_frame: Rect,
}

/// Header geometry, pin and host bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderState {
    geometry: HeaderGeometry,
    pin_y: f32,
    previous_pin_y: f32,
    overflow_pin_height: f32,
    keeps_stick: bool,
    host: HeaderHost,
    header_y: f32,
    mask: Option<TransitionMask>,
    content: HeaderContent,
}

impl Default for HeaderState {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderState {
    pub fn new() -> Self {
        Self {
            geometry: HeaderGeometry::default(),
            pin_y: 0.0,
            previous_pin_y: 0.0,
            overflow_pin_height: 0.0,
            keeps_stick: false,
            host: HeaderHost::Fixed,
            header_y: 0.0,
            mask: None,
            content: HeaderContent::default(),
        }
    }

    pub fn geometry(&self) -> &HeaderGeometry {
        &self.geometry
    }

    pub fn header_height(&self) -> f32 {
        self.geometry.header_height
    }

    pub fn pin_y(&self) -> f32 {
        self.pin_y
    }

    pub fn previous_pin_y(&self) -> f32 {
        self.previous_pin_y
    }

    pub fn overflow_pin_height(&self) -> f32 {
        self.overflow_pin_height
    }

    pub fn keeps_stick(&self) -> bool {
        self.keeps_stick
    }

    pub fn host(&self) -> HeaderHost {
        self.host
    }

    /// Header Y in the current host's coordinate space
    pub fn header_y(&self) -> f32 {
        self.header_y
    }

    pub fn mask(&self) -> Option<&TransitionMask> {
        self.mask.as_ref()
    }

    pub fn content(&self) -> &HeaderContent {
        &self.content
    }

    /// Update metrics. Returns the clamped sticky offset.
    pub fn recompute_geometry(&mut self, cover: f32, tab: f32, requested_sticky: f32) -> f32 {
        self.geometry = HeaderGeometry::new(cover, tab, requested_sticky);
        if self.geometry.sticky_offset != requested_sticky {
            tracing::warn!(
                "sticky offset {} clamped to {} (cover height {})",
                requested_sticky,
                self.geometry.sticky_offset,
                self.geometry.cover_height
            );
        }
        self.geometry.sticky_offset
    }

    /// Store fresh header content tokens
    pub fn set_content(&mut self, cover: Option<ViewToken>, tab_strip: Option<ViewToken>) {
        self.content.cover = cover;
        self.content.tab_strip = tab_strip;
    }

    /// Lay out cover and tab strip inside the header
    pub fn layout_content(&mut self, width: f32) {
        let g = self.geometry;
        self.content.cover_frame = Rect::new(0.0, 0.0, width, g.cover_height);
        self.content.tab_frame = Rect::new(0.0, g.cover_height, width, g.tab_height);
    }

    /// Place the pin at the current surface's top edge
    pub fn layout_pin(&mut self, anchor_top_y: f32) {
        self.pin_y = anchor_top_y;
        self.overflow_pin_height = 0.0;
    }

    pub fn adjust_pin_y(&mut self, y: f32) {
        self.pin_y = y;
    }

    pub fn adjust_header_content_y(&mut self, y: f32) {
        self.header_y = y;
    }

    pub fn set_previous_pin_y(&mut self, y: f32) {
        self.previous_pin_y = y;
    }

    pub fn set_overflow_pin_height(&mut self, height: f32) {
        self.overflow_pin_height = height;
    }

    pub fn set_keeps_stick(&mut self, keeps: bool) {
        if keeps != self.keeps_stick {
            tracing::debug!("keeps_stick -> {}", keeps);
        }
        self.keeps_stick = keeps;
    }

    /// Pin position at full stick for a surface whose top edge is `surface_top`
    pub fn full_stick_pin(&self, surface_top: f32) -> f32 {
        surface_top - self.geometry.stick_travel()
    }

    /// Cover fully scrolled away
    pub fn is_stuck(&self, surface_top: f32) -> bool {
        self.pin_y - surface_top <= -self.geometry.cover_height
    }

    /// Container-space header Y given the origin of its current host
    pub fn header_absolute_y(&self, host_origin: f32) -> f32 {
        host_origin + self.header_y
    }

    /// Reparent under a page anchor, preserving the absolute position
    pub fn move_header_to_page(&mut self, index: usize, current_origin: f32, anchor_origin: f32) {
        let absolute = self.header_absolute_y(current_origin);
        self.move_header_to_page_at(index, absolute - anchor_origin);
    }

    /// Reparent under a page anchor at an explicit local Y
    pub fn move_header_to_page_at(&mut self, index: usize, y: f32) {
        self.header_y = y;
        if self.host != HeaderHost::PerPage(index) {
            tracing::debug!("header host {:?} -> page {}", self.host, index);
            self.host = HeaderHost::PerPage(index);
        }
    }

    /// Reparent under a page anchor at the pin. Does nothing at or past full
    /// stick. Returns true if the header moved.
    pub fn move_header_to_page_by_pin(
        &mut self,
        index: usize,
        surface_top: f32,
        anchor_origin: f32,
    ) -> bool {
        if self.pin_y > self.full_stick_pin(surface_top) {
            self.move_header_to_page_at(index, self.pin_y - anchor_origin);
            true
        } else {
            false
        }
    }

    /// Reparent under the fixed container, preserving the absolute position
    pub fn move_header_to_fixed(&mut self, current_origin: f32, fixed_origin: f32) {
        let absolute = self.header_absolute_y(current_origin);
        self.move_header_to_fixed_at(absolute - fixed_origin);
    }

    /// Reparent under the fixed container at the pin
    pub fn move_header_to_fixed_by_pin(&mut self, fixed_origin: f32) {
        self.move_header_to_fixed_at(self.pin_y - fixed_origin);
    }

    /// Reparent under the fixed container at an explicit local Y
    pub fn move_header_to_fixed_at(&mut self, y: f32) {
        self.header_y = y;
        if self.host != HeaderHost::Fixed {
            tracing::debug!("header host {:?} -> fixed", self.host);
            self.host = HeaderHost::Fixed;
        }
    }

    /// Cover the gap above a rebounding surface during a page switch.
    ///
    /// Only applies while the header is fixed and `surface` is pulled past its
    /// top. An existing mask is resized in place and keeps its color.
    pub fn insert_transition_mask(&mut self, surface_top: f32, surface: &dyn ContentSurface) {
        if self.host != HeaderHost::Fixed || !surface.is_top_bouncing() {
            return;
        }
        let height = -surface.offset().y;
        match self.mask.as_mut() {
            Some(mask) => {
                mask.top = surface_top;
                mask.height = height;
            }
            None => {
                tracing::debug!("transition mask inserted at {} height {}", surface_top, height);
                self.mask = Some(TransitionMask {
                    top: surface_top,
                    height,
                    color: surface.background(),
                });
            }
        }
    }

    pub fn remove_transition_mask(&mut self) {
        if self.mask.take().is_some() {
            tracing::debug!("transition mask removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimSurface;
    use nestpage_core::{Insets, Point, Size};

    fn header() -> HeaderState {
        let mut header = HeaderState::new();
        header.recompute_geometry(100.0, 40.0, 20.0);
        header
    }

    #[test]
    fn test_geometry_clamps_sticky_offset() {
        let mut header = HeaderState::new();
        assert_eq!(header.recompute_geometry(100.0, 40.0, 150.0), 100.0);
        assert_eq!(header.recompute_geometry(100.0, 40.0, -5.0), 0.0);
        assert_eq!(header.header_height(), 140.0);
        assert_eq!(header.geometry().stick_travel(), 100.0);
    }

    #[test]
    fn test_layout_pin_resets_overflow() {
        let mut header = header();
        header.set_overflow_pin_height(42.0);
        header.layout_pin(64.0);
        assert_eq!(header.pin_y(), 64.0);
        assert_eq!(header.overflow_pin_height(), 0.0);
    }

    #[test]
    fn test_adjust_header_content_y_is_local_to_host() {
        let mut header = header();
        header.move_header_to_fixed_at(0.0);
        header.adjust_header_content_y(-25.0);
        assert_eq!(header.header_y(), -25.0);
        assert_eq!(header.header_absolute_y(10.0), -15.0);
    }

    #[test]
    fn test_move_by_pin_respects_full_stick() {
        let mut header = header();
        header.move_header_to_fixed_at(0.0);

        // Full stick position for a surface at 0 is -80
        header.adjust_pin_y(-80.0);
        assert!(!header.move_header_to_page_by_pin(0, 0.0, -140.0));
        assert_eq!(header.host(), HeaderHost::Fixed);

        header.adjust_pin_y(-30.0);
        assert!(header.move_header_to_page_by_pin(0, 0.0, -170.0));
        assert_eq!(header.host(), HeaderHost::PerPage(0));
        assert_eq!(header.header_y(), 140.0);
        assert_eq!(header.header_absolute_y(-170.0), -30.0);
    }

    #[test]
    fn test_reparenting_preserves_absolute_position() {
        let mut header = header();
        header.move_header_to_page_at(1, 10.0);

        // Page anchor at -150, fixed container at 0
        header.move_header_to_fixed(-150.0, 0.0);
        assert_eq!(header.host(), HeaderHost::Fixed);
        assert_eq!(header.header_y(), -140.0);

        header.move_header_to_page(2, 0.0, -200.0);
        assert_eq!(header.host(), HeaderHost::PerPage(2));
        assert_eq!(header.header_absolute_y(-200.0), -140.0);
    }

    #[test]
    fn test_stuck_is_relative_to_surface_top() {
        let mut header = header();
        header.adjust_pin_y(-80.0);
        assert!(!header.is_stuck(0.0));
        header.adjust_pin_y(-100.0);
        assert!(header.is_stuck(0.0));
        header.adjust_pin_y(-60.0);
        assert!(header.is_stuck(40.0));
    }

    #[test]
    fn test_transition_mask_lifecycle() {
        let mut header = header();
        let mut surface = SimSurface::new(Size::new(300.0, 600.0), Size::new(300.0, 2000.0))
            .with_background(Color::from_hex(0x336699));
        surface.set_inset(Insets::top(140.0));
        surface.set_offset(Point::new(0.0, -180.0), false);

        // Not inserted while hosted by a page
        header.move_header_to_page_at(0, 0.0);
        header.insert_transition_mask(0.0, &surface);
        assert!(header.mask().is_none());

        header.move_header_to_fixed_at(40.0);
        header.insert_transition_mask(0.0, &surface);
        let mask = *header.mask().unwrap();
        assert_eq!(mask.height, 180.0);
        assert_eq!(mask.color, Color::from_hex(0x336699));

        surface.set_offset(Point::new(0.0, -160.0), false);
        header.insert_transition_mask(0.0, &surface);
        assert_eq!(header.mask().unwrap().height, 160.0);

        header.remove_transition_mask();
        assert!(header.mask().is_none());
    }

    #[test]
    fn test_content_layout() {
        let mut header = header();
        header.set_content(Some(ViewToken(1)), Some(ViewToken(2)));
        header.layout_content(320.0);
        assert_eq!(header.content().cover_frame, Rect::new(0.0, 0.0, 320.0, 100.0));
        assert_eq!(header.content().tab_frame, Rect::new(0.0, 100.0, 320.0, 40.0));
        assert_eq!(header.content().tab_strip, Some(ViewToken(2)));
    }
}
