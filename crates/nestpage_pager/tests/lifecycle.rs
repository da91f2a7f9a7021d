//! Integration tests for page mounting, layout and rebuilds

use nestpage_pager::sim::{SimHarness, SimHeader, SimLayout, SimPages};
use nestpage_pager::{ContentSurface, HeaderHost, PagerConfig, StickState};
use nestpage_core::{Rect, Size};

fn short_pages(height: f32) -> SimPages {
    SimPages::new(3, Size::new(300.0, 600.0), 2000.0).with_content_height(1, height)
}

#[test]
fn test_load_and_unload_refusals() {
    let mut h = SimHarness::new(&SimLayout::default(), PagerConfig::default());

    assert!(!h.pager.load_page(5));
    assert!(!h.pager.load_page(0));
    assert!(!h.pager.unload_page(0));
    assert!(!h.pager.unload_page(2));
    assert!(!h.pager.unload_page(9));

    assert!(h.pager.load_page(2));
    assert_eq!(h.pager.mounted_pages(), vec![0, 2]);
    assert!(h.pager.unload_page(2));
    assert_eq!(h.pager.mounted_pages(), vec![0]);
}

#[test]
fn test_unavailable_page_is_refused() {
    let pages = SimPages::new(3, Size::new(300.0, 600.0), 2000.0);
    pages.mark_unavailable(1);
    let mut h = SimHarness::with_pages(&SimLayout::default(), PagerConfig::default(), pages);

    assert!(!h.pager.load_page(1));
    assert!(!h.pager.is_page_mounted(1));
    assert_eq!(h.pages.requests(1), 1);
}

#[test]
fn test_loaded_page_follows_header() {
    let mut h = SimHarness::new(&SimLayout::default(), PagerConfig::default());

    h.drag_page(0, 60.0);
    assert_eq!(h.pager.header().pin_y(), -60.0);

    assert!(h.pager.load_page(1));
    assert_eq!(h.page_offset(1), Some(-80.0));
    assert_eq!(h.page(1).unwrap().borrow().inset().top, 140.0);

    // Never further than the stuck position
    h.drag_page(0, 500.0);
    assert!(h.pager.load_page(2));
    assert_eq!(h.page_offset(2), Some(-40.0));
}

#[test]
fn test_preload_on_rebuild() {
    let pages = SimPages::new(4, Size::new(300.0, 600.0), 2000.0).with_preload(3);
    let layout = SimLayout {
        page_count: 4,
        ..Default::default()
    };
    let h = SimHarness::with_pages(&layout, PagerConfig::default(), pages);

    assert_eq!(h.pager.mounted_pages(), vec![0, 3]);
    assert_eq!(h.pager.page_count(), 4);
    assert_eq!(h.pager_surface.borrow().content_size(), Size::new(1200.0, 600.0));
}

#[test]
fn test_default_page_index() {
    let config = PagerConfig {
        default_page_index: 2,
        ..Default::default()
    };
    let h = SimHarness::new(&SimLayout::default(), config);

    assert_eq!(h.pager.current_index(), 2);
    assert_eq!(h.pager_surface.borrow().offset().x, 600.0);
    assert_eq!(h.pager.header().host(), HeaderHost::PerPage(2));
}

#[test]
fn test_short_page_is_grown() {
    let pages = short_pages(200.0);
    let mut h = SimHarness::with_pages(&SimLayout::default(), PagerConfig::default(), pages);

    assert!(h.pager.load_page(1));
    assert_eq!(h.page(1).unwrap().borrow().content_size().height, 560.0);
}

#[test]
fn test_short_page_minimum_respects_sticky_offset() {
    let config = PagerConfig {
        sticky_offset: 20.0,
        ..Default::default()
    };
    let mut h = SimHarness::with_pages(&SimLayout::default(), config, short_pages(200.0));

    assert!(h.pager.load_page(1));
    assert_eq!(h.page(1).unwrap().borrow().content_size().height, 540.0);

    // Later shrinks are corrected too
    let page = h.page(1).unwrap();
    page.borrow_mut().set_content_size(Size::new(300.0, 100.0));
    h.pager.pump();
    assert_eq!(page.borrow().content_size().height, 540.0);
}

#[test]
fn test_short_page_kept_without_adjustment() {
    let config = PagerConfig {
        auto_adjusts_content_size_minimum_height: false,
        ..Default::default()
    };
    let mut h = SimHarness::with_pages(&SimLayout::default(), config, short_pages(200.0));

    assert!(h.pager.load_page(1));
    assert_eq!(h.page(1).unwrap().borrow().content_size().height, 200.0);
}

#[test]
fn test_update_layouts_resets_pages() {
    let layout = SimLayout {
        preload_all: true,
        ..Default::default()
    };
    let mut h = SimHarness::new(&layout, PagerConfig::default());

    h.drag_page(0, 200.0);
    h.release_page(0, 0.0);
    assert_eq!(h.pager.stick_state(), StickState::FullStick);

    h.pager.update_layouts();
    for index in 0..3 {
        assert_eq!(h.page_offset(index), Some(-140.0));
    }
    assert_eq!(h.pager.header().pin_y(), 0.0);
    assert_eq!(h.pager.header().previous_pin_y(), 0.0);
    assert_eq!(h.pager.header().host(), HeaderHost::PerPage(0));
    assert_eq!(h.pager.stick_state(), StickState::Free);
}

#[test]
fn test_rebuild_pages_remounts() {
    let mut h = SimHarness::new(&SimLayout::default(), PagerConfig::default());
    assert!(h.pager.scroll_to_page(1, false));
    assert!(h.pager.load_page(2));

    h.pager.rebuild_pages();

    assert_eq!(h.pager.current_index(), 1);
    assert_eq!(h.pager.mounted_pages(), vec![0, 1, 2]);
    assert_eq!(h.pages.requests(0), 2);
    assert_eq!(h.pages.requests(1), 2);
    assert_eq!(h.pages.requests(2), 2);
}

#[test]
fn test_rebuild_resets_to_default_page() {
    let mut h = SimHarness::new(&SimLayout::default(), PagerConfig::default());
    assert!(h.pager.scroll_to_page(2, false));

    h.pager.rebuild();

    assert_eq!(h.pager.current_index(), 0);
    assert_eq!(h.pager.mounted_pages(), vec![0]);
    assert_eq!(h.pager_surface.borrow().offset().x, 0.0);
}

#[test]
fn test_header_content_layout() {
    let h = SimHarness::new(&SimLayout::default(), PagerConfig::default());
    let content = h.pager.header().content();

    assert_eq!(content.cover, Some(SimHeader::COVER_VIEW));
    assert_eq!(content.tab_strip, Some(SimHeader::TAB_STRIP_VIEW));
    assert_eq!(content.cover_frame, Rect::new(0.0, 0.0, 300.0, 100.0));
    assert_eq!(content.tab_frame, Rect::new(0.0, 100.0, 300.0, 40.0));
}

#[test]
fn test_sticky_offset_clamped_to_cover() {
    let config = PagerConfig::from_toml_str("sticky_offset = 250.0").unwrap();
    let mut h = SimHarness::new(&SimLayout::default(), config);

    assert_eq!(h.pager.header().geometry().sticky_offset, 100.0);

    // Full stick as soon as the cover would start moving
    h.drag_page(0, 1.0);
    assert_eq!(h.pager.stick_state(), StickState::FullStick);
    assert_eq!(h.pager.header().pin_y(), 0.0);
}
