//! Host-side collaborators
//!
//! The pager pulls pages and header metrics from providers and reports
//! settles and vertical passes to an optional delegate.

use serde::{Deserialize, Serialize};

use crate::surface::SurfaceHandle;

/// Opaque reference to a host-owned view (cover, tab strip)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewToken(pub u64);

/// Supplies pages by index
pub trait PageProvider {
    /// Number of pages
    fn count(&self) -> usize;

    /// Content surface of a page. Called at most once per index per mount.
    fn page_at(&mut self, index: usize) -> Option<SurfaceHandle>;

    /// Whether a page should be mounted during a rebuild.
    ///
    /// By default only the current page is loaded up front.
    fn should_preload(&self, index: usize, current_index: usize) -> bool {
        index == current_index
    }
}

/// Supplies header metrics and content
pub trait HeaderDataProvider {
    fn cover_height(&self) -> f32 {
        0.0
    }

    fn tab_height(&self) -> f32 {
        0.0
    }

    fn cover_view(&mut self) -> Option<ViewToken> {
        None
    }

    fn tab_strip_view(&mut self) -> Option<ViewToken> {
        None
    }
}

/// Receives pager notifications. Every method has a no-op default.
pub trait PagerDelegate {
    /// The pager came to rest on `index`
    fn on_page_settled(&mut self, _index: usize) {}

    /// A vertical pass ran on `page`.
    ///
    /// `header_offset` is the distance the header has travelled above the
    /// page's top edge (0 at rest, negative while pulled down).
    fn on_vertical_scroll(&mut self, _page: usize, _header_offset: f32, _is_stuck: bool) {}
}
