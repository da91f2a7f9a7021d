//! nestpage pager
//!
//! Coordinates a horizontal pager of vertically scrolling pages that share a
//! single header (a cover plus a tab strip).
//!
//! - Scrolling the current page moves the header until the cover has scrolled
//!   away up to the sticky offset, after which the tab strip stays put
//!   ([`StickState::FullStick`]).
//! - Every other mounted page follows the header so switching pages never
//!   reveals a jump.
//! - Swiping between pages freezes the header in a fixed container, and a
//!   page becomes current once the pager rests on its boundary.
//!
//! The pager is single-threaded and host driven: feed it surface changes
//! through [`ContentSurface`] subscriptions, then call [`NestedPager::pump`]
//! after input and [`NestedPager::tick`] once per frame.
//!
//! # Example
//!
//! ```rust
//! use nestpage_pager::sim::{SimHarness, SimLayout};
//! use nestpage_pager::{HeaderHost, PagerConfig, StickState};
//!
//! let config = PagerConfig {
//!     sticky_offset: 20.0,
//!     ..Default::default()
//! };
//! let mut h = SimHarness::new(&SimLayout::default(), config);
//!
//! h.drag_page(0, 130.0);
//! assert_eq!(h.pager.stick_state(), StickState::FullStick);
//! assert_eq!(h.pager.header().pin_y(), -80.0);
//! assert_eq!(h.pager.header().host(), HeaderHost::Fixed);
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod header;
pub mod host;
pub mod pager;
pub mod registry;
pub mod sim;
pub mod surface;

pub use config::{ConfigError, PagerConfig};
pub use coordinator::{settled_index, StickState, SETTLE_EPSILON};
pub use error::{PagerError, Result};
pub use header::{HeaderContent, HeaderGeometry, HeaderHost, HeaderState, TransitionMask};
pub use host::{HeaderDataProvider, PageProvider, PagerDelegate, ViewToken};
pub use pager::NestedPager;
pub use registry::{PageRegistry, PageSlot};
pub use surface::{top_offset, ContentSurface, SurfaceHandle};
