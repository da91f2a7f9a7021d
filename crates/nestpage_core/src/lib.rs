//! nestpage core primitives
//!
//! This crate provides the building blocks shared by the nested pager:
//!
//! - **Geometry**: points, sizes, insets, rectangles and colors in the shared
//!   container coordinate space
//! - **Surface events**: explicit subscription lists for scroll surfaces
//! - **State tracking**: typed state machines with transition history
//! - **Deferred tasks**: single-shot tasks on a host-driven virtual clock
//!
//! # Example
//!
//! ```rust
//! use nestpage_core::scheduler::TaskScheduler;
//! use std::time::Duration;
//!
//! let mut scheduler = TaskScheduler::new();
//! scheduler.schedule_after(Duration::from_millis(250), "reattach");
//! scheduler.schedule_next_tick("recheck");
//!
//! assert_eq!(scheduler.advance(Duration::ZERO), vec!["recheck"]);
//! assert_eq!(scheduler.advance(Duration::from_millis(250)), vec!["reattach"]);
//! ```

pub mod events;
pub mod fsm;
pub mod geometry;
pub mod scheduler;

pub use events::{EventType, Observers, SubscriptionId, SurfaceCallback, SurfaceEvent};
pub use fsm::{StateTracker, StateTransitions};
pub use geometry::{approx_eq, Color, Insets, Point, Rect, Size, EPSILON};
pub use scheduler::{TaskId, TaskScheduler};
