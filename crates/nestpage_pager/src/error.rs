//! Pager error types

use thiserror::Error;

/// Reasons a pager operation was refused
#[derive(Error, Debug)]
pub enum PagerError {
    /// Index outside `0..count`
    #[error("page index {index} out of range (count {count})")]
    IndexOutOfRange { index: usize, count: usize },

    /// Page already has a mounted surface
    #[error("page {0} is already mounted")]
    AlreadyMounted(usize),

    /// Page has no mounted surface
    #[error("page {0} is not mounted")]
    NotMounted(usize),

    /// The current page cannot be unloaded
    #[error("page {0} is the current page")]
    CurrentPage(usize),

    /// Provider returned no surface
    #[error("provider has no surface for page {0}")]
    PageUnavailable(usize),
}

/// Result type for pager operations
pub type Result<T> = std::result::Result<T, PagerError>;
