//! Pager configuration (TOML)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse pager config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize pager config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Behaviour switches for [`NestedPager`](crate::NestedPager)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PagerConfig {
    /// Inactive pages keep their own scroll position instead of snapping to
    /// the header while it moves
    pub keeps_content_scroll_position: bool,
    /// Header follows the content when it is pulled past the top
    #[serde(default = "default_true")]
    pub header_bounces: bool,
    /// Header never scrolls with content
    pub header_always_fixed: bool,
    /// Distance below the top at which the cover stops scrolling. Clamped to
    /// `[0, cover_height]` on layout.
    pub sticky_offset: f32,
    /// A parked header only resumes upward travel while it is being touched
    pub header_moves_only_when_touching_header_during_hover: bool,
    /// Cut inertial scrolling short when the header reaches full stick
    pub interrupts_scrolling_when_transitioning_to_full_stick: bool,
    pub default_page_index: usize,
    /// Grow short pages so the header can still reach full stick
    #[serde(default = "default_true")]
    pub auto_adjusts_content_size_minimum_height: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            keeps_content_scroll_position: false,
            header_bounces: true,
            header_always_fixed: false,
            sticky_offset: 0.0,
            header_moves_only_when_touching_header_during_hover: false,
            interrupts_scrolling_when_transitioning_to_full_stick: false,
            default_page_index: 0,
            auto_adjusts_content_size_minimum_height: true,
        }
    }
}

impl PagerConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = PagerConfig::from_toml_str("").unwrap();
        assert_eq!(config, PagerConfig::default());
        assert!(config.header_bounces);
        assert!(config.auto_adjusts_content_size_minimum_height);
    }

    #[test]
    fn test_partial_document() {
        let config = PagerConfig::from_toml_str(
            r#"
            sticky_offset = 20.0
            header_bounces = false
            default_page_index = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.sticky_offset, 20.0);
        assert!(!config.header_bounces);
        assert_eq!(config.default_page_index, 2);
        assert!(!config.header_always_fixed);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PagerConfig {
            keeps_content_scroll_position: true,
            interrupts_scrolling_when_transitioning_to_full_stick: true,
            ..Default::default()
        };
        let text = config.to_toml().unwrap();
        assert_eq!(PagerConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_parse_error() {
        let err = PagerConfig::from_toml_str("sticky_offset = \"high\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = PagerConfig::load(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.toml"));
    }
}
