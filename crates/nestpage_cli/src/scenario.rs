//! Scenario definition for gesture replay.

use anyhow::{Context, Result};
use nestpage_pager::sim::SimLayout;
use nestpage_pager::{HeaderHost, PagerConfig, StickState};
use serde::Deserialize;
use std::path::Path;

/// Pager shape, configuration and a sequence of steps.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub layout: SimLayout,
    #[serde(default)]
    pub config: PagerConfig,
    pub steps: Vec<ScenarioStep>,
}

impl Scenario {
    /// Load a scenario from JSON text.
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Load a scenario from file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid scenario {}", path.display()))
    }
}

fn default_frames() -> u32 {
    1
}

fn default_tolerance() -> f32 {
    0.01
}

/// One scenario step. Gesture steps deliver their events immediately; only
/// `tick` advances time.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Move a page's content by `dy` under a held finger
    Drag { page: usize, dy: f32 },
    /// Lift the finger off a page
    Release {
        page: usize,
        #[serde(default)]
        velocity: f32,
    },
    Fling { page: usize, velocity: f32 },
    /// Advance `frames` frames, or until everything is at rest
    Tick {
        #[serde(default = "default_frames")]
        frames: u32,
        #[serde(default)]
        until_idle: bool,
    },
    /// Drag the pager onto a page boundary and let go
    SwipeTo {
        page: usize,
        #[serde(default)]
        velocity: f32,
    },
    ScrollToPage {
        page: usize,
        #[serde(default)]
        animated: bool,
    },
    FinishPagerAnimation,
    HeaderTouch { touching: bool },
    AssertCurrentIndex { index: usize },
    AssertPin {
        y: f32,
        #[serde(default = "default_tolerance")]
        tolerance: f32,
    },
    AssertStickState { state: StickState },
    AssertHeaderHost { host: HeaderHost },
    AssertPageOffset {
        page: usize,
        y: f32,
        #[serde(default = "default_tolerance")]
        tolerance: f32,
    },
}

impl ScenarioStep {
    /// Step name as written in scenario files
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioStep::Drag { .. } => "drag",
            ScenarioStep::Release { .. } => "release",
            ScenarioStep::Fling { .. } => "fling",
            ScenarioStep::Tick { .. } => "tick",
            ScenarioStep::SwipeTo { .. } => "swipe_to",
            ScenarioStep::ScrollToPage { .. } => "scroll_to_page",
            ScenarioStep::FinishPagerAnimation => "finish_pager_animation",
            ScenarioStep::HeaderTouch { .. } => "header_touch",
            ScenarioStep::AssertCurrentIndex { .. } => "assert_current_index",
            ScenarioStep::AssertPin { .. } => "assert_pin",
            ScenarioStep::AssertStickState { .. } => "assert_stick_state",
            ScenarioStep::AssertHeaderHost { .. } => "assert_header_host",
            ScenarioStep::AssertPageOffset { .. } => "assert_page_offset",
        }
    }

    pub fn is_assertion(&self) -> bool {
        self.name().starts_with("assert_")
    }
}
