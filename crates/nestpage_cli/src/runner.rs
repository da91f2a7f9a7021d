//! Scenario runner that replays gestures against a simulated pager.

use crate::report::ScenarioReport;
use crate::scenario::{Scenario, ScenarioStep};
use anyhow::Result;
use nestpage_pager::sim::SimHarness;
use nestpage_pager::{ContentSurface, PagerConfig};

/// Frames a `tick` with `until_idle` may run before the step fails
pub const MAX_IDLE_FRAMES: u32 = 2_000;

/// Final outcome of a scenario run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Passed { report: ScenarioReport },
    Failed { report: ScenarioReport },
}

impl RunOutcome {
    pub fn report(&self) -> &ScenarioReport {
        match self {
            RunOutcome::Passed { report } => report,
            RunOutcome::Failed { report } => report,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }
}

/// Execute scenario JSON with its embedded configuration.
pub fn run_scenario(input: &str) -> Result<RunOutcome> {
    let scenario = Scenario::from_json(input)?;
    Ok(run_loaded_scenario(&scenario, None))
}

/// Execute a pre-loaded scenario. `config` replaces the scenario's own.
pub fn run_loaded_scenario(scenario: &Scenario, config: Option<&PagerConfig>) -> RunOutcome {
    let config = config.unwrap_or(&scenario.config).clone();
    let mut runner = Runner {
        harness: SimHarness::new(&scenario.layout, config),
        frames: 0,
    };
    let frame_ms = runner.harness.frame().as_millis() as u64;

    for (step_index, step) in scenario.steps.iter().enumerate() {
        tracing::debug!("step {}: {:?}", step_index, step);
        if let Err(message) = runner.apply(step) {
            tracing::info!("step {} ({}) failed: {}", step_index, step.name(), message);
            let report = ScenarioReport::failed(
                step.name(),
                step_index,
                message,
                runner.frames,
                runner.frames * frame_ms,
                runner.harness.delegate.settled_pages(),
            );
            return RunOutcome::Failed { report };
        }
    }

    let report = ScenarioReport::passed(
        runner.frames,
        runner.frames * frame_ms,
        runner.harness.delegate.settled_pages(),
    );
    RunOutcome::Passed { report }
}

struct Runner {
    harness: SimHarness,
    frames: u64,
}

impl Runner {
    fn apply(&mut self, step: &ScenarioStep) -> Result<(), String> {
        match *step {
            ScenarioStep::Drag { page, dy } => {
                self.require_mounted(page)?;
                self.harness.drag_page(page, dy);
            }
            ScenarioStep::Release { page, velocity } => {
                self.require_mounted(page)?;
                self.harness.release_page(page, velocity);
            }
            ScenarioStep::Fling { page, velocity } => {
                self.require_mounted(page)?;
                self.harness.fling_page(page, velocity);
            }
            ScenarioStep::Tick { frames, until_idle } => {
                if until_idle {
                    self.run_until_idle()?;
                } else {
                    for _ in 0..frames {
                        self.step();
                    }
                }
            }
            ScenarioStep::SwipeTo { page, velocity } => {
                let count = self.harness.pager.page_count();
                if page >= count {
                    return Err(format!("page {} out of range (count {})", page, count));
                }
                let (x, width) = {
                    let pager = self.harness.pager_surface.borrow();
                    (pager.offset().x, pager.viewport_size().width)
                };
                self.harness.swipe_pager(width * page as f32 - x);
                self.harness.release_pager(velocity);
            }
            ScenarioStep::ScrollToPage { page, animated } => {
                if !self.harness.pager.scroll_to_page(page, animated) {
                    return Err(format!("cannot scroll to page {}", page));
                }
            }
            ScenarioStep::FinishPagerAnimation => {
                self.harness.finish_pager_animation();
            }
            ScenarioStep::HeaderTouch { touching } => {
                self.harness.pager.set_header_touched(touching);
            }
            ScenarioStep::AssertCurrentIndex { index } => {
                let actual = self.harness.pager.current_index();
                if actual != index {
                    return Err(format!("current index is {}, expected {}", actual, index));
                }
            }
            ScenarioStep::AssertPin { y, tolerance } => {
                let actual = self.harness.pager.header().pin_y();
                if (actual - y).abs() > tolerance {
                    return Err(format!("pin is at {}, expected {}", actual, y));
                }
            }
            ScenarioStep::AssertStickState { state } => {
                let actual = self.harness.pager.stick_state();
                if actual != state {
                    return Err(format!("stick state is {:?}, expected {:?}", actual, state));
                }
            }
            ScenarioStep::AssertHeaderHost { host } => {
                let actual = self.harness.pager.header().host();
                if actual != host {
                    return Err(format!("header host is {:?}, expected {:?}", actual, host));
                }
            }
            ScenarioStep::AssertPageOffset { page, y, tolerance } => {
                self.require_mounted(page)?;
                let actual = self
                    .harness
                    .page_offset(page)
                    .ok_or_else(|| format!("page {} has no surface", page))?;
                if (actual - y).abs() > tolerance {
                    return Err(format!("page {} offset is {}, expected {}", page, actual, y));
                }
            }
        }
        Ok(())
    }

    fn require_mounted(&self, page: usize) -> Result<(), String> {
        if self.harness.pager.is_page_mounted(page) {
            Ok(())
        } else {
            Err(format!("page {} is not mounted", page))
        }
    }

    fn step(&mut self) {
        self.harness.step();
        self.frames += 1;
    }

    fn run_until_idle(&mut self) -> Result<(), String> {
        let mut frames = 0;
        while !self.harness.is_idle() {
            if frames >= MAX_IDLE_FRAMES {
                return Err(format!("still moving after {} frames", frames));
            }
            self.step();
            frames += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_scenario_passes() {
        let outcome = run_scenario(r#"{ "steps": [] }"#).unwrap();
        assert!(!outcome.is_failed());
        assert_eq!(outcome.report().elapsed_frames, 0);
    }

    #[test]
    fn test_drag_on_unmounted_page_fails() {
        let outcome = run_scenario(r#"{ "steps": [{ "type": "drag", "page": 2, "dy": 10 }] }"#)
            .unwrap();
        assert!(outcome.is_failed());
        let report = outcome.report();
        assert_eq!(report.failed_step_index, Some(0));
        assert_eq!(report.step.as_deref(), Some("drag"));
    }

    #[test]
    fn test_elapsed_time_counts_ticks() {
        let outcome = run_scenario(
            r#"{
                "layout": { "frame_ms": 10 },
                "steps": [{ "type": "tick", "frames": 5 }]
            }"#,
        )
        .unwrap();
        assert_eq!(outcome.report().elapsed_frames, 5);
        assert_eq!(outcome.report().elapsed_ms, 50);
    }
}
