//! nestpage scenario replay
//!
//! Replays JSON gesture scenarios against a simulated nested pager and
//! reports the first failed assertion.

pub mod report;
pub mod runner;
pub mod scenario;

pub use report::{ReportStatus, ScenarioReport};
pub use runner::{run_loaded_scenario, run_scenario, RunOutcome};
pub use scenario::{Scenario, ScenarioStep};
