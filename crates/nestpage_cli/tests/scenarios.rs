//! Integration tests replaying the bundled demo scenarios

use nestpage_cli::{run_loaded_scenario, run_scenario, ReportStatus, Scenario};
use nestpage_pager::PagerConfig;

const FULL_STICK: &str = include_str!("../../../demos/full_stick.json");
const REBOUND_SWITCH: &str = include_str!("../../../demos/rebound_switch.json");
const SWIPE: &str = include_str!("../../../demos/swipe.json");
const PAGER_TOML: &str = include_str!("../../../demos/pager.toml");

#[test]
fn test_full_stick_demo_passes() {
    let outcome = run_scenario(FULL_STICK).unwrap();
    assert_eq!(outcome.report().status, ReportStatus::Passed, "{:?}", outcome.report());
}

#[test]
fn test_rebound_switch_demo_passes() {
    let outcome = run_scenario(REBOUND_SWITCH).unwrap();
    assert!(!outcome.is_failed(), "{:?}", outcome.report());
    assert_eq!(outcome.report().settled_pages, vec![1]);
}

#[test]
fn test_swipe_demo_passes() {
    let outcome = run_scenario(SWIPE).unwrap();
    assert!(!outcome.is_failed(), "{:?}", outcome.report());
    assert_eq!(outcome.report().settled_pages, vec![1, 3]);
    assert!(outcome.report().elapsed_frames >= 4);
}

#[test]
fn test_config_override_changes_outcome() {
    let scenario = Scenario::from_json(FULL_STICK).unwrap();
    let config = PagerConfig::default();

    // Without a sticky offset the pin goes all the way to -100
    let outcome = run_loaded_scenario(&scenario, Some(&config));
    assert!(outcome.is_failed());
    let report = outcome.report();
    assert_eq!(report.failed_step_index, Some(2));
    assert_eq!(report.step.as_deref(), Some("assert_pin"));
}

#[test]
fn test_demo_config_parses() {
    let config = PagerConfig::from_toml_str(PAGER_TOML).unwrap();
    assert_eq!(config.sticky_offset, 20.0);
    assert!(config.interrupts_scrolling_when_transitioning_to_full_stick);
}

#[test]
fn test_failed_assertion_stops_the_run() {
    let outcome = run_scenario(
        r#"{
            "steps": [
                { "type": "assert_current_index", "index": 2 },
                { "type": "tick", "frames": 10 }
            ]
        }"#,
    )
    .unwrap();

    assert!(outcome.is_failed());
    assert_eq!(outcome.report().elapsed_frames, 0);
    assert!(outcome
        .report()
        .message
        .as_deref()
        .unwrap()
        .contains("expected 2"));
}
