//! Integration tests for start-trigger synchronization driven from rig
//! configuration files.

use noise_exp::config::IoConfig;
use noise_exp::hardware::{Controller, IoController};
use noise_exp::manifest::{IoManifest, LifecycleEvent};
use noise_exp::{connect_trigger, SyncError, SyncOutcome};
use std::io::Write;
use tempfile::NamedTempFile;
use tracing_test::traced_test;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temp config");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp config");
    file
}

fn controller_from(contents: &str) -> (IoConfig, IoController) {
    let file = write_config(contents);
    let config = IoConfig::load_from(file.path()).expect("Config should load");
    config.validate().expect("Config should validate");
    let controller = IoController::from_config(&config).expect("Controller should build");
    (config, controller)
}

const TWO_ENGINES: &str = r#"
[[engines]]
name = "E1"

[[engines.channels]]
name = "speaker"
channel = "devA/ao0"
direction = "out"
start_trigger = "/devB/ai/StartTrigger"

[[engines]]
name = "E2"

[[engines.channels]]
name = "mic"
channel = "devB/ai0"
direction = "in"
"#;

#[test]
#[traced_test]
fn output_engine_becomes_master() {
    let (_, mut controller) = controller_from(TWO_ENGINES);

    let report = connect_trigger(&mut controller).expect("Synchronization should succeed");

    assert_eq!(
        report.outcome,
        SyncOutcome::Synchronized {
            reference: "devA/ao0".into(),
            device: "devA".into(),
            direction: "ao".into(),
            trigger: "/devA/ao/StartTrigger".into(),
            master_engine: "E1".into(),
        }
    );
    assert_eq!(report.assignment("devA/ao0").map(|a| a.start_trigger.as_str()), Some(""));
    assert_eq!(
        report.assignment("devB/ai0").map(|a| a.start_trigger.as_str()),
        Some("/devA/ao/StartTrigger")
    );

    let master = controller.master_engine().expect("Master engine should be set");
    assert_eq!(master.name(), "E1");

    assert!(logs_contain("Setting speaker (devA/ao0) start_trigger to \"\""));
    assert!(logs_contain("Setting master engine to E1"));
}

#[test]
#[traced_test]
fn no_active_channels_is_a_noop() {
    let (_, mut controller) = controller_from(
        r#"
[[engines]]
name = "E1"

[[engines.channels]]
name = "speaker"
channel = "devA/ao0"
direction = "out"
active = false
start_trigger = "/devB/ai/StartTrigger"
"#,
    );

    let report = connect_trigger(&mut controller).expect("Synchronization should succeed");

    assert_eq!(report.outcome, SyncOutcome::Idle);
    assert!(controller.master_engine().is_none());
    assert!(logs_contain("No channels are active"));
}

#[test]
#[traced_test]
fn single_active_channel_clears_trigger() {
    let (_, mut controller) = controller_from(
        r#"
[[engines]]
name = "E1"

[[engines.channels]]
name = "mic"
channel = "devB/ai0"
direction = "in"
start_trigger = "/devA/ao/StartTrigger"
"#,
    );

    let report = connect_trigger(&mut controller).expect("Synchronization should succeed");

    assert_eq!(report.assignments.len(), 1);
    assert_eq!(report.assignments[0].start_trigger, "");
    assert!(controller.master_engine().is_none());
    assert!(logs_contain("Only one channel active"));
}

#[test]
fn disabled_engines_are_not_registered() {
    let (config, mut controller) = controller_from(
        r#"
[[engines]]
name = "E1"

[[engines.channels]]
name = "speaker"
channel = "devA/ao0"
direction = "out"

[[engines]]
name = "E2"
enabled = false

[[engines.channels]]
name = "shaker"
channel = "devB/ao0"
direction = "out"
"#,
    );
    assert_eq!(config.engines.len(), 2);
    assert_eq!(controller.len(), 1);

    let report = connect_trigger(&mut controller).expect("Synchronization should succeed");
    assert!(matches!(report.outcome, SyncOutcome::FreeRunning { .. }));
}

#[test]
fn bundled_rig_config_synchronizes_to_speaker() {
    let config = IoConfig::from_toml_str(include_str!("../config/io.toml"))
        .expect("Bundled config should parse");
    config.validate().expect("Bundled config should validate");
    let mut controller = IoController::from_config(&config).expect("Controller should build");

    let report = IoManifest::from_config(&config)
        .handle(LifecycleEvent::ExperimentPrepare, &mut controller)
        .expect("Synchronization should succeed")
        .expect("Prepare should produce a report");

    assert_eq!(report.trigger(), Some("/PXI1Slot7/ao/StartTrigger"));
    assert_eq!(report.master_engine(), Some("NI_audio"));
    assert_eq!(
        report.assignment("PXI1Slot8/ai0").map(|a| a.start_trigger.as_str()),
        Some("/PXI1Slot7/ao/StartTrigger")
    );
    // Software-timed and inactive channels are left out.
    assert_eq!(report.assignments.len(), 2);
}

#[test]
fn substring_mode_reports_missing_master() {
    let (config, mut controller) = controller_from(
        r#"
[synchronization]
match_mode = "substring"

[[engines]]
name = "E1"

[[engines.channels]]
name = "line"
channel = "devA/port0"
direction = "out"

[[engines.channels]]
name = "mic"
channel = "devA/ai0"
direction = "in"
"#,
    );

    let err = IoManifest::from_config(&config)
        .handle(LifecycleEvent::ExperimentPrepare, &mut controller)
        .unwrap_err();

    assert!(matches!(err, SyncError::NoMasterEngine { .. }));
    assert!(controller.master_engine().is_none());
}

#[test]
#[traced_test]
fn overlapping_device_names_are_flagged() {
    let (_, mut controller) = controller_from(
        r#"
[[engines]]
name = "E1"

[[engines.channels]]
name = "speaker"
channel = "Dev1/ao0"
direction = "out"

[[engines]]
name = "E2"

[[engines.channels]]
name = "mic"
channel = "Dev10/ai0"
direction = "in"
"#,
    );

    let report = connect_trigger(&mut controller).expect("Synchronization should succeed");

    assert_eq!(
        report.assignment("Dev10/ai0").map(|a| a.start_trigger.as_str()),
        Some("/Dev1/ao/StartTrigger")
    );
    assert!(logs_contain("Device names overlap"));
}
