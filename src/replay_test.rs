use crate::executor::Outcome;

use super::*;

fn config(command: CommandKind) -> ReplayConfig {
    ReplayConfig { command, ..ReplayConfig::default() }
}

fn steps(text: &str) -> Vec<Step> {
    script::parse(text).expect("valid script")
}

// =============================================================================
// Full runs
// =============================================================================

#[test]
fn extrude_drag_then_finish() {
    let replay = Replay::new(config(CommandKind::Extrude));
    let reports = replay
        .run(&steps(
            r#"[
                { "step": "pointer_move", "at": [0, 1, 0] },
                { "step": "pointer_down", "at": [0, 1, 0] },
                { "step": "pointer_move", "at": [0, 3, 0] },
                { "step": "pointer_up", "at": [0, 3, 0] },
                { "step": "finish" }
            ]"#,
        ))
        .expect("replay");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].outcome, Outcome::Completed);
    let distance = reports[0].params["distance"].as_f64().expect("distance");
    assert!((distance - 3.0).abs() < 1e-3);
    assert_eq!(replay.viewport().listener_count(), 0);
}

#[test]
fn move_completes_without_finish_step() {
    let replay = Replay::new(config(CommandKind::Move));
    let reports = replay
        .run(&steps(
            r#"[
                { "step": "pointer_move", "at": [0.5, 0.5, 0] },
                { "step": "pointer_down", "at": [0.5, 0.5, 0] },
                { "step": "pointer_move", "at": [1.5, 1.0, 0] },
                { "step": "pointer_up", "at": [1.5, 1.0, 0] }
            ]"#,
        ))
        .expect("replay");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].title, "move");
    assert_eq!(reports[0].outcome, Outcome::Completed);
    let y = reports[0].params["offset"][1].as_f64().expect("y");
    assert!((y - 0.5).abs() < 1e-3);
}

#[test]
fn run_step_interrupts_the_active_command() {
    let replay = Replay::new(config(CommandKind::Extrude));
    let reports = replay.run(&steps(r#"[{ "step": "run", "command": "rotate" }]"#)).expect("replay");
    let outcomes: Vec<(&str, Outcome)> = reports.iter().map(|r| (r.title, r.outcome)).collect();
    assert_eq!(outcomes, vec![("extrude", Outcome::Interrupted), ("rotate", Outcome::Completed)]);
    assert_eq!(reports[0].params["distance"], serde_json::json!(1.0));
}

#[test]
fn cancel_step_discards_params() {
    let replay = Replay::new(config(CommandKind::Extrude));
    let reports = replay
        .run(&steps(
            r#"[
                { "step": "pointer_move", "at": [0, 1, 0] },
                { "step": "pointer_down", "at": [0, 1, 0] },
                { "step": "pointer_move", "at": [0, 2, 0] },
                { "step": "cancel" }
            ]"#,
        ))
        .expect("replay");
    assert_eq!(reports[0].outcome, Outcome::Cancelled);
    assert_eq!(reports[0].params, serde_json::Value::Null);
}

#[test]
fn keyboard_command_types_taper() {
    let replay = Replay::new(config(CommandKind::Extrude));
    let reports = replay
        .run(&steps(
            r#"[
                { "step": "pointer_move", "x": 0.0, "y": -0.5 },
                { "step": "command", "name": "gizmo:extrude:taper" },
                { "step": "key", "key": "3" },
                { "step": "key", "key": "0" },
                { "step": "pointer_up", "x": 0.0, "y": -0.5 },
                { "step": "finish" }
            ]"#,
        ))
        .expect("replay");
    let taper = reports[0].params["taper"].as_f64().expect("taper");
    assert!((taper - 30_f64.to_radians()).abs() < 1e-3);
}

// =============================================================================
// Steps
// =============================================================================

#[test]
fn unknown_command_fails_with_step_index() {
    let replay = Replay::new(config(CommandKind::Rotate));
    let err = replay
        .run(&steps(r#"[{ "step": "finish" }, { "step": "command", "name": "gizmo:nope" }]"#))
        .expect_err("unbound command");
    match err {
        ReplayError::Step { index, step, source } => {
            assert_eq!(index, 1);
            assert_eq!(step, "command");
            assert_eq!(source, GizmoError::UnknownCommand("gizmo:nope".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(replay.executor().is_idle());
}

#[test]
fn camera_step_moves_the_camera() {
    let replay = Replay::new(config(CommandKind::Rotate));
    replay.start().expect("start");
    replay.step(0, &Step::Camera { eye: [0.0, 0.0, 20.0], target: [0.0; 3] }).expect("camera");
    assert_eq!(replay.viewport().camera().eye, Vec3::new(0.0, 0.0, 20.0));
}

#[test]
fn executor_steps_without_active_command_are_ignored() {
    let replay = Replay::new(config(CommandKind::Rotate));
    assert!(replay.step(0, &Step::Finish).is_ok());
    assert!(replay.step(1, &Step::Interrupt).is_ok());
    assert!(replay.executor().take_reports().is_empty());
}

#[test]
fn load_reports_missing_file() {
    let err = load(Path::new("does/not/exist.json")).expect_err("missing");
    assert!(matches!(err, ReplayError::Io { .. }));
    assert!(err.to_string().contains("does/not/exist.json"));
}
