use gizmo::{Camera, InputEvent, PointerEvent, Viewport};
use glam::Vec3;

use super::*;
use crate::command::{ExtrudeCommand, MoveCommand, RotateCommand};

fn pointer(world: Vec3) -> PointerEvent {
    PointerEvent { position: Camera::default().project(world), ..PointerEvent::default() }
}

fn drag(viewport: &Viewport, from: Vec3, to: Vec3) {
    viewport.dispatch(InputEvent::PointerMove(pointer(from))).expect("hover");
    viewport.dispatch(InputEvent::PointerDown(pointer(from).primary())).expect("down");
    viewport.dispatch(InputEvent::PointerMove(pointer(to))).expect("move");
}

fn release(viewport: &Viewport, at: Vec3) {
    viewport.dispatch(InputEvent::PointerUp(pointer(at).primary())).expect("up");
}

#[test]
fn runs_enqueued_command_until_finished() {
    let viewport = Viewport::new();
    let executor = Executor::new();
    executor.enqueue(Rc::new(ExtrudeCommand::new(&viewport))).expect("spawn");
    assert!(!executor.is_idle());
    assert_eq!(executor.active_title(), None);

    executor.run_until_stalled();
    assert_eq!(executor.active_title(), Some("extrude"));

    drag(&viewport, Vec3::Y, Vec3::new(0.0, 3.0, 0.0));
    release(&viewport, Vec3::new(0.0, 3.0, 0.0));
    assert!(executor.finish_active());
    executor.run_until_stalled();

    assert!(executor.is_idle());
    let reports = executor.take_reports();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.title, "extrude");
    assert_eq!(report.outcome, Outcome::Completed);
    assert_eq!(report.state, "finished");
    assert!(report.error.is_none());
    let distance = report.params["distance"].as_f64().expect("distance");
    assert!((distance - 3.0).abs() < 1e-3);
    assert!(executor.take_reports().is_empty());
}

#[test]
fn enqueue_interrupts_active_command_with_committed_values() {
    let viewport = Viewport::new();
    let executor = Executor::new();
    executor.enqueue(Rc::new(ExtrudeCommand::new(&viewport))).expect("spawn");
    executor.run_until_stalled();

    // Mid-drag when the next tool arrives: the drag is rolled back.
    drag(&viewport, Vec3::Y, Vec3::new(0.0, 5.0, 0.0));
    executor.enqueue(Rc::new(RotateCommand::new(&viewport, false))).expect("spawn");
    executor.run_until_stalled();
    assert_eq!(executor.active_title(), Some("rotate"));

    let reports = executor.take_reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].title, "extrude");
    assert_eq!(reports[0].outcome, Outcome::Interrupted);
    assert_eq!(reports[0].params["distance"], serde_json::json!(1.0));
    assert_eq!(viewport.commands(), vec!["gizmo:rotate".to_string()]);
}

#[test]
fn single_drag_command_completes_by_itself() {
    let viewport = Viewport::new();
    let executor = Executor::new();
    executor.enqueue(Rc::new(MoveCommand::new(&viewport, false))).expect("spawn");
    executor.run_until_stalled();

    let knob = Vec3::new(0.5, 0.5, 0.0);
    drag(&viewport, knob, knob + Vec3::X);
    release(&viewport, knob + Vec3::X);
    executor.run_until_stalled();

    assert!(executor.is_idle());
    let reports = executor.take_reports();
    assert_eq!(reports[0].outcome, Outcome::Completed);
    let x = reports[0].params["offset"][0].as_f64().expect("x");
    assert!((x - 1.0).abs() < 1e-3);
}

#[test]
fn cancel_discards_provisional_values() {
    let viewport = Viewport::new();
    let executor = Executor::new();
    executor.enqueue(Rc::new(ExtrudeCommand::new(&viewport))).expect("spawn");
    executor.run_until_stalled();

    drag(&viewport, Vec3::Y, Vec3::new(0.0, 2.0, 0.0));
    assert!(executor.cancel_active());
    executor.run_until_stalled();

    let reports = executor.take_reports();
    assert_eq!(reports[0].outcome, Outcome::Cancelled);
    assert_eq!(reports[0].state, "cancelled");
    assert_eq!(reports[0].params, serde_json::Value::Null);
    assert!(reports[0].error.is_some());
    assert_eq!(viewport.listener_count(), 0);
}

#[test]
fn enqueue_before_start_replaces_queued_command() {
    let viewport = Viewport::new();
    let executor = Executor::new();
    executor.enqueue(Rc::new(MoveCommand::new(&viewport, false))).expect("spawn");
    executor.enqueue(Rc::new(RotateCommand::new(&viewport, false))).expect("spawn");
    executor.run_until_stalled();
    assert_eq!(executor.active_title(), Some("rotate"));
    assert!(executor.take_reports().is_empty());
}

#[test]
fn shutdown_finishes_active_command() {
    let viewport = Viewport::new();
    let executor = Executor::new();
    executor.enqueue(Rc::new(RotateCommand::new(&viewport, true))).expect("spawn");
    executor.shutdown();
    assert!(executor.is_idle());
    assert!(!executor.finish_active());
    let reports = executor.take_reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].outcome, Outcome::Completed);
    assert_eq!(reports[0].params["radians"], serde_json::json!(0.0));
}

#[test]
fn interrupt_active_is_reported() {
    let viewport = Viewport::new();
    let executor = Executor::new();
    executor.enqueue(Rc::new(ExtrudeCommand::new(&viewport))).expect("spawn");
    executor.run_until_stalled();
    assert!(executor.interrupt_active());
    executor.run_until_stalled();
    let reports = executor.take_reports();
    assert_eq!(reports[0].outcome, Outcome::Interrupted);
    assert_eq!(reports[0].state, "finished");
}

#[test]
fn report_serializes_without_empty_error() {
    let viewport = Viewport::new();
    let executor = Executor::new();
    executor.enqueue(Rc::new(RotateCommand::new(&viewport, true))).expect("spawn");
    executor.shutdown();
    let json = serde_json::to_value(executor.take_reports()).expect("serializable");
    assert_eq!(json[0]["outcome"], "completed");
    assert!(json[0].get("error").is_none());
    assert!(json[0]["id"].is_string());
}
