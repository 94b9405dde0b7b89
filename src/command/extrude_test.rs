use std::cell::RefCell;

use cancel::State;
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use gizmo::{Camera, InputEvent, PointerEvent};

use super::*;

type Slot = Rc<RefCell<Option<Result<(), CommandError>>>>;

fn spawn(pool: &LocalPool, command: &Rc<ExtrudeCommand>) -> Slot {
    let slot: Slot = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&slot);
    let future = Rc::clone(command).execute();
    pool.spawner()
        .spawn_local(async move {
            let result = future.await;
            *sink.borrow_mut() = Some(result);
        })
        .expect("spawn");
    slot
}

fn pointer(world: Vec3) -> PointerEvent {
    PointerEvent { position: Camera::default().project(world), ..PointerEvent::default() }
}

fn drag(viewport: &Viewport, from: Vec3, to: Vec3) {
    viewport.dispatch(InputEvent::PointerMove(pointer(from))).expect("hover");
    viewport.dispatch(InputEvent::PointerDown(pointer(from).primary())).expect("down");
    viewport.dispatch(InputEvent::PointerMove(pointer(to))).expect("move");
}

fn provisional(command: &ExtrudeCommand) -> ExtrudeParams {
    command.factory().provisional().expect("provisional params")
}

#[test]
fn drag_updates_provisional_and_finish_commits() {
    let viewport = Viewport::new();
    let command = Rc::new(ExtrudeCommand::new(&viewport));
    let mut pool = LocalPool::new();
    let result = spawn(&pool, &command);
    pool.run_until_stalled();
    assert_eq!(command.registrar().state(), State::Awaiting);
    assert_eq!(viewport.presenter_count(), 1);
    assert!(!viewport.selection_enabled());

    drag(&viewport, Vec3::Y, Vec3::new(0.0, 2.5, 0.0));
    viewport.dispatch(InputEvent::PointerUp(pointer(Vec3::new(0.0, 2.5, 0.0)).primary())).expect("up");
    assert!((provisional(&command).distance - 2.5).abs() < 1e-3);
    pool.run_until_stalled();
    assert!(result.borrow().is_none(), "persistent composite keeps running");

    command.registrar().finish();
    pool.run_until_stalled();
    assert_eq!(*result.borrow(), Some(Ok(())));
    let committed = command.factory().committed().expect("committed");
    assert!((committed.distance - 2.5).abs() < 1e-3);
    assert_eq!(command.registrar().state(), State::Finished);
    assert_eq!(viewport.listener_count(), 0);
    assert_eq!(viewport.presenter_count(), 0);
    assert!(viewport.selection_enabled());
}

#[test]
fn interrupt_commits_the_rolled_back_value() {
    let viewport = Viewport::new();
    let command = Rc::new(ExtrudeCommand::new(&viewport));
    let mut pool = LocalPool::new();
    let result = spawn(&pool, &command);
    pool.run_until_stalled();

    drag(&viewport, Vec3::Y, Vec3::new(0.0, 4.0, 0.0));
    assert!((provisional(&command).distance - 4.0).abs() < 1e-3);

    command.registrar().interrupt();
    pool.run_until_stalled();
    assert_eq!(*result.borrow(), Some(Ok(())));
    assert_eq!(command.factory().committed(), Some(ExtrudeParams::default()));
    assert_eq!(command.registrar().state(), State::Awaiting);
}

#[test]
fn cancel_discards_and_rejects() {
    let viewport = Viewport::new();
    let command = Rc::new(ExtrudeCommand::new(&viewport));
    let mut pool = LocalPool::new();
    let result = spawn(&pool, &command);
    pool.run_until_stalled();

    drag(&viewport, Vec3::Y, Vec3::new(0.0, 3.0, 0.0));
    command.registrar().cancel();
    pool.run_until_stalled();

    let outcome = result.borrow_mut().take().expect("settled");
    let err = outcome.expect_err("cancelled");
    assert!(err.is_lifecycle());
    assert!(command.factory().committed().is_none());
    assert_eq!(command.report().expect("serializable"), serde_json::Value::Null);
    assert_eq!(viewport.listener_count(), 0);
}

#[test]
fn typed_taper_is_degrees() {
    let viewport = Viewport::new();
    let command = Rc::new(ExtrudeCommand::new(&viewport));
    let mut pool = LocalPool::new();
    let _result = spawn(&pool, &command);
    pool.run_until_stalled();

    viewport.dispatch(InputEvent::Command("gizmo:extrude:taper".into())).expect("bound");
    viewport.dispatch(InputEvent::KeyPress("1".into())).expect("key");
    viewport.dispatch(InputEvent::KeyPress("5".into())).expect("key");
    assert!((provisional(&command).taper - 15.0_f32.to_radians()).abs() < 1e-4);

    command.registrar().finish();
    let report = command.report().expect("serializable");
    assert_eq!(report["distance"], serde_json::json!(1.0));
}

#[test]
fn distance_is_clamped_at_zero() {
    let viewport = Viewport::new();
    let command = Rc::new(ExtrudeCommand::new(&viewport));
    let mut pool = LocalPool::new();
    let _result = spawn(&pool, &command);
    pool.run_until_stalled();

    drag(&viewport, Vec3::Y, Vec3::new(0.0, -2.0, 0.0));
    assert_eq!(provisional(&command).distance, 0.0);
}
