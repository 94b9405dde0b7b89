use std::cell::RefCell;

use glam::Vec3;

use super::*;

fn recorder(
    log: &Rc<RefCell<Vec<&'static str>>>,
    tag: &'static str,
) -> impl Fn(&InputEvent) -> Result<(), GizmoError> + use<> {
    let log = Rc::clone(log);
    move |_| {
        log.borrow_mut().push(tag);
        Ok(())
    }
}

fn moved() -> InputEvent {
    InputEvent::PointerMove(PointerEvent::at(0.1, 0.1))
}

#[derive(Default)]
struct Follower {
    seen: RefCell<Vec<Vec3>>,
}

impl Helper for Follower {
    fn update(&self, camera: &Camera) {
        self.seen.borrow_mut().push(camera.eye);
    }
}

// =============================================================================
// listeners
// =============================================================================

#[test]
fn phases_run_in_order_regardless_of_registration() {
    let viewport = Viewport::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let _document = viewport.add_listener(Phase::Document, recorder(&log, "document"));
    let _bubble = viewport.add_listener(Phase::Bubble, recorder(&log, "bubble"));
    let _capture = viewport.add_listener(Phase::Capture, recorder(&log, "capture"));

    viewport.dispatch(moved()).expect("dispatch");
    assert_eq!(*log.borrow(), vec!["capture", "bubble", "document"]);
    assert_eq!(viewport.listener_count(), 3);
    assert_eq!(viewport.listener_count_in(Phase::Bubble), 1);
}

#[test]
fn disposing_removes_the_listener() {
    let viewport = Viewport::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut listener = viewport.add_listener(Phase::Bubble, recorder(&log, "hover"));
    listener.dispose();
    viewport.dispatch(moved()).expect("dispatch");
    assert!(log.borrow().is_empty());
    assert_eq!(viewport.listener_count(), 0);
}

#[test]
fn listener_removed_mid_dispatch_is_skipped() {
    let viewport = Viewport::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let victim: Rc<RefCell<Option<Disposable>>> = Rc::new(RefCell::new(None));
    let _remover = {
        let victim = Rc::clone(&victim);
        viewport.add_listener(Phase::Capture, move |_| {
            if let Some(mut d) = victim.borrow_mut().take() {
                d.dispose();
            }
            Ok(())
        })
    };
    *victim.borrow_mut() = Some(viewport.add_listener(Phase::Document, recorder(&log, "late")));

    viewport.dispatch(moved()).expect("dispatch");
    assert!(log.borrow().is_empty());
    assert_eq!(viewport.listener_count(), 1);
}

#[test]
fn listener_added_mid_dispatch_sees_next_event() {
    let viewport = Viewport::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let added: Rc<RefCell<Vec<Disposable>>> = Rc::new(RefCell::new(Vec::new()));
    let _adder = {
        let weak = Rc::downgrade(&viewport);
        let log = Rc::clone(&log);
        let added = Rc::clone(&added);
        viewport.add_listener(Phase::Capture, move |_| {
            if let Some(viewport) = weak.upgrade() {
                if added.borrow().is_empty() {
                    added.borrow_mut().push(viewport.add_listener(Phase::Document, recorder(&log, "added")));
                }
            }
            Ok(())
        })
    };

    viewport.dispatch(moved()).expect("first");
    assert!(log.borrow().is_empty());
    viewport.dispatch(moved()).expect("second");
    assert_eq!(*log.borrow(), vec!["added"]);
}

#[test]
fn first_error_stops_dispatch() {
    let viewport = Viewport::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let _failing = viewport.add_listener(Phase::Capture, |_| Err(GizmoError::CorruptIntersection));
    let _after = viewport.add_listener(Phase::Bubble, recorder(&log, "after"));
    assert_eq!(viewport.dispatch(moved()), Err(GizmoError::CorruptIntersection));
    assert!(log.borrow().is_empty());
}

#[test]
fn pointer_events_record_last_pointer() {
    let viewport = Viewport::new();
    assert!(viewport.last_pointer().is_none());
    viewport.dispatch(InputEvent::PointerDown(PointerEvent::at(0.3, -0.2).primary())).expect("dispatch");
    viewport.dispatch(InputEvent::KeyPress("1".into())).expect("dispatch");
    let last = viewport.last_pointer().expect("recorded");
    assert_eq!(last.position, glam::Vec2::new(0.3, -0.2));
}

// =============================================================================
// commands
// =============================================================================

#[test]
fn bound_command_runs_until_disposed() {
    let viewport = Viewport::new();
    let calls = Rc::new(Cell::new(0));
    let mut binding = {
        let calls = Rc::clone(&calls);
        viewport.bind_command("gizmo:move:x", move || {
            calls.set(calls.get() + 1);
            Ok(())
        })
    };
    assert_eq!(viewport.commands(), vec!["gizmo:move:x".to_string()]);
    viewport.dispatch(InputEvent::Command("gizmo:move:x".into())).expect("bound");
    assert_eq!(calls.get(), 1);

    binding.dispose();
    let err = viewport.dispatch(InputEvent::Command("gizmo:move:x".into())).expect_err("unbound");
    assert_eq!(err, GizmoError::UnknownCommand("gizmo:move:x".into()));
    assert_eq!(calls.get(), 1);
}

#[test]
fn commands_do_not_reach_listeners() {
    let viewport = Viewport::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let _listener = viewport.add_listener(Phase::Capture, recorder(&log, "capture"));
    let _binding = viewport.bind_command("gizmo:a", || Ok(()));
    viewport.dispatch(InputEvent::Command("gizmo:a".into())).expect("bound");
    assert!(log.borrow().is_empty());
}

// =============================================================================
// helpers and locks
// =============================================================================

#[test]
fn helpers_follow_the_camera_until_removed() {
    let viewport = Viewport::new();
    let follower = Rc::new(Follower::default());
    let mut helper = viewport.add_helper(Rc::clone(&follower) as Rc<dyn Helper>);
    assert_eq!(follower.seen.borrow().len(), 1);

    let moved = Camera::look_at(Vec3::new(5.0, 5.0, 5.0), Vec3::ZERO, Vec3::Y);
    viewport.set_camera(moved);
    assert_eq!(follower.seen.borrow().last(), Some(&Vec3::new(5.0, 5.0, 5.0)));
    assert_eq!(viewport.camera(), moved);

    helper.dispose();
    assert_eq!(viewport.helper_count(), 0);
    viewport.set_camera(Camera::default());
    assert_eq!(follower.seen.borrow().len(), 2);
}

#[test]
fn locks_are_counted() {
    let viewport = Viewport::new();
    let mut a = viewport.disable_controls();
    let mut b = viewport.disable_controls();
    assert!(!viewport.controls_enabled());
    a.dispose();
    a.dispose();
    assert!(!viewport.controls_enabled());
    b.dispose();
    assert!(viewport.controls_enabled());

    let mut selection = viewport.disable_selection();
    assert!(!viewport.selection_enabled());
    selection.dispose();
    assert!(viewport.selection_enabled());

    let mut presenter = viewport.show_presenter();
    assert_eq!(viewport.presenter_count(), 1);
    presenter.dispose();
    assert_eq!(viewport.presenter_count(), 0);
}
