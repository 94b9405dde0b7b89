use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::executor::block_on;

use super::*;
use crate::operation::{Hooks, Operation, Settler};

#[derive(Debug, Default)]
struct Counting {
    cancelled: Cell<u32>,
    finished: Cell<u32>,
    interrupted: Cell<u32>,
}

impl Registrable for Counting {
    fn cancel(&self) {
        self.cancelled.set(self.cancelled.get() + 1);
    }

    fn finish(&self) {
        self.finished.set(self.finished.get() + 1);
    }

    fn interrupt(&self) {
        self.interrupted.set(self.interrupted.get() + 1);
    }
}

struct Exploding;

impl Registrable for Exploding {
    fn cancel(&self) {
        panic!("resource blew up");
    }

    fn finish(&self) {
        panic!("resource blew up");
    }

    fn interrupt(&self) {}
}

/// Appends `(index, verb)` to a shared log for every call.
struct Recording {
    index: usize,
    log: Rc<RefCell<Vec<(usize, &'static str)>>>,
}

impl Registrable for Recording {
    fn cancel(&self) {
        self.log.borrow_mut().push((self.index, "cancel"));
    }

    fn finish(&self) {
        self.log.borrow_mut().push((self.index, "finish"));
    }

    fn interrupt(&self) {
        self.log.borrow_mut().push((self.index, "interrupt"));
    }

    fn ignore_rejection(&self) {
        self.log.borrow_mut().push((self.index, "ignore_rejection"));
    }
}

fn counting() -> Rc<Counting> {
    Rc::new(Counting::default())
}

#[test]
fn interrupt_when_not_awaiting_ends_interrupted() {
    let registrar = Registrar::new();
    registrar.interrupt();
    assert_eq!(registrar.state(), State::Interrupted);
}

#[test]
fn interrupt_when_awaiting_keeps_state_until_finish() {
    let registrar = Registrar::new();
    let finished = registrar.finished().expect("from none");
    assert_eq!(registrar.state(), State::Awaiting);

    registrar.interrupt();
    assert_eq!(registrar.state(), State::Awaiting);

    assert_eq!(block_on(finished), Ok(()));
    registrar.finish();
    assert_eq!(registrar.state(), State::Finished);
}

#[test]
fn interrupt_with_resource_when_awaiting_does_not_finish_it() {
    let registrar = Registrar::new();
    let finished = registrar.finished().expect("from none");
    let resource = registrar.register(counting()).expect("live");

    registrar.interrupt();
    assert_eq!(resource.interrupted.get(), 1);
    assert_eq!(resource.finished.get(), 0);

    registrar.finish();
    assert_eq!(resource.finished.get(), 1);
    assert_eq!(block_on(finished), Ok(()));
}

#[test]
fn finish_cascades_to_resources() {
    let registrar = Registrar::new();
    let resource = registrar.register(counting()).expect("live");
    registrar.finish();
    assert_eq!(resource.finished.get(), 1);
    assert_eq!(registrar.state(), State::Finished);
}

#[test]
fn cancel_cascades_once() {
    let registrar = Registrar::new();
    let resource = registrar.register(counting()).expect("live");
    registrar.cancel();
    registrar.cancel();
    registrar.cancel();
    registrar.finish();
    assert_eq!(resource.cancelled.get(), 1);
    assert_eq!(resource.finished.get(), 0);
    assert_eq!(registrar.state(), State::Cancelled);
}

#[test]
fn cancel_visits_resources_once_in_registration_order() {
    let registrar = Registrar::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    for index in 0..3 {
        registrar.register(Rc::new(Recording { index, log: Rc::clone(&log) })).expect("live");
    }
    registrar.cancel();
    registrar.cancel();
    registrar.finish();
    registrar.interrupt();

    assert_eq!(
        *log.borrow(),
        vec![
            (0, "ignore_rejection"),
            (0, "cancel"),
            (1, "ignore_rejection"),
            (1, "cancel"),
            (2, "ignore_rejection"),
            (2, "cancel"),
        ]
    );
}

#[test]
fn cancelled_operation_resource_is_marked_handled_first() {
    let registrar = Registrar::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    registrar.register(Rc::new(Recording { index: 0, log: Rc::clone(&log) })).expect("live");
    let op = registrar.register(Operation::<()>::new(|_| Hooks::noop())).expect("live");
    registrar.register(Rc::new(Recording { index: 2, log: Rc::clone(&log) })).expect("live");

    registrar.cancel();
    assert_eq!(op.state(), State::Cancelled);
    assert_eq!(op.peek(), Some(Err(OperationError::Cancelled { origin: op.id() })));
    let order: Vec<usize> = log.borrow().iter().filter(|(_, verb)| *verb == "cancel").map(|(i, _)| *i).collect();
    assert_eq!(order, vec![0, 2]);
}

#[test]
fn register_after_end_cancels_resource_and_errors() {
    let registrar = Registrar::new();
    registrar.finish();
    let resource = counting();
    let err = registrar.register(Rc::clone(&resource)).expect_err("ended");
    assert_eq!(err, RegistrarError::AlreadyFinished { state: State::Finished });
    assert_eq!(resource.cancelled.get(), 1);
    assert!(registrar.is_empty());
}

#[test]
fn finished_twice_is_an_error() {
    let registrar = Registrar::new();
    let _first = registrar.finished().expect("from none");
    assert!(registrar.finished().is_err());
}

#[test]
fn ensure_runs_once_on_any_exit() {
    for verb in [Registrar::cancel, Registrar::finish, Registrar::interrupt] {
        let registrar = Registrar::new();
        let runs = Rc::new(Cell::new(0));
        let spy = Rc::clone(&runs);
        registrar.ensure(move || spy.set(spy.get() + 1)).expect("live");
        verb(&registrar);
        verb(&registrar);
        registrar.cancel();
        assert_eq!(runs.get(), 1);
    }
}

#[test]
fn ensure_after_end_runs_immediately() {
    let registrar = Registrar::new();
    registrar.cancel();
    let ran = Rc::new(Cell::new(false));
    let spy = Rc::clone(&ran);
    assert!(registrar.ensure(move || spy.set(true)).is_err());
    assert!(ran.get());
}

#[test]
fn ensure_runs_after_the_cascade() {
    let registrar = Registrar::new();
    let resource = registrar.register(counting()).expect("live");
    let seen = Rc::new(Cell::new(u32::MAX));
    {
        let resource = Rc::clone(&resource);
        let seen = Rc::clone(&seen);
        registrar.ensure(move || seen.set(resource.finished.get())).expect("live");
    }
    registrar.finish();
    assert_eq!(seen.get(), 1);
}

#[test]
fn finished_resolves_when_tracked_operations_resolve() {
    let registrar = Registrar::new();
    let op = registrar.register(Operation::resolve(3_u8)).expect("live");
    let finished = registrar.finished().expect("from none");
    assert!(op.is_settled());
    assert_eq!(block_on(finished), Ok(()));
}

#[test]
fn finished_rejects_with_first_operation_rejection() {
    let registrar = Registrar::new();
    let mut slot = None;
    let op = Operation::new(|settler: Settler<()>| {
        slot = Some(settler);
        Hooks::noop()
    });
    let op = registrar.register(op).expect("live");
    let finished = registrar.finished().expect("from none");
    slot.expect("factory ran").fail("nothing selected");
    let err = block_on(finished).expect_err("rejected");
    assert_eq!(err.origin(), op.id());
}

#[test]
fn cancel_cancels_registered_operations() {
    let registrar = Registrar::new();
    let op = registrar.register(Operation::<()>::new(|_| Hooks::noop())).expect("live");
    registrar.cancel();
    assert_eq!(op.state(), State::Cancelled);
}

#[test]
fn nested_registrars_cascade() {
    let outer = Registrar::new();
    let inner = outer.register(Registrar::new()).expect("live");
    let resource = inner.register(counting()).expect("live");
    outer.cancel();
    assert_eq!(inner.state(), State::Cancelled);
    assert_eq!(resource.cancelled.get(), 1);
}

#[test]
fn panicking_resource_does_not_stop_cascade() {
    let registrar = Registrar::new();
    registrar.register(Rc::new(Exploding)).expect("live");
    let resource = registrar.register(counting()).expect("live");
    registrar.cancel();
    assert_eq!(resource.cancelled.get(), 1);
    assert_eq!(registrar.state(), State::Cancelled);
}

#[test]
fn panicking_ensure_does_not_block_other_cleanups() {
    let registrar = Registrar::new();
    let ran = Rc::new(Cell::new(false));
    registrar.ensure(|| panic!("cleanup blew up")).expect("live");
    {
        let ran = Rc::clone(&ran);
        registrar.ensure(move || ran.set(true)).expect("live");
    }
    registrar.cancel();
    assert!(ran.get());
    assert_eq!(registrar.state(), State::Cancelled);
}
