#[cfg(test)]
#[path = "disposable_test.rs"]
mod disposable_test;

use std::fmt;

/// A cleanup action that runs at most once.
///
/// Dropping a `Disposable` does not run it; ownership of cleanup is explicit.
#[must_use = "a Disposable does nothing unless disposed"]
#[derive(Default)]
pub struct Disposable {
    action: Option<Box<dyn FnOnce()>>,
}

impl Disposable {
    pub fn new(action: impl FnOnce() + 'static) -> Self {
        Self { action: Some(Box::new(action)) }
    }

    /// A disposable with nothing to clean up.
    pub fn empty() -> Self {
        Self { action: None }
    }

    /// Run the cleanup action if it has not run yet.
    pub fn dispose(&mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.action.is_none()
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable").field("disposed", &self.is_disposed()).finish()
    }
}

/// Ordered collection of disposables, disposed together.
///
/// Anything added after disposal is disposed immediately.
#[derive(Debug, Default)]
pub struct CompositeDisposable {
    items: Vec<Disposable>,
    disposed: bool,
}

impl CompositeDisposable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mut disposable: Disposable) {
        if self.disposed {
            disposable.dispose();
        } else {
            self.items.push(disposable);
        }
    }

    /// Dispose every item in insertion order.
    pub fn dispose(&mut self) {
        self.disposed = true;
        for mut item in self.items.drain(..) {
            item.dispose();
        }
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
