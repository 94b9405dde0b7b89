#[cfg(test)]
#[path = "value_test.rs"]
mod value_test;

/// Committed and provisional value of one gizmo.
///
/// `original` is the last committed value; `current` is what the user is
/// dragging or typing right now. Pointer-up commits with [`push`](Self::push),
/// interruption rolls back with [`interrupt`](Self::interrupt).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueState<T: Copy> {
    original: T,
    current: T,
    interrupt_reverts: bool,
}

impl<T: Copy> ValueState<T> {
    pub fn new(value: T) -> Self {
        Self { original: value, current: value, interrupt_reverts: true }
    }

    /// A state whose interruption keeps the provisional value.
    pub fn sticky(value: T) -> Self {
        Self { interrupt_reverts: false, ..Self::new(value) }
    }

    pub fn original(&self) -> T {
        self.original
    }

    pub fn current(&self) -> T {
        self.current
    }

    /// Replace both committed and provisional value.
    pub fn set_original(&mut self, value: T) {
        self.original = value;
        self.current = value;
    }

    pub fn set_current(&mut self, value: T) {
        self.current = value;
    }

    /// Commit the provisional value.
    pub fn push(&mut self) {
        self.original = self.current;
    }

    /// Discard the provisional value.
    pub fn revert(&mut self) {
        self.current = self.original;
    }

    pub fn interrupt(&mut self) {
        if self.interrupt_reverts {
            self.revert();
        }
    }
}
