//! Liveness token for view-owned async work.
//!
//! A view creates a [`ViewScope`] when it mounts and closes it when it
//! unmounts. Tasks spawned by the view check [`ViewScope::is_active`]
//! before touching view state. Closing never cancels the network call
//! itself, so a dispatched add/remove still completes and still
//! invalidates the shared collection cache.

use std::cell::Cell;
use std::rc::Rc;

/// Shared flag cleared when the owning view goes away.
#[derive(Debug, Clone)]
pub struct ViewScope {
    active: Rc<Cell<bool>>,
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewScope {
    /// Open scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: Rc::new(Cell::new(true)),
        }
    }

    /// Whether the view is still mounted.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Mark the view as gone; every clone observes it.
    pub fn close(&self) {
        self.active.set(false);
    }

    /// Pass `value` through only while the view is mounted.
    #[must_use]
    pub fn deliver<T>(&self, value: T) -> Option<T> {
        self.is_active().then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closing_is_visible_to_clones() {
        let scope = ViewScope::new();
        let task_copy = scope.clone();
        assert_eq!(task_copy.deliver(1), Some(1));
        scope.close();
        assert!(!task_copy.is_active());
        assert_eq!(task_copy.deliver(2), None);
    }
}
