//! Per-pass render context and positional state hooks.
//!
//! A [`RenderContext`] is created at the start of every render pass and
//! dropped at its end. Its cursor starts at zero, and every `use_state` call
//! claims the next position in the root's hook list:
//!
//! ```ignore
//! fn counter(cx: &mut RenderContext) -> Node {
//!     let (count, set_count) = cx.use_state(0);       // position 0
//!     let (label, _) = cx.use_state("Count".to_string()); // position 1
//!     element!("button", label, ": ", count)
//!         .on("click", move |_| set_count.update(|c| c + 1))
//!         .into_node()
//! }
//! ```
//!
//! Positions are only stable if a component makes the same `use_state` calls
//! in the same order on every pass. Conditional or loop-dependent calls shift
//! later positions onto unrelated slots. When the shifted slot holds a
//! different type the old slot is freed and a fresh one is created with a
//! warning, so setters and handles for the old slot stop resolving; when the type
//! happens to match, the wrong value is read without any report. Components
//! that need state independent of call order should hold [`State`] handles
//! created through a [`StateScope`] instead.

use std::any::type_name;

use super::state::{Setter, State, StateScope};
use super::store::SlotId;

pub struct RenderContext {
    scope: StateScope,
    hooks: Vec<SlotId>,
    cursor: usize,
}

impl RenderContext {
    pub(crate) fn new(scope: StateScope, hooks: Vec<SlotId>) -> Self {
        Self {
            scope,
            hooks,
            cursor: 0,
        }
    }

    pub(crate) fn into_hooks(self) -> Vec<SlotId> {
        self.hooks
    }

    /// Declare a state value at the next position.
    ///
    /// On the first pass that reaches this position `initial` is stored. On
    /// later passes the current value is returned and `initial` is ignored.
    pub fn use_state<T: Clone + PartialEq + 'static>(&mut self, initial: T) -> (T, Setter<T>) {
        self.use_state_with(move || initial)
    }

    /// Like [`use_state`](Self::use_state), but only computes the initial
    /// value when the slot is first created.
    pub fn use_state_with<T, F>(&mut self, init: F) -> (T, Setter<T>)
    where
        T: Clone + PartialEq + 'static,
        F: FnOnce() -> T,
    {
        let position = self.cursor;
        self.cursor += 1;

        let existing = self.hooks.get(position).copied();
        let current = existing.and_then(|slot| {
            self.scope
                .store()
                .borrow()
                .get::<T>(slot)
                .ok()
                .map(|value| (slot, value))
        });

        let (slot, value) = match current {
            Some(found) => found,
            None => {
                let value = init();
                let mut store = self.scope.store().borrow_mut();
                let slot = store.insert(value.clone());
                if let Some(old) = existing {
                    store.remove(old);
                    log::warn!(
                        "State read #{} expected {} but its slot holds another type; \
                         re-initializing. Are state reads conditional?",
                        position,
                        type_name::<T>()
                    );
                    self.hooks[position] = slot;
                } else {
                    self.hooks.push(slot);
                }
                drop(store);
                (slot, value)
            }
        };

        (value, Setter::new(slot, self.scope.clone()))
    }

    /// Like [`use_state`](Self::use_state), but returns a full [`State`]
    /// handle that can also read the latest value later, e.g. from a listener.
    pub fn use_state_handle<T: Clone + PartialEq + 'static>(&mut self, initial: T) -> State<T> {
        let (_, setter) = self.use_state(initial);
        State::new(setter.slot(), self.scope.clone())
    }

    /// Number of state reads made so far in this pass.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn scope(&self) -> &StateScope {
        &self.scope
    }
}
