use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::error::StateError;

use super::runtime::RenderTrigger;
use super::store::{SlotId, StateStore};

/// Access to a root's state store, used to create explicit [`State`] handles.
///
/// Handed to the factory passed to [`App::mount_with`](crate::App::mount_with)
/// so a component can allocate its state once, at instance creation, instead
/// of relying on the order of `use_state` calls.
#[derive(Clone)]
pub struct StateScope {
    store: Rc<RefCell<StateStore>>,
    trigger: RenderTrigger,
}

impl StateScope {
    pub(crate) fn new(store: Rc<RefCell<StateStore>>, trigger: RenderTrigger) -> Self {
        Self { store, trigger }
    }

    /// A scope backed by its own store and not attached to any root. Writes
    /// are stored but never render.
    pub fn detached() -> Self {
        Self::new(Rc::default(), RenderTrigger::default())
    }

    pub fn create_state<T: 'static>(&self, initial: T) -> State<T> {
        let slot = self.store.borrow_mut().insert(initial);
        State::new(slot, self.clone())
    }

    /// Number of live slots in the store.
    pub fn slot_count(&self) -> usize {
        self.store.borrow().len()
    }

    pub(crate) fn store(&self) -> &Rc<RefCell<StateStore>> {
        &self.store
    }

    fn write(&self, result: Result<bool, StateError>) {
        match result {
            Ok(true) => {
                if !self.trigger.notify() {
                    log::debug!("State changed with no mounted root; skipping render");
                }
            }
            Ok(false) => {}
            Err(err) => log::warn!("Ignoring state write: {}", err),
        }
    }
}

/// A handle to one state slot.
///
/// Reading never renders. Writing a different value performs a full render
/// pass of the owning root before returning.
pub struct State<T> {
    slot: SlotId,
    scope: StateScope,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot,
            scope: self.scope.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: 'static> State<T> {
    pub(crate) fn new(slot: SlotId, scope: StateScope) -> Self {
        Self {
            slot,
            scope,
            _marker: PhantomData,
        }
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn try_with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, StateError> {
        self.scope.store.borrow().with(self.slot, f)
    }

    /// Borrow the current value.
    ///
    /// # Panics
    /// If the slot was freed. Slots from [`StateScope::create_state`] are never
    /// freed; a slot from [`RenderContext::use_state_handle`] is freed when a
    /// later pass reads a different type at its position. Use
    /// [`try_with`](Self::try_with) where that can happen.
    ///
    /// [`RenderContext::use_state_handle`]: super::RenderContext::use_state_handle
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.try_with(f)
            .expect("state slot was freed by a re-initialized hook")
    }

    /// Write-only half of this handle, for moving into event listeners.
    pub fn setter(&self) -> Setter<T> {
        Setter::new(self.slot, self.scope.clone())
    }
}

impl<T: Clone + 'static> State<T> {
    pub fn get(&self) -> T {
        self.with(T::clone)
    }
}

impl<T: PartialEq + 'static> State<T> {
    /// Overwrite the value, rendering if it changed.
    pub fn set(&self, value: T) {
        self.setter().set(value);
    }
}

impl<T: Clone + PartialEq + 'static> State<T> {
    /// Replace the value with `f(current)`, rendering if it changed.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        self.setter().update(f);
    }
}

/// Write-only handle to a state slot, as returned by `use_state`.
pub struct Setter<T> {
    slot: SlotId,
    scope: StateScope,
    _marker: PhantomData<fn(T)>,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot,
            scope: self.scope.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: 'static> Setter<T> {
    pub(crate) fn new(slot: SlotId, scope: StateScope) -> Self {
        Self {
            slot,
            scope,
            _marker: PhantomData,
        }
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }
}

impl<T: PartialEq + 'static> Setter<T> {
    /// Overwrite the value. Renders synchronously if the value changed.
    pub fn set(&self, value: T) {
        let result = self.scope.store.borrow_mut().set(self.slot, value);
        self.scope.write(result);
    }
}

impl<T: Clone + PartialEq + 'static> Setter<T> {
    /// Replace the value with `f(current)`. Renders synchronously if the value
    /// changed.
    ///
    /// `f` runs without the store borrowed, so it may read other state.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let current = self.scope.store.borrow().get::<T>(self.slot);
        let result = current.and_then(|current| {
            let next = f(&current);
            self.scope.store.borrow_mut().set(self.slot, next)
        });
        self.scope.write(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_state_and_get() {
        let scope = StateScope::detached();
        let count = scope.create_state(42);
        assert_eq!(count.get(), 42);
        assert_eq!(scope.slot_count(), 1);
    }

    #[test]
    fn test_set_overwrites() {
        let scope = StateScope::detached();
        let count = scope.create_state(10);
        count.set(20);
        assert_eq!(count.get(), 20);
        count.set(20);
        assert_eq!(count.get(), 20);
    }

    #[test]
    fn test_update_is_left_fold() {
        let scope = StateScope::detached();
        let count = scope.create_state(0);
        let set_count = count.setter();
        for _ in 0..3 {
            set_count.update(|c| c + 1);
        }
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_update_may_read_other_state() {
        let scope = StateScope::detached();
        let step = scope.create_state(5);
        let total = scope.create_state(1);
        let reader = step.clone();
        total.update(move |t| t + reader.get());
        assert_eq!(total.get(), 6);
    }

    #[test]
    fn test_clones_share_slot() {
        let scope = StateScope::detached();
        let a = scope.create_state(String::from("a"));
        let b = a.clone();
        b.set(String::from("b"));
        assert_eq!(a.get(), "b");
        assert_eq!(a.slot(), b.setter().slot());
    }

    #[test]
    fn test_with_borrows() {
        let scope = StateScope::detached();
        let items = scope.create_state(vec![1, 2, 3]);
        assert_eq!(items.with(|v| v.iter().sum::<i32>()), 6);
    }
}
