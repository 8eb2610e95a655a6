use std::any::{type_name, Any};

use crate::error::StateError;

/// Identifier of a state slot.
///
/// Generational like node handles: a removed slot's index can be reused, but
/// ids issued before the removal stop resolving.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SlotId {
    index: u32,
    generation: u32,
}

struct Slot {
    generation: u32,
    value: Option<Box<dyn Any>>,
}

/// Arena of type-erased state values.
#[derive(Default)]
pub struct StateStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value in a fresh slot.
    pub fn insert<T: 'static>(&mut self, value: T) -> SlotId {
        let boxed: Box<dyn Any> = Box::new(value);
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(boxed);
            return SlotId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(boxed),
        });
        SlotId {
            index,
            generation: 0,
        }
    }

    fn value(&self, id: SlotId) -> Result<&dyn Any, StateError> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_deref())
            .ok_or(StateError::StaleSlot(id))
    }

    fn value_mut(&mut self, id: SlotId) -> Result<&mut dyn Any, StateError> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_deref_mut())
            .ok_or(StateError::StaleSlot(id))
    }

    /// Borrow a slot's value.
    pub fn with<T: 'static, R>(&self, id: SlotId, f: impl FnOnce(&T) -> R) -> Result<R, StateError> {
        let value = self
            .value(id)?
            .downcast_ref::<T>()
            .ok_or(StateError::TypeMismatch {
                slot: id,
                expected: type_name::<T>(),
            })?;
        Ok(f(value))
    }

    /// Get a clone of a slot's value.
    pub fn get<T: Clone + 'static>(&self, id: SlotId) -> Result<T, StateError> {
        self.with(id, T::clone)
    }

    /// Overwrite a slot. Returns whether the stored value changed.
    pub fn set<T: PartialEq + 'static>(&mut self, id: SlotId, value: T) -> Result<bool, StateError> {
        let current = self
            .value_mut(id)?
            .downcast_mut::<T>()
            .ok_or(StateError::TypeMismatch {
                slot: id,
                expected: type_name::<T>(),
            })?;

        if *current == value {
            return Ok(false);
        }
        *current = value;
        Ok(true)
    }

    /// Free a slot. Returns `false` if it was already gone.
    pub fn remove(&mut self, id: SlotId) -> bool {
        let Some(slot) = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
        else {
            return false;
        };

        if slot.value.take().is_none() {
            return false;
        }
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        true
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.value(id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
