//! Fixed-capacity entity pools
//!
//! Every slot carries an `active` flag. Spawning claims the first inactive
//! slot; a full pool drops the request. Updates walk every slot and skip
//! inactive ones.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// An entity that lives in a [`Pool`] slot
pub trait Slot {
    fn is_active(&self) -> bool;
    fn deactivate(&mut self);
}

/// Fixed-capacity slot array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool<T> {
    slots: Vec<T>,
}

impl<T: Slot + Default + Clone> Pool<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![T::default(); capacity],
        }
    }

    /// Place `entity` in the first free slot
    ///
    /// Returns the slot index, or `None` when the pool is full.
    pub fn spawn(&mut self, entity: T) -> Option<usize> {
        let index = self.slots.iter().position(|s| !s.is_active())?;
        self.slots[index] = entity;
        Some(index)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).filter(|s| s.is_active())
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).filter(|s| s.is_active())
    }

    /// Active entities with their slot index
    pub fn iter_active(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots.iter().enumerate().filter(|(_, s)| s.is_active())
    }

    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, s)| s.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_active()).count()
    }

    /// Deactivate every slot
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(Slot::deactivate);
    }
}

impl<T> Index<usize> for Pool<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.slots[index]
    }
}

impl<T> IndexMut<usize> for Pool<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.slots[index]
    }
}
