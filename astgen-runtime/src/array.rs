//! Growable homogeneous container
//!
//! `NodeArray` follows the contract of the generated `<T>Array` operations:
//! a fresh array owns no buffer, the first write allocates [`MIN_CAPACITY`]
//! slots, later growth doubles, and `free` drops the buffer and returns the
//! array to its freshly initialized state. Dropping the slots never touches
//! what the slots refer to.

use log::trace;
use std::slice;

/// Capacity of the first buffer allocated by [`NodeArray::write`]
pub const MIN_CAPACITY: usize = 8;

/// `GROW_CAPACITY`: minimum first, then doubling
pub fn grow_capacity(capacity: usize) -> usize {
    if capacity < MIN_CAPACITY {
        MIN_CAPACITY
    } else {
        capacity * 2
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeArray<T> {
    capacity: usize,
    slots: Vec<T>,
}

impl<T> NodeArray<T> {
    /// `init<T>Array`: count 0, capacity 0, no buffer
    pub fn new() -> Self {
        Self {
            capacity: 0,
            slots: Vec::new(),
        }
    }

    /// `write<T>Array`: grow if full, then append
    pub fn write(&mut self, element: T) {
        if self.capacity < self.slots.len() + 1 {
            let old_capacity = self.capacity;
            self.capacity = grow_capacity(old_capacity);
            self.slots.reserve_exact(self.capacity - self.slots.len());
            trace!("NodeArray grew from {} to {} slots", old_capacity, self.capacity);
        }
        self.slots.push(element);
    }

    /// `free<T>Array`: drop the buffer and reset
    pub fn free(&mut self) {
        *self = Self::new();
    }

    /// Empty the array, handing back its elements in order
    pub fn take(&mut self) -> Vec<T> {
        let slots = std::mem::take(&mut self.slots);
        self.free();
        slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True once a buffer has been allocated (capacity > 0)
    pub fn has_buffer(&self) -> bool {
        self.capacity > 0
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.slots
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.slots.iter()
    }
}

impl<T> Default for NodeArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a NodeArray<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
