use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use super::handle::Handle;

/// Slot storage for tree nodes. Removed slots go on a free list and are handed out again by
/// the next [`insert`](Arena::insert), so handles stay small and dense.
#[derive(Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Number of occupied slots.
    pub(crate) const fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn insert(&mut self, element: T) -> Handle {
        if let Some(handle) = self.free.pop() {
            self.slots[handle.index()] = Some(element);
            return handle;
        }

        assert!(self.slots.len() <= Handle::MAX, "`Arena::insert()` - arena is full ({} slots)!", Handle::MAX + 1);
        self.slots.push(Some(element));
        Handle::new(self.slots.len() - 1)
    }

    /// Vacates the slot behind `handle` and returns its element.
    pub(crate) fn remove(&mut self, handle: Handle) -> T {
        let element = self.slots[handle.index()].take().expect("`Arena::remove()` - `handle` is vacant!");
        self.free.push(handle);
        element
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

impl<T> Index<Handle> for Arena<T> {
    type Output = T;

    #[inline]
    fn index(&self, handle: Handle) -> &T {
        self.slots[handle.index()].as_ref().expect("`Arena::index()` - `handle` is vacant!")
    }
}

impl<T> IndexMut<Handle> for Arena<T> {
    #[inline]
    fn index_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.index()].as_mut().expect("`Arena::index_mut()` - `handle` is vacant!")
    }
}
