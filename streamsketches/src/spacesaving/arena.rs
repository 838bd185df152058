// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Slot storage addressed by stable handles.

use std::ops::Index;
use std::ops::IndexMut;

/// Stable handle to an occupied arena slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SlotId(usize);

impl SlotId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// Vector of optional slots with a free list, so handles stay valid until their slot is removed.
#[derive(Debug, Clone)]
pub(crate) struct SlotArena<T> {
    slots: Vec<Option<T>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<T> SlotArena<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Stores the value built by `make`, which receives the handle the value will live under.
    pub(crate) fn insert_with(&mut self, make: impl FnOnce(SlotId) -> T) -> SlotId {
        let idx = match self.free_list.pop() {
            Some(idx) => {
                self.slots[idx] = Some(make(SlotId(idx)));
                idx
            }
            None => {
                let idx = self.slots.len();
                self.slots.push(Some(make(SlotId(idx))));
                idx
            }
        };
        self.len += 1;
        SlotId(idx)
    }

    /// Removes and returns the value stored under `id`.
    ///
    /// # Panics
    ///
    /// Panics if the slot is vacant.
    pub(crate) fn remove(&mut self, id: SlotId) -> T {
        let value = self
            .slots
            .get_mut(id.0)
            .and_then(Option::take)
            .unwrap_or_else(|| panic!("slot {} is vacant", id.0));
        self.free_list.push(id.0);
        self.len -= 1;
        value
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.len = 0;
    }
}

impl<T> Index<SlotId> for SlotArena<T> {
    type Output = T;

    fn index(&self, id: SlotId) -> &T {
        match self.slots.get(id.0) {
            Some(Some(value)) => value,
            _ => panic!("slot {} is vacant", id.0),
        }
    }
}

impl<T> IndexMut<SlotId> for SlotArena<T> {
    fn index_mut(&mut self, id: SlotId) -> &mut T {
        match self.slots.get_mut(id.0) {
            Some(Some(value)) => value,
            _ => panic!("slot {} is vacant", id.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove_reuse() {
        let mut arena = SlotArena::with_capacity(4);
        let a = arena.insert_with(|id| (id, "a"));
        let b = arena.insert_with(|id| (id, "b"));
        assert_eq!(arena.len(), 2);
        assert_eq!(arena[a], (a, "a"));
        assert_eq!(arena[b], (b, "b"));

        assert_eq!(arena.remove(a), (a, "a"));
        assert_eq!(arena.len(), 1);

        let c = arena.insert_with(|id| (id, "c"));
        assert_eq!(c.index(), a.index());
        assert_eq!(arena[c], (c, "c"));
        assert_eq!(arena.len(), 2);

        arena.clear();
        assert_eq!(arena.len(), 0);
    }

    #[test]
    #[should_panic(expected = "slot 0 is vacant")]
    fn test_index_vacant_slot_panics() {
        let mut arena = SlotArena::with_capacity(1);
        let id = arena.insert_with(|_| 7u64);
        arena.remove(id);
        let _ = arena[id];
    }
}
