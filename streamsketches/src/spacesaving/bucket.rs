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

//! Groups of counters sharing one count value.

use crate::spacesaving::arena::SlotId;
use crate::spacesaving::counter::Counter;
use crate::spacesaving::counter::CounterId;

/// A bucket holds every counter whose count equals `value`, in the order they were added.
///
/// Members are linked through the counters themselves, so adding, removing and evicting
/// are O(1). Buckets are linked to their neighbours in the ascending bucket list via
/// `prev` and `next`.
#[derive(Debug, Clone)]
pub(crate) struct Bucket {
    id: SlotId,
    value: u64,
    head: Option<CounterId>,
    tail: Option<CounterId>,
    len: usize,
    pub(crate) prev: Option<SlotId>,
    pub(crate) next: Option<SlotId>,
}

impl Bucket {
    pub(crate) fn new(id: SlotId, value: u64, prev: Option<SlotId>, next: Option<SlotId>) -> Self {
        Self {
            id,
            value,
            head: None,
            tail: None,
            len: 0,
            prev,
            next,
        }
    }

    pub(crate) fn value(&self) -> u64 {
        self.value
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Oldest member.
    pub(crate) fn head(&self) -> Option<CounterId> {
        self.head
    }

    /// Most recently added member.
    pub(crate) fn tail(&self) -> Option<CounterId> {
        self.tail
    }

    /// Appends `id` to the members and makes this bucket its owner.
    pub(crate) fn add<T, V>(&mut self, id: CounterId, counters: &mut [Counter<T, V>]) {
        {
            let counter = &mut counters[id.index()];
            counter.count = self.value;
            counter.prev = self.tail;
            counter.next = None;
            counter.attach(self.id);
        }
        match self.tail {
            Some(tail) => counters[tail.index()].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
    }

    /// Unlinks `id` from the members and detaches it.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a member of this bucket.
    pub(crate) fn remove<T, V>(&mut self, id: CounterId, counters: &mut [Counter<T, V>]) {
        let (prev, next) = {
            let counter = &mut counters[id.index()];
            assert_eq!(
                counter.bucket,
                Some(self.id),
                "counter {} is not a member of the bucket with value {}",
                id.index(),
                self.value
            );
            counter.detach();
            (counter.prev.take(), counter.next.take())
        };
        match prev {
            Some(prev) => counters[prev.index()].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => counters[next.index()].prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
    }

    /// Evicts the most recently added member and reuses its counter for `item`.
    ///
    /// The newcomer inherits the evicted count both as its count and as its error bound,
    /// and stays in this bucket. Returns the reused counter and the evicted item.
    ///
    /// # Panics
    ///
    /// Panics if the bucket is empty.
    pub(crate) fn evict_and_replace<T, V>(
        &mut self,
        item: T,
        payload: Option<V>,
        counters: &mut [Counter<T, V>],
    ) -> (CounterId, T) {
        let Some(victim) = self.tail else {
            panic!(
                "cannot evict from the empty bucket with value {}",
                self.value
            );
        };
        self.remove(victim, counters);
        let evicted = {
            let counter = &mut counters[victim.index()];
            counter.error = counter.count;
            counter.payload = payload;
            std::mem::replace(&mut counter.item, item)
        };
        self.add(victim, counters);
        (victim, evicted)
    }
}
