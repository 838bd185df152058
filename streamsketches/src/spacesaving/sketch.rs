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

//! Space-Saving summary implementation.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::error::Error;
use crate::spacesaving::arena::SlotArena;
use crate::spacesaving::arena::SlotId;
use crate::spacesaving::bucket::Bucket;
use crate::spacesaving::builder::SpaceSavingBuilder;
use crate::spacesaving::builder::check_phi;
use crate::spacesaving::counter::Counter;
use crate::spacesaving::counter::CounterId;
use crate::spacesaving::counter::CounterView;

/// Result of a frequent items query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequentItems<T> {
    threshold: u64,
    guaranteed: bool,
    items: Vec<T>,
}

impl<T> FrequentItems<T> {
    /// Returns the count threshold, `ceil(phi * N)`, the items were selected against.
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Returns true if every reported item has a lower bound at or above the threshold.
    ///
    /// When false, at least one reported item may be a false positive.
    pub fn is_guaranteed(&self) -> bool {
        self.guaranteed
    }

    /// Returns the reported items ordered by descending count.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Consumes the result and returns the reported items.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// Result of a top-k query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopK<T> {
    guaranteed: bool,
    order: bool,
    min_guaranteed_frequency: Option<u64>,
    items: Vec<T>,
}

impl<T> TopK<T> {
    /// Always false: proving that the reported set is exactly the true top-k is not computed.
    ///
    /// Do not read a false value as evidence that the answer is wrong.
    pub fn is_guaranteed(&self) -> bool {
        self.guaranteed
    }

    /// Returns true if the reported ranking holds for the true frequencies.
    ///
    /// This is the case when the lower bound of every item is at least the count of the
    /// item ranked right after it.
    pub fn is_order_correct(&self) -> bool {
        self.order
    }

    /// Returns the smallest lower bound among the reported items, if any.
    pub fn min_guaranteed_frequency(&self) -> Option<u64> {
        self.min_guaranteed_frequency
    }

    /// Returns the reported items ordered by descending count.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Consumes the result and returns the reported items.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// Space-Saving summary over a stream of items of type `T`.
///
/// At most `capacity` items are monitored at any time. Each monitored item carries an
/// observed count, which never underestimates its true frequency, and an error bound, so
/// the true frequency lies in `[count - error, count]`. An optional payload of type `V`
/// can be attached when an item enters the summary.
///
/// Counters are grouped into buckets of equal count, kept in a list ordered by ascending
/// count. An update moves one counter to the adjacent bucket, and an eviction takes a
/// member of the first bucket, so both run in constant time regardless of capacity.
///
/// Mutation requires `&mut self`; producers on several threads must serialize their
/// updates, e.g. behind a `Mutex`.
#[derive(Clone)]
pub struct SpaceSaving<T, V = ()> {
    capacity: usize,
    phi: f64,
    stream_length: u64,
    index: HashMap<T, CounterId>,
    counters: Vec<Counter<T, V>>,
    buckets: SlotArena<Bucket>,
    // Bucket with the smallest count.
    head: Option<SlotId>,
    // Bucket with the largest count.
    tail: Option<SlotId>,
    // Best-effort pointer to the bucket at the frequent threshold for the default phi.
    threshold_bucket: Option<SlotId>,
}

impl<T: Hash + Eq + Clone> SpaceSaving<T> {
    /// Creates a summary monitoring at most `capacity` items, with default frequency
    /// fraction `phi`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid)
    /// if `capacity` is zero or `phi` is not in `(0, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use streamsketches::spacesaving::SpaceSaving;
    ///
    /// let mut sketch = SpaceSaving::new(8, 0.1).unwrap();
    /// sketch.update("a");
    /// assert_eq!(sketch.estimate(&"a"), 1);
    /// ```
    pub fn new(capacity: usize, phi: f64) -> Result<Self, Error> {
        SpaceSavingBuilder::default().phi(phi).build(capacity)
    }
}

impl<T: Hash + Eq + Clone, V> SpaceSaving<T, V> {
    pub(crate) fn with_config(capacity: usize, phi: f64) -> Self {
        tracing::debug!(capacity, phi, "created space-saving summary");
        Self {
            capacity,
            phi,
            stream_length: 0,
            index: HashMap::with_capacity(capacity),
            counters: Vec::with_capacity(capacity),
            buckets: SlotArena::with_capacity(capacity),
            head: None,
            tail: None,
            threshold_bucket: None,
        }
    }

    /// Returns the maximum number of monitored items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the default frequency fraction.
    pub fn phi(&self) -> f64 {
        self.phi
    }

    /// Returns the number of updates applied so far.
    pub fn stream_length(&self) -> u64 {
        self.stream_length
    }

    /// Returns the number of items currently monitored.
    pub fn num_monitored(&self) -> usize {
        self.index.len()
    }

    /// Returns true if no item is monitored.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns true if `item` is currently monitored.
    pub fn contains(&self, item: &T) -> bool {
        self.index.contains_key(item)
    }

    /// Returns the observed count of `item`, or 0 if it is not monitored.
    pub fn estimate(&self, item: &T) -> u64 {
        self.counter(item).map_or(0, |counter| counter.count)
    }

    /// Returns the guaranteed minimum frequency of `item`.
    pub fn lower_bound(&self, item: &T) -> u64 {
        self.counter(item).map_or(0, Counter::lower_bound)
    }

    /// Returns the maximum possible frequency of `item`.
    ///
    /// An item that is not monitored may have been evicted earlier, so once the summary is
    /// full its frequency is bounded by the smallest monitored count.
    pub fn upper_bound(&self, item: &T) -> u64 {
        match self.counter(item) {
            Some(counter) => counter.count,
            None if self.index.len() >= self.capacity => self.min_count(),
            None => 0,
        }
    }

    /// Returns the error bound of `item`, if it is monitored.
    pub fn error(&self, item: &T) -> Option<u64> {
        self.counter(item).map(|counter| counter.error)
    }

    /// Returns the payload recorded when `item` entered the summary.
    pub fn payload(&self, item: &T) -> Option<&V> {
        self.counter(item)
            .and_then(|counter| counter.payload.as_ref())
    }

    /// Returns the monitored counters ordered by ascending count.
    ///
    /// Counters with equal counts appear in the order they reached that count.
    pub fn counters(&self) -> impl Iterator<Item = CounterView<'_, T, V>> + '_ {
        self.ascending().map(Counter::view)
    }

    /// Returns the count of the bucket the frequent threshold pointer rests on.
    ///
    /// The pointer is maintained on a best-effort basis after every update and is not used
    /// by the queries; it is exposed for diagnostics.
    pub fn frequent_threshold_count(&self) -> Option<u64> {
        self.threshold_bucket
            .or(self.head)
            .map(|bucket| self.buckets[bucket].value())
    }

    /// Updates the summary with one occurrence of `item`.
    pub fn update(&mut self, item: T) {
        self.update_inner(item, None);
    }

    /// Updates the summary with one occurrence of `item`, attaching `payload` if the item
    /// is not monitored yet.
    ///
    /// The payload of an already monitored item is left unchanged.
    pub fn update_with_payload(&mut self, item: T, payload: V) {
        self.update_inner(item, Some(payload));
    }

    /// Returns the items whose count exceeds `ceil(phi * N)` for the default phi.
    pub fn frequent_items(&self) -> FrequentItems<T> {
        self.collect_frequent(self.phi)
    }

    /// Returns the items whose count exceeds `ceil(phi * N)`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid)
    /// if `phi` is not in `(0, 1]`.
    pub fn frequent_items_with_phi(&self, phi: f64) -> Result<FrequentItems<T>, Error> {
        let phi = check_phi(phi)?;
        Ok(self.collect_frequent(phi))
    }

    /// Returns the `min(k, num_monitored)` items with the highest counts.
    pub fn top_k(&self, k: usize) -> TopK<T> {
        let top: Vec<&Counter<T, V>> = self.descending().take(k).collect();
        let order = top
            .windows(2)
            .all(|pair| pair[0].lower_bound() >= pair[1].count);
        let min_guaranteed_frequency = top.iter().map(|counter| counter.lower_bound()).min();
        TopK {
            guaranteed: false,
            order,
            min_guaranteed_frequency,
            items: top.iter().map(|counter| counter.item.clone()).collect(),
        }
    }

    /// Resets the summary to an empty state, keeping capacity and phi.
    pub fn reset(&mut self) {
        tracing::debug!(
            stream_length = self.stream_length,
            monitored = self.index.len(),
            "reset space-saving summary"
        );
        self.stream_length = 0;
        self.index.clear();
        self.counters.clear();
        self.buckets.clear();
        self.head = None;
        self.tail = None;
        self.threshold_bucket = None;
    }

    /// Renders the bucket list and every counter for debugging. The format is not stable.
    ///
    /// # Examples
    ///
    /// ```
    /// use streamsketches::spacesaving::SpaceSaving;
    ///
    /// let mut sketch = SpaceSaving::new(2, 0.5).unwrap();
    /// sketch.update("a");
    /// assert!(sketch.dump().contains("\"a\" count=1 error=0"));
    /// ```
    pub fn dump(&self) -> String
    where
        T: fmt::Debug,
    {
        format!("{self:?}")
    }

    /// Checks the structural invariants of the summary.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvariantViolated`](crate::error::ErrorKind::InvariantViolated)
    /// describing the first violation found.
    pub fn validate(&self) -> Result<(), Error> {
        if self.index.len() > self.capacity {
            let error = Error::invariant_violated("more items monitored than capacity allows")
                .with_context("monitored", self.index.len())
                .with_context("capacity", self.capacity);
            return Err(error);
        }
        if self.index.len() != self.counters.len() {
            let error = Error::invariant_violated("index and counters disagree")
                .with_context("indexed", self.index.len())
                .with_context("counters", self.counters.len());
            return Err(error);
        }

        let mut num_buckets = 0usize;
        let mut num_members = 0usize;
        let mut previous: Option<SlotId> = None;
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let bucket = &self.buckets[id];
            num_buckets += 1;
            if num_buckets > self.buckets.len() {
                return Err(Error::invariant_violated("bucket list contains a cycle"));
            }
            if bucket.prev != previous {
                let error = Error::invariant_violated("broken bucket back link")
                    .with_context("bucket", id.index());
                return Err(error);
            }
            if bucket.is_empty() {
                let error = Error::invariant_violated("empty bucket in bucket list")
                    .with_context("value", bucket.value());
                return Err(error);
            }
            if let Some(prev) = previous {
                let previous_value = self.buckets[prev].value();
                if previous_value >= bucket.value() {
                    let error = Error::invariant_violated("bucket list is not strictly ascending")
                        .with_context("previous", previous_value)
                        .with_context("value", bucket.value());
                    return Err(error);
                }
            }
            num_members += self.validate_members(id, bucket)?;
            previous = Some(id);
            cursor = bucket.next;
        }

        if self.tail != previous {
            let error = Error::invariant_violated("tail does not reference the last bucket");
            return Err(error);
        }
        if num_buckets != self.buckets.len() {
            let error = Error::invariant_violated("bucket detached from the list")
                .with_context("linked", num_buckets)
                .with_context("allocated", self.buckets.len());
            return Err(error);
        }
        if num_members != self.index.len() {
            let error = Error::invariant_violated("buckets do not partition the monitored items")
                .with_context("members", num_members)
                .with_context("monitored", self.index.len());
            return Err(error);
        }
        Ok(())
    }

    fn validate_members(&self, id: SlotId, bucket: &Bucket) -> Result<usize, Error> {
        let mut seen = 0usize;
        let mut previous = None;
        let mut cursor = bucket.head();
        while let Some(member) = cursor {
            let counter = &self.counters[member.index()];
            seen += 1;
            if seen > bucket.len() {
                let error = Error::invariant_violated("bucket member count mismatch")
                    .with_context("value", bucket.value())
                    .with_context("len", bucket.len());
                return Err(error);
            }
            if counter.bucket != Some(id) || counter.prev != previous {
                let error = Error::invariant_violated("counter linked into the wrong bucket")
                    .with_context("counter", member.index())
                    .with_context("value", bucket.value());
                return Err(error);
            }
            if counter.count != bucket.value() {
                let error = Error::invariant_violated("counter count differs from its bucket")
                    .with_context("count", counter.count)
                    .with_context("value", bucket.value());
                return Err(error);
            }
            if counter.error > counter.count {
                let error = Error::invariant_violated("error bound exceeds count")
                    .with_context("count", counter.count)
                    .with_context("error", counter.error);
                return Err(error);
            }
            if self.index.get(&counter.item) != Some(&member) {
                let error = Error::invariant_violated("counter missing from the index")
                    .with_context("counter", member.index());
                return Err(error);
            }
            previous = Some(member);
            cursor = counter.next;
        }
        if seen != bucket.len() || bucket.tail() != previous {
            let error = Error::invariant_violated("bucket member count mismatch")
                .with_context("value", bucket.value())
                .with_context("len", bucket.len());
            return Err(error);
        }
        Ok(seen)
    }

    fn counter(&self, item: &T) -> Option<&Counter<T, V>> {
        self.index.get(item).map(|id| &self.counters[id.index()])
    }

    fn min_count(&self) -> u64 {
        self.head.map_or(0, |bucket| self.buckets[bucket].value())
    }

    fn threshold(&self, phi: f64) -> u64 {
        (phi * self.stream_length as f64).ceil() as u64
    }

    fn update_inner(&mut self, item: T, payload: Option<V>) {
        self.stream_length += 1;
        let id = match self.index.get(&item).copied() {
            Some(id) => id,
            None => self.admit(item, payload),
        };
        self.increment(id);
        self.track_frequent_threshold(id);
    }

    /// Gives `item` a counter, evicting the minimum when the summary is full.
    fn admit(&mut self, item: T, payload: Option<V>) -> CounterId {
        let id = if self.index.len() < self.capacity {
            let id = CounterId::new(self.counters.len());
            self.counters.push(Counter::new(item.clone(), payload));
            self.insert_bucket_after(None, 0, id);
            id
        } else {
            let Some(head) = self.head else {
                panic!("full summary has no minimum bucket");
            };
            let (id, evicted) =
                self.buckets[head].evict_and_replace(item.clone(), payload, &mut self.counters);
            self.index.remove(&evicted);
            tracing::trace!(
                evicted_count = self.buckets[head].value(),
                "evicted minimum counter"
            );
            id
        };
        self.index.insert(item, id);
        id
    }

    /// Moves counter `id` from its bucket to the bucket of count + 1.
    fn increment(&mut self, id: CounterId) {
        let Some(from) = self.counters[id.index()].bucket else {
            panic!("monitored counter {} has no bucket", id.index());
        };
        let next = self.buckets[from].next;
        self.buckets[from].remove(id, &mut self.counters);
        self.counters[id.index()].increment();
        let count = self.counters[id.index()].count;
        match next {
            Some(next) if self.buckets[next].value() == count => {
                self.buckets[next].add(id, &mut self.counters);
            }
            _ => {
                self.insert_bucket_after(Some(from), count, id);
            }
        }
        if self.buckets[from].is_empty() {
            self.unlink_bucket(from);
        }
    }

    /// Links a new bucket holding only `counter` right after `after`, or at the front.
    fn insert_bucket_after(&mut self, after: Option<SlotId>, value: u64, counter: CounterId) {
        let next = match after {
            Some(prev) => self.buckets[prev].next,
            None => self.head,
        };
        let id = self
            .buckets
            .insert_with(|id| Bucket::new(id, value, after, next));
        self.buckets[id].add(counter, &mut self.counters);
        match after {
            Some(prev) => self.buckets[prev].next = Some(id),
            None => self.head = Some(id),
        }
        match next {
            Some(next) => self.buckets[next].prev = Some(id),
            None => self.tail = Some(id),
        }
    }

    fn unlink_bucket(&mut self, id: SlotId) {
        let bucket = self.buckets.remove(id);
        debug_assert!(bucket.is_empty(), "unlinking a non-empty bucket");
        match bucket.prev {
            Some(prev) => self.buckets[prev].next = bucket.next,
            None => self.head = bucket.next,
        }
        match bucket.next {
            Some(next) => self.buckets[next].prev = bucket.prev,
            None => self.tail = bucket.prev,
        }
        if self.threshold_bucket == Some(id) {
            self.threshold_bucket = bucket.prev;
        }
    }

    /// Nudges the threshold pointer after counter `id` was incremented.
    fn track_frequent_threshold(&mut self, id: CounterId) {
        let threshold = self.threshold(self.phi);
        let Some(mut pointer) = self.threshold_bucket.or(self.head) else {
            return;
        };
        if self.buckets[pointer].value() < threshold {
            if let Some(next) = self.buckets[pointer].next {
                pointer = next;
            }
        }
        if let Some(current) = self.counters[id.index()].bucket {
            let value = self.buckets[current].value();
            if value > threshold && value <= self.buckets[pointer].value() {
                pointer = current;
            }
        }
        self.threshold_bucket = Some(pointer);
    }

    fn collect_frequent(&self, phi: f64) -> FrequentItems<T> {
        let threshold = self.threshold(phi);
        let mut guaranteed = true;
        let mut items = Vec::new();
        for counter in self.descending() {
            if counter.count <= threshold {
                break;
            }
            if counter.lower_bound() < threshold {
                guaranteed = false;
            }
            items.push(counter.item.clone());
        }
        FrequentItems {
            threshold,
            guaranteed,
            items,
        }
    }

    /// Counters by ascending count, oldest member of each bucket first.
    fn ascending(&self) -> impl Iterator<Item = &Counter<T, V>> + '_ {
        let mut bucket = self.head;
        let mut member: Option<CounterId> = None;
        std::iter::from_fn(move || {
            loop {
                if let Some(id) = member {
                    let counter = &self.counters[id.index()];
                    member = counter.next;
                    return Some(counter);
                }
                let current = &self.buckets[bucket?];
                member = current.head();
                bucket = current.next;
            }
        })
    }

    /// Counters by descending count, most recent member of each bucket first.
    fn descending(&self) -> impl Iterator<Item = &Counter<T, V>> + '_ {
        let mut bucket = self.tail;
        let mut member: Option<CounterId> = None;
        std::iter::from_fn(move || {
            loop {
                if let Some(id) = member {
                    let counter = &self.counters[id.index()];
                    member = counter.prev;
                    return Some(counter);
                }
                let current = &self.buckets[bucket?];
                member = current.tail();
                bucket = current.prev;
            }
        })
    }
}

impl<T: Hash + Eq + Clone + fmt::Debug, V> fmt::Debug for SpaceSaving<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "SpaceSaving(capacity={}, monitored={}, stream_length={}, phi={})",
            self.capacity,
            self.index.len(),
            self.stream_length,
            self.phi
        )?;
        let pointer = self.threshold_bucket.or(self.head);
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let bucket = &self.buckets[id];
            write!(f, "bucket {}", bucket.value())?;
            if pointer == Some(id) {
                write!(f, " <- frequent threshold")?;
            }
            writeln!(f)?;
            let mut member = bucket.head();
            while let Some(counter) = member {
                let counter = &self.counters[counter.index()];
                writeln!(
                    f,
                    "    {:?} count={} error={}",
                    counter.item, counter.count, counter.error
                )?;
                member = counter.next;
            }
            cursor = bucket.next;
        }
        Ok(())
    }
}
