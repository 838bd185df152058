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

//! Per-identity counters.

use crate::spacesaving::arena::SlotId;

/// Handle to a counter slot. Counters are never freed, only reassigned on eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CounterId(usize);

impl CounterId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Counter<T, V> {
    // Links to the neighbours inside the owning bucket, oldest member first.
    pub(crate) prev: Option<CounterId>,
    pub(crate) next: Option<CounterId>,
    pub(crate) bucket: Option<SlotId>,
    pub(crate) count: u64,
    pub(crate) error: u64,
    pub(crate) item: T,
    pub(crate) payload: Option<V>,
}

impl<T, V> Counter<T, V> {
    pub(crate) fn new(item: T, payload: Option<V>) -> Self {
        Self {
            prev: None,
            next: None,
            bucket: None,
            count: 0,
            error: 0,
            item,
            payload,
        }
    }

    pub(crate) fn increment(&mut self) {
        self.count += 1;
    }

    pub(crate) fn attach(&mut self, bucket: SlotId) {
        self.bucket = Some(bucket);
    }

    pub(crate) fn detach(&mut self) {
        self.bucket = None;
    }

    /// Worst-case true frequency of the monitored item.
    pub(crate) fn lower_bound(&self) -> u64 {
        self.count - self.error
    }

    pub(crate) fn view(&self) -> CounterView<'_, T, V> {
        CounterView {
            item: &self.item,
            count: self.count,
            error: self.error,
            payload: self.payload.as_ref(),
        }
    }
}

/// Read-only view of a monitored counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterView<'a, T, V = ()> {
    item: &'a T,
    count: u64,
    error: u64,
    payload: Option<&'a V>,
}

impl<'a, T, V> CounterView<'a, T, V> {
    /// Returns the monitored item.
    pub fn item(&self) -> &'a T {
        self.item
    }

    /// Returns the observed count, an upper bound on the true frequency.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Returns the maximum overcount inherited when the item replaced an evicted one.
    pub fn error(&self) -> u64 {
        self.error
    }

    /// Returns the guaranteed minimum frequency, `count - error`.
    pub fn lower_bound(&self) -> u64 {
        self.count - self.error
    }

    /// Returns the payload recorded when the item entered the summary.
    pub fn payload(&self) -> Option<&'a V> {
        self.payload
    }
}
