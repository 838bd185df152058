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

#![allow(dead_code)]

use std::collections::HashMap;

/// Xorshift generator with a fixed seed, so streams are reproducible.
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    pub fn seeded(seed: u64) -> Self {
        let state = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

/// Stream of `len` items drawn from `0..universe`, skewed towards small values.
pub fn skewed_stream(seed: u64, len: usize, universe: u64) -> Vec<u64> {
    let mut rng = XorShift64::seeded(seed);
    (0..len)
        .map(|_| {
            let bound = rng.next_u64() % universe;
            rng.next_u64() % (bound + 1)
        })
        .collect()
}

pub fn exact_counts<T: std::hash::Hash + Eq + Clone>(stream: &[T]) -> HashMap<T, u64> {
    let mut counts = HashMap::new();
    for item in stream {
        *counts.entry(item.clone()).or_insert(0) += 1;
    }
    counts
}

/// The stream used in the Space-Saving reference walkthrough.
pub const REFERENCE_STREAM: [&str; 15] = [
    "x", "y", "t", "y", "x", "s", "y", "z", "y", "x", "s", "z", "y", "x", "x",
];
