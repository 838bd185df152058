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

//! Space-Saving summary for frequent and top-k items in data streams.
//!
//! The summary monitors at most `capacity` distinct items. When a new item arrives and
//! every slot is taken, the item with the smallest count is evicted and the newcomer
//! inherits its count, remembering it as an error bound. Every monitored item therefore
//! has a count that never underestimates its true frequency and a lower bound,
//! `count - error`, that never overestimates it.
//!
//! Counters with equal counts share a bucket, and buckets are kept in ascending order,
//! so updates and evictions run in constant time. Ties in the minimum bucket are broken
//! by evicting the most recently added member.
//!
//! For background, see Metwally, Agrawal and El Abbadi, "Efficient computation of
//! frequent and top-k elements in data streams", ICDT 2005.
//!
//! # Usage
//!
//! ```rust
//! # use streamsketches::spacesaving::SpaceSaving;
//! let mut sketch = SpaceSaving::new(3, 0.33).unwrap();
//! for item in ["x", "y", "t", "y", "x", "s", "y", "z", "y", "x", "s", "z", "y", "x", "x"] {
//!     sketch.update(item);
//! }
//!
//! let frequent = sketch.frequent_items();
//! assert_eq!(frequent.items(), &["x"]);
//! assert!(!frequent.is_guaranteed());
//!
//! let top = sketch.top_k(2);
//! assert_eq!(top.items(), &["x", "y"]);
//! assert!(!top.is_order_correct());
//! ```
//!
//! # Payloads
//!
//! ```rust
//! # use streamsketches::spacesaving::SpaceSaving;
//! # use streamsketches::spacesaving::SpaceSavingBuilder;
//! let mut sketch: SpaceSaving<u64, &str> = SpaceSavingBuilder::default().build(2).unwrap();
//! sketch.update_with_payload(7, "first seen at offset 0");
//! sketch.update_with_payload(7, "ignored, 7 is already monitored");
//! assert_eq!(sketch.payload(&7), Some(&"first seen at offset 0"));
//! ```

mod arena;
mod bucket;
mod builder;
mod counter;
mod sketch;

pub use self::builder::SpaceSavingBuilder;
pub use self::counter::CounterView;
pub use self::sketch::FrequentItems;
pub use self::sketch::SpaceSaving;
pub use self::sketch::TopK;

/// Default frequency fraction used by frequent items queries.
pub const DEFAULT_PHI: f64 = 0.33;
