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

mod common;

use common::REFERENCE_STREAM;
use common::skewed_stream;
use googletest::assert_that;
use googletest::prelude::contains_substring;
use googletest::prelude::eq;
use googletest::prelude::gt;
use streamsketches::error::ErrorKind;
use streamsketches::spacesaving::SpaceSaving;

fn reference_sketch() -> SpaceSaving<&'static str> {
    let mut sketch = SpaceSaving::new(3, 0.33).unwrap();
    for item in REFERENCE_STREAM {
        sketch.update(item);
    }
    sketch
}

#[test]
fn test_top_k_on_empty_sketch() {
    let sketch: SpaceSaving<&str> = SpaceSaving::new(3, 0.33).unwrap();
    let top = sketch.top_k(2);
    assert!(!top.is_guaranteed());
    assert!(top.is_order_correct());
    assert!(top.items().is_empty());
    assert_eq!(top.min_guaranteed_frequency(), None);
}

#[test]
fn test_frequent_items_on_empty_sketch() {
    let sketch: SpaceSaving<&str> = SpaceSaving::new(3, 0.33).unwrap();
    let frequent = sketch.frequent_items();
    assert_eq!(frequent.threshold(), 0);
    assert!(frequent.is_guaranteed());
    assert!(frequent.items().is_empty());
}

#[test]
fn test_reference_frequent_items() {
    let sketch = reference_sketch();
    let frequent = sketch.frequent_items_with_phi(0.33).unwrap();
    assert_that!(frequent.threshold(), eq(5u64));
    assert_eq!(frequent.items(), &["x"]);
    assert!(!frequent.is_guaranteed());
    for item in frequent.items() {
        assert_that!(sketch.estimate(item), gt(frequent.threshold()));
    }

    // The default phi is the one given at construction.
    assert_eq!(sketch.frequent_items(), frequent);
}

#[test]
fn test_reference_top_k() {
    let sketch = reference_sketch();
    let top = sketch.top_k(2);
    assert!(!top.is_guaranteed());
    assert!(!top.is_order_correct());
    assert_eq!(top.items(), &["x", "y"]);
    assert_eq!(top.min_guaranteed_frequency(), Some(2));

    let all = sketch.top_k(10);
    assert_eq!(all.into_items(), vec!["x", "y", "s"]);
}

#[test]
fn test_guaranteed_results_without_evictions() {
    let mut sketch = SpaceSaving::new(4, 0.3).unwrap();
    for _ in 0..10 {
        sketch.update("a");
    }
    for _ in 0..5 {
        sketch.update("b");
    }
    sketch.update("c");

    let frequent = sketch.frequent_items();
    assert_eq!(frequent.threshold(), 5);
    assert_eq!(frequent.items(), &["a"]);
    assert!(frequent.is_guaranteed());

    let top = sketch.top_k(3);
    assert_eq!(top.items(), &["a", "b", "c"]);
    assert!(top.is_order_correct());
    assert!(!top.is_guaranteed());
    assert_eq!(top.min_guaranteed_frequency(), Some(1));
}

#[test]
fn test_phi_one_reports_nothing() {
    let sketch = reference_sketch();
    let frequent = sketch.frequent_items_with_phi(1.0).unwrap();
    assert_eq!(frequent.threshold(), 15);
    assert!(frequent.items().is_empty());
    assert!(frequent.is_guaranteed());
}

#[test]
fn test_invalid_phi_rejected_at_query() {
    let sketch = reference_sketch();
    for phi in [0.0, 1.01, f64::NAN] {
        let err = sketch.frequent_items_with_phi(phi).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_that!(err.message(), contains_substring("phi must be in (0, 1]"));
    }
}

#[test]
fn test_top_k_size_and_order() {
    let stream = skewed_stream(5, 8_000, 400);
    let mut sketch = SpaceSaving::new(20, 0.05).unwrap();
    for item in &stream {
        sketch.update(*item);
    }

    let descending: Vec<u64> = {
        let mut items: Vec<u64> = sketch.counters().map(|view| *view.item()).collect();
        items.reverse();
        items
    };
    for k in [0, 1, 5, 20, 50] {
        let top = sketch.top_k(k);
        assert_eq!(top.items().len(), k.min(sketch.num_monitored()));
        assert_eq!(top.items(), &descending[..top.items().len()]);
        let counts: Vec<u64> = top
            .items()
            .iter()
            .map(|item| sketch.estimate(item))
            .collect();
        assert!(counts.windows(2).all(|pair| pair[0] >= pair[1]));
    }
}

#[test]
fn test_frequent_items_match_counts() {
    let stream = skewed_stream(17, 12_000, 250);
    let mut sketch = SpaceSaving::new(40, 0.02).unwrap();
    for item in &stream {
        sketch.update(*item);
    }

    let frequent = sketch.frequent_items();
    let threshold = frequent.threshold();
    assert_eq!(threshold, (0.02 * stream.len() as f64).ceil() as u64);

    let expected: Vec<u64> = {
        let mut items: Vec<u64> = sketch
            .counters()
            .filter(|view| view.count() > threshold)
            .map(|view| *view.item())
            .collect();
        items.reverse();
        items
    };
    assert_eq!(frequent.items(), expected.as_slice());
    let guaranteed = frequent
        .items()
        .iter()
        .all(|item| sketch.lower_bound(item) >= threshold);
    assert_eq!(frequent.is_guaranteed(), guaranteed);
}

#[test]
fn test_queries_are_idempotent() {
    let sketch = reference_sketch();
    assert_eq!(sketch.frequent_items(), sketch.frequent_items());
    assert_eq!(sketch.top_k(2), sketch.top_k(2));
    assert_eq!(sketch.dump(), sketch.dump());
}

#[test]
fn test_threshold_pointer_tracks_reference_stream() {
    let mut sketch = SpaceSaving::new(3, 0.33).unwrap();
    assert_eq!(sketch.frequent_threshold_count(), None);

    let mut observed = Vec::new();
    for item in REFERENCE_STREAM {
        sketch.update(item);
        observed.push(sketch.frequent_threshold_count().unwrap());
    }
    // ceil(0.33 * n) after each of the 15 updates
    let expected: Vec<u64> = vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4, 5, 5, 5];
    assert_eq!(observed, expected);
    assert_that!(
        sketch.frequent_threshold_count(),
        eq(Some(sketch.frequent_items().threshold()))
    );
}
