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

use std::hash::Hash;

use crate::error::Error;
use crate::spacesaving::DEFAULT_PHI;
use crate::spacesaving::sketch::SpaceSaving;

/// Builder for creating Space-Saving summaries.
///
/// # Examples
///
/// ```
/// use streamsketches::spacesaving::SpaceSaving;
/// use streamsketches::spacesaving::SpaceSavingBuilder;
///
/// let mut sketch: SpaceSaving<&str, u32> = SpaceSavingBuilder::default()
///     .phi(0.25)
///     .build(16)
///     .unwrap();
///
/// sketch.update_with_payload("apple", 7);
/// assert_eq!(sketch.payload(&"apple"), Some(&7));
/// ```
#[derive(Debug, Clone)]
pub struct SpaceSavingBuilder {
    phi: f64,
}

impl Default for SpaceSavingBuilder {
    fn default() -> Self {
        Self { phi: DEFAULT_PHI }
    }
}

impl SpaceSavingBuilder {
    /// Sets the default frequency fraction used by
    /// [`SpaceSaving::frequent_items`](crate::spacesaving::SpaceSaving::frequent_items).
    ///
    /// The value is validated by [`build`](Self::build).
    pub fn phi(mut self, phi: f64) -> Self {
        self.phi = phi;
        self
    }

    /// Builds a summary monitoring at most `capacity` distinct items.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid)
    /// if `capacity` is zero or phi is not in `(0, 1]`.
    pub fn build<T, V>(self, capacity: usize) -> Result<SpaceSaving<T, V>, Error>
    where
        T: Hash + Eq + Clone,
    {
        if capacity == 0 {
            return Err(Error::config_invalid("capacity must be at least 1")
                .with_context("capacity", capacity));
        }
        let phi = check_phi(self.phi)?;
        Ok(SpaceSaving::with_config(capacity, phi))
    }
}

/// Checks that `phi` lies in `(0, 1]`; NaN is rejected.
pub(crate) fn check_phi(phi: f64) -> Result<f64, Error> {
    if phi > 0.0 && phi <= 1.0 {
        Ok(phi)
    } else {
        Err(Error::config_invalid("phi must be in (0, 1]").with_context("phi", phi))
    }
}
