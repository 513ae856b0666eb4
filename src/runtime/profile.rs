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
//! Runtime profile counters for execution nodes.
//!
//! Responsibilities:
//! - Per-node info strings and named atomic counters.
//! - Scoped timers that add elapsed nanoseconds on drop.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[derive(Clone, Debug)]
pub struct RuntimeProfile {
    inner: Arc<RuntimeProfileInner>,
}

#[derive(Debug)]
struct RuntimeProfileInner {
    name: String,
    counters: Mutex<HashMap<String, Counter>>,
    info_strings: Mutex<BTreeMap<String, String>>,
}

impl RuntimeProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RuntimeProfileInner {
                name: name.into(),
                counters: Mutex::new(HashMap::new()),
                info_strings: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn add_info_string(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut guard = self
            .inner
            .info_strings
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        guard.insert(key.into(), value.into());
    }

    pub fn info_string(&self, key: &str) -> Option<String> {
        let guard = self
            .inner
            .info_strings
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        guard.get(key).cloned()
    }

    /// Return the counter registered under `name`, creating it on first use.
    pub fn counter(&self, name: &str) -> Counter {
        let mut guard = self
            .inner
            .counters
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        guard
            .entry(name.to_string())
            .or_insert_with(Counter::default)
            .clone()
    }
}

/// Monotonic additive counter shared across profile consumers.
#[derive(Clone, Debug, Default)]
pub struct Counter {
    value: Arc<AtomicI64>,
}

impl Counter {
    pub fn add(&self, delta: i64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Adds the elapsed nanoseconds to `counter` when dropped.
pub struct ScopedTimer {
    counter: Counter,
    start: Instant,
}

impl ScopedTimer {
    pub fn new(counter: Counter) -> Self {
        Self {
            counter,
            start: Instant::now(),
        }
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        let elapsed = i64::try_from(self.start.elapsed().as_nanos()).unwrap_or(i64::MAX);
        self.counter.add(elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_shared_by_name() {
        let profile = RuntimeProfile::new("SORT");
        profile.counter("PartialSortTime").add(7);
        assert_eq!(profile.counter("PartialSortTime").value(), 7);
    }

    #[test]
    fn scoped_timer_adds_on_drop() {
        let profile = RuntimeProfile::new("SORT");
        let counter = profile.counter("TotalTime");
        {
            let _t = ScopedTimer::new(counter.clone());
        }
        assert!(counter.value() >= 0);
    }

    #[test]
    fn info_strings_round_trip() {
        let profile = RuntimeProfile::new("SORT");
        profile.add_info_string("TOP-N", "true");
        assert_eq!(profile.info_string("TOP-N").as_deref(), Some("true"));
        assert_eq!(profile.info_string("missing"), None);
    }
}
