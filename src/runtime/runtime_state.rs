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
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::common::error::{Error, Result};
use crate::runtime::mem_tracker::MemTracker;

/// Per-query execution options relevant to this operator core.
#[derive(Clone, Debug, Default)]
pub struct QueryOptions {
    /// Maximum row count per emitted chunk. `None` uses the engine default.
    pub batch_size: Option<usize>,
}

/// RuntimeState is a per-fragment-instance execution context.
///
/// It provides the downstream batch size, the cooperative cancellation flag
/// polled at execution checkpoints, and the fragment's memory tracker.
#[derive(Debug)]
pub struct RuntimeState {
    query_options: QueryOptions,
    cancelled: AtomicBool,
    error_state: Arc<RuntimeErrorState>,
    mem_tracker: Option<Arc<MemTracker>>,
}

#[derive(Debug, Default)]
pub struct RuntimeErrorState {
    error: Mutex<Option<String>>,
}

impl RuntimeErrorState {
    pub fn set_error(&self, err: String) {
        let mut guard = self.error.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_none() {
            *guard = Some(err);
        }
    }

    pub fn error(&self) -> Option<String> {
        self.error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self {
            query_options: QueryOptions::default(),
            cancelled: AtomicBool::new(false),
            error_state: Arc::new(RuntimeErrorState::default()),
            mem_tracker: None,
        }
    }
}

impl RuntimeState {
    pub fn new(query_options: QueryOptions, mem_tracker: Option<Arc<MemTracker>>) -> Self {
        Self {
            query_options,
            cancelled: AtomicBool::new(false),
            error_state: Arc::new(RuntimeErrorState::default()),
            mem_tracker,
        }
    }

    /// Return the maximum row count per in-memory chunk.
    pub fn chunk_size(&self) -> usize {
        self.query_options
            .batch_size
            .filter(|v| *v > 0)
            .unwrap_or(4096)
            .max(1)
    }

    pub fn mem_tracker(&self) -> Option<Arc<MemTracker>> {
        self.mem_tracker.clone()
    }

    /// Request cooperative cancellation. Operators observe it at their
    /// next checkpoint.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Checkpoint used by operators between units of work. Returns the
    /// cancellation error carrying `context` when the query was cancelled.
    pub fn check_query_state(&self, context: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled(context.to_string()));
        }
        if let Some(err) = self.error_state.error() {
            return Err(Error::Internal(err));
        }
        Ok(())
    }

    pub fn error_state(&self) -> Arc<RuntimeErrorState> {
        Arc::clone(&self.error_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_size_defaults_to_4096() {
        let state = RuntimeState::default();
        assert_eq!(state.chunk_size(), 4096);
    }

    #[test]
    fn chunk_size_honors_batch_size_option() {
        let state = RuntimeState::new(
            QueryOptions {
                batch_size: Some(17),
            },
            None,
        );
        assert_eq!(state.chunk_size(), 17);
    }

    #[test]
    fn check_query_state_reports_cancellation() {
        let state = RuntimeState::default();
        assert!(state.check_query_state("unit").is_ok());
        state.cancel();
        let err = state.check_query_state("unit").expect_err("cancelled");
        assert!(matches!(err, Error::Cancelled(_)));
    }
}
