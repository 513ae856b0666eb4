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
//! Execution node contracts.
//!
//! Responsibilities:
//! - Defines the pull-style lifecycle every node implements:
//!   `open` / `next` / `reset` / `close` / `debug_string`.
//! - Hosts the shared limit bookkeeping nodes compose instead of inherit.

mod sort;

pub use sort::SortNode;

use crate::common::error::{Error, Result};
use crate::exec::chunk::Chunk;
use crate::runtime::profile::RuntimeProfile;
use crate::runtime::runtime_state::RuntimeState;

/// Pull-style execution node contract.
///
/// `next` fills the caller's chunk with up to `state.chunk_size()` rows and
/// sets `eos` on the last delivery (possibly together with rows). An empty
/// chunk with `eos = false` means "keep pulling".
pub trait ExecNode: Send {
    fn name(&self) -> &str;

    fn open(&mut self, state: &RuntimeState) -> Result<()>;

    fn next(&mut self, state: &RuntimeState, chunk: &mut Chunk, eos: &mut bool) -> Result<()>;

    fn reset(&mut self, _state: &RuntimeState) -> Result<()> {
        Ok(())
    }

    fn close(&mut self, state: &RuntimeState) -> Result<()>;

    fn debug_string(&self, indentation_level: usize, out: &mut String);

    /// Row-at-a-time delivery predates the chunk pipeline and is no longer
    /// wired; `next` is the only supported data path.
    fn next_row_batch(&mut self, _state: &RuntimeState) -> Result<()> {
        Err(Error::NotSupported(format!(
            "{}: row-oriented get_next",
            self.name()
        )))
    }
}

/// Shared lifecycle state composed into concrete nodes: the emission limit,
/// rows returned so far, the node profile and the closed flag.
pub struct ExecNodeBase {
    name: String,
    limit: i64,
    num_rows_returned: i64,
    profile: RuntimeProfile,
    closed: bool,
}

impl ExecNodeBase {
    /// `limit = -1` disables the row cap.
    pub fn new(name: impl Into<String>, limit: i64) -> Self {
        let name = name.into();
        let profile = RuntimeProfile::new(name.clone());
        Self {
            name,
            limit,
            num_rows_returned: 0,
            profile,
            closed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn num_rows_returned(&self) -> i64 {
        self.num_rows_returned
    }

    pub fn profile(&self) -> &RuntimeProfile {
        &self.profile
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn mark_closed(&mut self) {
        self.closed = true;
    }

    /// Account a delivery against the limit: truncates the chunk so the
    /// cumulative emission never exceeds the limit and flips `eos` once it
    /// is reached exactly.
    pub fn reached_limit(&mut self, chunk: &mut Chunk, eos: &mut bool) {
        if self.limit < 0 {
            self.num_rows_returned += chunk.len() as i64;
            return;
        }
        let remaining = (self.limit - self.num_rows_returned).max(0) as usize;
        if chunk.len() > remaining {
            let mut truncated = chunk.slice(0, remaining);
            chunk.swap(&mut truncated);
        }
        self.num_rows_returned += chunk.len() as i64;
        if self.num_rows_returned >= self.limit {
            *eos = true;
        }
    }

    pub fn debug_string(&self, out: &mut String) {
        out.push_str(&format!("{} limit={}", self.name, self.limit));
    }
}
