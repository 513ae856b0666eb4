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
//! Admitted sorted runs and the top-n pruning heap.

use std::collections::BinaryHeap;
use std::sync::Arc;

use crate::exec::sort::{RunCursor, SortedRun};
use crate::novasort_logging::debug;

/// The ordered list of sorted runs feeding the merge, plus a max-heap of
/// last-row cursors used in top-n mode to reject runs that cannot reach
/// the result.
///
/// Admission with `rows_to_keep = offset + limit`:
/// - while fewer than `rows_to_keep` rows are held, every run is admitted;
/// - afterwards a run whose smallest row is at or above the heap top's
///   largest row is dominated and dropped whole.
///
/// Admitted runs are never evicted; over-admission is bounded by input
/// size and the merge applies the final truncation.
pub(crate) struct RunSet {
    runs: Vec<Arc<SortedRun>>,
    total_rows: usize,
    pruning_heap: BinaryHeap<RunCursor>,
    rows_to_keep: Option<usize>,
}

impl RunSet {
    pub(crate) fn new(rows_to_keep: Option<usize>) -> Self {
        Self {
            runs: Vec::new(),
            total_rows: 0,
            pruning_heap: BinaryHeap::new(),
            rows_to_keep,
        }
    }

    /// Admit or discard one sorted run. Returns whether it was admitted.
    pub(crate) fn add_run(&mut self, run: SortedRun) -> bool {
        let run = Arc::new(run);
        match self.rows_to_keep {
            Some(0) => {
                debug!(
                    target: "novasort::sort",
                    rows = run.len(),
                    "discard run: zero rows to keep"
                );
                false
            }
            Some(rows_to_keep) => {
                let index = self.runs.len();
                if self.total_rows >= rows_to_keep {
                    let candidate = RunCursor::first_row(Arc::clone(&run), index);
                    if let Some(top) = self.pruning_heap.peek()
                        && candidate.totally_greater_or_equal(top)
                    {
                        debug!(
                            target: "novasort::sort",
                            rows = run.len(),
                            held_rows = self.total_rows,
                            "discard run dominated by admitted top-n candidates"
                        );
                        return false;
                    }
                }
                self.pruning_heap
                    .push(RunCursor::last_row(Arc::clone(&run), index));
                self.total_rows += run.len();
                self.runs.push(run);
                true
            }
            None => {
                self.total_rows += run.len();
                self.runs.push(run);
                true
            }
        }
    }

    pub(crate) fn runs(&self) -> &[Arc<SortedRun>] {
        &self.runs
    }

    pub(crate) fn len(&self) -> usize {
        self.runs.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub(crate) fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Release everything, cursors before the runs they borrow.
    pub(crate) fn clear(&mut self) {
        self.pruning_heap.clear();
        self.runs.clear();
        self.total_rows = 0;
    }
}
