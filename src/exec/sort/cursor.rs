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
//! Sorted runs and the cursors the pruning and merge heaps order by.

use std::cmp::Ordering;
use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::row::{Row, RowConverter, Rows};

use crate::exec::chunk::Chunk;
use crate::exec::sort::SortKey;

/// An immutable sorted chunk plus its key columns converted to
/// byte-comparable rows. Rows within a run are non-decreasing under the
/// sort description; runs never change after admission.
pub(crate) struct SortedRun {
    pub(crate) chunk: Chunk,
    keys: Rows,
}

impl SortedRun {
    pub(crate) fn new(
        chunk: Chunk,
        description: &[SortKey],
        converter: &RowConverter,
    ) -> Result<Self, String> {
        if chunk.is_empty() {
            return Err("sorted run must not be empty".to_string());
        }
        let mut key_columns: Vec<ArrayRef> = Vec::with_capacity(description.len());
        for key in description {
            let column = chunk
                .columns()
                .get(key.column)
                .ok_or_else(|| format!("sort key column {} out of range", key.column))?;
            key_columns.push(column.clone());
        }
        let keys = converter
            .convert_columns(&key_columns)
            .map_err(|e| e.to_string())?;
        Ok(Self { chunk, keys })
    }

    pub(crate) fn len(&self) -> usize {
        self.chunk.len()
    }

    pub(crate) fn key(&self, row: usize) -> Row<'_> {
        self.keys.row(row)
    }
}

/// Position inside one sorted run.
///
/// The natural order compares the current rows under the forward
/// (ascending-output) order, so a max-heap of last-row cursors is the
/// pruning heap and a `Reverse`-wrapped heap of first-row cursors is the
/// merge heap. Ties break on `(run_index, pos)` to keep heap behavior
/// deterministic.
pub(crate) struct RunCursor {
    run: Arc<SortedRun>,
    run_index: usize,
    pos: usize,
}

impl RunCursor {
    /// Cursor at the run's smallest row.
    pub(crate) fn first_row(run: Arc<SortedRun>, run_index: usize) -> Self {
        Self {
            run,
            run_index,
            pos: 0,
        }
    }

    /// Cursor at the run's largest row.
    pub(crate) fn last_row(run: Arc<SortedRun>, run_index: usize) -> Self {
        let pos = run.len() - 1;
        Self {
            run,
            run_index,
            pos,
        }
    }

    pub(crate) fn run_index(&self) -> usize {
        self.run_index
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn is_last(&self) -> bool {
        self.pos + 1 >= self.run.len()
    }

    pub(crate) fn next(&mut self) {
        self.pos += 1;
    }

    pub(crate) fn current_key(&self) -> Row<'_> {
        self.run.key(self.pos)
    }

    #[allow(dead_code)]
    pub(crate) fn current_less(&self, other: &RunCursor) -> bool {
        self.current_key() < other.current_key()
    }

    /// Whether every row of `self`'s run is at or above the largest row of
    /// `other`'s run in the forward order, i.e. `self.first >= other.last`.
    /// Used by top-n admission to reject dominated runs.
    pub(crate) fn totally_greater_or_equal(&self, other: &RunCursor) -> bool {
        let other_last = other.run.key(other.run.len() - 1);
        self.run.key(0).cmp(&other_last) != Ordering::Less
    }
}

impl PartialEq for RunCursor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RunCursor {}

impl PartialOrd for RunCursor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RunCursor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.current_key()
            .cmp(&other.current_key())
            .then_with(|| self.run_index.cmp(&other.run_index))
            .then_with(|| self.pos.cmp(&other.pos))
    }
}
