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
//! K-way merge over sorted runs.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use arrow::array::Array;
use arrow::compute::interleave;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use crate::common::error::{Error, Result};
use crate::exec::chunk::Chunk;
use crate::exec::sort::{RunCursor, SortedRun};

/// Streams globally ordered batches out of the admitted runs.
///
/// A min-heap of run cursors under the forward order yields rows one at a
/// time; emitted `(run, row)` pairs are gathered per output batch and the
/// columns are assembled with `interleave`. The configured offset is
/// consumed by dropping rows before the first emission.
pub(crate) struct MergeReader {
    runs: Vec<Arc<SortedRun>>,
    heap: BinaryHeap<Reverse<RunCursor>>,
    offset_remaining: usize,
    schema: SchemaRef,
    indices: Vec<(usize, usize)>,
}

impl MergeReader {
    pub(crate) fn new(runs: Vec<Arc<SortedRun>>, offset: usize) -> Self {
        let schema = runs[0].chunk.schema();
        let mut heap = BinaryHeap::with_capacity(runs.len());
        for (index, run) in runs.iter().enumerate() {
            heap.push(Reverse(RunCursor::first_row(Arc::clone(run), index)));
        }
        Self {
            runs,
            heap,
            offset_remaining: offset,
            schema,
            indices: Vec::new(),
        }
    }

    /// Emit the next batch of up to `target_rows` rows, or `None` at end
    /// of stream.
    pub(crate) fn read(&mut self, target_rows: usize) -> Result<Option<Chunk>> {
        self.indices.clear();
        while let Some(Reverse(mut cursor)) = self.heap.pop() {
            if self.offset_remaining > 0 {
                self.offset_remaining -= 1;
            } else {
                self.indices.push((cursor.run_index(), cursor.pos()));
            }
            if !cursor.is_last() {
                cursor.next();
                self.heap.push(Reverse(cursor));
            }
            if self.indices.len() >= target_rows {
                break;
            }
        }
        if self.indices.is_empty() {
            return Ok(None);
        }

        let num_columns = self.schema.fields().len();
        let mut columns = Vec::with_capacity(num_columns);
        for col in 0..num_columns {
            let arrays: Vec<&dyn Array> = self
                .runs
                .iter()
                .map(|run| run.chunk.columns()[col].as_ref())
                .collect();
            let merged =
                interleave(&arrays, &self.indices).map_err(|e| Error::Internal(e.to_string()))?;
            columns.push(merged);
        }
        let batch = RecordBatch::try_new(self.schema.clone(), columns)
            .map_err(|e| Error::Internal(e.to_string()))?;
        Chunk::try_new(batch).map(Some).map_err(Error::Internal)
    }
}
