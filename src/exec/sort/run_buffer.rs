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
//! Mutable accumulation buffer for one unsorted run.

use arrow::compute::concat_batches;

use crate::exec::chunk::Chunk;

/// Accumulates upstream chunks until the operator decides a run is full,
/// then extracts them as one contiguous chunk and resets.
#[derive(Default)]
pub(crate) struct RunBuffer {
    chunks: Vec<Chunk>,
    rows: usize,
    bytes: usize,
}

impl RunBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Column-wise append of all rows. Empty chunks are dropped.
    pub(crate) fn append(&mut self, chunk: Chunk) {
        if chunk.is_empty() {
            return;
        }
        self.rows += chunk.len();
        self.bytes = self.bytes.saturating_add(chunk.estimated_bytes());
        self.chunks.push(chunk);
    }

    pub(crate) fn row_count(&self) -> usize {
        self.rows
    }

    pub(crate) fn byte_size(&self) -> usize {
        self.bytes
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.chunks.clear();
        self.rows = 0;
        self.bytes = 0;
    }

    /// Move the buffered rows out as one immutable chunk and reset the
    /// buffer. Returns `None` when nothing was buffered.
    pub(crate) fn extract(&mut self) -> Result<Option<Chunk>, String> {
        if self.chunks.is_empty() {
            return Ok(None);
        }
        let schema = self.chunks[0].schema();
        let batches: Vec<_> = self.chunks.iter().map(|c| c.batch.clone()).collect();
        self.clear();
        let batch = concat_batches(&schema, &batches).map_err(|e| e.to_string())?;
        if batch.num_rows() == 0 {
            return Ok(None);
        }
        Chunk::try_new(batch).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ids::SlotId;
    use crate::exec::chunk::field_with_slot_id;
    use arrow::array::{Int32Array, RecordBatch};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn make_chunk(values: Vec<i32>) -> Chunk {
        let schema = Arc::new(Schema::new(vec![field_with_slot_id(
            Field::new("v", DataType::Int32, true),
            SlotId::new(1),
        )]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(values))]).expect("batch");
        Chunk::new(batch)
    }

    #[test]
    fn extract_concatenates_and_resets() {
        let mut buffer = RunBuffer::new();
        buffer.append(make_chunk(vec![3, 1]));
        buffer.append(make_chunk(vec![2]));
        assert_eq!(buffer.row_count(), 3);
        assert!(buffer.byte_size() > 0);

        let run = buffer.extract().expect("extract").expect("chunk");
        assert_eq!(run.len(), 3);
        assert!(buffer.is_empty());
        assert_eq!(buffer.row_count(), 0);
        assert_eq!(buffer.byte_size(), 0);
        assert!(buffer.extract().expect("extract").is_none());
    }

    #[test]
    fn empty_chunks_are_ignored() {
        let mut buffer = RunBuffer::new();
        buffer.append(make_chunk(vec![]));
        assert!(buffer.is_empty());
        assert!(buffer.extract().expect("extract").is_none());
    }
}
