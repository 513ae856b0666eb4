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
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use arrow::array::{ArrayRef, RecordBatch};
use arrow::buffer::Buffer;
use arrow::datatypes::{Field, Schema, SchemaRef};

use crate::common::ids::SlotId;
use crate::runtime::mem_tracker::MemTracker;

/// A chunk of data, consisting of multiple rows stored column-major.
/// Wrapper around an Arrow RecordBatch.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub batch: RecordBatch,
    slot_id_to_index: Arc<HashMap<SlotId, usize>>,
    accounting: Option<Arc<ChunkAccounting>>,
}

impl Chunk {
    pub fn try_new(batch: RecordBatch) -> Result<Self, String> {
        let slot_id_to_index = slot_id_to_index_from_schema(batch.schema().as_ref())?;
        Ok(Self {
            batch,
            slot_id_to_index: Arc::new(slot_id_to_index),
            accounting: None,
        })
    }

    pub fn new(batch: RecordBatch) -> Self {
        match Self::try_new(batch) {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn slot_id_to_index(&self) -> &HashMap<SlotId, usize> {
        &self.slot_id_to_index
    }

    pub fn index_of_slot(&self, slot_id: SlotId) -> Result<usize, String> {
        self.slot_id_to_index
            .get(&slot_id)
            .copied()
            .ok_or_else(|| {
                format!(
                    "slot id {} not found in chunk (num_columns={}, slot_ids={:?})",
                    slot_id,
                    self.batch.num_columns(),
                    self.slot_id_to_index.keys().collect::<Vec<_>>()
                )
            })
    }

    pub fn column_by_slot_id(&self, slot_id: SlotId) -> Result<ArrayRef, String> {
        let idx = self.index_of_slot(slot_id)?;
        self.batch
            .columns()
            .get(idx)
            .cloned()
            .ok_or_else(|| format!("slot id {} mapped to invalid index {}", slot_id, idx))
    }

    pub fn len(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    pub fn columns(&self) -> &[ArrayRef] {
        self.batch.columns()
    }

    /// Zero-copy row window over this chunk. Accounting stays with the
    /// current holder's tracker.
    pub fn slice(&self, offset: usize, length: usize) -> Self {
        let mut out = Self {
            batch: self.batch.slice(offset, length),
            slot_id_to_index: Arc::clone(&self.slot_id_to_index),
            accounting: None,
        };
        if let Some(accounting) = self.accounting.as_ref() {
            let tracker = accounting.tracker();
            out.transfer_to(&tracker);
        }
        out
    }

    /// Exchange contents with `other`. Used by the downstream `next`
    /// contract to move output into the caller's chunk without copying.
    pub fn swap(&mut self, other: &mut Chunk) {
        std::mem::swap(self, other);
    }

    /// Append a materialized column and return its index. The field must
    /// carry slot id metadata so the chunk's slot map stays complete.
    pub fn append_column(&mut self, field: Field, values: ArrayRef) -> Result<usize, String> {
        let slot_id = field_slot_id(&field)?
            .ok_or_else(|| format!("appended column '{}' has no slot id", field.name()))?;
        if self.slot_id_to_index.contains_key(&slot_id) {
            return Err(format!("appended column reuses slot id {}", slot_id));
        }
        if values.len() != self.batch.num_rows() && self.batch.num_columns() > 0 {
            return Err(format!(
                "appended column length {} does not match chunk rows {}",
                values.len(),
                self.batch.num_rows()
            ));
        }
        let mut fields: Vec<Field> = self
            .batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .collect();
        fields.push(field);
        let mut columns = self.batch.columns().to_vec();
        columns.push(values);
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
            .map_err(|e| e.to_string())?;
        let index = batch.num_columns() - 1;
        let mut map = (*self.slot_id_to_index).clone();
        map.insert(slot_id, index);
        self.batch = batch;
        self.slot_id_to_index = Arc::new(map);
        Ok(index)
    }

    /// Smallest slot id not present in this chunk, used when a computed
    /// sort key column is appended without a frontend-assigned slot.
    pub fn next_synthetic_slot_id(&self) -> SlotId {
        let max = self
            .slot_id_to_index
            .keys()
            .map(|s| s.as_u32())
            .max()
            .unwrap_or(0);
        SlotId::new(max + 1)
    }

    pub fn estimated_bytes(&self) -> usize {
        record_batch_bytes(&self.batch)
    }

    pub fn transfer_to(&mut self, tracker: &Arc<MemTracker>) {
        if let Some(accounting) = self.accounting.as_ref() {
            accounting.transfer_to(tracker);
            return;
        }
        let bytes = chunk_bytes_i64(&self.batch);
        if bytes <= 0 {
            return;
        }
        self.accounting = Some(Arc::new(ChunkAccounting::new(bytes, tracker)));
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self {
            batch: RecordBatch::new_empty(Arc::new(Schema::empty())),
            slot_id_to_index: Arc::new(HashMap::new()),
            accounting: None,
        }
    }
}

pub const FIELD_META_SLOT_ID: &str = "novasort.slot_id";

pub fn field_with_slot_id(field: Field, slot_id: SlotId) -> Field {
    let mut meta = field.metadata().clone();
    meta.insert(FIELD_META_SLOT_ID.to_string(), slot_id.to_string());
    field.with_metadata(meta)
}

pub fn field_slot_id(field: &Field) -> Result<Option<SlotId>, String> {
    let Some(v) = field.metadata().get(FIELD_META_SLOT_ID) else {
        return Ok(None);
    };
    Ok(Some(v.parse::<SlotId>()?))
}

fn slot_id_to_index_from_schema(schema: &Schema) -> Result<HashMap<SlotId, usize>, String> {
    let mut map = HashMap::new();
    for (idx, f) in schema.fields().iter().enumerate() {
        let slot_id = field_slot_id(f.as_ref())?.ok_or_else(|| {
            format!(
                "missing {} in chunk schema field at index {} (name={})",
                FIELD_META_SLOT_ID,
                idx,
                f.name()
            )
        })?;
        if map.insert(slot_id, idx).is_some() {
            // Slot id collision in a single chunk would make expression
            // evaluation ambiguous.
            return Err(format!("duplicate slot id {} in chunk schema", slot_id));
        }
    }
    Ok(map)
}

/// Estimate RecordBatch size by summing unique buffers inside the batch.
///
/// Buffers are de-duplicated only within a single RecordBatch; buffers
/// shared across batches (slices, dictionaries) are counted once per batch.
pub fn record_batch_bytes(batch: &RecordBatch) -> usize {
    let mut seen = HashSet::new();
    let mut total = 0usize;
    for column in batch.columns() {
        total = total.saturating_add(array_data_bytes(&column.to_data(), &mut seen));
    }
    total
}

fn array_data_bytes(data: &arrow::array::ArrayData, seen: &mut HashSet<usize>) -> usize {
    let mut total = 0usize;
    for buffer in data.buffers() {
        total = total.saturating_add(buffer_bytes(buffer, seen));
    }
    if let Some(nulls) = data.nulls() {
        total = total.saturating_add(buffer_bytes(nulls.buffer(), seen));
    }
    for child in data.child_data() {
        total = total.saturating_add(array_data_bytes(child, seen));
    }
    total
}

fn buffer_bytes(buffer: &Buffer, seen: &mut HashSet<usize>) -> usize {
    let ptr = buffer.data_ptr().as_ptr() as usize;
    if !seen.insert(ptr) {
        return 0;
    }
    buffer.capacity().max(buffer.len())
}

fn chunk_bytes_i64(batch: &RecordBatch) -> i64 {
    i64::try_from(record_batch_bytes(batch)).unwrap_or(i64::MAX)
}

#[derive(Debug)]
struct ChunkAccounting {
    bytes: i64,
    tracker: Mutex<Arc<MemTracker>>,
}

impl ChunkAccounting {
    fn new(bytes: i64, tracker: &Arc<MemTracker>) -> Self {
        tracker.consume(bytes);
        Self {
            bytes,
            tracker: Mutex::new(Arc::clone(tracker)),
        }
    }

    fn transfer_to(&self, tracker: &Arc<MemTracker>) {
        let mut guard = self.tracker.lock().unwrap_or_else(|e| e.into_inner());
        if Arc::ptr_eq(&guard, tracker) {
            return;
        }
        guard.release(self.bytes);
        tracker.consume(self.bytes);
        *guard = Arc::clone(tracker);
    }

    fn tracker(&self) -> Arc<MemTracker> {
        let guard = self.tracker.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }
}

impl Drop for ChunkAccounting {
    fn drop(&mut self) {
        let guard = self.tracker.lock().unwrap_or_else(|e| e.into_inner());
        guard.release(self.bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int32Array;
    use arrow::datatypes::DataType;

    fn int_chunk(values: Vec<i32>) -> Chunk {
        let schema = Arc::new(Schema::new(vec![field_with_slot_id(
            Field::new("a", DataType::Int32, true),
            SlotId::new(1),
        )]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(values))]).expect("batch");
        Chunk::new(batch)
    }

    #[test]
    fn rejects_schema_without_slot_id_metadata() {
        let schema = Arc::new(Schema::new(vec![Field::new("a", DataType::Int32, true)]));
        let batch = RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(vec![1, 2]))])
            .expect("record batch");
        let err = Chunk::try_new(batch).expect_err("expected slot id error");
        assert!(err.contains(FIELD_META_SLOT_ID), "err={}", err);
    }

    #[test]
    fn rejects_duplicate_slot_id() {
        let schema = Arc::new(Schema::new(vec![
            field_with_slot_id(Field::new("a", DataType::Int32, true), SlotId::new(1)),
            field_with_slot_id(Field::new("b", DataType::Int32, true), SlotId::new(1)),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![1, 2])),
                Arc::new(Int32Array::from(vec![3, 4])),
            ],
        )
        .expect("record batch");
        let err = Chunk::try_new(batch).expect_err("expected duplicate error");
        assert!(err.contains("duplicate slot id"), "err={}", err);
    }

    #[test]
    fn swap_exchanges_contents() {
        let mut a = int_chunk(vec![1, 2, 3]);
        let mut b = Chunk::default();
        b.swap(&mut a);
        assert_eq!(b.len(), 3);
        assert!(a.is_empty());
    }

    #[test]
    fn append_column_extends_slot_map() {
        let mut chunk = int_chunk(vec![1, 2]);
        let slot = chunk.next_synthetic_slot_id();
        let field = field_with_slot_id(Field::new("k", DataType::Int32, true), slot);
        let idx = chunk
            .append_column(field, Arc::new(Int32Array::from(vec![10, 20])))
            .expect("append");
        assert_eq!(idx, 1);
        assert_eq!(chunk.index_of_slot(slot).expect("slot"), 1);
    }

    #[test]
    fn slice_keeps_accounting_with_tracker() {
        let tracker = MemTracker::new_root("test");
        let mut chunk = int_chunk(vec![1, 2, 3, 4]);
        chunk.transfer_to(&tracker);
        let consumed = tracker.current();
        assert!(consumed > 0);
        let window = chunk.slice(1, 2);
        assert_eq!(window.len(), 2);
        drop(chunk);
        drop(window);
        assert_eq!(tracker.current(), 0);
    }
}
