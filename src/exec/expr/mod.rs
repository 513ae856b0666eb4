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
//! Sort key expression evaluation.
//!
//! Responsibilities:
//! - Arena-allocated expression nodes evaluated against chunks.
//! - `SortExecExprs` groups the ordering projections and the optional
//!   sort-tuple materialization projections used before partial sort.

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::array::new_null_array;
use arrow::datatypes::{DataType, Field};

use crate::common::ids::SlotId;
use crate::exec::chunk::{Chunk, field_with_slot_id};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ExprId(pub usize);

#[derive(Clone, Debug)]
pub enum LiteralValue {
    Null,
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Bool(bool),
    Utf8(String),
}

#[derive(Clone, Debug)]
pub enum ExprNode {
    Literal(LiteralValue),
    /// Slot id coming from the frontend plan/descriptor table.
    SlotId(SlotId),
}

#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    nodes: Vec<ExprNode>,
    types: Vec<DataType>,
}

impl ExprArena {
    pub fn push(&mut self, node: ExprNode) -> ExprId {
        self.push_typed(node, DataType::Null)
    }

    pub fn push_typed(&mut self, node: ExprNode, data_type: DataType) -> ExprId {
        let id = ExprId(self.nodes.len());
        self.nodes.push(node);
        self.types.push(data_type);
        id
    }

    pub fn node(&self, id: ExprId) -> Option<&ExprNode> {
        self.nodes.get(id.0)
    }

    pub fn data_type(&self, id: ExprId) -> Option<&DataType> {
        self.types.get(id.0)
    }

    pub fn eval(&self, id: ExprId, chunk: &Chunk) -> Result<ArrayRef, String> {
        let node = self
            .nodes
            .get(id.0)
            .ok_or_else(|| "invalid ExprId".to_string())?;
        match node {
            ExprNode::Literal(v) => {
                if matches!(v, LiteralValue::Null) {
                    let target_type = self.data_type(id).cloned().unwrap_or(DataType::Null);
                    if !matches!(target_type, DataType::Null) {
                        // Plans may materialize `NULL` directly into typed slots;
                        // preserve the declared type for downstream concat/take.
                        return Ok(new_null_array(&target_type, chunk.len()));
                    }
                }
                eval_literal(v, chunk.len())
            }
            ExprNode::SlotId(slot_id) => chunk.column_by_slot_id(*slot_id),
        }
    }

    /// Execute a projection against `chunk` and return the result column's
    /// index: slot references resolve to the existing column, anything else
    /// is evaluated and appended under a synthetic slot id.
    pub fn execute(&self, id: ExprId, chunk: &mut Chunk) -> Result<usize, String> {
        if let Some(ExprNode::SlotId(slot_id)) = self.node(id) {
            return chunk.index_of_slot(*slot_id);
        }
        let values = self.eval(id, chunk)?;
        let slot_id = chunk.next_synthetic_slot_id();
        let field = field_with_slot_id(
            Field::new(format!("sort_key_{}", id.0), values.data_type().clone(), true),
            slot_id,
        );
        chunk.append_column(field, values)
    }
}

fn eval_literal(value: &LiteralValue, rows: usize) -> Result<ArrayRef, String> {
    let out: ArrayRef = match value {
        LiteralValue::Null => new_null_array(&DataType::Null, rows),
        LiteralValue::Int32(v) => Arc::new(Int32Array::from(vec![*v; rows])),
        LiteralValue::Int64(v) => Arc::new(Int64Array::from(vec![*v; rows])),
        LiteralValue::Float64(v) => Arc::new(Float64Array::from(vec![*v; rows])),
        LiteralValue::Bool(v) => Arc::new(BooleanArray::from(vec![*v; rows])),
        LiteralValue::Utf8(v) => Arc::new(StringArray::from(vec![v.as_str(); rows])),
    };
    Ok(out)
}

/// The ordering projections of one sort node, plus the optional sort-tuple
/// materialization projections evaluated before partial sort.
#[derive(Clone, Debug)]
pub struct SortExecExprs {
    lhs_ordering_exprs: Vec<ExprId>,
    sort_tuple_slot_exprs: Option<Vec<ExprId>>,
    opened: bool,
}

impl SortExecExprs {
    pub fn new(lhs_ordering_exprs: Vec<ExprId>, sort_tuple_slot_exprs: Option<Vec<ExprId>>) -> Self {
        Self {
            lhs_ordering_exprs,
            sort_tuple_slot_exprs,
            opened: false,
        }
    }

    pub fn lhs_ordering_exprs(&self) -> &[ExprId] {
        &self.lhs_ordering_exprs
    }

    pub fn need_materialize_tuple(&self) -> bool {
        self.sort_tuple_slot_exprs.is_some()
    }

    pub fn open(&mut self, arena: &ExprArena) -> Result<(), String> {
        for id in self
            .lhs_ordering_exprs
            .iter()
            .chain(self.sort_tuple_slot_exprs.iter().flatten())
        {
            if arena.node(*id).is_none() {
                return Err(format!("sort expression {} is not in the arena", id.0));
            }
        }
        self.opened = true;
        Ok(())
    }

    pub fn close(&mut self) {
        self.opened = false;
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    /// Build the reduced chunk holding only the materialized sort-output
    /// columns. Slot references keep their field and slot id; computed
    /// projections get synthetic ones above the chunk's slot range.
    pub fn materialize_tuple(&self, arena: &ExprArena, chunk: &Chunk) -> Result<Chunk, String> {
        let exprs = self
            .sort_tuple_slot_exprs
            .as_ref()
            .ok_or_else(|| "sort tuple materialization is not configured".to_string())?;
        let mut next_synthetic = chunk.next_synthetic_slot_id().as_u32();
        let mut fields = Vec::with_capacity(exprs.len());
        let mut columns = Vec::with_capacity(exprs.len());
        for id in exprs {
            match arena.node(*id) {
                Some(ExprNode::SlotId(slot_id)) => {
                    let idx = chunk.index_of_slot(*slot_id)?;
                    fields.push(chunk.schema().field(idx).clone());
                    columns.push(chunk.columns()[idx].clone());
                }
                Some(_) => {
                    let values = arena.eval(*id, chunk)?;
                    let field = field_with_slot_id(
                        Field::new(
                            format!("sort_col_{}", id.0),
                            values.data_type().clone(),
                            true,
                        ),
                        SlotId::new(next_synthetic),
                    );
                    next_synthetic += 1;
                    fields.push(field);
                    columns.push(values);
                }
                None => return Err(format!("sort expression {} is not in the arena", id.0)),
            }
        }
        let schema = Arc::new(arrow::datatypes::Schema::new(fields));
        let batch =
            arrow::array::RecordBatch::try_new(schema, columns).map_err(|e| e.to_string())?;
        Chunk::try_new(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, RecordBatch};
    use arrow::datatypes::Schema;

    fn two_column_chunk() -> Chunk {
        let schema = Arc::new(Schema::new(vec![
            field_with_slot_id(Field::new("a", DataType::Int32, true), SlotId::new(1)),
            field_with_slot_id(Field::new("b", DataType::Int32, true), SlotId::new(2)),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![1, 2, 3])),
                Arc::new(Int32Array::from(vec![9, 8, 7])),
            ],
        )
        .expect("batch");
        Chunk::new(batch)
    }

    #[test]
    fn execute_resolves_slot_refs_without_append() {
        let mut arena = ExprArena::default();
        let expr = arena.push_typed(ExprNode::SlotId(SlotId::new(2)), DataType::Int32);
        let mut chunk = two_column_chunk();
        let idx = arena.execute(expr, &mut chunk).expect("execute");
        assert_eq!(idx, 1);
        assert_eq!(chunk.batch.num_columns(), 2);
    }

    #[test]
    fn execute_appends_computed_projection() {
        let mut arena = ExprArena::default();
        let expr = arena.push_typed(
            ExprNode::Literal(LiteralValue::Int32(42)),
            DataType::Int32,
        );
        let mut chunk = two_column_chunk();
        let idx = arena.execute(expr, &mut chunk).expect("execute");
        assert_eq!(idx, 2);
        assert_eq!(chunk.batch.num_columns(), 3);
    }

    #[test]
    fn typed_null_literal_uses_declared_type() {
        let mut arena = ExprArena::default();
        let expr = arena.push_typed(ExprNode::Literal(LiteralValue::Null), DataType::Utf8);
        let chunk = two_column_chunk();
        let arr = arena.eval(expr, &chunk).expect("eval");
        assert_eq!(arr.data_type(), &DataType::Utf8);
        assert_eq!(arr.len(), 3);
        assert!(arr.is_null(0));
    }

    #[test]
    fn materialize_tuple_keeps_slot_fields() {
        let mut arena = ExprArena::default();
        let b = arena.push_typed(ExprNode::SlotId(SlotId::new(2)), DataType::Int32);
        let exprs = SortExecExprs::new(vec![b], Some(vec![b]));
        let chunk = two_column_chunk();
        let reduced = exprs.materialize_tuple(&arena, &chunk).expect("materialize");
        assert_eq!(reduced.batch.num_columns(), 1);
        assert_eq!(reduced.index_of_slot(SlotId::new(2)).expect("slot"), 0);
    }
}
