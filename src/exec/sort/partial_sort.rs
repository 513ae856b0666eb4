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
//! In-memory sort of one extracted run.

use arrow::compute::{SortColumn, lexsort_to_indices, take};
use arrow::record_batch::RecordBatch;

use crate::common::error::{Error, Result};
use crate::exec::chunk::Chunk;
use crate::exec::expr::{ExprArena, SortExecExprs};
use crate::exec::sort::{SortDescription, SortKey};

/// Sort one run under the ordering projections.
///
/// Materializes the sort-output tuple when configured, executes each
/// ordering projection to pin its column index, builds the row permutation
/// with `lexsort_to_indices`, and applies it to every column.
///
/// `limit_hint` (top-n only, `offset + limit`) bounds the permutation: the
/// result keeps only the smallest `limit_hint` rows so the run stays fully
/// sorted and its last row is its largest. Rows a run cannot contribute to
/// the result are dropped here instead of travelling to the merge.
pub(crate) fn partial_sort(
    arena: &ExprArena,
    exprs: &SortExecExprs,
    is_asc_order: &[bool],
    nulls_first: &[bool],
    limit_hint: Option<usize>,
    chunk: Chunk,
) -> Result<(Chunk, SortDescription)> {
    if !exprs.is_open() {
        return Err(Error::Internal(
            "sort expressions used before open".to_string(),
        ));
    }
    let mut chunk = if exprs.need_materialize_tuple() {
        exprs
            .materialize_tuple(arena, &chunk)
            .map_err(Error::Expression)?
    } else {
        chunk
    };

    let ordering = exprs.lhs_ordering_exprs();
    if ordering.len() != is_asc_order.len() || ordering.len() != nulls_first.len() {
        return Err(Error::Internal(format!(
            "sort key count mismatch: {} exprs, {} directions, {} null placements",
            ordering.len(),
            is_asc_order.len(),
            nulls_first.len()
        )));
    }
    let mut description = SortDescription::with_capacity(ordering.len());
    for (i, expr) in ordering.iter().enumerate() {
        let column = arena
            .execute(*expr, &mut chunk)
            .map_err(Error::Expression)?;
        description.push(SortKey::new(column, is_asc_order[i], nulls_first[i]));
    }

    let sort_columns: Vec<SortColumn> = description
        .iter()
        .map(|key| SortColumn {
            values: chunk.columns()[key.column].clone(),
            options: Some(key.sort_options()),
        })
        .collect();
    let indices =
        lexsort_to_indices(&sort_columns, limit_hint).map_err(|e| Error::Internal(e.to_string()))?;
    let columns = chunk
        .batch
        .columns()
        .iter()
        .map(|col| take(col.as_ref(), &indices, None))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Internal(e.to_string()))?;
    let sorted = RecordBatch::try_new(chunk.schema(), columns)
        .map_err(|e| Error::Internal(e.to_string()))?;
    let sorted = Chunk::try_new(sorted).map_err(Error::Internal)?;
    Ok((sorted, description))
}
