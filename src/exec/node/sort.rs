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
//! Sort node for ORDER BY execution.
//!
//! Responsibilities:
//! - Drain the child into sorted runs during `open` (the build phase),
//!   pruning runs that cannot reach a top-n result.
//! - Stream the merged order to the caller in `next`, honoring offset and
//!   limit.
//!
//! Key exported interfaces:
//! - Types: `SortNode`.

use std::sync::Arc;

use arrow::row::RowConverter;

use crate::common::config;
use crate::common::error::{Error, Result};
use crate::novasort_logging::debug;
use crate::exec::chunk::Chunk;
use crate::exec::expr::{ExprArena, SortExecExprs};
use crate::exec::node::{ExecNode, ExecNodeBase};
use crate::exec::sort::{
    MergeReader, RunBuffer, RunSet, SortDescription, SortedRun, build_row_converter, partial_sort,
};
use crate::runtime::profile::ScopedTimer;
use crate::runtime::runtime_state::RuntimeState;

/// Blocking sort over the child's output.
///
/// With `limit = -1` every run is kept and the merge streams the full
/// ordering. With `limit >= 0` each run is cut to `offset + limit` rows at
/// partial sort and whole runs are discarded when they cannot contribute
/// to the result.
pub struct SortNode {
    base: ExecNodeBase,
    child: Box<dyn ExecNode>,
    arena: Arc<ExprArena>,
    sort_exec_exprs: SortExecExprs,
    is_asc_order: Vec<bool>,
    nulls_first: Vec<bool>,
    offset: usize,
    num_rows_skipped: usize,
    max_buffered_rows: Option<usize>,
    max_buffered_bytes: Option<usize>,
    run_buffer: RunBuffer,
    run_set: RunSet,
    merge_reader: Option<MergeReader>,
    description: SortDescription,
    converter: Option<Arc<RowConverter>>,
    single_run_consumed: bool,
}

impl SortNode {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        child: Box<dyn ExecNode>,
        arena: Arc<ExprArena>,
        sort_exec_exprs: SortExecExprs,
        is_asc_order: Vec<bool>,
        nulls_first: Vec<bool>,
        offset: usize,
        limit: i64,
        max_buffered_rows: Option<usize>,
        max_buffered_bytes: Option<usize>,
    ) -> Result<Self> {
        let keys = sort_exec_exprs.lhs_ordering_exprs().len();
        if keys == 0 {
            return Err(Error::NotSupported(
                "sort node requires at least one ordering expression".to_string(),
            ));
        }
        if keys != is_asc_order.len() || keys != nulls_first.len() {
            return Err(Error::Internal(format!(
                "sort key count mismatch: {} exprs, {} directions, {} null placements",
                keys,
                is_asc_order.len(),
                nulls_first.len()
            )));
        }
        if limit < -1 {
            return Err(Error::NotSupported(format!(
                "sort node limit must be -1 or non-negative, got {limit}"
            )));
        }
        let rows_to_keep = (limit >= 0).then(|| offset.saturating_add(limit as usize));
        Ok(Self {
            base: ExecNodeBase::new("SORT", limit),
            child,
            arena,
            sort_exec_exprs,
            is_asc_order,
            nulls_first,
            offset,
            num_rows_skipped: 0,
            max_buffered_rows,
            max_buffered_bytes,
            run_buffer: RunBuffer::new(),
            run_set: RunSet::new(rows_to_keep),
            merge_reader: None,
            description: SortDescription::new(),
            converter: None,
            single_run_consumed: false,
        })
    }

    fn rows_to_keep(&self) -> Option<usize> {
        (self.base.limit() >= 0).then(|| self.offset.saturating_add(self.base.limit() as usize))
    }

    /// Drain the child to completion, cutting the stream into sorted runs.
    fn sort_input(&mut self, state: &RuntimeState) -> Result<()> {
        let row_threshold = self
            .max_buffered_rows
            .unwrap_or_else(config::sort_run_row_threshold);
        let byte_threshold = self
            .max_buffered_bytes
            .unwrap_or_else(config::sort_run_byte_threshold);
        let partial_sort_timer = self.base.profile().counter("PartialSortTime");
        let limit_hint = self.rows_to_keep();

        let mut upstream_eos = false;
        while !upstream_eos {
            loop {
                let mut upstream = Chunk::default();
                let mut child_eos = false;
                self.child.next(state, &mut upstream, &mut child_eos)?;
                upstream_eos = child_eos;
                if !upstream.is_empty() {
                    self.run_buffer.append(upstream);
                }
                if upstream_eos
                    || self.run_buffer.row_count() >= row_threshold
                    || self.run_buffer.byte_size() >= byte_threshold
                {
                    break;
                }
            }

            let Some(mut run_chunk) = self.run_buffer.extract().map_err(Error::Internal)? else {
                continue;
            };
            if let Some(tracker) = state.mem_tracker() {
                run_chunk.transfer_to(&tracker);
            }
            if limit_hint == Some(0) {
                // Nothing can ever be emitted; drop the rows and keep draining.
                continue;
            }

            let (mut sorted, description) = {
                let _timer = ScopedTimer::new(partial_sort_timer.clone());
                partial_sort(
                    &self.arena,
                    &self.sort_exec_exprs,
                    &self.is_asc_order,
                    &self.nulls_first,
                    limit_hint,
                    run_chunk,
                )?
            };
            self.description = description;
            if let Some(tracker) = state.mem_tracker() {
                sorted.transfer_to(&tracker);
            }
            if self.converter.is_none() {
                let converter =
                    build_row_converter(&self.description, &sorted).map_err(Error::Internal)?;
                self.converter = Some(Arc::new(converter));
            }
            let converter = self.converter.as_ref().expect("converter initialized");
            let run =
                SortedRun::new(sorted, &self.description, converter).map_err(Error::Internal)?;
            self.run_set.add_run(run);

            state.check_query_state("sort, while sorting input")?;
        }

        debug!(
            target: "novasort::sort",
            runs = self.run_set.len(),
            rows = self.run_set.total_rows(),
            "sort build phase complete"
        );
        if self.run_set.len() > 1 {
            self.merge_reader = Some(MergeReader::new(self.run_set.runs().to_vec(), self.offset));
        }
        Ok(())
    }

    fn merge_sort_read(
        &mut self,
        state: &RuntimeState,
        chunk: &mut Chunk,
        eos: &mut bool,
    ) -> Result<()> {
        let reader = self
            .merge_reader
            .as_mut()
            .ok_or_else(|| Error::Internal("merge reader is missing".to_string()))?;
        match reader.read(state.chunk_size())? {
            Some(mut out) => {
                if let Some(tracker) = state.mem_tracker() {
                    out.transfer_to(&tracker);
                }
                chunk.swap(&mut out);
            }
            None => *eos = true,
        }
        Ok(())
    }

    /// Deliver the only sorted run, minus the offset prefix, in one move.
    fn single_run_read(&mut self, chunk: &mut Chunk, eos: &mut bool) {
        *eos = true;
        if self.single_run_consumed {
            return;
        }
        self.single_run_consumed = true;
        let run = &self.run_set.runs()[0];
        let len = run.chunk.len();
        if self.offset >= len {
            self.num_rows_skipped += len;
            return;
        }
        self.num_rows_skipped += self.offset;
        let mut out = run.chunk.slice(self.offset, len - self.offset);
        chunk.swap(&mut out);
    }
}

impl ExecNode for SortNode {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn open(&mut self, state: &RuntimeState) -> Result<()> {
        let _timer = ScopedTimer::new(self.base.profile().counter("TotalTime"));
        self.base.profile().add_info_string(
            "TOP-N",
            if self.base.limit() == -1 {
                "false"
            } else {
                "true"
            },
        );
        self.sort_exec_exprs
            .open(&self.arena)
            .map_err(Error::Expression)?;
        state.check_query_state("sort, while open")?;
        self.child.open(state)?;

        // The child is drained here; the final merge is done on demand as
        // rows are requested in next().
        self.sort_input(state)?;

        // The build phase consumed everything the child has to offer.
        self.child.close(state)?;
        Ok(())
    }

    fn next(&mut self, state: &RuntimeState, chunk: &mut Chunk, eos: &mut bool) -> Result<()> {
        let _timer = ScopedTimer::new(self.base.profile().counter("TotalTime"));
        state.check_query_state("sort, while get next")?;

        if self.run_set.is_empty() {
            *eos = true;
        } else if self.merge_reader.is_some() {
            self.merge_sort_read(state, chunk, eos)?;
        } else {
            self.single_run_read(chunk, eos);
        }

        self.base.reached_limit(chunk, eos);
        Ok(())
    }

    fn reset(&mut self, _state: &RuntimeState) -> Result<()> {
        self.num_rows_skipped = 0;
        Ok(())
    }

    fn close(&mut self, state: &RuntimeState) -> Result<()> {
        if self.base.is_closed() {
            return Ok(());
        }
        self.base.mark_closed();
        self.sort_exec_exprs.close();
        // Heaps hold cursors into the runs; drop them first.
        self.merge_reader = None;
        self.run_set.clear();
        self.run_buffer.clear();
        self.child.close(state)
    }

    fn debug_string(&self, indentation_level: usize, out: &mut String) {
        out.push_str(&" ".repeat(indentation_level * 2));
        out.push_str("SortNode(");
        for (i, asc) in self.is_asc_order.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(if *asc { "asc" } else { "desc" });
            out.push_str(" nulls ");
            out.push_str(if self.nulls_first[i] { "first" } else { "last" });
        }
        out.push(' ');
        self.base.debug_string(out);
        out.push(')');
    }
}
