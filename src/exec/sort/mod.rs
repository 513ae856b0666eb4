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
//! Sort kernels used by the sort node.
//!
//! Responsibilities:
//! - Describe per-key ordering and derive the shared row comparator.
//! - Keep run buffering, partial sort, run admission and merge reading
//!   isolated from operator state transitions.

use arrow::compute::SortOptions;
use arrow::row::{RowConverter, SortField};

use crate::exec::chunk::Chunk;

mod cursor;
mod merge;
mod partial_sort;
mod run_buffer;
mod run_set;

pub(crate) use cursor::{RunCursor, SortedRun};
pub(crate) use merge::MergeReader;
pub(crate) use partial_sort::partial_sort;
pub(crate) use run_buffer::RunBuffer;
pub(crate) use run_set::RunSet;

/// Ordering of one sort key column.
///
/// `direction` is `1` for ascending, `-1` for descending. `nulls_direction`
/// is the opposite sign of `direction` when nulls sort first and the same
/// sign when nulls sort last, so a single signed comparison covers both.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SortKey {
    pub column: usize,
    pub direction: i8,
    pub nulls_direction: i8,
}

impl SortKey {
    pub fn new(column: usize, asc: bool, nulls_first: bool) -> Self {
        let direction: i8 = if asc { 1 } else { -1 };
        let nulls_direction = if nulls_first { -direction } else { direction };
        Self {
            column,
            direction,
            nulls_direction,
        }
    }

    pub fn is_asc(&self) -> bool {
        self.direction > 0
    }

    pub fn nulls_first(&self) -> bool {
        self.nulls_direction != self.direction
    }

    pub fn sort_options(&self) -> SortOptions {
        SortOptions {
            descending: !self.is_asc(),
            nulls_first: self.nulls_first(),
        }
    }
}

/// Major-to-minor list of sort keys.
pub type SortDescription = Vec<SortKey>;

/// Build the row converter realizing the description's lexicographic order
/// (including null placement) as byte-comparable rows. One converter is
/// shared by the partial sort boundary checks, the pruning heap and the
/// merge heap so their orderings can never diverge.
pub(crate) fn build_row_converter(
    description: &[SortKey],
    chunk: &Chunk,
) -> Result<RowConverter, String> {
    let mut fields = Vec::with_capacity(description.len());
    for key in description {
        let column = chunk
            .columns()
            .get(key.column)
            .ok_or_else(|| format!("sort key column {} out of range", key.column))?;
        fields.push(SortField::new_with_options(
            column.data_type().clone(),
            key.sort_options(),
        ));
    }
    RowConverter::new(fields).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nulls_direction_encodes_null_placement() {
        let asc_nulls_first = SortKey::new(0, true, true);
        assert_eq!(asc_nulls_first.direction, 1);
        assert_eq!(asc_nulls_first.nulls_direction, -1);
        assert!(asc_nulls_first.nulls_first());

        let desc_nulls_first = SortKey::new(0, false, true);
        assert_eq!(desc_nulls_first.direction, -1);
        assert_eq!(desc_nulls_first.nulls_direction, 1);
        assert!(desc_nulls_first.nulls_first());

        let desc_nulls_last = SortKey::new(0, false, false);
        assert_eq!(desc_nulls_last.nulls_direction, -1);
        assert!(!desc_nulls_last.nulls_first());
    }

    #[test]
    fn sort_options_round_trip() {
        let key = SortKey::new(3, false, true);
        let options = key.sort_options();
        assert!(options.descending);
        assert!(options.nulls_first);
        assert_eq!(key.column, 3);
    }
}
