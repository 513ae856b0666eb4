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
//! Execution error kinds.
//!
//! Responsibilities:
//! - One error enum for the operator surface; no local recovery anywhere.
//! - `close` must still run after any of these to release resources.

/// Errors surfaced by execution nodes. The query aborts with the first
/// error's kind and message.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Propagated verbatim from the upstream child.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Cooperative cancellation observed at a checkpoint.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Sort key projection failed to evaluate; fatal to the query.
    #[error("expression error: {0}")]
    Expression(String),

    /// Legacy row-oriented call or an execution mode this engine does not wire.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Invariant violation; escalates as a bug.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
