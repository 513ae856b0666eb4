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
//! Process configuration.
//!
//! Responsibilities:
//! - Load the toml config once and hand out typed accessors with defaults.
//! - Config never fails execution: a missing file falls back to defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static CONFIG: OnceLock<NovaSortConfig> = OnceLock::new();

fn default_log_level() -> String {
    "info".to_string()
}

pub fn init_from_path(path: impl AsRef<Path>) -> Result<&'static NovaSortConfig> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }
    let cfg = NovaSortConfig::load_from_file(path.as_ref())?;
    let _ = CONFIG.set(cfg);
    Ok(CONFIG.get().expect("CONFIG set"))
}

pub fn config() -> &'static NovaSortConfig {
    CONFIG.get_or_init(|| {
        config_path_from_env_or_default()
            .and_then(|p| NovaSortConfig::load_from_file(&p).ok())
            .unwrap_or_default()
    })
}

fn config_path_from_env_or_default() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("NOVASORT_CONFIG") {
        if !p.trim().is_empty() {
            return Some(PathBuf::from(p));
        }
    }
    let p = PathBuf::from("novasort.toml");
    p.exists().then_some(p)
}

#[derive(Clone, Deserialize)]
pub struct NovaSortConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional full tracing EnvFilter expression.
    /// If set, this takes precedence over `log_level`.
    #[serde(default)]
    pub log_filter: Option<String>,

    #[serde(default)]
    pub sort: SortConfig,
}

impl NovaSortConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config file: {}", path.display()))?;
        let cfg: NovaSortConfig =
            toml::from_str(&s).with_context(|| format!("parse toml: {}", path.display()))?;
        Ok(cfg)
    }
}

impl Default for NovaSortConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_filter: None,
            sort: SortConfig::default(),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct SortConfig {
    /// Row count at which a buffered run is flushed to partial sort.
    #[serde(default = "default_run_row_threshold")]
    pub run_row_threshold: usize,
    /// Byte size at which a buffered run is flushed to partial sort.
    #[serde(default = "default_run_byte_threshold")]
    pub run_byte_threshold: usize,
}

fn default_run_row_threshold() -> usize {
    1024 * 1024
}

fn default_run_byte_threshold() -> usize {
    64 * 1024 * 1024
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            run_row_threshold: default_run_row_threshold(),
            run_byte_threshold: default_run_byte_threshold(),
        }
    }
}

pub fn log_filter() -> String {
    let cfg = config();
    cfg.log_filter.clone().unwrap_or_else(|| cfg.log_level.clone())
}

pub(crate) fn sort_run_row_threshold() -> usize {
    config().sort.run_row_threshold.max(1)
}

pub(crate) fn sort_run_byte_threshold() -> usize {
    config().sort.run_byte_threshold.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_are_positive() {
        let cfg = NovaSortConfig::default();
        assert_eq!(cfg.sort.run_row_threshold, 1024 * 1024);
        assert_eq!(cfg.sort.run_byte_threshold, 64 * 1024 * 1024);
    }

    #[test]
    fn sort_section_is_optional_in_toml() {
        let cfg: NovaSortConfig = toml::from_str("log_level = \"debug\"").expect("parse");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.sort.run_row_threshold, 1024 * 1024);
    }

    #[test]
    fn sort_section_overrides_defaults() {
        let cfg: NovaSortConfig =
            toml::from_str("[sort]\nrun_row_threshold = 4096\nrun_byte_threshold = 65536\n")
                .expect("parse");
        assert_eq!(cfg.sort.run_row_threshold, 4096);
        assert_eq!(cfg.sort.run_byte_threshold, 65536);
    }
}
