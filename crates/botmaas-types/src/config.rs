//! Global configuration types for botmaas.
//!
//! `GlobalConfig` represents the top-level `config.toml` that tunes mass-copy
//! fan-out and lineage paging.

use serde::{Deserialize, Serialize};

/// Top-level configuration, loaded from `~/.botmaas/config.toml`.
/// All fields have sensible defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub mass_copy: MassCopyConfig,
    #[serde(default)]
    pub lineage: LineageConfig,
}

/// What to do when a mass-copy target already holds a clone of the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReclonePolicy {
    /// Every invocation creates a new independent clone.
    #[default]
    AlwaysNew,
    /// Skip targets that already have a clone of the origin in the same space.
    SkipExisting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassCopyConfig {
    /// Maximum number of targets duplicated concurrently.
    #[serde(default = "default_max_parallel_targets")]
    pub max_parallel_targets: usize,
    /// Largest accepted target list.
    #[serde(default = "default_max_targets")]
    pub max_targets: usize,
    #[serde(default)]
    pub reclone_policy: ReclonePolicy,
}

fn default_max_parallel_targets() -> usize {
    8
}

fn default_max_targets() -> usize {
    500
}

impl Default for MassCopyConfig {
    fn default() -> Self {
        Self {
            max_parallel_targets: default_max_parallel_targets(),
            max_targets: default_max_targets(),
            reclone_policy: ReclonePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageConfig {
    /// Rows fetched per page when streaming descendants.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    100
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}
