//! Shared domain types for botmaas.
//!
//! Templates, workflow graphs, produced workflows, clone lineage records, and
//! mass-copy request/report shapes, plus their error types and global config.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

#[macro_use]
mod id;

pub mod config;
pub mod error;
pub mod lineage;
pub mod mass_copy;
pub mod template;
pub mod workflow;
