//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (botmaas-infra) implements. The core crate never depends on any
//! specific storage technology.

pub mod lineage;
pub mod space;
pub mod template;
pub mod workflow;
