//! Infrastructure layer for botmaas.
//!
//! Implements the repository traits defined in `botmaas-core` on SQLite,
//! loads `config.toml`, and reads template bundles from disk.

pub mod bundle;
pub mod config;
pub mod sqlite;
