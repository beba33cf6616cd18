//! Clone engine services and repository trait definitions for botmaas.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements, and the services built on them: template catalog,
//! duplication engine, mass-copy synchronizer. It depends only on
//! `botmaas-types` -- never on `botmaas-infra` or any database crate.

pub mod repository;
pub mod service;
