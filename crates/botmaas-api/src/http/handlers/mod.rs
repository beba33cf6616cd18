//! HTTP request handlers for the REST API.

pub mod lineage;
pub mod maas;
pub mod template;
