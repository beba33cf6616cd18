pub mod catalog;
pub mod duplication;
pub mod graph;
pub mod maas;
pub mod mass_copy;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;
