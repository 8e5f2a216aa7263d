//! Adapters from raw input shapes (catalog rows, symptom text) into engine-facing values.

pub(crate) mod catalog;
pub mod normalize;
