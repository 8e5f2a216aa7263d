//! Data the engine reads and writes: the disease catalog and the analysis
//! history file.

pub mod catalog;
pub mod history;
