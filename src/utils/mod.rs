//! Internal helpers for `--since` parsing and filesystem locations.

pub(crate) mod date;
pub(crate) mod paths;
