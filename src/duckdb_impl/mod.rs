//! Glue between DuckDB's C-level vectors and the SGF functions.

pub(crate) mod bind_info_ffi;
pub(crate) mod scalar;
pub(crate) mod string;
