//! Input helpers.
//!
//! - streaming CSV ingest of the statistics feed (`ingest`)

pub mod ingest;

pub use ingest::*;
