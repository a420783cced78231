//! Domain types used throughout the service.
//!
//! This module defines:
//!
//! - the per-day statistics record (`StatisticRecord`)
//! - range read behaviour (`RangePolicy`)
//! - the row filter applied during ingest (`FeedFilter`)

pub mod types;

pub use types::*;
