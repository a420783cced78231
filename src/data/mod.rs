//! Remote data sources.

pub mod owid;

pub use owid::{DEFAULT_SOURCE_URL, FeedSource, OwidClient};
