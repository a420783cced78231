//! `covid-stats` library crate.
//!
//! The binary is a thin wrapper around this library so that:
//!
//! - feed ingest, storage and queries are testable without a network or a server
//! - the store/updater/query pieces can be composed differently (e.g. one-shot refresh)

pub mod api;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod query;
pub mod store;
