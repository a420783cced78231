//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - produced by CSV ingest
//! - held in the in-memory store
//! - returned as JSON by the HTTP API

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One calendar day of statistics for the configured country.
///
/// Counts are non-negative; anything the feed leaves blank (or emits in a form we
/// cannot read as a count) is stored as `0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticRecord {
    pub date: NaiveDate,
    pub new_confirmed: u64,
    pub new_deaths: u64,
    pub new_vaccinations: u64,
    pub total_confirmed: u64,
    pub total_deaths: u64,
    pub total_vaccinations: u64,
}

impl StatisticRecord {
    /// A record with every count set to zero.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            new_confirmed: 0,
            new_deaths: 0,
            new_vaccinations: 0,
            total_confirmed: 0,
            total_deaths: 0,
            total_vaccinations: 0,
        }
    }
}

/// How a date-range read behaves when the range reaches past the held data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RangePolicy {
    /// Return whatever records fall inside the range.
    #[default]
    Partial,
    /// Return nothing unless the held data reaches the end of the range.
    ///
    /// Weekly/monthly views then stay empty until the feed has caught up with
    /// the requested end date.
    Strict,
}

/// Which rows of the feed an update cycle keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFilter {
    /// Exact (case-sensitive) match against the `location` column.
    pub location: String,
    /// Calendar year rows must fall in.
    pub year: i32,
}

impl FeedFilter {
    pub fn new(location: impl Into<String>, year: i32) -> Self {
        Self {
            location: location.into(),
            year,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_camel_case_fields() {
        let mut record = StatisticRecord::empty(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        record.new_confirmed = 9;
        record.total_vaccinations = 120;

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2024-01-03");
        assert_eq!(json["newConfirmed"], 9);
        assert_eq!(json["newVaccinations"], 0);
        assert_eq!(json["totalVaccinations"], 120);
        assert!(json.get("new_confirmed").is_none());
    }

    #[test]
    fn range_policy_defaults_to_partial() {
        assert_eq!(RangePolicy::default(), RangePolicy::Partial);
    }
}
