//! In-memory statistics store.
//!
//! Records are keyed by date and only ever appended in increasing date order.
//! The store is a cheap cloneable handle; the updater and the query side each
//! hold a clone of the same instance.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::domain::{RangePolicy, StatisticRecord};

#[derive(Debug, Default)]
struct StoreState {
    records: BTreeMap<NaiveDate, StatisticRecord>,
}

impl StoreState {
    fn latest(&self) -> Option<&StatisticRecord> {
        self.records.last_key_value().map(|(_, r)| r)
    }

    fn append(&mut self, record: StatisticRecord) -> bool {
        if self.latest().is_some_and(|latest| record.date <= latest.date) {
            return false;
        }
        self.records.insert(record.date, record);
        true
    }
}

#[derive(Clone, Debug, Default)]
pub struct StatisticsStore {
    inner: Arc<RwLock<StoreState>>,
}

impl StatisticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record after the current latest.
    ///
    /// Returns `false` (and leaves the store untouched) when `record.date` is not
    /// strictly after the latest held date.
    pub async fn append(&self, record: StatisticRecord) -> bool {
        self.inner.write().await.append(record)
    }

    /// Append a batch under a single write lock. Returns how many were accepted.
    pub async fn extend(&self, records: impl IntoIterator<Item = StatisticRecord>) -> usize {
        let mut state = self.inner.write().await;
        let mut added = 0;
        for record in records {
            if state.append(record) {
                added += 1;
            }
        }
        added
    }

    pub async fn latest(&self) -> Option<StatisticRecord> {
        self.inner.read().await.latest().cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }

    /// Records with `start <= date <= end`, in date order.
    pub async fn range(&self, start: NaiveDate, end: NaiveDate, policy: RangePolicy) -> Vec<StatisticRecord> {
        if start > end {
            return Vec::new();
        }
        let state = self.inner.read().await;

        if policy == RangePolicy::Strict {
            let covers_end = state.latest().is_some_and(|latest| latest.date >= end);
            if !covers_end {
                return Vec::new();
            }
        }

        state.records.range(start..=end).map(|(_, r)| r.clone()).collect()
    }

    /// Same as [`range`](Self::range), with both ends given as zero-based
    /// day-of-year indexes (Jan 1 = 0) within `year`.
    pub async fn range_by_day_of_year(
        &self,
        year: i32,
        start_index: u32,
        end_index: u32,
        policy: RangePolicy,
    ) -> Vec<StatisticRecord> {
        match (day_of_year_to_date(year, start_index), day_of_year_to_date(year, end_index)) {
            (Some(start), Some(end)) => self.range(start, end, policy).await,
            _ => Vec::new(),
        }
    }
}

/// Resolve a zero-based day-of-year index to a date, or `None` if it falls
/// outside `year`.
pub fn day_of_year_to_date(year: i32, index: u32) -> Option<NaiveDate> {
    NaiveDate::from_yo_opt(year, index.checked_add(1)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(date: NaiveDate, confirmed: u64) -> StatisticRecord {
        let mut r = StatisticRecord::empty(date);
        r.new_confirmed = confirmed;
        r
    }

    async fn seeded(days: &[(u32, u64)]) -> StatisticsStore {
        let store = StatisticsStore::new();
        for &(day, confirmed) in days {
            assert!(store.append(record(ymd(2024, 1, day), confirmed)).await);
        }
        store
    }

    #[tokio::test]
    async fn starts_empty() {
        let store = StatisticsStore::new();
        assert!(store.latest().await.is_none());
        assert!(store.is_empty().await);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn latest_is_last_appended() {
        let store = seeded(&[(1, 5), (2, 7), (3, 9)]).await;

        let latest = store.latest().await.expect("store should hold records");
        assert_eq!(latest.date, ymd(2024, 1, 3));
        assert_eq!(latest.new_confirmed, 9);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn rejects_out_of_order_and_duplicate_dates() {
        let store = seeded(&[(1, 5), (3, 9)]).await;

        assert!(!store.append(record(ymd(2024, 1, 3), 100)).await);
        assert!(!store.append(record(ymd(2024, 1, 2), 7)).await);

        assert_eq!(store.len().await, 2);
        assert_eq!(store.latest().await.unwrap().new_confirmed, 9);
    }

    #[tokio::test]
    async fn extend_counts_only_accepted_records() {
        let store = seeded(&[(1, 5), (2, 7)]).await;

        let added = store
            .extend(vec![
                record(ymd(2024, 1, 1), 5),
                record(ymd(2024, 1, 2), 7),
                record(ymd(2024, 1, 3), 9),
                record(ymd(2024, 1, 4), 11),
            ])
            .await;

        assert_eq!(added, 2);
        assert_eq!(store.len().await, 4);
    }

    #[tokio::test]
    async fn range_is_inclusive_and_ordered() {
        let store = seeded(&[(1, 5), (2, 7), (3, 9), (4, 11)]).await;

        let out = store.range(ymd(2024, 1, 1), ymd(2024, 1, 3), RangePolicy::Partial).await;

        let confirmed: Vec<u64> = out.iter().map(|r| r.new_confirmed).collect();
        assert_eq!(confirmed, vec![5, 7, 9]);
    }

    #[tokio::test]
    async fn partial_range_returns_what_exists() {
        let store = seeded(&[(1, 5), (2, 7), (3, 9)]).await;

        let out = store.range(ymd(2024, 1, 2), ymd(2024, 1, 10), RangePolicy::Partial).await;

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].date, ymd(2024, 1, 2));
    }

    #[tokio::test]
    async fn strict_range_is_empty_past_held_data() {
        let store = seeded(&[(1, 5), (2, 7), (3, 9)]).await;

        assert!(store.range(ymd(2024, 1, 2), ymd(2024, 1, 10), RangePolicy::Strict).await.is_empty());
        assert_eq!(
            store.range(ymd(2024, 1, 2), ymd(2024, 1, 3), RangePolicy::Strict).await.len(),
            2
        );
        assert!(StatisticsStore::new()
            .range(ymd(2024, 1, 1), ymd(2024, 1, 1), RangePolicy::Strict)
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn inverted_range_is_empty() {
        let store = seeded(&[(1, 5), (2, 7)]).await;
        assert!(store.range(ymd(2024, 1, 2), ymd(2024, 1, 1), RangePolicy::Partial).await.is_empty());
    }

    #[tokio::test]
    async fn day_of_year_range_resolves_to_dates() {
        let store = seeded(&[(1, 5), (2, 7), (3, 9)]).await;

        let out = store.range_by_day_of_year(2024, 0, 2, RangePolicy::Strict).await;
        assert_eq!(out.len(), 3);

        let out = store.range_by_day_of_year(2024, 1, 5, RangePolicy::Strict).await;
        assert!(out.is_empty());

        // 2024 is a leap year: index 366 is out of range.
        assert!(store.range_by_day_of_year(2024, 0, 366, RangePolicy::Partial).await.is_empty());
    }

    #[test]
    fn day_of_year_conversions() {
        assert_eq!(day_of_year_to_date(2024, 0), Some(ymd(2024, 1, 1)));
        assert_eq!(day_of_year_to_date(2024, 59), Some(ymd(2024, 2, 29)));
        assert_eq!(day_of_year_to_date(2024, 365), Some(ymd(2024, 12, 31)));
        assert_eq!(day_of_year_to_date(2023, 365), None);
        assert_eq!(day_of_year_to_date(2024, 60), Some(ymd(2024, 3, 1)));
    }
}
