//! Daily / weekly / monthly views over the statistics store.

use chrono::{Days, Local, Months, NaiveDate};

use crate::domain::{RangePolicy, StatisticRecord};
use crate::store::StatisticsStore;

/// Stateless read view over a [`StatisticsStore`].
#[derive(Clone, Debug)]
pub struct StatisticsQuery {
    store: StatisticsStore,
    policy: RangePolicy,
    pinned_today: Option<NaiveDate>,
}

impl StatisticsQuery {
    pub fn new(store: StatisticsStore, policy: RangePolicy) -> Self {
        Self {
            store,
            policy,
            pinned_today: None,
        }
    }

    /// Fix "today" for the weekly/monthly views.
    #[cfg(test)]
    pub(crate) fn pinned_at(mut self, today: NaiveDate) -> Self {
        self.pinned_today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.pinned_today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Most recently appended record.
    pub async fn daily(&self) -> Option<StatisticRecord> {
        self.store.latest().await
    }

    /// Records for `[today - 7 days, today]`.
    pub async fn weekly(&self) -> Vec<StatisticRecord> {
        self.weekly_at(self.today()).await
    }

    pub async fn weekly_at(&self, today: NaiveDate) -> Vec<StatisticRecord> {
        let start = today.checked_sub_days(Days::new(7)).unwrap_or(NaiveDate::MIN);
        self.range(start, today).await
    }

    /// Records for `[today - 1 month, today]`.
    ///
    /// Month arithmetic clamps to the end of the shorter month (Mar 31 -> Feb 29).
    pub async fn monthly(&self) -> Vec<StatisticRecord> {
        self.monthly_at(self.today()).await
    }

    pub async fn monthly_at(&self, today: NaiveDate) -> Vec<StatisticRecord> {
        let start = today.checked_sub_months(Months::new(1)).unwrap_or(NaiveDate::MIN);
        self.range(start, today).await
    }

    /// Records for an arbitrary inclusive date range.
    pub async fn range(&self, start: NaiveDate, end: NaiveDate) -> Vec<StatisticRecord> {
        self.store.range(start, end, self.policy).await
    }
}
