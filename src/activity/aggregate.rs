use std::{future, sync::Arc};

use anyhow::Result;
use chrono::NaiveDate;
use futures::{stream, StreamExt, TryStreamExt};
use tracing::debug;

use crate::{
    storage::kv::KeyValueStore,
    utils::{
        clock::{today, Clock},
        percentage::Percentage,
    },
};

use super::{log::ActivityLogEntry, store::DailyLogStore};

/// Number of day records read concurrently while scanning history.
const READ_AHEAD: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DailySummary {
    pub completed: usize,
    pub total: usize,
}

impl DailySummary {
    pub fn of(activities: &[ActivityLogEntry]) -> Self {
        Self {
            completed: activities.iter().filter(|v| v.completed).count(),
            total: activities.len(),
        }
    }

    /// 0% for a day without activities.
    pub fn percentage(&self) -> Percentage {
        Percentage::of(self.completed, self.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayHistory {
    pub date: NaiveDate,
    pub summary: DailySummary,
}

/// Derives statistics from the days stored in a [DailyLogStore].
pub struct Aggregator<S> {
    logs: Arc<DailyLogStore<S>>,
    clock: Arc<dyn Clock>,
}

impl<S: KeyValueStore> Aggregator<S> {
    pub fn new(logs: Arc<DailyLogStore<S>>, clock: Arc<dyn Clock>) -> Self {
        Self { logs, clock }
    }

    /// Completion of the current day, unsaved days count as all 8 template activities open.
    pub async fn todays_summary(&self, user_id: &str) -> Result<DailySummary> {
        let date = today(self.clock.as_ref());
        Ok(self.logs.load(user_id, date).await?.summary())
    }

    /// Completion of every stored day, ascending by date. Days whose record can't be parsed
    /// are skipped.
    pub async fn history(&self, user_id: &str) -> Result<Vec<DayHistory>> {
        let dates = self.logs.recorded_dates(user_id).await?;
        debug!("Summarizing {} days of {user_id}", dates.len());

        let logs = self.logs.as_ref();
        stream::iter(dates)
            .map(move |date| async move {
                let record = logs.read_record(user_id, date).await?;
                Ok::<_, anyhow::Error>(record.map(|v| DayHistory {
                    date,
                    summary: v.summary(),
                }))
            })
            .buffered(READ_AHEAD)
            .try_filter_map(|v| future::ready(Ok(v)))
            .try_collect()
            .await
    }

    /// Number of completed activities across all stored days.
    pub async fn lifetime_completed_count(&self, user_id: &str) -> Result<usize> {
        Ok(self
            .history(user_id)
            .await?
            .iter()
            .map(|v| v.summary.completed)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use chrono::NaiveDate;

    use crate::{
        activity::{log::DailyLog, store::DailyLogStore},
        storage::{activities_key, kv::KeyValueStore, memory::MemoryStore},
        utils::{
            clock::{testing::fixed_clock, Clock},
            logging::TEST_LOGGING,
            percentage::Percentage,
        },
    };

    use super::{Aggregator, DailySummary};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn setup(
        store: Arc<MemoryStore>,
    ) -> (Arc<DailyLogStore<Arc<MemoryStore>>>, Aggregator<Arc<MemoryStore>>) {
        let clock: Arc<dyn Clock> = Arc::new(fixed_clock(day(15)));
        let logs = Arc::new(DailyLogStore::new(store, clock.clone()));
        let aggregator = Aggregator::new(logs.clone(), clock);
        (logs, aggregator)
    }

    async fn save_completed(
        logs: &DailyLogStore<Arc<MemoryStore>>,
        date: NaiveDate,
        completed: usize,
    ) -> Result<()> {
        let mut log = DailyLog::fresh(date);
        let ids = log
            .activities()
            .iter()
            .take(completed)
            .map(|v| v.id.clone())
            .collect::<Vec<_>>();
        for id in ids {
            log.toggle(&id)?;
        }
        logs.save("user", date, log.activities()).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_todays_summary_for_fresh_user() -> Result<()> {
        let (_, aggregator) = setup(Arc::new(MemoryStore::new()));

        let summary = aggregator.todays_summary("user").await?;
        assert_eq!(summary, DailySummary { completed: 0, total: 8 });
        assert_eq!(summary.percentage(), Percentage::ZERO);
        Ok(())
    }

    #[tokio::test]
    async fn test_todays_summary_reads_saved_day() -> Result<()> {
        let (logs, aggregator) = setup(Arc::new(MemoryStore::new()));
        save_completed(&logs, day(15), 2).await?;
        save_completed(&logs, day(14), 7).await?;

        let summary = aggregator.todays_summary("user").await?;
        assert_eq!(summary, DailySummary { completed: 2, total: 8 });
        assert_eq!(summary.percentage().rounded(), 25);
        Ok(())
    }

    #[test]
    fn test_empty_day_percentage_is_zero() {
        let summary = DailySummary::of(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.percentage(), Percentage::ZERO);
    }

    #[tokio::test]
    async fn test_lifetime_count_sums_all_days() -> Result<()> {
        let (logs, aggregator) = setup(Arc::new(MemoryStore::new()));
        save_completed(&logs, day(1), 3).await?;
        save_completed(&logs, day(2), 5).await?;

        assert_eq!(aggregator.lifetime_completed_count("user").await?, 8);
        assert_eq!(aggregator.lifetime_completed_count("someone-else").await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupted_day_does_not_blank_total() -> Result<()> {
        *TEST_LOGGING;
        let store = Arc::new(MemoryStore::new());
        let (logs, aggregator) = setup(store.clone());
        save_completed(&logs, day(1), 3).await?;
        save_completed(&logs, day(2), 5).await?;
        save_completed(&logs, day(3), 4).await?;
        store.set(&activities_key("user", day(3)), "{\"activities\": [").await?;

        assert_eq!(aggregator.lifetime_completed_count("user").await?, 8);

        let history = aggregator.history("user").await?;
        assert_eq!(
            history.iter().map(|v| v.date).collect::<Vec<_>>(),
            vec![day(1), day(2)]
        );
        assert_eq!(history[1].summary.percentage().rounded(), 63);
        Ok(())
    }
}
