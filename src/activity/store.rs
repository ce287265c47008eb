use std::{collections::BTreeSet, sync::Arc};

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::{
    storage::{activities_key, activities_prefix, dates_key, kv::KeyValueStore, read_or_none},
    utils::{clock::Clock, time::parse_date_key},
};

use super::log::{ActivityLogEntry, DailyLog, DailyRecord};

/// Persists [DailyRecord]s, one per user and date, and keeps a per user index of the dates
/// that have one so summaries don't need to walk the whole store.
pub struct DailyLogStore<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: KeyValueStore> DailyLogStore<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Retrieves the saved record of a day. Corrupted records count as missing.
    pub async fn read_record(&self, user_id: &str, date: NaiveDate) -> Result<Option<DailyRecord>> {
        read_or_none(&self.store, &activities_key(user_id, date)).await
    }

    /// Saved state of a day, or the template state if the day was never saved.
    pub async fn load(&self, user_id: &str, date: NaiveDate) -> Result<DailyLog> {
        Ok(match self.read_record(user_id, date).await? {
            Some(record) => record.into(),
            None => {
                debug!("No usable record for {user_id} on {date}, starting from template");
                DailyLog::fresh(date)
            }
        })
    }

    /// Overwrites whatever was saved for the day. There is no merge, the last save wins.
    #[instrument(skip(self, activities))]
    pub async fn save(
        &self,
        user_id: &str,
        date: NaiveDate,
        activities: &[ActivityLogEntry],
    ) -> Result<DailyRecord> {
        let record = DailyRecord {
            user_id: user_id.to_string(),
            date,
            activities: activities.to_vec(),
            saved_at: self.clock.time(),
        };
        let payload = serde_json::to_string(&record)?;
        // Readers skip indexed dates without a record, so the index is written first.
        self.index_date(user_id, date).await?;
        self.store.set(&activities_key(user_id, date), &payload).await?;

        info!(
            "Saved {date} for {user_id} with {}/{} completed",
            record.summary().completed,
            record.summary().total
        );
        Ok(record)
    }

    /// Dates the user has saved records for, ascending. A missing or corrupted index is
    /// rebuilt from the stored keys.
    pub async fn recorded_dates(&self, user_id: &str) -> Result<BTreeSet<NaiveDate>> {
        if let Some(dates) = read_or_none(&self.store, &dates_key(user_id)).await? {
            return Ok(dates);
        }

        let dates = self.scan_dates(user_id).await?;
        if !dates.is_empty() {
            info!("Rebuilt date index of {user_id} with {} dates", dates.len());
            self.merge_dates(user_id, dates.clone()).await?;
        }
        Ok(dates)
    }

    /// Throws the index away and rebuilds it from the stored keys.
    pub async fn reindex(&self, user_id: &str) -> Result<BTreeSet<NaiveDate>> {
        let dates = self.scan_dates(user_id).await?;
        self.persist_dates(user_id, &dates).await?;
        Ok(dates)
    }

    async fn scan_dates(&self, user_id: &str) -> Result<BTreeSet<NaiveDate>> {
        let prefix = activities_prefix(user_id);
        let keys = self.store.keys_with_prefix(&prefix).await?;
        // Keys of a user whose id extends this one share the prefix but don't end in a date.
        Ok(keys
            .iter()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter_map(parse_date_key)
            .collect())
    }

    async fn index_date(&self, user_id: &str, date: NaiveDate) -> Result<()> {
        let index = read_or_none::<BTreeSet<NaiveDate>>(&self.store, &dates_key(user_id)).await?;
        let mut dates = match index {
            Some(_) => BTreeSet::new(),
            None => self.scan_dates(user_id).await?,
        };
        dates.insert(date);
        self.merge_dates(user_id, dates).await
    }

    /// Adds `dates` to the stored index in a single store update, keeping whatever another
    /// writer listed in the meantime.
    async fn merge_dates(&self, user_id: &str, dates: BTreeSet<NaiveDate>) -> Result<()> {
        self.store
            .update(&dates_key(user_id), |current| {
                let mut merged = current
                    .and_then(|raw| serde_json::from_str::<BTreeSet<NaiveDate>>(&raw).ok())
                    .unwrap_or_default();
                merged.extend(dates);
                Ok(serde_json::to_string(&merged)?)
            })
            .await
    }

    async fn persist_dates(&self, user_id: &str, dates: &BTreeSet<NaiveDate>) -> Result<()> {
        let payload = serde_json::to_string(dates)?;
        self.store.set(&dates_key(user_id), &payload).await
    }
}
