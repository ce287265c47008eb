use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LogError;

use super::{
    aggregate::DailySummary,
    template::{ActivityTemplate, Category, DEFAULT_ACTIVITIES},
};

/// State of one activity on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub notes: String,
}

impl From<&ActivityTemplate> for ActivityLogEntry {
    fn from(template: &ActivityTemplate) -> Self {
        ActivityLogEntry {
            id: template.id.to_string(),
            name: template.name.to_string(),
            category: template.category,
            completed: false,
            value: template.default_value,
            unit: template.unit.map(str::to_string),
            notes: String::new(),
        }
    }
}

/// The struct stored for every saved day. Once saved the entries are kept verbatim, later
/// template changes don't touch them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecord {
    pub user_id: String,
    pub date: NaiveDate,
    pub activities: Vec<ActivityLogEntry>,
    pub saved_at: DateTime<Utc>,
}

impl DailyRecord {
    pub fn summary(&self) -> DailySummary {
        DailySummary::of(&self.activities)
    }
}

/// Entries of [DEFAULT_ACTIVITIES] in their initial state.
pub fn fresh_activities() -> Vec<ActivityLogEntry> {
    DEFAULT_ACTIVITIES.iter().map(ActivityLogEntry::from).collect()
}

/// One day's activities as being edited. Edits stay in memory until the log is handed to
/// [DailyLogStore::save](super::store::DailyLogStore::save).
#[derive(Debug, Clone, PartialEq)]
pub struct DailyLog {
    date: NaiveDate,
    saved_at: Option<DateTime<Utc>>,
    activities: Vec<ActivityLogEntry>,
}

impl DailyLog {
    pub fn fresh(date: NaiveDate) -> Self {
        Self {
            date,
            saved_at: None,
            activities: fresh_activities(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// When this day was last saved, `None` if it never was.
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.saved_at
    }

    pub fn activities(&self) -> &[ActivityLogEntry] {
        &self.activities
    }

    pub fn summary(&self) -> DailySummary {
        DailySummary::of(&self.activities)
    }

    fn entry_mut(&mut self, id: &str) -> Result<&mut ActivityLogEntry, LogError> {
        self.activities
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| LogError::UnknownActivity(id.to_string()))
    }

    /// Flips completion of an activity and returns the new state.
    pub fn toggle(&mut self, id: &str) -> Result<bool, LogError> {
        let entry = self.entry_mut(id)?;
        entry.completed = !entry.completed;
        Ok(entry.completed)
    }

    /// Only finite values are accepted, JSON has no representation for the others.
    pub fn set_value(&mut self, id: &str, value: f64) -> Result<(), LogError> {
        let entry = self.entry_mut(id)?;
        if !value.is_finite() {
            return Err(LogError::NonFiniteValue {
                id: id.to_string(),
                value,
            });
        }
        entry.value = Some(value);
        Ok(())
    }

    pub fn set_notes(&mut self, id: &str, notes: impl Into<String>) -> Result<(), LogError> {
        self.entry_mut(id)?.notes = notes.into();
        Ok(())
    }
}

impl From<DailyRecord> for DailyLog {
    fn from(record: DailyRecord) -> Self {
        Self {
            date: record.date,
            saved_at: Some(record.saved_at),
            activities: record.activities,
        }
    }
}
