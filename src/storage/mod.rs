//! Storage is organized as a flat string key-value store, see [kv::KeyValueStore].
//!  - Every value is a JSON document.
//!  - [kv::FileStore] keeps one file per key in a single directory.
//!  - [memory::MemoryStore] keeps everything in memory and is used by tests.
//!
//! Keys used by dasho:
//!  - `dasho-users` holds all credential records.
//!  - `dasho-user` holds the signed in user.
//!  - `dasho-activities-{user id}-{YYYY-MM-DD}` holds a daily record.
//!  - `dasho-dates-{user id}` holds the dates a user has records for.

pub mod kv;
pub mod memory;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::{error::StorageParseError, utils::time::date_key};

use self::kv::KeyValueStore;

pub const USERS_KEY: &str = "dasho-users";
pub const SESSION_KEY: &str = "dasho-user";

const ACTIVITIES_PREFIX: &str = "dasho-activities-";
const DATES_PREFIX: &str = "dasho-dates-";

/// Every key holding a daily record of `user_id` starts with this.
pub fn activities_prefix(user_id: &str) -> String {
    format!("{ACTIVITIES_PREFIX}{user_id}-")
}

pub fn activities_key(user_id: &str, date: NaiveDate) -> String {
    format!("{}{}", activities_prefix(user_id), date_key(date))
}

pub fn dates_key(user_id: &str) -> String {
    format!("{DATES_PREFIX}{user_id}")
}

/// Parses a JSON document stored under `key`.
pub fn parse_value<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, StorageParseError> {
    serde_json::from_str(raw).map_err(|source| StorageParseError {
        key: key.to_string(),
        source,
    })
}

/// Reads and parses the value under `key`. Both a missing value and a value that fails to
/// parse come back as `None`; the latter is logged.
pub async fn read_or_none<T: DeserializeOwned>(
    store: &impl KeyValueStore,
    key: &str,
) -> anyhow::Result<Option<T>> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    match parse_value(key, &raw) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            warn!("{e}");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{activities_key, activities_prefix, dates_key};

    #[test]
    fn test_key_layout() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(activities_key("abc", date), "dasho-activities-abc-2025-03-15");
        assert!(activities_key("abc", date).starts_with(&activities_prefix("abc")));
        assert_eq!(dates_key("abc"), "dasho-dates-abc");
    }
}
