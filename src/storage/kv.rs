use std::{future::Future, io::ErrorKind, ops::Deref, path::PathBuf};

use anyhow::{bail, Result};
use tokio::{fs, sync::RwLock};
use tracing::debug;

use crate::fs::operations::{read_locked, remove_locked, replace_locked, update_locked};

/// Interface for abstracting the key-value storage every dasho entity lives in.
/// Values are opaque strings, callers decide how to (de)serialize them.
pub trait KeyValueStore: Send + Sync {
    /// Retrieves value stored under `key`, `None` if nothing was stored.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Replaces the value under `key` with `f` applied to the current one. No other write to
    /// the store can happen in between. If `f` fails the value is left as it was.
    fn update<F>(&self, key: &str, f: F) -> impl Future<Output = Result<()>> + Send
    where
        F: FnOnce(Option<String>) -> Result<String> + Send;

    /// Lists every stored key starting with `prefix`.
    fn keys_with_prefix(&self, prefix: &str) -> impl Future<Output = Result<Vec<String>>> + Send;
}

impl<T: Deref + Send + Sync> KeyValueStore for T
where
    T::Target: KeyValueStore,
{
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send {
        self.deref().get(key)
    }

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send {
        self.deref().set(key, value)
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send {
        self.deref().remove(key)
    }

    fn update<F>(&self, key: &str, f: F) -> impl Future<Output = Result<()>> + Send
    where
        F: FnOnce(Option<String>) -> Result<String> + Send,
    {
        self.deref().update(key, f)
    }

    fn keys_with_prefix(&self, prefix: &str) -> impl Future<Output = Result<Vec<String>>> + Send {
        self.deref().keys_with_prefix(prefix)
    }
}

const VALUE_EXTENSION: &str = "json";
const LOCK_FILE: &str = ".lock";

/// The main realization of [KeyValueStore]. Each key is a `{key}.json` file in `store_dir`.
/// Writes and reads are serialized through an advisory lock on `{store_dir}/.lock` so that
/// several dasho processes can share a directory. Within one process access is additionally
/// ordered by `access`, since the advisory lock is taken on the runtime thread and two
/// holders in the same process would wait on each other forever.
pub struct FileStore {
    store_dir: PathBuf,
    lock_path: PathBuf,
    access: RwLock<()>,
}

impl FileStore {
    pub fn new(store_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&store_dir)?;
        let lock_path = store_dir.join(LOCK_FILE);

        Ok(Self {
            store_dir,
            lock_path,
            access: RwLock::new(()),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.store_dir.join(format!("{key}.{VALUE_EXTENSION}")))
    }
}

/// Keys become file names, so only a conservative character set is accepted.
fn validate_key(key: &str) -> Result<()> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
    if key.is_empty() || key.starts_with('.') || !key.chars().all(allowed) {
        bail!("Key {key:?} can't be used as a storage key");
    }
    Ok(())
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        let _access = self.access.read().await;
        debug!("Reading {path:?}");
        Ok(read_locked(&path, &self.lock_path).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let _access = self.access.write().await;
        debug!("Writing {path:?}");
        replace_locked(&path, &self.lock_path, value.as_bytes()).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let _access = self.access.write().await;
        debug!("Removing {path:?}");
        remove_locked(&path, &self.lock_path).await?;
        Ok(())
    }

    async fn update<F>(&self, key: &str, f: F) -> Result<()>
    where
        F: FnOnce(Option<String>) -> Result<String> + Send,
    {
        let path = self.path_for(key)?;
        let _access = self.access.write().await;
        debug!("Updating {path:?}");
        update_locked(&path, &self.lock_path, f).await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.store_dir).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => Err(e)?,
        };

        let mut keys = vec![];
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|v| v.to_str()) != Some(VALUE_EXTENSION) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|v| v.to_str()) else {
                continue;
            };
            if key.starts_with(prefix) {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}
