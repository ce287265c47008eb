use std::{io::ErrorKind, path::Path};

use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::{self, File},
    io::{self, AsyncWriteExt},
};
use tracing::trace;

async fn open_lock(lock_path: &Path) -> Result<File, io::Error> {
    File::options()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .await
}

/// Reads the whole file under a shared lock. A missing file is not an error.
pub async fn read_locked(path: &Path, lock_path: &Path) -> Result<Option<String>, io::Error> {
    let lock = open_lock(lock_path).await?;
    lock.lock_shared()?;
    let result = match fs::read_to_string(path).await {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    };
    lock.unlock_async().await?;
    result
}

/// Replaces file contents under an exclusive lock. Data goes into a sibling temporary file
/// first and is renamed over the target, so readers see either the old or the new contents.
pub async fn replace_locked(path: &Path, lock_path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    let lock = open_lock(lock_path).await?;
    lock.lock_exclusive()?;
    let result = replace_with_file(path, contents).await;
    lock.unlock_async().await?;
    result
}

async fn replace_with_file(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    let temporary = path.with_extension("tmp");
    trace!("Writing {} bytes into {temporary:?}", contents.len());
    let mut file = File::create(&temporary).await?;
    file.write_all(contents).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(&temporary, path).await
}

/// Reads the file and replaces it with what `f` makes of the current contents, all under one
/// exclusive lock. Nothing is written if `f` fails.
pub async fn update_locked<F>(path: &Path, lock_path: &Path, f: F) -> anyhow::Result<()>
where
    F: FnOnce(Option<String>) -> anyhow::Result<String>,
{
    let lock = open_lock(lock_path).await?;
    lock.lock_exclusive()?;
    let result = update_with_file(path, f).await;
    lock.unlock_async().await?;
    result
}

async fn update_with_file<F>(path: &Path, f: F) -> anyhow::Result<()>
where
    F: FnOnce(Option<String>) -> anyhow::Result<String>,
{
    let current = match fs::read_to_string(path).await {
        Ok(v) => Some(v),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };
    let contents = f(current)?;
    replace_with_file(path, contents.as_bytes()).await?;
    Ok(())
}

/// Removes a file under an exclusive lock. Removing a missing file succeeds.
pub async fn remove_locked(path: &Path, lock_path: &Path) -> Result<(), io::Error> {
    let lock = open_lock(lock_path).await?;
    lock.lock_exclusive()?;
    let result = match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    };
    lock.unlock_async().await?;
    result
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};
    use tempfile::tempdir;

    use crate::fs::operations::{read_locked, remove_locked, replace_locked, update_locked};

    #[tokio::test]
    async fn test_read_missing_file() -> Result<()> {
        let dir = tempdir()?;
        let value = read_locked(&dir.path().join("missing.json"), &dir.path().join(".lock")).await?;
        assert_eq!(value, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_replace_overwrites() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("value.json");
        let lock = dir.path().join(".lock");

        replace_locked(&path, &lock, b"first version that is longer").await?;
        replace_locked(&path, &lock, b"second").await?;

        assert_eq!(read_locked(&path, &lock).await?.as_deref(), Some("second"));

        let leftovers = std::fs::read_dir(dir.path())?
            .filter_map(|v| v.ok())
            .filter(|v| v.path().extension().is_some_and(|e| e == "tmp"))
            .count();
        assert_eq!(leftovers, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("value.json");
        let lock = dir.path().join(".lock");

        replace_locked(&path, &lock, b"{}").await?;
        remove_locked(&path, &lock).await?;
        remove_locked(&path, &lock).await?;

        assert_eq!(read_locked(&path, &lock).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_sees_current_contents() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("value.json");
        let lock = dir.path().join(".lock");

        update_locked(&path, &lock, |current| {
            assert_eq!(current, None);
            Ok("1".to_string())
        })
        .await?;
        update_locked(&path, &lock, |current| Ok(format!("{},2", current.unwrap_or_default()))).await?;
        assert_eq!(read_locked(&path, &lock).await?.as_deref(), Some("1,2"));

        let failed = update_locked(&path, &lock, |_| Err(anyhow!("rejected"))).await;
        assert!(failed.is_err());
        assert_eq!(read_locked(&path, &lock).await?.as_deref(), Some("1,2"));
        Ok(())
    }
}
