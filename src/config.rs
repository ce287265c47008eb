use std::{path::PathBuf, time::Duration};

use anyhow::{anyhow, bail, Context, Result};

use crate::utils::dir::{create_application_default_path, ensure_dir};

pub const AUTH_LATENCY_ENV: &str = "DASHO_AUTH_LATENCY_MS";
pub const HASH_COST_ENV: &str = "DASHO_HASH_COST";

/// Delay applied to every sign in and sign up.
pub const DEFAULT_AUTH_LATENCY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthSettings {
    pub latency: Duration,
    /// bcrypt cost used for new password hashes.
    pub hash_cost: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            latency: DEFAULT_AUTH_LATENCY,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub auth: AuthSettings,
}

impl Config {
    /// Builds the configuration from the process environment. `dir` overrides the default
    /// application directory.
    pub fn resolve(dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match dir {
            Some(dir) => ensure_dir(dir)?,
            None => create_application_default_path()?,
        };
        Self::from_lookup(data_dir, |name| std::env::var(name).ok())
    }

    pub fn from_lookup(data_dir: PathBuf, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut auth = AuthSettings::default();

        if let Some(value) = lookup(AUTH_LATENCY_ENV) {
            let millis = value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{AUTH_LATENCY_ENV} should be milliseconds, got {value:?}"))?;
            auth.latency = Duration::from_millis(millis);
        }

        if let Some(value) = lookup(HASH_COST_ENV) {
            let cost = value
                .trim()
                .parse::<u32>()
                .map_err(|e| anyhow!("{HASH_COST_ENV} should be a number, got {value:?}: {e}"))?;
            if !(4..=31).contains(&cost) {
                bail!("{HASH_COST_ENV} should be between 4 and 31, got {cost}");
            }
            auth.hash_cost = cost;
        }

        Ok(Self { data_dir, auth })
    }

    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join("store")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}
