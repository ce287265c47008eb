use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::MakeWriterExt},
    EnvFilter,
};

pub const CLI_PREFIX: &str = "cli";

const MAX_LOG_FILES: usize = 5;
const DEFAULT_LEVEL: &str = "info";

/// Where dasho writes its logs and how much of them.
#[derive(Debug, Clone)]
pub struct LogSettings<'a> {
    /// File name prefix of the rolling log files.
    pub prefix: &'a str,
    pub logs_dir: &'a Path,
    /// Overrides both `RUST_LOG` and the default level.
    pub level: Option<LevelFilter>,
    /// Mirror logs to stderr. Stdout is left to command output.
    pub console: bool,
}

impl LogSettings<'_> {
    /// Filter directive limited to dasho's own targets. A `RUST_LOG` that already names
    /// targets is used as is.
    fn directive(&self, rust_log: Option<&str>) -> String {
        let crate_target = env!("CARGO_PKG_NAME").replace('-', "_");
        match (self.level, rust_log.map(str::trim)) {
            (Some(level), _) => format!("{crate_target}={}", level.to_string().to_lowercase()),
            (None, Some(value)) if value.contains('=') => value.to_string(),
            (None, Some(value)) if !value.is_empty() => format!("{crate_target}={value}"),
            _ => format!("{crate_target}={DEFAULT_LEVEL}"),
        }
    }
}

pub fn enable_logging(settings: &LogSettings) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(settings.prefix)
        .build(settings.logs_dir)?;

    let console = settings.console;
    let stderr = std::io::stderr.with_filter(move |_| console);

    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = EnvFilter::try_new(settings.directive(rust_log.as_deref()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stderr.and(appender))
        .pretty()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Logging is already set up: {e}"))?;
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .try_init();
});
