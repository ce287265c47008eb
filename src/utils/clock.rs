use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Represents an entity responsible for providing dates across application. Stores and the
/// session holder receive it explicitly so tests can pin "today" and skip simulated latency.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    async fn sleep(&self, duration: Duration);
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Calendar day the clock is currently in. Days are UTC days, matching the stored record keys.
pub fn today(clock: &dyn Clock) -> NaiveDate {
    clock.time().date_naive()
}
