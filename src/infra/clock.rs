use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

use crate::core::remote::Clock;

/// Wall-clock time and `tokio` timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn timestamp_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
