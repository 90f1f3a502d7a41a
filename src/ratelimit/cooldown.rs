use crate::ratelimit::clock::{Clock, TokioClock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Single global gate in front of every outbound call to a news or social
/// service. Consecutive grants are at least `cooldown` apart, so the combined
/// call rate of all fetchers sharing one limiter stays under `1 / cooldown`.
///
/// Callers are served in lock order, not queued fairly.
pub struct CooldownLimiter {
    cooldown: Duration,
    clock: Arc<dyn Clock>,
    last_grant: Mutex<Option<Instant>>,
}

impl CooldownLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self::with_clock(cooldown, Arc::new(TokioClock))
    }

    pub fn with_clock(cooldown: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            cooldown,
            clock,
            last_grant: Mutex::new(None),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Waits until `cooldown` has passed since the previous grant, then records
    /// this one. The lock is held while waiting so concurrent callers serialize.
    pub async fn await_slot(&self) {
        let mut last = self.last_grant.lock().await;

        if let Some(prev) = *last {
            let elapsed = self.clock.now().saturating_duration_since(prev);
            if elapsed < self.cooldown {
                let wait = self.cooldown - elapsed;
                debug!(?wait, "Rate limit cooldown");
                self.clock.sleep(wait).await;
            }
        }

        *last = Some(self.clock.now());
    }
}
