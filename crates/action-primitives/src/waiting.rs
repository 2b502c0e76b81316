//! Built-in waiting mechanisms for page operations

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::errors::ActionError;
use crate::port::BrowserPort;
use crate::types::WaitTier;

/// Default waiting configuration for the load tiers
#[derive(Debug, Clone)]
pub struct DefaultWaitStrategy {
    /// Timeout for DomReady tier (milliseconds)
    pub domready_timeout_ms: u64,

    /// Timeout for Idle tier (milliseconds)
    pub idle_timeout_ms: u64,

    /// Quiet window without new resource loads (milliseconds)
    pub network_quiet_ms: u64,

    /// Interval between readiness probes (milliseconds)
    pub poll_interval_ms: u64,
}

impl Default for DefaultWaitStrategy {
    fn default() -> Self {
        Self {
            domready_timeout_ms: 30_000,
            idle_timeout_ms: 30_000,
            network_quiet_ms: 500,
            poll_interval_ms: 100,
        }
    }
}

impl DefaultWaitStrategy {
    pub fn timeout_for(&self, tier: WaitTier) -> Duration {
        match tier {
            WaitTier::None => Duration::ZERO,
            WaitTier::DomReady => Duration::from_millis(self.domready_timeout_ms),
            WaitTier::Idle => Duration::from_millis(self.idle_timeout_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Wait for `tier` on `port` with this strategy's timeout for the tier.
    pub async fn wait(&self, port: &dyn BrowserPort, tier: WaitTier) -> Result<(), ActionError> {
        if tier == WaitTier::None {
            debug!("WaitTier::None - no waiting");
            return Ok(());
        }
        port.wait_for_load(tier, self.timeout_for(tier)).await
    }
}

/// Polls `check` every `interval` until it reports `true` or `timeout` elapses.
///
/// Returns `Ok(false)` on timeout. Errors from `check` abort the wait.
pub async fn poll_until<F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> Result<bool, ActionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, ActionError>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if check().await? {
            return Ok(true);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}
