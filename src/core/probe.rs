//! # LiveProbe: bounded, best-effort liveness checks.
//!
//! ```text
//! is_active(id)
//!   ├─► acquire global permit (semaphore, `probe_concurrency`)
//!   ├─► timeout(probe_timeout, client.probe_is_active(id))
//!   │       ├─ Ok(Ok(live)) → live
//!   │       ├─ Ok(Err(e))   → false (ProbeError)
//!   │       └─ Err(elapsed) → false (probe future dropped)
//!   └─► permit released on every path (guard drop)
//! ```
//!
//! A failed probe is indistinguishable from "not live". The scan loop stays
//! available even when the platform misbehaves; a creator that is really
//! live is picked up on a later pass.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time;

use crate::client::LiveClient;
use crate::error::ProbeError;

/// Liveness check shared by the scheduler and every supervisor.
#[derive(Clone)]
pub struct LiveProbe {
    client: Arc<dyn LiveClient>,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl LiveProbe {
    /// Creates a probe allowing at most `concurrency` checks in flight (minimum 1).
    pub fn new(client: Arc<dyn LiveClient>, concurrency: usize, timeout: Duration) -> Self {
        Self {
            client,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            timeout,
        }
    }

    /// Returns whether `creator` is live; any failure reads as `false`.
    pub async fn is_active(&self, creator: &str) -> bool {
        match self.check(creator).await {
            Ok(live) => live,
            Err(e) => {
                tracing::debug!(creator, error = %e, label = e.as_label(), "probe failed; treating as offline");
                false
            }
        }
    }

    /// Runs one bounded probe, keeping the failure cause.
    pub async fn check(&self, creator: &str) -> Result<bool, ProbeError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ProbeError::Transport {
                error: "probe semaphore closed".to_string(),
            })?;

        match time::timeout(
            self.timeout,
            self.client.probe_is_active(creator, self.timeout),
        )
        .await
        {
            Ok(res) => res,
            Err(_elapsed) => Err(ProbeError::Timeout {
                timeout: self.timeout,
            }),
        }
    }

    /// Permits currently free.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedClient;

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn errors_and_timeouts_read_as_offline() {
        let client = Arc::new(ScriptedClient::new());
        client.set_live("live", true);
        client.fail_probe("broken");
        client.hang_probe("slow");
        let probe = LiveProbe::new(client.clone(), 2, Duration::from_secs(5));

        assert!(probe.is_active("live").await);
        assert!(!probe.is_active("broken").await);
        assert!(!probe.is_active("slow").await);
        assert!(!probe.is_active("unknown").await);
        assert!(matches!(
            probe.check("slow").await,
            Err(ProbeError::Timeout { .. })
        ));
        assert_eq!(probe.available_permits(), 2);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn concurrency_is_bounded() {
        let client = Arc::new(ScriptedClient::new());
        client.hang_probe("slow");
        let probe = LiveProbe::new(client.clone(), 3, Duration::from_secs(5));

        let mut set = tokio::task::JoinSet::new();
        for _ in 0..10 {
            let p = probe.clone();
            set.spawn(async move { p.is_active("slow").await });
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(client.probes_in_flight_max(), 3);

        while set.join_next().await.is_some() {}
        assert_eq!(probe.available_permits(), 3);
    }
}
