//! Bounded visibility polling

use cooler_core::types::{PollingConfig, VersionMatch};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::host::HostPlatform;
use crate::version::versions_match;

/// What the host must report before an install counts as visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityTarget<'a> {
    /// Registered at any version; only meaningful for a fresh install
    Present,

    /// Registered at a version matching `tag` under `policy`
    Version { tag: &'a str, policy: VersionMatch },
}

impl VisibilityTarget<'_> {
    async fn is_met(&self, host: &dyn HostPlatform, component_id: &str) -> bool {
        match *self {
            VisibilityTarget::Present => host.is_component_present(component_id).await,
            VisibilityTarget::Version { tag, policy } => host
                .installed_version(component_id)
                .await
                .is_some_and(|v| versions_match(policy, &v, tag)),
        }
    }
}

/// Repeatedly asks the host whether a component is registered
#[derive(Debug, Clone, Copy)]
pub struct VisibilityPoller {
    interval: Duration,
}

impl VisibilityPoller {
    /// Create a poller with a fixed query interval
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Create a poller from configuration
    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(config.interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until `component_id` is present or `timeout` elapses
    pub async fn await_visible(
        &self,
        host: &dyn HostPlatform,
        component_id: &str,
        timeout: Duration,
    ) -> bool {
        self.await_target(host, component_id, VisibilityTarget::Present, timeout)
            .await
    }

    /// Wait until the host reports `component_id` as `target` or `timeout`
    /// elapses.
    ///
    /// Returns `true` as soon as a query succeeds. The interval is constant;
    /// the last sleep is shortened so the deadline is never overshot by more
    /// than one query.
    pub async fn await_target(
        &self,
        host: &dyn HostPlatform,
        component_id: &str,
        target: VisibilityTarget<'_>,
        timeout: Duration,
    ) -> bool {
        let started = Instant::now();
        let deadline = started + timeout;
        let mut queries = 0u32;

        loop {
            queries += 1;
            if target.is_met(host, component_id).await {
                debug!(
                    "{} visible after {:?} ({} queries)",
                    component_id,
                    started.elapsed(),
                    queries
                );
                return true;
            }

            let now = Instant::now();
            if now >= deadline {
                debug!(
                    "{} not visible within {:?} ({} queries)",
                    component_id, timeout, queries
                );
                return false;
            }

            sleep(self.interval.min(deadline - now)).await;
        }
    }
}

impl Default for VisibilityPoller {
    fn default() -> Self {
        Self::from_config(&PollingConfig::default())
    }
}
