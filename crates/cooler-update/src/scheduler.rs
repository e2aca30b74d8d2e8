//! Startup and periodic reconciliation scheduling

use chrono::{DateTime, Utc};
use cooler_core::types::{ManagedComponent, RuntimeConfig};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::poller::VisibilityPoller;
use crate::reconciler::{OutcomeReason, ReconciliationOutcome, VersionReconciler};

/// Aggregated result of the startup pass
#[derive(Debug, Clone, Serialize)]
pub struct StartupReport {
    pub outcomes: Vec<ReconciliationOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl StartupReport {
    /// Any component was updated, so the host should be restarted
    pub fn restart_required(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.reason == OutcomeReason::Updated)
    }

    /// Outcomes that ended in a failure
    pub fn failures(&self) -> impl Iterator<Item = &ReconciliationOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    pub fn outcome(&self, component_id: &str) -> Option<&ReconciliationOutcome> {
        self.outcomes.iter().find(|o| o.component_id == component_id)
    }
}

/// Runs the startup pass and the periodic background loop
pub struct ReconciliationScheduler {
    reconciler: Arc<VersionReconciler>,
    components: Vec<ManagedComponent>,
    poller: VisibilityPoller,
    /// `None` disables the background loop
    period: Option<Duration>,
}

impl ReconciliationScheduler {
    pub fn new(
        reconciler: Arc<VersionReconciler>,
        components: Vec<ManagedComponent>,
        poller: VisibilityPoller,
        period: Option<Duration>,
    ) -> Self {
        Self {
            reconciler,
            components,
            poller,
            period,
        }
    }

    /// Build a scheduler for every component in `config`
    pub fn from_config(
        config: &RuntimeConfig,
        reconciler: Arc<VersionReconciler>,
    ) -> cooler_core::Result<Self> {
        let period = (!config.schedule.disabled).then(|| config.schedule.interval());
        Ok(Self::new(
            reconciler,
            config.managed_components()?,
            VisibilityPoller::from_config(&config.polling),
            period,
        ))
    }

    pub fn components(&self) -> &[ManagedComponent] {
        &self.components
    }

    pub fn reconciler(&self) -> &Arc<VersionReconciler> {
        &self.reconciler
    }

    /// Reconcile every component once, in configuration order.
    ///
    /// A component's on-ready actions run right after its own pass, before
    /// the next component is reconciled.
    pub async fn run_startup(&self) -> StartupReport {
        let started_at = Utc::now();
        info!("Startup reconciliation of {} components", self.components.len());

        let mut outcomes = Vec::with_capacity(self.components.len());
        for component in &self.components {
            let outcome = self.reconciler.reconcile(component).await;
            info!("{}: {}", outcome.component_id, outcome.reason);
            self.run_on_ready(component).await;
            outcomes.push(outcome);
        }

        let report = StartupReport {
            outcomes,
            started_at,
            finished_at: Utc::now(),
        };
        if report.restart_required() {
            info!("Components were updated, a host restart is required");
        }
        report
    }

    /// Run a component's on-ready actions once it is visible
    pub async fn run_on_ready(&self, component: &ManagedComponent) {
        if component.on_ready().is_empty() {
            return;
        }

        let host = self.reconciler.host();
        if !self
            .poller
            .await_visible(host.as_ref(), component.id(), component.primary_timeout())
            .await
        {
            warn!(
                "{} not present, skipping {} on-ready actions",
                component.id(),
                component.on_ready().len()
            );
            return;
        }

        for action in component.on_ready() {
            debug!("{} on-ready: {}", component.id(), action);
            if let Err(e) = host.execute_builtin(action).await {
                warn!("On-ready action '{}' for {} failed: {:#}", action, component.id(), e);
            }
        }
    }

    /// Spawn the background loop on the runtime
    pub fn spawn_background(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run_background(shutdown).await })
    }

    /// Re-reconcile background components every period until shutdown.
    ///
    /// The first pass happens one full period after the call. Shutdown is
    /// observed between passes; a pass in progress always completes.
    pub async fn run_background(&self, mut shutdown: watch::Receiver<bool>) {
        let Some(period) = self.period.filter(|p| !p.is_zero()) else {
            info!("Background reconciliation disabled");
            return;
        };

        let components: Vec<&ManagedComponent> =
            self.components.iter().filter(|c| c.is_background()).collect();
        if components.is_empty() {
            debug!("No background components, loop not started");
            return;
        }

        info!(
            "Background reconciliation of {} components every {:?}",
            components.len(),
            period
        );
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    for component in &components {
                        if *shutdown.borrow() {
                            break;
                        }
                        let outcome = self.reconciler.reconcile(component).await;
                        info!("Background {}: {}", outcome.component_id, outcome.reason);
                    }
                }
            }
        }

        info!("Background reconciliation stopped");
    }
}
