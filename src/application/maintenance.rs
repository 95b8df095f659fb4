//! MaintenanceWorker - Background loop for retries, sweeps and expiry.
//!
//! Each tick runs, in order:
//! 1. Deferred task retries
//! 2. The unactivated entitlement sweep
//! 3. Stale pending expiry, when configured
//!
//! A failing pass is logged and the loop keeps going. On shutdown the
//! worker finishes the current tick and exits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use super::handlers::{
    ExpireStalePaymentsHandler, RetryDeferredTasksHandler, RetrySummary, SweepSummary,
    SweepUnactivatedHandler,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub retries: RetrySummary,
    pub sweep: SweepSummary,
    pub expired: usize,
}

pub struct MaintenanceWorker {
    retry: RetryDeferredTasksHandler,
    sweep: SweepUnactivatedHandler,
    expire: Option<ExpireStalePaymentsHandler>,
    poll_interval: Duration,
}

impl MaintenanceWorker {
    pub fn new(
        retry: RetryDeferredTasksHandler,
        sweep: SweepUnactivatedHandler,
        poll_interval: Duration,
    ) -> Self {
        Self {
            retry,
            sweep,
            expire: None,
            poll_interval,
        }
    }

    /// Also cancel abandoned pending intents on every tick.
    pub fn with_expiry(mut self, expire: ExpireStalePaymentsHandler) -> Self {
        self.expire = Some(expire);
        self
    }

    /// Run until the shutdown channel flips to `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        tracing::info!(poll_interval = ?self.poll_interval, "Maintenance worker started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Maintenance worker stopping");
                        return;
                    }
                }
                _ = interval.tick() => {
                    self.run_once().await;
                }
            }
        }
    }

    /// One full maintenance pass.
    pub async fn run_once(&self) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        match self.retry.handle().await {
            Ok(summary) => report.retries = summary,
            Err(e) => tracing::error!(error = %e, "Deferred task retry pass failed"),
        }

        match self.sweep.handle().await {
            Ok(summary) => report.sweep = summary,
            Err(e) => tracing::error!(error = %e, "Entitlement sweep failed"),
        }

        if let Some(expire) = &self.expire {
            match expire.handle().await {
                Ok(count) => report.expired = count,
                Err(e) => tracing::error!(error = %e, "Stale payment expiry failed"),
            }
        }

        if report != MaintenanceReport::default() {
            tracing::debug!(
                retried = report.retries.claimed,
                retry_succeeded = report.retries.succeeded,
                swept = report.sweep.granted,
                expired = report.expired,
                "Maintenance pass finished"
            );
        }

        report
    }
}
