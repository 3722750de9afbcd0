//! Background job scheduler
//!
//! Registers the hourly weather sync and the alert expiry sweep on a
//! [`JobScheduler`], plus an optional fixed-delay diagnostic sync loop.

use std::sync::Arc;
use std::time::Duration;

use shared::SyncTrigger;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::config::SchedulerConfig;
use crate::services::SyncService;

/// Running background jobs; dropping this stops nothing, call [`Self::shutdown`]
pub struct BackgroundJobs {
    scheduler: JobScheduler,
    diagnostic: Option<JoinHandle<()>>,
}

impl BackgroundJobs {
    pub async fn shutdown(mut self) -> Result<(), JobSchedulerError> {
        if let Some(handle) = self.diagnostic.take() {
            handle.abort();
        }
        self.scheduler.shutdown().await
    }
}

/// Build and start every configured background job
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if a cron expression is invalid or the
/// scheduler fails to start.
pub async fn start_background_jobs(
    sync: Arc<SyncService>,
    config: &SchedulerConfig,
) -> Result<BackgroundJobs, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_hourly_sync_job(&scheduler, Arc::clone(&sync), &config.hourly_cron).await?;

    if config.expiry_sweep_enabled {
        register_expiry_sweep_job(&scheduler, Arc::clone(&sync), &config.expiry_sweep_cron).await?;
    }

    scheduler.start().await?;

    let diagnostic = config.diagnostic_enabled.then(|| {
        spawn_diagnostic_sync(
            sync,
            Duration::from_secs(config.diagnostic_initial_delay_secs),
            Duration::from_secs(config.diagnostic_period_secs),
        )
    });

    Ok(BackgroundJobs {
        scheduler,
        diagnostic,
    })
}

/// Register the regular sync, at minute 0 of every hour by default
async fn register_hourly_sync_job(
    scheduler: &JobScheduler,
    sync: Arc<SyncService>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let sync = Arc::clone(&sync);

        Box::pin(async move {
            tracing::info!("scheduler: starting hourly weather sync");
            sync.run_sync_pass(SyncTrigger::Hourly).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: registered hourly weather sync job");
    Ok(())
}

async fn register_expiry_sweep_job(
    scheduler: &JobScheduler,
    sync: Arc<SyncService>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let sync = Arc::clone(&sync);

        Box::pin(async move {
            if let Err(e) = sync.expire_stale_alerts().await {
                tracing::error!(error = %e, "scheduler: alert expiry sweep failed");
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: registered alert expiry sweep job");
    Ok(())
}

/// Fixed-delay loop: the next run starts `period` after the previous one ends
fn spawn_diagnostic_sync(
    sync: Arc<SyncService>,
    initial_delay: Duration,
    period: Duration,
) -> JoinHandle<()> {
    tracing::info!(
        initial_delay_secs = initial_delay.as_secs(),
        period_secs = period.as_secs(),
        "scheduler: diagnostic weather sync enabled"
    );

    tokio::spawn(async move {
        tokio::time::sleep(initial_delay).await;
        loop {
            tracing::debug!("scheduler: starting diagnostic weather sync");
            sync.run_sync_pass(SyncTrigger::Diagnostic).await;
            tokio::time::sleep(period).await;
        }
    })
}
