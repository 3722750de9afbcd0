//! Weather and alert synchronization across all configured locations
//!
//! One pass walks every enabled location, stores a fresh snapshot for each
//! successful current-conditions fetch and stores every provider alert that is
//! not already active. Failures are logged and never leave the pass; a
//! location that fails contributes nothing and the pass moves on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use shared::{
    provider_now, validate_alert_target, validate_current_conditions_target, Location,
    SyncSummary, SyncTrigger,
};

use crate::error::AppResult;
use crate::external::{RawAlert, WeatherProvider};
use crate::services::dedup::DeduplicationGate;
use crate::services::normalizer::AlertNormalizer;
use crate::services::store::{AlertStore, LocationStore, WeatherStore};

/// Result of asking for a sync pass
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Completed(SyncSummary),
    /// Another pass held the guard; nothing was fetched
    AlreadyRunning,
}

impl SyncOutcome {
    pub fn summary(&self) -> Option<&SyncSummary> {
        match self {
            SyncOutcome::Completed(summary) => Some(summary),
            SyncOutcome::AlreadyRunning => None,
        }
    }
}

/// Non-reentrant flag shared by every trigger of one [`SyncService`]
#[derive(Debug, Clone, Default)]
pub struct SyncGuard {
    running: Arc<AtomicBool>,
}

/// Held for the duration of a pass; releases the guard on drop
#[derive(Debug)]
pub struct SyncPermit {
    running: Arc<AtomicBool>,
}

impl SyncGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the guard, or `None` if a pass is already in progress
    pub fn try_acquire(&self) -> Option<SyncPermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SyncPermit {
                running: Arc::clone(&self.running),
            })
    }

    pub fn is_held(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for SyncPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Sync orchestrator
#[derive(Clone)]
pub struct SyncService {
    provider: Arc<dyn WeatherProvider>,
    normalizer: AlertNormalizer,
    gate: DeduplicationGate,
    locations: Arc<dyn LocationStore>,
    weather: Arc<dyn WeatherStore>,
    alerts: Arc<dyn AlertStore>,
    guard: SyncGuard,
}

impl SyncService {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        normalizer: AlertNormalizer,
        gate: DeduplicationGate,
        locations: Arc<dyn LocationStore>,
        weather: Arc<dyn WeatherStore>,
        alerts: Arc<dyn AlertStore>,
    ) -> Self {
        Self {
            provider,
            normalizer,
            gate,
            locations,
            weather,
            alerts,
            guard: SyncGuard::new(),
        }
    }

    /// Whether a pass is in progress right now
    pub fn is_running(&self) -> bool {
        self.guard.is_held()
    }

    /// Run one pass unless another is already running
    ///
    /// Every trigger (hourly, diagnostic, manual) goes through here.
    pub async fn run_sync_pass(&self, trigger: SyncTrigger) -> SyncOutcome {
        let Some(_permit) = self.guard.try_acquire() else {
            tracing::warn!(%trigger, "Weather sync already in progress, skipping");
            return SyncOutcome::AlreadyRunning;
        };

        tracing::info!(%trigger, "Weather sync pass starting");
        let mut summary = SyncSummary::begin(trigger);

        if let Err(e) = self.sync_all(&mut summary).await {
            tracing::error!(%trigger, error = %e, "Weather sync pass aborted");
        }

        let summary = summary.finish();
        tracing::info!(
            %trigger,
            locations = summary.locations_seen,
            skipped = summary.locations_skipped,
            weather_count = summary.weather_count,
            alert_count = summary.alert_count,
            duplicates = summary.duplicate_count,
            expired = summary.expired_count,
            elapsed_ms = summary.elapsed_ms(),
            "Weather sync pass complete"
        );

        SyncOutcome::Completed(summary)
    }

    /// Mark alerts past their expiry as `EXPIRED`
    pub async fn expire_stale_alerts(&self) -> AppResult<u64> {
        let expired = self.alerts.expire_stale(provider_now()).await?;
        if expired > 0 {
            tracing::info!(expired, "Expired stale weather alerts");
        }
        Ok(expired)
    }

    async fn sync_all(&self, summary: &mut SyncSummary) -> AppResult<()> {
        let locations = self.locations.find_all().await?;
        summary.locations_seen = locations.len();

        for location in &locations {
            if !location.enabled {
                summary.locations_skipped += 1;
                continue;
            }
            self.sync_location(location, summary).await;
        }

        Ok(())
    }

    async fn sync_location(&self, location: &Location, summary: &mut SyncSummary) {
        let code = location.location_code.as_str();

        match validate_current_conditions_target(location) {
            Ok(external_id) => {
                if let Some(snapshot) = self.provider.fetch_current_conditions(code, external_id).await {
                    match self.weather.save(&snapshot).await {
                        Ok(()) => summary.weather_count += 1,
                        Err(e) => {
                            tracing::error!(location_code = code, error = %e, "Failed to store weather snapshot");
                        }
                    }
                }
            }
            Err(reason) => {
                tracing::warn!(location_code = code, name = %location.display_name(), reason, "Skipping current conditions");
            }
        }

        match validate_alert_target(location) {
            Ok((latitude, longitude)) => {
                let raw_alerts = self.provider.fetch_active_alerts(latitude, longitude).await;
                for raw in &raw_alerts {
                    self.ingest_alert(code, raw, summary).await;
                }
            }
            Err(reason) => {
                tracing::warn!(location_code = code, name = %location.display_name(), reason, "Skipping alerts");
            }
        }
    }

    async fn ingest_alert(&self, location_code: &str, raw: &RawAlert, summary: &mut SyncSummary) {
        let now = provider_now();
        let alert = self.normalizer.normalize(raw, location_code, now);

        // Past-expiry alerts never match the active set
        if alert.is_past_expiry(now) {
            summary.expired_count += 1;
            tracing::debug!(location_code, title = %alert.title, expire = %alert.expire_time, "Alert already expired, skipping");
            return;
        }

        // Re-read per alert so alerts stored earlier in this batch count too
        let existing = match self.alerts.find_active_by_location(location_code).await {
            Ok(existing) => existing,
            Err(e) => {
                tracing::error!(location_code, title = %alert.title, error = %e, "Cannot check for duplicate alert, dropping it");
                return;
            }
        };

        if self.gate.is_duplicate(&alert, &existing) {
            summary.duplicate_count += 1;
            tracing::debug!(location_code, title = %alert.title, "Alert already active");
            return;
        }

        match self.alerts.save(&alert).await {
            Ok(()) => {
                summary.alert_count += 1;
                tracing::info!(location_code, title = %alert.title, level = %alert.level, "Stored new weather alert");
            }
            Err(e) => {
                tracing::error!(location_code, title = %alert.title, error = %e, "Failed to store weather alert");
            }
        }
    }
}
