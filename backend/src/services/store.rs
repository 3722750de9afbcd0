//! Persistence seams used by the sync subsystem
//!
//! The sync service only ever talks to these traits. Postgres-backed
//! implementations live next to the per-entity services.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use shared::{Location, WeatherAlert, WeatherSnapshot};

use crate::error::AppResult;

/// Read access to configured locations
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Every location, enabled or not
    async fn find_all(&self) -> AppResult<Vec<Location>>;
}

/// Append-only storage for weather snapshots
#[async_trait]
pub trait WeatherStore: Send + Sync {
    async fn save(&self, snapshot: &WeatherSnapshot) -> AppResult<()>;
}

/// Storage for weather alerts
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// `ACTIVE` alerts for a location whose expiry is still in the future
    async fn find_active_by_location(&self, location_code: &str) -> AppResult<Vec<WeatherAlert>>;

    async fn save(&self, alert: &WeatherAlert) -> AppResult<()>;

    /// Mark `ACTIVE` alerts whose expiry is at or before `now` as `EXPIRED`
    async fn expire_stale(&self, now: NaiveDateTime) -> AppResult<u64>;
}
