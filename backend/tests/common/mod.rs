//! In-memory fakes shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use shared::{provider_now, provider_today, AlertStatus, Location, WeatherAlert, WeatherSnapshot};

use hws_backend::error::{AppError, AppResult};
use hws_backend::external::{RawAlert, WeatherProvider};
use hws_backend::services::{
    AlertNormalizer, AlertStore, DeduplicationGate, LocationStore, SyncService, WeatherStore,
};

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub fn location(id: i64, code: &str, external_id: Option<&str>, enabled: bool) -> Location {
    Location {
        id,
        location_code: code.to_string(),
        city_name: Some("海南".to_string()),
        district_name: None,
        latitude: Some(dec("18.25")),
        longitude: Some(dec("109.51")),
        external_id: external_id.map(str::to_string),
        enabled,
    }
}

pub fn snapshot(code: &str) -> WeatherSnapshot {
    WeatherSnapshot {
        location_code: code.to_string(),
        temperature: Some(dec("28.0")),
        humidity: Some(dec("80")),
        wind_speed: None,
        wind_direction: None,
        precipitation: None,
        weather_condition: Some("多云".to_string()),
        pressure: None,
        visibility: None,
        update_time: provider_now(),
        data_date: provider_today(),
    }
}

/// Provider timestamp `hours` before now, minute precision
pub fn hours_ago(hours: i64) -> String {
    (provider_now() - chrono::Duration::hours(hours))
        .format("%Y-%m-%dT%H:%M+08:00")
        .to_string()
}

pub fn raw_alert(headline: &str, issued: &str) -> RawAlert {
    RawAlert {
        headline: Some(headline.to_string()),
        severity: Some("severe".to_string()),
        description: Some("预计未来24小时有强降雨".to_string()),
        issued_time: Some(issued.to_string()),
        ..RawAlert::default()
    }
}

/// Provider answering from fixed tables and recording every call
#[derive(Default)]
pub struct ScriptedProvider {
    /// Keyed by external id; a missing key behaves like a failed fetch
    pub conditions: Mutex<HashMap<String, WeatherSnapshot>>,
    pub alerts: Mutex<Vec<RawAlert>>,
    pub condition_calls: Mutex<Vec<String>>,
    pub alert_calls: Mutex<Vec<(Decimal, Decimal)>>,
    pub delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn with_conditions(self, external_id: &str, snapshot: WeatherSnapshot) -> Self {
        self.conditions
            .lock()
            .unwrap()
            .insert(external_id.to_string(), snapshot);
        self
    }

    pub fn with_alerts(self, alerts: Vec<RawAlert>) -> Self {
        *self.alerts.lock().unwrap() = alerts;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn condition_calls(&self) -> Vec<String> {
        self.condition_calls.lock().unwrap().clone()
    }

    pub fn alert_call_count(&self) -> usize {
        self.alert_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl WeatherProvider for ScriptedProvider {
    async fn fetch_current_conditions(
        &self,
        _location_code: &str,
        external_id: &str,
    ) -> Option<WeatherSnapshot> {
        self.condition_calls
            .lock()
            .unwrap()
            .push(external_id.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.conditions.lock().unwrap().get(external_id).cloned()
    }

    async fn fetch_active_alerts(&self, latitude: Decimal, longitude: Decimal) -> Vec<RawAlert> {
        self.alert_calls.lock().unwrap().push((latitude, longitude));
        self.alerts.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct MemoryLocationStore {
    pub locations: Vec<Location>,
    pub fail: bool,
}

#[async_trait]
impl LocationStore for MemoryLocationStore {
    async fn find_all(&self) -> AppResult<Vec<Location>> {
        if self.fail {
            return Err(AppError::Internal("locations unavailable".to_string()));
        }
        Ok(self.locations.clone())
    }
}

#[derive(Default)]
pub struct MemoryWeatherStore {
    pub saved: Mutex<Vec<WeatherSnapshot>>,
    pub fail: AtomicBool,
}

impl MemoryWeatherStore {
    pub fn saved(&self) -> Vec<WeatherSnapshot> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherStore for MemoryWeatherStore {
    async fn save(&self, snapshot: &WeatherSnapshot) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("weather_data insert failed".to_string()));
        }
        self.saved.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}

/// Alert store with the same "active" rule as the Postgres query
#[derive(Default)]
pub struct MemoryAlertStore {
    pub alerts: Mutex<Vec<WeatherAlert>>,
    pub fail_saves: AtomicBool,
    pub fail_reads: AtomicBool,
}

impl MemoryAlertStore {
    pub fn all(&self) -> Vec<WeatherAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn find_active_by_location(&self, location_code: &str) -> AppResult<Vec<WeatherAlert>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Internal("weather_warnings read failed".to_string()));
        }
        let now = provider_now();
        Ok(self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| {
                a.location_code == location_code
                    && a.status == AlertStatus::Active
                    && a.expire_time > now
            })
            .cloned()
            .collect())
    }

    async fn save(&self, alert: &WeatherAlert) -> AppResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(AppError::Internal("weather_warnings insert failed".to_string()));
        }
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }

    async fn expire_stale(&self, now: NaiveDateTime) -> AppResult<u64> {
        let mut expired = 0;
        for alert in self.alerts.lock().unwrap().iter_mut() {
            if alert.status == AlertStatus::Active && alert.expire_time <= now {
                alert.status = AlertStatus::Expired;
                expired += 1;
            }
        }
        Ok(expired)
    }
}

/// A sync service wired to fakes, with handles kept for assertions
pub struct Harness {
    pub provider: Arc<ScriptedProvider>,
    pub weather: Arc<MemoryWeatherStore>,
    pub alerts: Arc<MemoryAlertStore>,
    pub service: SyncService,
}

impl Harness {
    pub fn new(provider: ScriptedProvider, locations: Vec<Location>) -> Self {
        Self::with_location_store(
            provider,
            MemoryLocationStore {
                locations,
                fail: false,
            },
        )
    }

    pub fn with_location_store(provider: ScriptedProvider, locations: MemoryLocationStore) -> Self {
        let provider = Arc::new(provider);
        let weather = Arc::new(MemoryWeatherStore::default());
        let alerts = Arc::new(MemoryAlertStore::default());
        let service = SyncService::new(
            provider.clone(),
            AlertNormalizer::new(),
            DeduplicationGate::new(),
            Arc::new(locations),
            weather.clone(),
            alerts.clone(),
        );
        Self {
            provider,
            weather,
            alerts,
            service,
        }
    }
}
