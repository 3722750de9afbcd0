//! External API integrations

pub mod qweather;

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::WeatherSnapshot;

pub use qweather::{FetchError, QWeatherClient, RawAlert};

/// Source of current conditions and active alerts
///
/// Implementations never fail outward: any transport, HTTP or provider error
/// is logged and reported as "no data".
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Latest observation for one location, `None` when nothing usable came back
    async fn fetch_current_conditions(
        &self,
        location_code: &str,
        external_id: &str,
    ) -> Option<WeatherSnapshot>;

    /// Alerts currently in force around a coordinate
    async fn fetch_active_alerts(&self, latitude: Decimal, longitude: Decimal) -> Vec<RawAlert>;
}
