//! Weather snapshot storage backed by Postgres

use async_trait::async_trait;
use shared::WeatherSnapshot;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::services::store::WeatherStore;

/// Postgres implementation of [`WeatherStore`]
///
/// Every successful fetch becomes a new `weather_data` row; the latest
/// reading for a location is whichever row has the newest `update_time`.
#[derive(Clone)]
pub struct PgWeatherStore {
    db: PgPool,
}

impl PgWeatherStore {
    /// Create a new PgWeatherStore instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WeatherStore for PgWeatherStore {
    async fn save(&self, snapshot: &WeatherSnapshot) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO weather_data (
                location_code, temperature, humidity, wind_speed, wind_direction,
                precipitation, weather_condition, pressure, visibility,
                update_time, data_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&snapshot.location_code)
        .bind(snapshot.temperature)
        .bind(snapshot.humidity)
        .bind(snapshot.wind_speed)
        .bind(&snapshot.wind_direction)
        .bind(snapshot.precipitation)
        .bind(&snapshot.weather_condition)
        .bind(snapshot.pressure)
        .bind(snapshot.visibility)
        .bind(snapshot.update_time)
        .bind(snapshot.data_date)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}
