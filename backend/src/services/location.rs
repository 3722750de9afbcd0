//! Location lookups backed by Postgres

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::Location;
use sqlx::{FromRow, PgPool};

use crate::error::AppResult;
use crate::services::store::LocationStore;

/// `locations.status` value for an enabled location
pub const LOCATION_ENABLED: i16 = 1;

/// Postgres implementation of [`LocationStore`]
#[derive(Clone)]
pub struct PgLocationStore {
    db: PgPool,
}

/// Row in the `locations` table
#[derive(Debug, Clone, FromRow)]
pub struct LocationRow {
    pub id: i64,
    pub city_name: Option<String>,
    pub district_name: Option<String>,
    pub location_code: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    /// QWeather location id
    pub location_id: Option<String>,
    pub status: Option<i16>,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: row.id,
            location_code: row.location_code,
            city_name: row.city_name,
            district_name: row.district_name,
            latitude: row.latitude,
            longitude: row.longitude,
            external_id: row.location_id,
            enabled: row.status == Some(LOCATION_ENABLED),
        }
    }
}

impl PgLocationStore {
    /// Create a new PgLocationStore instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LocationStore for PgLocationStore {
    async fn find_all(&self) -> AppResult<Vec<Location>> {
        let rows = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT id, city_name, district_name, location_code, latitude, longitude,
                   location_id, status
            FROM locations
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Location::from).collect())
    }
}
