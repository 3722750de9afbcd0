//! Weather alert storage backed by Postgres

use async_trait::async_trait;
use chrono::NaiveDateTime;
use shared::{provider_now, AlertLevel, AlertStatus, UnknownValue, WeatherAlert};
use sqlx::{FromRow, PgPool};

use crate::error::AppResult;
use crate::services::store::AlertStore;

/// Postgres implementation of [`AlertStore`]
#[derive(Clone)]
pub struct PgAlertStore {
    db: PgPool,
}

/// Row in the `weather_warnings` table
#[derive(Debug, Clone, FromRow)]
pub struct AlertRow {
    pub id: i64,
    pub location_code: String,
    pub warning_type: Option<String>,
    pub warning_level: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub issue_time: NaiveDateTime,
    pub effective_time: Option<NaiveDateTime>,
    pub expire_time: NaiveDateTime,
    pub status: String,
}

impl TryFrom<AlertRow> for WeatherAlert {
    type Error = UnknownValue;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        let status = AlertStatus::parse(&row.status)?;

        // Manually published warnings may carry labels outside the sync vocabulary
        let level = match row.warning_level.as_deref().map(AlertLevel::parse) {
            Some(Ok(level)) => level,
            Some(Err(e)) => {
                tracing::warn!(alert_id = row.id, error = %e, "Unrecognised warning level, treating as blue");
                AlertLevel::Blue
            }
            None => AlertLevel::Blue,
        };

        Ok(WeatherAlert {
            location_code: row.location_code,
            warning_type: row.warning_type,
            level,
            title: row.title.unwrap_or_default(),
            content: row.content.unwrap_or_default(),
            issue_time: row.issue_time,
            effective_time: row.effective_time.unwrap_or(row.issue_time),
            expire_time: row.expire_time,
            status,
        })
    }
}

impl PgAlertStore {
    /// Create a new PgAlertStore instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AlertStore for PgAlertStore {
    async fn find_active_by_location(&self, location_code: &str) -> AppResult<Vec<WeatherAlert>> {
        let rows = sqlx::query_as::<_, AlertRow>(
            r#"
            SELECT id, location_code, warning_type, warning_level, title, content,
                   issue_time, effective_time, expire_time, status
            FROM weather_warnings
            WHERE location_code = $1
              AND status = $2
              AND expire_time > $3
            ORDER BY issue_time DESC
            "#,
        )
        .bind(location_code)
        .bind(AlertStatus::Active.as_str())
        .bind(provider_now())
        .fetch_all(&self.db)
        .await?;

        let alerts = rows
            .into_iter()
            .map(WeatherAlert::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(alerts)
    }

    async fn save(&self, alert: &WeatherAlert) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO weather_warnings (
                location_code, warning_type, warning_level, title, content,
                issue_time, effective_time, expire_time, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&alert.location_code)
        .bind(&alert.warning_type)
        .bind(alert.level.label())
        .bind(&alert.title)
        .bind(&alert.content)
        .bind(alert.issue_time)
        .bind(alert.effective_time)
        .bind(alert.expire_time)
        .bind(alert.status.as_str())
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn expire_stale(&self, now: NaiveDateTime) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE weather_warnings
            SET status = $1
            WHERE status = $2 AND expire_time <= $3
            "#,
        )
        .bind(AlertStatus::Expired.as_str())
        .bind(AlertStatus::Active.as_str())
        .bind(now)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }
}
