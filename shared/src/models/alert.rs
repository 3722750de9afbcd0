//! Weather alert models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Internal warning level, from most to least serious
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Red,
    Orange,
    Yellow,
    Blue,
}

impl AlertLevel {
    pub const ALL: [AlertLevel; 4] = [
        AlertLevel::Red,
        AlertLevel::Orange,
        AlertLevel::Yellow,
        AlertLevel::Blue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Red => "red",
            AlertLevel::Orange => "orange",
            AlertLevel::Yellow => "yellow",
            AlertLevel::Blue => "blue",
        }
    }

    /// Label stored in the `warning_level` column and shown to the public
    pub fn label(&self) -> &'static str {
        match self {
            AlertLevel::Red => "红色",
            AlertLevel::Orange => "橙色",
            AlertLevel::Yellow => "黄色",
            AlertLevel::Blue => "蓝色",
        }
    }

    /// Accepts either the English name or the stored label
    pub fn parse(s: &str) -> Result<Self, UnknownValue> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()) || level.label() == s.trim())
            .ok_or_else(|| UnknownValue {
                kind: "alert level",
                value: s.to_string(),
            })
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    Active,
    Expired,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "ACTIVE",
            AlertStatus::Expired => "EXPIRED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, UnknownValue> {
        match s {
            "ACTIVE" => Ok(AlertStatus::Active),
            "EXPIRED" => Ok(AlertStatus::Expired),
            other => Err(UnknownValue {
                kind: "alert status",
                value: other.to_string(),
            }),
        }
    }
}

/// A stored column value that does not map onto a known variant
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

/// A warning for one location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherAlert {
    pub location_code: String,
    /// Free-text category from the provider (e.g. "台风")
    pub warning_type: Option<String>,
    pub level: AlertLevel,
    pub title: String,
    pub content: String,
    pub issue_time: NaiveDateTime,
    pub effective_time: NaiveDateTime,
    pub expire_time: NaiveDateTime,
    pub status: AlertStatus,
}

impl WeatherAlert {
    /// Whether the alert should have transitioned to `EXPIRED` by `now`
    pub fn is_past_expiry(&self, now: NaiveDateTime) -> bool {
        self.expire_time <= now
    }
}
