//! Weather data models

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A weather reading for one location at a point in time
///
/// Measurements keep the provider's textual precision. A value the provider
/// omitted or sent in an unreadable form is `None` rather than zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherSnapshot {
    pub location_code: String,
    pub temperature: Option<Decimal>,
    pub humidity: Option<Decimal>,
    pub wind_speed: Option<Decimal>,
    pub wind_direction: Option<String>,
    pub precipitation: Option<Decimal>,
    pub weather_condition: Option<String>,
    pub pressure: Option<Decimal>,
    pub visibility: Option<Decimal>,
    /// Observation time, UTC+8 wall clock
    pub update_time: NaiveDateTime,
    pub data_date: NaiveDate,
}
