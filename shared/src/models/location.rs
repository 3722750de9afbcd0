//! Location reference data

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::GpsCoordinates;

/// A configured point of interest that weather is synchronized for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub id: i64,
    /// Stable internal identifier (e.g. "SANYA")
    pub location_code: String,
    pub city_name: Option<String>,
    pub district_name: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    /// The weather provider's own identifier for this place
    pub external_id: Option<String>,
    pub enabled: bool,
}

impl Location {
    /// Provider identifier, if present and non-blank
    pub fn external_id(&self) -> Option<&str> {
        self.external_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Coordinates, if both halves are configured
    pub fn coordinates(&self) -> Option<GpsCoordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(GpsCoordinates::new(lat, lon)),
            _ => None,
        }
    }

    /// Human readable label for logs ("Sanya / Jiyang")
    pub fn display_name(&self) -> String {
        match (&self.city_name, &self.district_name) {
            (Some(city), Some(district)) => format!("{} / {}", city, district),
            (Some(city), None) => city.clone(),
            _ => self.location_code.clone(),
        }
    }
}
