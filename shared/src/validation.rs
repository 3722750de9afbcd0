//! Validation utilities for the Hainan Weather Service

use rust_decimal::Decimal;

use crate::models::{Location, WeatherAlert};

// ============================================================================
// Location Validations
// ============================================================================

/// Validate that a location can be queried for current conditions
pub fn validate_current_conditions_target(location: &Location) -> Result<&str, &'static str> {
    location
        .external_id()
        .ok_or("Location has no external provider identifier")
}

/// Validate that a location can be queried for alerts by coordinate
pub fn validate_alert_target(location: &Location) -> Result<(Decimal, Decimal), &'static str> {
    let coords = location
        .coordinates()
        .ok_or("Location has no coordinates")?;
    validate_coordinates(coords.latitude, coords.longitude)?;
    Ok((coords.latitude, coords.longitude))
}

/// Validate latitude/longitude are on the globe
pub fn validate_coordinates(latitude: Decimal, longitude: Decimal) -> Result<(), &'static str> {
    if latitude < Decimal::from(-90) || latitude > Decimal::from(90) {
        return Err("Latitude must be between -90 and 90");
    }
    if longitude < Decimal::from(-180) || longitude > Decimal::from(180) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}

// ============================================================================
// Alert Validations
// ============================================================================

/// Check whether an alert's time window is well ordered
///
/// Provider data is not rejected on this basis; the check is used for
/// diagnostics only.
pub fn has_consistent_window(alert: &WeatherAlert) -> bool {
    alert.effective_time <= alert.expire_time
}
