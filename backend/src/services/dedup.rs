//! Duplicate detection for incoming alerts

use shared::WeatherAlert;

/// Decides whether a normalized alert is already stored
#[derive(Debug, Clone, Copy, Default)]
pub struct DeduplicationGate;

impl DeduplicationGate {
    pub fn new() -> Self {
        Self
    }

    /// Same title and same issue time as any active alert means duplicate.
    /// Category, level and content are not compared.
    pub fn is_duplicate(&self, candidate: &WeatherAlert, existing_active: &[WeatherAlert]) -> bool {
        existing_active
            .iter()
            .any(|existing| existing.title == candidate.title && existing.issue_time == candidate.issue_time)
    }
}
