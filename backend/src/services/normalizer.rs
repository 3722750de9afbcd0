//! Maps provider alerts onto internal warning records

use chrono::{Duration, NaiveDateTime};
use shared::{
    has_consistent_window, non_blank, parse_provider_time, AlertLevel, AlertStatus, WeatherAlert,
};

use crate::external::RawAlert;

/// Label placed before the provider's issuing criteria
pub const CRITERIA_LABEL: &str = "标准：";

/// Label placed before the provider's protective guidance
pub const INSTRUCTION_LABEL: &str = "防御指南：";

/// How long an alert without a readable expiry stays active
pub const DEFAULT_ALERT_LIFETIME_HOURS: i64 = 24;

/// Converts [`RawAlert`]s into [`WeatherAlert`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertNormalizer;

impl AlertNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize one provider alert for `location_code`
    ///
    /// `now` stands in for an unreadable issue time.
    pub fn normalize(&self, raw: &RawAlert, location_code: &str, now: NaiveDateTime) -> WeatherAlert {
        let issue_time = raw
            .issued_time
            .as_deref()
            .and_then(parse_provider_time)
            .unwrap_or(now);
        let effective_time = raw
            .effective_time
            .as_deref()
            .and_then(parse_provider_time)
            .unwrap_or(issue_time);
        let expire_time = raw
            .expire_time
            .as_deref()
            .and_then(parse_provider_time)
            .unwrap_or_else(|| issue_time + Duration::hours(DEFAULT_ALERT_LIFETIME_HOURS));

        let alert = WeatherAlert {
            location_code: location_code.to_string(),
            warning_type: raw.category(),
            level: map_severity(raw.severity.as_deref()),
            title: raw.headline.clone().unwrap_or_default(),
            content: compose_content(raw),
            issue_time,
            effective_time,
            expire_time,
            status: AlertStatus::Active,
        };

        if !has_consistent_window(&alert) {
            tracing::debug!(
                location_code,
                title = %alert.title,
                effective = %alert.effective_time,
                expire = %alert.expire_time,
                "Alert expires before it takes effect"
            );
        }

        alert
    }
}

/// Map provider severity vocabulary onto internal levels
///
/// Matching is case-insensitive; unknown or absent severities are Blue.
pub fn map_severity(severity: Option<&str>) -> AlertLevel {
    match severity.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("extreme") => AlertLevel::Red,
        Some("severe") => AlertLevel::Orange,
        Some("moderate") => AlertLevel::Yellow,
        Some("minor") => AlertLevel::Blue,
        _ => AlertLevel::Blue,
    }
}

/// Join description, criteria and instruction into paragraphs
pub fn compose_content(raw: &RawAlert) -> String {
    let paragraphs = [
        non_blank(raw.description.clone()),
        non_blank(raw.criteria.clone()).map(|c| format!("{}{}", CRITERIA_LABEL, c)),
        non_blank(raw.instruction.clone()).map(|i| format!("{}{}", INSTRUCTION_LABEL, i)),
    ];

    paragraphs
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::qweather::RawEventType;
    use chrono::NaiveDate;

    fn t(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn typhoon() -> RawAlert {
        RawAlert {
            event_type: Some(RawEventType {
                name: Some("台风".to_string()),
                code: Some("1001".to_string()),
            }),
            severity: Some("Severe".to_string()),
            headline: Some("三亚市气象台发布台风橙色预警".to_string()),
            description: Some("预计未来24小时将受台风影响".to_string()),
            criteria: Some("12小时内可能受热带气旋影响".to_string()),
            instruction: Some("停止室外集体活动".to_string()),
            issued_time: Some("2024-07-01T10:00+08:00".to_string()),
            effective_time: Some("2024-07-01T10:30+08:00".to_string()),
            expire_time: Some("2024-07-02T10:00+08:00".to_string()),
            ..RawAlert::default()
        }
    }

    #[test]
    fn test_normalize_full_alert() {
        let alert = AlertNormalizer::new().normalize(&typhoon(), "SANYA", t(12, 0));

        assert_eq!(alert.location_code, "SANYA");
        assert_eq!(alert.warning_type.as_deref(), Some("台风"));
        assert_eq!(alert.level, AlertLevel::Orange);
        assert_eq!(alert.title, "三亚市气象台发布台风橙色预警");
        assert_eq!(alert.issue_time, t(10, 0));
        assert_eq!(alert.effective_time, t(10, 30));
        assert_eq!(alert.expire_time, t(10, 0) + Duration::hours(24));
        assert_eq!(alert.status, AlertStatus::Active);
        assert_eq!(
            alert.content,
            "预计未来24小时将受台风影响\n\n标准：12小时内可能受热带气旋影响\n\n防御指南：停止室外集体活动"
        );
    }

    #[test]
    fn test_content_skips_empty_paragraphs() {
        let mut raw = typhoon();
        raw.description = Some(String::new());
        raw.criteria = None;
        assert_eq!(compose_content(&raw), "防御指南：停止室外集体活动");

        raw.instruction = None;
        assert_eq!(compose_content(&raw), "");
    }

    #[test]
    fn test_time_fallbacks() {
        let raw = RawAlert {
            headline: Some("暴雨蓝色预警".to_string()),
            issued_time: Some("not a time".to_string()),
            ..RawAlert::default()
        };
        let now = t(8, 15);
        let alert = AlertNormalizer::new().normalize(&raw, "HAIKOU", now);

        assert_eq!(alert.issue_time, now);
        assert_eq!(alert.effective_time, now);
        assert_eq!(alert.expire_time, now + Duration::hours(24));
    }

    #[test]
    fn test_unparseable_effective_time_uses_issue_time() {
        let mut raw = typhoon();
        raw.effective_time = Some("2024/07/01".to_string());
        let alert = AlertNormalizer::new().normalize(&raw, "SANYA", t(12, 0));
        assert_eq!(alert.effective_time, t(10, 0));
    }

    #[test]
    fn test_missing_headline_is_empty_title() {
        let raw = RawAlert::default();
        let alert = AlertNormalizer::new().normalize(&raw, "SANYA", t(12, 0));
        assert_eq!(alert.title, "");
        assert_eq!(alert.warning_type, None);
        assert_eq!(alert.level, AlertLevel::Blue);
    }

    #[test]
    fn test_map_severity_table() {
        assert_eq!(map_severity(Some("extreme")), AlertLevel::Red);
        assert_eq!(map_severity(Some("Severe")), AlertLevel::Orange);
        assert_eq!(map_severity(Some("MODERATE")), AlertLevel::Yellow);
        assert_eq!(map_severity(Some("minor")), AlertLevel::Blue);
        assert_eq!(map_severity(Some("")), AlertLevel::Blue);
        assert_eq!(map_severity(Some("unknown")), AlertLevel::Blue);
        assert_eq!(map_severity(None), AlertLevel::Blue);
    }
}
