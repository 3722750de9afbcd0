//! QWeather API client for current conditions and weather alerts
//!
//! Two endpoints are used:
//! - `GET /v7/weather/now?location={id}` for current conditions
//! - `GET /weatheralert/v1/current/{lat}/{lon}` for active alerts
//!
//! Requests ask for an uncompressed body. The provider has been seen to gzip
//! anyway, so a `Content-Encoding: gzip` response is decompressed by hand.

use std::io::Read;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use flate2::read::GzDecoder;
use reqwest::header::{HeaderName, HeaderValue, ACCEPT_ENCODING, CONTENT_ENCODING};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use shared::{non_blank, parse_decimal, parse_provider_time, provider_now, WeatherSnapshot};
use thiserror::Error;

use crate::config::QWeatherConfig;
use crate::error::{AppError, AppResult};
use crate::external::WeatherProvider;

/// Status code the provider puts in the body on success
const PROVIDER_SUCCESS_CODE: &str = "200";

/// Longest slice of an error body kept for logs
const ERROR_BODY_LIMIT: usize = 512;

/// Errors from a single provider call
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider reported code {code}: {message}")]
    Provider { code: String, message: String },

    #[error("failed to decompress response body: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("malformed response body: {0}")]
    Decode(String),

    #[error("location has no external provider identifier")]
    MissingExternalId,
}

impl FetchError {
    /// The provider does not know the requested location
    pub fn is_not_found(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => *status == 404,
            FetchError::Provider { code, .. } => code == "404",
            _ => false,
        }
    }
}

/// QWeather API client
#[derive(Clone)]
pub struct QWeatherClient {
    client: Client,
    api_key: String,
    api_key_header: HeaderName,
    base_url: String,
}

/// One alert as published by the provider, before normalization
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAlert {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub event_type: Option<RawEventType>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub headline: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub criteria: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub instruction: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub issued_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub effective_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub expire_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawEventType {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub code: Option<String>,
}

impl RawAlert {
    /// Provider category name, e.g. "台风"
    pub fn category(&self) -> Option<String> {
        non_blank(self.event_type.as_ref().and_then(|e| e.name.clone()))
    }
}

/// `/v7/weather/now` response envelope
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NowResponse {
    #[serde(default, deserialize_with = "lenient_text")]
    code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    message: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    update_time: Option<String>,
    #[serde(default)]
    now: Option<NowBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NowBody {
    #[serde(default, deserialize_with = "lenient_text")]
    temp: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    humidity: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    wind_speed: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    wind_dir: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    precip: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    text: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pressure: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    vis: Option<String>,
}

/// `/weatheralert/v1/current` response envelope
#[derive(Debug, Deserialize)]
struct AlertsResponse {
    #[serde(default)]
    alerts: Option<Value>,
}

/// Accept strings, numbers and booleans as text; anything else is absent
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn decimal_field(raw: &Option<String>) -> Option<Decimal> {
    raw.as_deref().and_then(parse_decimal)
}

fn truncate(mut body: String) -> String {
    if body.len() > ERROR_BODY_LIMIT {
        let mut cut = ERROR_BODY_LIMIT;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

/// Turn a response body into text, gunzipping when the provider says so
///
/// A body labelled gzip that fails to decompress is read as plain UTF-8.
pub fn decode_body(bytes: &[u8], gzipped: bool) -> Result<String, FetchError> {
    if gzipped {
        let mut decoder = GzDecoder::new(bytes);
        let mut text = String::new();
        match decoder.read_to_string(&mut text) {
            Ok(_) => return Ok(text),
            Err(e) => {
                tracing::warn!(error = %e, "Body labelled gzip did not decompress, reading as plain text");
                if std::str::from_utf8(bytes).is_err() {
                    return Err(FetchError::Decompress(e));
                }
            }
        }
    }

    String::from_utf8(bytes.to_vec()).map_err(|e| FetchError::Decode(e.to_string()))
}

/// Parse a `/v7/weather/now` body into a snapshot for `location_code`
///
/// `now` is the fallback observation time when `updateTime` is missing or
/// unreadable; the calendar date is always taken from `now`.
pub fn parse_current_conditions(
    location_code: &str,
    body: &str,
    now: NaiveDateTime,
) -> Result<WeatherSnapshot, FetchError> {
    let response: NowResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    let code = response.code.unwrap_or_default();
    if code != PROVIDER_SUCCESS_CODE {
        return Err(FetchError::Provider {
            code,
            message: response.message.unwrap_or_default(),
        });
    }

    let current = response
        .now
        .ok_or_else(|| FetchError::Decode("missing `now` object".to_string()))?;

    let update_time = match response.update_time.as_deref() {
        Some(raw) if !raw.trim().is_empty() => parse_provider_time(raw).unwrap_or_else(|| {
            tracing::warn!(location_code, update_time = raw, "Unparseable update time, using current time");
            now
        }),
        _ => now,
    };

    Ok(WeatherSnapshot {
        location_code: location_code.to_string(),
        temperature: decimal_field(&current.temp),
        humidity: decimal_field(&current.humidity),
        wind_speed: decimal_field(&current.wind_speed),
        wind_direction: non_blank(current.wind_dir),
        precipitation: decimal_field(&current.precip),
        weather_condition: non_blank(current.text),
        pressure: decimal_field(&current.pressure),
        visibility: decimal_field(&current.vis),
        update_time,
        data_date: now.date(),
    })
}

/// Parse a `/weatheralert/v1/current` body into raw alerts
///
/// A missing or non-array `alerts` field means no alerts. Entries that are
/// not objects are skipped.
pub fn parse_alerts(body: &str) -> Result<Vec<RawAlert>, FetchError> {
    let response: AlertsResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    let Some(Value::Array(entries)) = response.alerts else {
        return Ok(Vec::new());
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| match RawAlert::deserialize(entry) {
            Ok(alert) => Some(alert),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable alert entry");
                None
            }
        })
        .collect())
}

impl QWeatherClient {
    /// Create a new QWeatherClient from configuration
    pub fn new(config: &QWeatherConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;

        let api_key_header = HeaderName::from_bytes(config.api_key_header.as_bytes())
            .map_err(|e| AppError::Configuration(format!("qweather.api_key_header: {}", e)))?;
        HeaderValue::from_str(&config.api_key)
            .map_err(|e| AppError::Configuration(format!("qweather.api_key: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_key_header,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client against a custom base URL (for testing)
    pub fn with_base_url(api_key: &str, base_url: &str) -> AppResult<Self> {
        Self::new(&QWeatherConfig {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            api_key_header: "X-QW-Api-Key".to_string(),
            timeout_secs: 10,
        })
    }

    /// Issue one authenticated GET and return the decoded body text
    async fn get_text(&self, request: reqwest::RequestBuilder) -> Result<String, FetchError> {
        let response = request
            .header(self.api_key_header.clone(), self.api_key.as_str())
            .header(ACCEPT_ENCODING, "identity")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate(body),
            });
        }

        let gzipped = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase().contains("gzip"))
            .unwrap_or(false);

        let bytes = response.bytes().await?;
        decode_body(&bytes, gzipped)
    }

    /// Fetch current conditions, surfacing every failure
    pub async fn try_fetch_current_conditions(
        &self,
        location_code: &str,
        external_id: &str,
    ) -> Result<WeatherSnapshot, FetchError> {
        let external_id = external_id.trim();
        if external_id.is_empty() {
            return Err(FetchError::MissingExternalId);
        }

        let url = format!("{}/v7/weather/now", self.base_url);
        let body = self
            .get_text(self.client.get(&url).query(&[("location", external_id)]))
            .await?;

        parse_current_conditions(location_code, &body, provider_now())
    }

    /// Fetch active alerts around a coordinate, surfacing every failure
    pub async fn try_fetch_active_alerts(
        &self,
        latitude: Decimal,
        longitude: Decimal,
    ) -> Result<Vec<RawAlert>, FetchError> {
        let url = format!(
            "{}/weatheralert/v1/current/{}/{}",
            self.base_url, latitude, longitude
        );
        let body = self.get_text(self.client.get(&url)).await?;
        parse_alerts(&body)
    }
}

#[async_trait]
impl WeatherProvider for QWeatherClient {
    async fn fetch_current_conditions(
        &self,
        location_code: &str,
        external_id: &str,
    ) -> Option<WeatherSnapshot> {
        match self
            .try_fetch_current_conditions(location_code, external_id)
            .await
        {
            Ok(snapshot) => Some(snapshot),
            Err(e) if e.is_not_found() => {
                tracing::warn!(location_code, external_id, error = %e, "Provider does not know this location");
                None
            }
            Err(FetchError::Provider { code, message }) => {
                tracing::warn!(location_code, external_id, code = %code, message = %message, "Provider returned an error");
                None
            }
            Err(e) => {
                tracing::error!(location_code, external_id, error = %e, "Failed to fetch current conditions");
                None
            }
        }
    }

    async fn fetch_active_alerts(&self, latitude: Decimal, longitude: Decimal) -> Vec<RawAlert> {
        match self.try_fetch_active_alerts(latitude, longitude).await {
            Ok(alerts) => alerts,
            Err(e) => {
                tracing::error!(%latitude, %longitude, error = %e, "Failed to fetch weather alerts");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use std::str::FromStr;

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(15, 2, 11)
            .unwrap()
    }

    fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_parse_current_conditions_success() {
        let body = r#"{
            "code": "200",
            "updateTime": "2024-07-01T14:35+08:00",
            "now": {
                "temp": "31.5", "humidity": "70", "windSpeed": "12",
                "windDir": "东南风", "precip": "0.0", "text": "多云",
                "pressure": "1004", "vis": "25"
            }
        }"#;

        let snapshot = parse_current_conditions("SANYA", body, fixed_now()).unwrap();
        assert_eq!(snapshot.location_code, "SANYA");
        assert_eq!(snapshot.temperature, Some(Decimal::from_str("31.5").unwrap()));
        assert_eq!(snapshot.humidity, Some(Decimal::from(70)));
        assert_eq!(snapshot.wind_direction.as_deref(), Some("东南风"));
        assert_eq!(snapshot.precipitation.map(|d| d.to_string()), Some("0.0".to_string()));
        assert_eq!(snapshot.weather_condition.as_deref(), Some("多云"));
        assert_eq!(
            snapshot.update_time,
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap().and_hms_opt(14, 35, 0).unwrap()
        );
        assert_eq!(snapshot.data_date, fixed_now().date());
    }

    #[test]
    fn test_parse_current_conditions_defaults_time() {
        let body = r#"{"code":"200","now":{"temp":"30"}}"#;
        let snapshot = parse_current_conditions("SANYA", body, fixed_now()).unwrap();
        assert_eq!(snapshot.update_time, fixed_now());

        let body = r#"{"code":"200","updateTime":"soon","now":{"temp":"30"}}"#;
        let snapshot = parse_current_conditions("SANYA", body, fixed_now()).unwrap();
        assert_eq!(snapshot.update_time, fixed_now());
    }

    #[test]
    fn test_parse_current_conditions_tolerates_bad_numbers() {
        let body = r#"{"code":"200","now":{"temp":"hot","humidity":70,"vis":""}}"#;
        let snapshot = parse_current_conditions("SANYA", body, fixed_now()).unwrap();
        assert_eq!(snapshot.temperature, None);
        assert_eq!(snapshot.humidity, Some(Decimal::from(70)));
        assert_eq!(snapshot.visibility, None);
        assert_eq!(snapshot.pressure, None);
    }

    #[test]
    fn test_parse_current_conditions_provider_error() {
        let body = r#"{"code":"404","message":"location not found"}"#;
        let err = parse_current_conditions("SANYA", body, fixed_now()).unwrap_err();
        assert!(err.is_not_found());
        match err {
            FetchError::Provider { code, message } => {
                assert_eq!(code, "404");
                assert_eq!(message, "location not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_current_conditions_numeric_code() {
        let body = r#"{"code":200,"now":{"temp":"28"}}"#;
        assert!(parse_current_conditions("SANYA", body, fixed_now()).is_ok());
    }

    #[test]
    fn test_parse_current_conditions_malformed() {
        assert!(matches!(
            parse_current_conditions("SANYA", "<html>", fixed_now()),
            Err(FetchError::Decode(_))
        ));
        assert!(matches!(
            parse_current_conditions("SANYA", r#"{"code":"200"}"#, fixed_now()),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn test_parse_alerts() {
        let body = r#"{
            "metadata": {"zeroResult": false},
            "alerts": [
                {
                    "id": "abc",
                    "eventType": {"name": "台风", "code": "1001"},
                    "severity": "Severe",
                    "headline": "三亚市气象台发布台风橙色预警",
                    "issuedTime": "2024-07-01T10:00+08:00"
                },
                "garbage"
            ]
        }"#;

        let alerts = parse_alerts(body).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].category().as_deref(), Some("台风"));
        assert_eq!(alerts[0].severity.as_deref(), Some("Severe"));
        assert_eq!(alerts[0].description, None);
    }

    #[test]
    fn test_parse_alerts_missing_array() {
        assert!(parse_alerts(r#"{"metadata":{"zeroResult":true}}"#).unwrap().is_empty());
        assert!(parse_alerts(r#"{"alerts":null}"#).unwrap().is_empty());
        assert!(parse_alerts(r#"{"alerts":{}}"#).unwrap().is_empty());
    }

    #[test]
    fn test_decode_body_plain_and_gzip() {
        let text = r#"{"code":"200"}"#;
        assert_eq!(decode_body(text.as_bytes(), false).unwrap(), text);
        assert_eq!(decode_body(&gzip(text), true).unwrap(), text);
    }

    #[test]
    fn test_decode_body_mislabelled_gzip() {
        let text = r#"{"code":"200"}"#;
        assert_eq!(decode_body(text.as_bytes(), true).unwrap(), text);
        assert!(decode_body(&[0x1f, 0x8b, 0xff, 0xfe], true).is_err());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let long = "预".repeat(400);
        let cut = truncate(long);
        assert!(cut.len() <= ERROR_BODY_LIMIT);
        assert!(cut.chars().all(|c| c == '预'));
    }

    #[test]
    fn test_client_rejects_bad_header_name() {
        let config = QWeatherConfig {
            base_url: "http://localhost".to_string(),
            api_key: "key".to_string(),
            api_key_header: "bad header".to_string(),
            timeout_secs: 1,
        };
        assert!(matches!(
            QWeatherClient::new(&config),
            Err(AppError::Configuration(_))
        ));
    }
}
