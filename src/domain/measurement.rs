// Telemetry measurement domain models
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::CoreError;

/// Sensor payload as delivered upstream: either a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Numeric reading; unparseable text and non-finite numbers are malformed.
    pub fn as_f64(&self) -> Result<f64, CoreError> {
        let value = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(text) => text.trim().parse::<f64>().map_err(|_| {
                CoreError::MalformedInput(format!("unparseable value '{}'", text))
            })?,
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(CoreError::MalformedInput(format!("non-finite value {}", value)))
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementPoint {
    pub timestamp: DateTime<Utc>,
    pub raw_value: RawValue,
}

impl MeasurementPoint {
    pub fn new(timestamp: DateTime<Utc>, raw_value: impl Into<RawValue>) -> Self {
        Self {
            timestamp,
            raw_value: raw_value.into(),
        }
    }
}

/// Measurement row before its timestamp has been parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMeasurement {
    pub timestamp: String,
    #[serde(alias = "value")]
    pub raw_value: RawValue,
}

#[derive(Debug, Clone, Default)]
pub struct DecodedBatch {
    pub points: Vec<MeasurementPoint>,
    pub skipped: usize,
}

/// Accepts RFC 3339 and naive `YYYY-MM-DD HH:MM:SS` forms; naive ones are UTC.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, CoreError> {
    let input = input.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(CoreError::MalformedInput(format!(
        "unparseable timestamp '{}'",
        input
    )))
}

pub fn decode_measurements(rows: Vec<RawMeasurement>) -> DecodedBatch {
    let mut batch = DecodedBatch {
        points: Vec::with_capacity(rows.len()),
        skipped: 0,
    };

    for row in rows {
        match parse_timestamp(&row.timestamp) {
            Ok(timestamp) => batch.points.push(MeasurementPoint {
                timestamp,
                raw_value: row.raw_value,
            }),
            Err(e) => {
                tracing::debug!("Skipping measurement: {}", e);
                batch.skipped += 1;
            }
        }
    }

    batch
}

/// Server-side daily rollup compared against the age-indexed reference curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAggregate {
    pub date: NaiveDate,
    #[serde(default)]
    pub age_days: Option<u32>,
    pub measured_mean: f64,
    pub measured_min: f64,
    pub measured_max: f64,
    pub reference: f64,
    pub lower_limit: f64,
    pub upper_limit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Activity,
    Light,
    Temperature,
    Humidity,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Activity => "activity",
            Metric::Light => "light",
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClimateMetric {
    Temperature,
    Humidity,
}

impl From<ClimateMetric> for Metric {
    fn from(metric: ClimateMetric) -> Self {
        match metric {
            ClimateMetric::Temperature => Metric::Temperature,
            ClimateMetric::Humidity => Metric::Humidity,
        }
    }
}
