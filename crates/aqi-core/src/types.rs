//! Core data types for upstream records and AQI results

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Upstream marker for a missing reading
pub const NA_SENTINEL: &str = "NA";

/// Placeholder used when a record carries no city or state
pub const UNKNOWN_PLACE: &str = "Unknown";

/// A field value as delivered by the upstream feed
///
/// The dataset publishes readings as strings, but numbers are accepted too.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric reading, if the value is present, not "NA", and finite
    pub fn as_reading(&self) -> Option<f64> {
        if self.is_na() {
            return None;
        }
        let value = match self {
            FieldValue::Number(v) => *v,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    pub fn is_na(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.trim() == NA_SENTINEL)
    }
}

/// One candidate record from an upstream response
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CandidateRecord {
    /// Average PM2.5 concentration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_value: Option<FieldValue>,

    /// Last update timestamp, passed through verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Monitoring station name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pollutant_id: Option<String>,
}

/// Decoded body of a successful upstream call
///
/// Only `records` is read; every other top-level field is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpstreamPayload {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub records: Vec<CandidateRecord>,
}

/// `"records": null` reads as an empty list
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Classified outcome of one upstream call
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamReply {
    /// 2xx with a decodable body
    Payload(UpstreamPayload),
    /// Upstream answered with a non-success status
    HttpStatus { status: u16, body: String },
    /// Network failure, timeout, or unusable body
    Unreachable { detail: String },
}

/// What the client asked for
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    ByCity { city: String, state: String },
    ByCoords { lat: f64, lon: f64 },
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationQuery::ByCity { city, state } => write!(f, "{city}, {state}"),
            LocationQuery::ByCoords { lat, lon } => write!(f, "({lat}, {lon})"),
        }
    }
}

/// AQI health category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AqiCategory {
    Good,
    Satisfactory,
    Moderate,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
    Severe,
}

impl AqiCategory {
    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Satisfactory => "Satisfactory",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::Poor => "Poor",
            AqiCategory::VeryPoor => "Very Poor",
            AqiCategory::Severe => "Severe",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalized response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AqiResult {
    pub aqi: u32,
    pub city: String,
    pub state: String,
    pub category: AqiCategory,
    pub raw_pm25: f64,
    pub last_updated: String,
}
