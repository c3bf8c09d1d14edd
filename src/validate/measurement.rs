use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

/// A unit conversion answered by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub original_value: f64,
    pub original_unit: String,
    pub converted_value: f64,
    pub converted_unit: String,
}

impl Measurement {
    /// JSON Schema shown to the model and used for validation.
    pub fn json_schema() -> Value {
        json!({
            "title": "Measurement",
            "type": "object",
            "properties": {
                "timestamp": {"title": "Timestamp", "type": "string", "format": "date-time"},
                "original_value": {"title": "Original Value", "type": "number"},
                "original_unit": {"title": "Original Unit", "type": "string"},
                "converted_value": {"title": "Converted Value", "type": "number"},
                "converted_unit": {"title": "Converted Unit", "type": "string"}
            },
            "required": [
                "timestamp",
                "original_value",
                "original_unit",
                "converted_value",
                "converted_unit"
            ]
        })
    }
}

/// RFC 3339, or an ISO-8601 date-time without offset taken as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid datetime '{raw}'"))
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
