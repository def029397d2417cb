//! Sensor readings as delivered by the spreadsheet feed.
//!
//! A reading is kept as the ordered JSON object the feed sent; typed access
//! goes through [`Metric`]. Keys the catalogue does not know pass through
//! untouched so exports keep every column.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::numeric_value;

/// Key holding the reading's timestamp string.
pub const TIMESTAMP_KEY: &str = "TimeStamp";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reading(pub Map<String, Value>);

impl Reading {
    /// Raw timestamp text; empty when the key is missing or not a string.
    pub fn timestamp(&self) -> &str {
        match self.0.get(TIMESTAMP_KEY) {
            Some(Value::String(s)) => s,
            _ => "",
        }
    }

    /// Numeric value of a metric, absent when missing or not numeric-like.
    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.0.get(metric.key()).and_then(numeric_value)
    }

    /// Chart semantics: absent values plot as zero.
    pub fn value_or_zero(&self, metric: Metric) -> f64 {
        self.value(metric).unwrap_or(0.0)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Cell text for tables and exports. Strings are emitted verbatim,
    /// null as empty, everything else in its JSON form.
    pub fn field_text(&self, key: &str) -> Option<String> {
        self.0.get(key).map(|value| match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }
}

/// Measurements a farm pole reports, keyed by the column names of the feed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    AirTemperature,
    SoilTemperature,
    AirHumidity,
    SoilHumidity,
    Nitrogen,
    Phosphorus,
    Potassium,
    Ph,
    Salinity,
    LightIntensity,
    Pressure,
    WindSpeed,
    FloatSwitch,
}

impl Metric {
    /// Table column order.
    pub const ALL: [Metric; 13] = [
        Metric::AirTemperature,
        Metric::SoilTemperature,
        Metric::AirHumidity,
        Metric::SoilHumidity,
        Metric::Pressure,
        Metric::LightIntensity,
        Metric::FloatSwitch,
        Metric::Ph,
        Metric::Salinity,
        Metric::Nitrogen,
        Metric::Phosphorus,
        Metric::Potassium,
        Metric::WindSpeed,
    ];

    /// Column name in the feed.
    pub fn key(self) -> &'static str {
        match self {
            Metric::AirTemperature => "อุณหภูมิ_c",
            Metric::SoilTemperature => "อุณหภูมิดิน_c",
            Metric::AirHumidity => "ความชื้น_เปอร์เซ็นต์",
            Metric::SoilHumidity => "ความชื้นดิน_เปอร์เซ็นต์",
            Metric::Nitrogen => "ไนโตรเจน_เปอร์เซ็นต์",
            Metric::Phosphorus => "ฟอสฟอรัส_เปอร์เซ็นต์",
            Metric::Potassium => "โพแทสเซียม_เปอร์เซ็นต์",
            Metric::Ph => "PH",
            Metric::Salinity => "ความเค็ม_เปอร์เซ็นต์",
            Metric::LightIntensity => "ความเข้มแสง_lux",
            Metric::Pressure => "แรงดัน_hPa",
            Metric::WindSpeed => "ความเร็วลม_กิโลเมตรต่อชั่วโมง",
            Metric::FloatSwitch => "ลูกลอย",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::AirTemperature => "Air temperature",
            Metric::SoilTemperature => "Soil temperature",
            Metric::AirHumidity => "Air humidity",
            Metric::SoilHumidity => "Soil humidity",
            Metric::Nitrogen => "Nitrogen",
            Metric::Phosphorus => "Phosphorus",
            Metric::Potassium => "Potassium",
            Metric::Ph => "pH",
            Metric::Salinity => "Salinity",
            Metric::LightIntensity => "Light intensity",
            Metric::Pressure => "Pressure",
            Metric::WindSpeed => "Wind speed",
            Metric::FloatSwitch => "Float switch",
        }
    }

    pub fn unit(self) -> Option<&'static str> {
        match self {
            Metric::AirTemperature | Metric::SoilTemperature => Some("°C"),
            Metric::AirHumidity
            | Metric::SoilHumidity
            | Metric::Nitrogen
            | Metric::Phosphorus
            | Metric::Potassium
            | Metric::Salinity => Some("%"),
            Metric::LightIntensity => Some("lux"),
            Metric::Pressure => Some("hPa"),
            Metric::WindSpeed => Some("km/h"),
            Metric::Ph | Metric::FloatSwitch => None,
        }
    }

    /// Display label, e.g. `Air temperature (°C)`.
    pub fn label(self) -> String {
        match self.unit() {
            Some(unit) => format!("{} ({})", self.name(), unit),
            None => self.name().to_string(),
        }
    }
}
