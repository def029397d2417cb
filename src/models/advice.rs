//! Nutrient assessments published by the AI feed next to the sensor feed.
//!
//! Each AI row carries one level per nutrient (`มาก` high, `ปกติ` normal,
//! `น้อย` low); the dashboard shows the latest row with fixed advice.

use serde::Serialize;

use crate::models::reading::Reading;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Nutrient {
    #[serde(rename = "EC")]
    Ec,
    N,
    P,
    K,
}

impl Nutrient {
    pub const ALL: [Nutrient; 4] = [Nutrient::Ec, Nutrient::N, Nutrient::P, Nutrient::K];

    /// Column in the AI feed.
    pub fn key(self) -> &'static str {
        match self {
            Nutrient::Ec => "resultEC",
            Nutrient::N => "resultN",
            Nutrient::P => "resultP",
            Nutrient::K => "resultK",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Nutrient::Ec => "Salinity (EC)",
            Nutrient::N => "Nitrogen",
            Nutrient::P => "Phosphorus",
            Nutrient::K => "Potassium",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    High,
    Normal,
    Low,
}

impl Level {
    pub fn parse(raw: &str) -> Option<Level> {
        match raw.trim() {
            "มาก" => Some(Level::High),
            "ปกติ" => Some(Level::Normal),
            "น้อย" => Some(Level::Low),
            other => match other.to_ascii_lowercase().as_str() {
                "high" => Some(Level::High),
                "normal" => Some(Level::Normal),
                "low" => Some(Level::Low),
                _ => None,
            },
        }
    }
}

/// Fixed field advice for a nutrient at a given level.
pub fn advice(nutrient: Nutrient, level: Level) -> &'static str {
    match (nutrient, level) {
        (Nutrient::Ec, Level::High) => "Apply organic fertilizer, manure or compost",
        (Nutrient::Ec, Level::Normal) => "Salinity is normal",
        (Nutrient::N, Level::Normal) => "Nitrogen is normal",
        (Nutrient::N, Level::High) => "Add dry rice straw, dry rice husk or ground corn cobs",
        (Nutrient::P, Level::Normal) => "Phosphorus is normal",
        (Nutrient::P, Level::High) => "Apply dolomite lime",
        (Nutrient::K, Level::Normal) => "Potassium is normal",
        (Nutrient::K, Level::High) => "Apply biochar",
        (_, Level::Low) => "Apply more fertilizer",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub nutrient: Nutrient,
    pub level: Option<Level>,
    pub advice: &'static str,
}

/// Latest AI classification row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientReport {
    pub timestamp: String,
    pub assessments: Vec<Assessment>,
}

impl NutrientReport {
    pub fn from_reading(row: &Reading) -> Self {
        let assessments = Nutrient::ALL
            .iter()
            .map(|&nutrient| {
                let level = row
                    .field_text(nutrient.key())
                    .and_then(|text| Level::parse(&text));
                Assessment {
                    nutrient,
                    level,
                    advice: level.map(|l| advice(nutrient, l)).unwrap_or(""),
                }
            })
            .collect();
        NutrientReport {
            timestamp: row.timestamp().to_string(),
            assessments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_thai_and_english_levels() {
        assert_eq!(Level::parse("มาก"), Some(Level::High));
        assert_eq!(Level::parse(" ปกติ "), Some(Level::Normal));
        assert_eq!(Level::parse("น้อย"), Some(Level::Low));
        assert_eq!(Level::parse("LOW"), Some(Level::Low));
        assert_eq!(Level::parse("?"), None);
    }

    #[test]
    fn report_from_latest_row() {
        let row: Reading = serde_json::from_str(
            r#"{"TimeStamp":"2025-03-10 08:00:00","resultEC":"มาก","resultN":"ปกติ","resultP":"น้อย"}"#,
        )
        .unwrap();
        let report = NutrientReport::from_reading(&row);
        assert_eq!(report.timestamp, "2025-03-10 08:00:00");
        assert_eq!(report.assessments.len(), 4);
        assert_eq!(report.assessments[0].advice, "Apply organic fertilizer, manure or compost");
        assert_eq!(report.assessments[1].level, Some(Level::Normal));
        assert_eq!(report.assessments[2].advice, "Apply more fertilizer");
        assert_eq!(report.assessments[3].level, None);
        assert_eq!(report.assessments[3].advice, "");
    }
}
