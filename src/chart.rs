//! Chart series for the active window and gauges for the latest reading.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

use crate::models::reading::{Metric, Reading};
use crate::view::WindowedReading;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartPanel {
    Temperature,
    Humidity,
    Nutrients,
    Ph,
    Salinity,
    Others,
}

impl ChartPanel {
    pub const ALL: [ChartPanel; 6] = [
        ChartPanel::Temperature,
        ChartPanel::Humidity,
        ChartPanel::Nutrients,
        ChartPanel::Ph,
        ChartPanel::Salinity,
        ChartPanel::Others,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ChartPanel::Temperature => "Temperature",
            ChartPanel::Humidity => "Humidity",
            ChartPanel::Nutrients => "Soil nutrients",
            ChartPanel::Ph => "pH",
            ChartPanel::Salinity => "Salinity",
            ChartPanel::Others => "Light, pressure and wind",
        }
    }

    pub fn metrics(self) -> &'static [Metric] {
        match self {
            ChartPanel::Temperature => &[Metric::AirTemperature, Metric::SoilTemperature],
            ChartPanel::Humidity => &[Metric::AirHumidity, Metric::SoilHumidity],
            ChartPanel::Nutrients => &[Metric::Nitrogen, Metric::Phosphorus, Metric::Potassium],
            ChartPanel::Ph => &[Metric::Ph],
            ChartPanel::Salinity => &[Metric::Salinity],
            ChartPanel::Others => &[Metric::LightIntensity, Metric::Pressure, Metric::WindSpeed],
        }
    }
}

/// One line: `(x, y)` pairs with x in wall-clock epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<(i64, f64)>,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Series {
    pub fn summary(&self) -> Option<SeriesSummary> {
        if self.data.is_empty() {
            return None;
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &(_, y) in &self.data {
            min = min.min(y);
            max = max.max(y);
            sum += y;
        }
        Some(SeriesSummary {
            min,
            max,
            mean: sum / self.data.len() as f64,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub panel: ChartPanel,
    pub title: &'static str,
    pub series: Vec<Series>,
}

/// Chart x-axis value. Readings are local wall-clock times, plotted as-is.
pub fn axis_millis(at: NaiveDateTime) -> i64 {
    at.and_utc().timestamp_millis()
}

pub fn build_chart(panel: ChartPanel, rows: &[WindowedReading<'_>]) -> Chart {
    let series = panel
        .metrics()
        .iter()
        .map(|&metric| Series {
            name: metric.label(),
            data: rows
                .iter()
                .map(|row| (axis_millis(row.at), row.reading.value_or_zero(metric)))
                .collect(),
        })
        .collect();
    Chart {
        panel,
        title: panel.title(),
        series,
    }
}

pub fn build_charts(rows: &[WindowedReading<'_>]) -> Vec<Chart> {
    ChartPanel::ALL.iter().map(|&panel| build_chart(panel, rows)).collect()
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SwitchState {
    On,
    Off,
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SwitchState::On => "ON",
            SwitchState::Off => "OFF",
        })
    }
}

/// Dashboard radial gauges.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Gauges {
    pub air_temperature_c: f64,
    pub soil_temperature_c: f64,
    pub air_humidity_pct: f64,
    pub soil_humidity_pct: f64,
    pub float_switch: SwitchState,
}

impl Gauges {
    pub fn from_reading(latest: &Reading) -> Self {
        let float_switch = if latest.value_or_zero(Metric::FloatSwitch) * 100.0 > 0.0 {
            SwitchState::On
        } else {
            SwitchState::Off
        };
        Gauges {
            air_temperature_c: latest.value_or_zero(Metric::AirTemperature),
            soil_temperature_c: latest.value_or_zero(Metric::SoilTemperature),
            air_humidity_pct: latest.value_or_zero(Metric::AirHumidity),
            soil_humidity_pct: latest.value_or_zero(Metric::SoilHumidity),
            float_switch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reading(json: &str) -> Reading {
        serde_json::from_str(json).unwrap()
    }

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn missing_values_plot_as_zero() {
        let a = reading(r#"{"อุณหภูมิ_c":"31.5"}"#);
        let b = reading(r#"{"อุณหภูมิดิน_c":28,"อุณหภูมิ_c":"n/a"}"#);
        let rows = [
            WindowedReading { at: at(8), reading: &a },
            WindowedReading { at: at(9), reading: &b },
        ];
        let chart = build_chart(ChartPanel::Temperature, &rows);
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].name, "Air temperature (°C)");
        assert_eq!(chart.series[0].data, vec![(axis_millis(at(8)), 31.5), (axis_millis(at(9)), 0.0)]);
        assert_eq!(chart.series[1].data[0].1, 0.0);
        assert_eq!(chart.series[1].data[1].1, 28.0);
    }

    #[test]
    fn every_panel_is_built() {
        let charts = build_charts(&[]);
        assert_eq!(charts.len(), ChartPanel::ALL.len());
        let series: usize = charts.iter().map(|c| c.series.len()).sum();
        assert_eq!(series, 12);
        assert!(charts.iter().all(|c| c.series.iter().all(|s| s.summary().is_none())));
    }

    #[test]
    fn summary_stats() {
        let s = Series {
            name: "pH".into(),
            data: vec![(0, 6.0), (1, 7.0), (2, 8.0)],
        };
        let summary = s.summary().unwrap();
        assert_eq!((summary.min, summary.max, summary.mean), (6.0, 8.0, 7.0));
    }

    #[test]
    fn axis_uses_wall_clock() {
        assert_eq!(axis_millis(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 1).unwrap()), 1000);
    }

    #[test]
    fn float_switch_gauge() {
        assert_eq!(Gauges::from_reading(&reading(r#"{"ลูกลอย":1}"#)).float_switch, SwitchState::On);
        assert_eq!(Gauges::from_reading(&reading(r#"{"ลูกลอย":"0"}"#)).float_switch, SwitchState::Off);
        let gauges = Gauges::from_reading(&reading(r#"{"ความชื้น_เปอร์เซ็นต์":"65.2"}"#));
        assert_eq!(gauges.float_switch, SwitchState::Off);
        assert_eq!(gauges.air_humidity_pct, 65.2);
        assert_eq!(gauges.air_temperature_c, 0.0);
    }
}
