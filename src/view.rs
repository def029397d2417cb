//! The fetched reading list and the window currently shown over it.
//!
//! Readings are immutable for the lifetime of a view; every navigation step
//! recomputes the active subset and swaps it in with a single assignment.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;

use crate::models::reading::{Metric, Reading};
use crate::timestamp::{TimestampFormat, parse_timestamp};
use crate::window::{Clock, Navigator, SystemClock, Window, WindowMode};

/// A reading in the active window together with its parsed timestamp.
#[derive(Debug, Copy, Clone)]
pub struct WindowedReading<'a> {
    pub at: NaiveDateTime,
    pub reading: &'a Reading,
}

/// One entry of the month picker on the table page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthOption {
    pub year: i32,
    pub month: u32,
    /// `MM-YYYY`
    pub value: String,
    /// `Mar 2025`
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// `DD/MM/YYYY HH:MM`
    pub when: String,
    pub cells: Vec<String>,
}

pub fn format_display_date(at: NaiveDateTime) -> String {
    at.format("%d/%m/%Y %H:%M").to_string()
}

pub struct FeedView<C: Clock = SystemClock> {
    readings: Vec<Reading>,
    instants: Vec<NaiveDateTime>,
    navigator: Navigator<C>,
    active: Vec<usize>,
}

impl<C: Clock> FeedView<C> {
    /// Parse every timestamp once and open a day window on today.
    pub fn new(readings: Vec<Reading>, format: TimestampFormat, clock: C) -> Self {
        let now = clock.now();
        let instants = readings
            .iter()
            .map(|r| parse_timestamp(r.timestamp(), format, now))
            .collect();
        let mut view = FeedView {
            readings,
            instants,
            navigator: Navigator::new(clock, WindowMode::Day),
            active: Vec::new(),
        };
        view.refilter();
        view
    }

    fn refilter(&mut self) {
        let window = *self.navigator.window();
        let active = self
            .instants
            .iter()
            .enumerate()
            .filter(|(_, at)| window.contains(at))
            .map(|(index, _)| index)
            .collect();
        self.active = active;
    }

    pub fn window(&self) -> &Window {
        self.navigator.window()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Active window in feed order.
    pub fn active(&self) -> impl Iterator<Item = WindowedReading<'_>> + '_ {
        self.active.iter().map(|&i| WindowedReading {
            at: self.instants[i],
            reading: &self.readings[i],
        })
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn active_readings(&self) -> Vec<&Reading> {
        self.active.iter().map(|&i| &self.readings[i]).collect()
    }

    /// Table ordering: newest first, feed order among equal timestamps.
    pub fn active_newest_first(&self) -> Vec<WindowedReading<'_>> {
        let mut rows: Vec<_> = self.active().collect();
        rows.sort_by(|a, b| b.at.cmp(&a.at));
        rows
    }

    pub fn table_rows(&self) -> Vec<TableRow> {
        self.active_newest_first()
            .into_iter()
            .map(|row| TableRow {
                when: format_display_date(row.at),
                cells: Metric::ALL
                    .iter()
                    .map(|m| row.reading.field_text(m.key()).unwrap_or_default())
                    .collect(),
            })
            .collect()
    }

    /// The feed's last row, which the dashboard treats as "latest".
    pub fn latest(&self) -> Option<WindowedReading<'_>> {
        let index = self.readings.len().checked_sub(1)?;
        Some(WindowedReading {
            at: self.instants[index],
            reading: &self.readings[index],
        })
    }

    /// Distinct months present in the whole feed, newest first.
    pub fn available_months(&self) -> Vec<MonthOption> {
        let months: BTreeSet<(i32, u32)> = self.instants.iter().map(|at| (at.year(), at.month())).collect();
        months
            .into_iter()
            .rev()
            .filter_map(|(year, month)| {
                let first = NaiveDate::from_ymd_opt(year, month, 1)?;
                Some(MonthOption {
                    year,
                    month,
                    value: format!("{:02}-{}", month, year),
                    label: first.format("%b %Y").to_string(),
                })
            })
            .collect()
    }

    /// Month window on the newest month with data; current month when the feed is empty.
    pub fn show_latest_month(&mut self) {
        match self
            .available_months()
            .first()
            .and_then(|m| NaiveDate::from_ymd_opt(m.year, m.month, 1))
        {
            Some(anchor) => self.show(WindowMode::Month, anchor),
            None => self.current_month(),
        }
    }

    pub fn show(&mut self, mode: WindowMode, anchor: NaiveDate) {
        self.navigator.show(mode, anchor);
        self.refilter();
    }

    pub fn prev_day(&mut self) {
        self.navigator.prev_day();
        self.refilter();
    }

    pub fn prev_week(&mut self) {
        self.navigator.prev_week();
        self.refilter();
    }

    pub fn prev_month(&mut self) {
        self.navigator.prev_month();
        self.refilter();
    }

    /// Returns `false` and leaves the window untouched when the step would pass today.
    pub fn next_day(&mut self) -> bool {
        if !self.navigator.next_day() {
            return false;
        }
        self.refilter();
        true
    }

    pub fn current_day(&mut self) {
        self.navigator.current_day();
        self.refilter();
    }

    pub fn current_week(&mut self) {
        self.navigator.current_week();
        self.refilter();
    }

    pub fn current_month(&mut self) {
        self.navigator.current_month();
        self.refilter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::FixedClock;

    fn readings(json: &str) -> Vec<Reading> {
        serde_json::from_str(json).expect("valid readings")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn view_at(json: &str, today: NaiveDate) -> FeedView<FixedClock> {
        let clock = FixedClock(today.and_hms_opt(12, 0, 0).unwrap());
        FeedView::new(readings(json), TimestampFormat::Auto, clock)
    }

    const TWO_PH: &str = r#"[
        {"TimeStamp":"2025-03-10 08:00:00","PH":"6.5"},
        {"TimeStamp":"2025-03-10 20:00:00","PH":"6.8"}
    ]"#;

    #[test]
    fn day_window_over_feed() {
        let mut view = view_at(TWO_PH, date(2025, 3, 20));
        view.show(WindowMode::Day, date(2025, 3, 10));
        assert_eq!(view.active_len(), 2);
        view.show(WindowMode::Day, date(2025, 3, 11));
        assert_eq!(view.active_len(), 0);
    }

    #[test]
    fn midnight_neighbours_never_share_a_day() {
        let json = r#"[
            {"TimeStamp":"2025-03-10 23:59:59"},
            {"TimeStamp":"2025-03-11 00:00:01"}
        ]"#;
        let mut view = view_at(json, date(2025, 3, 20));
        view.show(WindowMode::Day, date(2025, 3, 10));
        assert_eq!(view.active_len(), 1);
        view.show(WindowMode::Day, date(2025, 3, 11));
        assert_eq!(view.active_len(), 1);
        view.show(WindowMode::Week, date(2025, 3, 11));
        assert_eq!(view.active_len(), 2);
    }

    #[test]
    fn opens_on_today_and_navigates() {
        let json = r#"[
            {"TimeStamp":"2025-03-09 10:00:00"},
            {"TimeStamp":"2025-03-10 10:00:00"},
            {"TimeStamp":"06/19/2025, 00:35"},
            {"TimeStamp":"2025-03-10 11:00:00"}
        ]"#;
        let mut view = view_at(json, date(2025, 3, 10));
        assert_eq!(view.window().anchor, date(2025, 3, 10));
        assert_eq!(view.active_len(), 2);

        assert!(!view.next_day());
        assert_eq!(view.active_len(), 2);

        view.prev_day();
        assert_eq!(view.active_len(), 1);
        assert!(view.next_day());
        assert_eq!(view.active_len(), 2);

        view.current_month();
        assert_eq!(view.active_len(), 3);
        view.prev_month();
        assert_eq!(view.active_len(), 0);
    }

    #[test]
    fn duplicates_are_preserved_in_order() {
        let json = r#"[
            {"TimeStamp":"2025-03-10 08:00:00","PH":"1"},
            {"TimeStamp":"2025-03-10 08:00:00","PH":"2"}
        ]"#;
        let view = view_at(json, date(2025, 3, 10));
        let ph: Vec<f64> = view.active().map(|r| r.reading.value_or_zero(Metric::Ph)).collect();
        assert_eq!(ph, vec![1.0, 2.0]);
        let newest: Vec<f64> = view
            .active_newest_first()
            .iter()
            .map(|r| r.reading.value_or_zero(Metric::Ph))
            .collect();
        assert_eq!(newest, vec![1.0, 2.0]);
    }

    #[test]
    fn unparseable_rows_land_on_today() {
        let json = r#"[{"TimeStamp":"garbage"},{"PH":"7"}]"#;
        let view = view_at(json, date(2025, 3, 10));
        assert_eq!(view.active_len(), 2);
    }

    #[test]
    fn month_options_newest_first() {
        let json = r#"[
            {"TimeStamp":"2024-12-31 10:00:00"},
            {"TimeStamp":"2025-02-01 10:00:00"},
            {"TimeStamp":"2025-01-15 10:00:00"},
            {"TimeStamp":"2025-02-03 10:00:00"}
        ]"#;
        let mut view = view_at(json, date(2025, 6, 1));
        let values: Vec<String> = view.available_months().into_iter().map(|m| m.value).collect();
        assert_eq!(values, vec!["02-2025", "01-2025", "12-2024"]);
        assert_eq!(view.available_months()[0].label, "Feb 2025");

        view.show_latest_month();
        assert_eq!(view.window().mode, WindowMode::Month);
        assert_eq!(view.window().start, date(2025, 2, 1));
        assert_eq!(view.active_len(), 2);
    }

    #[test]
    fn table_rows_are_newest_first() {
        let json = r#"[
            {"TimeStamp":"2025-03-10 08:05:00","PH":"6.5"},
            {"TimeStamp":"2025-03-10 20:00:00","PH":"6.8"}
        ]"#;
        let view = view_at(json, date(2025, 3, 10));
        let rows = view.table_rows();
        assert_eq!(rows[0].when, "10/03/2025 20:00");
        assert_eq!(rows[1].when, "10/03/2025 08:05");
        let ph_column = Metric::ALL.iter().position(|m| *m == Metric::Ph).unwrap();
        assert_eq!(rows[0].cells[ph_column], "6.8");
        assert_eq!(rows[0].cells[0], "");
    }

    #[test]
    fn latest_is_last_feed_row() {
        let view = view_at(TWO_PH, date(2025, 3, 10));
        let latest = view.latest().unwrap();
        assert_eq!(latest.reading.value(Metric::Ph), Some(6.8));
        let empty = view_at("[]", date(2025, 3, 10));
        assert!(empty.latest().is_none());
    }

    #[test]
    fn fixture_feed_windows() {
        let body = std::fs::read_to_string("tests/data/feed.json").unwrap();
        let clock = FixedClock(date(2025, 4, 2).and_hms_opt(9, 0, 0).unwrap());
        let mut view = FeedView::new(crate::client::decode_feed(&body).unwrap(), TimestampFormat::Auto, clock);
        assert_eq!(view.len(), 5);
        assert_eq!(view.active_len(), 0);

        view.show(WindowMode::Day, date(2025, 3, 10));
        assert_eq!(view.active_len(), 2);
        view.show(WindowMode::Week, date(2025, 3, 10));
        assert_eq!(view.active_len(), 3);
        view.show_latest_month();
        assert_eq!(view.window().label(), "April 2025");
        assert_eq!(view.active_len(), 1);
        view.prev_month();
        assert_eq!(view.active_len(), 4);
        assert_eq!(view.latest().unwrap().reading.value(Metric::Ph), Some(6.9));
    }
}
