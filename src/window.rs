//! Day/week/month windows over a reading list and the navigation that moves
//! them.
//!
//! Windows compare calendar dates, never elapsed time: 23:59:59 and 00:00:01
//! on consecutive days land in different day windows.

use chrono::{Datelike, Days, Local, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    #[default]
    Day,
    Week,
    Month,
}

impl FromStr for WindowMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(WindowMode::Day),
            "week" => Ok(WindowMode::Week),
            "month" => Ok(WindowMode::Month),
            other => Err(format!("unknown window mode '{}' (expected day, week or month)", other)),
        }
    }
}

impl fmt::Display for WindowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WindowMode::Day => "day",
            WindowMode::Week => "week",
            WindowMode::Month => "month",
        })
    }
}

/// Inclusive date bounds derived from a mode and an anchor date.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Window {
    pub mode: WindowMode,
    pub anchor: NaiveDate,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    pub fn new(mode: WindowMode, anchor: NaiveDate) -> Self {
        let (start, end) = match mode {
            WindowMode::Day => (anchor, anchor),
            WindowMode::Week => {
                let start = week_start(anchor);
                (start, start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX))
            }
            WindowMode::Month => month_bounds(anchor),
        };
        Window {
            mode,
            anchor,
            start,
            end,
        }
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn contains(&self, at: &NaiveDateTime) -> bool {
        self.contains_date(at.date())
    }

    /// Human-readable title, e.g. `10 Mar - 16 Mar 2025`.
    pub fn label(&self) -> String {
        match self.mode {
            WindowMode::Day => self.anchor.format("%-d %B %Y").to_string(),
            WindowMode::Week => format!("{} - {}", self.start.format("%-d %b"), self.end.format("%-d %b %Y")),
            WindowMode::Month => self.anchor.format("%B %Y").to_string(),
        }
    }

    /// Identifier used in export file names.
    pub fn id(&self) -> String {
        match self.mode {
            WindowMode::Day => self.anchor.format("%d-%m-%Y").to_string(),
            WindowMode::Week => format!("{}_{}", self.start.format("%d-%m-%Y"), self.end.format("%d-%m-%Y")),
            WindowMode::Month => self.anchor.format("%m-%Y").to_string(),
        }
    }
}

/// Monday on or before `anchor`.
pub fn week_start(anchor: NaiveDate) -> NaiveDate {
    let back = anchor.weekday().num_days_from_monday();
    anchor.checked_sub_days(Days::new(u64::from(back))).unwrap_or(NaiveDate::MIN)
}

/// First and last calendar day of the anchor's month.
pub fn month_bounds(anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = anchor.with_day(1).unwrap_or(anchor);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(anchor);
    (first, last)
}

/// Source of the current time. Navigation clamps against it.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Local wall-clock time of the host.
#[derive(Debug, Copy, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Copy, Clone)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Current window plus the navigation actions the dashboard exposes.
///
/// There is deliberately no forward week/month step; forward stepping is
/// per day and never passes today.
#[derive(Debug, Clone)]
pub struct Navigator<C: Clock = SystemClock> {
    clock: C,
    window: Window,
}

impl<C: Clock> Navigator<C> {
    /// Start at today in the given mode.
    pub fn new(clock: C, mode: WindowMode) -> Self {
        let today = clock.today();
        Navigator {
            clock,
            window: Window::new(mode, today),
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn show(&mut self, mode: WindowMode, anchor: NaiveDate) {
        self.window = Window::new(mode, anchor);
    }

    pub fn prev_day(&mut self) {
        if let Some(anchor) = self.window.anchor.pred_opt() {
            self.show(WindowMode::Day, anchor);
        }
    }

    pub fn prev_week(&mut self) {
        if let Some(anchor) = self.window.anchor.checked_sub_days(Days::new(7)) {
            self.show(WindowMode::Week, anchor);
        }
    }

    /// Day of month clamps to the target month's length (31 Mar -> 28/29 Feb).
    pub fn prev_month(&mut self) {
        if let Some(anchor) = self.window.anchor.checked_sub_months(Months::new(1)) {
            self.show(WindowMode::Month, anchor);
        }
    }

    /// Advance one day. Rejected, returning `false`, when that would pass today.
    pub fn next_day(&mut self) -> bool {
        let Some(anchor) = self.window.anchor.succ_opt() else {
            return false;
        };
        if anchor > self.clock.today() {
            return false;
        }
        self.show(WindowMode::Day, anchor);
        true
    }

    pub fn current_day(&mut self) {
        self.show(WindowMode::Day, self.clock.today());
    }

    pub fn current_week(&mut self) {
        self.show(WindowMode::Week, self.clock.today());
    }

    pub fn current_month(&mut self) {
        self.show(WindowMode::Month, self.clock.today());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clock_at(y: i32, m: u32, d: u32) -> FixedClock {
        FixedClock(date(y, m, d).and_hms_opt(9, 30, 0).unwrap())
    }

    #[test]
    fn week_starts_monday_and_spans_seven_days() {
        let mut anchor = date(2024, 12, 20);
        let stop = date(2025, 3, 20);
        while anchor <= stop {
            let w = Window::new(WindowMode::Week, anchor);
            assert_eq!(w.start.weekday(), Weekday::Mon, "anchor {}", anchor);
            assert_eq!(w.end, w.start + Days::new(6));
            assert!(w.contains_date(anchor));
            anchor = anchor.succ_opt().unwrap();
        }
    }

    #[test]
    fn sunday_maps_back_to_previous_monday() {
        let w = Window::new(WindowMode::Week, date(2025, 3, 16));
        assert_eq!(w.start, date(2025, 3, 10));
        assert_eq!(w.end, date(2025, 3, 16));
    }

    #[test]
    fn month_end_is_computed() {
        assert_eq!(Window::new(WindowMode::Month, date(2024, 2, 10)).end, date(2024, 2, 29));
        assert_eq!(Window::new(WindowMode::Month, date(2025, 2, 10)).end, date(2025, 2, 28));
        assert_eq!(Window::new(WindowMode::Month, date(1900, 2, 1)).end, date(1900, 2, 28));
        assert_eq!(Window::new(WindowMode::Month, date(2000, 2, 1)).end, date(2000, 2, 29));
        assert_eq!(Window::new(WindowMode::Month, date(2025, 4, 30)).end, date(2025, 4, 30));
        let dec = Window::new(WindowMode::Month, date(2025, 12, 31));
        assert_eq!((dec.start, dec.end), (date(2025, 12, 1), date(2025, 12, 31)));
    }

    #[test]
    fn day_window_splits_on_calendar_date() {
        let w = Window::new(WindowMode::Day, date(2025, 3, 10));
        let late = date(2025, 3, 10).and_hms_opt(23, 59, 59).unwrap();
        let early_next = date(2025, 3, 11).and_hms_opt(0, 0, 1).unwrap();
        assert!(w.contains(&late));
        assert!(!w.contains(&early_next));
        assert!(!Window::new(WindowMode::Day, date(2025, 3, 11)).contains(&late));
    }

    #[test]
    fn labels_and_ids() {
        let day = Window::new(WindowMode::Day, date(2025, 3, 10));
        assert_eq!(day.label(), "10 March 2025");
        assert_eq!(day.id(), "10-03-2025");

        let week = Window::new(WindowMode::Week, date(2025, 3, 12));
        assert_eq!(week.label(), "10 Mar - 16 Mar 2025");
        assert_eq!(week.id(), "10-03-2025_16-03-2025");

        let month = Window::new(WindowMode::Month, date(2025, 3, 12));
        assert_eq!(month.label(), "March 2025");
        assert_eq!(month.id(), "03-2025");
    }

    #[test]
    fn forward_step_never_passes_today() {
        let mut nav = Navigator::new(clock_at(2025, 3, 10), WindowMode::Day);
        assert!(!nav.next_day());
        assert_eq!(nav.window().anchor, date(2025, 3, 10));

        nav.prev_day();
        nav.prev_day();
        assert!(nav.next_day());
        assert!(nav.next_day());
        assert!(!nav.next_day());
        assert_eq!(nav.window().anchor, date(2025, 3, 10));
    }

    #[test]
    fn backward_steps_switch_mode() {
        let mut nav = Navigator::new(clock_at(2025, 3, 31), WindowMode::Day);
        nav.prev_week();
        assert_eq!(nav.window().mode, WindowMode::Week);
        assert_eq!(nav.window().anchor, date(2025, 3, 24));

        nav.prev_month();
        assert_eq!(nav.window().mode, WindowMode::Month);
        assert_eq!(nav.window().anchor, date(2025, 2, 24));

        nav.prev_day();
        assert_eq!(nav.window().mode, WindowMode::Day);
        assert_eq!(nav.window().anchor, date(2025, 2, 23));
    }

    #[test]
    fn month_step_clamps_day_of_month() {
        let mut nav = Navigator::new(clock_at(2024, 3, 31), WindowMode::Month);
        nav.prev_month();
        assert_eq!(nav.window().anchor, date(2024, 2, 29));
        assert_eq!(nav.window().end, date(2024, 2, 29));
    }

    #[test]
    fn jump_to_current_resets_anchor() {
        let mut nav = Navigator::new(clock_at(2025, 3, 12), WindowMode::Day);
        nav.prev_month();
        nav.current_week();
        assert_eq!(nav.window().mode, WindowMode::Week);
        assert_eq!(nav.window().start, date(2025, 3, 10));
        nav.current_month();
        assert_eq!(nav.window().start, date(2025, 3, 1));
        nav.current_day();
        assert_eq!(nav.window().anchor, date(2025, 3, 12));
        assert_eq!(nav.window().mode, WindowMode::Day);
    }

    #[test]
    fn mode_names_parse() {
        assert_eq!("Week".parse::<WindowMode>(), Ok(WindowMode::Week));
        assert!("year".parse::<WindowMode>().is_err());
    }

    #[test]
    fn week_at_end_of_calendar_is_truncated() {
        let week = Window::new(WindowMode::Week, NaiveDate::MAX);
        assert_eq!(week.end, NaiveDate::MAX);
        assert!(week.start <= NaiveDate::MAX);
        assert!(week.contains_date(NaiveDate::MAX));
        let first = Window::new(WindowMode::Week, NaiveDate::MIN);
        assert!(first.contains_date(NaiveDate::MIN));
    }
}
