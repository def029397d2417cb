//! Timestamp parsing for feed readings.
//!
//! Upstream exporters have written at least three layouts over time and the
//! feed carries no marker saying which one a row uses. Parsing never fails:
//! anything unreadable becomes the caller-supplied "now" so windows can
//! always compare dates.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;
use std::fmt;
use std::str::FromStr;

/// Which layout a feed writes. `Auto` keeps the historical heuristic.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TimestampFormat {
    #[default]
    Auto,
    /// `YYYY-MM-DD HH:MM[:SS]`
    Dashed,
    /// `MM/DD/YYYY, HH:MM`
    MonthFirst,
    /// `DD/MM/YYYY, HH:MM`
    DayFirst,
}

impl FromStr for TimestampFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(TimestampFormat::Auto),
            "dashed" => Ok(TimestampFormat::Dashed),
            "month-first" | "mdy" => Ok(TimestampFormat::MonthFirst),
            "day-first" | "dmy" => Ok(TimestampFormat::DayFirst),
            other => Err(format!(
                "unknown timestamp format '{}' (expected auto, dashed, month-first or day-first)",
                other
            )),
        }
    }
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimestampFormat::Auto => "auto",
            TimestampFormat::Dashed => "dashed",
            TimestampFormat::MonthFirst => "month-first",
            TimestampFormat::DayFirst => "day-first",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum SlashOrder {
    Infer,
    MonthFirst,
    DayFirst,
}

const GENERIC_LAYOUTS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Parse a reading timestamp into local wall-clock time.
pub fn parse_timestamp(raw: &str, format: TimestampFormat, now: NaiveDateTime) -> NaiveDateTime {
    let cleaned = raw.replace('\'', "");
    let ts = cleaned.trim();
    if ts.is_empty() {
        return now;
    }

    let layout = match format {
        TimestampFormat::Auto => parse_dashed(ts).or_else(|| parse_slashed(ts, SlashOrder::Infer)),
        TimestampFormat::Dashed => parse_dashed(ts),
        TimestampFormat::MonthFirst => parse_slashed(ts, SlashOrder::MonthFirst),
        TimestampFormat::DayFirst => parse_slashed(ts, SlashOrder::DayFirst),
    };

    layout.or_else(|| parse_generic(ts)).unwrap_or_else(|| {
        debug!("Timestamp: unreadable value {:?}; using current time", raw);
        now
    })
}

fn number<T: FromStr>(s: &str) -> Option<T> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_clock(text: &str) -> Option<NaiveTime> {
    let mut parts = text.split(':');
    let hour = number(parts.next()?)?;
    let minute = number(parts.next()?)?;
    let second = match parts.next() {
        Some(s) => number(s)?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }
    NaiveTime::from_hms_opt(hour, minute, second)
}

fn parse_dashed(ts: &str) -> Option<NaiveDateTime> {
    let mut tokens = ts.split_whitespace();
    let date = tokens.next()?;
    let time = tokens.next();
    if tokens.next().is_some() {
        return None;
    }

    let mut fields = date.split('-');
    let year = number(fields.next()?)?;
    let month = number(fields.next()?)?;
    let day = number(fields.next()?)?;
    if fields.next().is_some() {
        return None;
    }

    let time = match time {
        Some(t) => parse_clock(t)?,
        None => NaiveTime::MIN,
    };
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.and_time(time))
}

fn parse_slashed(ts: &str, order: SlashOrder) -> Option<NaiveDateTime> {
    let (date, time) = ts.split_once(',')?;

    let mut fields = date.trim().split('/');
    let a: u32 = number(fields.next()?)?;
    let b: u32 = number(fields.next()?)?;
    let year: i32 = number(fields.next()?)?;
    if fields.next().is_some() {
        return None;
    }

    let time = match time.trim() {
        "" => NaiveTime::MIN,
        t => parse_clock(t)?,
    };

    let (month, day) = match order {
        SlashOrder::Infer if a > 12 => (b, a),
        SlashOrder::Infer => {
            if b <= 12 && a != b {
                debug!("Timestamp: {:?} could be day-first or month-first; reading it month-first", ts);
            }
            (a, b)
        }
        SlashOrder::MonthFirst => (a, b),
        SlashOrder::DayFirst => (b, a),
    };
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.and_time(time))
}

fn parse_generic(ts: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(ts) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    GENERIC_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(ts, layout).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(ts, "%Y/%m/%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}
