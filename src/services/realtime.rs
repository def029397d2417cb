use chrono::NaiveDateTime;
use log::{info, warn};
use std::thread;
use std::time::{Duration, Instant};

use crate::chart::Gauges;
use crate::client::{FeedError, FeedSource, FeedTarget};
use crate::models::advice::NutrientReport;
use crate::timestamp::parse_timestamp;
use crate::utils::serde_enum_name;
use crate::window::Clock;

/// What the dashboard header shows after one poll.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub reading_time: NaiveDateTime,
    pub reading_count: usize,
    pub gauges: Gauges,
    pub nutrients: Option<NutrientReport>,
}

/// Latest AI classification, or `None` when there is no AI feed or it failed.
pub fn fetch_nutrients<S: FeedSource + ?Sized>(source: &S, target: &FeedTarget) -> Option<NutrientReport> {
    let url = target.ai_url.as_deref()?;
    match source.fetch(url) {
        Ok(rows) => rows.last().map(NutrientReport::from_reading),
        Err(e) => {
            warn!("AI feed unavailable: {}", e);
            None
        }
    }
}

pub fn poll_once<S, C>(source: &S, target: &FeedTarget, clock: &C) -> Result<Snapshot, FeedError>
where
    S: FeedSource + ?Sized,
    C: Clock,
{
    let readings = source.fetch(&target.url)?;
    let latest = readings.last().ok_or(FeedError::NoData)?;
    Ok(Snapshot {
        reading_time: parse_timestamp(latest.timestamp(), target.format, clock.now()),
        reading_count: readings.len(),
        gauges: Gauges::from_reading(latest),
        nutrients: fetch_nutrients(source, target),
    })
}

fn log_snapshot(snapshot: &Snapshot) {
    let g = &snapshot.gauges;
    info!(
        "Watch: {} reading(s), latest {} | air {:.1}°C {:.1}% | soil {:.1}°C {:.1}% | float switch {}",
        snapshot.reading_count,
        snapshot.reading_time.format("%d/%m/%Y %H:%M"),
        g.air_temperature_c,
        g.air_humidity_pct,
        g.soil_temperature_c,
        g.soil_humidity_pct,
        g.float_switch
    );
    if let Some(report) = &snapshot.nutrients {
        log_nutrient_report(report);
    }
}

pub fn log_nutrient_report(report: &NutrientReport) {
    for a in &report.assessments {
        match a.level {
            Some(level) => info!(
                "Nutrients: {} is {} ({}): {}",
                a.nutrient.name(),
                serde_enum_name(&level).unwrap_or_default(),
                report.timestamp,
                a.advice
            ),
            None => info!("Nutrients: {} has no assessment", a.nutrient.name()),
        }
    }
}

/// Poll at a steady cadence. Feed errors are logged and the loop carries on.
/// Runs forever unless `max_ticks` is set; returns the number of successful polls.
pub fn run_loop<S, C>(source: &S, target: &FeedTarget, clock: &C, interval: Duration, max_ticks: Option<u64>) -> u64
where
    S: FeedSource + ?Sized,
    C: Clock,
{
    let mut ticks = 0u64;
    let mut ok = 0u64;
    loop {
        let tick_start = Instant::now();

        match poll_once(source, target, clock) {
            Ok(snapshot) => {
                log_snapshot(&snapshot);
                ok += 1;
            }
            Err(e) => warn!("Watch: {} ({})", e.user_message(), e),
        }

        ticks += 1;
        if max_ticks.is_some_and(|max| ticks >= max) {
            return ok;
        }

        // Maintain steady cadence
        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}
