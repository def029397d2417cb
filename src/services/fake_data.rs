use chrono::{Duration, NaiveDateTime, Timelike};
use log::info;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};
use std::f64::consts::PI;

use crate::client::{FeedError, FeedSource};
use crate::models::advice::Nutrient;
use crate::models::reading::{Metric, Reading, TIMESTAMP_KEY};
use crate::store::{PgProfileStore, Role, UserProfile};
use crate::timestamp::TimestampFormat;

pub const FAKE_FEED_URL: &str = "fake://sensors";
pub const FAKE_AI_FEED_URL: &str = "fake://ai";
pub const DEFAULT_SEED: u64 = 0x0FA2_4D00_5EED_0001;
pub const STEP_MINUTES: i64 = 30;
/// Longest history the generator produces, about ten years.
pub const MAX_FAKE_DAYS: i64 = 3650;

/// Synthetic station readings ending at `end`, oldest first, formatted the
/// way the spreadsheet exporter writes them (dashed timestamps, string values).
pub fn generate(end: NaiveDateTime, days: i64, step_minutes: i64, seed: u64) -> Vec<Reading> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let step = Duration::minutes(step_minutes.max(1));
    let end = align_to_step(end, step_minutes.max(1));
    let mut at = end - Duration::days(days.clamp(0, MAX_FAKE_DAYS));

    let mut readings = Vec::new();
    let mut float_on = false;
    while at <= end {
        let day_fraction = f64::from(at.num_seconds_from_midnight()) / 86_400.0;
        let air = compute_air_temp(day_fraction, &mut rng);
        let soil = air - 2.5 + rng.random_range(-0.6..=0.6);
        let air_humidity = compute_humidity(air, &mut rng);
        if rng.random_bool(0.05) {
            float_on = !float_on;
        }

        let mut row = Map::new();
        row.insert(TIMESTAMP_KEY.to_string(), Value::String(at.format("%Y-%m-%d %H:%M:%S").to_string()));
        let values = [
            (Metric::AirTemperature, air),
            (Metric::SoilTemperature, soil),
            (Metric::AirHumidity, air_humidity),
            (Metric::SoilHumidity, (air_humidity - 15.0 + rng.random_range(-4.0..=4.0)).clamp(5.0, 95.0)),
            (Metric::Nitrogen, rng.random_range(0.08..=0.35)),
            (Metric::Phosphorus, rng.random_range(0.02..=0.12)),
            (Metric::Potassium, rng.random_range(0.10..=0.45)),
            (Metric::Ph, rng.random_range(5.6..=7.4)),
            (Metric::Salinity, rng.random_range(0.05..=0.40)),
            (Metric::LightIntensity, compute_light(day_fraction, &mut rng)),
            (Metric::Pressure, 1010.0 + rng.random_range(-6.0..=6.0)),
            (Metric::WindSpeed, rng.random_range(0.0..=18.0)),
        ];
        for (metric, value) in values {
            row.insert(metric.key().to_string(), Value::String(format!("{:.2}", value)));
        }
        row.insert(Metric::FloatSwitch.key().to_string(), Value::from(u8::from(float_on)));
        readings.push(Reading(row));

        at += step;
    }
    readings
}

/// One AI classification row per day, using the Thai level words.
pub fn generate_ai(end: NaiveDateTime, days: i64, seed: u64) -> Vec<Reading> {
    let mut rng = SmallRng::seed_from_u64(seed ^ 0xA1);
    let levels = ["มาก", "ปกติ", "น้อย"];
    (0..=days.clamp(0, MAX_FAKE_DAYS))
        .rev()
        .map(|back| {
            let at = end - Duration::days(back);
            let mut row = Map::new();
            row.insert(TIMESTAMP_KEY.to_string(), Value::String(at.format("%Y-%m-%d %H:%M:%S").to_string()));
            for nutrient in Nutrient::ALL {
                let level = levels[rng.random_range(0..levels.len())];
                row.insert(nutrient.key().to_string(), Value::String(level.to_string()));
            }
            Reading(row)
        })
        .collect()
}

/// In-memory feed serving generated readings under the `fake://` URLs.
pub struct FakeFeed {
    readings: Vec<Reading>,
    ai: Vec<Reading>,
}

impl FakeFeed {
    pub fn new(end: NaiveDateTime, days: i64, seed: u64) -> Self {
        let readings = generate(end, days, STEP_MINUTES, seed);
        let ai = generate_ai(end, days, seed);
        info!(
            "Fake feed: {} reading(s) and {} AI row(s) over {} day(s) ending {}",
            readings.len(),
            ai.len(),
            days,
            end
        );
        FakeFeed { readings, ai }
    }
}

impl FeedSource for FakeFeed {
    fn fetch(&self, url: &str) -> Result<Vec<Reading>, FeedError> {
        let rows = match url {
            FAKE_FEED_URL => &self.readings,
            FAKE_AI_FEED_URL => &self.ai,
            other => return Err(FeedError::Transport(format!("fake feed has no url {}", other))),
        };
        if rows.is_empty() {
            return Err(FeedError::NoData);
        }
        Ok(rows.clone())
    }
}

/// Upsert a small demo farm: one admin and two growers pointing at the fake feed.
pub fn seed_profiles(store: &mut PgProfileStore) -> Result<usize, String> {
    let profiles = [
        UserProfile {
            uid: "demo-admin".to_string(),
            email: "admin@farm.example".to_string(),
            first_name: "Admin".to_string(),
            last_name: "Demo".to_string(),
            place_no: None,
            place_name: None,
            role: Role::Admin,
            poles: 0,
            feed_url: None,
            ai_feed_url: None,
            timestamp_format: TimestampFormat::Auto,
        },
        UserProfile {
            uid: "demo-grower-1".to_string(),
            email: "grower1@farm.example".to_string(),
            first_name: "Somchai".to_string(),
            last_name: "Farm".to_string(),
            place_no: Some("1".to_string()),
            place_name: Some("North Field".to_string()),
            role: Role::User,
            poles: 3,
            feed_url: Some(FAKE_FEED_URL.to_string()),
            ai_feed_url: Some(FAKE_AI_FEED_URL.to_string()),
            timestamp_format: TimestampFormat::Dashed,
        },
        UserProfile {
            uid: "demo-grower-2".to_string(),
            email: "grower2@farm.example".to_string(),
            first_name: "Malee".to_string(),
            last_name: "Farm".to_string(),
            place_no: Some("2".to_string()),
            place_name: Some("River Plot".to_string()),
            role: Role::User,
            poles: 2,
            feed_url: Some(FAKE_FEED_URL.to_string()),
            ai_feed_url: None,
            timestamp_format: TimestampFormat::Auto,
        },
    ];
    for profile in &profiles {
        store.upsert_profile(profile)?;
    }
    info!("Seeded {} demo profile(s)", profiles.len());
    Ok(profiles.len())
}

fn align_to_step(at: NaiveDateTime, step_minutes: i64) -> NaiveDateTime {
    let minutes = i64::from(at.hour()) * 60 + i64::from(at.minute());
    let aligned = minutes - minutes % step_minutes;
    at.date().and_time(chrono::NaiveTime::MIN) + Duration::minutes(aligned)
}

fn compute_air_temp(day_fraction: f64, rng: &mut SmallRng) -> f64 {
    let diurnal = ((day_fraction - 0.35) * 2.0 * PI).sin() * 5.5;
    let random_variation = rng.random_range(-1.2..=1.2);
    let storm = if rng.random_bool(0.02) {
        -rng.random_range(2.0..=4.0)
    } else {
        0.0
    };
    (29.0 + diurnal + random_variation + storm).clamp(18.0, 40.0)
}

fn compute_humidity(air_temp: f64, rng: &mut SmallRng) -> f64 {
    let base = 95.0 - (air_temp - 18.0) * 1.6;
    (base + rng.random_range(-5.0..=5.0)).clamp(30.0, 100.0)
}

fn compute_light(day_fraction: f64, rng: &mut SmallRng) -> f64 {
    let daylight = ((day_fraction - 0.5) * PI * 2.0).cos().max(0.0);
    let cloud_cover = rng.random_range(0.4..=1.0);
    daylight * cloud_cover * 80_000.0
}
