pub mod models {
    pub mod advice;
    pub mod reading;
}

pub mod chart;
pub mod client;
pub mod config;
pub mod db {
    pub mod models;
}
pub mod export;
pub mod pins;
pub mod schema;
pub mod store;
pub mod timestamp;
pub mod utils;
pub mod view;
pub mod window;
pub mod services {
    pub mod fake_data;
    pub mod loader;
    pub mod realtime;
}

use crate::chart::{Gauges, build_charts};
use crate::client::{FeedClient, FeedSource, FeedTarget};
use crate::config::{Config, load_env_file};
use crate::export::{export_window, write_export};
use crate::pins::pins_for_users;
use crate::services::fake_data::{self, DEFAULT_SEED, FAKE_AI_FEED_URL, FAKE_FEED_URL, FakeFeed};
use crate::services::loader::{FeedLoader, LoadState};
use crate::services::realtime;
use crate::store::{PgProfileStore, ProfileStore, Role};
use crate::timestamp::TimestampFormat;
use crate::utils::serde_enum_name;
use crate::view::{FeedView, WindowedReading};
use crate::window::{Clock, SystemClock, WindowMode};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Report,
    Watch,
    Pins,
    Pin { uid: String, pole: u32, x: f64, y: f64 },
    Seed,
}

#[derive(Debug, PartialEq)]
struct Cli {
    env_file: Option<PathBuf>,
    command: Command,
}

#[derive(Debug)]
struct LoadedEnvFile {
    path: PathBuf,
    explicit: bool,
    applied: usize,
}

const USAGE: &str = "usage: farm-monitor [--env-file PATH] [report | watch | pins | pin UID POLE X Y | seed]";

fn parse_cli<I>(args: I) -> Result<Cli, String>
where
    I: IntoIterator<Item = String>,
{
    let mut env_file: Option<PathBuf> = None;
    let mut positional: Vec<String> = Vec::new();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let path = if arg == "--env-file" {
            Some(args.next().ok_or_else(|| "`--env-file` requires a path argument".to_string())?)
        } else {
            arg.strip_prefix("--env-file=").map(str::to_string)
        };
        match path {
            Some(p) if p.is_empty() => return Err("`--env-file` requires a path argument".to_string()),
            Some(_) if env_file.is_some() => return Err("`--env-file` provided more than once".to_string()),
            Some(p) => env_file = Some(PathBuf::from(p)),
            None if arg.starts_with("--") => return Err(format!("unrecognised argument: {}\n{}", arg, USAGE)),
            None => positional.push(arg),
        }
    }

    let command = match positional.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["report"] => Command::Report,
        ["watch"] => Command::Watch,
        ["pins"] => Command::Pins,
        ["seed"] => Command::Seed,
        ["pin", uid, pole, x, y] => Command::Pin {
            uid: uid.to_string(),
            pole: pole.parse().map_err(|_| format!("invalid pole number: {}", pole))?,
            x: x.parse().map_err(|_| format!("invalid x position: {}", x))?,
            y: y.parse().map_err(|_| format!("invalid y position: {}", y))?,
        },
        other => return Err(format!("unrecognised command: {}\n{}", other.join(" "), USAGE)),
    };
    Ok(Cli { env_file, command })
}

fn configure_env(env_file: Option<PathBuf>) -> Result<Option<LoadedEnvFile>, String> {
    let (path, explicit) = match env_file {
        Some(path) if path.is_file() => (path, true),
        Some(path) => return Err(format!("env file not found: {}", path.display())),
        None => {
            let cwd = std::env::current_dir().map_err(|e| format!("unable to read current directory: {}", e))?;
            let path = cwd.join(".env");
            if !path.is_file() {
                return Ok(None);
            }
            (path, false)
        }
    };
    let applied = load_env_file(&path)?;
    Ok(Some(LoadedEnvFile { path, explicit, applied }))
}

fn feed_source(cfg: &Config) -> Arc<dyn FeedSource> {
    if cfg.fake_data {
        Arc::new(FakeFeed::new(SystemClock.now(), cfg.fake_days, DEFAULT_SEED))
    } else {
        Arc::new(FeedClient::new(cfg.feed_timeout, cfg.feed_max_bytes))
    }
}

/// Direct feed override, then the fake feed, then the configured user's profile.
/// The fake feed only serves its own URLs, so it wins over any profile.
fn resolve_target(cfg: &Config) -> Result<FeedTarget, String> {
    if let Some(feed) = &cfg.feed {
        info!("Using feed from FEED_URL");
        return Ok(feed.clone());
    }
    if cfg.fake_data {
        return Ok(FeedTarget {
            url: FAKE_FEED_URL.to_string(),
            ai_url: Some(FAKE_AI_FEED_URL.to_string()),
            format: TimestampFormat::Dashed,
        });
    }
    let Some(uid) = cfg.user_id.as_deref() else {
        return Err("No feed configured: set FEED_URL, FARM_USER_ID or FAKE_DATA=1".to_string());
    };

    let mut store = PgProfileStore::connect(&cfg.database_url)?;
    let profile = store
        .get_profile(uid)?
        .ok_or_else(|| format!("No profile found for user {}", uid))?;
    info!(
        "Showing feed of {} ({}, timestamps {})",
        profile.display_name(),
        profile.place_name.as_deref().unwrap_or("no place"),
        profile.timestamp_format
    );
    profile
        .feed_target()
        .ok_or_else(|| format!("User {} has no feed configured", uid))
}

fn report(cfg: &Config) -> Result<(), String> {
    let source = feed_source(cfg);
    let target = resolve_target(cfg)?;

    let mut loader = FeedLoader::new(Arc::clone(&source));
    loader.select(&target.url)?;
    loader.wait(cfg.feed_timeout + Duration::from_secs(5));
    let readings = match loader.take() {
        LoadState::Ready(readings) => readings,
        LoadState::Failed(e) => {
            error!("{} ({})", e.user_message(), e);
            return Ok(());
        }
        LoadState::Loading | LoadState::Idle => {
            loader.cancel();
            error!("Could not reach the data feed (no answer within {:?})", cfg.feed_timeout);
            return Ok(());
        }
    };

    let mut view = FeedView::new(readings, target.format, SystemClock);
    match (cfg.window_mode, cfg.window_anchor) {
        (mode, Some(anchor)) => view.show(mode, anchor),
        (WindowMode::Month, None) => view.show_latest_month(),
        (WindowMode::Week, None) => view.current_week(),
        (WindowMode::Day, None) => view.current_day(),
    }
    let window = *view.window();
    info!(
        "Window: {} ({} of {} reading(s))",
        window.label(),
        view.active_len(),
        view.len()
    );
    let months = view.available_months();
    info!(
        "Months with data: {}",
        months.iter().map(|m| m.label.as_str()).collect::<Vec<_>>().join(", ")
    );

    if let Some(latest) = view.latest() {
        let g = Gauges::from_reading(latest.reading);
        info!(
            "Latest ({}): air {:.1}°C {:.1}% | soil {:.1}°C {:.1}% | float switch {}",
            latest.at.format("%d/%m/%Y %H:%M"),
            g.air_temperature_c,
            g.air_humidity_pct,
            g.soil_temperature_c,
            g.soil_humidity_pct,
            g.float_switch
        );
    }
    if let Some(nutrients) = realtime::fetch_nutrients(source.as_ref(), &target) {
        realtime::log_nutrient_report(&nutrients);
    }

    let rows: Vec<WindowedReading<'_>> = view.active().collect();
    let charts = build_charts(&rows);
    for chart in &charts {
        for series in &chart.series {
            if let Some(s) = series.summary() {
                info!(
                    "Chart {}: {} min {:.2} max {:.2} mean {:.2}",
                    serde_enum_name(&chart.panel).unwrap_or_default(),
                    series.name,
                    s.min,
                    s.max,
                    s.mean
                );
            }
        }
    }

    for row in view.table_rows() {
        println!("{}\t{}", row.when, row.cells.join("\t"));
    }

    match export_window(&window, &view.active_readings())? {
        Some(export) => {
            write_export(&cfg.export_dir, &export)?;
            let chart_path = cfg.export_dir.join(format!("chart_{}.json", window.id()));
            let json = serde_json::to_string_pretty(&charts).map_err(|e| format!("serialize charts failed: {}", e))?;
            std::fs::write(&chart_path, json).map_err(|e| format!("write {} failed: {}", chart_path.display(), e))?;
            info!("Export: wrote {}", chart_path.display());
        }
        None => info!("Export: no readings in {}, nothing written", window.label()),
    }
    Ok(())
}

fn watch(cfg: &Config) -> Result<(), String> {
    let source = feed_source(cfg);
    let target = resolve_target(cfg)?;
    info!("Starting watch loop: interval={}s", cfg.watch_interval.as_secs());
    realtime::run_loop(source.as_ref(), &target, &SystemClock, cfg.watch_interval, None);
    Ok(())
}

fn list_pins(cfg: &Config) -> Result<(), String> {
    let mut store = PgProfileStore::connect(&cfg.database_url)?;
    let users = store.list_by_role(Role::User)?;
    let placements = store.pole_positions()?;
    let pins = pins_for_users(&users, &placements);
    info!("{} pin(s) for {} grower(s)", pins.len(), users.len());
    for pin in &pins {
        println!("{}\t{:.1}\t{:.1}", pin.id, pin.x, pin.y);
    }
    Ok(())
}

fn move_pin(cfg: &Config, uid: &str, pole: u32, x: f64, y: f64) -> Result<(), String> {
    let mut store = PgProfileStore::connect(&cfg.database_url)?;
    let users = store.list_by_role(Role::User)?;
    let placements = store.pole_positions()?;
    let mut pin = pins_for_users(&users, &placements)
        .into_iter()
        .find(|p| p.uid == uid && p.pole_number == pole)
        .ok_or_else(|| format!("No pole {} for user {}", pole, uid))?;
    pin.move_to(x, y);
    if pin.x != x || pin.y != y {
        warn!("Position clamped to {:.1}, {:.1}", pin.x, pin.y);
    }
    store.save_pin_positions(std::slice::from_ref(&pin))?;
    info!("Moved {} to {:.1}, {:.1}", pin.id, pin.x, pin.y);
    Ok(())
}

fn run(command: Command) -> Result<(), String> {
    let cfg = Config::from_env()?;
    info!(
        "Config loaded (feed={}, user={}, window={}, anchor={}, export_dir={}, fake_data={})",
        cfg.feed.as_ref().map(|f| f.url.as_str()).unwrap_or("-"),
        cfg.user_id.as_deref().unwrap_or("-"),
        cfg.window_mode,
        cfg.window_anchor
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string()),
        cfg.export_dir.display(),
        cfg.fake_data
    );

    match command {
        Command::Report => report(&cfg),
        Command::Watch => watch(&cfg),
        Command::Pins => list_pins(&cfg),
        Command::Pin { uid, pole, x, y } => move_pin(&cfg, &uid, pole, x, y),
        Command::Seed => {
            let mut store = PgProfileStore::connect(&cfg.database_url)?;
            fake_data::seed_profiles(&mut store).map(|_| ())
        }
    }
}

fn main() {
    let args: Result<Vec<String>, _> = std::env::args_os().skip(1).map(|a| a.into_string()).collect();
    let setup = args
        .map_err(|_| "argument contains invalid UTF-8".to_string())
        .and_then(parse_cli)
        .and_then(|cli| Ok((configure_env(cli.env_file)?, cli.command)));
    let (loaded_env, command) = match setup {
        Ok(v) => v,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    // Init logging after environment so RUST_LOG from .env is respected.
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let Some(env) = loaded_env.as_ref() {
        let origin = if env.explicit { "CLI-specified" } else { "default" };
        info!(
            "Environment loaded from {} .env file: {} ({} variable(s) applied)",
            origin,
            env.path.display(),
            env.applied
        );
    }

    info!(
        "farm-monitor {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run(command) {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}
