use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveTime;
use dotenv::dotenv;
use tracing::{info, warn};

pub mod constant {
    pub const FLEET_SIZE: usize = 3;
    pub const TRUCK_CAPACITY: usize = 16;
    pub const AVERAGE_SPEED_MPH: f64 = 18.0;
    pub const HUB: usize = 0;

    pub const PRIORITY_CUTOFF: (u32, u32) = (10, 30);
    pub const END_OF_DAY: (u32, u32) = (23, 59);

    pub const TRUCK_1_DEPARTURE: (u32, u32) = (8, 0);
    pub const TRUCK_2_DEPARTURE: (u32, u32) = (9, 5);
    pub const TRUCK_3_EARLIEST_DEPARTURE: (u32, u32) = (10, 20);

    pub const TRIALS: usize = 10;
    pub const SEED: u64 = 64;
    pub const TWO_OPT_MAX_PASSES: usize = 50;

    pub const ADDRESSES_CSV_PATH: &str = "data/addresses.csv";
    pub const PACKAGES_CSV_PATH: &str = "data/packages.csv";
    pub const DISTANCES_CSV_PATH: &str = "data/distances.csv";
}

/// Wall-clock time from an `(hour, minute)` constant.
pub fn clock((hour, minute): (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Runtime settings, constants overridable through the environment (or `.env`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub addresses_path: PathBuf,
    pub packages_path: PathBuf,
    pub distances_path: PathBuf,
    pub seed: u64,
    pub trials: usize,
    pub two_opt: bool,
    pub report_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            addresses_path: PathBuf::from(constant::ADDRESSES_CSV_PATH),
            packages_path: PathBuf::from(constant::PACKAGES_CSV_PATH),
            distances_path: PathBuf::from(constant::DISTANCES_CSV_PATH),
            seed: constant::SEED,
            trials: constant::TRIALS,
            two_opt: false,
            report_path: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = Settings::default();

        let settings = Settings {
            addresses_path: env::var("WGUPS_ADDRESSES")
                .map(PathBuf::from)
                .unwrap_or(defaults.addresses_path),
            packages_path: env::var("WGUPS_PACKAGES")
                .map(PathBuf::from)
                .unwrap_or(defaults.packages_path),
            distances_path: env::var("WGUPS_DISTANCES")
                .map(PathBuf::from)
                .unwrap_or(defaults.distances_path),
            seed: parse_var("WGUPS_SEED", defaults.seed),
            trials: parse_var("WGUPS_TRIALS", defaults.trials),
            two_opt: parse_var("WGUPS_TWO_OPT", defaults.two_opt),
            report_path: env::var("WGUPS_REPORT").ok().map(PathBuf::from),
        };

        info!(
            "Settings: seed = {}, trials = {}, two_opt = {}",
            settings.seed, settings.trials, settings.two_opt
        );
        settings
    }
}

fn parse_var<T: FromStr + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{name}={raw:?} is not valid, using default {default}");
            default
        }),
        Err(_) => default,
    }
}
