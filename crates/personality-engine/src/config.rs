//! Engine settings from environment variables

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Identical move signatures inside this window are spoken once
const DEBOUNCE_WINDOW_MS: u64 = 2_000;

/// Quiet period after an emission before the next one may start
const SETTLE_DELAY_MS: u64 = 500;

/// Upper bound on a single emission channel attempt
const EMISSION_TIMEOUT_MS: u64 = 10_000;

/// Debounce table housekeeping
const DEBOUNCE_CAPACITY: usize = 50;
const DEBOUNCE_EVICT: usize = 20;

#[derive(Clone, Debug)]
pub struct EngineSettings {
    /// Personality directory to load at startup
    pub personality_dir: Option<PathBuf>,

    /// Feature switch owned by the host application
    pub enabled: bool,

    /// Playback volume, 0.0..=1.0
    pub volume: f32,

    pub debounce_window: Duration,
    pub settle_delay: Duration,
    pub emission_timeout: Duration,

    /// Entries kept in the debounce table before the oldest are evicted
    pub debounce_capacity: usize,
    pub debounce_evict: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            personality_dir: None,
            enabled: true,
            volume: 1.0,
            debounce_window: Duration::from_millis(DEBOUNCE_WINDOW_MS),
            settle_delay: Duration::from_millis(SETTLE_DELAY_MS),
            emission_timeout: Duration::from_millis(EMISSION_TIMEOUT_MS),
            debounce_capacity: DEBOUNCE_CAPACITY,
            debounce_evict: DEBOUNCE_EVICT,
        }
    }
}

impl EngineSettings {
    /// Load settings from environment variables, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            personality_dir: env::var("PERSONALITY_DIR").ok().map(PathBuf::from),
            enabled: env::var("PERSONALITY_ENABLED")
                .ok()
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.enabled),
            volume: env::var("PERSONALITY_VOLUME")
                .ok()
                .and_then(|v| v.parse::<f32>().ok())
                .map(|v| v.clamp(0.0, 1.0))
                .unwrap_or(defaults.volume),
            debounce_window: env_millis("DEBOUNCE_WINDOW_MS").unwrap_or(defaults.debounce_window),
            settle_delay: env_millis("SETTLE_DELAY_MS").unwrap_or(defaults.settle_delay),
            emission_timeout: env_millis("EMISSION_TIMEOUT_MS").unwrap_or(defaults.emission_timeout),
            debounce_capacity: defaults.debounce_capacity,
            debounce_evict: defaults.debounce_evict,
        }
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "off" | "no"
    )
}
