//! Runtime settings, read from the environment (a `.env` file is loaded first by `main`).
//!
//! | Variable | Default |
//! |----------|---------|
//! | `TRYON_API_BASE` | `http://localhost:8000` |
//! | `PORT` | `3000` |
//! | `TRYON_PREFS_PATH` | `.tryon/preferences.json` |
//! | `TRYON_PROGRESS_TICK_MS` | `200` |
//! | `TRYON_HTTP_TIMEOUT_SECS` | `180` |

use std::{path::PathBuf, str::FromStr, time::Duration};

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_PREFS_PATH: &str = ".tryon/preferences.json";
pub const DEFAULT_PROGRESS_TICK_MS: u64 = 200;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 180;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base: String,
    pub port: u16,
    pub prefs_path: PathBuf,
    pub progress_tick: Duration,
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            port: DEFAULT_PORT,
            prefs_path: PathBuf::from(DEFAULT_PREFS_PATH),
            progress_tick: Duration::from_millis(DEFAULT_PROGRESS_TICK_MS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |key: &str, default: &str| lookup(key).filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default.to_string());
        Self {
            api_base: text("TRYON_API_BASE", DEFAULT_API_BASE),
            port: parsed(&lookup, "PORT", DEFAULT_PORT),
            prefs_path: PathBuf::from(text("TRYON_PREFS_PATH", DEFAULT_PREFS_PATH)),
            progress_tick: Duration::from_millis(parsed(&lookup, "TRYON_PROGRESS_TICK_MS", DEFAULT_PROGRESS_TICK_MS).max(1)),
            http_timeout: Duration::from_secs(parsed(&lookup, "TRYON_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS).max(1)),
        }
    }
}

fn parsed<T: FromStr + Copy + std::fmt::Display>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("⚠️ {}={:?} is not valid, using {}", key, raw, default);
            default
        }),
        None => default,
    }
}
