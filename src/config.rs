//! Configuration loading and management

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::page::PageSettings;
use crate::recognition::MIN_DEBOUNCE_WINDOW;
use crate::scroll::DEFAULT_TICK_INTERVAL;

const SOCKET_VAR: &str = "VOCASCROLL_SOCKET";
const DEBOUNCE_VAR: &str = "VOCASCROLL_DEBOUNCE_MS";
const TICK_VAR: &str = "VOCASCROLL_TICK_MS";
const RELAY_TIMEOUT_VAR: &str = "VOCASCROLL_RELAY_TIMEOUT_MS";

pub const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(2);

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Minimum spacing between executed commands on one page
    pub debounce: Duration,

    /// Scroll tick period
    pub tick_interval: Duration,

    /// How long the coordinator waits for a page to answer
    pub relay_timeout: Duration,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME").context("HOME is not set")?;
        Self::from_lookup(&home, |key| std::env::var(key).ok())
    }

    fn from_lookup(home: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("vocascroll");

        let socket_path = lookup(SOCKET_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("daemon.sock"));

        let debounce = millis(&lookup, DEBOUNCE_VAR)?
            .unwrap_or(MIN_DEBOUNCE_WINDOW)
            .max(MIN_DEBOUNCE_WINDOW);

        let tick_interval = millis(&lookup, TICK_VAR)?
            .filter(|d| !d.is_zero())
            .unwrap_or(DEFAULT_TICK_INTERVAL);

        let relay_timeout = millis(&lookup, RELAY_TIMEOUT_VAR)?.unwrap_or(DEFAULT_RELAY_TIMEOUT);

        Ok(Self {
            socket_path,
            data_dir,
            debounce,
            tick_interval,
            relay_timeout,
        })
    }

    pub fn page_settings(&self) -> PageSettings {
        PageSettings {
            tick_interval: self.tick_interval,
            debounce: self.debounce,
        }
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        Ok(())
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<Duration>> {
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .with_context(|| format!("{} must be a whole number of milliseconds", key))
        })
        .transpose()
}
