use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use tracing::trace;

const REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT";
const CHECK_INTERVAL: &str = "CHECK_INTERVAL";
const DATA_FILE: &str = "DATA_FILE";
const API_ADDR: &str = "API_ADDR";

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;
const DEFAULT_CHECK_INTERVAL_MS: u64 = 5 * 60 * 1000;
const DEFAULT_DATA_FILE: &str = "./data/servers.json";
const DEFAULT_API_ADDR: &str = "127.0.0.1:8080";

/// Runtime configuration of the monitoring bot
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Timeout for a single probe
    pub request_timeout: Duration,

    /// Time between scheduled sweeps
    pub check_interval: Duration,

    /// Location of the persisted registry
    pub data_file: PathBuf,

    /// Bind address of the command API
    pub api_addr: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            check_interval: Duration::from_millis(DEFAULT_CHECK_INTERVAL_MS),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            api_addr: DEFAULT_API_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8080))),
        }
    }
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    ///
    /// Unset variables fall back to defaults; set but invalid ones are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let request_timeout = match lookup(REQUEST_TIMEOUT) {
            Some(value) => parse_millis(REQUEST_TIMEOUT, &value)?,
            None => defaults.request_timeout,
        };

        let check_interval = match lookup(CHECK_INTERVAL) {
            Some(value) => parse_millis(CHECK_INTERVAL, &value)?,
            None => defaults.check_interval,
        };

        let data_file = lookup(DATA_FILE)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_file);

        let api_addr = match lookup(API_ADDR) {
            Some(value) => value
                .trim()
                .parse()
                .with_context(|| format!("{API_ADDR} must be a socket address, got '{value}'"))?,
            None => defaults.api_addr,
        };

        let config = Self {
            request_timeout,
            check_interval,
            data_file,
            api_addr,
        };
        trace!("loaded config: {config:?}");

        Ok(config)
    }
}

/// Parse a positive number of milliseconds
fn parse_millis(key: &str, value: &str) -> anyhow::Result<Duration> {
    let millis: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a number of milliseconds, got '{value}'"))?;

    if millis == 0 {
        bail!("{key} must be greater than zero");
    }

    Ok(Duration::from_millis(millis))
}
