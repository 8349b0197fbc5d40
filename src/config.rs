//! Environment driven configuration for the gateway lambda.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_LAUNCH_API_URL: &str = "https://api.spacexdata.com/v2/";
pub const DEFAULT_ENDPOINT: &str = "/graphql";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base url of the remote launch catalog
    pub launch_api_url: String,
    /// Per request timeout for the launch catalog
    pub launch_api_timeout: Duration,
    /// Snapshot file of the user store, in memory when unset
    pub user_store_path: Option<PathBuf>,
    /// Serve the GraphQL Playground on bare GET requests
    pub playground: bool,
    /// Public path of the GraphQL endpoint
    pub endpoint: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            launch_api_url: DEFAULT_LAUNCH_API_URL.to_string(),
            launch_api_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_store_path: None,
            playground: true,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let launch_api_timeout = match lookup("LAUNCH_API_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| {
                    Error::Config(format!("LAUNCH_API_TIMEOUT_SECS is not a number: {raw}"))
                })?,
            None => defaults.launch_api_timeout,
        };

        let playground = match lookup("GRAPHQL_PLAYGROUND") {
            Some(raw) => parse_flag(&raw)
                .ok_or_else(|| Error::Config(format!("GRAPHQL_PLAYGROUND is not a flag: {raw}")))?,
            None => defaults.playground,
        };

        Ok(Self {
            launch_api_url: lookup("LAUNCH_API_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.launch_api_url),
            launch_api_timeout,
            user_store_path: lookup("USER_STORE_PATH")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            playground,
            endpoint: lookup("GRAPHQL_ENDPOINT").unwrap_or(defaults.endpoint),
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
