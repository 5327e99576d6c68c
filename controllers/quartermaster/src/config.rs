//! Controller configuration.
//!
//! Settings come from an optional YAML file (`QUARTERMASTER_CONFIG`) with
//! environment variables layered on top. The file is re-read periodically;
//! [`Config::reload`] diffs the new content against the running configuration
//! and fills `new_resources` / `stale_resources` so the controller knows which
//! watchers to start and which to stop.

use crate::error::ControllerError;
use inventory::ResourceKind;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_REMOTE_ENDPOINT: &str = "http://localhost:8080/inventory";
const DEFAULT_EMIT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PROBE_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_CONFIG_POLL_SECS: u64 = 30;

/// Contents of the YAML configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub remote_endpoint: Option<String>,
    #[serde(default)]
    pub resources_watch: Option<Vec<String>>,
    #[serde(default)]
    pub emit_timeout_seconds: Option<u64>,
}

/// Running configuration of the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Collector URL every record is sent to
    pub remote_endpoint: String,
    /// Standing list of resource kinds to watch (`namespaces`, `deployments`, `pods`)
    pub resources_watch: Vec<String>,
    /// Kinds added by the latest configuration change; overrides `resources_watch` when non-empty
    pub new_resources: Vec<String>,
    /// Kinds removed by the latest configuration change
    pub stale_resources: Vec<String>,
    /// Upper bound for a single emission
    pub emit_timeout: Duration,
    pub probe_addr: SocketAddr,
    pub config_file: Option<PathBuf>,
    pub config_poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_endpoint: DEFAULT_REMOTE_ENDPOINT.to_string(),
            resources_watch: ResourceKind::ALL
                .iter()
                .map(|kind| kind.config_name().to_string())
                .collect(),
            new_resources: Vec::new(),
            stale_resources: Vec::new(),
            emit_timeout: Duration::from_secs(DEFAULT_EMIT_TIMEOUT_SECS),
            probe_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            config_file: None,
            config_poll_interval: Duration::from_secs(DEFAULT_CONFIG_POLL_SECS),
        }
    }
}

impl Config {
    /// Load configuration from the process environment (and the file it points to)
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration using `lookup` to resolve environment variables
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ControllerError> {
        let config_file = lookup("QUARTERMASTER_CONFIG")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        let file = match &config_file {
            Some(path) => Some(load_file(path)?),
            None => None,
        };
        Self::from_sources(config_file, file, lookup)
    }

    fn from_sources(
        config_file: Option<PathBuf>,
        file: Option<FileConfig>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ControllerError> {
        let defaults = Self::default();
        let file = file.unwrap_or_default();

        let remote_endpoint = lookup("REMOTE_ENDPOINT")
            .or(file.remote_endpoint)
            .unwrap_or(defaults.remote_endpoint)
            .trim()
            .to_string();
        if remote_endpoint.is_empty() {
            return Err(ControllerError::InvalidConfig(
                "remote endpoint must not be empty".to_string(),
            ));
        }

        let resources_watch = match lookup("RESOURCES_WATCH") {
            Some(list) => split_list(&list),
            None => file.resources_watch.unwrap_or(defaults.resources_watch),
        };

        let emit_timeout_secs = match lookup("EMIT_TIMEOUT_SECONDS") {
            Some(raw) => parse_number("EMIT_TIMEOUT_SECONDS", &raw)?,
            None => file.emit_timeout_seconds.unwrap_or(DEFAULT_EMIT_TIMEOUT_SECS),
        };
        if emit_timeout_secs == 0 {
            return Err(ControllerError::InvalidConfig(
                "emit timeout must be at least one second".to_string(),
            ));
        }

        let probe_addr = lookup("PROBE_ADDR")
            .unwrap_or_else(|| DEFAULT_PROBE_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ControllerError::InvalidConfig(format!("PROBE_ADDR: {e}")))?;

        let poll_secs = match lookup("CONFIG_POLL_SECONDS") {
            Some(raw) => parse_number("CONFIG_POLL_SECONDS", &raw)?.max(1),
            None => DEFAULT_CONFIG_POLL_SECS,
        };

        Ok(Self {
            remote_endpoint,
            resources_watch: dedup(resources_watch),
            new_resources: Vec::new(),
            stale_resources: Vec::new(),
            emit_timeout: Duration::from_secs(emit_timeout_secs),
            probe_addr,
            config_file,
            config_poll_interval: Duration::from_secs(poll_secs),
        })
    }

    /// Kinds `start_watchers` should start: the newly requested ones if any,
    /// otherwise the standing list
    pub fn watch_list(&self) -> &[String] {
        if self.new_resources.is_empty() {
            &self.resources_watch
        } else {
            &self.new_resources
        }
    }

    /// Re-read the configuration file.
    ///
    /// Returns `Ok(None)` when there is no file or nothing relevant changed.
    /// Otherwise the returned config carries the kinds to start in
    /// `new_resources` and the kinds to stop in `stale_resources`.
    pub fn reload(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ControllerError> {
        let Some(path) = &self.config_file else {
            return Ok(None);
        };
        let file = load_file(path)?;
        let next = Self::from_sources(Some(path.clone()), Some(file), lookup)?;
        Ok(self.diff(next))
    }

    /// Compute the change from `self` to `next`, `None` if watchers are unaffected
    pub fn diff(&self, mut next: Self) -> Option<Self> {
        // Watchers capture endpoint and timeout when they start, so changing
        // either restarts every watcher.
        let restart_all = next.remote_endpoint != self.remote_endpoint
            || next.emit_timeout != self.emit_timeout;

        if restart_all {
            next.stale_resources = self.resources_watch.clone();
            next.new_resources = next.resources_watch.clone();
        } else {
            next.stale_resources = self
                .resources_watch
                .iter()
                .filter(|kind| !next.resources_watch.contains(kind))
                .cloned()
                .collect();
            next.new_resources = next
                .resources_watch
                .iter()
                .filter(|kind| !self.resources_watch.contains(kind))
                .cloned()
                .collect();
        }

        if next.stale_resources.is_empty() && next.new_resources.is_empty() {
            None
        } else {
            Some(next)
        }
    }
}

/// Read and parse the YAML configuration file
pub fn load_file(path: &Path) -> Result<FileConfig, ControllerError> {
    let raw = std::fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    Ok(serde_yaml::from_str(&raw)?)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

fn parse_number(name: &str, raw: &str) -> Result<u64, ControllerError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| ControllerError::InvalidConfig(format!("{name}: {e}")))
}
