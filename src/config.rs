// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::BTreeMap, fs, path::Path};

use crate::engine::{ObserverOptions, StageNamePolicy};

/// Config path used when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Root configuration loaded from `config.yaml`.
///
/// Every section is optional. This file controls:
/// - Where the ingest server listens and how it authenticates
/// - How stages are named and whether orphans are force-closed
/// - Where normalized events are delivered
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub stages: StageConfig,

    /// Event destinations. Defaults to a single `log` sink.
    #[serde(default = "default_sinks")]
    pub sinks: Vec<SinkConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            stages: StageConfig::default(),
            sinks: default_sinks(),
        }
    }
}

/// Ingest server section.
///
/// Example in config.yaml:
///
/// server:
///   addr: 0.0.0.0:8787
///   api_key_env: STAGEWATCH_API_KEY
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,

    /// Name of the environment variable holding the bearer key.
    /// When unset the ingest routes are open.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            api_key_env: None,
        }
    }
}

fn default_addr() -> String {
    "127.0.0.1:8787".to_string()
}

/// Stage correlation section.
///
/// stages:
///   name_policy: prefer_end # prefer_end | prefer_start
///   close_orphans: true
#[derive(Debug, Deserialize)]
pub struct StageConfig {
    #[serde(default)]
    pub name_policy: StageNamePolicy,

    #[serde(default = "default_true")]
    pub close_orphans: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            name_policy: StageNamePolicy::default(),
            close_orphans: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Log,
    Stdout,
    File,
    Http,
}

/// One event destination.
///
/// sinks:
///   - kind: file
///     path: events/stagewatch.jsonl
///   - kind: http
///     url: https://collector.example.com/events
///     timeout_ms: 5000
///     queue_capacity: 1024
///     headers:
///       X-Source: jenkins
#[derive(Debug, Deserialize, Clone)]
pub struct SinkConfig {
    pub kind: SinkKind,

    /// Only used when kind = file
    #[serde(default)]
    pub path: Option<String>,

    /// Only used when kind = http
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Events buffered for an http sink before new ones are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl SinkConfig {
    pub fn of_kind(kind: SinkKind) -> Self {
        Self {
            kind,
            path: None,
            url: None,
            headers: BTreeMap::new(),
            timeout_ms: default_timeout_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_sinks() -> Vec<SinkConfig> {
    vec![SinkConfig::of_kind(SinkKind::Log)]
}

impl Config {
    /// Load and parse `config.yaml` from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::parse(&raw)
    }

    /// Like [`Config::load`], but a missing [`DEFAULT_CONFIG_PATH`] yields
    /// the defaults. Any other path must exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        Self::load_with_fallback(path, Path::new(DEFAULT_CONFIG_PATH))
    }

    fn load_with_fallback(path: &Path, default_path: &Path) -> Result<Self> {
        if path == default_path && !path.exists() {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load(path)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        // An empty document deserialises as unit, not as an empty map.
        if raw.trim().is_empty() {
            return Self::parse("{}");
        }

        serde_yaml::from_str(raw).context("Failed to parse YAML config")
    }

    pub fn observer_options(&self) -> ObserverOptions {
        ObserverOptions {
            name_policy: self.stages.name_policy,
            close_orphans: self.stages.close_orphans,
        }
    }

    /// True when events go to stdout, which then carries nothing else.
    pub fn writes_events_to_stdout(&self) -> bool {
        self.sinks.iter().any(|s| s.kind == SinkKind::Stdout)
    }

    /// Resolve the ingest API key from the configured environment variable.
    pub fn api_key(&self) -> Result<Option<String>> {
        match &self.server.api_key_env {
            None => Ok(None),
            Some(var) => std::env::var(var)
                .map(Some)
                .with_context(|| format!("server.api_key_env is set but {} is not defined", var)),
        }
    }
}
