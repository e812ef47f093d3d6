//! Runtime settings for the batchpoints service.
//!
//! Settings are layered: built-in defaults, then an optional settings file
//! (TOML, YAML or JSON, picked by extension), then `BATCHPOINTS_*`
//! environment variables. Command line flags are applied on top by the
//! binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use batchpoints_sdk::Output;
use batchpoints_types::{Batch, FilterMode, FilterSpec};
use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::warn;

use crate::duration::parse_duration;

/// Prefix for environment overrides, e.g. `BATCHPOINTS_WRITE_INTERVAL=30s`.
pub const ENV_PREFIX: &str = "BATCHPOINTS";

/// Where flushed batches are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// One JSON document per line on standard output.
    Stdout,
    /// Overwrite a file with each batch.
    File(PathBuf),
    /// Send newline-delimited JSON to a TCP endpoint.
    Tcp(String),
}

impl OutputTarget {
    /// Parse `stdout`, `file:PATH` or `tcp:HOST:PORT`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("stdout") || s == "-" {
            return Ok(OutputTarget::Stdout);
        }
        if let Some(path) = s.strip_prefix("file:") {
            if path.is_empty() {
                bail!("Output 'file:' needs a path");
            }
            return Ok(OutputTarget::File(PathBuf::from(path)));
        }
        if let Some(addr) = s.strip_prefix("tcp:") {
            if !addr.contains(':') {
                bail!("Output 'tcp:' needs HOST:PORT, got '{}'", addr);
            }
            return Ok(OutputTarget::Tcp(addr.to_string()));
        }
        bail!(
            "Unknown output '{}', expected 'stdout', 'file:PATH' or 'tcp:HOST:PORT'",
            s
        )
    }

    /// Build the SDK output for this target.
    pub fn into_output(self) -> Output {
        match self {
            OutputTarget::Stdout => Output::callback(print_batch),
            OutputTarget::File(path) => Output::file(path),
            OutputTarget::Tcp(addr) => Output::tcp(addr),
        }
    }
}

fn print_batch(batch: Batch) {
    match serde_json::to_string(&batch) {
        Ok(line) => println!("{}", line),
        Err(e) => warn!(error = %e, "failed to serialize batch"),
    }
}

/// Settings as read from the settings file and environment.
///
/// Intervals are kept as strings until [`Settings::update_interval`] and
/// [`Settings::write_interval`] parse them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Owner id to sample. Defaults to the tree's `self` reference.
    pub owner: Option<String>,
    /// How often to sample the store, e.g. `"1s"`.
    pub update_interval: String,
    /// How often to flush the batch, e.g. `"10s"`.
    pub write_interval: String,
    /// `include` or `exclude`.
    pub filter_list_type: String,
    /// Glob patterns for the filter.
    pub filter_list: Vec<String>,
    /// `stdout`, `file:PATH` or `tcp:HOST:PORT`.
    pub output: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            owner: None,
            update_interval: "1s".to_string(),
            write_interval: "10s".to_string(),
            filter_list_type: FilterMode::Exclude.as_str().to_string(),
            filter_list: Vec::new(),
            output: "stdout".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from an optional file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, environment())
    }

    fn load_with(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(env)
            .build()
            .context("Failed to load settings")?;

        config
            .try_deserialize()
            .context("Failed to read settings")
    }

    /// Parsed update interval.
    pub fn update_interval(&self) -> Result<Duration> {
        parse_duration(&self.update_interval)
            .with_context(|| format!("Invalid update_interval '{}'", self.update_interval))
    }

    /// Parsed write interval.
    pub fn write_interval(&self) -> Result<Duration> {
        parse_duration(&self.write_interval)
            .with_context(|| format!("Invalid write_interval '{}'", self.write_interval))
    }

    /// The filter described by `filter_list_type` and `filter_list`.
    pub fn filter(&self) -> Result<FilterSpec> {
        let mode: FilterMode = self.filter_list_type.parse()?;
        Ok(FilterSpec::new(mode, self.filter_list.iter()))
    }

    /// Parsed output target.
    pub fn output(&self) -> Result<OutputTarget> {
        OutputTarget::parse(&self.output)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("filter_list")
}
