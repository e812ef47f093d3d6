use std::path::PathBuf;

use anyhow::{Context, Result};
use batchpoints::{format_duration, FileStore, OutputTarget, Settings};
use batchpoints_sdk::Batcher;
use batchpoints_types::FilterSpec;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "batchpoints")]
#[command(about = "Sample a Signal K measurement tree and publish batches of its values")]
struct Args {
    /// Path to the full-model JSON document to sample
    #[arg(short, long, default_value = "full.json")]
    store: PathBuf,

    /// Settings file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Owner id to sample (defaults to the document's "self")
    #[arg(long)]
    owner: Option<String>,

    /// Sampling interval (e.g., "1s", "500ms")
    #[arg(short, long)]
    update_interval: Option<String>,

    /// Flush interval (e.g., "10s", "1m")
    #[arg(short, long)]
    write_interval: Option<String>,

    /// Only keep paths matching these patterns
    #[arg(long, value_delimiter = ',', conflicts_with = "exclude")]
    include: Vec<String>,

    /// Drop paths matching these patterns
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Where batches go: "stdout", "file:PATH" or "tcp:HOST:PORT"
    #[arg(short, long)]
    output: Option<String>,
}

impl Args {
    /// Command line flags win over the settings file and environment.
    fn apply(&self, settings: &mut Settings) {
        if let Some(owner) = &self.owner {
            settings.owner = Some(owner.clone());
        }
        if let Some(interval) = &self.update_interval {
            settings.update_interval = interval.clone();
        }
        if let Some(interval) = &self.write_interval {
            settings.write_interval = interval.clone();
        }
        if !self.include.is_empty() {
            settings.filter_list_type = "include".into();
            settings.filter_list = self.include.clone();
        } else if !self.exclude.is_empty() {
            settings.filter_list_type = "exclude".into();
            settings.filter_list = self.exclude.clone();
        }
        if let Some(output) = &self.output {
            settings.output = output.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only batches
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply(&mut settings);

    let update_interval = settings.update_interval()?;
    let write_interval = settings.write_interval()?;
    let filter: FilterSpec = settings.filter()?;
    let target: OutputTarget = settings.output()?;

    let store = FileStore::new(&args.store);
    info!(
        store = store.description(),
        update = %format_duration(update_interval),
        write = %format_duration(write_interval),
        filter = %filter.mode,
        patterns = filter.patterns.len(),
        output = ?target,
        "starting batchpoints"
    );

    let mut builder = Batcher::builder()
        .store(store)
        .filter(filter)
        .update_interval(update_interval)
        .write_interval(write_interval)
        .output(target.into_output());
    if let Some(owner) = settings.owner {
        builder = builder.owner(owner);
    }
    let batcher = builder.build();

    let handle = batcher.start()?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("shutting down");
    handle.stop().await;

    // Publish whatever was captured since the last scheduled write
    if batcher.pending_captures() > 0 {
        batcher.write_now().await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_settings() {
        let args = Args::parse_from([
            "batchpoints",
            "--owner",
            "urn:mrn:signalk:uuid:abc",
            "--write-interval",
            "1m",
            "--include",
            "environment.*,navigation.position",
            "--output",
            "tcp:localhost:9000",
        ]);

        let mut settings = Settings::default();
        args.apply(&mut settings);

        assert_eq!(settings.owner.as_deref(), Some("urn:mrn:signalk:uuid:abc"));
        assert_eq!(settings.update_interval, "1s");
        assert_eq!(settings.write_interval, "1m");
        assert_eq!(
            settings.filter().unwrap(),
            FilterSpec::include(["environment.*", "navigation.position"])
        );
        assert_eq!(
            settings.output().unwrap(),
            OutputTarget::Tcp("localhost:9000".into())
        );
    }

    #[test]
    fn test_include_conflicts_with_exclude() {
        let result = Args::try_parse_from([
            "batchpoints",
            "--include",
            "environment.*",
            "--exclude",
            "navigation.*",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_flags_keep_settings() {
        let args = Args::parse_from(["batchpoints"]);
        let mut settings = Settings {
            filter_list_type: "include".into(),
            filter_list: vec!["environment.*".into()],
            ..Settings::default()
        };
        args.apply(&mut settings);

        assert_eq!(settings.filter().unwrap(), FilterSpec::include(["environment.*"]));
        assert_eq!(args.store, PathBuf::from("full.json"));
    }
}
