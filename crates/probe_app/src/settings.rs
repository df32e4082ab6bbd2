use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use probe_core::{PacingPolicy, PipelineConfig, SinkPolicy};
use probe_engine::{ServiceSettings, SinkTarget, DEFAULT_ENDPOINT};
use probe_logging::probe_debug;
use serde::Deserialize;

const DEFAULT_BATCH_PAUSE_MS: u64 = 60_000;

/// Check a list of account identifiers against a credential-type lookup service.
#[derive(Parser, Debug, Default)]
#[command(name = "acctprobe")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// File with one identifier per line (piped stdin takes precedence).
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Append results to this file instead of printing them.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only write identifiers that exist.
    #[arg(short = 'e', long)]
    pub valid_only: bool,

    /// Number of concurrent workers.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Minimum delay between two requests, in milliseconds.
    #[arg(long, conflicts_with = "batch_size")]
    pub interval_ms: Option<u64>,

    /// Send requests in batches of this size instead of at a steady rate.
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Pause between two batches, in milliseconds.
    #[arg(long, requires = "batch_size")]
    pub batch_pause_ms: Option<u64>,

    /// Per-request timeout, in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Capacity of the queue between the dispatcher and the workers.
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Lookup endpoint to POST identifiers to.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// RON file with pipeline settings; flags override it.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Also write logs to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Usage text printed to stderr when no input is available.
pub fn usage() -> String {
    Args::command().render_help().to_string()
}

/// Contents of the optional settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub pipeline: PipelineConfig,
    pub endpoint: Option<String>,
}

pub fn load_file_settings(path: &Path) -> anyhow::Result<FileSettings> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading settings from {}", path.display()))?;
    let settings: FileSettings = ron::from_str(&text)
        .with_context(|| format!("parsing settings in {}", path.display()))?;
    probe_debug!("loaded settings from {}: {:?}", path.display(), settings);
    Ok(settings)
}

/// Everything the run needs, resolved from defaults, the settings file and flags.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub pipeline: PipelineConfig,
    pub service: ServiceSettings,
    pub target: SinkTarget,
}

impl Args {
    pub fn resolve(&self) -> anyhow::Result<RunSettings> {
        let file = match &self.config {
            Some(path) => load_file_settings(path)?,
            None => FileSettings::default(),
        };
        self.resolve_with(file)
    }

    pub fn resolve_with(&self, file: FileSettings) -> anyhow::Result<RunSettings> {
        let mut pipeline = file.pipeline;

        if let Some(workers) = self.workers {
            pipeline.worker_count = workers;
        }
        if let Some(interval_ms) = self.interval_ms {
            pipeline.pacing = PacingPolicy::Steady { interval_ms };
        }
        if let Some(size) = self.batch_size {
            let pause_ms = match (self.batch_pause_ms, pipeline.pacing) {
                (Some(pause_ms), _) => pause_ms,
                (None, PacingPolicy::Batch { pause_ms, .. }) => pause_ms,
                (None, PacingPolicy::Steady { .. }) => DEFAULT_BATCH_PAUSE_MS,
            };
            pipeline.pacing = PacingPolicy::Batch { size, pause_ms };
        }
        if let Some(timeout_ms) = self.timeout_ms {
            pipeline.call_timeout_ms = timeout_ms;
        }
        if let Some(capacity) = self.queue_capacity {
            pipeline.queue_capacity = capacity;
        }
        if self.valid_only {
            pipeline.sink_policy = SinkPolicy::ValidOnly;
        }
        pipeline.validate().context("invalid pipeline settings")?;

        let endpoint = self
            .endpoint
            .clone()
            .or(file.endpoint)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let service = ServiceSettings {
            endpoint,
            request_timeout: Duration::from_millis(pipeline.call_timeout_ms),
            ..ServiceSettings::default()
        };

        let target = match &self.output {
            Some(path) => SinkTarget::File(path.clone()),
            None => SinkTarget::Stdout,
        };

        Ok(RunSettings {
            pipeline,
            service,
            target,
        })
    }
}
