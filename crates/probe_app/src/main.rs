//! acctprobe: checks account identifiers against a rate-limited lookup service.
mod input;
mod logging;
mod settings;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use probe_engine::{CredentialTypeService, LineSink, Pipeline};
use probe_logging::{level_for_verbosity, probe_info, probe_warn};

use logging::LogDestination;
use settings::Args;

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[!] {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    logging::initialize(
        LogDestination::from_log_file(args.log_file.as_deref()),
        level_for_verbosity(args.verbose),
    );

    let settings = args.resolve()?;

    let piped = input::read_piped_stdin()?;
    let Some(items) = input::gather(piped, args.input.as_deref())? else {
        eprintln!("{}", settings::usage());
        return Ok(ExitCode::FAILURE);
    };

    let sink = Arc::new(LineSink::for_target(
        settings.pipeline.sink_policy,
        &settings.target,
    )?);
    let service = Arc::new(CredentialTypeService::new(settings.service.clone())?);
    probe_info!("checking identifiers against {}", service.endpoint());
    probe_info!(
        "pacing needs at least {:?} to admit {} identifiers",
        settings
            .pipeline
            .pacing
            .minimum_admission_time(items.len() as u64),
        items.len()
    );

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    let pipeline = Pipeline::new(settings.pipeline, service, sink.clone())?;
    let summary = runtime.block_on(pipeline.run(items))?;

    let counts = summary.counts;
    probe_info!(
        "[*] All {} identifiers processed: {} valid, {} invalid, {} failed, {} lines written",
        counts.produced,
        counts.valid,
        summary.succeeded() - counts.valid,
        counts.failed,
        sink.lines_written()
    );
    if sink.write_failures() > 0 {
        probe_warn!("{} results could not be written", sink.write_failures());
    }
    Ok(ExitCode::SUCCESS)
}
