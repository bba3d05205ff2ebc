//! CPU scheduling simulation application.
#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

use std::convert::TryFrom;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use eyre::WrapErr;
use humantime::parse_duration;
use indicatif::{ProgressBar, ProgressStyle};

use cpusim::{PolicyKind, ProcessSpec, Report, SimulationEngine, SimulationOutcome};

struct DurationArg(Duration);

impl std::str::FromStr for DurationArg {
    type Err = eyre::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s).wrap_err("invalid time").map(DurationArg)
    }
}

/// Runs a CPU scheduling simulation.
#[derive(Parser)]
#[clap(version, author)]
struct Opt {
    /// Path to a workload file: JSON if the extension is `.json`, MessagePack otherwise.
    #[clap(long)]
    workload: PathBuf,

    /// Scheduling policy.
    #[clap(short, long, possible_values = &["fcfs", "sjf", "rr", "srtf"])]
    policy: PolicyKind,

    /// Round-robin time quantum, e.g., `2us` or `5ms`.
    #[clap(short, long)]
    quantum: Option<DurationArg>,

    /// Write the dispatched runs to this CSV file.
    #[clap(long)]
    trace_output: Option<PathBuf>,

    /// Write the fired events to this CSV file.
    #[clap(long)]
    events_output: Option<PathBuf>,

    /// Write the JSON report to this file instead of the stdout.
    #[clap(long)]
    report_output: Option<PathBuf>,

    /// Verbosity.
    #[clap(short, long, parse(from_occurrences))]
    verbose: i32,

    /// Store the logs this file.
    #[clap(long)]
    log_output: Option<PathBuf>,

    /// Do not log to the stderr.
    #[clap(long)]
    no_stderr: bool,
}

struct SimulationConfig {
    workload: PathBuf,
    policy: PolicyKind,
    quantum: Option<Duration>,
    trace_output: Option<PathBuf>,
    events_output: Option<PathBuf>,
    report_output: Option<PathBuf>,
}

impl TryFrom<Opt> for SimulationConfig {
    type Error = eyre::Error;
    fn try_from(opt: Opt) -> eyre::Result<Self> {
        if opt.policy == PolicyKind::Rr && opt.quantum.is_none() {
            eyre::bail!("round-robin requires --quantum");
        }
        if opt.policy != PolicyKind::Rr && opt.quantum.is_some() {
            log::warn!("--quantum is ignored by {}", opt.policy);
        }
        Ok(Self {
            workload: opt.workload,
            policy: opt.policy,
            quantum: opt.quantum.map(|q| q.0),
            trace_output: opt.trace_output,
            events_output: opt.events_output,
            report_output: opt.report_output,
        })
    }
}

impl SimulationConfig {
    /// Loads the workload and converts it to process descriptions.
    fn processes(&self) -> eyre::Result<Vec<ProcessSpec>> {
        log::info!("Reading workload from {}", self.workload.display());
        let rows = workload::read_rows(&self.workload).wrap_err_with(|| {
            format!("unable to load workload: {}", self.workload.display())
        })?;
        log::info!("Loaded {} processes", rows.len());
        Ok(rows.into_iter().map(ProcessSpec::from).collect())
    }

    /// Runs the simulation to the end, showing the progress in terminated processes.
    fn simulate(&self) -> eyre::Result<SimulationOutcome> {
        let policy = self.policy.build(self.quantum)?;
        let mut engine = SimulationEngine::new(self.processes()?, policy)
            .wrap_err("invalid simulation setup")?;
        let pb = ProgressBar::new(engine.num_processes() as u64)
            .with_style(ProgressStyle::default_bar().template("{msg} {wide_bar} {pos}/{len}"));
        loop {
            let more = engine.step().wrap_err_with(|| {
                format!("simulation failed at {:?}", engine.time())
            })?;
            pb.set_position(engine.num_terminated() as u64);
            pb.set_message(&format!("[{}us]", engine.time().as_micros()));
            if !more {
                break;
            }
        }
        pb.finish();
        log::info!("Simulation finished at {:?}", engine.time());
        Ok(engine.into_outcome())
    }

    /// Runs the simulation and writes all requested outputs.
    fn run(&self) -> eyre::Result<()> {
        let outcome = self.simulate()?;
        if let Some(path) = &self.trace_output {
            outcome
                .trace
                .write_runs_csv(create(path)?)
                .wrap_err("unable to write trace")?;
        }
        if let Some(path) = &self.events_output {
            outcome
                .trace
                .write_events_csv(create(path)?)
                .wrap_err("unable to write events")?;
        }
        let report = Report::new(&outcome)?;
        match &self.report_output {
            Some(path) => serde_json::to_writer_pretty(create(path)?, &report)?,
            None => serde_json::to_writer_pretty(io::stdout().lock(), &report)?,
        }
        Ok(())
    }
}

fn create(path: &Path) -> eyre::Result<io::BufWriter<File>> {
    let file = File::create(path)
        .wrap_err_with(|| format!("unable to create file: {}", path.display()))?;
    Ok(io::BufWriter::new(file))
}

/// Set up a logger based on the given user options.
fn set_up_logger(opt: &Opt) -> Result<(), fern::InitError> {
    let log_level = match opt.verbose {
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        3 => log::LevelFilter::Trace,
        _ => log::LevelFilter::Warn,
    };
    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("[{}] {}", record.level(), message)))
        .level(log_level);
    let dispatch = if let Some(path) = &opt.log_output {
        let _ = std::fs::remove_file(path);
        dispatch.chain(
            std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .append(false)
                .open(path)?,
        )
    } else {
        dispatch
    };
    let dispatch = if opt.no_stderr {
        dispatch
    } else {
        dispatch.chain(std::io::stderr())
    };
    dispatch.apply()?;
    Ok(())
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let opt = Opt::parse();
    set_up_logger(&opt)?;
    let conf = SimulationConfig::try_from(opt)?;
    conf.run()
}
