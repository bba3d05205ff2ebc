//! Generates a random workload for the CPU scheduling simulation.
#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

use clap::Parser;
use eyre::WrapErr;
use workload::{write_rows, Format, WorkloadGenerator};

/// Generates input for the CPU scheduling simulation and writes it to the standard output.
#[derive(Parser)]
#[clap(version, author)]
struct Opts {
    /// Number of processes to generate.
    #[clap(short, long)]
    num_processes: usize,

    /// Expected number of process arrivals per microsecond.
    #[clap(long, default_value = "0.01")]
    arrival_rate: f64,

    /// Mean service time of a process in microseconds.
    #[clap(long, default_value = "100")]
    mean_service_time: f64,

    /// Seed to use for random number generator.
    #[clap(short, long)]
    seed: Option<u64>,

    /// Output format.
    #[clap(short, long, possible_values = &["json", "msgpack"], default_value = "msgpack")]
    format: Format,

    /// Log the generation parameters to the stderr.
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let opts = Opts::parse();
    fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("[{}] {}", record.level(), message)))
        .level(if opts.verbose {
            log::LevelFilter::Info
        } else {
            log::LevelFilter::Warn
        })
        .chain(std::io::stderr())
        .apply()?;

    let mut generator = WorkloadGenerator::new(opts.num_processes)
        .arrival_rate(opts.arrival_rate)
        .mean_service_time(opts.mean_service_time);
    if let Some(seed) = opts.seed {
        generator = generator.seed(seed);
    }
    log::info!("Generating {} processes: {:?}", opts.num_processes, generator);
    let rows = generator.generate().wrap_err("unable to generate workload")?;

    let stdout = std::io::stdout();
    let writer = stdout.lock();
    write_rows(writer, &rows, opts.format).wrap_err("unable to write workload")?;
    Ok(())
}
