//! Workloads for CPU scheduling simulation: the process rows fed to the simulator, a seeded random
//! generator, and readers and writers for the supported file formats.

#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::default_trait_access,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use rand_distr::{Distribution, Exp};
use serde::{Deserialize, Serialize};

/// Error type encompassing all workload errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Could not open, read, or write a workload file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed JSON workload.
    #[error("Invalid JSON workload: {0}")]
    Json(#[from] serde_json::Error),
    /// Malformed MessagePack workload.
    #[error("Invalid MessagePack workload: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),
    /// Failed to encode a workload as MessagePack.
    #[error("Could not encode MessagePack workload: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),
    /// A generator parameter is out of its domain.
    #[error("Invalid parameter `{name}`: {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },
}

/// Result alias using [`Error`](enum.Error.html).
pub type Result<T> = std::result::Result<T, Error>;

/// A single process of a workload, as stored in workload files.
///
/// All times are in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRow {
    /// Process ID, unique within a workload.
    pub id: usize,
    /// Time at which the process enters the system.
    pub arrival_time: u64,
    /// Total CPU time the process requires.
    pub service_time: u64,
}

impl ProcessRow {
    /// Constructs a new row.
    #[must_use]
    pub fn new(id: usize, arrival_time: u64, service_time: u64) -> Self {
        Self {
            id,
            arrival_time,
            service_time,
        }
    }
}

/// Workload file format.
#[derive(Debug, Copy, Clone, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Format {
    /// A JSON array of rows.
    Json,
    /// A MessagePack array of rows.
    MsgPack,
}

impl Format {
    /// Guesses the format from the file extension: `.json` is JSON, anything else is MessagePack.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        if path.extension().map_or(false, |e| e == "json") {
            Self::Json
        } else {
            Self::MsgPack
        }
    }
}

/// Reads a workload from a file, choosing the format by extension.
/// See [`Format::from_path`].
///
/// # Errors
///
/// Returns an error if the file cannot be opened or does not parse in the detected format.
pub fn read_rows(path: &Path) -> Result<Vec<ProcessRow>> {
    let file = File::open(path)?;
    read_rows_from(file, Format::from_path(path))
}

/// Reads a workload in the given format.
///
/// # Errors
///
/// Returns an error if the input does not parse.
pub fn read_rows_from<R: Read>(reader: R, format: Format) -> Result<Vec<ProcessRow>> {
    match format {
        Format::Json => Ok(serde_json::from_reader(reader)?),
        Format::MsgPack => Ok(rmp_serde::from_read(reader)?),
    }
}

/// Writes a workload in the given format.
///
/// # Errors
///
/// Returns an error if writing or encoding fails.
pub fn write_rows<W: Write>(mut writer: W, rows: &[ProcessRow], format: Format) -> Result<()> {
    match format {
        Format::Json => serde_json::to_writer(&mut writer, rows)?,
        Format::MsgPack => rmp_serde::encode::write(&mut writer, rows)?,
    }
    writer.flush()?;
    Ok(())
}

/// Generates random workloads.
///
/// Inter-arrival times and service times are exponentially distributed. The first process always
/// arrives at time 0, and no service time is shorter than 1 microsecond.
///
/// # Examples
///
/// ```
/// # use workload::WorkloadGenerator;
/// let rows = WorkloadGenerator::new(5)
///     .arrival_rate(0.01)
///     .mean_service_time(50.0)
///     .seed(17)
///     .generate()?;
/// assert_eq!(rows.len(), 5);
/// assert_eq!(rows[0].arrival_time, 0);
/// # Ok::<(), workload::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct WorkloadGenerator {
    num_processes: usize,
    arrival_rate: f64,
    mean_service_time: f64,
    seed: Option<u64>,
}

impl WorkloadGenerator {
    /// Constructs a generator of `num_processes` processes with one arrival per 100 µs
    /// and a mean service time of 100 µs.
    #[must_use]
    pub fn new(num_processes: usize) -> Self {
        Self {
            num_processes,
            arrival_rate: 0.01,
            mean_service_time: 100.0,
            seed: None,
        }
    }

    /// Expected number of arrivals per microsecond.
    #[must_use]
    pub fn arrival_rate(mut self, arrival_rate: f64) -> Self {
        self.arrival_rate = arrival_rate;
        self
    }

    /// Mean service time in microseconds.
    #[must_use]
    pub fn mean_service_time(mut self, mean_service_time: f64) -> Self {
        self.mean_service_time = mean_service_time;
        self
    }

    /// Seed of the random number generator. Without it, the generator is seeded from entropy.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Generates the rows, sorted by arrival time, with IDs `0..num_processes`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the arrival rate or mean service time is not
    /// a positive finite number.
    pub fn generate(&self) -> Result<Vec<ProcessRow>> {
        let arrivals = exponential("arrival_rate", self.arrival_rate)?;
        let services = exponential("mean_service_time", 1.0 / self.mean_service_time)?;
        let mut rng = if let Some(seed) = self.seed {
            ChaChaRng::seed_from_u64(seed)
        } else {
            ChaChaRng::from_entropy()
        };
        let mut clock = 0.0_f64;
        Ok((0..self.num_processes)
            .map(|id| {
                if id > 0 {
                    clock += arrivals.sample(&mut rng);
                }
                let service: f64 = services.sample(&mut rng);
                ProcessRow::new(id, clock.round() as u64, service.ceil().max(1.0) as u64)
            })
            .collect())
    }
}

fn exponential(name: &'static str, lambda: f64) -> Result<Exp<f64>> {
    if !lambda.is_finite() || lambda <= 0.0 {
        return Err(Error::InvalidParameter {
            name,
            value: lambda,
        });
    }
    Exp::new(lambda).map_err(|_| Error::InvalidParameter {
        name,
        value: lambda,
    })
}
