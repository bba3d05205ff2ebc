//! Discrete-event simulation of CPU scheduling.
//!
//! A fixed set of processes is run on a single simulated CPU under one of the interchangeable
//! scheduling policies: first-come-first-served, shortest-job-first, round-robin, and
//! shortest-remaining-time-first. The simulation produces the final state of every process
//! together with a trace of fired events and dispatched runs.
//!
//! # Examples
//!
//! ```
//! # use std::time::Duration;
//! # use cpusim::{PolicyKind, ProcessSpec, SimulationEngine};
//! let processes = vec![
//!     ProcessSpec::new(1, Duration::from_micros(0), Duration::from_micros(5)),
//!     ProcessSpec::new(2, Duration::from_micros(2), Duration::from_micros(3)),
//! ];
//! let policy = PolicyKind::Fcfs.build(None)?;
//! let mut engine = SimulationEngine::new(processes, policy)?;
//! engine.run()?;
//! let departures: Vec<_> = engine
//!     .processes()
//!     .map(|p| p.departure_time().map(|t| t.as_micros()))
//!     .collect();
//! assert_eq!(departures, vec![Some(5), Some(8)]);
//! # Ok::<(), cpusim::Error>(())
//! ```

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
    clippy::cast_precision_loss
)]
#![deny(unsafe_code)]

use std::time::Duration;

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

mod engine;
mod event;
mod policy;
mod process;
mod queue;
mod report;
mod trace;

pub use engine::{SimulationEngine, SimulationOutcome};
pub use event::{Event, EventKind};
pub use policy::{
    get_ready, requeue_index, FirstComeFirstServed, PolicyKind, RoundRobin, SchedulerPolicy,
    ShortestJobFirst, ShortestRemainingTimeFirst,
};
pub use process::{Process, ProcessSpec, ProcessState, ProcessTable, Slot};
pub use queue::EventQueue;
pub use report::{ProcessReport, Report, Summary};
pub use trace::{RunSpan, Trace, TraceEvent};

/// Process ID.
#[derive(
    From,
    Into,
    Debug,
    PartialEq,
    PartialOrd,
    Eq,
    Ord,
    Serialize,
    Deserialize,
    Copy,
    Clone,
    Hash,
    Display,
)]
pub struct ProcessId(usize);

/// Reasons for rejecting a simulation setup before it starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidConfiguration {
    /// Round-robin requires a positive quantum.
    #[error("quantum must be positive")]
    ZeroQuantum,
    /// Round-robin was requested without a quantum.
    #[error("round-robin requires a quantum")]
    MissingQuantum,
    /// Every process must require some CPU time.
    #[error("process {0} has zero service time")]
    ZeroServiceTime(ProcessId),
    /// Process IDs must be unique.
    #[error("process ID {0} is not unique")]
    DuplicateProcessId(ProcessId),
}

/// Error type encompassing all simulation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Attempted to pop or peek an empty event queue.
    #[error("The event queue is empty.")]
    EmptyQueue,
    /// An event fired expecting a ready process but none was ready.
    #[error("No process is ready to run at {0:?}.")]
    NoReadyProcess(Duration),
    /// The simulation was set up with invalid parameters.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] InvalidConfiguration),
    /// A process was dispatched while not ready.
    #[error("Process {id} cannot be dispatched in state {state}.")]
    NotReady {
        /// Offending process.
        id: ProcessId,
        /// The state it was in.
        state: ProcessState,
    },
    /// A report was requested for a process that has not terminated.
    #[error("Process {0} has not terminated.")]
    Unfinished(ProcessId),
}

/// Result alias using [`Error`](enum.Error.html).
pub type Result<T> = std::result::Result<T, Error>;

/// Serializes durations as integer microseconds, the time unit of all input and output files.
pub(crate) mod micros {
    use std::convert::TryFrom;
    use std::time::Duration;

    use serde::Serializer;

    fn to_micros(time: Duration) -> u64 {
        u64::try_from(time.as_micros()).unwrap_or(u64::MAX)
    }

    pub fn serialize<S: Serializer>(time: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(to_micros(*time))
    }
}
