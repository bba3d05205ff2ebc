use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ProcessId;

/// What happened to a process.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// The process has entered the system.
    ProcArrival,
    /// The process has been preempted and still needs CPU.
    ProcCpuReq,
    /// The process has finished.
    ProcCpuDone,
}

/// An event concerning a single process, firing at a given simulated time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Event {
    process_id: ProcessId,
    kind: EventKind,
    time: Duration,
}

impl Event {
    /// Constructs a new event.
    #[must_use]
    pub fn new(process_id: ProcessId, kind: EventKind, time: Duration) -> Self {
        Self {
            process_id,
            kind,
            time,
        }
    }

    /// The process this event concerns.
    #[must_use]
    pub fn process_id(&self) -> ProcessId {
        self.process_id
    }

    /// Event kind.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Simulated time at which the event fires.
    #[must_use]
    pub fn time(&self) -> Duration {
        self.time
    }
}
