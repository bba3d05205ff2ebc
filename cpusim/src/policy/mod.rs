//! Scheduling policies.
//!
//! Each policy decides which ready process runs next ([`SchedulerPolicy::select`]) and for how
//! long ([`SchedulerPolicy::dispatch`]). [`PolicyKind`] enumerates the implementations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    Error, Event, EventKind, EventQueue, InvalidConfiguration, Process, ProcessState,
    ProcessTable, Result, Slot,
};

mod fcfs;
mod round_robin;
mod sjf;
mod srtf;

pub use fcfs::FirstComeFirstServed;
pub use round_robin::{requeue_index, RoundRobin};
pub use sjf::ShortestJobFirst;
pub use srtf::ShortestRemainingTimeFirst;

/// Implementors are scheduling policies that pick and run ready processes.
pub trait SchedulerPolicy {
    /// Which policy this is.
    fn kind(&self) -> PolicyKind;

    /// Selects the ready process to run after `event` has fired.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoReadyProcess`] if no process is ready.
    fn select(&self, processes: &ProcessTable, event: &Event) -> Result<Slot>;

    /// Runs the process in `slot` starting at `now` and returns its follow-up event:
    /// [`EventKind::ProcCpuReq`] if it still needs the CPU, [`EventKind::ProcCpuDone`] if it
    /// has terminated. `pending` are the events that have not fired yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] if the process is not ready.
    fn dispatch(
        &self,
        processes: &mut ProcessTable,
        slot: Slot,
        now: Duration,
        pending: &EventQueue,
    ) -> Result<Event>;
}

/// Type of scheduling policy.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// See [`FirstComeFirstServed`].
    Fcfs,
    /// See [`ShortestJobFirst`].
    Sjf,
    /// See [`RoundRobin`].
    Rr,
    /// See [`ShortestRemainingTimeFirst`].
    Srtf,
}

impl PolicyKind {
    /// Constructs the policy. The quantum is required by [`PolicyKind::Rr`] and ignored by all
    /// other policies.
    ///
    /// # Errors
    ///
    /// Returns an error if round-robin is requested without a positive quantum.
    pub fn build(self, quantum: Option<Duration>) -> Result<Box<dyn SchedulerPolicy>> {
        Ok(match self {
            Self::Fcfs => Box::new(FirstComeFirstServed),
            Self::Sjf => Box::new(ShortestJobFirst),
            Self::Rr => Box::new(RoundRobin::new(
                quantum.ok_or(InvalidConfiguration::MissingQuantum)?,
            )?),
            Self::Srtf => Box::new(ShortestRemainingTimeFirst),
        })
    }
}

/// Returns the first ready process in the scheduling order after ordering by `key`.
/// Among processes with equal keys, the earlier in the scheduling order wins.
///
/// # Errors
///
/// Returns [`Error::NoReadyProcess`] at time `now` if no process is ready.
pub fn get_ready<K, F>(processes: &ProcessTable, now: Duration, key: F) -> Result<Slot>
where
    K: Ord,
    F: Fn(&Process) -> K,
{
    processes
        .slots()
        .filter(|&slot| processes.get(slot).state() == ProcessState::Ready)
        .min_by_key(|&slot| key(processes.get(slot)))
        .ok_or(Error::NoReadyProcess(now))
}

/// Moves a ready process to the running state and returns it.
fn start(processes: &mut ProcessTable, slot: Slot) -> Result<&mut Process> {
    let process = processes.get_mut(slot);
    match process.state() {
        ProcessState::Ready => {
            process.set_state(ProcessState::Running);
            Ok(process)
        }
        state => Err(Error::NotReady {
            id: process.id(),
            state,
        }),
    }
}

/// Settles the state of a process that has just run from `now` for `ran_for`
/// and produces its follow-up event.
fn finish(process: &mut Process, now: Duration, ran_for: Duration) -> Event {
    let kind = if process.remaining_time() == Duration::default() {
        process.set_state(ProcessState::Terminated);
        EventKind::ProcCpuDone
    } else {
        process.set_state(ProcessState::Ready);
        EventKind::ProcCpuReq
    };
    Event::new(process.id(), kind, now + ran_for)
}

/// Runs the process in `slot` for at most `amount` starting at `now`.
fn run(processes: &mut ProcessTable, slot: Slot, amount: Duration, now: Duration) -> Result<Event> {
    let process = start(processes, slot)?;
    let ran_for = process.run_for(amount, now);
    Ok(finish(process, now, ran_for))
}
