use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use workload::ProcessRow;

use crate::{InvalidConfiguration, ProcessId, Result};

/// Lifecycle state of a process.
///
/// ```text
/// New -> Ready -> Running -> Ready
///                         -> Terminated
/// ```
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
pub enum ProcessState {
    /// Has not arrived yet.
    New,
    /// Arrived and waiting for the CPU.
    Ready,
    /// Currently holding the CPU.
    Running,
    /// Finished; terminal.
    Terminated,
}

/// Workload description of a single process.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    /// Unique process ID.
    pub id: ProcessId,
    /// Time at which the process becomes eligible to run.
    pub arrival_time: Duration,
    /// Total CPU time required.
    pub service_time: Duration,
}

impl ProcessSpec {
    /// Constructs a new process description.
    #[must_use]
    pub fn new(id: usize, arrival_time: Duration, service_time: Duration) -> Self {
        Self {
            id: ProcessId::from(id),
            arrival_time,
            service_time,
        }
    }
}

impl From<ProcessRow> for ProcessSpec {
    fn from(row: ProcessRow) -> Self {
        Self::new(
            row.id,
            Duration::from_micros(row.arrival_time),
            Duration::from_micros(row.service_time),
        )
    }
}

/// A simulated job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    id: ProcessId,
    arrival_time: Duration,
    service_time: Duration,
    remaining_time: Duration,
    state: ProcessState,
    first_run_time: Option<Duration>,
    departure_time: Option<Duration>,
}

impl Process {
    /// Constructs a new process in the [`ProcessState::New`] state.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConfiguration::ZeroServiceTime`] if the process requires no CPU time.
    pub fn new(spec: ProcessSpec) -> Result<Self> {
        if spec.service_time == Duration::default() {
            return Err(InvalidConfiguration::ZeroServiceTime(spec.id).into());
        }
        Ok(Self {
            id: spec.id,
            arrival_time: spec.arrival_time,
            service_time: spec.service_time,
            remaining_time: spec.service_time,
            state: ProcessState::New,
            first_run_time: None,
            departure_time: None,
        })
    }

    /// Process ID.
    #[must_use]
    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// Time at which the process becomes eligible to run.
    #[must_use]
    pub fn arrival_time(&self) -> Duration {
        self.arrival_time
    }

    /// Total CPU time required.
    #[must_use]
    pub fn service_time(&self) -> Duration {
        self.service_time
    }

    /// CPU time still required.
    #[must_use]
    pub fn remaining_time(&self) -> Duration {
        self.remaining_time
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// The time at which the process was first dispatched, if ever.
    #[must_use]
    pub fn first_run_time(&self) -> Option<Duration> {
        self.first_run_time
    }

    /// The time at which the process terminated, if it did.
    #[must_use]
    pub fn departure_time(&self) -> Option<Duration> {
        self.departure_time
    }

    pub(crate) fn set_state(&mut self, state: ProcessState) {
        self.state = state;
    }

    /// Runs the process starting at `now` for `amount`, or until it finishes if that comes first.
    /// Returns the time it actually ran for.
    pub(crate) fn run_for(&mut self, amount: Duration, now: Duration) -> Duration {
        let ran_for = std::cmp::min(amount, self.remaining_time);
        self.first_run_time.get_or_insert(now);
        self.remaining_time -= ran_for;
        if self.remaining_time == Duration::default() {
            self.departure_time = Some(now + ran_for);
        }
        ran_for
    }
}

/// Stable handle of a process within a [`ProcessTable`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(pub(crate) usize);

/// Process arena with an explicit scheduling order.
///
/// Processes never move within the arena, so a [`Slot`] stays valid for the entire simulation.
/// The scheduling order is a separate sequence of slots that policies may rearrange.
/// Initially, the order is by arrival time, with ties resolved by the input order.
#[derive(Debug, Clone)]
pub struct ProcessTable {
    processes: Vec<Process>,
    order: Vec<Slot>,
}

impl ProcessTable {
    /// Constructs a table from process descriptions.
    ///
    /// # Errors
    ///
    /// Fails if any ID is repeated or any process has zero service time.
    pub fn new<I>(specs: I) -> Result<Self>
    where
        I: IntoIterator<Item = ProcessSpec>,
    {
        let mut seen = HashSet::new();
        let processes = specs
            .into_iter()
            .map(|spec| {
                if seen.insert(spec.id) {
                    Process::new(spec)
                } else {
                    Err(InvalidConfiguration::DuplicateProcessId(spec.id).into())
                }
            })
            .collect::<Result<Vec<_>>>()?;
        let mut order: Vec<_> = (0..processes.len()).map(Slot).collect();
        order.sort_by_key(|slot| processes[slot.0].arrival_time);
        Ok(Self { processes, order })
    }

    /// Number of processes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    /// Answers whether there are no processes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Returns the process in `slot`.
    #[must_use]
    pub fn get(&self, slot: Slot) -> &Process {
        &self.processes[slot.0]
    }

    pub(crate) fn get_mut(&mut self, slot: Slot) -> &mut Process {
        &mut self.processes[slot.0]
    }

    /// Finds the slot of the process with the given ID.
    #[must_use]
    pub fn slot_of(&self, id: ProcessId) -> Option<Slot> {
        self.processes.iter().position(|p| p.id == id).map(Slot)
    }

    /// Iterates over slots in the scheduling order.
    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.order.iter().copied()
    }

    /// Iterates over processes in the scheduling order.
    pub fn iter(&self) -> impl Iterator<Item = &Process> + '_ {
        self.order.iter().map(move |slot| &self.processes[slot.0])
    }

    /// Position of `slot` in the scheduling order.
    #[must_use]
    pub fn position(&self, slot: Slot) -> Option<usize> {
        self.order.iter().position(|&s| s == slot)
    }

    /// Moves `slot` to `position` in the scheduling order. The position is interpreted after
    /// removing the slot, and is clamped to the end of the order.
    pub fn move_to(&mut self, slot: Slot, position: usize) {
        if let Some(current) = self.position(slot) {
            self.order.remove(current);
            let position = std::cmp::min(position, self.order.len());
            self.order.insert(position, slot);
        }
    }

    /// Number of processes that have arrived, i.e., are not [`ProcessState::New`].
    #[must_use]
    pub fn count_arrived(&self) -> usize {
        self.processes
            .iter()
            .filter(|p| p.state != ProcessState::New)
            .count()
    }

    /// Transitions every new process with arrival time not later than `now` to ready.
    /// Returns the number of transitioned processes.
    pub fn admit_arrivals(&mut self, now: Duration) -> usize {
        let mut admitted = 0;
        for process in &mut self.processes {
            if process.state == ProcessState::New && process.arrival_time <= now {
                process.state = ProcessState::Ready;
                admitted += 1;
            }
        }
        admitted
    }

    /// Answers whether any process is ready.
    #[must_use]
    pub fn has_ready(&self) -> bool {
        self.processes
            .iter()
            .any(|p| p.state == ProcessState::Ready)
    }

    /// Answers whether every process has terminated.
    #[must_use]
    pub fn all_terminated(&self) -> bool {
        self.processes
            .iter()
            .all(|p| p.state == ProcessState::Terminated)
    }

    /// Consumes the table and returns the processes in the scheduling order.
    #[must_use]
    pub fn into_processes(self) -> Vec<Process> {
        let mut processes: Vec<_> = self.processes.into_iter().map(Some).collect();
        self.order
            .into_iter()
            .filter_map(|slot| processes[slot.0].take())
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Error;

    fn spec(id: usize, arrival: u64, service: u64) -> ProcessSpec {
        ProcessSpec::new(
            id,
            Duration::from_micros(arrival),
            Duration::from_micros(service),
        )
    }

    fn ids(table: &ProcessTable) -> Vec<usize> {
        table.iter().map(|p| usize::from(p.id())).collect()
    }

    #[test]
    fn test_run_for() -> Result<()> {
        let us = Duration::from_micros;
        let mut process = Process::new(spec(0, 1, 5))?;
        assert_eq!(process.state(), ProcessState::New);
        assert_eq!(process.remaining_time(), us(5));
        assert_eq!(process.run_for(us(2), us(3)), us(2));
        assert_eq!(process.remaining_time(), us(3));
        assert_eq!(process.first_run_time(), Some(us(3)));
        assert_eq!(process.departure_time(), None);
        assert_eq!(process.run_for(us(10), us(7)), us(3));
        assert_eq!(process.remaining_time(), Duration::default());
        assert_eq!(process.first_run_time(), Some(us(3)));
        assert_eq!(process.departure_time(), Some(us(10)));
        Ok(())
    }

    #[test]
    fn test_zero_service_time() {
        assert_eq!(
            Process::new(spec(4, 0, 0)),
            Err(Error::InvalidConfiguration(
                InvalidConfiguration::ZeroServiceTime(ProcessId::from(4))
            ))
        );
    }

    #[test]
    fn test_duplicate_ids() {
        assert_eq!(
            ProcessTable::new(vec![spec(1, 0, 1), spec(2, 0, 1), spec(1, 3, 1)]).err(),
            Some(Error::InvalidConfiguration(
                InvalidConfiguration::DuplicateProcessId(ProcessId::from(1))
            ))
        );
    }

    #[test]
    fn test_initial_order() -> Result<()> {
        let table = ProcessTable::new(vec![
            spec(0, 5, 1),
            spec(1, 2, 1),
            spec(2, 5, 1),
            spec(3, 0, 1),
            spec(4, 2, 1),
        ])?;
        assert_eq!(ids(&table), vec![3, 1, 4, 0, 2]);
        assert_eq!(table.len(), 5);
        assert_eq!(table.slot_of(ProcessId::from(4)), Some(Slot(4)));
        assert_eq!(table.position(Slot(4)), Some(2));
        Ok(())
    }

    #[test]
    fn test_admit_arrivals() -> Result<()> {
        let mut table = ProcessTable::new(vec![spec(0, 0, 1), spec(1, 2, 1), spec(2, 3, 1)])?;
        assert_eq!(table.count_arrived(), 0);
        assert!(!table.has_ready());
        assert_eq!(table.admit_arrivals(Duration::from_micros(2)), 2);
        assert_eq!(table.admit_arrivals(Duration::from_micros(2)), 0);
        assert_eq!(table.count_arrived(), 2);
        assert!(table.has_ready());
        assert_eq!(table.get(Slot(2)).state(), ProcessState::New);
        Ok(())
    }

    #[test]
    fn test_move_to() -> Result<()> {
        let mut table = ProcessTable::new((0..4).map(|id| spec(id, 0, 1)))?;
        table.move_to(Slot(0), 2);
        assert_eq!(ids(&table), vec![1, 2, 0, 3]);
        table.move_to(Slot(3), 0);
        assert_eq!(ids(&table), vec![3, 1, 2, 0]);
        table.move_to(Slot(1), 100);
        assert_eq!(ids(&table), vec![3, 2, 0, 1]);
        let processes = table.into_processes();
        assert_eq!(
            processes.iter().map(|p| usize::from(p.id())).collect::<Vec<_>>(),
            vec![3, 2, 0, 1]
        );
        Ok(())
    }

    #[test]
    fn test_all_terminated() -> Result<()> {
        let mut table = ProcessTable::new(vec![spec(0, 0, 1)])?;
        assert!(!table.all_terminated());
        table.get_mut(Slot(0)).set_state(ProcessState::Terminated);
        assert!(table.all_terminated());
        assert!(ProcessTable::new(Vec::new())?.all_terminated());
        Ok(())
    }
}
