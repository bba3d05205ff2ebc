use std::time::Duration;

use super::{finish, get_ready, start, PolicyKind, SchedulerPolicy};
use crate::{
    Event, EventKind, EventQueue, InvalidConfiguration, ProcessState, ProcessTable, Result, Slot,
};

/// Runs ready processes in turns of at most one quantum each.
///
/// A process that does not finish within its quantum goes back to the ready queue, behind
/// every process that has arrived before its quantum ended.
#[derive(Debug, Copy, Clone)]
pub struct RoundRobin {
    quantum: Duration,
}

impl RoundRobin {
    /// Constructs a round-robin policy with the given quantum.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConfiguration::ZeroQuantum`] if the quantum is zero.
    pub fn new(quantum: Duration) -> Result<Self> {
        if quantum == Duration::default() {
            Err(InvalidConfiguration::ZeroQuantum.into())
        } else {
            Ok(Self { quantum })
        }
    }

    /// The maximum time a process runs per dispatch.
    #[must_use]
    pub fn quantum(&self) -> Duration {
        self.quantum
    }
}

/// Computes the position in the scheduling order at which a process preempted at `end` after
/// running since `start` is re-inserted.
///
/// The process goes right after all processes that have already arrived, and then one further
/// for each event pending strictly between `start` and `end`. Those events are arrivals that
/// happened while the process was running but have not been admitted yet; the arriving
/// processes are still new and sit right behind the arrived ones, because the order is sorted
/// by arrival among new processes. The position is interpreted with `slot` removed from the
/// order.
#[must_use]
pub fn requeue_index(
    processes: &ProcessTable,
    slot: Slot,
    start: Duration,
    end: Duration,
    pending: &EventQueue,
) -> usize {
    let arrived = processes
        .slots()
        .filter(|&s| s != slot && processes.get(s).state() != ProcessState::New)
        .count();
    let others = processes.len().saturating_sub(1);
    std::cmp::min(arrived + pending.count_between(start, end), others)
}

impl SchedulerPolicy for RoundRobin {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Rr
    }

    fn select(&self, processes: &ProcessTable, event: &Event) -> Result<Slot> {
        get_ready(processes, event.time(), |_| ())
    }

    fn dispatch(
        &self,
        processes: &mut ProcessTable,
        slot: Slot,
        now: Duration,
        pending: &EventQueue,
    ) -> Result<Event> {
        let process = start(processes, slot)?;
        let ran_for = process.run_for(self.quantum, now);
        let event = finish(process, now, ran_for);
        if event.kind() == EventKind::ProcCpuReq {
            let index = requeue_index(processes, slot, now, event.time(), pending);
            log::debug!(
                "Process {} preempted at {:?}, re-queued at position {}",
                event.process_id(),
                event.time(),
                index
            );
            processes.move_to(slot, index);
        }
        Ok(event)
    }
}
