use std::time::Duration;

use super::{get_ready, run, PolicyKind, SchedulerPolicy};
use crate::{Event, EventQueue, Process, ProcessTable, Result, Slot};

/// Runs the ready process with the shortest service time to completion.
#[derive(Debug, Default, Copy, Clone)]
pub struct ShortestJobFirst;

impl SchedulerPolicy for ShortestJobFirst {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Sjf
    }

    fn select(&self, processes: &ProcessTable, event: &Event) -> Result<Slot> {
        get_ready(processes, event.time(), Process::service_time)
    }

    fn dispatch(
        &self,
        processes: &mut ProcessTable,
        slot: Slot,
        now: Duration,
        _: &EventQueue,
    ) -> Result<Event> {
        // Never preempted, so the service time is what remains.
        let service = processes.get(slot).service_time();
        run(processes, slot, service, now)
    }
}
