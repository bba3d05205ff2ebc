use std::time::Duration;

use super::{get_ready, run, PolicyKind, SchedulerPolicy};
use crate::{Event, EventQueue, ProcessTable, Result, Slot};

/// Runs processes to completion in the order of arrival.
#[derive(Debug, Default, Copy, Clone)]
pub struct FirstComeFirstServed;

impl SchedulerPolicy for FirstComeFirstServed {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Fcfs
    }

    fn select(&self, processes: &ProcessTable, event: &Event) -> Result<Slot> {
        get_ready(processes, event.time(), |_| ())
    }

    fn dispatch(
        &self,
        processes: &mut ProcessTable,
        slot: Slot,
        now: Duration,
        _: &EventQueue,
    ) -> Result<Event> {
        let remaining = processes.get(slot).remaining_time();
        run(processes, slot, remaining, now)
    }
}
