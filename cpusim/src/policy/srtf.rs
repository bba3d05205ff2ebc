use std::time::Duration;

use super::{get_ready, run, PolicyKind, SchedulerPolicy};
use crate::{Event, EventQueue, Process, ProcessTable, Result, Slot};

/// Preemptive variant of shortest-job-first: runs the ready process with the least remaining
/// time until the next pending event, at which point the selection is made again.
#[derive(Debug, Default, Copy, Clone)]
pub struct ShortestRemainingTimeFirst;

impl SchedulerPolicy for ShortestRemainingTimeFirst {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Srtf
    }

    fn select(&self, processes: &ProcessTable, event: &Event) -> Result<Slot> {
        get_ready(processes, event.time(), Process::remaining_time)
    }

    fn dispatch(
        &self,
        processes: &mut ProcessTable,
        slot: Slot,
        now: Duration,
        pending: &EventQueue,
    ) -> Result<Event> {
        // Events pending at `now` are arrivals that have already been admitted.
        let horizon = pending
            .next_time_after(now)
            .map_or_else(|| processes.get(slot).remaining_time(), |next| next - now);
        run(processes, slot, horizon, now)
    }
}

#[cfg(test)]
mod test {
    use super::super::test::{arrival, table};
    use super::*;
    use crate::{EventKind, ProcessId, ProcessState};

    #[test]
    fn test_runs_until_next_event() -> Result<()> {
        let mut processes = table(&[(0, 10), (0, 4), (3, 1)]);
        let now = Duration::default();
        processes.admit_arrivals(now);
        let mut pending = EventQueue::default();
        pending.push(arrival(1, 0));
        pending.push(arrival(2, 3));
        let policy = ShortestRemainingTimeFirst;
        let slot = policy.select(&processes, &arrival(0, 0))?;
        assert_eq!(slot, Slot(1));
        let event = policy.dispatch(&mut processes, slot, now, &pending)?;
        assert_eq!(
            event,
            Event::new(
                ProcessId::from(1),
                EventKind::ProcCpuReq,
                Duration::from_micros(3)
            )
        );
        let process = processes.get(slot);
        assert_eq!(process.state(), ProcessState::Ready);
        assert_eq!(process.remaining_time(), Duration::from_micros(1));
        Ok(())
    }

    #[test]
    fn test_finishes_before_next_event() -> Result<()> {
        let mut processes = table(&[(0, 2), (5, 1)]);
        let now = Duration::default();
        processes.admit_arrivals(now);
        let mut pending = EventQueue::default();
        pending.push(arrival(1, 5));
        let policy = ShortestRemainingTimeFirst;
        let event = policy.dispatch(&mut processes, Slot(0), now, &pending)?;
        assert_eq!(event.kind(), EventKind::ProcCpuDone);
        assert_eq!(event.time(), Duration::from_micros(2));
        let event = policy.dispatch(&mut processes, Slot(0), event.time(), &pending);
        assert!(event.is_err());
        Ok(())
    }

    #[test]
    fn test_runs_to_completion_without_pending_events() -> Result<()> {
        let mut processes = table(&[(0, 7)]);
        processes.admit_arrivals(Duration::default());
        let event = ShortestRemainingTimeFirst.dispatch(
            &mut processes,
            Slot(0),
            Duration::default(),
            &EventQueue::default(),
        )?;
        assert_eq!(event.kind(), EventKind::ProcCpuDone);
        assert_eq!(event.time(), Duration::from_micros(7));
        Ok(())
    }
}
