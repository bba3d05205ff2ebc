use std::time::Duration;

use crate::{
    Event, EventKind, EventQueue, PolicyKind, Process, ProcessId, ProcessSpec, ProcessState,
    ProcessTable, Result, RunSpan, SchedulerPolicy, Trace,
};

/// Final state of a finished simulation.
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    /// Policy that was simulated.
    pub policy: PolicyKind,
    /// All processes in their final scheduling order.
    pub processes: Vec<Process>,
    /// Fired events and dispatches.
    pub trace: Trace,
}

/// The discrete-event simulation driver.
///
/// The engine owns the processes and the event queue. It is seeded with one arrival event per
/// process and repeatedly pops the earliest event, admits arrived processes, and, if the CPU is
/// free, asks the policy to select and dispatch a ready process. The event returned from the
/// dispatch holds the CPU until it fires.
pub struct SimulationEngine {
    processes: ProcessTable,
    queue: EventQueue,
    time: Duration,
    running: Option<ProcessId>,
    policy: Box<dyn SchedulerPolicy>,
    trace: Trace,
}

impl SimulationEngine {
    /// Constructs a simulation of `processes` under `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`](crate::Error::InvalidConfiguration) if a process
    /// ID is repeated or a process has zero service time.
    pub fn new<I>(processes: I, policy: Box<dyn SchedulerPolicy>) -> Result<Self>
    where
        I: IntoIterator<Item = ProcessSpec>,
    {
        let processes = ProcessTable::new(processes)?;
        let mut queue = EventQueue::default();
        for process in processes.iter() {
            queue.push(Event::new(
                process.id(),
                EventKind::ProcArrival,
                process.arrival_time(),
            ));
        }
        Ok(Self {
            processes,
            queue,
            time: Duration::default(),
            running: None,
            policy,
            trace: Trace::default(),
        })
    }

    /// Current simulated time.
    #[must_use]
    pub fn time(&self) -> Duration {
        self.time
    }

    /// The policy being simulated.
    #[must_use]
    pub fn policy(&self) -> PolicyKind {
        self.policy.kind()
    }

    /// The process currently holding the CPU.
    #[must_use]
    pub fn running(&self) -> Option<ProcessId> {
        self.running
    }

    /// Iterates over processes in the current scheduling order.
    pub fn processes(&self) -> impl Iterator<Item = &Process> + '_ {
        self.processes.iter()
    }

    /// Number of processes that have terminated.
    #[must_use]
    pub fn num_terminated(&self) -> usize {
        self.processes
            .iter()
            .filter(|p| p.state() == ProcessState::Terminated)
            .count()
    }

    /// Total number of processes.
    #[must_use]
    pub fn num_processes(&self) -> usize {
        self.processes.len()
    }

    /// Events that have not fired yet.
    #[must_use]
    pub fn pending(&self) -> &EventQueue {
        &self.queue
    }

    /// Record of the simulation so far.
    #[must_use]
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Processes the next event. Returns `false` if there were no events left.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoReadyProcess`](crate::Error::NoReadyProcess) if an event expected
    /// a ready process but found none. After an error, the state up to the failing event
    /// remains available.
    pub fn step(&mut self) -> Result<bool> {
        if self.queue.is_empty() {
            return Ok(false);
        }
        let event = self.queue.pop()?;
        debug_assert!(event.time() >= self.time, "events must not go back in time");
        self.time = event.time();
        self.trace.record_event(&event);
        log::trace!(
            "[{:?}] {} for process {}",
            self.time,
            event.kind(),
            event.process_id()
        );

        let admitted = self.processes.admit_arrivals(self.time);
        if admitted > 0 {
            log::debug!("[{:?}] {} process(es) arrived", self.time, admitted);
        }

        match event.kind() {
            EventKind::ProcArrival => {
                if self.running.is_some() {
                    return Ok(true);
                }
            }
            EventKind::ProcCpuReq => {
                debug_assert_eq!(self.running, Some(event.process_id()));
                self.running = None;
            }
            EventKind::ProcCpuDone => {
                debug_assert_eq!(self.running, Some(event.process_id()));
                self.running = None;
                if !self.processes.has_ready() {
                    log::debug!("[{:?}] CPU idle", self.time);
                    return Ok(true);
                }
            }
        }

        let slot = self.policy.select(&self.processes, &event)?;
        let next = self
            .policy
            .dispatch(&mut self.processes, slot, self.time, &self.queue)?;
        let process = self.processes.get(slot);
        log::debug!(
            "[{:?}] Process {} ran until {:?} ({:?} remaining)",
            self.time,
            process.id(),
            next.time(),
            process.remaining_time()
        );
        self.trace.record_run(RunSpan {
            process_id: process.id(),
            start: self.time,
            end: next.time(),
            remaining: process.remaining_time(),
        });
        self.running = Some(next.process_id());
        self.queue.push(next);
        Ok(true)
    }

    /// Runs until no events are left.
    ///
    /// # Errors
    ///
    /// See [`SimulationEngine::step`].
    pub fn run(&mut self) -> Result<()> {
        while self.step()? {}
        log::info!(
            "Simulation of {} processes under {} finished at {:?}",
            self.processes.len(),
            self.policy.kind(),
            self.time
        );
        Ok(())
    }

    /// Consumes the engine, returning the final state of the processes and the trace.
    #[must_use]
    pub fn into_outcome(self) -> SimulationOutcome {
        SimulationOutcome {
            policy: self.policy.kind(),
            processes: self.processes.into_processes(),
            trace: self.trace,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Error, FirstComeFirstServed};

    fn spec(id: usize, arrival: u64, service: u64) -> ProcessSpec {
        ProcessSpec::new(
            id,
            Duration::from_micros(arrival),
            Duration::from_micros(service),
        )
    }

    #[test]
    fn test_seeded_with_arrivals() -> Result<()> {
        let engine = SimulationEngine::new(
            vec![spec(0, 4, 1), spec(1, 1, 1)],
            Box::new(FirstComeFirstServed),
        )?;
        assert_eq!(engine.pending().len(), 2);
        assert_eq!(engine.pending().peek_time()?, Duration::from_micros(1));
        assert_eq!(engine.policy(), PolicyKind::Fcfs);
        assert_eq!(engine.num_processes(), 2);
        Ok(())
    }

    #[test]
    fn test_step_by_step() -> Result<()> {
        let mut engine = SimulationEngine::new(
            vec![spec(0, 0, 5), spec(1, 2, 3)],
            Box::new(FirstComeFirstServed),
        )?;
        assert!(engine.step()?);
        assert_eq!(engine.time(), Duration::default());
        assert_eq!(engine.running(), Some(ProcessId::from(0)));
        assert!(engine.step()?);
        assert_eq!(engine.time(), Duration::from_micros(2));
        assert_eq!(engine.trace().runs().len(), 1);
        assert!(engine.step()?);
        assert_eq!(engine.time(), Duration::from_micros(5));
        assert_eq!(engine.running(), Some(ProcessId::from(1)));
        assert!(engine.step()?);
        assert_eq!(engine.time(), Duration::from_micros(8));
        assert_eq!(engine.running(), None);
        assert!(!engine.step()?);
        assert_eq!(engine.num_terminated(), 2);
        let outcome = engine.into_outcome();
        assert!(outcome
            .processes
            .iter()
            .all(|p| p.state() == ProcessState::Terminated));
        assert_eq!(outcome.trace.events().len(), 4);
        Ok(())
    }

    #[test]
    fn test_idle_gap() -> Result<()> {
        let mut engine = SimulationEngine::new(
            vec![spec(0, 0, 2), spec(1, 10, 1)],
            Box::new(FirstComeFirstServed),
        )?;
        engine.run()?;
        let runs: Vec<_> = engine
            .trace()
            .runs()
            .iter()
            .map(|r| (r.start.as_micros(), r.end.as_micros()))
            .collect();
        assert_eq!(runs, vec![(0, 2), (10, 11)]);
        Ok(())
    }

    #[test]
    fn test_empty_workload() -> Result<()> {
        let mut engine = SimulationEngine::new(Vec::new(), Box::new(FirstComeFirstServed))?;
        engine.run()?;
        assert_eq!(engine.time(), Duration::default());
        assert!(engine.trace().events().is_empty());
        Ok(())
    }

    #[test]
    fn test_no_ready_process() -> Result<()> {
        let mut engine =
            SimulationEngine::new(vec![spec(0, 3, 1)], Box::new(FirstComeFirstServed))?;
        // An arrival for a process that has not arrived yet is a malformed trace.
        engine.queue.push(Event::new(
            ProcessId::from(0),
            EventKind::ProcArrival,
            Duration::from_micros(1),
        ));
        assert_eq!(
            engine.step(),
            Err(Error::NoReadyProcess(Duration::from_micros(1)))
        );
        assert_eq!(engine.time(), Duration::from_micros(1));
        assert_eq!(engine.trace().events().len(), 1);
        Ok(())
    }
}
