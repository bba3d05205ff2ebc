use std::io::Write;
use std::time::Duration;

use serde::Serialize;

use crate::{micros, Event, EventKind, ProcessId};

/// An event that has fired, in the order of firing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEvent {
    /// Firing time.
    #[serde(serialize_with = "micros::serialize")]
    pub time: Duration,
    /// The process the event concerns.
    pub process_id: ProcessId,
    /// Event kind.
    pub kind: EventKind,
}

impl From<&Event> for TraceEvent {
    fn from(event: &Event) -> Self {
        Self {
            time: event.time(),
            process_id: event.process_id(),
            kind: event.kind(),
        }
    }
}

/// A single dispatch: a process holding the CPU between `start` and `end`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct RunSpan {
    /// The process that ran.
    pub process_id: ProcessId,
    /// When it started running.
    #[serde(serialize_with = "micros::serialize")]
    pub start: Duration,
    /// When it stopped running.
    #[serde(serialize_with = "micros::serialize")]
    pub end: Duration,
    /// CPU time it still required afterwards.
    #[serde(serialize_with = "micros::serialize")]
    pub remaining: Duration,
}

impl RunSpan {
    /// How long the process ran.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Record of a simulation run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Trace {
    events: Vec<TraceEvent>,
    runs: Vec<RunSpan>,
}

impl Trace {
    pub(crate) fn record_event(&mut self, event: &Event) {
        self.events.push(TraceEvent::from(event));
    }

    pub(crate) fn record_run(&mut self, run: RunSpan) {
        self.runs.push(run);
    }

    /// Fired events in the order of firing.
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Dispatches in the order of execution.
    #[must_use]
    pub fn runs(&self) -> &[RunSpan] {
        &self.runs
    }

    /// Dispatches of a single process.
    pub fn runs_of(&self, process_id: ProcessId) -> impl Iterator<Item = &RunSpan> + '_ {
        self.runs
            .iter()
            .filter(move |run| run.process_id == process_id)
    }

    /// Total CPU time given to the process.
    #[must_use]
    pub fn run_time(&self, process_id: ProcessId) -> Duration {
        self.runs_of(process_id).map(RunSpan::duration).sum()
    }

    /// Total time the CPU was busy.
    #[must_use]
    pub fn busy_time(&self) -> Duration {
        self.runs.iter().map(RunSpan::duration).sum()
    }

    /// Writes fired events as CSV with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_events_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        write_csv(writer, &self.events)
    }

    /// Writes dispatches as CSV with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_runs_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        write_csv(writer, &self.runs)
    }
}

fn write_csv<W: Write, T: Serialize>(writer: W, records: &[T]) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn span(id: usize, start: u64, end: u64, remaining: u64) -> RunSpan {
        RunSpan {
            process_id: ProcessId::from(id),
            start: Duration::from_micros(start),
            end: Duration::from_micros(end),
            remaining: Duration::from_micros(remaining),
        }
    }

    fn trace() -> Trace {
        let mut trace = Trace::default();
        trace.record_event(&Event::new(
            ProcessId::from(0),
            EventKind::ProcArrival,
            Duration::default(),
        ));
        trace.record_event(&Event::new(
            ProcessId::from(0),
            EventKind::ProcCpuReq,
            Duration::from_micros(2),
        ));
        trace.record_run(span(0, 0, 2, 3));
        trace.record_run(span(1, 2, 4, 0));
        trace.record_run(span(0, 5, 8, 0));
        trace
    }

    #[test]
    fn test_aggregates() {
        let trace = trace();
        assert_eq!(trace.run_time(ProcessId::from(0)), Duration::from_micros(5));
        assert_eq!(trace.run_time(ProcessId::from(1)), Duration::from_micros(2));
        assert_eq!(trace.run_time(ProcessId::from(2)), Duration::default());
        assert_eq!(trace.runs_of(ProcessId::from(0)).count(), 2);
        assert_eq!(trace.busy_time(), Duration::from_micros(7));
    }

    #[test]
    fn test_csv() -> csv::Result<()> {
        let trace = trace();
        let mut events = Vec::new();
        trace.write_events_csv(&mut events)?;
        assert_eq!(
            String::from_utf8_lossy(&events),
            "time,process_id,kind\n0,0,PROC_ARRIVAL\n2,0,PROC_CPU_REQ\n"
        );
        let mut runs = Vec::new();
        trace.write_runs_csv(&mut runs)?;
        assert_eq!(
            String::from_utf8_lossy(&runs),
            "process_id,start,end,remaining\n0,0,2,3\n1,2,4,0\n0,5,8,0\n"
        );
        Ok(())
    }
}
