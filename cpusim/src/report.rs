use std::time::Duration;

use itertools::Itertools;
use serde::Serialize;

use crate::{micros, Error, PolicyKind, ProcessId, Result, SimulationOutcome};

/// Per-process statistics of a finished simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessReport {
    /// Process ID.
    pub id: ProcessId,
    /// Arrival time.
    #[serde(serialize_with = "micros::serialize")]
    pub arrival_time: Duration,
    /// Service time.
    #[serde(serialize_with = "micros::serialize")]
    pub service_time: Duration,
    /// When the process first got the CPU.
    #[serde(serialize_with = "micros::serialize")]
    pub first_run_time: Duration,
    /// When the process terminated.
    #[serde(serialize_with = "micros::serialize")]
    pub departure_time: Duration,
    /// Time from arrival to termination.
    #[serde(serialize_with = "micros::serialize")]
    pub turnaround_time: Duration,
    /// Time spent ready but not running.
    #[serde(serialize_with = "micros::serialize")]
    pub waiting_time: Duration,
    /// Time from arrival to the first run.
    #[serde(serialize_with = "micros::serialize")]
    pub response_time: Duration,
    /// Number of times the process was dispatched.
    pub dispatches: usize,
}

/// Aggregate statistics of a finished simulation. Mean times are in microseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Simulated policy.
    pub policy: PolicyKind,
    /// Number of processes.
    pub num_processes: usize,
    /// Time of the last termination.
    #[serde(serialize_with = "micros::serialize")]
    pub makespan: Duration,
    /// Mean turnaround time.
    pub mean_turnaround_time: f64,
    /// Mean waiting time.
    pub mean_waiting_time: f64,
    /// Mean response time.
    pub mean_response_time: f64,
    /// Fraction of the makespan during which the CPU was busy.
    pub utilization: f64,
    /// Terminated processes per second of simulated time.
    pub throughput: f64,
}

/// Report on a finished simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Aggregate statistics.
    pub summary: Summary,
    /// Per-process statistics, in the order of process IDs.
    pub processes: Vec<ProcessReport>,
}

impl Report {
    /// Computes the report for a finished simulation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unfinished`] if any process has not terminated.
    pub fn new(outcome: &SimulationOutcome) -> Result<Self> {
        let dispatches = outcome
            .trace
            .runs()
            .iter()
            .map(|run| (run.process_id, run.duration()))
            .into_group_map();
        let processes = outcome
            .processes
            .iter()
            .sorted_by_key(|p| p.id())
            .map(|p| {
                let (first_run_time, departure_time) = p
                    .first_run_time()
                    .zip(p.departure_time())
                    .ok_or(Error::Unfinished(p.id()))?;
                let turnaround_time = departure_time - p.arrival_time();
                Ok(ProcessReport {
                    id: p.id(),
                    arrival_time: p.arrival_time(),
                    service_time: p.service_time(),
                    first_run_time,
                    departure_time,
                    turnaround_time,
                    waiting_time: turnaround_time - p.service_time(),
                    response_time: first_run_time - p.arrival_time(),
                    dispatches: dispatches.get(&p.id()).map_or(0, Vec::len),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let makespan = processes
            .iter()
            .map(|p| p.departure_time)
            .max()
            .unwrap_or_default();
        let busy_time = outcome.trace.busy_time();
        let summary = Summary {
            policy: outcome.policy,
            num_processes: processes.len(),
            makespan,
            mean_turnaround_time: mean(processes.iter().map(|p| p.turnaround_time)),
            mean_waiting_time: mean(processes.iter().map(|p| p.waiting_time)),
            mean_response_time: mean(processes.iter().map(|p| p.response_time)),
            utilization: ratio(busy_time.as_secs_f64(), makespan.as_secs_f64()),
            throughput: ratio(processes.len() as f64, makespan.as_secs_f64()),
        };
        Ok(Self { summary, processes })
    }
}

fn mean<I: ExactSizeIterator<Item = Duration>>(times: I) -> f64 {
    let len = times.len();
    ratio(times.map(|t| t.as_micros() as f64).sum(), len as f64)
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{ProcessSpec, SimulationEngine};
    use float_cmp::approx_eq;

    fn simulate(policy: PolicyKind, specs: &[(u64, u64)]) -> SimulationOutcome {
        let specs = specs.iter().enumerate().map(|(id, &(a, s))| {
            ProcessSpec::new(id, Duration::from_micros(a), Duration::from_micros(s))
        });
        let mut engine =
            SimulationEngine::new(specs, policy.build(Some(Duration::from_micros(2))).unwrap())
                .unwrap();
        engine.run().unwrap();
        engine.into_outcome()
    }

    #[test]
    fn test_round_robin_report() -> Result<()> {
        let report = Report::new(&simulate(PolicyKind::Rr, &[(0, 5), (1, 3)]))?;
        let us = Duration::from_micros;
        assert_eq!(
            report.processes,
            vec![
                ProcessReport {
                    id: ProcessId::from(0),
                    arrival_time: us(0),
                    service_time: us(5),
                    first_run_time: us(0),
                    departure_time: us(8),
                    turnaround_time: us(8),
                    waiting_time: us(3),
                    response_time: us(0),
                    dispatches: 3,
                },
                ProcessReport {
                    id: ProcessId::from(1),
                    arrival_time: us(1),
                    service_time: us(3),
                    first_run_time: us(2),
                    departure_time: us(7),
                    turnaround_time: us(6),
                    waiting_time: us(3),
                    response_time: us(1),
                    dispatches: 2,
                },
            ]
        );
        let summary = &report.summary;
        assert_eq!(summary.policy, PolicyKind::Rr);
        assert_eq!(summary.num_processes, 2);
        assert_eq!(summary.makespan, us(8));
        assert!(approx_eq!(f64, summary.mean_turnaround_time, 7.0));
        assert!(approx_eq!(f64, summary.mean_waiting_time, 3.0));
        assert!(approx_eq!(f64, summary.mean_response_time, 0.5));
        assert!(approx_eq!(f64, summary.utilization, 1.0));
        assert!(approx_eq!(f64, summary.throughput, 250_000.0, epsilon = 1e-6));
        Ok(())
    }

    #[test]
    fn test_idle_time_lowers_utilization() -> Result<()> {
        let report = Report::new(&simulate(PolicyKind::Fcfs, &[(0, 2), (6, 2)]))?;
        assert_eq!(report.summary.makespan, Duration::from_micros(8));
        assert!(approx_eq!(f64, report.summary.utilization, 0.5));
        assert!(approx_eq!(f64, report.summary.mean_waiting_time, 0.0));
        Ok(())
    }

    #[test]
    fn test_unfinished() -> Result<()> {
        let specs = vec![ProcessSpec::new(
            3,
            Duration::from_micros(1),
            Duration::from_micros(1),
        )];
        let engine = SimulationEngine::new(specs, PolicyKind::Fcfs.build(None)?)?;
        assert_eq!(
            Report::new(&engine.into_outcome()),
            Err(Error::Unfinished(ProcessId::from(3)))
        );
        Ok(())
    }

    #[test]
    fn test_empty() -> Result<()> {
        let report = Report::new(&simulate(PolicyKind::Srtf, &[]))?;
        assert!(report.processes.is_empty());
        assert!(approx_eq!(f64, report.summary.throughput, 0.0));
        assert!(approx_eq!(f64, report.summary.mean_turnaround_time, 0.0));
        Ok(())
    }

    #[test]
    fn test_serialize() -> Result<()> {
        let report = Report::new(&simulate(PolicyKind::Fcfs, &[(0, 2)]))?;
        assert_eq!(
            serde_json::to_string(&report.processes).unwrap(),
            r#"[{"id":0,"arrival_time":0,"service_time":2,"first_run_time":0,"departure_time":2,"turnaround_time":2,"waiting_time":0,"response_time":0,"dispatches":1}]"#
        );
        Ok(())
    }
}
