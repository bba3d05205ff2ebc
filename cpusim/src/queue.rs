use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use crate::{Error, Event, Result};

/// Entry stored in the queue: the event and its insertion sequence number, which breaks ties
/// between events firing at the same time.
#[derive(Debug)]
struct QueueEntry {
    event: Event,
    sequence: u64,
}

impl QueueEntry {
    fn key(&self) -> (Duration, u64) {
        (self.event.time(), self.sequence)
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Pending events ordered by time. Events with equal times are returned in the order they were
/// pushed.
///
/// # Examples
///
/// ```
/// # use std::time::Duration;
/// # use cpusim::{Event, EventKind, EventQueue, ProcessId};
/// let mut queue = EventQueue::default();
/// let at = |id: usize, t: u64| Event::new(ProcessId::from(id), EventKind::ProcArrival, Duration::from_micros(t));
/// queue.push(at(0, 3));
/// queue.push(at(1, 1));
/// queue.push(at(2, 1));
/// assert_eq!(queue.peek_time()?, Duration::from_micros(1));
/// assert_eq!(queue.pop()?, at(1, 1));
/// assert_eq!(queue.pop()?, at(2, 1));
/// assert_eq!(queue.pop()?, at(0, 3));
/// assert!(queue.pop().is_err());
/// # Ok::<(), cpusim::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct EventQueue {
    events: BinaryHeap<Reverse<QueueEntry>>,
    next_sequence: u64,
}

impl EventQueue {
    /// Inserts an event.
    pub fn push(&mut self, event: Event) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.events.push(Reverse(QueueEntry { event, sequence }));
    }

    /// Removes and returns the earliest event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyQueue`] if there are no events left.
    pub fn pop(&mut self) -> Result<Event> {
        self.events
            .pop()
            .map(|Reverse(entry)| entry.event)
            .ok_or(Error::EmptyQueue)
    }

    /// Returns the time of the earliest event without removing it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyQueue`] if there are no events left.
    pub fn peek_time(&self) -> Result<Duration> {
        self.events
            .peek()
            .map(|Reverse(entry)| entry.event.time())
            .ok_or(Error::EmptyQueue)
    }

    /// Returns the earliest time of a pending event that fires strictly after `time`.
    #[must_use]
    pub fn next_time_after(&self, time: Duration) -> Option<Duration> {
        self.times().filter(|&t| t > time).min()
    }

    /// Counts the pending events firing strictly between `start` and `end`.
    #[must_use]
    pub fn count_between(&self, start: Duration, end: Duration) -> usize {
        self.times().filter(|&t| start < t && t < end).count()
    }

    /// Answers whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Iterates over pending event times in arbitrary order.
    fn times(&self) -> impl Iterator<Item = Duration> + '_ {
        self.events.iter().map(|Reverse(entry)| entry.event.time())
    }
}
