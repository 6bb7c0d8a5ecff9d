use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use crate::{Error, Result, TransactionId};

/// An event dequeued from the future event list.
///
/// The kernel carries `kind` without interpreting it; it is up to the application to decide
/// what happens when an event of a given kind occurs.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<K> {
    kind: K,
    time: f64,
    transaction: TransactionId,
    sequence: u64,
}

impl<K> Event<K> {
    /// Application-defined kind of the event.
    #[must_use]
    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// Consumes the event and returns its kind.
    #[must_use]
    pub fn into_kind(self) -> K {
        self.kind
    }

    /// Absolute simulation time at which the event occurs.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Transaction the event belongs to.
    #[must_use]
    pub fn transaction(&self) -> TransactionId {
        self.transaction
    }

    /// Insertion counter. Breaks ties between events scheduled for the same time.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Entry type stored in the heap. Ordering is reversed so that the max-heap pops the earliest
/// `(time, sequence)` first.
#[derive(Debug)]
struct EventEntry<K> {
    key: Reverse<(OrderedFloat<f64>, u64)>,
    event: Event<K>,
}

impl<K> EventEntry<K> {
    fn new(event: Event<K>) -> Self {
        Self {
            key: Reverse((OrderedFloat(event.time), event.sequence)),
            event,
        }
    }
}

impl<K> PartialEq for EventEntry<K> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K> Eq for EventEntry<K> {}

impl<K> PartialOrd for EventEntry<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for EventEntry<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Scheduler keeps the simulation clock and the future event list.
///
/// Events are dequeued in order of their time; events scheduled for the same time come out in
/// the order they were scheduled. The clock only moves when an event is popped, and it never
/// moves backwards, because no event can be scheduled before the current time.
#[derive(Debug)]
pub struct Scheduler<K> {
    events: BinaryHeap<EventEntry<K>>,
    clock: f64,
    next_sequence: u64,
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self {
            events: BinaryHeap::new(),
            clock: 0.0,
            next_sequence: 0,
        }
    }
}

impl<K> Scheduler<K> {
    /// Schedules an event of `kind` for `transaction` at `self.time() + delay`, and returns the
    /// absolute time of the event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NegativeDelay`] if `delay < 0`, and [`Error::NonFiniteDelay`] if `delay`
    /// is NaN or the resulting time is not finite.
    pub fn schedule(&mut self, kind: K, delay: f64, transaction: TransactionId) -> Result<f64> {
        if delay < 0.0 {
            return Err(Error::NegativeDelay(delay));
        }
        let time = self.clock + delay;
        if !time.is_finite() {
            return Err(Error::NonFiniteDelay(delay));
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        log::trace!(
            "Scheduling event #{} for transaction {} at {}",
            sequence,
            transaction,
            time
        );
        self.events.push(EventEntry::new(Event {
            kind,
            time,
            transaction,
            sequence,
        }));
        Ok(time)
    }

    /// Removes and returns the next scheduled event, advancing the clock to its time.
    /// Returns `None` if none are left.
    pub fn pop(&mut self) -> Option<Event<K>> {
        self.events.pop().map(|entry| {
            debug_assert!(entry.event.time >= self.clock);
            self.clock = entry.event.time;
            entry.event
        })
    }

    /// Returns the time of the earliest pending event, or infinity if there are none.
    #[must_use]
    pub fn peek_time(&self) -> f64 {
        self.events
            .peek()
            .map_or(f64::INFINITY, |entry| entry.event.time)
    }

    /// Returns the current simulation time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.clock
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Checks if there are no pending events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
