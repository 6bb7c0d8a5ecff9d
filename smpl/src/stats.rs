//! Time-weighted statistics of resources.
//!
//! Busy servers and queue length are piecewise-constant functions of simulated time; their
//! integrals are accumulated with the rectangle rule. Each transition first folds the value
//! held since the previous transition over the elapsed interval and only then applies the
//! change.

use serde::Serialize;

use crate::ResourceId;

/// Accumulators of a single resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceStatistics {
    capacity: usize,
    busy: usize,
    queue: usize,
    busy_area: f64,
    queue_area: f64,
    last_change: f64,
    releases: u64,
    direct_admissions: u64,
    queue_exits: u64,
    max_queue: usize,
}

impl ResourceStatistics {
    /// Constructs empty statistics of a resource with `capacity` servers, starting at `start`.
    #[must_use]
    pub fn new(capacity: usize, start: f64) -> Self {
        Self {
            capacity,
            last_change: start,
            ..Self::default()
        }
    }

    /// Folds the contribution of the current state over `[last_change, now]`, then applies the
    /// changes in the number of busy servers and the queue length.
    ///
    /// # Panics
    ///
    /// Panics if a delta would make the number of busy servers or the queue length negative,
    /// which means the caller's bookkeeping diverged from the resource.
    pub fn record_transition(&mut self, now: f64, busy_delta: isize, queue_delta: isize) {
        let elapsed = now - self.last_change;
        debug_assert!(elapsed >= 0.0, "time went backwards");
        self.busy_area += self.busy as f64 * elapsed;
        self.queue_area += self.queue as f64 * elapsed;
        self.last_change = now;
        self.busy = apply_delta(self.busy, busy_delta);
        self.queue = apply_delta(self.queue, queue_delta);
        self.max_queue = self.max_queue.max(self.queue);
    }

    /// Counts a request admitted without waiting.
    pub fn count_direct_admission(&mut self) {
        self.direct_admissions += 1;
    }

    /// Counts a release; `queue_exit` tells if the freed server went to a waiting transaction.
    pub fn count_release(&mut self, queue_exit: bool) {
        self.releases += 1;
        if queue_exit {
            self.queue_exits += 1;
        }
    }

    /// Busy-server time accumulated up to `now`, including the interval not folded yet.
    #[must_use]
    pub fn busy_time(&self, now: f64) -> f64 {
        self.busy_area + self.busy as f64 * (now - self.last_change)
    }

    /// Area under the queue length curve up to `now`, including the interval not folded yet.
    #[must_use]
    pub fn queue_area(&self, now: f64) -> f64 {
        self.queue_area + self.queue as f64 * (now - self.last_change)
    }

    /// Summarizes the statistics at time `now`, with `elapsed` simulated time since the start.
    #[must_use]
    pub fn report(&self, resource: ResourceId, now: f64, elapsed: f64) -> ResourceReport {
        let busy_time = self.busy_time(now);
        let (utilization, average_queue_length) = if elapsed > 0.0 {
            (
                busy_time / (elapsed * self.capacity as f64),
                self.queue_area(now) / elapsed,
            )
        } else {
            (0.0, 0.0)
        };
        let mean_busy_period = if self.releases > 0 {
            busy_time / self.releases as f64
        } else {
            0.0
        };
        ResourceReport {
            resource,
            capacity: self.capacity,
            utilization,
            mean_busy_period,
            average_queue_length,
            total_releases: self.releases,
            total_direct_admissions: self.direct_admissions,
            total_queue_exits: self.queue_exits,
            max_queue_length: self.max_queue,
        }
    }
}

fn apply_delta(value: usize, delta: isize) -> usize {
    if delta.is_negative() {
        value
            .checked_sub(delta.unsigned_abs())
            .expect("statistics went below zero")
    } else {
        value + delta.unsigned_abs()
    }
}

/// Statistics of an entire model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistics {
    name: String,
    start: f64,
    events: u64,
    resources: Vec<ResourceStatistics>,
}

impl Statistics {
    /// Constructs empty statistics of the model `name` starting at time `start`.
    #[must_use]
    pub fn new<S: Into<String>>(name: S, start: f64) -> Self {
        Self {
            name: name.into(),
            start,
            events: 0,
            resources: Vec::new(),
        }
    }

    /// Model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of caused events.
    #[must_use]
    pub fn events(&self) -> u64 {
        self.events
    }

    /// Registers a resource defined at time `now`. Resources must be added in the order of
    /// their IDs.
    pub fn add_resource(&mut self, capacity: usize, now: f64) {
        self.resources.push(ResourceStatistics::new(capacity, now));
    }

    /// Counts a caused event.
    pub fn count_event(&mut self) {
        self.events += 1;
    }

    /// Statistics of a single resource.
    #[must_use]
    pub fn resource(&self, id: ResourceId) -> Option<&ResourceStatistics> {
        self.resources.get(usize::from(id))
    }

    /// Mutable statistics of a single resource.
    pub fn resource_mut(&mut self, id: ResourceId) -> Option<&mut ResourceStatistics> {
        self.resources.get_mut(usize::from(id))
    }

    /// Summarizes the statistics at time `now` without modifying them.
    ///
    /// The headline figures describe the first resource; an empty report is produced if no
    /// resource is defined.
    #[must_use]
    pub fn report(&self, now: f64) -> Report {
        let elapsed = now - self.start;
        let resources: Vec<_> = self
            .resources
            .iter()
            .enumerate()
            .map(|(id, stats)| stats.report(ResourceId::from(id), now, elapsed))
            .collect();
        let primary = resources.first().cloned().unwrap_or_default();
        Report {
            name: self.name.clone(),
            elapsed,
            events: self.events,
            servers: primary.capacity,
            utilization: primary.utilization,
            mean_busy_period: primary.mean_busy_period,
            average_queue_length: primary.average_queue_length,
            total_releases: primary.total_releases,
            total_direct_admissions: primary.total_direct_admissions,
            total_queue_exits: primary.total_queue_exits,
            max_queue_length: primary.max_queue_length,
            resources,
        }
    }
}

/// Summary of a single resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceReport {
    /// Resource ID.
    pub resource: ResourceId,
    /// Number of servers.
    pub capacity: usize,
    /// Fraction of server time spent busy, between 0 and 1.
    pub utilization: f64,
    /// Busy server time per release.
    pub mean_busy_period: f64,
    /// Time-weighted average number of waiting transactions.
    pub average_queue_length: f64,
    /// Number of releases.
    pub total_releases: u64,
    /// Number of requests that got a server without waiting.
    pub total_direct_admissions: u64,
    /// Number of transactions that got a server after waiting in the queue.
    pub total_queue_exits: u64,
    /// The longest the queue has been.
    pub max_queue_length: usize,
}

impl Default for ResourceReport {
    fn default() -> Self {
        Self {
            resource: ResourceId::PRIMARY,
            capacity: 0,
            utilization: 0.0,
            mean_busy_period: 0.0,
            average_queue_length: 0.0,
            total_releases: 0,
            total_direct_admissions: 0,
            total_queue_exits: 0,
            max_queue_length: 0,
        }
    }
}

/// Simulation report.
///
/// The headline fields describe the primary resource, i.e., the first one defined;
/// `resources` contains summaries of all of them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Model name.
    pub name: String,
    /// Simulated time since the model was initialized.
    pub elapsed: f64,
    /// Number of caused events.
    pub events: u64,
    /// Number of servers of the primary resource.
    pub servers: usize,
    /// Fraction of server time spent busy, between 0 and 1.
    pub utilization: f64,
    /// Busy server time per release.
    pub mean_busy_period: f64,
    /// Time-weighted average number of waiting transactions.
    pub average_queue_length: f64,
    /// Number of releases.
    pub total_releases: u64,
    /// Number of requests that got a server without waiting.
    pub total_direct_admissions: u64,
    /// Number of transactions that got a server after waiting in the queue.
    pub total_queue_exits: u64,
    /// The longest the queue has been.
    pub max_queue_length: usize,
    /// Summaries of all resources, in order of their IDs.
    pub resources: Vec<ResourceReport>,
}
