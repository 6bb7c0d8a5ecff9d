use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    Admission, Error, Event, RandomStreams, Report, Reservation, Resource, ResourceId,
    ResourceManager, ResourceStatistics, Result, Scheduler, Statistics, TransactionId,
};

/// Log target of trace lines. Enable it with [`Model::trace`] and route it to any logger
/// implementing the `log` facade.
pub const TRACE_TARGET: &str = "smpl::trace";

/// Phases of a model's lifetime. See [`Model`] for the operations allowed in each phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Constructed, but not named yet.
    Uninitialized,
    /// Named; no resource defined yet.
    Initialized,
    /// At least one resource defined; nothing has happened yet.
    Configured,
    /// Events are being scheduled and caused.
    Running,
    /// A report has been produced.
    Reported,
}

/// Parameters of a model. The kernel stores them for the application and never interprets
/// them itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// How long the application intends to run the simulation.
    pub total_sim_time: f64,
    /// Mean time between arrivals.
    pub inter_arrival_time: f64,
    /// Mean service time.
    pub service_time: f64,
    /// Number of the first transaction.
    pub sequence: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            total_sim_time: 120.0,
            inter_arrival_time: 5.0,
            service_time: 6.0,
            sequence: 1,
        }
    }
}

impl ModelConfig {
    /// Constructs a configuration with the given parameters.
    #[must_use]
    pub fn new(
        total_sim_time: f64,
        inter_arrival_time: f64,
        service_time: f64,
        sequence: u64,
    ) -> Self {
        Self {
            total_sim_time,
            inter_arrival_time,
            service_time,
            sequence,
        }
    }
}

const ACTIVE: [Phase; 3] = [Phase::Configured, Phase::Running, Phase::Reported];

/// A simulation model: the clock, the future event list, resources, random streams, and
/// statistics.
///
/// # Phases
///
/// | Operation                                   | Allowed in                         |
/// |---------------------------------------------|------------------------------------|
/// | [`init`](#method.init)                      | `Uninitialized`                    |
/// | [`resource`](#method.resource)              | `Initialized`, `Configured`        |
/// | `schedule`, `cause`, `request`, `release`   | `Configured`, `Running`, `Reported`|
/// | [`report`](#method.report)                  | `Configured`, `Running`, `Reported`|
///
/// Random streams, tracing, and the clock are available in every phase. A successful
/// `schedule`, `cause`, `request`, or `release` moves the model to `Running`; this includes
/// a model that has already been reported, whose statistics then keep accumulating.
/// Any failed call leaves the model unchanged.
#[derive(Debug)]
pub struct Model<K> {
    config: ModelConfig,
    phase: Phase,
    scheduler: Scheduler<K>,
    resources: ResourceManager,
    streams: RandomStreams,
    stats: Statistics,
    trace: bool,
}

impl<K: fmt::Debug> Model<K> {
    /// Constructs an uninitialized model.
    #[must_use]
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            phase: Phase::Uninitialized,
            scheduler: Scheduler::default(),
            resources: ResourceManager::default(),
            streams: RandomStreams::default(),
            stats: Statistics::default(),
            trace: false,
        }
    }

    /// The configuration passed at construction.
    #[must_use]
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Model name; empty before [`init`](#method.init).
    #[must_use]
    pub fn name(&self) -> &str {
        self.stats.name()
    }

    /// Names the model, resets the clock to 0, and resets statistics.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sequence`] unless the model is `Uninitialized`.
    pub fn init(&mut self, name: &str) -> Result<()> {
        self.ensure("init", &[Phase::Uninitialized])?;
        self.scheduler = Scheduler::default();
        self.stats = Statistics::new(name, 0.0);
        self.phase = Phase::Initialized;
        log::debug!("Model `{}` initialized", name);
        Ok(())
    }

    /// Defines a resource with `capacity` servers and returns its ID. The first resource
    /// becomes the primary one, used by [`request`](#method.request) and
    /// [`release`](#method.release).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sequence`] unless the model is `Initialized` or `Configured`, and
    /// [`Error::InvalidCapacity`] if `capacity` is 0.
    pub fn resource(&mut self, capacity: usize) -> Result<ResourceId> {
        self.ensure("resource", &[Phase::Initialized, Phase::Configured])?;
        let id = self.resources.define(capacity)?;
        self.stats.add_resource(capacity, self.time());
        self.phase = Phase::Configured;
        log::debug!("Defined resource {} with {} server(s)", id, capacity);
        Ok(id)
    }

    /// Turns trace lines on or off. Traces are written to the `log` facade with the
    /// [`TRACE_TARGET`] target, one line per kernel call; they never affect the simulation.
    pub fn trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    /// Checks if tracing is on.
    #[must_use]
    pub fn is_tracing(&self) -> bool {
        self.trace
    }

    /// Current simulation time. It changes only when [`cause`](#method.cause) is called.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.scheduler.time()
    }

    /// Time of the earliest pending event, or infinity if there are none.
    #[must_use]
    pub fn peek_time(&self) -> f64 {
        self.scheduler.peek_time()
    }

    /// Number of pending events.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.scheduler.len()
    }

    /// Selects the random stream used by subsequent draws. See [`RandomStreams::select`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStream`] if `stream` is outside of `1..=15`.
    pub fn select_stream(&mut self, stream: usize) -> Result<()> {
        self.streams.select(stream)
    }

    /// The number of the active random stream.
    #[must_use]
    pub fn stream(&self) -> usize {
        self.streams.stream()
    }

    /// Draws a uniform value in `(0, 1)` from the active stream.
    pub fn uniform(&mut self) -> f64 {
        self.streams.uniform()
    }

    /// Draws an exponential value with the given mean from the active stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `mean` is not positive.
    pub fn exponential(&mut self, mean: f64) -> Result<f64> {
        self.streams.exponential(mean)
    }

    /// Draws a uniform value in `(low, high)` from the active stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] unless `low < high`.
    pub fn uniform_between(&mut self, low: f64, high: f64) -> Result<f64> {
        self.streams.uniform_between(low, high)
    }

    /// Draws an integer in `low..=high` from the active stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `high < low`.
    pub fn random_int(&mut self, low: i64, high: i64) -> Result<i64> {
        self.streams.random_int(low, high)
    }

    /// Schedules an event of `kind` for `transaction` to occur `delay` time units from now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sequence`] if no resource is defined yet, [`Error::NegativeDelay`] if
    /// `delay < 0`, and [`Error::NonFiniteDelay`] if `delay` is not a finite number.
    pub fn schedule(&mut self, kind: K, delay: f64, transaction: TransactionId) -> Result<()> {
        self.ensure("schedule", &ACTIVE)?;
        let label = if self.trace {
            Some(format!("{:?}", kind))
        } else {
            None
        };
        let time = self.scheduler.schedule(kind, delay, transaction)?;
        self.phase = Phase::Running;
        if let Some(label) = label {
            self.trace_line(format_args!(
                "scheduled {} for transaction {} at {:.3}",
                label, transaction, time
            ));
        }
        Ok(())
    }

    /// Removes the earliest pending event and advances the clock to its time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sequence`] if no resource is defined yet, and [`Error::EmptyQueue`] if
    /// there are no pending events.
    pub fn cause(&mut self) -> Result<Event<K>> {
        self.ensure("cause", &ACTIVE)?;
        let event = self.scheduler.pop().ok_or(Error::EmptyQueue)?;
        self.stats.count_event();
        self.phase = Phase::Running;
        if self.trace {
            self.trace_line(format_args!(
                "caused {:?} for transaction {}",
                event.kind(),
                event.transaction()
            ));
        }
        Ok(event)
    }

    /// Requests a server of the primary resource. See [`request_at`](#method.request_at).
    ///
    /// # Errors
    ///
    /// See [`request_at`](#method.request_at).
    pub fn request(&mut self, transaction: TransactionId) -> Result<Reservation> {
        self.request_at(ResourceId::PRIMARY, transaction)
    }

    /// Requests a server of `resource` for `transaction`.
    ///
    /// Returns [`Reservation::Reserved`] if a server was free; the transaction now holds it.
    /// Otherwise, the transaction is queued and [`Reservation::Queued`] is returned; it will
    /// be handed a server by a later [`release_at`](#method.release_at).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sequence`] if no resource is defined yet, [`Error::UnknownResource`]
    /// if `resource` does not exist, and [`Error::DuplicateRequest`] if `transaction` already
    /// holds or waits for `resource`.
    pub fn request_at(
        &mut self,
        resource: ResourceId,
        transaction: TransactionId,
    ) -> Result<Reservation> {
        self.ensure("request", &ACTIVE)?;
        let reservation = self.resources.request(resource, transaction)?;
        let now = self.time();
        let stats = self.resource_stats(resource);
        match reservation {
            Reservation::Reserved => {
                stats.record_transition(now, 1, 0);
                stats.count_direct_admission();
            }
            Reservation::Queued => stats.record_transition(now, 0, 1),
        }
        self.phase = Phase::Running;
        if self.trace {
            match reservation {
                Reservation::Reserved => self.trace_line(format_args!(
                    "transaction {} reserved resource {}",
                    transaction, resource
                )),
                Reservation::Queued => self.trace_line(format_args!(
                    "transaction {} queued for resource {} (inq = {})",
                    transaction,
                    resource,
                    self.queue_len(resource)
                )),
            }
        }
        Ok(reservation)
    }

    /// Releases the primary resource. See [`release_at`](#method.release_at).
    ///
    /// # Errors
    ///
    /// See [`release_at`](#method.release_at).
    pub fn release(&mut self, transaction: TransactionId) -> Result<Admission> {
        self.release_at(ResourceId::PRIMARY, transaction)
    }

    /// Releases the server of `resource` held by `transaction`.
    ///
    /// If another transaction was waiting, it takes over the server and is returned in
    /// [`Admission::Admitted`]; the caller must schedule whatever that transaction does next.
    /// Otherwise, [`Admission::Vacant`] is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sequence`] if no resource is defined yet, [`Error::UnknownResource`]
    /// if `resource` does not exist, and [`Error::ReleaseWithoutReservation`] if
    /// `transaction` holds no server of `resource`.
    pub fn release_at(
        &mut self,
        resource: ResourceId,
        transaction: TransactionId,
    ) -> Result<Admission> {
        self.ensure("release", &ACTIVE)?;
        let admission = self.resources.release(resource, transaction)?;
        let now = self.time();
        let stats = self.resource_stats(resource);
        match admission {
            Admission::Admitted(_) => {
                stats.record_transition(now, 0, -1);
                stats.count_release(true);
            }
            Admission::Vacant => {
                stats.record_transition(now, -1, 0);
                stats.count_release(false);
            }
        }
        self.phase = Phase::Running;
        if self.trace {
            self.trace_line(format_args!(
                "transaction {} released resource {}",
                transaction, resource
            ));
            if let Admission::Admitted(next) = admission {
                self.trace_line(format_args!(
                    "transaction {} dequeued and admitted to resource {} (inq = {})",
                    next,
                    resource,
                    self.queue_len(resource)
                ));
            }
        }
        Ok(admission)
    }

    /// State of a resource.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownResource`] if `resource` does not exist.
    pub fn resource_state(&self, resource: ResourceId) -> Result<&Resource> {
        self.resources.get(resource)
    }

    /// Statistics accumulated so far.
    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Summarizes the statistics at the current time.
    ///
    /// A model with a resource but no events produces an all-zero report.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sequence`] if no resource is defined yet.
    pub fn report(&mut self) -> Result<Report> {
        self.ensure("report", &ACTIVE)?;
        let report = self.stats.report(self.time());
        self.phase = Phase::Reported;
        log::debug!(
            "Model `{}` reported after {} events at {}",
            report.name,
            report.events,
            report.elapsed
        );
        Ok(report)
    }

    fn ensure(&self, operation: &'static str, allowed: &[Phase]) -> Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(Error::Sequence {
                operation,
                phase: self.phase,
            })
        }
    }

    fn resource_stats(&mut self, resource: ResourceId) -> &mut ResourceStatistics {
        self.stats
            .resource_mut(resource)
            .expect("statistics are kept for every defined resource")
    }

    fn queue_len(&self, resource: ResourceId) -> usize {
        self.resources.get(resource).map_or(0, Resource::queue_len)
    }

    fn trace_line(&self, message: fmt::Arguments<'_>) {
        log::info!(
            target: TRACE_TARGET,
            "({}) {:.3}: {}",
            self.stats.name(),
            self.time(),
            message
        );
    }
}
