//! A discrete-event simulation kernel in the tradition of SMPL.
//!
//! The kernel provides the three mechanisms every queueing model needs: a future event list
//! ordered by simulated time, capacity-bounded resources with FIFO waiting, and 15 reproducible
//! pseudo-random streams. The [`Model`] ties them together around a single simulation clock
//! and collects utilization and queue-length statistics on the way.
//!
//! The application owns the driving loop: it pulls the next event with [`Model::cause`],
//! decides what the event means, and reacts with [`Model::schedule`], [`Model::request`], or
//! [`Model::release`]. The kernel never interprets event kinds.
//!
//! # Examples
//!
//! ```
//! # use smpl::{Model, ModelConfig, Reservation, TransactionId};
//! # fn main() -> smpl::Result<()> {
//! #[derive(Debug, Clone, Copy, PartialEq)]
//! enum Kind {
//!     Arrival,
//!     Departure,
//! }
//!
//! let mut model = Model::new(ModelConfig::default());
//! model.init("single server")?;
//! model.resource(1)?;
//! model.schedule(Kind::Arrival, 0.0, TransactionId::from(1))?;
//!
//! let event = model.cause()?;
//! assert_eq!(*event.kind(), Kind::Arrival);
//! assert_eq!(model.request(event.transaction())?, Reservation::Reserved);
//! model.schedule(Kind::Departure, 2.5, event.transaction())?;
//!
//! let event = model.cause()?;
//! assert_eq!(model.time(), 2.5);
//! model.release(event.transaction())?;
//!
//! let report = model.report()?;
//! assert_eq!(report.total_releases, 1);
//! assert_eq!(report.utilization, 1.0);
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::default_trait_access,
    clippy::cast_precision_loss
)]
#![deny(unsafe_code)]

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

mod model;
mod queue;
mod resource;
mod scheduler;
mod stats;
mod stream;

pub use model::{Model, ModelConfig, Phase, TRACE_TARGET};
pub use queue::WaitQueue;
pub use resource::{Admission, Reservation, Resource, ResourceId, ResourceManager};
pub use scheduler::{Event, Scheduler};
pub use stats::{Report, ResourceReport, ResourceStatistics, Statistics};
pub use stream::{RandomStreams, DEFAULT_SEEDS, STREAM_COUNT};

/// Opaque identifier correlating events with resource requests, e.g., a customer number.
#[derive(
    From,
    Into,
    Debug,
    PartialEq,
    PartialOrd,
    Eq,
    Ord,
    Serialize,
    Deserialize,
    Copy,
    Clone,
    Hash,
    Display,
)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Returns the identifier following this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Error type encompassing all kernel errors.
///
/// Every error aborts only the call that returned it; the model is left as it was before the
/// call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Random stream index outside of `1..=15`.
    #[error("Illegal random number generator stream: {0} (expected 1 to 15)")]
    InvalidStream(usize),
    /// A distribution parameter is out of its domain, e.g., a non-positive mean.
    #[error("Invalid value of `{name}`: {value}")]
    InvalidParameter {
        /// Name of the parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// Attempted to schedule an event in the past.
    #[error("Cannot schedule an event with negative delay: {0}")]
    NegativeDelay(f64),
    /// Attempted to schedule an event at a time that is not a finite number.
    #[error("Cannot schedule an event at a non-finite time (delay: {0})")]
    NonFiniteDelay(f64),
    /// A resource must have at least one server.
    #[error("There must be at least one server, but {0} requested.")]
    InvalidCapacity(usize),
    /// The transaction does not hold any server of the resource.
    #[error("There is no server reserved for transaction {0}.")]
    ReleaseWithoutReservation(TransactionId),
    /// The transaction already holds a server of the resource or waits for one.
    #[error("Transaction {0} has already requested this resource.")]
    DuplicateRequest(TransactionId),
    /// No resource with this ID was defined.
    #[error("Resource {0} is not defined.")]
    UnknownResource(ResourceId),
    /// The future event list has no pending events.
    #[error("There are no pending events to cause.")]
    EmptyQueue,
    /// The operation is not valid in the current phase of the model.
    #[error("`{operation}` is not allowed when the model is {phase:?}")]
    Sequence {
        /// Name of the rejected operation.
        operation: &'static str,
        /// The phase the model was in.
        phase: Phase,
    },
}

/// Result alias using [`Error`](enum.Error.html).
pub type Result<T> = std::result::Result<T, Error>;
