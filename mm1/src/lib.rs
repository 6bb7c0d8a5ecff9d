//! Single-server queue (M/M/1) simulated on top of the [`smpl`] kernel.
//!
//! Customers arrive with exponentially distributed inter-arrival times, wait for a server in
//! FIFO order, and hold it for an exponentially distributed service time. Each customer goes
//! through three events:
//!
//! 1. [`EventKind::Arrival`]: requests service right away and schedules the next arrival;
//! 2. [`EventKind::Request`]: on reservation, schedules its own completion;
//! 3. [`EventKind::Completion`]: releases the server; a customer admitted from the queue
//!    gets its completion scheduled.
//!
//! Although the model is named after a single server, any number of servers can be used.

#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]
#![deny(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};
use smpl::{Admission, Model, ModelConfig, Report, Reservation, TransactionId};

/// Kinds of events occurring in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A customer arrives.
    Arrival,
    /// A customer asks for a server.
    Request,
    /// A customer's service ends.
    Completion,
}

/// Everything needed to run a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Setup {
    /// Model parameters.
    pub config: ModelConfig,
    /// Model name printed in the report.
    pub name: String,
    /// Number of servers.
    pub servers: usize,
    /// Random stream to draw from, between 1 and 15.
    pub stream: usize,
    /// Whether to emit trace lines.
    pub trace: bool,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            config: ModelConfig::default(),
            name: String::from("Example M/M/1"),
            servers: 1,
            stream: 1,
            trace: false,
        }
    }
}

/// Runs the simulation described by `setup` and returns its report.
///
/// The first customer, numbered `config.sequence`, arrives at time 0. Events are caused as long
/// as the clock does not exceed `config.total_sim_time`, so the last caused event may occur
/// after that time.
///
/// # Errors
///
/// Returns an error if the setup is invalid, e.g., zero servers, a stream outside of `1..=15`,
/// or a non-positive mean.
pub fn run(setup: &Setup) -> smpl::Result<Report> {
    let mut model = Model::new(setup.config);
    model.init(&setup.name)?;
    model.resource(setup.servers)?;
    model.select_stream(setup.stream)?;
    model.trace(setup.trace);
    log::info!(
        "Running `{}` with {} server(s) on stream {}",
        setup.name,
        setup.servers,
        setup.stream
    );

    let config = *model.config();
    model.schedule(
        EventKind::Arrival,
        0.0,
        TransactionId::from(config.sequence),
    )?;
    while model.time() <= config.total_sim_time && model.pending() > 0 {
        let event = model.cause()?;
        handle(&mut model, *event.kind(), event.transaction())?;
    }

    let report = model.report()?;
    log::info!(
        "Finished after {} events at time {}",
        report.events,
        report.elapsed
    );
    Ok(report)
}

fn handle(
    model: &mut Model<EventKind>,
    kind: EventKind,
    customer: TransactionId,
) -> smpl::Result<()> {
    let config = *model.config();
    match kind {
        EventKind::Arrival => {
            model.schedule(EventKind::Request, 0.0, customer)?;
            let delay = model.exponential(config.inter_arrival_time)?;
            model.schedule(EventKind::Arrival, delay, customer.next())?;
        }
        EventKind::Request => {
            if model.request(customer)? == Reservation::Reserved {
                let delay = model.exponential(config.service_time)?;
                model.schedule(EventKind::Completion, delay, customer)?;
            }
        }
        EventKind::Completion => {
            if let Admission::Admitted(next) = model.release(customer)? {
                log::debug!("Customer {} leaves the queue", next);
                let delay = model.exponential(config.service_time)?;
                model.schedule(EventKind::Completion, delay, next)?;
            }
        }
    }
    Ok(())
}

/// Renders a report as a plain text block.
pub struct TextReport<'a>(pub &'a Report);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "\t-----------SIMULATION REPORT-----------\t")?;
        writeln!(f, "Model name: {}", report.name)?;
        writeln!(f, "Time: {:.2}", report.elapsed)?;
        writeln!(f, "Events: {}", report.events)?;
        writeln!(f, "Resource (servers): {}", report.servers)?;
        writeln!(f, "Utilization: {:.2}", report.utilization)?;
        writeln!(f, "Mean busy time: {:.2}", report.mean_busy_period)?;
        writeln!(f, "Average queue length: {:.2}", report.average_queue_length)?;
        writeln!(f, "Maximum queue length: {}", report.max_queue_length)?;
        writeln!(f, "Total releases: {}", report.total_releases)?;
        writeln!(f, "Direct admissions: {}", report.total_direct_admissions)?;
        write!(f, "Queue exits: {}", report.total_queue_exits)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_text_report() {
        let mut model: Model<EventKind> = Model::new(ModelConfig::default());
        model.init("Example M/M/1").unwrap();
        model.resource(2).unwrap();
        let report = model.report().unwrap();
        assert_eq!(
            TextReport(&report).to_string(),
            "\t-----------SIMULATION REPORT-----------\t
Model name: Example M/M/1
Time: 0.00
Events: 0
Resource (servers): 2
Utilization: 0.00
Mean busy time: 0.00
Average queue length: 0.00
Maximum queue length: 0
Total releases: 0
Direct admissions: 0
Queue exits: 0"
        );
    }

    #[test]
    fn test_invalid_setup() {
        let setup = Setup {
            servers: 0,
            ..Setup::default()
        };
        assert_eq!(run(&setup), Err(smpl::Error::InvalidCapacity(0)));
        let setup = Setup {
            stream: 0,
            ..Setup::default()
        };
        assert_eq!(run(&setup), Err(smpl::Error::InvalidStream(0)));
        let setup = Setup {
            config: ModelConfig::new(120.0, -5.0, 6.0, 1),
            ..Setup::default()
        };
        assert!(matches!(
            run(&setup),
            Err(smpl::Error::InvalidParameter { name: "mean", .. })
        ));
    }

    #[test]
    fn test_first_customer_number_does_not_change_results() {
        let report = |sequence| {
            let mut setup = Setup::default();
            setup.config.sequence = sequence;
            run(&setup).unwrap()
        };
        let reference = report(1);
        assert_eq!(report(0), reference);
        assert_eq!(report(1_000), reference);
        assert_eq!(reference.total_direct_admissions, 1);
    }

    #[test]
    fn test_setup_from_partial_json() {
        let setup: Setup =
            serde_json::from_str(r#"{"servers": 3, "config": {"service_time": 2.5}}"#).unwrap();
        assert_eq!(setup.servers, 3);
        assert_eq!(setup.name, "Example M/M/1");
        assert_eq!(setup.config, ModelConfig::new(120.0, 5.0, 2.5, 1));
    }
}
