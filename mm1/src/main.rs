//! M/M/1 queue simulation application.
#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

use std::fs::File;
use std::path::PathBuf;

use eyre::WrapErr;
use structopt::StructOpt;

use mm1::{Setup, TextReport};
use smpl::{ModelConfig, TRACE_TARGET};

/// Format of the printed report.
#[derive(Debug, Clone, Copy, strum::EnumString, strum::ToString)]
#[strum(serialize_all = "snake_case")]
enum ReportFormat {
    /// Human-readable block.
    Text,
    /// A single JSON object.
    Json,
}

/// Runs an M/M/1 queue simulation and prints its report.
#[derive(StructOpt)]
#[structopt(name = "mm1")]
struct Opt {
    /// Simulation time after which no more events are caused.
    #[structopt(long, default_value = "120")]
    total_sim_time: f64,

    /// Mean time between customer arrivals.
    #[structopt(long, default_value = "5")]
    inter_arrival_time: f64,

    /// Mean service time.
    #[structopt(long, default_value = "6")]
    service_time: f64,

    /// Number of the first customer.
    #[structopt(long, default_value = "1")]
    sequence: u64,

    /// Number of servers.
    #[structopt(long, default_value = "1")]
    servers: usize,

    /// Random number stream, 1 to 15.
    #[structopt(long, default_value = "1")]
    stream: usize,

    /// Model name.
    #[structopt(long, default_value = "Example M/M/1")]
    name: String,

    /// JSON file with the whole setup; overrides all model options above.
    #[structopt(long)]
    config: Option<PathBuf>,

    /// Log a trace line for every kernel call. Requires at least `-v`.
    #[structopt(long)]
    trace: bool,

    /// Report format: `text` or `json`.
    #[structopt(long, default_value = "text")]
    format: ReportFormat,

    /// Verbosity.
    #[structopt(short, long, parse(from_occurrences))]
    verbose: i32,

    /// Store the logs this file.
    #[structopt(long)]
    log_output: Option<PathBuf>,

    /// Do not log to the stderr.
    #[structopt(long)]
    no_stderr: bool,
}

impl Opt {
    fn setup(&self) -> eyre::Result<Setup> {
        if let Some(path) = &self.config {
            let file = File::open(path)
                .wrap_err_with(|| format!("unable to open config {}", path.display()))?;
            serde_json::from_reader(file).wrap_err("unable to parse config")
        } else {
            Ok(Setup {
                config: ModelConfig::new(
                    self.total_sim_time,
                    self.inter_arrival_time,
                    self.service_time,
                    self.sequence,
                ),
                name: self.name.clone(),
                servers: self.servers,
                stream: self.stream,
                trace: self.trace,
            })
        }
    }
}

fn set_up_logger(opt: &Opt) -> Result<(), fern::InitError> {
    let log_level = match opt.verbose {
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        3 => log::LevelFilter::Trace,
        _ => log::LevelFilter::Warn,
    };
    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            if record.target() == TRACE_TARGET {
                out.finish(format_args!("{}", message))
            } else {
                out.finish(format_args!("[{}] {}", record.level(), message))
            }
        })
        .level(log_level);
    let dispatch = if let Some(path) = &opt.log_output {
        dispatch.chain(fern::log_file(path)?)
    } else {
        dispatch
    };
    let dispatch = if opt.no_stderr {
        dispatch
    } else {
        dispatch.chain(std::io::stderr())
    };
    dispatch.apply()?;
    Ok(())
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let opt = Opt::from_args();
    set_up_logger(&opt)?;
    let setup = opt.setup()?;
    let report = mm1::run(&setup).wrap_err("simulation failed")?;
    match opt.format {
        ReportFormat::Text => println!("{}", TextReport(&report)),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
