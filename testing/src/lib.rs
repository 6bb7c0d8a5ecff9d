//! Test utilities shared by the workspace crates.
//!
//! The only utility for now is a logger that keeps log lines in memory so that tests can
//! assert on what a model traced.
//!
//! # Examples
//!
//! ```
//! # use testing::TraceCapture;
//! # fn main() -> anyhow::Result<()> {
//! TraceCapture::default()
//!     .level(log::LevelFilter::Info)
//!     .target("doctest")
//!     .install()?;
//! log::info!(target: "doctest", "kept");
//! log::info!(target: "elsewhere", "filtered out");
//! log::debug!(target: "doctest", "too verbose");
//! assert_eq!(testing::take_lines()?, vec![String::from("INFO  kept")]);
//! assert!(testing::take_lines()?.is_empty());
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
#![allow(clippy::module_name_repetitions)]

use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use log::LevelFilter;

lazy_static::lazy_static! {
    static ref LINES: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    static ref INSTALLED: Mutex<bool> = Mutex::new(false);
}

/// Builds the in-memory logger.
///
/// A process can have only one logger, so only the first [`install`](#method.install) takes
/// effect; later calls succeed without changing anything. Tests sharing a binary should
/// therefore use the same settings.
pub struct TraceCapture {
    level: LevelFilter,
    target: Option<String>,
}

impl Default for TraceCapture {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            target: None,
        }
    }
}

impl TraceCapture {
    /// Sets the maximum level of captured lines.
    #[must_use]
    pub fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Captures only lines whose target starts with `target`.
    #[must_use]
    pub fn target<S: Into<String>>(mut self, target: S) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Installs the logger unless one has been installed by this crate already.
    ///
    /// # Errors
    ///
    /// Fails if another logger has been set up outside of this crate or a lock is poisoned.
    pub fn install(self) -> anyhow::Result<()> {
        let mut installed = INSTALLED.lock().map_err(|err| anyhow!("{:?}", err))?;
        if *installed {
            return Ok(());
        }
        let lines = Arc::clone(&LINES);
        let mut dispatch = fern::Dispatch::new()
            .level(self.level)
            .chain(fern::Output::call(move |record| {
                lines
                    .lock()
                    .expect("poisoned lock")
                    .push(format!("{:<5} {}", record.level(), record.args()));
            }));
        if let Some(target) = self.target {
            dispatch = dispatch.filter(move |metadata| metadata.target().starts_with(&target));
        }
        dispatch.apply()?;
        *installed = true;
        Ok(())
    }
}

/// Removes and returns the lines captured since the previous call.
///
/// # Errors
///
/// Fails if the lock is poisoned.
pub fn take_lines() -> anyhow::Result<Vec<String>> {
    let mut lines = LINES.lock().map_err(|err| anyhow!("{:?}", err))?;
    Ok(lines.drain(..).collect())
}
