//! One complete CID modification run
//!
//! [`Session::run`] sequences the components strictly in order:
//! locate, read, operator confirmation, protection check (and clearing),
//! entry and confirmation of the new value, write, verify. Each step
//! finishes before the next one starts. A negative answer from the
//! [`Operator`] ends the run with [`SessionOutcome::Aborted`] before the
//! device is touched.

use crate::cid::CidValue;
use crate::config::CidConfig;
use crate::error::Result;
use crate::locator;
use crate::protection::{self, ProtectionState, ProtectionToggle};
use crate::register;
use crate::verify::{self, Verification};
use crate::writer::{CidWriter, DeviceOpener, WriteReport};
use log::info;
use std::fmt;
use std::path::PathBuf;

/// Steps reported to the operator while a run progresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Locating,
    Reading,
    CheckingProtection,
    DisablingProtection,
    Writing,
    Verifying,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Locating => "Locating CID register",
            Stage::Reading => "Reading current CID",
            Stage::CheckingProtection => "Checking write protection",
            Stage::DisablingProtection => "Disabling write protection",
            Stage::Writing => "Writing new CID",
            Stage::Verifying => "Verifying new CID",
        })
    }
}

/// The person (or script) driving a run
pub trait Operator {
    /// Ask a yes/no question; anything but an affirmative answer is `false`
    fn confirm(&mut self, question: &str) -> bool;

    /// Ask for the replacement CID; `None` when no value was entered
    fn request_cid(&mut self) -> Option<String>;

    /// A stage is starting
    fn begin(&mut self, _stage: Stage) {}

    /// A stage finished; `ok` is false when it failed
    fn end(&mut self, _stage: Stage, _ok: bool) {}
}

/// Everything observed during a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub control_path: PathBuf,
    pub previous: String,
    pub protection: ProtectionState,
    pub requested: CidValue,
    pub write: WriteReport,
    pub verification: Verification,
}

/// How a run ended without an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Operator declined; nothing was written
    Aborted,
    /// The write stage succeeded and the register was re-read
    Completed(SessionReport),
}

/// A configured run against one card
pub struct Session<'a, O: DeviceOpener, T: ProtectionToggle> {
    config: &'a CidConfig,
    writer: CidWriter<O>,
    toggle: T,
}

impl<'a, O: DeviceOpener, T: ProtectionToggle> Session<'a, O, T> {
    pub fn new(config: &'a CidConfig, opener: O, toggle: T) -> Self {
        Self {
            config,
            writer: CidWriter::from_config(opener, config),
            toggle,
        }
    }

    /// Run the whole modification flow
    pub fn run<P: Operator + ?Sized>(&mut self, operator: &mut P) -> Result<SessionOutcome> {
        let config = self.config;
        let control_path = staged(operator, Stage::Locating, || locator::control_path(config))?;
        info!("CID register: {}", control_path.display());

        let previous = staged(operator, Stage::Reading, || register::read(&control_path))?;
        info!("Current CID: {}", previous);

        if !operator.confirm(&format!("Current CID is {}. Is this correct?", previous)) {
            return Ok(SessionOutcome::Aborted);
        }

        let protection = staged(operator, Stage::CheckingProtection, || {
            Ok(protection::is_protected(&config.ro_flag))
        })?;
        if protection.needs_disable() {
            let device = config.block_device.clone();
            let toggle = &mut self.toggle;
            staged(operator, Stage::DisablingProtection, || {
                protection::disable_protection(toggle, &device)
            })?;
        }

        let Some(entered) = operator.request_cid() else {
            return Ok(SessionOutcome::Aborted);
        };
        let requested: CidValue = entered.parse()?;

        if !operator.confirm(&format!(
            "Write new CID {} to {}?",
            requested,
            self.writer.device().display()
        )) {
            return Ok(SessionOutcome::Aborted);
        }

        let writer = &mut self.writer;
        let write = staged(operator, Stage::Writing, || {
            writer.write(&requested)?.into_result()
        })?;

        let settle = config.settle_delay;
        let verification = staged(operator, Stage::Verifying, || {
            verify::verify(&control_path, &requested, settle)
        })?;

        Ok(SessionOutcome::Completed(SessionReport {
            control_path,
            previous,
            protection,
            requested,
            write,
            verification,
        }))
    }
}

/// Bracket `f` with the operator's stage notifications
fn staged<P: Operator + ?Sized, R>(
    operator: &mut P,
    stage: Stage,
    f: impl FnOnce() -> Result<R>,
) -> Result<R> {
    operator.begin(stage);
    let result = f();
    operator.end(stage, result.is_ok());
    result
}
