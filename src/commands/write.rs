//! Write command implementation

use super::Status;
use crate::error::CliError;
use crate::operator::TerminalOperator;
use cidflash_core::{
    CidConfig, Session, SessionOutcome, SessionReport, Verification, WriteOutcome,
};
use cidflash_mmc::{CommandToggle, MmcOpener};

/// Run the interactive CID modification
pub fn run_write(
    config: &CidConfig,
    cid: Option<String>,
    assume_yes: bool,
) -> Result<Status, CliError> {
    println!("Starting CID modification process...");

    let toggle = CommandToggle::from_config(config)?;
    let mut session = Session::new(config, MmcOpener, toggle);
    let mut operator = TerminalOperator::new(assume_yes, cid);

    match session.run(&mut operator)? {
        SessionOutcome::Aborted => {
            println!("CID modification aborted.");
            Ok(Status::Aborted)
        }
        SessionOutcome::Completed(report) => Ok(print_report(&report)),
    }
}

/// Print the summary of a completed run
fn print_report(report: &SessionReport) -> Status {
    println!();
    for attempt in &report.write.attempts {
        match &attempt.error {
            None => println!("  {:<28} ok", attempt.mechanism.to_string()),
            Some(e) => println!("  {:<28} failed: {}", attempt.mechanism.to_string(), e),
        }
    }

    match report.write.outcome {
        WriteOutcome::WrittenDirect => println!("CID written with direct program-CID command."),
        WriteOutcome::WrittenViaControlCode(code) => {
            println!("CID written with control code 0x{:08X}.", code)
        }
        WriteOutcome::AllMechanismsFailed => {
            unreachable!("Session::run returns an error when every mechanism fails")
        }
    }

    match &report.verification {
        Verification::Match => {
            println!("CID successfully updated: {}", report.requested);
            Status::Success
        }
        Verification::Mismatch(actual) => {
            println!("CID update not confirmed. Register now reads: {}", actual);
            if *actual == report.previous {
                println!("(unchanged from before the write)");
            }
            Status::Mismatch
        }
    }
}
