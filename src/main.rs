//! cidflash - SD/MMC card CID register tool
//!
//! Locates the CID register of the attached card through sysfs, shows it for
//! confirmation, clears the block device's read-only flag when needed and
//! tries to program a new CID: first with a direct CMD26 (PROGRAM_CID), then
//! with a configurable list of vendor control codes. The register is re-read
//! afterwards to verify the result.
//!
//! # Exit codes
//!
//! 0 success, 1 aborted by the operator, 2 no card found, 3 register read
//! failed, 4 invalid input, 5 write protection could not be disabled,
//! 6 block device could not be opened, 7 all write mechanisms failed,
//! 8 verification mismatch.

mod cli;
mod commands;
mod error;
mod operator;

use clap::error::ErrorKind;
use clap::Parser;
use cli::{Cli, Commands, WpCommands};
use cidflash_core::{CidConfig, CidError};
use log::LevelFilter;
use commands::Status;
use error::CliError;
use std::process::ExitCode;
use std::time::Duration;

/// Exit code for command lines clap rejects
const USAGE_EXIT_CODE: u8 = 4;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(parse_error_exit_code(&e));
        }
    };

    // Initialize logger
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = verbosity_filter(cli.verbose) {
        builder.filter_level(level);
    }
    builder.init();

    match run(cli) {
        Ok(status) => ExitCode::from(status.exit_code()),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Log level forced by `-v` flags; `None` keeps RUST_LOG or the info default
fn verbosity_filter(verbose: u8) -> Option<LevelFilter> {
    match verbose {
        0 => None,
        1 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    }
}

/// `--help` and `--version` succeed; every other parse error is invalid input
fn parse_error_exit_code(e: &clap::Error) -> u8 {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => USAGE_EXIT_CODE,
    }
}

fn run(cli: Cli) -> Result<Status, CliError> {
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Info => commands::info::cmd_info(&config),
        Commands::Write {
            cid,
            yes,
            codes,
            settle_ms,
        } => {
            if !codes.is_empty() {
                config.control_codes = codes;
            }
            if let Some(ms) = settle_ms {
                config.settle_delay = Duration::from_millis(ms);
            }
            commands::write::run_write(&config, cid, yes)
        }
        Commands::Verify { cid } => commands::verify::cmd_verify(&config, &cid),
        Commands::Wp(subcmd) => match subcmd {
            WpCommands::Status => commands::wp::cmd_status(&config),
            WpCommands::Disable => commands::wp::cmd_disable(&config),
        },
        Commands::Config => {
            let rendered = config
                .to_toml_string()
                .map_err(|message| CidError::Config {
                    path: cli.config.clone().unwrap_or_default(),
                    message,
                })?;
            print!("{}", rendered);
            Ok(Status::Success)
        }
    }
}

/// Defaults, then the config file, then global CLI overrides
fn load_config(cli: &Cli) -> Result<CidConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => {
            let config = CidConfig::from_toml_file(path)?;
            log::info!("Loaded configuration from {}", path.display());
            config
        }
        None => CidConfig::default(),
    };

    if let Some(device) = &cli.device {
        config.set_block_device(device);
    }
    if let Some(cid_file) = &cli.cid_file {
        config.cid_file = Some(cid_file.clone());
    }

    log::debug!("Effective configuration: {:?}", config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_filter() {
        assert_eq!(verbosity_filter(0), None);
        assert_eq!(verbosity_filter(1), Some(LevelFilter::Debug));
        assert_eq!(verbosity_filter(2), Some(LevelFilter::Trace));
        assert_eq!(verbosity_filter(5), Some(LevelFilter::Trace));
    }

    #[test]
    fn test_verbose_flag_enables_debug_records() {
        let cli = Cli::try_parse_from(["cidflash", "-v", "config"]).unwrap();
        let mut builder = env_logger::Builder::new();
        builder.parse_filters("info");
        if let Some(level) = verbosity_filter(cli.verbose) {
            builder.filter_level(level);
        }
        let logger = builder.build();
        assert_eq!(logger.filter(), LevelFilter::Debug);
    }

    #[test]
    fn test_usage_errors_exit_as_invalid_input() {
        let bad_code = Cli::try_parse_from(["cidflash", "write", "--codes", "0xZZ"]).unwrap_err();
        assert_eq!(parse_error_exit_code(&bad_code), 4);

        let unknown = Cli::try_parse_from(["cidflash", "frobnicate"]).unwrap_err();
        assert_eq!(parse_error_exit_code(&unknown), 4);

        let help = Cli::try_parse_from(["cidflash", "--help"]).unwrap_err();
        assert_eq!(parse_error_exit_code(&help), 0);
    }
}
