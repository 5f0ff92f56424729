//! CLI argument parsing

use cidflash_core::config::parse_code;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cidflash")]
#[command(author, version, about = "SD/MMC card CID register tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (TOML format)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Block device to operate on (default /dev/mmcblk0)
    /// The read-only flag is taken from /sys/block/<name>/ro
    #[arg(short, long, global = true)]
    pub device: Option<PathBuf>,

    /// CID register file to use instead of scanning /sys/class/mmc_host
    #[arg(long, global = true)]
    pub cid_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the CID register and write protection state of the card
    Info,

    /// Write a new CID to the card
    Write {
        /// New CID (32 hexadecimal characters); prompted for if omitted
        #[arg(long)]
        cid: Option<String>,

        /// Answer yes to every confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Control codes to try after the direct write (comma-separated, hex or decimal)
        #[arg(long, value_delimiter = ',', value_parser = parse_code)]
        codes: Vec<u32>,

        /// Settling delay before verification, in milliseconds
        #[arg(long)]
        settle_ms: Option<u64>,
    },

    /// Compare the CID register against a value
    Verify {
        /// Expected CID (32 hexadecimal characters)
        #[arg(long)]
        cid: String,
    },

    /// Write protection operations
    #[command(subcommand)]
    Wp(WpCommands),

    /// Print the effective configuration as TOML
    Config,
}

/// Write protection subcommands
#[derive(Subcommand, Debug)]
pub enum WpCommands {
    /// Show write protection status
    Status,

    /// Disable write protection
    Disable,
}
