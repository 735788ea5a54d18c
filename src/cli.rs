//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "esprov")]
#[command(author, version, about = "ESP32 provisioning hostname resolver", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read the factory MAC and write the provisioning hostname artifact
    Resolve {
        /// Serial port of the target board (e.g., /dev/ttyUSB0 or COM3)
        #[arg(short, long)]
        port: String,

        /// Baud rate (defaults to 115200)
        #[arg(short, long)]
        baud: Option<u32>,

        /// Hostname prefix prepended to the MAC-derived suffix
        #[arg(long)]
        prefix: String,

        /// Output file for the hostname artifact
        #[arg(short, long, default_value = "hostname.txt")]
        output: PathBuf,
    },

    /// Read and print the factory MAC address without writing anything
    ReadMac {
        /// Serial port of the target board
        #[arg(short, long)]
        port: String,

        /// Baud rate (defaults to 115200)
        #[arg(short, long)]
        baud: Option<u32>,
    },

    /// List available serial ports
    ListPorts,
}
