//! esprov - ESP32 provisioning hostname resolver
//!
//! Drives an ESP32-class board into its ROM serial bootloader, reads the
//! factory MAC address out of the eFuse block, and writes the provisioning
//! hostname consumed by the downstream certificate/build tooling.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Resolve {
            port,
            baud,
            prefix,
            output,
        } => {
            let hostname = esprov_rom::resolve(&port, baud, &prefix)?;
            std::fs::write(&output, &hostname)?;
            log::info!("Wrote hostname artifact to {}", output.display());
            println!("{}", hostname);
            Ok(())
        }
        Commands::ReadMac { port, baud } => {
            let mac = esprov_rom::resolve_mac(&port, baud)?;
            println!("{}", mac);
            Ok(())
        }
        Commands::ListPorts => {
            list_ports();
            Ok(())
        }
    }
}

/// Print the serial ports visible to the host
fn list_ports() {
    match serialport::available_ports() {
        Ok(ports) if ports.is_empty() => println!("No serial ports found"),
        Ok(ports) => {
            for port in ports {
                match port.port_type {
                    serialport::SerialPortType::UsbPort(usb) => {
                        println!(
                            "{}  USB {:04x}:{:04x}{}",
                            port.port_name,
                            usb.vid,
                            usb.pid,
                            usb.product
                                .map(|p| format!(" ({})", p))
                                .unwrap_or_default()
                        );
                    }
                    _ => println!("{}", port.port_name),
                }
            }
        }
        Err(e) => eprintln!("Failed to enumerate serial ports: {}", e),
    }
}
