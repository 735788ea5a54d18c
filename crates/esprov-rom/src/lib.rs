//! esprov-rom - ESP32 ROM serial bootloader client
//!
//! This crate speaks the command/response protocol of the ROM-resident
//! bootloader on ESP32-class chips, over a SLIP-framed serial link. It
//! covers exactly what provisioning needs: force the chip into the ROM
//! loader via DTR/RTS sequencing, synchronize, read the MAC eFuse words,
//! and derive the provisioning hostname. Flashing and the wider esptool
//! command set are out of scope.
//!
//! # Example
//!
//! ```no_run
//! use esprov_rom::open_serial;
//!
//! let mut client = open_serial("/dev/ttyUSB0", None)?;
//! client.enter_bootloader()?;
//! client.sync()?;
//! let mac = client.read_mac()?;
//! println!("hostname: {}", mac.hostname("esp32host_"));
//! # Ok::<(), esprov_rom::Error>(())
//! ```

pub mod device;
pub mod error;
pub mod mac;
pub mod protocol;
pub mod slip;
pub mod transport;

// Re-exports
pub use device::RomClient;
pub use error::{Error, Result};
pub use mac::{FuseWords, MacAddress};
pub use protocol::CommandReply;
pub use transport::serial::{SerialTransport, DEFAULT_BAUD};
pub use transport::{ControlLines, Transport};

/// Open a serial port and wrap it in a fresh ROM loader session
pub fn open_serial(device: &str, baud: Option<u32>) -> Result<RomClient<SerialTransport>> {
    let transport = SerialTransport::open(device, baud)?;
    Ok(RomClient::new(transport))
}

/// Run a full resolution session: enter the bootloader, sync, read the MAC
///
/// The transport is opened here and dropped (closed) on every path out,
/// success or failure. Fatal outcomes are an open failure or exhausted SYNC
/// retries; no partial result escapes either.
pub fn resolve_mac(device: &str, baud: Option<u32>) -> Result<MacAddress> {
    let mut client = open_serial(device, baud)?;
    client.enter_bootloader()?;
    client.sync()?;

    match client.chip_magic()? {
        Some(magic) => log::info!("Chip-detect magic register reads 0x{:08X}", magic),
        None => log::warn!("Chip-detect magic register read failed"),
    }

    client.read_mac()
}

/// Resolve the provisioning hostname for the device on `device`
pub fn resolve(device: &str, baud: Option<u32>, prefix: &str) -> Result<String> {
    let mac = resolve_mac(device, baud)?;
    let hostname = mac.hostname(prefix);
    log::info!("Provisioning hostname is {}", hostname);
    Ok(hostname)
}
