//! ROM loader client
//!
//! [`RomClient`] owns one transport and all per-session protocol state: the
//! SLIP decoder buffer and the command exchange logic. The protocol is
//! strictly half-duplex, so a session is a single logical flow of control;
//! nothing here is shared.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::mac::{FuseWords, MacAddress};
use crate::protocol::{self, CommandReply};
use crate::slip::{self, SlipDecoder};
use crate::transport::{ControlLines, Transport};

/// Poll attempts per command before giving up
const POLL_ATTEMPTS: u32 = 10;
/// Per-attempt read timeout; 10 attempts give a ~500 ms budget per command
const POLL_TIMEOUT_MS: u32 = 50;
/// SYNC command attempts before the session is declared failed
const SYNC_RETRIES: u32 = 5;
/// Hold time for each step of the bootloader entry sequence
const RESET_HOLD: Duration = Duration::from_millis(100);
/// Cap on drain reads so a chattering device cannot stall a command
const DRAIN_READS: u32 = 64;

/// Client for the ESP32 ROM serial bootloader
pub struct RomClient<T: Transport> {
    transport: T,
    decoder: SlipDecoder,
}

impl<T: Transport> RomClient<T> {
    /// Wrap a transport in a fresh session
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            decoder: SlipDecoder::new(),
        }
    }

    /// Force the chip out of application firmware and into the ROM loader
    ///
    /// Asserts reset with the boot strap active, releases reset while the
    /// strap holds, then frees both lines. The two 100 ms holds are what the
    /// auto-reset circuit needs; shortening them leaves the chip in
    /// application firmware.
    pub fn enter_bootloader(&mut self) -> Result<()> {
        log::debug!("Entering bootloader via DTR/RTS sequence");
        self.transport
            .set_control_lines(ControlLines::ResetToBootloader)?;
        self.transport.sleep(RESET_HOLD);
        self.transport
            .set_control_lines(ControlLines::ReleaseResetKeepBootloader)?;
        self.transport.sleep(RESET_HOLD);
        self.transport.set_control_lines(ControlLines::FreeRun)?;
        Ok(())
    }

    /// Synchronize with the ROM loader
    ///
    /// Re-sends SYNC up to 5 times without re-toggling the control lines.
    /// The first valid reply wins; exhaustion is fatal for the session.
    pub fn sync(&mut self) -> Result<()> {
        for attempt in 1..=SYNC_RETRIES {
            log::debug!("SYNC attempt {}/{}", attempt, SYNC_RETRIES);
            if self
                .command(protocol::ESP_SYNC, &protocol::SYNC_PAYLOAD, false)?
                .is_valid()
            {
                log::info!("Synchronized with ROM loader");
                return Ok(());
            }
        }
        Err(Error::SyncFailed)
    }

    /// Read a 32-bit register by address
    pub fn read_reg(&mut self, addr: u32) -> Result<CommandReply> {
        self.command(protocol::ESP_READ_REG, &addr.to_le_bytes(), false)
    }

    /// Read the chip-detect magic register
    ///
    /// Purely diagnostic; `None` means the read came back invalid.
    pub fn chip_magic(&mut self) -> Result<Option<u32>> {
        let reply = self.read_reg(protocol::CHIP_DETECT_MAGIC_REG_ADDR)?;
        Ok(reply.value())
    }

    /// Read the four eFuse words backing the factory MAC
    ///
    /// A word whose read comes back invalid is substituted with zero, as the
    /// original provisioning tool does; the warning log is the operator's
    /// cue that the derived address is suspect.
    pub fn read_fuse_words(&mut self) -> Result<FuseWords> {
        let mut words: FuseWords = [0; protocol::MAC_FUSE_WORDS];
        for (i, word) in words.iter_mut().enumerate() {
            let addr = protocol::ESP32S3_MAC_FUSE_ADDR + 4 * i as u32;
            match self.read_reg(addr)? {
                CommandReply::Valid { value, .. } => *word = value,
                CommandReply::Invalid => {
                    log::warn!("Fuse word {} read failed, substituting 0", i);
                }
            }
        }
        Ok(words)
    }

    /// Read the fuse block and derive the factory MAC address
    pub fn read_mac(&mut self) -> Result<MacAddress> {
        let words = self.read_fuse_words()?;
        let mac = MacAddress::from_fuse_words(&words);
        log::info!("Factory MAC address is {}", mac);
        Ok(mac)
    }

    /// Execute one command exchange
    ///
    /// Writes exactly one framed request and polls for the matching reply.
    /// A frame with the wrong direction or opcode, or no frame within the
    /// attempt budget, yields `CommandReply::Invalid`; retrying is the
    /// caller's decision.
    pub fn command(
        &mut self,
        opcode: u8,
        payload: &[u8],
        with_checksum: bool,
    ) -> Result<CommandReply> {
        self.drain_stale()?;

        let packet = protocol::encode_request(opcode, payload, with_checksum);
        log::trace!(
            "Request: opcode=0x{:02X}, {} payload bytes",
            opcode,
            payload.len()
        );
        self.transport.write(&slip::encode(&packet))?;

        let mut buf = [0u8; 512];
        for _ in 0..POLL_ATTEMPTS {
            let n = self.transport.read_nonblock(&mut buf, POLL_TIMEOUT_MS)?;
            if n > 0 {
                self.decoder.feed(&buf[..n]);
            }
            if let Some(frame) = self.decoder.try_decode() {
                log::trace!("Response frame of {} bytes", frame.len());
                return Ok(protocol::parse_response(&frame, opcode));
            }
        }

        log::warn!("Timeout waiting for response to opcode 0x{:02X}", opcode);
        Ok(CommandReply::Invalid)
    }

    /// Discard pending inbound bytes and any decoded-but-unconsumed frames
    ///
    /// A stale response from an earlier exchange must never be matched to a
    /// new request.
    fn drain_stale(&mut self) -> Result<()> {
        let mut buf = [0u8; 512];
        for _ in 0..DRAIN_READS {
            let n = self.transport.read_nonblock(&mut buf, 1)?;
            if n == 0 {
                break;
            }
            log::trace!("Draining {} stale bytes", n);
        }
        self.decoder.clear();
        Ok(())
    }
}
