//! Transport layer for ROM loader communication
//!
//! The [`Transport`] trait covers everything the protocol driver needs from
//! the wire: raw writes, timed reads, DTR/RTS control-line assertions for
//! boot-mode sequencing, and the delay primitive. Delays go through the
//! trait so protocol tests can run against a fake with a no-op clock.

use std::time::Duration;

use crate::error::{Error, Result};

/// Combined state of the two boot-strapping control lines
///
/// The ESP32 reset (EN) and boot-strap (GPIO0) pins hang off DTR and RTS on
/// the usual dev-board auto-reset circuit. The three combinations below are
/// the only ones the entry sequence needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlLines {
    /// Hold the chip in reset with the boot-strap pin requesting the ROM loader
    ResetToBootloader,
    /// Release reset while still strapping for the ROM loader
    ReleaseResetKeepBootloader,
    /// Both lines released; the chip runs freely
    FreeRun,
}

impl ControlLines {
    /// The (DTR, RTS) levels for this state
    pub fn dtr_rts(self) -> (bool, bool) {
        match self {
            ControlLines::ResetToBootloader => (false, true),
            ControlLines::ReleaseResetKeepBootloader => (true, false),
            ControlLines::FreeRun => (false, false),
        }
    }
}

/// Transport trait for ROM loader sessions
pub trait Transport {
    /// Write bytes to the transport
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read up to `buf.len()` bytes, waiting at most `timeout_ms`
    ///
    /// Returns the number of bytes read, or 0 on timeout.
    fn read_nonblock(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize>;

    /// Assert a control-line combination
    fn set_control_lines(&mut self, lines: ControlLines) -> Result<()>;

    /// Pause the session
    fn sleep(&mut self, duration: Duration);
}

pub mod serial {
    //! Serial port transport over the `serialport` crate

    use super::*;
    use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
    use std::io::{Read, Write};

    /// Default ROM loader baud rate
    pub const DEFAULT_BAUD: u32 = 115_200;

    /// Serial port transport
    ///
    /// Exactly one handle exists per resolution session; dropping it closes
    /// the port, so every exit path releases the hardware.
    pub struct SerialTransport {
        port: Box<dyn SerialPort>,
    }

    impl SerialTransport {
        /// Open a serial port at 8N1 with the given baud rate
        ///
        /// `None` selects the ROM loader default of 115200.
        pub fn open(device: &str, baud: Option<u32>) -> Result<Self> {
            let baud_rate = baud.unwrap_or(DEFAULT_BAUD);

            let port = serialport::new(device, baud_rate)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .timeout(Duration::from_secs(5))
                .open()
                .map_err(|e| Error::Connection(format!("{}: {}", device, e)))?;

            log::info!("Opened serial port {} at {} baud", device, baud_rate);

            Ok(Self { port })
        }
    }

    impl Transport for SerialTransport {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            self.port.write_all(data)?;
            self.port.flush()?;
            Ok(())
        }

        fn read_nonblock(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize> {
            // Set temporary timeout
            let old_timeout = self.port.timeout();
            self.port
                .set_timeout(Duration::from_millis(timeout_ms as u64))?;

            let result = match self.port.read(buf) {
                Ok(n) => Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
                Err(e) => Err(Error::from(e)),
            };

            // Restore timeout
            self.port.set_timeout(old_timeout)?;
            result
        }

        fn set_control_lines(&mut self, lines: ControlLines) -> Result<()> {
            let (dtr, rts) = lines.dtr_rts();
            self.port.write_data_terminal_ready(dtr)?;
            self.port.write_request_to_send(rts)?;
            log::debug!("Control lines {:?}: DTR={}, RTS={}", lines, dtr, rts);
            Ok(())
        }

        fn sleep(&mut self, duration: Duration) {
            std::thread::sleep(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_line_levels() {
        assert_eq!(ControlLines::ResetToBootloader.dtr_rts(), (false, true));
        assert_eq!(
            ControlLines::ReleaseResetKeepBootloader.dtr_rts(),
            (true, false)
        );
        assert_eq!(ControlLines::FreeRun.dtr_rts(), (false, false));
    }
}
