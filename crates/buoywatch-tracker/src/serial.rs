//! Serial delivery of coordinate messages.
//!
//! The consuming controller sits on the other end of a UART; losing it
//! must never take detection down. An unopenable port therefore yields
//! a degraded, detection-only link instead of an error, and write
//! failures are logged per occurrence while the port is kept for later
//! attempts.

use std::io::Write;
use std::time::Duration;

use tracing::{info, warn};

use crate::capture::MessageSink;

/// Write timeout for the port. Generous for a 9600-baud line carrying
/// a dozen bytes per message.
const TIMEOUT: Duration = Duration::from_secs(1);

/// A best-effort serial connection.
pub struct SerialLink {
    port: Option<Box<dyn serialport::SerialPort>>,
    device: String,
}

impl SerialLink {
    /// Open the device, degrading to a detection-only link when it is
    /// unavailable.
    #[must_use]
    pub fn open(device: &str, baud: u32) -> Self {
        let port = match serialport::new(device, baud).timeout(TIMEOUT).open() {
            Ok(port) => {
                info!("serial link open on {device} at {baud} baud");
                Some(port)
            }
            Err(error) => {
                warn!("serial unavailable on {device}: {error}; running detection-only");
                None
            }
        };
        Self {
            port,
            device: device.to_owned(),
        }
    }

    /// A link with no port at all, for runs that never report.
    #[must_use]
    pub fn detection_only() -> Self {
        Self {
            port: None,
            device: String::new(),
        }
    }

    /// Whether the port opened successfully and has not been closed.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Write one message. Returns `false` without writing when the link
    /// is degraded or closed; logs and returns `false` when the write
    /// fails. The port is kept either way, so a transient fault does
    /// not end reporting.
    pub fn send(&mut self, line: &str) -> bool {
        let Some(port) = self.port.as_mut() else {
            return false;
        };
        match port.write_all(line.as_bytes()) {
            Ok(()) => true,
            Err(error) => {
                warn!("serial write to {} failed: {error}", self.device);
                false
            }
        }
    }

    /// Release the port. Idempotent; the handle also releases on drop.
    pub fn close(&mut self) {
        if self.port.take().is_some() {
            info!("serial link on {} closed", self.device);
        }
    }
}

impl MessageSink for SerialLink {
    fn deliver(&mut self, line: &str) -> bool {
        self.send(line)
    }

    fn close(&mut self) {
        Self::close(self);
    }
}
