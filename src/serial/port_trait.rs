//! Write side of the modem link, behind a trait so the AT handshake can be
//! checked without a radio attached

use async_trait::async_trait;
use std::io;

/// Outgoing half of the serial link to the LoRa modem
///
/// Only the connect-time handshake writes to the modem; telemetry flows the
/// other way.
#[async_trait]
pub trait SerialPortIO: Send {
    /// Send one complete command line
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Push the command out before waiting on the modem
    async fn flush(&mut self) -> io::Result<()>;
}
