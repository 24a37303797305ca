//! # LoRa Modem Handshake
//!
//! AT command sequence sent once after the serial port opens, putting the
//! receiving modem on the same address, network and RF parameters as the
//! vehicle's transmitter.
//!
//! Command order:
//! 1. `AT+RESET`
//! 2. `AT+CRFOP=<power>` (RF output power, dBm)
//! 3. `AT+ADDRESS=<address>`
//! 4. `AT+NETWORKID=<id>`
//! 5. `AT+PARAMETER=<sf>,<bw>,<cr>,<preamble>`
//!
//! The modem answers each command with a `+OK`/`+READY` line; those replies
//! arrive on the read side and are dropped there like any other non-telemetry
//! line.

use std::time::Duration;

use tracing::{debug, info};

use super::port_trait::SerialPortIO;
use crate::config::RadioConfig;
use crate::error::{Result, TelemetryError};

/// Time the modem needs to come back after `AT+RESET`
pub const RESET_SETTLE: Duration = Duration::from_millis(100);

/// Build the handshake command list for a radio configuration
///
/// # Examples
///
/// ```
/// use telemetry_dash::config::RadioConfig;
/// use telemetry_dash::serial::modem::handshake_commands;
///
/// let commands = handshake_commands(&RadioConfig::default());
/// assert_eq!(commands[0], "AT+RESET");
/// assert_eq!(commands[4], "AT+PARAMETER=9,7,1,12");
/// ```
pub fn handshake_commands(radio: &RadioConfig) -> Vec<String> {
    vec![
        "AT+RESET".to_string(),
        format!("AT+CRFOP={}", radio.rf_power_dbm),
        format!("AT+ADDRESS={}", radio.address),
        format!("AT+NETWORKID={}", radio.network_id),
        format!(
            "AT+PARAMETER={},{},{},{}",
            radio.spreading_factor, radio.bandwidth, radio.coding_rate, radio.preamble
        ),
    ]
}

/// Send the handshake to the modem
///
/// # Arguments
///
/// * `port` - Open serial port to the modem
/// * `radio` - Radio parameters
///
/// # Errors
///
/// Returns `TelemetryError::Modem` naming the command that could not be sent.
pub async fn configure<P: SerialPortIO + ?Sized>(port: &mut P, radio: &RadioConfig) -> Result<()> {
    for (i, command) in handshake_commands(radio).iter().enumerate() {
        debug!("Modem <- {}", command);

        let line = format!("{}\r\n", command);
        port.write_all(line.as_bytes())
            .await
            .map_err(|e| TelemetryError::Modem(format!("Failed to send '{}': {}", command, e)))?;
        port.flush()
            .await
            .map_err(|e| TelemetryError::Modem(format!("Failed to flush '{}': {}", command, e)))?;

        if i == 0 {
            tokio::time::sleep(RESET_SETTLE).await;
        }
    }

    info!(
        "Modem configured (address {}, network {}, SF{})",
        radio.address, radio.network_id, radio.spreading_factor
    );
    Ok(())
}
