//! Accelerator panel: typed target speed
//!
//! The operator types a whole number 0-255. The car starts holding that
//! speed immediately, link or no link. The same number goes out as the
//! accelerator byte, held as pending until the "Accelerator" menu is
//! selected and the link is open, then sent exactly once. The byte is
//! written without flushing the adapter buffers first.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ChannelConfig, PeripheralChannel, SpeedInputError, TransmitError};
use crate::vehicle::VehicleDynamicsController;

/// Accelerator panel settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceleratorConfig {
    /// Frame and gate settings
    pub channel: ChannelConfig,
    /// Send the byte at all
    pub enable_uart: bool,
    /// Emit the bare `7B8 03 61 03 XX ...` line instead of a `TX` command
    pub legacy_wire_format: bool,
    /// Ramp handed to the external speed command, km/h per second
    pub ramp_kmh_per_sec: f32,
}

impl Default for AcceleratorConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig {
                flush_before_send: false,
                ..ChannelConfig::for_menu("Accelerator")
            },
            enable_uart: true,
            legacy_wire_format: false,
            ramp_kmh_per_sec: 25.0,
        }
    }
}

/// Payload carrying the accelerator byte
pub fn accelerator_payload(value: u8) -> String {
    format!("03 61 03 {:02X} 00 00 00 00", value)
}

/// Parse operator text: whole numbers 0-255 only
pub fn parse_speed_input(text: &str) -> Result<u8, SpeedInputError> {
    let raw = text.trim();
    if raw.is_empty() {
        return Err(SpeedInputError::Empty);
    }
    if raw.contains('.') || raw.contains(',') {
        return Err(SpeedInputError::NotInteger(raw.to_string()));
    }
    let value: i64 = raw
        .parse()
        .map_err(|_| SpeedInputError::NotInteger(raw.to_string()))?;
    u8::try_from(value).map_err(|_| SpeedInputError::OutOfRange(value))
}

/// Speed readout shown next to the input, e.g. "Speed 12 km/h"
pub fn format_speed(kmh: f32) -> String {
    format!("Speed {} km/h", kmh.max(0.0).round() as i64)
}

/// Holds the typed speed byte until it can be sent
pub struct AcceleratorController {
    pending: Option<u8>,
    /// A write failure for the pending byte was already returned
    failure_reported: bool,
    last_target_kmh: f32,
    config: AcceleratorConfig,
    channel: PeripheralChannel,
}

impl AcceleratorController {
    /// Controller with nothing pending
    pub fn new(config: AcceleratorConfig, channel: PeripheralChannel) -> Self {
        Self {
            pending: None,
            failure_reported: false,
            last_target_kmh: 0.0,
            config,
            channel,
        }
    }

    /// Byte waiting for the gate and link
    pub fn pending(&self) -> Option<u8> {
        self.pending
    }

    /// Last accepted target speed, km/h
    pub fn last_target_kmh(&self) -> f32 {
        self.last_target_kmh
    }

    /// Operator pressed send. On valid input the car's external speed
    /// command is set and a send is attempted right away.
    pub fn submit_text(
        &mut self,
        text: &str,
        dynamics: &mut VehicleDynamicsController,
    ) -> Result<Option<Result<String, TransmitError>>, SpeedInputError> {
        let value = parse_speed_input(text).map_err(|e| {
            debug!(peripheral = self.channel.tag(), "Invalid speed input: {}", e);
            e
        })?;

        self.last_target_kmh = value as f32;
        dynamics.set_external_target_speed(self.last_target_kmh, self.config.ramp_kmh_per_sec);

        if !self.config.enable_uart {
            return Ok(None);
        }
        self.pending = Some(value);
        self.failure_reported = false;
        Ok(self.try_send_pending())
    }

    /// Per-frame retry of the pending byte
    pub fn tick(&mut self) -> Option<Result<String, TransmitError>> {
        self.try_send_pending()
    }

    fn try_send_pending(&mut self) -> Option<Result<String, TransmitError>> {
        if !self.config.enable_uart {
            return None;
        }
        let value = self.pending?;
        // stays pending until the menu is selected and the link is open,
        // also for an ungated channel
        if !self.channel.gate_open() || !self.channel.link_open() {
            return None;
        }

        let line = match self.wire_line(value) {
            Ok(line) => line,
            Err(e) => {
                self.pending = None;
                return Some(Err(e));
            }
        };

        match self.channel.send_line(&line) {
            Ok(line) => {
                self.pending = None;
                info!(
                    peripheral = self.channel.tag(),
                    "UART sent (auto): target={} km/h byte={:02X}", self.last_target_kmh, value
                );
                Some(Ok(line))
            }
            // retried every frame, returned once per byte
            Err(_) if self.failure_reported => None,
            Err(e) => {
                self.failure_reported = true;
                Some(Err(e))
            }
        }
    }

    fn wire_line(&self, value: u8) -> Result<String, TransmitError> {
        let frame = self.channel.build(&accelerator_payload(value))?;
        if self.config.legacy_wire_format {
            Ok(format!("{} {}", frame.id(), accelerator_payload(value)))
        } else {
            Ok(frame.to_tx_line())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_speed_input() {
        assert_eq!(parse_speed_input(" 40 "), Ok(40));
        assert_eq!(parse_speed_input("0"), Ok(0));
        assert_eq!(parse_speed_input("255"), Ok(255));
        assert_eq!(parse_speed_input(""), Err(SpeedInputError::Empty));
        assert_eq!(
            parse_speed_input("12.5"),
            Err(SpeedInputError::NotInteger("12.5".to_string()))
        );
        assert_eq!(
            parse_speed_input("1,0"),
            Err(SpeedInputError::NotInteger("1,0".to_string()))
        );
        assert_eq!(parse_speed_input("256"), Err(SpeedInputError::OutOfRange(256)));
        assert_eq!(parse_speed_input("-1"), Err(SpeedInputError::OutOfRange(-1)));
        assert!(matches!(parse_speed_input("abc"), Err(SpeedInputError::NotInteger(_))));
    }

    #[test]
    fn test_payload_and_readout() {
        assert_eq!(accelerator_payload(0xFF), "03 61 03 FF 00 00 00 00");
        assert_eq!(accelerator_payload(40), "03 61 03 28 00 00 00 00");
        assert_eq!(format_speed(11.6), "Speed 12 km/h");
        assert_eq!(format_speed(-3.0), "Speed 0 km/h");
    }
}
