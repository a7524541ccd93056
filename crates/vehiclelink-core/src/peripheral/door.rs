//! Multi-door controller
//!
//! Each door toggles independently. The combined open mask selects one row
//! of the state table; a combination with no row is reported and not sent.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ChannelConfig, PeripheralChannel, TransmitError};

/// Bits of every known door
pub const DOOR_MASK_ALL: u8 = 0b1_1111;

/// A door with its own bit in the open mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Door {
    /// Driver door
    FrontLeft,
    /// Rear left door
    RearLeft,
    /// Passenger door
    FrontRight,
    /// Rear right door
    RearRight,
    /// Boot lid
    Tailgate,
}

impl Door {
    /// Every door, in bit order
    pub const ALL: [Door; 5] = [
        Door::FrontLeft,
        Door::RearLeft,
        Door::FrontRight,
        Door::RearRight,
        Door::Tailgate,
    ];

    /// This door's bit in the open mask
    pub fn bit(&self) -> u8 {
        match self {
            Door::FrontLeft => 1,
            Door::RearLeft => 1 << 1,
            Door::FrontRight => 1 << 2,
            Door::RearRight => 1 << 3,
            Door::Tailgate => 1 << 4,
        }
    }
}

/// One row of the door state table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorStateRow {
    /// Combined mask. Bits outside the five doors are ignored, so `-1`
    /// style "everything" values still match all doors open.
    pub mask: u32,
    /// Payload sent for this combination
    pub data_hex: String,
}

impl DoorStateRow {
    /// Row for a mask and its payload
    pub fn new(mask: u32, data_hex: &str) -> Self {
        Self {
            mask,
            data_hex: data_hex.to_string(),
        }
    }

    /// `mask` limited to the five door bits
    pub fn normalized_mask(&self) -> u8 {
        (self.mask & DOOR_MASK_ALL as u32) as u8
    }
}

/// Door controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorConfig {
    /// Frame and gate settings
    pub channel: ChannelConfig,
    /// Payload per open-door combination
    pub state_table: Vec<DoorStateRow>,
    /// Send on every toggle; when off only `force_send` transmits
    pub send_on_every_change: bool,
    /// Warn when a combination has no row
    pub log_missing_state: bool,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::for_menu("Door"),
            state_table: Vec::new(),
            send_on_every_change: true,
            log_missing_state: true,
        }
    }
}

impl DoorConfig {
    /// First row matching the normalized mask
    pub fn lookup(&self, mask: u8) -> Option<&str> {
        let mask = mask & DOOR_MASK_ALL;
        self.state_table
            .iter()
            .find(|row| row.normalized_mask() == mask)
            .map(|row| row.data_hex.as_str())
            .filter(|hex| !hex.trim().is_empty())
    }
}

/// Tracks open doors and sends the matching state row
pub struct DoorController {
    mask: u8,
    config: DoorConfig,
    channel: PeripheralChannel,
}

impl DoorController {
    /// Controller with every door closed
    pub fn new(config: DoorConfig, channel: PeripheralChannel) -> Self {
        Self {
            mask: 0,
            config,
            channel,
        }
    }

    /// Current open-door mask
    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// Whether `door` is open
    pub fn is_open(&self, door: Door) -> bool {
        self.mask & door.bit() != 0
    }

    /// Open/close one door. `Ok(None)` when sending on change is disabled.
    pub fn toggle(&mut self, door: Door) -> Result<Option<String>, TransmitError> {
        self.mask ^= door.bit();
        debug!(peripheral = self.channel.tag(), "{:?} -> mask {}", door, self.mask);
        if !self.config.send_on_every_change {
            return Ok(None);
        }
        self.force_send().map(Some)
    }

    /// Send the row for the current mask
    pub fn force_send(&self) -> Result<String, TransmitError> {
        self.channel.check_gate()?;

        let Some(data_hex) = self.config.lookup(self.mask) else {
            if self.config.log_missing_state {
                warn!(
                    peripheral = self.channel.tag(),
                    "No state mapping for mask {}", self.mask
                );
            }
            return Err(TransmitError::NoStateMapping { mask: self.mask });
        };

        let frame = self.channel.build(data_hex)?;
        self.channel.send_line(&frame.to_tx_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_normalizes_mask() {
        let config = DoorConfig {
            state_table: vec![
                DoorStateRow::new(0, "06 61 46 00 00 00 00 00"),
                DoorStateRow::new(u32::MAX, "06 61 46 1F 00 00 00 00"),
            ],
            ..DoorConfig::default()
        };
        assert_eq!(config.lookup(0), Some("06 61 46 00 00 00 00 00"));
        assert_eq!(config.lookup(DOOR_MASK_ALL), Some("06 61 46 1F 00 00 00 00"));
        assert_eq!(config.lookup(Door::Tailgate.bit()), None);
    }

    #[test]
    fn test_blank_row_counts_as_missing() {
        let config = DoorConfig {
            state_table: vec![DoorStateRow::new(1, "  ")],
            ..DoorConfig::default()
        };
        assert_eq!(config.lookup(1), None);
    }
}
