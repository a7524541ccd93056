//! On/off signals: brake light, reverse light and brake pedal
//!
//! The controller is fed the live boolean every frame and sends only on an
//! edge. The brake pedal variant also re-sends its current state when its
//! menu becomes selected, so the adapter learns the pedal position without
//! waiting for the next press.

use serde::{Deserialize, Serialize};

use super::{ChannelConfig, PeripheralChannel, TransmitError};

/// On/off signal payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinarySignalConfig {
    /// Frame and gate settings
    pub channel: ChannelConfig,
    /// Payload while inactive
    pub off: String,
    /// Payload while active
    pub on: String,
    /// Send the current state on the rising edge of the menu selection
    pub resend_on_select: bool,
}

impl Default for BinarySignalConfig {
    fn default() -> Self {
        Self::brake_light()
    }
}

impl BinarySignalConfig {
    /// Brake light on "Brakelight"
    pub fn brake_light() -> Self {
        Self {
            channel: ChannelConfig::for_menu("Brakelight"),
            off: "03 61 43 00 00 00 00 00".to_string(),
            on: "03 61 43 01 00 00 00 00".to_string(),
            resend_on_select: false,
        }
    }

    /// Reverse light on "Reverselight"
    pub fn reverse_light() -> Self {
        Self {
            channel: ChannelConfig::for_menu("Reverselight"),
            off: "03 61 48 00 00 00 00 00".to_string(),
            on: "03 61 48 01 00 00 00 00".to_string(),
            resend_on_select: false,
        }
    }

    /// Menu is spelled "Break" in the stock side panel
    pub fn brake_pedal() -> Self {
        Self {
            channel: ChannelConfig::for_menu("Break"),
            off: "10 0A 61 04 32 CC 00 00".to_string(),
            on: "10 0A 61 04 51 AE 3E 5E".to_string(),
            resend_on_select: true,
        }
    }
}

/// Sends an on/off signal on each edge of a live flag
pub struct BinarySignalController {
    active: bool,
    was_selected: bool,
    config: BinarySignalConfig,
    channel: PeripheralChannel,
}

impl BinarySignalController {
    /// Controller starting inactive
    pub fn new(config: BinarySignalConfig, channel: PeripheralChannel) -> Self {
        Self {
            active: false,
            was_selected: false,
            config,
            channel,
        }
    }

    /// Last state fed to `update`
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Feed the live state. Returns `None` when nothing needed sending.
    pub fn update(&mut self, active: bool) -> Option<Result<String, TransmitError>> {
        let selected = self.channel.menu_selected();
        let rising_select = selected && !self.was_selected;
        self.was_selected = selected;

        let changed = active != self.active;
        self.active = active;

        if !changed && !(self.config.resend_on_select && rising_select) {
            return None;
        }

        let payload = if self.active {
            &self.config.on
        } else {
            &self.config.off
        };
        // an empty payload disables this edge
        if payload.trim().is_empty() {
            return None;
        }
        Some(self.channel.transmit(payload))
    }
}
