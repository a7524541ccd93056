//! Gear position broadcaster
//!
//! Sends the gear whenever it changes while the "Gear" menu is selected, and
//! once when the menu becomes selected so the adapter is in sync. The same
//! gear is never sent twice in a row.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChannelConfig, PeripheralChannel, TransmitError};
use crate::vehicle::Gear;

/// Gear report payloads, one per selector position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GearReportConfig {
    /// Frame and gate settings
    pub channel: ChannelConfig,
    /// Payload for P
    pub park: String,
    /// Payload for R
    pub reverse: String,
    /// Payload for N
    pub neutral: String,
    /// Payload for D
    pub drive: String,
    /// Payload for B
    pub brake: String,
    /// Send the current gear when the menu becomes selected
    pub send_on_select: bool,
}

impl Default for GearReportConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::for_menu("Gear"),
            park: "03 61 1C 08 00 00 00 00".to_string(),
            reverse: "03 61 1C 0E 00 00 00 00".to_string(),
            neutral: "03 61 1C 08 00 00 00 00".to_string(),
            drive: "03 61 1C 07 00 00 00 00".to_string(),
            brake: "03 61 1C 06 00 00 00 00".to_string(),
            send_on_select: true,
        }
    }
}

impl GearReportConfig {
    /// Payload reporting `gear`
    pub fn payload(&self, gear: Gear) -> &str {
        match gear {
            Gear::P => &self.park,
            Gear::R => &self.reverse,
            Gear::N => &self.neutral,
            Gear::D => &self.drive,
            Gear::B => &self.brake,
        }
    }
}

/// Reports gear changes while the "Gear" menu is selected
pub struct GearReportController {
    last_observed: Option<Gear>,
    last_sent: Option<Gear>,
    was_selected: bool,
    config: GearReportConfig,
    channel: PeripheralChannel,
}

impl GearReportController {
    /// Controller that has reported nothing yet
    pub fn new(config: GearReportConfig, channel: PeripheralChannel) -> Self {
        Self {
            last_observed: None,
            last_sent: None,
            was_selected: false,
            config,
            channel,
        }
    }

    /// Gear carried by the last successful send
    pub fn last_sent(&self) -> Option<Gear> {
        self.last_sent
    }

    /// Feed the current gear once per frame
    pub fn update(&mut self, gear: Gear) -> Option<Result<String, TransmitError>> {
        let selected = self.channel.menu_selected();
        let mut result = None;

        if self.config.send_on_select && selected && !self.was_selected {
            result = self.try_send(gear);
        }

        if self.last_observed != Some(gear) {
            self.last_observed = Some(gear);
            if selected {
                if let Some(r) = self.try_send(gear) {
                    result = Some(r);
                }
            } else {
                debug!(
                    peripheral = self.channel.tag(),
                    "Blocked (not selected '{}') gear changed to {}",
                    self.config.channel.required_menu,
                    gear
                );
            }
        }

        self.was_selected = selected;
        result
    }

    fn try_send(&mut self, gear: Gear) -> Option<Result<String, TransmitError>> {
        if self.last_sent == Some(gear) {
            return None;
        }
        let result = self.channel.transmit(self.config.payload(gear));
        if result.is_ok() {
            self.last_sent = Some(gear);
        }
        Some(result)
    }
}
