//! Two-level headlight (off / low beam / high beam)

use serde::{Deserialize, Serialize};

use super::{ChannelConfig, PeripheralChannel, TransmitError};

/// Headlight state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BeamMode {
    /// Lights off
    #[default]
    Off,
    /// Low beam
    Low,
    /// High beam
    High,
}

/// Payload per beam mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlightConfig {
    /// Frame and gate settings
    pub channel: ChannelConfig,
    /// Payload with lights off
    pub off: String,
    /// Low beam payload
    pub low: String,
    /// High beam payload
    pub high: String,
}

impl Default for HeadlightConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::for_menu("Headlight"),
            off: "03 61 42 00 00 00 00 00".to_string(),
            low: "03 61 42 01 00 00 00 00".to_string(),
            high: "03 61 42 10 00 00 00 00".to_string(),
        }
    }
}

impl HeadlightConfig {
    /// Payload for `mode`
    pub fn payload(&self, mode: BeamMode) -> &str {
        match mode {
            BeamMode::Off => &self.off,
            BeamMode::Low => &self.low,
            BeamMode::High => &self.high,
        }
    }
}

/// Headlight power and beam switch
pub struct HeadlightController {
    mode: BeamMode,
    config: HeadlightConfig,
    channel: PeripheralChannel,
}

impl HeadlightController {
    /// Controller with lights off
    pub fn new(config: HeadlightConfig, channel: PeripheralChannel) -> Self {
        Self {
            mode: BeamMode::Off,
            config,
            channel,
        }
    }

    /// Current beam mode
    pub fn mode(&self) -> BeamMode {
        self.mode
    }

    /// Any beam is on
    pub fn is_on(&self) -> bool {
        self.mode != BeamMode::Off
    }

    /// Lights on (low beam) / off
    pub fn toggle_power(&mut self) -> Result<Option<String>, TransmitError> {
        let next = if self.mode == BeamMode::Off {
            BeamMode::Low
        } else {
            BeamMode::Off
        };
        self.set_mode(next)
    }

    /// Switch low <-> high. Does nothing while the lights are off.
    pub fn toggle_beam(&mut self) -> Result<Option<String>, TransmitError> {
        match self.mode {
            BeamMode::Off => Ok(None),
            BeamMode::Low => self.set_mode(BeamMode::High),
            BeamMode::High => self.set_mode(BeamMode::Low),
        }
    }

    /// Apply `mode` and send its frame once. `Ok(None)` when the mode did
    /// not change.
    pub fn set_mode(&mut self, mode: BeamMode) -> Result<Option<String>, TransmitError> {
        if mode == self.mode {
            return Ok(None);
        }
        self.mode = mode;
        self.channel.transmit(self.config.payload(mode)).map(Some)
    }
}
