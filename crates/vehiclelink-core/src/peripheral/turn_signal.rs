//! Turn signal / hazard controller
//!
//! Pressing the key of the active mode switches the signal off. The blink
//! phase and the optional auto-cancel run on the frame clock.

use serde::{Deserialize, Serialize};

use super::{ChannelConfig, PeripheralChannel, TransmitError};

/// Which lamps are blinking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SignalMode {
    /// No signal
    #[default]
    Off,
    /// Left indicator
    Left,
    /// Right indicator
    Right,
    /// Both indicators
    Hazard,
}

/// Turn signal payloads and blink timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnSignalConfig {
    /// Frame and gate settings
    pub channel: ChannelConfig,
    /// Payload with no signal
    pub off: String,
    /// Left indicator payload
    pub left: String,
    /// Right indicator payload
    pub right: String,
    /// Hazard payload
    pub hazard: String,
    /// Lamp on-time per blink, seconds
    pub on_time: f32,
    /// Lamp off-time per blink, seconds
    pub off_time: f32,
    /// Start each mode with the lamp lit
    pub start_on: bool,
    /// Switch off automatically after this many seconds; 0 disables
    pub auto_cancel_secs: f32,
}

impl Default for TurnSignalConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::for_menu("Turnlight"),
            off: "03 61 41 00 00 00 00 00".to_string(),
            left: "03 61 41 01 00 00 00 00".to_string(),
            right: "03 61 41 10 00 00 00 00".to_string(),
            hazard: "03 61 41 11 00 00 00 00".to_string(),
            on_time: 0.45,
            off_time: 0.45,
            start_on: true,
            auto_cancel_secs: 0.0,
        }
    }
}

impl TurnSignalConfig {
    /// Payload for `mode`
    pub fn payload(&self, mode: SignalMode) -> &str {
        match mode {
            SignalMode::Off => &self.off,
            SignalMode::Left => &self.left,
            SignalMode::Right => &self.right,
            SignalMode::Hazard => &self.hazard,
        }
    }
}

/// Turn signal and hazard switch
pub struct TurnSignalController {
    mode: SignalMode,
    blink_on: bool,
    blink_timer: f32,
    auto_cancel_timer: f32,
    config: TurnSignalConfig,
    channel: PeripheralChannel,
}

impl TurnSignalController {
    /// Controller with the signal off
    pub fn new(config: TurnSignalConfig, channel: PeripheralChannel) -> Self {
        Self {
            mode: SignalMode::Off,
            blink_on: config.start_on,
            blink_timer: 0.0,
            auto_cancel_timer: 0.0,
            config,
            channel,
        }
    }

    /// Active signal
    pub fn mode(&self) -> SignalMode {
        self.mode
    }

    /// (left lamp lit, right lamp lit) for the current blink phase
    pub fn lamps(&self) -> (bool, bool) {
        match self.mode {
            SignalMode::Off => (false, false),
            SignalMode::Left => (self.blink_on, false),
            SignalMode::Right => (false, self.blink_on),
            SignalMode::Hazard => (self.blink_on, self.blink_on),
        }
    }

    /// Left key; pressing it again switches off
    pub fn press_left(&mut self) -> Result<Option<String>, TransmitError> {
        self.press(SignalMode::Left)
    }

    /// Right key; pressing it again switches off
    pub fn press_right(&mut self) -> Result<Option<String>, TransmitError> {
        self.press(SignalMode::Right)
    }

    /// Hazard key; pressing it again switches off
    pub fn press_hazard(&mut self) -> Result<Option<String>, TransmitError> {
        self.press(SignalMode::Hazard)
    }

    fn press(&mut self, mode: SignalMode) -> Result<Option<String>, TransmitError> {
        let next = if self.mode == mode {
            SignalMode::Off
        } else {
            mode
        };
        self.set_mode(next)
    }

    /// Switch to `mode`. `Ok(None)` when it is already active.
    pub fn set_mode(&mut self, mode: SignalMode) -> Result<Option<String>, TransmitError> {
        if mode == self.mode {
            return Ok(None);
        }
        self.mode = mode;
        self.blink_timer = 0.0;
        self.blink_on = self.config.start_on;
        self.auto_cancel_timer = 0.0;

        self.channel.transmit(self.config.payload(mode)).map(Some)
    }

    /// Advance the blink phase. Returns the send result when auto-cancel
    /// switched the signal off during this tick.
    pub fn tick(&mut self, dt: f32) -> Option<Result<Option<String>, TransmitError>> {
        if self.mode == SignalMode::Off {
            return None;
        }

        if self.config.auto_cancel_secs > 0.0 {
            self.auto_cancel_timer += dt;
            if self.auto_cancel_timer >= self.config.auto_cancel_secs {
                return Some(self.set_mode(SignalMode::Off));
            }
        }

        self.blink_timer += dt;
        let phase_len = if self.blink_on {
            self.config.on_time
        } else {
            self.config.off_time
        };
        if self.blink_timer >= phase_len {
            self.blink_timer = 0.0;
            self.blink_on = !self.blink_on;
        }
        None
    }
}
