//! Windshield wiper controller
//!
//! Single wipes run for one wipe period and then fall back to `Off`, which
//! sends the Off frame. Auto modes cycle Off -> Low -> Mid -> High -> Off.

use serde::{Deserialize, Serialize};

use super::{ChannelConfig, PeripheralChannel, TransmitError};

/// Wiper command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WiperMode {
    /// Parked
    #[default]
    Off,
    /// One slow wipe
    LowSingle,
    /// One fast wipe
    HighSingle,
    /// Continuous, slow
    LowAuto,
    /// Continuous, medium
    MidAuto,
    /// Continuous, fast
    HighAuto,
}

impl WiperMode {
    /// One wipe, then back to `Off`
    pub fn is_single(&self) -> bool {
        matches!(self, WiperMode::LowSingle | WiperMode::HighSingle)
    }

    /// Continuous wiping
    pub fn is_auto(&self) -> bool {
        matches!(
            self,
            WiperMode::LowAuto | WiperMode::MidAuto | WiperMode::HighAuto
        )
    }

    /// Next mode of the auto-cycle key
    pub fn next_auto(&self) -> WiperMode {
        match self {
            WiperMode::Off => WiperMode::LowAuto,
            WiperMode::LowAuto => WiperMode::MidAuto,
            WiperMode::MidAuto => WiperMode::HighAuto,
            WiperMode::HighAuto => WiperMode::Off,
            WiperMode::LowSingle | WiperMode::HighSingle => WiperMode::LowAuto,
        }
    }
}

/// Wiper payloads and wipe rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WiperConfig {
    /// Frame and gate settings
    pub channel: ChannelConfig,
    /// Parked payload
    pub off: String,
    /// Single slow wipe payload
    pub low_single: String,
    /// Single fast wipe payload
    pub high_single: String,
    /// Auto slow payload
    pub low_auto: String,
    /// Auto medium payload
    pub mid_auto: String,
    /// Auto fast payload
    pub high_auto: String,
    /// Wipes per second at low speed
    pub cycles_per_second_low: f32,
    /// Wipes per second at medium speed
    pub cycles_per_second_mid: f32,
    /// Wipes per second at high speed
    pub cycles_per_second_high: f32,
}

impl Default for WiperConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::for_menu("Windshield Wiper"),
            off: "06 61 A2 00 00 00 00 00".to_string(),
            low_single: "06 61 A2 00 00 00 01 00".to_string(),
            high_single: "06 61 A2 00 00 00 10 00".to_string(),
            low_auto: "06 61 A2 00 01 00 00 00".to_string(),
            mid_auto: "06 61 A2 00 01 01 10 00".to_string(),
            high_auto: "06 61 A2 00 01 10 00 00".to_string(),
            cycles_per_second_low: 0.8,
            cycles_per_second_mid: 1.2,
            cycles_per_second_high: 1.8,
        }
    }
}

impl WiperConfig {
    /// Payload for `mode`
    pub fn payload(&self, mode: WiperMode) -> &str {
        match mode {
            WiperMode::Off => &self.off,
            WiperMode::LowSingle => &self.low_single,
            WiperMode::HighSingle => &self.high_single,
            WiperMode::LowAuto => &self.low_auto,
            WiperMode::MidAuto => &self.mid_auto,
            WiperMode::HighAuto => &self.high_auto,
        }
    }

    /// Wipe rate used to time `mode`
    pub fn cycles_per_second(&self, mode: WiperMode) -> f32 {
        match mode {
            WiperMode::MidAuto => self.cycles_per_second_mid,
            WiperMode::HighAuto | WiperMode::HighSingle => self.cycles_per_second_high,
            _ => self.cycles_per_second_low,
        }
    }
}

/// Wiper switch with single-wipe timing
pub struct WiperController {
    mode: WiperMode,
    single_elapsed: f32,
    single_duration: f32,
    config: WiperConfig,
    channel: PeripheralChannel,
}

impl WiperController {
    /// Controller with the wiper parked
    pub fn new(config: WiperConfig, channel: PeripheralChannel) -> Self {
        Self {
            mode: WiperMode::Off,
            single_elapsed: 0.0,
            single_duration: 0.0,
            config,
            channel,
        }
    }

    /// Active mode
    pub fn mode(&self) -> WiperMode {
        self.mode
    }

    /// Single slow wipe
    pub fn press_low_single(&mut self) -> Result<String, TransmitError> {
        self.set_mode(WiperMode::LowSingle)
    }

    /// Single fast wipe
    pub fn press_high_single(&mut self) -> Result<String, TransmitError> {
        self.set_mode(WiperMode::HighSingle)
    }

    /// Advance the auto cycle
    pub fn cycle_auto(&mut self) -> Result<String, TransmitError> {
        self.set_mode(self.mode.next_auto())
    }

    /// Every call is a new wiper command (a second single-wipe press starts
    /// another wipe), so this always sends.
    pub fn set_mode(&mut self, mode: WiperMode) -> Result<String, TransmitError> {
        self.mode = mode;
        self.single_elapsed = 0.0;
        if mode.is_single() {
            self.single_duration = 1.0 / self.config.cycles_per_second(mode).max(0.05);
        }
        self.channel.transmit(self.config.payload(mode))
    }

    /// Advance a single wipe. Returns the Off send once the wipe completes.
    pub fn tick(&mut self, dt: f32) -> Option<Result<String, TransmitError>> {
        if !self.mode.is_single() {
            return None;
        }
        self.single_elapsed += dt;
        if self.single_elapsed < self.single_duration {
            return None;
        }
        Some(self.set_mode(WiperMode::Off))
    }
}
