//! Simulator configuration
//!
//! One JSON document holds the link settings, the dynamics tuning, the gear
//! rules and the payload table of every peripheral. Missing fields take
//! their defaults, so a file only needs the values that differ.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::peripheral::{
    AcceleratorConfig, BinarySignalConfig, ChannelConfig, DoorConfig, GearReportConfig,
    HeadlightConfig, SteeringConfig, TurnSignalConfig, WiperConfig,
};
use crate::protocol::frame::{normalize_id, parse_data_bytes};
use crate::protocol::{CanFrameType, LinkConfig, MAX_DATA_BYTES};
use crate::vehicle::{DynamicsConfig, GearConfig, Gear};

/// Failure loading, saving or validating a [`SimConfig`]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// File is not valid config JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value failed validation
    #[error("Invalid {field}: {message}")]
    Invalid {
        /// Dotted path of the offending field
        field: String,
        /// What is wrong with it
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Frame clock of the simulation loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Fixed physics step, seconds
    pub fixed_dt_secs: f32,
    /// Frame update interval, seconds
    pub frame_dt_secs: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            fixed_dt_secs: 0.02,
            frame_dt_secs: 1.0 / 60.0,
        }
    }
}

/// Per-peripheral channel and payload settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeripheralsConfig {
    /// Headlight beam payloads
    pub headlight: HeadlightConfig,
    /// Turn signal and hazard payloads
    pub turn_signal: TurnSignalConfig,
    /// Brake light lamp
    pub brake_light: BinarySignalConfig,
    /// Reverse light lamp
    pub reverse_light: BinarySignalConfig,
    /// Brake pedal switch
    pub brake_pedal: BinarySignalConfig,
    /// Gear position report
    pub gear_report: GearReportConfig,
    /// Wiper modes and cycle rates
    pub wiper: WiperConfig,
    /// Steering wheel range and rates
    pub steering: SteeringConfig,
    /// Door state table
    pub door: DoorConfig,
    /// Accelerator speed byte
    pub accelerator: AcceleratorConfig,
}

impl Default for PeripheralsConfig {
    fn default() -> Self {
        Self {
            headlight: HeadlightConfig::default(),
            turn_signal: TurnSignalConfig::default(),
            brake_light: BinarySignalConfig::brake_light(),
            reverse_light: BinarySignalConfig::reverse_light(),
            brake_pedal: BinarySignalConfig::brake_pedal(),
            gear_report: GearReportConfig::default(),
            wiper: WiperConfig::default(),
            steering: SteeringConfig::default(),
            door: DoorConfig::default(),
            accelerator: AcceleratorConfig::default(),
        }
    }
}

/// Complete simulator configuration, stored as JSON
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Serial adapter settings
    pub link: LinkConfig,
    /// Loop timing
    pub timing: TimingConfig,
    /// Vehicle dynamics tuning
    pub dynamics: DynamicsConfig,
    /// Gear selector tuning
    pub gear: GearConfig,
    /// Peripheral controllers
    pub peripherals: PeripheralsConfig,
}

impl SimConfig {
    /// Load from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Write as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check every static table up front. Sends still validate at runtime;
    /// this only surfaces authoring mistakes at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.link.baud_rate == 0 {
            return Err(ConfigError::invalid("link.baud_rate", "must be non-zero"));
        }
        if !(self.timing.fixed_dt_secs > 0.0) || !(self.timing.frame_dt_secs > 0.0) {
            return Err(ConfigError::invalid("timing", "steps must be positive"));
        }
        self.validate_dynamics()?;

        if self.gear.stationary_threshold_kmh < 0.0 {
            return Err(ConfigError::invalid(
                "gear.stationary_threshold_kmh",
                "must not be negative",
            ));
        }

        let p = &self.peripherals;
        validate_channel("headlight", &p.headlight.channel)?;
        for (name, hex) in [("off", &p.headlight.off), ("low", &p.headlight.low), ("high", &p.headlight.high)] {
            validate_payload(&format!("headlight.{}", name), hex)?;
        }

        validate_channel("turn_signal", &p.turn_signal.channel)?;
        for (name, hex) in [
            ("off", &p.turn_signal.off),
            ("left", &p.turn_signal.left),
            ("right", &p.turn_signal.right),
            ("hazard", &p.turn_signal.hazard),
        ] {
            validate_payload(&format!("turn_signal.{}", name), hex)?;
        }

        for (name, signal) in [
            ("brake_light", &p.brake_light),
            ("reverse_light", &p.reverse_light),
            ("brake_pedal", &p.brake_pedal),
        ] {
            validate_channel(name, &signal.channel)?;
            // an empty payload disables that edge
            for (state, hex) in [("off", &signal.off), ("on", &signal.on)] {
                if !hex.trim().is_empty() {
                    validate_payload(&format!("{}.{}", name, state), hex)?;
                }
            }
        }

        validate_channel("gear_report", &p.gear_report.channel)?;
        for gear in Gear::ALL {
            validate_payload(
                &format!("gear_report.{}", gear),
                p.gear_report.payload(gear),
            )?;
        }

        validate_channel("wiper", &p.wiper.channel)?;
        for (name, hex) in [
            ("off", &p.wiper.off),
            ("low_single", &p.wiper.low_single),
            ("high_single", &p.wiper.high_single),
            ("low_auto", &p.wiper.low_auto),
            ("mid_auto", &p.wiper.mid_auto),
            ("high_auto", &p.wiper.high_auto),
        ] {
            validate_payload(&format!("wiper.{}", name), hex)?;
        }

        validate_channel("steering", &p.steering.channel)?;
        if p.steering.min_angle >= p.steering.max_angle {
            return Err(ConfigError::invalid(
                "steering",
                "min_angle must be below max_angle",
            ));
        }

        validate_channel("door", &p.door.channel)?;
        for (i, row) in p.door.state_table.iter().enumerate() {
            validate_payload(&format!("door.state_table[{}]", i), &row.data_hex)?;
        }

        validate_channel("accelerator", &p.accelerator.channel)?;

        Ok(())
    }

    fn validate_dynamics(&self) -> Result<(), ConfigError> {
        let d = &self.dynamics;
        if d.max_speed_kmh <= 0.0 {
            return Err(ConfigError::invalid("dynamics.max_speed_kmh", "must be positive"));
        }
        if !(0.0..1.0).contains(&d.throttle_deadzone) {
            return Err(ConfigError::invalid(
                "dynamics.throttle_deadzone",
                "must be in [0, 1)",
            ));
        }
        if !(0.0..=1.0).contains(&d.abs_min_brake_scale) {
            return Err(ConfigError::invalid(
                "dynamics.abs_min_brake_scale",
                "must be in [0, 1]",
            ));
        }
        // (1 - r)^0 never reaches zero at the ceiling; negative blows up
        if !(d.reverse_torque_falloff > 0.0) {
            return Err(ConfigError::invalid(
                "dynamics.reverse_torque_falloff",
                "must be positive",
            ));
        }
        if d.external_ramp_max < d.external_ramp_min {
            return Err(ConfigError::invalid(
                "dynamics.external_ramp_max",
                "must not be below external_ramp_min",
            ));
        }
        Ok(())
    }
}

fn validate_channel(name: &str, channel: &ChannelConfig) -> Result<(), ConfigError> {
    normalize_id(&channel.can_id, channel.id_type)
        .map_err(|e| ConfigError::invalid(format!("{}.can_id", name), e.to_string()))?;

    if channel.frame_type == CanFrameType::Remote && channel.remote_dlc as usize > MAX_DATA_BYTES {
        return Err(ConfigError::invalid(
            format!("{}.remote_dlc", name),
            format!("{} exceeds {}", channel.remote_dlc, MAX_DATA_BYTES),
        ));
    }

    // a gated channel with no menu can never send
    if channel.require_gate && channel.required_menu.trim().is_empty() {
        return Err(ConfigError::invalid(
            format!("{}.required_menu", name),
            "empty while require_gate is set",
        ));
    }
    Ok(())
}

fn validate_payload(field: &str, data_hex: &str) -> Result<(), ConfigError> {
    parse_data_bytes(data_hex)
        .map(|_| ())
        .map_err(|e| ConfigError::invalid(field, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        SimConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "link": { "baud_rate": 57600 }, "peripherals": { "headlight": { "low": "03 61 42 02 00 00 00 00" } } }"#;
        let config: SimConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.link.baud_rate, 57600);
        assert_eq!(config.link.reconnect_interval_ms, 2000);
        assert_eq!(config.peripherals.headlight.low, "03 61 42 02 00 00 00 00");
        assert_eq!(config.peripherals.headlight.off, "03 61 42 00 00 00 00 00");
        assert_eq!(config.peripherals.reverse_light.channel.required_menu, "Reverselight");
        assert_eq!(config.dynamics.max_motor_torque, 700.0);
    }

    #[test]
    fn test_bad_payload_is_reported() {
        let mut config = SimConfig::default();
        config.peripherals.wiper.mid_auto = "06 61 A2 ZZ".to_string();
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "wiper.mid_auto"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_gated_channel_needs_menu() {
        let mut config = SimConfig::default();
        config.peripherals.door.channel.required_menu = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field, .. }) if field == "door.required_menu"
        ));
    }

    #[test]
    fn test_out_of_range_id_is_reported() {
        let mut config = SimConfig::default();
        config.peripherals.steering.channel.can_id = "800".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field, .. }) if field == "steering.can_id"
        ));
    }
}
