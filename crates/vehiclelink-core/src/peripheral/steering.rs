//! Steering wheel angle broadcaster
//!
//! The wheel turns with the keyboard or travels toward an angle typed by the
//! operator. Only a typed angle is transmitted:
//!
//! ```text
//! raw = angle * 10 + 32768
//! 06 61 06 80 80 {raw >> 8} {raw & 0xFF} 00
//! ```
//!
//! The current angle doubles as the steering-wheel input of the dynamics
//! controller.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AngleInputError, ChannelConfig, PeripheralChannel, SteeringCommandError, TransmitError};
use crate::vehicle::dynamics::move_towards;

/// Steering wheel range and travel rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    /// Frame and gate settings
    pub channel: ChannelConfig,
    /// Full left lock, degrees
    pub min_angle: f32,
    /// Full right lock, degrees
    pub max_angle: f32,
    /// Wheel rate while a key is held, deg/s
    pub keyboard_deg_per_sec: f32,
    /// Wheel rate toward a typed angle, deg/s
    pub move_to_target_deg_per_sec: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::for_menu("Steering"),
            min_angle: -510.0,
            max_angle: 510.0,
            keyboard_deg_per_sec: 260.0,
            move_to_target_deg_per_sec: 420.0,
        }
    }
}

/// Payload for a whole-degree wheel angle
pub fn steering_payload(angle_deg: i32) -> String {
    let raw = angle_deg * 10 + 32768;
    let hi = (raw >> 8) & 0xFF;
    let lo = raw & 0xFF;
    format!("06 61 06 80 80 {:02X} {:02X} 00", hi, lo)
}

/// Steering wheel angle from keys or typed targets
pub struct SteeringWheelController {
    current_angle: f32,
    target_angle: Option<f32>,
    input_enabled: bool,
    config: SteeringConfig,
    channel: PeripheralChannel,
}

impl SteeringWheelController {
    /// Centered wheel with input enabled
    pub fn new(config: SteeringConfig, channel: PeripheralChannel) -> Self {
        Self {
            current_angle: 0.0,
            target_angle: None,
            input_enabled: true,
            config,
            channel,
        }
    }

    /// Wheel angle in degrees
    pub fn current_angle(&self) -> f32 {
        self.current_angle
    }

    /// A typed target has not been reached yet
    pub fn is_moving_to_target(&self) -> bool {
        self.target_angle.is_some()
    }

    /// Disabling input also abandons any pending travel
    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
        if !enabled {
            self.target_angle = None;
        }
    }

    /// Per-frame update. `turn` is -1 (left), 0 or +1 (right).
    pub fn tick(&mut self, turn: f32, dt: f32) {
        if !self.input_enabled {
            return;
        }

        if turn.abs() > 0.001 {
            self.target_angle = None;
            self.current_angle = (self.current_angle
                + turn.clamp(-1.0, 1.0) * self.config.keyboard_deg_per_sec * dt)
                .clamp(self.config.min_angle, self.config.max_angle);
        }

        if let Some(target) = self.target_angle {
            self.current_angle = move_towards(
                self.current_angle,
                target,
                self.config.move_to_target_deg_per_sec * dt,
            );
            if (self.current_angle - target).abs() < 0.01 {
                self.current_angle = target;
                self.target_angle = None;
            }
        }
    }

    /// Operator typed an angle and pressed send
    pub fn command_angle_text(&mut self, text: &str) -> Result<String, SteeringCommandError> {
        let trimmed = text.trim();
        let angle: f32 = trimmed
            .parse()
            .map_err(|_| AngleInputError::NotANumber(trimmed.to_string()))?;
        self.command_angle(angle)
    }

    /// Start travelling to `angle` (rounded to whole degrees) and transmit
    /// it. The range is checked after rounding. The wheel keeps moving
    /// toward the target even when the frame is blocked.
    pub fn command_angle(&mut self, angle: f32) -> Result<String, SteeringCommandError> {
        if !self.input_enabled {
            debug!(peripheral = self.channel.tag(), "Input disabled, angle ignored");
            return Err(SteeringCommandError::InputDisabled);
        }
        let rounded = angle.round();
        if !rounded.is_finite() || rounded < self.config.min_angle || rounded > self.config.max_angle
        {
            return Err(AngleInputError::OutOfRange {
                angle,
                min: self.config.min_angle,
                max: self.config.max_angle,
            }
            .into());
        }

        self.target_angle = Some(rounded);
        Ok(self.send_angle(rounded as i32)?)
    }

    fn send_angle(&self, angle_deg: i32) -> Result<String, TransmitError> {
        self.channel.transmit(&steering_payload(angle_deg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_zero() {
        assert_eq!(steering_payload(0), "06 61 06 80 80 80 00 00");
    }

    #[test]
    fn test_payload_extremes() {
        // 510*10 + 32768 = 37868 = 0x93EC
        assert_eq!(steering_payload(510), "06 61 06 80 80 93 EC 00");
        // -5100 + 32768 = 27668 = 0x6C14
        assert_eq!(steering_payload(-510), "06 61 06 80 80 6C 14 00");
    }
}
