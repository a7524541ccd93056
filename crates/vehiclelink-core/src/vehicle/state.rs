//! Observed motion and the external speed command

use nalgebra::Vector3;

use super::dynamics::move_towards;
use crate::unit_conversion::ms_to_kmh;

/// Forward-axis speed below which the car counts as reversing. Slightly
/// negative so the reverse light does not flicker around zero.
pub const REVERSING_THRESHOLD_KMH: f32 = -0.5;

/// Motion as reported by the chassis
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VehicleState {
    velocity: Vector3<f32>,
    forward_speed_kmh: f32,
    speed_kmh: f32,
    is_reversing: bool,
}

impl VehicleState {
    /// Derive speeds from the world velocity and the car's forward axis
    pub fn from_velocity(velocity: Vector3<f32>, forward: Vector3<f32>) -> Self {
        let forward_speed_kmh = ms_to_kmh(velocity.dot(&forward));
        Self {
            velocity,
            forward_speed_kmh,
            speed_kmh: ms_to_kmh(velocity.norm()),
            is_reversing: forward_speed_kmh < REVERSING_THRESHOLD_KMH,
        }
    }

    /// World velocity, m/s
    pub fn velocity(&self) -> Vector3<f32> {
        self.velocity
    }

    /// Speed magnitude, m/s
    pub fn speed_ms(&self) -> f32 {
        self.velocity.norm()
    }

    /// Speed magnitude, km/h
    pub fn speed_kmh(&self) -> f32 {
        self.speed_kmh
    }

    /// Signed speed along the forward axis: positive forward, negative reverse
    pub fn forward_speed_kmh(&self) -> f32 {
        self.forward_speed_kmh
    }

    /// Forward speed is below the reversing threshold
    pub fn is_reversing(&self) -> bool {
        self.is_reversing
    }
}

/// Target speed commanded from outside (the accelerator panel)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExternalSpeedCommand {
    enabled: bool,
    target_kmh: f32,
    current_target_kmh: f32,
    ramp_kmh_per_sec: f32,
}

impl Default for ExternalSpeedCommand {
    fn default() -> Self {
        Self {
            enabled: false,
            target_kmh: 0.0,
            current_target_kmh: 0.0,
            ramp_kmh_per_sec: 25.0,
        }
    }
}

impl ExternalSpeedCommand {
    /// Start a command. The ramp starts from the current forward speed
    /// (never negative).
    pub fn start(&mut self, target_kmh: f32, ramp_kmh_per_sec: f32, forward_speed_kmh: f32) {
        self.enabled = true;
        self.target_kmh = target_kmh.max(0.0);
        self.ramp_kmh_per_sec = ramp_kmh_per_sec.max(0.1);
        self.current_target_kmh = forward_speed_kmh.max(0.0);
    }

    /// Stop holding; the last ramped target is kept
    pub fn clear(&mut self) {
        self.enabled = false;
        self.target_kmh = 0.0;
    }

    /// A command is active
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Commanded speed, km/h
    pub fn target_kmh(&self) -> f32 {
        self.target_kmh
    }

    /// Ramped target currently being held
    pub fn current_target_kmh(&self) -> f32 {
        self.current_target_kmh
    }

    /// Ramp used when the adaptive ramp is off
    pub fn ramp_kmh_per_sec(&self) -> f32 {
        self.ramp_kmh_per_sec
    }

    /// Step the ramped target toward the commanded speed (capped at
    /// `max_speed_kmh`) by at most `ramp * dt`. Never overshoots.
    pub fn advance(&mut self, max_speed_kmh: f32, ramp_kmh_per_sec: f32, dt: f32) -> f32 {
        let desired = self.target_kmh.clamp(0.0, max_speed_kmh.max(0.0));
        self.current_target_kmh =
            move_towards(self.current_target_kmh, desired, ramp_kmh_per_sec * dt);
        self.current_target_kmh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversing_threshold() {
        let forward = Vector3::new(0.0, 0.0, 1.0);
        // -0.1 m/s = -0.36 km/h: still above the threshold
        let creeping = VehicleState::from_velocity(Vector3::new(0.0, 0.0, -0.1), forward);
        assert!(!creeping.is_reversing());

        let backing = VehicleState::from_velocity(Vector3::new(0.0, 0.0, -1.0), forward);
        assert!(backing.is_reversing());
        assert!((backing.forward_speed_kmh() + 3.6).abs() < 1e-4);
        assert!((backing.speed_kmh() - 3.6).abs() < 1e-4);
    }

    #[test]
    fn test_lateral_motion_is_not_forward_speed() {
        let state =
            VehicleState::from_velocity(Vector3::new(2.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(state.forward_speed_kmh(), 0.0);
        assert!((state.speed_kmh() - 7.2).abs() < 1e-4);
    }

    #[test]
    fn test_command_ramp_never_overshoots() {
        let mut cmd = ExternalSpeedCommand::default();
        cmd.start(30.0, 25.0, -5.0);
        assert_eq!(cmd.current_target_kmh(), 0.0);

        let mut last = 0.0;
        for _ in 0..200 {
            let now = cmd.advance(140.0, 25.0, 0.02);
            assert!(now >= last);
            assert!(now <= 30.0);
            last = now;
        }
        assert_eq!(last, 30.0);
    }

    #[test]
    fn test_command_capped_by_max_speed() {
        let mut cmd = ExternalSpeedCommand::default();
        cmd.start(255.0, 1000.0, 0.0);
        assert_eq!(cmd.advance(140.0, 1000.0, 1.0), 140.0);
    }
}
