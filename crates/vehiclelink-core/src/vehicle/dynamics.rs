//! Vehicle dynamics controller
//!
//! Runs once per fixed physics step. It picks a throttle from one of three
//! sources and turns it into wheel torques and body forces:
//!
//! 1. Brake held: no throttle. Cancels the external speed command when
//!    `cancel_external_on_brake` is set.
//! 2. External speed command: a hold-speed controller follows a ramped
//!    target.
//! 3. Otherwise keyboard throttle, or, in gear mode, the gear policy
//!    (auto hold / creep in D, B and R, nothing in P and N).
//!
//! After the throttle is known the step applies, in order: steering limit,
//! motor torque (with the reverse falloff), brake and park lock, coast drag,
//! park damping, the forward speed limiter, ABS and anti-roll.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::chassis::{Axle, AxleRole, Chassis, Damping, Side, WheelCommand, WheelPosition};
use super::gear::{Gear, GearMode};
use super::state::{ExternalSpeedCommand, VehicleState};

/// Below this speed (m/s) drag and limiter forces are not applied
const MIN_FORCE_SPEED_MS: f32 = 0.05;

/// Fixed reverse throttle in R when auto hold is off
const FIXED_REVERSE_THROTTLE: f32 = -0.35;

/// Clamp to [0, 1]
pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Linear blend from `a` to `b`, `t` clamped to [0, 1]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * clamp01(t)
}

/// Position of `v` between `a` and `b`, clamped to [0, 1]
pub fn inverse_lerp(a: f32, b: f32, v: f32) -> f32 {
    if (b - a).abs() < f32::EPSILON {
        return 0.0;
    }
    clamp01((v - a) / (b - a))
}

/// Step `current` toward `target` by at most `max_delta`
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + delta.signum() * max_delta
    }
}

/// Reverse torque multiplier `(1 - ratio)^falloff`, where `ratio` is the
/// reverse speed as a fraction of the ceiling. Exactly 0 at the ceiling.
pub fn reverse_torque_scale(reverse_kmh: f32, reverse_max_kmh: f32, falloff: f32) -> f32 {
    let ratio = if reverse_max_kmh <= 0.1 {
        1.0
    } else {
        clamp01(reverse_kmh.max(0.0) / reverse_max_kmh)
    };
    (1.0 - ratio).powf(falloff)
}

/// Forward hold-speed throttle in [0, 1]. Zero once within `epsilon` of the
/// target (or above it); otherwise at least `min_throttle` so the request
/// does not vanish in the throttle deadzone.
pub fn hold_forward_throttle(
    target_kmh: f32,
    forward_kmh: f32,
    gain: f32,
    epsilon: f32,
    min_throttle: f32,
) -> f32 {
    let current = forward_kmh.max(0.0);
    let error = target_kmh - current;
    if error <= epsilon {
        return 0.0;
    }

    let ratio = if target_kmh <= 0.1 {
        1.0
    } else {
        clamp01(error / target_kmh)
    };
    let t = clamp01(ratio * gain);
    if t > 0.0 {
        t.max(min_throttle)
    } else {
        t
    }
}

/// Reverse hold-speed throttle in [-1, 0]
pub fn hold_reverse_throttle(target_kmh: f32, forward_kmh: f32, gain: f32, epsilon: f32) -> f32 {
    let current = (-forward_kmh).max(0.0);
    let error = target_kmh - current;
    if error <= epsilon {
        return 0.0;
    }
    let ratio = if target_kmh <= 0.1 {
        1.0
    } else {
        clamp01(error / target_kmh)
    };
    -clamp01(ratio * gain)
}

/// Ramp rate that grows with the commanded target: `min` at 0 km/h,
/// `at_255` at 255 km/h, clamped to [min, max]
pub fn adaptive_ramp(target_kmh: f32, min: f32, at_255: f32, max: f32) -> f32 {
    let t = inverse_lerp(0.0, 255.0, target_kmh);
    lerp(min, at_255, t).clamp(min, max.max(min))
}

/// Steer angle limit that fades toward `max_steer * high_speed_factor`
pub fn steer_limit(max_steer: f32, high_speed_factor: f32, fade_speed_kmh: f32, speed_kmh: f32) -> f32 {
    let t = clamp01(speed_kmh / fade_speed_kmh.max(1.0));
    lerp(max_steer, max_steer * high_speed_factor, t)
}

/// ABS brake multiplier for one wheel. Full brake up to the slip
/// threshold, then down to `min_scale` at full slip.
pub fn abs_brake_scale(slip: f32, threshold: f32, min_scale: f32) -> f32 {
    let slip = slip.abs();
    if slip <= threshold {
        return 1.0;
    }
    let over = clamp01((slip - threshold) / (1.0 - threshold).max(0.0001));
    lerp(1.0, min_scale, over)
}

/// Coast deceleration, m/s^2
pub fn coast_drag_accel(
    coast: f32,
    steer_extra: f32,
    aero: f32,
    steer: f32,
    speed_ms: f32,
) -> f32 {
    coast + steer.abs() * steer_extra + aero * speed_ms * speed_ms
}

/// Anti-roll force from the left/right travel difference
pub fn anti_roll_force(travel_left: f32, travel_right: f32, stiffness: f32) -> f32 {
    (travel_left - travel_right) * stiffness
}

/// Steering wheel angle mapped to [-1, 1]
pub fn steering_wheel_to_steer(angle_deg: f32, max_wheel_deg: f32) -> f32 {
    (angle_deg / max_wheel_deg.max(1.0)).clamp(-1.0, 1.0)
}

/// Tuning of [`VehicleDynamicsController`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsConfig {
    /// Front axle role; `None` leaves the axle alone
    pub front_axle: Option<AxleRole>,
    /// Rear axle role; `None` leaves the axle alone
    pub rear_axle: Option<AxleRole>,

    /// Drive torque at full throttle, Nm
    pub max_motor_torque: f32,
    /// Steer angle at full lock, degrees
    pub max_steer_angle: f32,
    /// Service brake torque, Nm
    pub max_brake_torque: f32,
    /// Throttle magnitudes below this count as zero
    pub throttle_deadzone: f32,

    /// Base coast deceleration, m/s^2
    pub coast_drag: f32,
    /// Extra coast deceleration at full steer, m/s^2
    pub steer_coast_extra_drag: f32,
    /// Coast deceleration per (m/s)^2
    pub aero_drag: f32,

    /// Forward limiter speed
    pub max_speed_kmh: f32,
    /// Deceleration above the limiter speed, m/s^2
    pub speed_limiter_strength: f32,

    /// Reverse speed where torque reaches zero
    pub reverse_max_speed_kmh: f32,
    /// Reverse torque as a fraction of forward torque
    pub reverse_max_torque_scale: f32,
    /// Exponent of the reverse torque fade, positive
    pub reverse_torque_falloff: f32,

    /// Fraction of full lock left at the fade speed
    pub steer_at_high_speed_factor: f32,
    /// Speed at which steering is fully faded
    pub steer_fade_speed_kmh: f32,

    /// Anti-roll stiffness, N per unit travel difference
    pub anti_roll: f32,

    /// Modulate brakes on slipping wheels
    pub enable_abs: bool,
    /// Slip above which ABS backs off
    pub abs_slip_threshold: f32,
    /// Brake multiplier at full slip
    pub abs_min_brake_scale: f32,

    /// Idle D/B/R hold a speed instead of creeping
    pub enable_auto_hold_speed: bool,
    /// Idle hold speed in D
    pub auto_speed_d_kmh: f32,
    /// Idle hold speed in B
    pub auto_speed_b_kmh: f32,
    /// Idle hold speed in R
    pub auto_speed_r_kmh: f32,
    /// Reverse hold throttle per unit of relative speed error
    pub auto_hold_gain: f32,
    /// Reverse hold dead band
    pub auto_hold_epsilon_kmh: f32,

    /// Throttle scale when accelerating manually in B
    pub b_throttle_scale: f32,

    /// Brake torque on every wheel in P, Nm
    pub park_brake_torque: f32,
    /// Raise body damping while in P
    pub add_extra_damping_in_park: bool,
    /// Linear damping added in P
    pub park_extra_linear_damping: f32,
    /// Angular damping added in P
    pub park_extra_angular_damping: f32,

    /// Forward hold throttle per unit of relative speed error
    pub hold_gain: f32,
    /// Forward hold dead band
    pub hold_epsilon_kmh: f32,
    /// Smallest non-zero forward hold throttle
    pub hold_min_throttle: f32,

    /// Derive the external ramp from the target speed
    pub use_adaptive_external_ramp: bool,
    /// Adaptive ramp at 0 km/h, km/h per second
    pub external_ramp_min: f32,
    /// Adaptive ramp ceiling, km/h per second
    pub external_ramp_max: f32,
    /// Adaptive ramp at 255 km/h, km/h per second
    pub external_ramp_at_255: f32,
    /// Braking drops the external target speed
    pub cancel_external_on_brake: bool,

    /// Steer from the steering wheel angle instead of the keys
    pub use_steering_wheel: bool,
    /// Wheel angle mapped to full lock
    pub steering_wheel_max_deg: f32,
    /// Wheel-derived steer changes smaller than this are ignored
    pub steer_epsilon: f32,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            front_axle: Some(AxleRole {
                steering: true,
                motor: false,
            }),
            rear_axle: Some(AxleRole {
                steering: false,
                motor: true,
            }),
            max_motor_torque: 700.0,
            max_steer_angle: 30.0,
            max_brake_torque: 3000.0,
            throttle_deadzone: 0.08,
            coast_drag: 0.8,
            steer_coast_extra_drag: 0.6,
            aero_drag: 0.02,
            max_speed_kmh: 140.0,
            speed_limiter_strength: 6.0,
            reverse_max_speed_kmh: 18.0,
            reverse_max_torque_scale: 0.45,
            reverse_torque_falloff: 6.0,
            steer_at_high_speed_factor: 0.35,
            steer_fade_speed_kmh: 60.0,
            anti_roll: 6000.0,
            enable_abs: true,
            abs_slip_threshold: 0.45,
            abs_min_brake_scale: 0.25,
            enable_auto_hold_speed: true,
            auto_speed_d_kmh: 12.0,
            auto_speed_b_kmh: 7.0,
            auto_speed_r_kmh: 8.0,
            auto_hold_gain: 1.2,
            auto_hold_epsilon_kmh: 0.3,
            b_throttle_scale: 0.75,
            park_brake_torque: 15000.0,
            add_extra_damping_in_park: true,
            park_extra_linear_damping: 2.0,
            park_extra_angular_damping: 1.0,
            hold_gain: 1.2,
            hold_epsilon_kmh: 0.25,
            hold_min_throttle: 0.12,
            use_adaptive_external_ramp: true,
            external_ramp_min: 25.0,
            external_ramp_max: 180.0,
            external_ramp_at_255: 180.0,
            cancel_external_on_brake: true,
            use_steering_wheel: false,
            steering_wheel_max_deg: 450.0,
            steer_epsilon: 0.0005,
        }
    }
}

impl DynamicsConfig {
    /// Configured role of `axle`
    pub fn axle_role(&self, axle: Axle) -> Option<AxleRole> {
        match axle {
            Axle::Front => self.front_axle,
            Axle::Rear => self.rear_axle,
        }
    }
}

/// Driver intent for one physics step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriverInput {
    /// Accelerate key (W)
    pub forward: bool,
    /// Reverse key (S)
    pub reverse: bool,
    /// Keyboard steer in [-1, 1]
    pub steer: f32,
    /// Brake key
    pub brake: bool,
    /// Steering wheel angle in degrees, when a wheel is attached
    pub steering_wheel_deg: Option<f32>,
}

/// What one physics step decided
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DynamicsOutput {
    /// Throttle before the deadzone
    pub raw_throttle: f32,
    /// Throttle after the deadzone, in [-1, 1]
    pub throttle: f32,
    /// Steer in [-1, 1]
    pub steer: f32,
    /// Front wheel angle, degrees
    pub steer_angle: f32,
    /// Torque written to driven wheels, Nm
    pub motor_torque: f32,
    /// Brake torque written before ABS, Nm
    pub brake_torque: f32,
    /// Park lock was applied
    pub in_park: bool,
    /// Coast deceleration applied, m/s^2
    pub coast_drag: f32,
    /// Speed limiter pushed back this step
    pub limiter_active: bool,
    /// ABS multiplier per wheel, in [`WheelPosition::ALL`] order
    pub abs_scale: [f32; 4],
}

/// Per-step driving logic: throttle, steering, brakes, park, ABS,
/// anti-roll and speed holding
pub struct VehicleDynamicsController {
    config: DynamicsConfig,
    state: VehicleState,
    external: ExternalSpeedCommand,
    gear_mode: GearMode,
    latched_steer: f32,
    base_damping: Option<Damping>,
}

impl VehicleDynamicsController {
    /// Controller at rest with gear mode off
    pub fn new(config: DynamicsConfig) -> Self {
        Self {
            config,
            state: VehicleState::default(),
            external: ExternalSpeedCommand::default(),
            gear_mode: GearMode::default(),
            latched_steer: 0.0,
            base_damping: None,
        }
    }

    /// Tuning in use
    pub fn config(&self) -> &DynamicsConfig {
        &self.config
    }

    /// Velocity read at the start of the last step
    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// Absolute speed, km/h
    pub fn speed_kmh(&self) -> f32 {
        self.state.speed_kmh()
    }

    /// Signed speed along the forward axis, km/h
    pub fn forward_speed_kmh(&self) -> f32 {
        self.state.forward_speed_kmh()
    }

    /// Moving backwards faster than the reversing threshold
    pub fn is_reversing(&self) -> bool {
        self.state.is_reversing()
    }

    /// Selector letter, e.g. 'D'
    pub fn current_gear_char(&self) -> char {
        self.gear_mode.gear.as_char()
    }

    /// Gear constraints applied each step
    pub fn gear_mode(&self) -> GearMode {
        self.gear_mode
    }

    /// Accelerator target speed command
    pub fn external_command(&self) -> &ExternalSpeedCommand {
        &self.external
    }

    /// Set the gear constraints; `torque_scale` is clamped to [0.1, 1]
    pub fn set_gear_mode(&mut self, enabled: bool, gear: Gear, creep_throttle: f32, torque_scale: f32) {
        self.gear_mode = GearMode {
            enabled,
            gear,
            creep_throttle,
            torque_scale: torque_scale.clamp(0.1, 1.0),
        };
    }

    /// Set the gear constraints from a [`GearMode`]
    pub fn apply_gear_mode(&mut self, mode: GearMode) {
        self.set_gear_mode(mode.enabled, mode.gear, mode.creep_throttle, mode.torque_scale);
    }

    /// Hold `target_kmh`, ramping from the current forward speed
    pub fn set_external_target_speed(&mut self, target_kmh: f32, ramp_kmh_per_sec: f32) {
        self.external
            .start(target_kmh, ramp_kmh_per_sec, self.state.forward_speed_kmh());
        debug!(
            "External target speed {} km/h (ramp {} km/h/s)",
            self.external.target_kmh(),
            self.external.ramp_kmh_per_sec()
        );
    }

    /// Drop the accelerator target speed
    pub fn clear_external_target_speed(&mut self) {
        if self.external.is_enabled() {
            debug!("External target speed cleared");
        }
        self.external.clear();
    }

    /// Re-read velocity from the chassis
    pub fn refresh_state(&mut self, chassis: &dyn Chassis) {
        self.state = VehicleState::from_velocity(chassis.velocity(), chassis.forward());
    }

    /// One fixed physics step
    pub fn fixed_update(
        &mut self,
        input: &DriverInput,
        chassis: &mut dyn Chassis,
        dt: f32,
    ) -> DynamicsOutput {
        self.refresh_state(chassis);
        let base_damping = *self.base_damping.get_or_insert_with(|| chassis.damping());

        let raw_throttle = self.select_throttle(input, dt);
        let steer = self.select_steer(input);

        let throttle = if raw_throttle.abs() < self.config.throttle_deadzone {
            0.0
        } else {
            raw_throttle
        };

        let speed_ms = self.state.speed_ms();
        let speed_kmh = self.state.speed_kmh();

        let steer_angle = steer
            * steer_limit(
                self.config.max_steer_angle,
                self.config.steer_at_high_speed_factor,
                self.config.steer_fade_speed_kmh,
                speed_kmh,
            );

        let torque_scale = if self.gear_mode.enabled {
            self.gear_mode.torque_scale
        } else {
            1.0
        };
        let motor_torque = self.motor_torque(throttle) * torque_scale;

        let base_brake = if input.brake {
            self.config.max_brake_torque
        } else {
            0.0
        };
        let in_park = self.gear_mode.enabled && self.gear_mode.gear == Gear::P;
        let brake_torque = if in_park {
            base_brake.max(self.config.park_brake_torque)
        } else {
            base_brake
        };

        for wheel in WheelPosition::ALL {
            let Some(role) = self.config.axle_role(wheel.axle) else {
                continue;
            };
            chassis.apply_wheel(
                wheel,
                WheelCommand {
                    motor_torque: if role.motor { motor_torque } else { 0.0 },
                    brake_torque,
                    steer_angle: role.steering.then_some(steer_angle),
                },
            );
        }

        let velocity_dir = direction(self.state.velocity());

        let mut coast_drag = 0.0;
        if !input.brake && throttle == 0.0 && speed_ms > MIN_FORCE_SPEED_MS {
            coast_drag = coast_drag_accel(
                self.config.coast_drag,
                self.config.steer_coast_extra_drag,
                self.config.aero_drag,
                steer,
                speed_ms,
            );
            chassis.add_acceleration(-velocity_dir * coast_drag);
        }

        if self.config.add_extra_damping_in_park && in_park {
            chassis.set_damping(Damping {
                linear: base_damping.linear + self.config.park_extra_linear_damping,
                angular: base_damping.angular + self.config.park_extra_angular_damping,
            });
        } else {
            chassis.set_damping(base_damping);
        }

        let limiter_active = speed_kmh > self.config.max_speed_kmh && speed_ms > MIN_FORCE_SPEED_MS;
        if limiter_active {
            chassis.add_acceleration(-velocity_dir * self.config.speed_limiter_strength);
        }

        let mut abs_scale = [1.0; 4];
        if self.config.enable_abs && input.brake {
            let requested = if in_park {
                brake_torque
            } else {
                self.config.max_brake_torque
            };
            for wheel in WheelPosition::ALL {
                if self.config.axle_role(wheel.axle).is_none() {
                    continue;
                }
                let Some(contact) = chassis.ground_contact(wheel) else {
                    continue;
                };
                let scale = abs_brake_scale(
                    contact.forward_slip,
                    self.config.abs_slip_threshold,
                    self.config.abs_min_brake_scale,
                );
                abs_scale[wheel.slot()] = scale;
                chassis.set_brake_torque(wheel, requested * scale);
            }
        }

        for axle in [Axle::Front, Axle::Rear] {
            if self.config.axle_role(axle).is_some() {
                self.apply_anti_roll(chassis, axle);
            }
        }

        DynamicsOutput {
            raw_throttle,
            throttle,
            steer,
            steer_angle,
            motor_torque,
            brake_torque,
            in_park,
            coast_drag,
            limiter_active,
            abs_scale,
        }
    }

    fn select_throttle(&mut self, input: &DriverInput, dt: f32) -> f32 {
        if input.brake {
            if self.config.cancel_external_on_brake {
                self.clear_external_target_speed();
            }
            return 0.0;
        }

        if !self.gear_mode.enabled {
            if self.external.is_enabled() {
                return self.follow_external(dt);
            }
            let mut throttle = 0.0;
            if input.forward {
                throttle += 1.0;
            }
            if input.reverse {
                throttle -= 1.0;
            }
            return throttle;
        }

        let forward_kmh = self.state.forward_speed_kmh();
        match self.gear_mode.gear {
            Gear::P | Gear::N => 0.0,
            Gear::R => {
                if self.config.enable_auto_hold_speed {
                    hold_reverse_throttle(
                        self.config.auto_speed_r_kmh,
                        forward_kmh,
                        self.config.auto_hold_gain,
                        self.config.auto_hold_epsilon_kmh,
                    )
                } else {
                    FIXED_REVERSE_THROTTLE
                }
            }
            Gear::D | Gear::B => {
                let is_b = self.gear_mode.gear == Gear::B;
                if self.external.is_enabled() {
                    self.follow_external(dt)
                } else if input.forward {
                    if is_b {
                        self.config.b_throttle_scale
                    } else {
                        1.0
                    }
                } else if self.config.enable_auto_hold_speed {
                    let target = if is_b {
                        self.config.auto_speed_b_kmh
                    } else {
                        self.config.auto_speed_d_kmh
                    };
                    self.hold_forward(target)
                } else {
                    self.gear_mode.creep_throttle
                }
            }
        }
    }

    fn follow_external(&mut self, dt: f32) -> f32 {
        let ramp = if self.config.use_adaptive_external_ramp {
            adaptive_ramp(
                self.external.target_kmh(),
                self.config.external_ramp_min,
                self.config.external_ramp_at_255,
                self.config.external_ramp_max,
            )
        } else {
            self.external.ramp_kmh_per_sec()
        };
        let target = self.external.advance(self.config.max_speed_kmh, ramp, dt);
        self.hold_forward(target)
    }

    fn hold_forward(&self, target_kmh: f32) -> f32 {
        hold_forward_throttle(
            target_kmh,
            self.state.forward_speed_kmh(),
            self.config.hold_gain,
            self.config.hold_epsilon_kmh,
            self.config.hold_min_throttle,
        )
    }

    fn select_steer(&mut self, input: &DriverInput) -> f32 {
        match (self.config.use_steering_wheel, input.steering_wheel_deg) {
            (true, Some(angle)) => {
                let steer = steering_wheel_to_steer(angle, self.config.steering_wheel_max_deg);
                if (steer - self.latched_steer).abs() > self.config.steer_epsilon {
                    self.latched_steer = steer;
                }
                self.latched_steer
            }
            _ => {
                self.latched_steer = 0.0;
                input.steer.clamp(-1.0, 1.0)
            }
        }
    }

    fn motor_torque(&self, throttle: f32) -> f32 {
        if throttle == 0.0 {
            return 0.0;
        }
        if throttle > 0.0 {
            return throttle * self.config.max_motor_torque;
        }

        let reverse_kmh = (-self.state.forward_speed_kmh()).max(0.0);
        throttle
            * self.config.max_motor_torque
            * self.config.reverse_max_torque_scale
            * reverse_torque_scale(
                reverse_kmh,
                self.config.reverse_max_speed_kmh,
                self.config.reverse_torque_falloff,
            )
    }

    fn apply_anti_roll(&self, chassis: &mut dyn Chassis, axle: Axle) {
        let left = WheelPosition::new(axle, Side::Left);
        let right = WheelPosition::new(axle, Side::Right);
        let contact_left = chassis.ground_contact(left);
        let contact_right = chassis.ground_contact(right);

        let travel_left = contact_left.map_or(1.0, |c| c.suspension_travel);
        let travel_right = contact_right.map_or(1.0, |c| c.suspension_travel);
        let force = anti_roll_force(travel_left, travel_right, self.config.anti_roll);

        if contact_left.is_some() {
            let up = chassis.wheel_up(left);
            chassis.add_force_at_wheel(left, up * -force);
        }
        if contact_right.is_some() {
            let up = chassis.wheel_up(right);
            chassis.add_force_at_wheel(right, up * force);
        }
    }
}

fn direction(v: Vector3<f32>) -> Vector3<f32> {
    v.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_torque_falloff() {
        assert_eq!(reverse_torque_scale(0.0, 18.0, 6.0), 1.0);
        assert_eq!(reverse_torque_scale(18.0, 18.0, 6.0), 0.0);
        assert_eq!(reverse_torque_scale(30.0, 18.0, 6.0), 0.0);

        let mut last = f32::MAX;
        for kmh in [0.0, 3.0, 6.0, 9.0, 12.0, 15.0, 17.9] {
            let scale = reverse_torque_scale(kmh, 18.0, 6.0);
            assert!(scale < last);
            last = scale;
        }
    }

    #[test]
    fn test_degenerate_reverse_ceiling_blocks_torque() {
        assert_eq!(reverse_torque_scale(0.0, 0.0, 6.0), 0.0);
    }

    #[test]
    fn test_hold_forward_band() {
        assert_eq!(hold_forward_throttle(12.0, 11.9, 1.2, 0.25, 0.12), 0.0);
        assert_eq!(hold_forward_throttle(12.0, 20.0, 1.2, 0.25, 0.12), 0.0);

        let near = hold_forward_throttle(12.0, 11.0, 1.2, 0.25, 0.12);
        assert!((near - 0.12).abs() < 1e-6);

        let far = hold_forward_throttle(12.0, 0.0, 1.2, 0.25, 0.12);
        assert_eq!(far, 1.0);
    }

    #[test]
    fn test_hold_reverse_is_negative() {
        let t = hold_reverse_throttle(8.0, 0.0, 1.2, 0.3);
        assert_eq!(t, -1.0);
        assert_eq!(hold_reverse_throttle(8.0, -7.8, 1.2, 0.3), 0.0);
        let half = hold_reverse_throttle(8.0, -4.0, 1.2, 0.3);
        assert!((half + 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_adaptive_ramp() {
        assert_eq!(adaptive_ramp(0.0, 25.0, 180.0, 180.0), 25.0);
        assert_eq!(adaptive_ramp(255.0, 25.0, 180.0, 180.0), 180.0);
        assert_eq!(adaptive_ramp(500.0, 25.0, 180.0, 180.0), 180.0);
        let mid = adaptive_ramp(127.5, 25.0, 180.0, 180.0);
        assert!((mid - 102.5).abs() < 1e-3);
        // ceiling below the at-255 rate caps the result
        assert_eq!(adaptive_ramp(255.0, 25.0, 180.0, 100.0), 100.0);
    }

    #[test]
    fn test_steer_limit_fades_with_speed() {
        assert_eq!(steer_limit(30.0, 0.35, 60.0, 0.0), 30.0);
        assert!((steer_limit(30.0, 0.35, 60.0, 60.0) - 10.5).abs() < 1e-5);
        assert!((steer_limit(30.0, 0.35, 60.0, 120.0) - 10.5).abs() < 1e-5);
    }

    #[test]
    fn test_abs_scale() {
        assert_eq!(abs_brake_scale(0.2, 0.45, 0.25), 1.0);
        assert_eq!(abs_brake_scale(1.0, 0.45, 0.25), 0.25);
        assert_eq!(abs_brake_scale(-1.5, 0.45, 0.25), 0.25);
        let mid = abs_brake_scale(0.725, 0.45, 0.25);
        assert!((mid - 0.625).abs() < 1e-5);
    }

    #[test]
    fn test_steering_wheel_mapping() {
        assert_eq!(steering_wheel_to_steer(225.0, 450.0), 0.5);
        assert_eq!(steering_wheel_to_steer(-510.0, 450.0), -1.0);
    }

    #[test]
    fn test_move_towards() {
        assert_eq!(move_towards(0.0, 10.0, 3.0), 3.0);
        assert_eq!(move_towards(9.0, 10.0, 3.0), 10.0);
        assert_eq!(move_towards(10.0, 0.0, 4.0), 6.0);
    }

    #[test]
    fn test_coast_drag_terms() {
        let accel = coast_drag_accel(0.8, 0.6, 0.02, -0.5, 10.0);
        assert!((accel - (0.8 + 0.3 + 2.0)).abs() < 1e-5);
    }
}
