//! Demo Mode - Kinematic chassis for running without a physics engine
//!
//! A bicycle-model car on flat ground. Motor and brake torques from the
//! dynamics controller become longitudinal force; the front steer angle
//! turns the heading. Good enough to drive the controllers end to end
//! (creep, hold speed, limiter, park lock) without a wheel solver.
//!
//! Optional surface noise perturbs wheel slip and suspension travel so ABS
//! and anti-roll have something to react to. The noise is seeded and
//! therefore repeatable.

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::unit_conversion::deg_to_rad;
use crate::vehicle::{Chassis, Damping, Side, WheelCommand, WheelContact, WheelPosition};

/// Physical constants of the demo car
#[derive(Debug, Clone, PartialEq)]
pub struct DemoChassisConfig {
    /// kg
    pub mass: f32,
    /// m
    pub wheel_radius: f32,
    /// m
    pub wheelbase: f32,
    /// Slip the brakes produce at full lock-up torque
    pub brake_slip_at_max: f32,
    /// Brake torque considered full lock-up
    pub lockup_brake_torque: f32,
    /// Fraction of speed lost per second
    pub linear_damping: f32,
    /// Fraction of yaw rate lost per second
    pub angular_damping: f32,
    /// Amplitude of the random slip/travel noise; 0 disables
    pub surface_noise: f32,
}

impl Default for DemoChassisConfig {
    fn default() -> Self {
        Self {
            mass: 1200.0,
            wheel_radius: 0.34,
            wheelbase: 2.6,
            brake_slip_at_max: 0.8,
            lockup_brake_torque: 3000.0,
            linear_damping: 0.0,
            angular_damping: 0.05,
            surface_noise: 0.0,
        }
    }
}

/// Kinematic chassis integrated by [`DemoChassis::step`]
pub struct DemoChassis {
    config: DemoChassisConfig,
    position: Vector3<f32>,
    /// Heading around +Y, radians; 0 faces +Z
    yaw: f32,
    /// Signed speed along the heading, m/s
    speed: f32,
    wheels: [WheelCommand; 4],
    pending_accel: Vector3<f32>,
    roll_moment: f32,
    damping: Damping,
    slip_noise: [f32; 4],
    travel_noise: [f32; 4],
    rng: StdRng,
}

impl Default for DemoChassis {
    fn default() -> Self {
        Self::new(DemoChassisConfig::default())
    }
}

impl DemoChassis {
    /// Demo car with the default noise seed
    pub fn new(config: DemoChassisConfig) -> Self {
        Self::with_seed(config, 0x5EED)
    }

    /// Same car with a specific noise seed
    pub fn with_seed(config: DemoChassisConfig, seed: u64) -> Self {
        let damping = Damping {
            linear: config.linear_damping,
            angular: config.angular_damping,
        };
        Self {
            config,
            position: Vector3::zeros(),
            yaw: 0.0,
            speed: 0.0,
            wheels: [WheelCommand::default(); 4],
            pending_accel: Vector3::zeros(),
            roll_moment: 0.0,
            damping,
            slip_noise: [0.0; 4],
            travel_noise: [0.0; 4],
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// World position, m
    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    /// Heading, radians
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Signed forward speed, m/s
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Put the car in motion, e.g. for tests that start rolling
    pub fn set_speed(&mut self, speed_ms: f32) {
        self.speed = speed_ms;
    }

    /// Torques last written to a wheel
    pub fn wheel(&self, wheel: WheelPosition) -> WheelCommand {
        self.wheels[wheel.slot()]
    }

    /// Sum of anti-roll forces received since the last step
    pub fn roll_moment(&self) -> f32 {
        self.roll_moment
    }

    /// Integrate one fixed step using the torques written this step
    pub fn step(&mut self, dt: f32) {
        let radius = self.config.wheel_radius.max(0.01);
        let mass = self.config.mass.max(1.0);

        let drive_force: f32 = self.wheels.iter().map(|w| w.motor_torque).sum::<f32>() / radius;
        let brake_force: f32 = self
            .wheels
            .iter()
            .map(|w| w.brake_torque.abs())
            .sum::<f32>()
            / radius;

        self.speed += drive_force / mass * dt;

        // Brakes and drag oppose motion and never reverse it within a step
        let resist = (brake_force / mass + self.pending_accel.norm()) * dt;
        if self.speed.abs() <= resist {
            self.speed = 0.0;
        } else {
            self.speed -= self.speed.signum() * resist;
        }
        self.speed /= 1.0 + dt * self.damping.linear.max(0.0);

        let steer_deg = self.wheels[0].steer_angle.unwrap_or(0.0);
        let yaw_rate = self.speed * deg_to_rad(steer_deg).tan() / self.config.wheelbase.max(0.1);
        self.yaw += yaw_rate * dt / (1.0 + dt * self.damping.angular.max(0.0));

        self.position += self.forward() * self.speed * dt;
        self.pending_accel = Vector3::zeros();
        self.roll_moment = 0.0;

        for slot in 0..4 {
            self.slip_noise[slot] = self.noise().abs();
            self.travel_noise[slot] = self.noise();
        }
    }

    fn noise(&mut self) -> f32 {
        if self.config.surface_noise <= 0.0 {
            return 0.0;
        }
        let amplitude = self.config.surface_noise;
        self.rng.gen_range(-amplitude..=amplitude)
    }
}

impl Chassis for DemoChassis {
    fn velocity(&self) -> Vector3<f32> {
        self.forward() * self.speed
    }

    fn forward(&self) -> Vector3<f32> {
        Vector3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    fn apply_wheel(&mut self, wheel: WheelPosition, command: WheelCommand) {
        let slot = &mut self.wheels[wheel.slot()];
        slot.motor_torque = command.motor_torque;
        slot.brake_torque = command.brake_torque;
        if command.steer_angle.is_some() {
            slot.steer_angle = command.steer_angle;
        }
    }

    fn set_brake_torque(&mut self, wheel: WheelPosition, torque: f32) {
        self.wheels[wheel.slot()].brake_torque = torque;
    }

    fn ground_contact(&self, wheel: WheelPosition) -> Option<WheelContact> {
        let command = self.wheels[wheel.slot()];
        let lockup = (command.brake_torque / self.config.lockup_brake_torque.max(1.0)).clamp(0.0, 1.0);
        let slot = wheel.slot();
        let slip = if self.speed.abs() > 0.5 {
            lockup * self.config.brake_slip_at_max + self.slip_noise[slot]
        } else {
            0.0
        };
        // body leans away from the turn: outside wheels compress
        let steer = self.wheels[0].steer_angle.unwrap_or(0.0);
        let lean = (steer / 90.0) * (self.speed.abs() / 30.0).min(1.0) * 0.25;
        let travel = match wheel.side {
            Side::Left => 0.5 + lean,
            Side::Right => 0.5 - lean,
        };
        Some(WheelContact {
            forward_slip: slip,
            suspension_travel: (travel + self.travel_noise[slot]).clamp(0.0, 1.0),
        })
    }

    fn add_acceleration(&mut self, acceleration: Vector3<f32>) {
        self.pending_accel += acceleration;
    }

    fn add_force_at_wheel(&mut self, wheel: WheelPosition, force: Vector3<f32>) {
        let sign = match wheel.side {
            Side::Left => 1.0,
            Side::Right => -1.0,
        };
        self.roll_moment += sign * force.y;
    }

    fn damping(&self) -> Damping {
        self.damping
    }

    fn set_damping(&mut self, damping: Damping) {
        self.damping = damping;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::Axle;

    const REAR_LEFT: WheelPosition = WheelPosition::new(Axle::Rear, Side::Left);
    const REAR_RIGHT: WheelPosition = WheelPosition::new(Axle::Rear, Side::Right);

    fn drive(chassis: &mut DemoChassis, motor: f32, brake: f32) {
        for wheel in [REAR_LEFT, REAR_RIGHT] {
            chassis.apply_wheel(
                wheel,
                WheelCommand {
                    motor_torque: motor,
                    brake_torque: brake,
                    steer_angle: None,
                },
            );
        }
    }

    #[test]
    fn test_motor_torque_accelerates_forward() {
        let mut chassis = DemoChassis::default();
        drive(&mut chassis, 700.0, 0.0);
        for _ in 0..50 {
            chassis.step(0.02);
        }
        assert!(chassis.speed() > 0.0);
        assert!(chassis.velocity().z > 0.0);
        assert!(chassis.position().z > 0.0);
    }

    #[test]
    fn test_brake_stops_without_reversing() {
        let mut chassis = DemoChassis::default();
        chassis.set_speed(5.0);
        drive(&mut chassis, 0.0, 3000.0);
        for _ in 0..100 {
            chassis.step(0.02);
        }
        assert_eq!(chassis.speed(), 0.0);
    }

    #[test]
    fn test_steering_turns_heading() {
        let mut chassis = DemoChassis::default();
        chassis.set_speed(5.0);
        chassis.apply_wheel(
            WheelPosition::new(Axle::Front, Side::Left),
            WheelCommand {
                steer_angle: Some(20.0),
                ..WheelCommand::default()
            },
        );
        chassis.step(0.1);
        assert!(chassis.yaw() > 0.0);
    }

    #[test]
    fn test_noise_is_seeded() {
        let config = DemoChassisConfig {
            surface_noise: 0.1,
            ..DemoChassisConfig::default()
        };
        let mut a = DemoChassis::with_seed(config.clone(), 7);
        let mut b = DemoChassis::with_seed(config, 7);
        a.set_speed(3.0);
        b.set_speed(3.0);
        a.step(0.02);
        b.step(0.02);
        assert_eq!(a.ground_contact(REAR_LEFT), b.ground_contact(REAR_LEFT));
    }
}
