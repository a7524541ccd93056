//! Wheel physics collaborator
//!
//! The suspension and tire solver lives outside this crate. The dynamics
//! controller writes per-wheel torques and steer angles through [`Chassis`]
//! and reads back velocity and ground contact.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Front or rear axle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axle {
    /// Steered end by default
    Front,
    /// Driven end by default
    Rear,
}

/// Wheel side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Left wheel
    Left,
    /// Right wheel
    Right,
}

/// One of the four wheels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WheelPosition {
    /// Axle carrying the wheel
    pub axle: Axle,
    /// Side of the car
    pub side: Side,
}

impl WheelPosition {
    /// Wheel on `axle` at `side`
    pub const fn new(axle: Axle, side: Side) -> Self {
        Self { axle, side }
    }

    /// All wheels, front before rear, left before right
    pub const ALL: [WheelPosition; 4] = [
        WheelPosition::new(Axle::Front, Side::Left),
        WheelPosition::new(Axle::Front, Side::Right),
        WheelPosition::new(Axle::Rear, Side::Left),
        WheelPosition::new(Axle::Rear, Side::Right),
    ];

    /// Slot in [`Self::ALL`]
    pub fn slot(&self) -> usize {
        let axle = match self.axle {
            Axle::Front => 0,
            Axle::Rear => 2,
        };
        let side = match self.side {
            Side::Left => 0,
            Side::Right => 1,
        };
        axle + side
    }
}

/// Role of an axle. An axle missing from the configuration is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxleRole {
    /// Wheels on this axle steer
    pub steering: bool,
    /// Wheels on this axle are driven
    pub motor: bool,
}

/// Ground contact of one wheel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelContact {
    /// Longitudinal slip, signed
    pub forward_slip: f32,
    /// Suspension extension: 0 fully compressed, 1 fully extended
    pub suspension_travel: f32,
}

/// Per-wheel actuation written every physics step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelCommand {
    /// Drive torque, Nm
    pub motor_torque: f32,
    /// Brake torque, Nm
    pub brake_torque: f32,
    /// `None` leaves the wheel's steer angle alone (non-steering axle)
    pub steer_angle: Option<f32>,
}

/// Body damping coefficients
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Damping {
    /// Linear damping
    pub linear: f32,
    /// Angular damping
    pub angular: f32,
}

/// Rigid body the dynamics controller drives
pub trait Chassis {
    /// World velocity, m/s
    fn velocity(&self) -> Vector3<f32>;

    /// Unit forward axis of the body
    fn forward(&self) -> Vector3<f32>;

    /// Wheel up axis, used for anti-roll forces
    fn wheel_up(&self, _wheel: WheelPosition) -> Vector3<f32> {
        Vector3::y()
    }

    /// Write motor, brake and steer for one wheel
    fn apply_wheel(&mut self, wheel: WheelPosition, command: WheelCommand);

    /// Override only the brake torque (ABS modulation)
    fn set_brake_torque(&mut self, wheel: WheelPosition, torque: f32);

    /// `None` while the wheel is in the air
    fn ground_contact(&self, wheel: WheelPosition) -> Option<WheelContact>;

    /// Mass-independent acceleration at the centre of mass
    fn add_acceleration(&mut self, acceleration: Vector3<f32>);

    /// Force applied at the wheel position (anti-roll)
    fn add_force_at_wheel(&mut self, wheel: WheelPosition, force: Vector3<f32>);

    /// Current body damping
    fn damping(&self) -> Damping;

    /// Replace the body damping
    fn set_damping(&mut self, damping: Damping);
}
