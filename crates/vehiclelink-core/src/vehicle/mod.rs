//! Vehicle model
//!
//! Gear selector, observed motion and the per-step dynamics controller.
//! The wheel solver itself is behind the [`Chassis`] trait.

pub mod chassis;
pub mod dynamics;
mod gear;
mod state;

pub use chassis::{Axle, AxleRole, Chassis, Damping, Side, WheelCommand, WheelContact, WheelPosition};
pub use dynamics::{DriverInput, DynamicsConfig, DynamicsOutput, VehicleDynamicsController};
pub use gear::{
    DriveIntent, Gear, GearConfig, GearMode, GearStateMachine, ShiftDirection, ShiftRejected,
};
pub use state::{ExternalSpeedCommand, VehicleState, REVERSING_THRESHOLD_KMH};
