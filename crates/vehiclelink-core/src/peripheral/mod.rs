//! Peripheral signal controllers
//!
//! Every controller keeps a small piece of logical state (beam mode, door
//! mask, wiper mode, ...). A state change looks up the payload for the new
//! state and sends one frame through a [`PeripheralChannel`], which owns the
//! gate check and the serial write.
//!
//! Sends that are blocked by the gate are dropped, not queued. The
//! accelerator is the exception: it keeps its byte pending and retries
//! every frame until the gate opens.

mod accelerator;
mod channel;
mod door;
mod error;
mod gate;
mod gear_report;
mod headlight;
mod lamp;
mod steering;
mod turn_signal;
mod wiper;

pub use accelerator::{
    accelerator_payload, format_speed, parse_speed_input, AcceleratorConfig,
    AcceleratorController,
};
pub use channel::{ChannelConfig, PeripheralChannel};
pub use door::{Door, DoorConfig, DoorController, DoorStateRow, DOOR_MASK_ALL};
pub use error::{AngleInputError, SpeedInputError, SteeringCommandError, TransmitError};
pub use gate::{can_send, TransmissionGate};
pub use gear_report::{GearReportConfig, GearReportController};
pub use headlight::{BeamMode, HeadlightConfig, HeadlightController};
pub use lamp::{BinarySignalConfig, BinarySignalController};
pub use steering::{steering_payload, SteeringConfig, SteeringWheelController};
pub use turn_signal::{SignalMode, TurnSignalConfig, TurnSignalController};
pub use wiper::{WiperConfig, WiperController, WiperMode};
