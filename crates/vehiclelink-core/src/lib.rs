//! # VehicleLink Core Library
//!
//! Core functionality for the VehicleLink vehicle simulator.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Textual CAN TX frame building and validation
//! - Serial (UART) link with port discovery and auto-reconnect
//! - Menu selection registry and per-peripheral transmission gate
//! - P/R/N/D/B gear selector with shift rules
//! - Per-step vehicle dynamics (hold speed, reverse limiter, ABS, anti-roll)
//! - Peripheral controllers: lights, turn signals, wiper, doors, steering,
//!   gear report and accelerator
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::{Arc, Mutex};
//! use vehiclelink_core::prelude::*;
//!
//! let selection = SelectionRegistry::new();
//! let link: SharedLink = Arc::new(Mutex::new(LoopbackLink::open()));
//! let mut sim = VehicleSim::new(SimConfig::default(), selection.clone(), link);
//!
//! selection.select("Headlight");
//! let line = sim.headlight.toggle_power()?;
//! assert_eq!(line.as_deref(), Some("TX STD DATA 7B8 03 61 42 01 00 00 00 00"));
//! ```

pub mod config;
pub mod demo;
pub mod peripheral;
pub mod protocol;
pub mod selection;
pub mod sim;
pub mod unit_conversion;
pub mod vehicle;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{ConfigError, SimConfig};
    pub use crate::demo::{DemoChassis, DemoChassisConfig};
    pub use crate::peripheral::{
        BeamMode, Door, SignalMode, TransmitError, WiperMode,
    };
    pub use crate::protocol::{
        CanFrame, CanFrameType, CanIdType, FrameError, LinkConfig, LoopbackLink, SerialLink,
        SerialPortLink, SharedLink,
    };
    pub use crate::selection::SelectionRegistry;
    pub use crate::sim::{FrameReport, VehicleSim};
    pub use crate::vehicle::{
        Chassis, DriverInput, Gear, GearStateMachine, ShiftDirection, ShiftRejected,
        VehicleDynamicsController,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
