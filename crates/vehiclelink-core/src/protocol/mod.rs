//! CAN-over-UART Protocol
//!
//! Textual CAN TX commands and the serial link that carries them to the
//! external adapter.

mod error;
pub mod frame;
pub mod serial;

pub use error::{FrameError, LinkError};
pub use frame::{build_tx_message, CanFrame, CanFrameType, CanIdType, FramePayload};
pub use serial::{
    list_ports, with_link, LinkConfig, LoopbackLink, SerialLink, SerialPortLink,
    SharedLink,
};

/// Default baud rate of the UART adapter
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// CAN id every stock peripheral table uses
pub const DEFAULT_CAN_ID: &str = "7B8";

/// Maximum data length of a classic CAN frame
pub const MAX_DATA_BYTES: usize = 8;

/// Largest 11-bit identifier
pub const MAX_STD_ID: u32 = 0x7FF;

/// Largest 29-bit identifier
pub const MAX_EXT_ID: u32 = 0x1FFF_FFFF;
