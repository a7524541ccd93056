//! Protocol errors

use thiserror::Error;

use super::frame::CanIdType;

/// Errors that can occur while building a CAN TX command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Identifier is not hex or does not fit its width
    #[error("Invalid {id_type} CAN id '{id}': {reason}")]
    InvalidId {
        /// Identifier as given
        id: String,
        /// Width it was checked against
        id_type: CanIdType,
        /// What is wrong with it
        reason: &'static str,
    },

    /// A data token is not one hex byte
    #[error("Invalid data byte at index {index}: '{token}'")]
    InvalidByte {
        /// Position in the payload
        index: usize,
        /// Offending token
        token: String,
    },

    /// More than eight data bytes
    #[error("Data must be 0-8 bytes, got {0}")]
    TooManyBytes(usize),

    /// Remote frame length above eight
    #[error("RTR DLC must be 0-8, got {0}")]
    InvalidDlc(u8),
}

/// Errors raised by the serial link itself
#[derive(Error, Debug)]
pub enum LinkError {
    /// The driver rejected an open or configure call
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// Discovery found nothing that opens
    #[error("No serial port available")]
    NoPortAvailable,

    /// The named port does not exist
    #[error("Port not found: {0}")]
    PortNotFound(String),
}
