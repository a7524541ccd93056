//! Peripheral transmit errors

use thiserror::Error;

use crate::protocol::FrameError;

/// Why a peripheral frame was not sent. None of these are fatal; the state
/// change that triggered the send has already been applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransmitError {
    /// Configured id or payload does not form a valid frame
    #[error("Invalid CAN input: {0}")]
    Frame(#[from] FrameError),

    /// No open serial link
    #[error("Serial link not ready/open")]
    LinkNotReady,

    /// Another menu is selected
    #[error("Gate closed: '{required}' must be selected (selected: '{selected}')")]
    GateClosed {
        /// Menu the peripheral is gated on
        required: String,
        /// Menu selected at the time
        selected: String,
    },

    /// Door combination missing from the state table
    #[error("No state mapping for door mask {mask:#04x}")]
    NoStateMapping {
        /// Normalized open-door mask
        mask: u8,
    },

    /// The link refused the line
    #[error("Serial write failed")]
    LinkWrite,
}

/// Rejected operator text on the accelerator panel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeedInputError {
    /// Nothing typed
    #[error("Speed input is empty")]
    Empty,

    /// Fractional or non-numeric text
    #[error("Speed must be a whole number: '{0}'")]
    NotInteger(String),

    /// Whole number outside 0-255
    #[error("Speed {0} out of range (0-255)")]
    OutOfRange(i64),
}

/// Rejected operator text on the steering panel
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AngleInputError {
    /// Text does not parse as a number
    #[error("Angle is not a number: '{0}'")]
    NotANumber(String),

    /// Rounded angle outside the wheel's range
    #[error("Angle {angle} out of range ({min}..{max})")]
    OutOfRange {
        /// Angle as typed
        angle: f32,
        /// Lower bound, degrees
        min: f32,
        /// Upper bound, degrees
        max: f32,
    },
}

/// Outcome of a typed steering command that did not reach the wire
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SteeringCommandError {
    /// The typed text was rejected
    #[error(transparent)]
    Input(#[from] AngleInputError),

    /// Typed steering is switched off in the config
    #[error("Steering input is disabled")]
    InputDisabled,

    /// The angle was accepted but not sent
    #[error(transparent)]
    Transmit(#[from] TransmitError),
}
