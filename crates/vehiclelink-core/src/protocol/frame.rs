//! CAN frame codec
//!
//! Builds the textual TX command understood by the UART-to-CAN adapter:
//!
//! ```text
//! TX {STD|EXT} DATA {id} {byte0} {byte1} ...
//! TX {STD|EXT} RTR {id} {dlc}
//! ```
//!
//! The id keeps the digits it was given (prefix stripped, uppercased). Data
//! bytes accept 1-2 hex digits with an optional `0x` prefix and are always
//! emitted as two uppercase digits.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{FrameError, MAX_DATA_BYTES, MAX_EXT_ID, MAX_STD_ID};

/// Identifier width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanIdType {
    /// 11-bit identifier
    #[default]
    Standard,
    /// 29-bit identifier
    Extended,
}

impl CanIdType {
    /// Token used on the wire
    pub fn token(&self) -> &'static str {
        match self {
            CanIdType::Standard => "STD",
            CanIdType::Extended => "EXT",
        }
    }

    fn max_digits(&self) -> usize {
        match self {
            CanIdType::Standard => 3,
            CanIdType::Extended => 8,
        }
    }

    fn max_value(&self) -> u32 {
        match self {
            CanIdType::Standard => MAX_STD_ID,
            CanIdType::Extended => MAX_EXT_ID,
        }
    }
}

impl fmt::Display for CanIdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Data or remote-request frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanFrameType {
    /// Frame carrying data bytes
    #[default]
    Data,
    /// Remote transmission request
    Remote,
}

impl CanFrameType {
    /// Token used on the wire
    pub fn token(&self) -> &'static str {
        match self {
            CanFrameType::Data => "DATA",
            CanFrameType::Remote => "RTR",
        }
    }
}

/// Frame body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramePayload {
    /// Up to 8 data bytes
    Data(Vec<u8>),
    /// Remote request with the requested length
    Remote {
        /// Requested data length, 0-8
        dlc: u8,
    },
}

/// A validated CAN frame, immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    id: String,
    id_type: CanIdType,
    payload: FramePayload,
}

impl CanFrame {
    /// Build and validate a frame from its textual parts.
    ///
    /// `data_hex` is only read for data frames and `remote_dlc` only for
    /// remote frames.
    pub fn build(
        id_hex: &str,
        id_type: CanIdType,
        frame_type: CanFrameType,
        data_hex: &str,
        remote_dlc: u8,
    ) -> Result<Self, FrameError> {
        let id = normalize_id(id_hex, id_type)?;

        let payload = match frame_type {
            CanFrameType::Remote => {
                if usize::from(remote_dlc) > MAX_DATA_BYTES {
                    return Err(FrameError::InvalidDlc(remote_dlc));
                }
                FramePayload::Remote { dlc: remote_dlc }
            }
            CanFrameType::Data => FramePayload::Data(parse_data_bytes(data_hex)?),
        };

        Ok(Self {
            id,
            id_type,
            payload,
        })
    }

    /// Build a data frame from raw bytes
    pub fn data(id_hex: &str, id_type: CanIdType, bytes: &[u8]) -> Result<Self, FrameError> {
        let id = normalize_id(id_hex, id_type)?;
        if bytes.len() > MAX_DATA_BYTES {
            return Err(FrameError::TooManyBytes(bytes.len()));
        }
        Ok(Self {
            id,
            id_type,
            payload: FramePayload::Data(bytes.to_vec()),
        })
    }

    /// Normalized identifier digits
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Standard or extended identifier
    pub fn id_type(&self) -> CanIdType {
        self.id_type
    }

    /// Data or remote, from the payload
    pub fn frame_type(&self) -> CanFrameType {
        match self.payload {
            FramePayload::Data(_) => CanFrameType::Data,
            FramePayload::Remote { .. } => CanFrameType::Remote,
        }
    }

    /// Data bytes or remote length
    pub fn payload(&self) -> &FramePayload {
        &self.payload
    }

    /// Canonical TX line (without line terminator)
    pub fn to_tx_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CanFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TX {} {} {}",
            self.id_type,
            self.frame_type().token(),
            self.id
        )?;
        match &self.payload {
            FramePayload::Remote { dlc } => write!(f, " {}", dlc),
            FramePayload::Data(bytes) => {
                for b in bytes {
                    write!(f, " {:02X}", b)?;
                }
                Ok(())
            }
        }
    }
}

/// Build a TX command line in one call
pub fn build_tx_message(
    id_hex: &str,
    id_type: CanIdType,
    frame_type: CanFrameType,
    data_hex: &str,
    remote_dlc: u8,
) -> Result<String, FrameError> {
    CanFrame::build(id_hex, id_type, frame_type, data_hex, remote_dlc).map(|f| f.to_tx_line())
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Strip an optional `0x` prefix, uppercase and range-check an identifier
pub fn normalize_id(id_hex: &str, id_type: CanIdType) -> Result<String, FrameError> {
    let trimmed = id_hex.trim();
    let id = strip_hex_prefix(trimmed).to_ascii_uppercase();

    let invalid = |reason| FrameError::InvalidId {
        id: trimmed.to_string(),
        id_type,
        reason,
    };

    if id.is_empty() || id.len() > id_type.max_digits() || !id.chars().all(|c| c.is_ascii_hexdigit())
    {
        return Err(invalid(match id_type {
            CanIdType::Standard => "STD ID must be 1-3 hex digits",
            CanIdType::Extended => "EXT ID must be 1-8 hex digits",
        }));
    }

    let value = u32::from_str_radix(&id, 16).map_err(|_| invalid("not a hex number"))?;
    if value > id_type.max_value() {
        return Err(invalid(match id_type {
            CanIdType::Standard => "STD ID out of range (>7FF)",
            CanIdType::Extended => "EXT ID out of range (>1FFFFFFF)",
        }));
    }

    Ok(id)
}

/// Parse a whitespace/comma separated list of hex byte tokens.
///
/// An empty (or all-separator) string yields an empty byte list.
pub fn parse_data_bytes(data_hex: &str) -> Result<Vec<u8>, FrameError> {
    let tokens: Vec<&str> = data_hex
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.len() > MAX_DATA_BYTES {
        return Err(FrameError::TooManyBytes(tokens.len()));
    }

    tokens
        .iter()
        .enumerate()
        .map(|(index, token)| {
            let digits = strip_hex_prefix(token);
            let well_formed = (1..=2).contains(&digits.len())
                && digits.chars().all(|c| c.is_ascii_hexdigit());
            if !well_formed {
                return Err(FrameError::InvalidByte {
                    index,
                    token: token.to_string(),
                });
            }
            u8::from_str_radix(digits, 16).map_err(|_| FrameError::InvalidByte {
                index,
                token: token.to_string(),
            })
        })
        .collect()
}

/// Format bytes as space separated uppercase hex pairs
pub fn format_data_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
