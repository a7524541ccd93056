//! Gated CAN channel shared by every peripheral
//!
//! A peripheral decides *what* to send (a payload string from its table); the
//! channel decides *whether* it may be sent (gate + link), builds the frame
//! and writes it: flush buffers (unless disabled), then one line.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{TransmissionGate, TransmitError};
use crate::protocol::{
    with_link, CanFrame, CanFrameType, CanIdType, SharedLink, DEFAULT_CAN_ID, MAX_DATA_BYTES,
};
use crate::selection::SelectionRegistry;

/// Frame and gate settings of one peripheral
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Hex identifier, e.g. "7B8"
    pub can_id: String,
    /// Standard (11-bit) or extended (29-bit) id
    pub id_type: CanIdType,
    /// Data or remote frame
    pub frame_type: CanFrameType,
    /// DLC used when `frame_type` is remote
    pub remote_dlc: u8,
    /// Menu that must be selected before anything is sent
    pub required_menu: String,
    /// Check the selected menu at all
    pub require_gate: bool,
    /// Discard pending adapter input/output before each line
    pub flush_before_send: bool,
    /// Log successful sends at info instead of debug
    pub log_sent: bool,
    /// Log blocked sends at warn instead of debug
    pub log_blocked: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            can_id: DEFAULT_CAN_ID.to_string(),
            id_type: CanIdType::Standard,
            frame_type: CanFrameType::Data,
            remote_dlc: MAX_DATA_BYTES as u8,
            required_menu: String::new(),
            require_gate: true,
            flush_before_send: true,
            log_sent: false,
            log_blocked: false,
        }
    }
}

impl ChannelConfig {
    /// Stock channel on the default id, gated on `menu`
    pub fn for_menu(menu: &str) -> Self {
        Self {
            required_menu: menu.to_string(),
            ..Self::default()
        }
    }
}

/// Gated sender bound to the shared selection and link
pub struct PeripheralChannel {
    tag: &'static str,
    config: ChannelConfig,
    gate: TransmissionGate,
    selection: SelectionRegistry,
    link: SharedLink,
}

impl PeripheralChannel {
    /// Channel whose gate is built from `config`
    pub fn new(
        tag: &'static str,
        config: ChannelConfig,
        selection: SelectionRegistry,
        link: SharedLink,
    ) -> Self {
        let gate = TransmissionGate::new(config.required_menu.clone(), config.require_gate);
        Self {
            tag,
            config,
            gate,
            selection,
            link,
        }
    }

    /// Log tag, e.g. "Headlight"
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// Settings this channel was built with
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Selection and link gate
    pub fn gate(&self) -> &TransmissionGate {
        &self.gate
    }

    /// Selection half of the gate
    pub fn menu_selected(&self) -> bool {
        self.gate.menu_allows(&self.selection.selected_name())
    }

    /// Link half of the gate
    pub fn link_open(&self) -> bool {
        with_link(&self.link, |l| l.is_open())
    }

    /// Both gate conditions hold right now
    pub fn gate_open(&self) -> bool {
        self.gate
            .is_open(&self.selection.selected_name(), self.link_open())
    }

    /// Build the frame for `data_hex` with this channel's id settings
    pub fn build(&self, data_hex: &str) -> Result<CanFrame, TransmitError> {
        CanFrame::build(
            &self.config.can_id,
            self.config.id_type,
            self.config.frame_type,
            data_hex,
            self.config.remote_dlc,
        )
        .map_err(|e| {
            warn!(peripheral = self.tag, "Invalid CAN input: {}", e);
            TransmitError::from(e)
        })
    }

    /// Gate, build and send one frame. Returns the line that was written.
    pub fn transmit(&self, data_hex: &str) -> Result<String, TransmitError> {
        self.check_gate()?;
        let frame = self.build(data_hex)?;
        self.send_line(&frame.to_tx_line())
    }

    /// Gate check with logging of the blocked reason
    pub fn check_gate(&self) -> Result<(), TransmitError> {
        let selected = self.selection.selected_name();
        let result = self.gate.check(&selected, self.link_open());
        if let Err(e) = &result {
            self.report_blocked(e);
        }
        result
    }

    /// Write a prepared line, bypassing the gate
    pub fn send_line(&self, line: &str) -> Result<String, TransmitError> {
        let flush = self.config.flush_before_send;
        let written = with_link(&self.link, |link| {
            if !link.is_open() {
                return Err(TransmitError::LinkNotReady);
            }
            if flush {
                link.flush_buffers();
            }
            if link.send_line(line) {
                Ok(())
            } else {
                Err(TransmitError::LinkWrite)
            }
        });

        match written {
            Ok(()) => {
                if self.config.log_sent {
                    info!(peripheral = self.tag, "UART sent: {}", line);
                } else {
                    debug!(peripheral = self.tag, "UART sent: {}", line);
                }
                Ok(line.to_string())
            }
            Err(e) => {
                self.report_blocked(&e);
                Err(e)
            }
        }
    }

    /// Log a dropped send
    pub fn report_blocked(&self, err: &TransmitError) {
        if self.config.log_blocked {
            warn!(peripheral = self.tag, "Block UART: {}", err);
        } else {
            debug!(peripheral = self.tag, "Block UART: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::LoopbackLink;
    use std::sync::{Arc, Mutex};

    fn channel(menu: &str) -> (PeripheralChannel, SelectionRegistry, Arc<Mutex<LoopbackLink>>) {
        let selection = SelectionRegistry::new();
        let link = Arc::new(Mutex::new(LoopbackLink::open()));
        let shared: SharedLink = link.clone();
        let ch = PeripheralChannel::new("Test", ChannelConfig::for_menu(menu), selection.clone(), shared);
        (ch, selection, link)
    }

    #[test]
    fn test_transmit_flushes_then_sends() {
        let (ch, selection, link) = channel("Test");
        selection.select("Test");
        let line = ch.transmit("01 02").unwrap();
        assert_eq!(line, "TX STD DATA 7B8 01 02");
        let link = link.lock().unwrap();
        assert_eq!(link.lines(), &[line]);
        assert_eq!(link.flush_count(), 1);
    }

    #[test]
    fn test_flush_can_be_disabled() {
        let selection = SelectionRegistry::new();
        let link = Arc::new(Mutex::new(LoopbackLink::open()));
        let shared: SharedLink = link.clone();
        let config = ChannelConfig {
            flush_before_send: false,
            ..ChannelConfig::for_menu("Test")
        };
        let ch = PeripheralChannel::new("Test", config, selection.clone(), shared);
        selection.select("Test");
        ch.transmit("01").unwrap();
        let link = link.lock().unwrap();
        assert_eq!(link.lines().len(), 1);
        assert_eq!(link.flush_count(), 0);
    }

    #[test]
    fn test_invalid_payload_is_not_sent() {
        let (ch, selection, link) = channel("Test");
        selection.select("Test");
        let err = ch.transmit("01 02 03 04 05 06 07 08 09").unwrap_err();
        assert!(matches!(err, TransmitError::Frame(_)));
        assert!(link.lock().unwrap().lines().is_empty());
    }

    #[test]
    fn test_closed_link_reports_not_ready() {
        let (ch, selection, link) = channel("Test");
        selection.select("Test");
        link.lock().unwrap().set_open(false);
        assert!(!ch.gate_open());
        assert_eq!(ch.transmit("00"), Err(TransmitError::LinkNotReady));
    }
}
