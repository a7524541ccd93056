//! Transmission gate
//!
//! A peripheral may only transmit while its menu is the selected one and the
//! serial link is open. Peripherals configured without a gate always pass
//! the selection check.

use super::TransmitError;

/// Pure gate decision
pub fn can_send(required_menu: &str, require_gate: bool, selected: &str, link_open: bool) -> bool {
    if !require_gate {
        return true;
    }
    !required_menu.is_empty() && selected == required_menu && link_open
}

/// Gate settings of one peripheral
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmissionGate {
    required_menu: String,
    require_gate: bool,
}

impl TransmissionGate {
    /// Gate on `required_menu`; with `require_gate` off only the link matters
    pub fn new(required_menu: impl Into<String>, require_gate: bool) -> Self {
        Self {
            required_menu: required_menu.into(),
            require_gate,
        }
    }

    /// Menu that must be selected
    pub fn required_menu(&self) -> &str {
        &self.required_menu
    }

    /// Whether the selection is checked
    pub fn require_gate(&self) -> bool {
        self.require_gate
    }

    /// Selection half of the gate
    pub fn menu_allows(&self, selected: &str) -> bool {
        !self.require_gate || (!self.required_menu.is_empty() && selected == self.required_menu)
    }

    /// Same decision as [`can_send`]
    pub fn is_open(&self, selected: &str, link_open: bool) -> bool {
        can_send(&self.required_menu, self.require_gate, selected, link_open)
    }

    /// Reason-carrying check. The selection is checked first so an empty
    /// selection reports `GateClosed` even when the link is also down. The
    /// link is checked even for ungated peripherals: nothing can be written
    /// to a closed port.
    pub fn check(&self, selected: &str, link_open: bool) -> Result<(), TransmitError> {
        if !self.menu_allows(selected) {
            return Err(TransmitError::GateClosed {
                required: self.required_menu.clone(),
                selected: selected.to_string(),
            });
        }
        if !link_open {
            return Err(TransmitError::LinkNotReady);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_truth_table() {
        assert!(can_send("Door", true, "Door", true));
        assert!(!can_send("Door", true, "Door", false));
        assert!(!can_send("Door", true, "Gear", true));
        assert!(!can_send("Door", true, "", true));
        assert!(can_send("Door", false, "", false));
    }

    #[test]
    fn test_check_reports_selection_before_link() {
        let gate = TransmissionGate::new("Headlight", true);
        assert_eq!(
            gate.check("", false),
            Err(TransmitError::GateClosed {
                required: "Headlight".into(),
                selected: String::new()
            })
        );
        assert_eq!(gate.check("Headlight", false), Err(TransmitError::LinkNotReady));
        assert_eq!(gate.check("Headlight", true), Ok(()));
    }

    #[test]
    fn test_ungated_still_needs_link_to_write() {
        let gate = TransmissionGate::new("Headlight", false);
        assert!(gate.is_open("", false));
        assert_eq!(gate.check("", false), Err(TransmitError::LinkNotReady));
    }
}
