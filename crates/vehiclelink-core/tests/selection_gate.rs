//! Tests for menu selection and the transmission gate

use vehiclelink_core::peripheral::{can_send, TransmissionGate, TransmitError};
use vehiclelink_core::selection::SelectionRegistry;

#[test]
fn test_select_same_name_twice_toggles_off() {
    let reg = SelectionRegistry::new();
    reg.select("X");
    assert_eq!(reg.selected_name(), "X");
    reg.select("X");
    assert_eq!(reg.selected_name(), "");
}

#[test]
fn test_select_other_name_replaces() {
    let reg = SelectionRegistry::new();
    reg.select("X");
    reg.select("Y");
    assert_eq!(reg.selected_name(), "Y");
    assert!(!reg.is_selected("X"));
    assert!(reg.is_selected("Y"));
}

#[test]
fn test_clear_all() {
    let reg = SelectionRegistry::new();
    reg.select("Door");
    reg.clear_all();
    assert_eq!(reg.selected_name(), "");
    // clearing again is harmless
    reg.clear_all();
    reg.clear("Door");
    assert_eq!(reg.selected_name(), "");
}

#[test]
fn test_snapshot_is_detached() {
    let reg = SelectionRegistry::new();
    reg.select("Gear");
    let snap = reg.snapshot();
    reg.select("Door");
    assert_eq!(snap.selected_name(), "Gear");
    assert!(snap.is_selected("Gear"));
    assert!(reg.is_selected("Door"));
}

#[test]
fn test_closed_link_always_blocks_gated_send() {
    for selected in ["", "Door", "Gear"] {
        assert!(!can_send("Door", true, selected, false));
    }
}

#[test]
fn test_ungated_always_passes() {
    for selected in ["", "Door", "Gear"] {
        for link_open in [true, false] {
            assert!(can_send("Door", false, selected, link_open));
        }
    }
}

#[test]
fn test_empty_required_menu_never_matches() {
    assert!(!can_send("", true, "", true));
    let gate = TransmissionGate::new("", true);
    assert!(!gate.menu_allows(""));
}

#[test]
fn test_gate_follows_registry() {
    let reg = SelectionRegistry::new();
    let gate = TransmissionGate::new("Wiper", true);

    assert!(!gate.is_open(&reg.selected_name(), true));
    reg.select("Wiper");
    assert!(gate.is_open(&reg.selected_name(), true));
    assert_eq!(gate.check(&reg.selected_name(), true), Ok(()));

    reg.select("Door");
    assert_eq!(
        gate.check(&reg.selected_name(), true),
        Err(TransmitError::GateClosed {
            required: "Wiper".to_string(),
            selected: "Door".to_string(),
        })
    );
}
