//! Tests for loading and saving the simulator configuration

use tempfile::tempdir;
use vehiclelink_core::config::{ConfigError, SimConfig};
use vehiclelink_core::peripheral::DoorStateRow;
use vehiclelink_core::protocol::CanIdType;

#[test]
fn test_save_then_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sim.json");

    let mut config = SimConfig::default();
    config.link.preferred_port_contains = "ACM".to_string();
    config.dynamics.max_speed_kmh = 90.0;
    config.peripherals.door.state_table = vec![
        DoorStateRow::new(0, "06 61 46 00 00 00 00 00"),
        DoorStateRow::new(31, "06 61 46 1F 00 00 00 00"),
    ];
    config.peripherals.steering.channel.id_type = CanIdType::Extended;
    config.peripherals.steering.channel.can_id = "18FF0001".to_string();

    config.save(&path).unwrap();
    let loaded = SimConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    loaded.validate().unwrap();
}

#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    let result = SimConfig::load(dir.path().join("missing.json"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_malformed_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ \"link\": ").unwrap();
    assert!(matches!(SimConfig::load(&path), Err(ConfigError::Json(_))));
}

#[test]
fn test_empty_object_is_default() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.json");
    std::fs::write(&path, "{}").unwrap();
    assert_eq!(SimConfig::load(&path).unwrap(), SimConfig::default());
}

#[test]
fn test_ungated_channel_may_have_no_menu() {
    let mut config = SimConfig::default();
    config.peripherals.headlight.channel.require_gate = false;
    config.peripherals.headlight.channel.required_menu.clear();
    config.validate().unwrap();
}

#[test]
fn test_inverted_steering_range_rejected() {
    let mut config = SimConfig::default();
    config.peripherals.steering.min_angle = 100.0;
    config.peripherals.steering.max_angle = -100.0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Invalid { field, .. }) if field == "steering"
    ));
}

#[test]
fn test_door_row_with_nine_bytes_rejected() {
    let mut config = SimConfig::default();
    config.peripherals.door.state_table =
        vec![DoorStateRow::new(1, "00 00 00 00 00 00 00 00 00")];
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Invalid { field, .. }) if field == "door.state_table[0]"
    ));
}

#[test]
fn test_reverse_falloff_must_be_positive() {
    for falloff in [0.0, -1.0, f32::NAN] {
        let mut config = SimConfig::default();
        config.dynamics.reverse_torque_falloff = falloff;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field, .. }) if field == "dynamics.reverse_torque_falloff"
        ));
    }
}
