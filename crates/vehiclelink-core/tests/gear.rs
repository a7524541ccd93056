//! Tests for the gear selector

use vehiclelink_core::vehicle::{
    DriveIntent, Gear, GearConfig, GearStateMachine, ShiftDirection, ShiftRejected,
};

fn active_gears() -> GearStateMachine {
    let mut gears = GearStateMachine::new(GearConfig::default());
    gears.update_selection("Gear");
    gears
}

fn shift_to(gears: &mut GearStateMachine, target: Gear) {
    while gears.gear().index() < target.index() {
        gears.try_shift(ShiftDirection::Down, true, true).unwrap();
    }
    while gears.gear().index() > target.index() {
        gears.try_shift(ShiftDirection::Up, true, true).unwrap();
    }
}

#[test]
fn test_starts_in_park() {
    let gears = GearStateMachine::new(GearConfig::default());
    assert_eq!(gears.gear(), Gear::P);
    assert_eq!(gears.gear_char(), 'P');
    assert!(!gears.is_active());
}

#[test]
fn test_shift_without_brake_is_rejected() {
    for start in Gear::ALL {
        for direction in [ShiftDirection::Up, ShiftDirection::Down] {
            for stationary in [true, false] {
                let mut gears = active_gears();
                shift_to(&mut gears, start);
                let result = gears.try_shift(direction, false, stationary);
                assert_eq!(
                    result,
                    Err(ShiftRejected {
                        gear: start,
                        braking: false,
                        stationary,
                    })
                );
                assert_eq!(gears.gear(), start);
            }
        }
    }
}

#[test]
fn test_shift_up_moves_one_step_toward_park() {
    for start in [Gear::R, Gear::N, Gear::D, Gear::B] {
        let mut gears = active_gears();
        shift_to(&mut gears, start);
        let next = gears.try_shift(ShiftDirection::Up, true, true).unwrap();
        assert_eq!(next.index(), start.index() - 1);
        assert_eq!(gears.gear(), next);
    }
}

#[test]
fn test_lever_does_not_wrap() {
    let mut gears = active_gears();
    assert_eq!(gears.try_shift(ShiftDirection::Up, true, true), Ok(Gear::P));

    shift_to(&mut gears, Gear::B);
    assert_eq!(gears.try_shift(ShiftDirection::Down, true, true), Ok(Gear::B));
}

#[test]
fn test_park_to_drive_rejected_while_moving() {
    let mut gears = active_gears();
    for _ in 0..3 {
        let result = gears.shift_at_speed(ShiftDirection::Down, true, 10.0);
        assert!(result.is_err());
    }
    assert_eq!(gears.gear(), Gear::P);
}

#[test]
fn test_stationary_threshold() {
    let gears = active_gears();
    assert!(gears.is_stationary(0.0));
    assert!(gears.is_stationary(0.6));
    assert!(!gears.is_stationary(0.61));
    assert!(gears.is_stationary(-0.5));
}

#[test]
fn test_drive_input_rules() {
    let mut gears = active_gears();

    assert!(!gears.check_drive_input(DriveIntent::Forward));
    assert!(!gears.check_drive_input(DriveIntent::Reverse));

    shift_to(&mut gears, Gear::R);
    assert!(!gears.check_drive_input(DriveIntent::Forward));
    assert!(gears.check_drive_input(DriveIntent::Reverse));

    shift_to(&mut gears, Gear::N);
    assert!(!gears.check_drive_input(DriveIntent::Forward));
    assert!(!gears.check_drive_input(DriveIntent::Reverse));

    for gear in [Gear::D, Gear::B] {
        shift_to(&mut gears, gear);
        assert!(gears.check_drive_input(DriveIntent::Forward));
        assert!(!gears.check_drive_input(DriveIntent::Reverse));
    }
}

#[test]
fn test_mode_reports_activity() {
    let mut gears = GearStateMachine::new(GearConfig::default());
    assert!(!gears.mode().enabled);
    gears.update_selection("Gear");
    assert!(gears.mode().enabled);
    gears.update_selection("Door");
    assert!(!gears.mode().enabled);
}
