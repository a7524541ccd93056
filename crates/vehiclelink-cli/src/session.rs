//! One driving session: the simulator, the demo chassis and the held keys

use std::time::Duration;

use anyhow::{bail, Result};
use tracing::warn;

use vehiclelink_core::config::SimConfig;
use vehiclelink_core::demo::{DemoChassis, DemoChassisConfig};
use vehiclelink_core::peripheral::{format_speed, TransmitError};
use vehiclelink_core::protocol::{list_ports, SharedLink};
use vehiclelink_core::selection::SelectionRegistry;
use vehiclelink_core::sim::{FrameReport, VehicleSim};
use vehiclelink_core::vehicle::DriveIntent;

use crate::commands::{Command, HELP};

pub struct Session {
    sim: VehicleSim,
    chassis: DemoChassis,
    turn: f32,
    fixed_dt: f32,
    frame_dt: f32,
}

/// Shortest timer period; `tokio::time::interval` rejects zero
const MIN_TICK: Duration = Duration::from_millis(1);

/// Timer period for a step length in seconds, never below [`MIN_TICK`]
pub fn tick_period(secs: f32) -> Duration {
    Duration::try_from_secs_f32(secs)
        .unwrap_or(MIN_TICK)
        .max(MIN_TICK)
}

/// Peripheral send result as a printable line
fn sent(result: Result<Option<String>, TransmitError>) -> Result<Option<String>> {
    Ok(result?.map(|line| format!("> {}", line)))
}

impl Session {
    pub fn new(config: SimConfig, link: SharedLink) -> Self {
        let fixed_dt = config.timing.fixed_dt_secs;
        let frame_dt = config.timing.frame_dt_secs;
        Self {
            sim: VehicleSim::new(config, SelectionRegistry::new(), link),
            chassis: DemoChassis::new(DemoChassisConfig::default()),
            turn: 0.0,
            fixed_dt,
            frame_dt,
        }
    }

    pub fn physics_period(&self) -> Duration {
        tick_period(self.fixed_dt)
    }

    pub fn frame_period(&self) -> Duration {
        tick_period(self.frame_dt)
    }

    pub fn sim(&self) -> &VehicleSim {
        &self.sim
    }

    /// Display-rate tick
    pub fn frame(&mut self) -> FrameReport {
        self.sim.frame_update(self.frame_dt, self.turn)
    }

    /// Physics tick: controller first, then integrate the chassis
    pub fn physics_step(&mut self) {
        self.sim.fixed_update(&mut self.chassis, self.fixed_dt);
        self.chassis.step(self.fixed_dt);
    }

    /// Run one typed command. `Ok(Some(text))` is printed at the prompt.
    pub fn execute(&mut self, command: Command) -> Result<Option<String>> {
        match command {
            Command::Select(name) => {
                self.sim.selection().select(&name);
                Ok(Some(self.selection_text()))
            }
            Command::ClearSelection => {
                self.sim.selection().clear_all();
                Ok(Some(self.selection_text()))
            }
            Command::Shift(direction) => match self.sim.shift(direction) {
                None => bail!("Gear mode is off, select \"Gear\" first"),
                Some(result) => Ok(Some(format!("Gear {}", result?))),
            },
            Command::Brake(on) => {
                self.sim.input_mut().brake = on;
                Ok(None)
            }
            Command::Forward(on) => {
                self.sim.input_mut().forward = on;
                Ok(self.drive_warning(on, DriveIntent::Forward))
            }
            Command::Reverse(on) => {
                self.sim.input_mut().reverse = on;
                Ok(self.drive_warning(on, DriveIntent::Reverse))
            }
            Command::Steer(value) => {
                self.sim.input_mut().steer = value;
                Ok(None)
            }
            Command::Turn(value) => {
                self.turn = value;
                Ok(None)
            }
            Command::Speed(text) => match self.sim.submit_speed(&text)? {
                Some(result) => Ok(Some(format!("> {}", result?))),
                None if self.sim.accelerator.pending().is_some() => Ok(Some(format!(
                    "Target {} km/h, byte pending until \"Accelerator\" is selected",
                    self.sim.accelerator.last_target_kmh()
                ))),
                None => Ok(Some(format!(
                    "Target {} km/h",
                    self.sim.accelerator.last_target_kmh()
                ))),
            },
            Command::StopSpeed => {
                self.sim.dynamics_mut().clear_external_target_speed();
                Ok(Some("Target speed cleared".to_string()))
            }
            Command::Headlight => sent(self.sim.headlight.toggle_power()),
            Command::Beam => sent(self.sim.headlight.toggle_beam()),
            Command::Left => sent(self.sim.turn_signal.press_left()),
            Command::Right => sent(self.sim.turn_signal.press_right()),
            Command::Hazard => sent(self.sim.turn_signal.press_hazard()),
            Command::WiperLow => sent(self.sim.wiper.press_low_single().map(Some)),
            Command::WiperHigh => sent(self.sim.wiper.press_high_single().map(Some)),
            Command::WiperAuto => sent(self.sim.wiper.cycle_auto().map(Some)),
            Command::Door(door) => sent(self.sim.door.toggle(door)),
            Command::DoorSend => sent(self.sim.door.force_send().map(Some)),
            Command::Angle(text) => {
                let line = self.sim.steering.command_angle_text(&text)?;
                Ok(Some(format!("> {}", line)))
            }
            Command::Status => Ok(Some(self.status())),
            Command::Ports => {
                let ports = list_ports();
                if ports.is_empty() {
                    return Ok(Some("No serial ports found".to_string()));
                }
                Ok(Some(ports.join("\n")))
            }
            Command::Help => Ok(Some(HELP.to_string())),
            Command::Quit => Ok(None),
        }
    }

    fn drive_warning(&self, pressed: bool, intent: DriveIntent) -> Option<String> {
        if !pressed || self.sim.check_drive_input(intent) {
            return None;
        }
        let gear = self.sim.gears().gear();
        warn!("{:?} input ignored in {}", intent, gear);
        Some(format!("{:?} is not available in {}", intent, gear))
    }

    fn selection_text(&self) -> String {
        let name = self.sim.selection().selected_name();
        if name.is_empty() {
            "Selected: none".to_string()
        } else {
            format!("Selected: {}", name)
        }
    }

    pub fn status(&self) -> String {
        let dynamics = self.sim.dynamics();
        let external = dynamics.external_command();
        let gear = if self.sim.gears().is_active() {
            self.sim.gears().gear_char()
        } else {
            '-'
        };
        let target = if external.is_enabled() {
            format!("{:.0} km/h", external.target_kmh())
        } else {
            "off".to_string()
        };
        format!(
            "{} | gear {} | target {} | reversing {} | lights {:?} | wiper {:?} | doors {:05b} | wheel {:.0} deg | {}",
            format_speed(dynamics.forward_speed_kmh()),
            gear,
            target,
            dynamics.is_reversing(),
            self.sim.headlight.mode(),
            self.sim.wiper.mode(),
            self.sim.door.mask(),
            self.sim.steering.current_angle(),
            self.selection_text(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use vehiclelink_core::protocol::LoopbackLink;
    use vehiclelink_core::vehicle::{Gear, ShiftDirection};

    fn session() -> (Session, Arc<Mutex<LoopbackLink>>) {
        let link = Arc::new(Mutex::new(LoopbackLink::open()));
        let shared: SharedLink = link.clone();
        (Session::new(SimConfig::default(), shared), link)
    }

    #[test]
    fn test_tick_period_has_a_floor() {
        assert_eq!(tick_period(0.5), Duration::from_millis(500));
        assert_eq!(tick_period(1e-9), MIN_TICK);
        assert_eq!(tick_period(-1.0), MIN_TICK);
        assert_eq!(tick_period(f32::NAN), MIN_TICK);

        let mut config = SimConfig::default();
        config.timing.frame_dt_secs = 1e-7;
        let s = Session::new(config, Arc::new(Mutex::new(LoopbackLink::open())));
        assert_eq!(s.frame_period(), MIN_TICK);
    }

    #[test]
    fn test_headlight_command_prints_line() {
        let (mut s, link) = session();
        s.execute(Command::Select("Headlight".to_string())).unwrap();
        let out = s.execute(Command::Headlight).unwrap();
        assert_eq!(
            out.as_deref(),
            Some("> TX STD DATA 7B8 03 61 42 01 00 00 00 00")
        );
        assert_eq!(link.lock().unwrap().lines().len(), 1);
    }

    #[test]
    fn test_blocked_send_is_an_error() {
        let (mut s, _link) = session();
        assert!(s.execute(Command::Headlight).is_err());
    }

    #[test]
    fn test_shift_needs_gear_mode() {
        let (mut s, _link) = session();
        assert!(s.execute(Command::Shift(ShiftDirection::Down)).is_err());

        s.execute(Command::Select("Gear".to_string())).unwrap();
        s.frame();
        s.execute(Command::Brake(true)).unwrap();
        let out = s.execute(Command::Shift(ShiftDirection::Down)).unwrap();
        assert_eq!(out.as_deref(), Some("Gear R"));
        assert_eq!(s.sim().gears().gear(), Gear::R);
    }

    #[test]
    fn test_forward_in_park_warns() {
        let (mut s, _link) = session();
        s.execute(Command::Select("Gear".to_string())).unwrap();
        s.frame();
        let out = s.execute(Command::Forward(true)).unwrap();
        assert!(out.is_some());
        assert!(s.execute(Command::Forward(false)).unwrap().is_none());
    }

    #[test]
    fn test_speed_drives_demo_car() {
        let (mut s, _link) = session();
        s.execute(Command::Speed("20".to_string())).unwrap();
        for _ in 0..500 {
            s.physics_step();
        }
        assert!(s.sim().dynamics().forward_speed_kmh() > 15.0);
        s.execute(Command::StopSpeed).unwrap();
        assert!(!s.sim().dynamics().external_command().is_enabled());
    }
}
