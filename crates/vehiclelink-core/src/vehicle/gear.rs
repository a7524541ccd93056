//! Gear selector
//!
//! Five positions in lever order P, R, N, D, B. Shifting is only allowed
//! while the brake is held and the car is standing still. Up moves toward P,
//! down toward B; the lever does not wrap.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Selector position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gear {
    /// Park
    #[default]
    P,
    /// Reverse
    R,
    /// Neutral
    N,
    /// Drive
    D,
    /// Brake (regen) drive
    B,
}

impl Gear {
    /// Lever order
    pub const ALL: [Gear; 5] = [Gear::P, Gear::R, Gear::N, Gear::D, Gear::B];

    /// Position on the lever, P = 0
    pub fn index(&self) -> usize {
        match self {
            Gear::P => 0,
            Gear::R => 1,
            Gear::N => 2,
            Gear::D => 3,
            Gear::B => 4,
        }
    }

    /// Gear at `index`, clamped to the ends of the lever
    pub fn from_index(index: i32) -> Gear {
        Self::ALL[index.clamp(0, Self::ALL.len() as i32 - 1) as usize]
    }

    /// Selector letter
    pub fn as_char(&self) -> char {
        match self {
            Gear::P => 'P',
            Gear::R => 'R',
            Gear::N => 'N',
            Gear::D => 'D',
            Gear::B => 'B',
        }
    }

    /// Gear for a selector letter, case-insensitive
    pub fn from_char(c: char) -> Option<Gear> {
        match c.to_ascii_uppercase() {
            'P' => Some(Gear::P),
            'R' => Some(Gear::R),
            'N' => Some(Gear::N),
            'D' => Some(Gear::D),
            'B' => Some(Gear::B),
            _ => None,
        }
    }

    /// P and N give no drive
    pub fn is_motion_locked(&self) -> bool {
        matches!(self, Gear::P | Gear::N)
    }

    /// D and B drive forward
    pub fn is_forward(&self) -> bool {
        matches!(self, Gear::D | Gear::B)
    }
}

impl fmt::Display for Gear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Lever movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    /// Toward P
    Up,
    /// Toward B
    Down,
}

impl ShiftDirection {
    fn delta(&self) -> i32 {
        match self {
            ShiftDirection::Up => -1,
            ShiftDirection::Down => 1,
        }
    }
}

/// Driver tried to move the car with the throttle keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveIntent {
    /// Forward key
    Forward,
    /// Reverse key
    Reverse,
}

/// Shift refused because the brake was not held at standstill
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Shift rejected in {gear}: braking={braking}, stationary={stationary}")]
pub struct ShiftRejected {
    /// Gear that stayed engaged
    pub gear: Gear,
    /// Brake was held
    pub braking: bool,
    /// Car was standing still
    pub stationary: bool,
}

/// Gear selector tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GearConfig {
    /// Menu that activates gear mode
    pub menu_name: String,
    /// At or below this speed the car counts as standing still
    pub stationary_threshold_kmh: f32,
    /// Idle throttle in D when auto hold is off
    pub creep_throttle_d: f32,
    /// Idle throttle in B when auto hold is off
    pub creep_throttle_b: f32,
    /// Drive torque scale in B
    pub b_torque_scale: f32,
}

impl Default for GearConfig {
    fn default() -> Self {
        Self {
            menu_name: "Gear".to_string(),
            stationary_threshold_kmh: 0.6,
            creep_throttle_d: 0.18,
            creep_throttle_b: 0.10,
            b_torque_scale: 0.55,
        }
    }
}

/// What the gearbox hands to the dynamics controller every physics step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearMode {
    /// Gear constraints apply at all
    pub enabled: bool,
    /// Engaged gear
    pub gear: Gear,
    /// Idle throttle
    pub creep_throttle: f32,
    /// Drive torque multiplier
    pub torque_scale: f32,
}

impl Default for GearMode {
    fn default() -> Self {
        Self {
            enabled: false,
            gear: Gear::P,
            creep_throttle: 0.0,
            torque_scale: 1.0,
        }
    }
}

/// P/R/N/D/B selector with brake-at-standstill shift rules
pub struct GearStateMachine {
    gear: Gear,
    active: bool,
    config: GearConfig,
}

impl GearStateMachine {
    /// Selector in P with gear mode off
    pub fn new(config: GearConfig) -> Self {
        Self {
            gear: Gear::P,
            active: false,
            config,
        }
    }

    /// Engaged gear
    pub fn gear(&self) -> Gear {
        self.gear
    }

    /// Selector letter of the engaged gear
    pub fn gear_char(&self) -> char {
        self.gear.as_char()
    }

    /// Gear mode is on while the gear menu is selected
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Tuning in use
    pub fn config(&self) -> &GearConfig {
        &self.config
    }

    /// `speed_kmh` counts as standing still
    pub fn is_stationary(&self, speed_kmh: f32) -> bool {
        speed_kmh.abs() <= self.config.stationary_threshold_kmh
    }

    /// Follow the menu selection. Entering gear mode always starts in P.
    /// Returns true when the mode changed.
    pub fn update_selection(&mut self, selected: &str) -> bool {
        let should_be_active = !self.config.menu_name.is_empty() && selected == self.config.menu_name;
        if should_be_active == self.active {
            return false;
        }

        self.active = should_be_active;
        if should_be_active {
            self.gear = Gear::P;
            info!("Gear mode on, gear {}", self.gear);
        } else {
            info!("Gear mode off");
        }
        true
    }

    /// Move the lever one step. Requires brake held and the car standing
    /// still; a rejected shift leaves the gear unchanged.
    pub fn try_shift(
        &mut self,
        direction: ShiftDirection,
        braking: bool,
        stationary: bool,
    ) -> Result<Gear, ShiftRejected> {
        if !braking || !stationary {
            debug!(
                "Shift {:?} rejected in {} (braking={}, stationary={})",
                direction, self.gear, braking, stationary
            );
            return Err(ShiftRejected {
                gear: self.gear,
                braking,
                stationary,
            });
        }

        let next = Gear::from_index(self.gear.index() as i32 + direction.delta());
        if next != self.gear {
            info!("Gear {} -> {}", self.gear, next);
            self.gear = next;
        }
        Ok(next)
    }

    /// [`try_shift`](Self::try_shift) with stationarity taken from speed
    pub fn shift_at_speed(
        &mut self,
        direction: ShiftDirection,
        braking: bool,
        speed_kmh: f32,
    ) -> Result<Gear, ShiftRejected> {
        let stationary = self.is_stationary(speed_kmh);
        self.try_shift(direction, braking, stationary)
    }

    /// Whether a throttle key press fits the gear. An invalid attempt only
    /// needs signalling, nothing changes.
    pub fn check_drive_input(&self, intent: DriveIntent) -> bool {
        let valid = match (self.gear, intent) {
            (Gear::P | Gear::N, _) => false,
            (Gear::R, DriveIntent::Forward) => false,
            (Gear::D | Gear::B, DriveIntent::Reverse) => false,
            _ => true,
        };
        if !valid {
            debug!("{:?} input not allowed in {}", intent, self.gear);
        }
        valid
    }

    /// Creep throttle and torque scale for the current gear
    pub fn mode(&self) -> GearMode {
        let (creep_throttle, torque_scale) = match self.gear {
            Gear::D => (self.config.creep_throttle_d, 1.0),
            Gear::B => (self.config.creep_throttle_b, self.config.b_torque_scale),
            _ => (0.0, 1.0),
        };
        GearMode {
            enabled: self.active,
            gear: self.gear,
            creep_throttle,
            torque_scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_index_clamps() {
        assert_eq!(Gear::from_index(-1), Gear::P);
        assert_eq!(Gear::from_index(2), Gear::N);
        assert_eq!(Gear::from_index(9), Gear::B);
    }

    #[test]
    fn test_char_round_trip() {
        for gear in Gear::ALL {
            assert_eq!(Gear::from_char(gear.as_char()), Some(gear));
        }
        assert_eq!(Gear::from_char('d'), Some(Gear::D));
        assert_eq!(Gear::from_char('x'), None);
    }

    #[test]
    fn test_mode_per_gear() {
        let mut gears = GearStateMachine::new(GearConfig::default());
        gears.update_selection("Gear");
        assert_eq!(gears.mode().creep_throttle, 0.0);

        for _ in 0..3 {
            gears.try_shift(ShiftDirection::Down, true, true).unwrap();
        }
        assert_eq!(gears.gear(), Gear::D);
        assert_eq!(gears.mode().creep_throttle, 0.18);
        assert_eq!(gears.mode().torque_scale, 1.0);

        gears.try_shift(ShiftDirection::Down, true, true).unwrap();
        let mode = gears.mode();
        assert!(mode.enabled);
        assert_eq!(mode.gear, Gear::B);
        assert_eq!(mode.creep_throttle, 0.10);
        assert_eq!(mode.torque_scale, 0.55);
    }

    #[test]
    fn test_reselecting_menu_starts_in_park() {
        let mut gears = GearStateMachine::new(GearConfig::default());
        assert!(gears.update_selection("Gear"));
        gears.try_shift(ShiftDirection::Down, true, true).unwrap();
        assert_eq!(gears.gear(), Gear::R);

        assert!(gears.update_selection(""));
        assert!(!gears.is_active());
        assert!(!gears.update_selection(""));

        assert!(gears.update_selection("Gear"));
        assert_eq!(gears.gear(), Gear::P);
    }
}
