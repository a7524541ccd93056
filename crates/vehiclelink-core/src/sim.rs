//! Simulation root
//!
//! Owns the gearbox, the dynamics controller and every peripheral, all
//! wired to one selection registry and one serial link. A host drives it
//! with two clocks:
//!
//! - [`VehicleSim::frame_update`] at display rate: selection changes, edge
//!   detection on lamps and gear, blink and wipe timers, the accelerator
//!   retry and link housekeeping.
//! - [`VehicleSim::fixed_update`] at the physics rate: gear policy into the
//!   dynamics controller, then one dynamics step on the chassis.

use tracing::debug;

use crate::config::SimConfig;
use crate::peripheral::{
    AcceleratorController, BinarySignalController, ChannelConfig, DoorController,
    GearReportController, HeadlightController, PeripheralChannel, SpeedInputError,
    SteeringWheelController, TransmitError, TurnSignalController, WiperController,
};
use crate::protocol::{with_link, SharedLink};
use crate::selection::SelectionRegistry;
use crate::vehicle::{
    Chassis, DriveIntent, DriverInput, DynamicsOutput, Gear, GearStateMachine, ShiftDirection,
    ShiftRejected, VehicleDynamicsController,
};

/// Sends attempted during one frame
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameReport {
    /// Lines written to the link
    pub sent: Vec<String>,
    /// Sends that did not happen, in frame order
    pub blocked: Vec<TransmitError>,
}

impl FrameReport {
    /// File one send outcome
    pub fn record(&mut self, result: Result<String, TransmitError>) {
        match result {
            Ok(line) => self.sent.push(line),
            Err(e) => self.blocked.push(e),
        }
    }

    /// Nothing was attempted
    pub fn is_empty(&self) -> bool {
        self.sent.is_empty() && self.blocked.is_empty()
    }
}

/// Gear selector, dynamics and every peripheral wired to one selection
/// registry and one link
pub struct VehicleSim {
    selection: SelectionRegistry,
    link: SharedLink,
    input: DriverInput,
    gears: GearStateMachine,
    dynamics: VehicleDynamicsController,
    last_output: DynamicsOutput,

    /// Off / low / high beam
    pub headlight: HeadlightController,
    /// Indicators and hazard
    pub turn_signal: TurnSignalController,
    /// Follows the brake key
    pub brake_light: BinarySignalController,
    /// Follows reversing
    pub reverse_light: BinarySignalController,
    /// Brake pedal switch, follows the brake key
    pub brake_pedal: BinarySignalController,
    /// Reports selector changes
    pub gear_report: GearReportController,
    /// Single and auto wipes
    pub wiper: WiperController,
    /// Wheel angle from keys or typed targets
    pub steering: SteeringWheelController,
    /// Door open mask
    pub door: DoorController,
    /// Typed target speed
    pub accelerator: AcceleratorController,
}

impl VehicleSim {
    /// Simulator in park with everything off
    pub fn new(config: SimConfig, selection: SelectionRegistry, link: SharedLink) -> Self {
        let channel = |tag: &'static str, cfg: &ChannelConfig| {
            PeripheralChannel::new(tag, cfg.clone(), selection.clone(), link.clone())
        };
        let p = &config.peripherals;

        let headlight = HeadlightController::new(
            p.headlight.clone(),
            channel("Headlight", &p.headlight.channel),
        );
        let turn_signal = TurnSignalController::new(
            p.turn_signal.clone(),
            channel("TurnSignal", &p.turn_signal.channel),
        );
        let brake_light = BinarySignalController::new(
            p.brake_light.clone(),
            channel("BrakeLight", &p.brake_light.channel),
        );
        let reverse_light = BinarySignalController::new(
            p.reverse_light.clone(),
            channel("ReverseLight", &p.reverse_light.channel),
        );
        let brake_pedal = BinarySignalController::new(
            p.brake_pedal.clone(),
            channel("BrakePedal", &p.brake_pedal.channel),
        );
        let gear_report = GearReportController::new(
            p.gear_report.clone(),
            channel("GearUART", &p.gear_report.channel),
        );
        let wiper = WiperController::new(p.wiper.clone(), channel("Wiper", &p.wiper.channel));
        let steering = SteeringWheelController::new(
            p.steering.clone(),
            channel("Steering", &p.steering.channel),
        );
        let door = DoorController::new(p.door.clone(), channel("Door", &p.door.channel));
        let accelerator = AcceleratorController::new(
            p.accelerator.clone(),
            channel("Accelerator", &p.accelerator.channel),
        );

        Self {
            gears: GearStateMachine::new(config.gear.clone()),
            dynamics: VehicleDynamicsController::new(config.dynamics.clone()),
            last_output: DynamicsOutput::default(),
            input: DriverInput::default(),
            selection,
            link,
            headlight,
            turn_signal,
            brake_light,
            reverse_light,
            brake_pedal,
            gear_report,
            wiper,
            steering,
            door,
            accelerator,
        }
    }

    /// Shared menu selection
    pub fn selection(&self) -> &SelectionRegistry {
        &self.selection
    }

    /// Shared serial link
    pub fn link(&self) -> &SharedLink {
        &self.link
    }

    /// Gear selector
    pub fn gears(&self) -> &GearStateMachine {
        &self.gears
    }

    /// Dynamics controller
    pub fn dynamics(&self) -> &VehicleDynamicsController {
        &self.dynamics
    }

    /// Mutable dynamics, e.g. to retune at runtime
    pub fn dynamics_mut(&mut self) -> &mut VehicleDynamicsController {
        &mut self.dynamics
    }

    /// Result of the last fixed step
    pub fn last_output(&self) -> &DynamicsOutput {
        &self.last_output
    }

    /// Held keys and steering, read by both clocks
    pub fn input(&self) -> &DriverInput {
        &self.input
    }

    /// Mutable driver input
    pub fn input_mut(&mut self) -> &mut DriverInput {
        &mut self.input
    }

    /// Arrow-key shift. `None` while gear mode is off (the lever is hidden).
    pub fn shift(&mut self, direction: ShiftDirection) -> Option<Result<Gear, ShiftRejected>> {
        if !self.gears.is_active() {
            debug!("Gear mode off, shift ignored");
            return None;
        }
        Some(
            self.gears
                .shift_at_speed(direction, self.input.brake, self.dynamics.speed_kmh()),
        )
    }

    /// Whether pressing a throttle key fits the current gear. Always valid
    /// outside gear mode.
    pub fn check_drive_input(&self, intent: DriveIntent) -> bool {
        !self.gears.is_active() || self.gears.check_drive_input(intent)
    }

    /// Typed accelerator target
    pub fn submit_speed(
        &mut self,
        text: &str,
    ) -> Result<Option<Result<String, TransmitError>>, SpeedInputError> {
        self.accelerator.submit_text(text, &mut self.dynamics)
    }

    /// Display-rate update. `turn` is the steering key axis in [-1, 1].
    pub fn frame_update(&mut self, dt: f32, turn: f32) -> FrameReport {
        with_link(&self.link, |l| l.poll());

        let mut report = FrameReport::default();
        let selected = self.selection.selected_name();
        self.gears.update_selection(&selected);

        let brake = self.input.brake;
        let reversing = self.dynamics.is_reversing();
        let gear = self.gears.gear();

        for result in [
            self.brake_light.update(brake),
            self.brake_pedal.update(brake),
            self.reverse_light.update(reversing),
            self.gear_report.update(gear),
            self.wiper.tick(dt),
            self.accelerator.tick(),
        ]
        .into_iter()
        .flatten()
        {
            report.record(result);
        }

        if let Some(result) = self.turn_signal.tick(dt) {
            match result {
                Ok(Some(line)) => report.sent.push(line),
                Ok(None) => {}
                Err(e) => report.blocked.push(e),
            }
        }

        self.steering.tick(turn, dt);
        report
    }

    /// Fixed-rate physics step
    pub fn fixed_update(&mut self, chassis: &mut dyn Chassis, dt: f32) -> DynamicsOutput {
        self.dynamics.apply_gear_mode(self.gears.mode());
        self.input.steering_wheel_deg = Some(self.steering.current_angle());
        self.last_output = self.dynamics.fixed_update(&self.input, chassis, dt);
        self.last_output
    }
}
