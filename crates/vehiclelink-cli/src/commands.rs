//! Line commands typed at the prompt

use thiserror::Error;
use vehiclelink_core::peripheral::Door;
use vehiclelink_core::vehicle::ShiftDirection;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Toggle a menu selection
    Select(String),
    ClearSelection,
    Shift(ShiftDirection),
    Brake(bool),
    /// W key held
    Forward(bool),
    /// S key held
    Reverse(bool),
    /// Keyboard steer in [-1, 1]
    Steer(f32),
    /// Steering wheel keys, -1 / 0 / +1
    Turn(f32),
    Speed(String),
    StopSpeed,
    Headlight,
    Beam,
    Left,
    Right,
    Hazard,
    WiperLow,
    WiperHigh,
    WiperAuto,
    Door(Door),
    DoorSend,
    Angle(String),
    Status,
    Ports,
    Help,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("Missing argument for '{0}'")]
    MissingArgument(&'static str),

    #[error("Invalid argument '{arg}' for '{command}'")]
    InvalidArgument { command: &'static str, arg: String },
}

pub const HELP: &str = "\
select <menu>        toggle a menu (Headlight, Gear, Door, ...)
clear                clear the selection
gear up|down         shift toward P / toward B (also: up, down)
brake on|off         hold or release the brake
w on|off, s on|off   hold or release forward / reverse
steer <-1..1>        keyboard steer
turn <-1|0|1>        turn the steering wheel
speed <0-255>|off    set or cancel the target speed
headlight | beam     lights on/off, low/high beam
left | right | hazard
wiper low|high|auto
door fl|rl|fr|rr|tail|send
angle <deg>          send a steering wheel angle
status | ports | help | quit";

fn invalid(command: &'static str, arg: &str) -> CommandError {
    CommandError::InvalidArgument {
        command,
        arg: arg.to_string(),
    }
}

fn on_off(command: &'static str, arg: Option<&str>) -> Result<bool, CommandError> {
    match arg.map(|a| a.to_ascii_lowercase()).as_deref() {
        Some("on") | Some("1") => Ok(true),
        Some("off") | Some("0") => Ok(false),
        Some(other) => Err(invalid(command, other)),
        None => Err(CommandError::MissingArgument(command)),
    }
}

fn axis(command: &'static str, arg: Option<&str>) -> Result<f32, CommandError> {
    let arg = arg.ok_or(CommandError::MissingArgument(command))?;
    let value: f32 = arg.parse().map_err(|_| invalid(command, arg))?;
    if !(-1.0..=1.0).contains(&value) {
        return Err(invalid(command, arg));
    }
    Ok(value)
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let mut words = line.split_whitespace();
    let head = words.next().ok_or(CommandError::Empty)?.to_ascii_lowercase();
    let rest: Vec<&str> = words.collect();
    let arg = rest.first().copied();

    let command = match head.as_str() {
        "select" => {
            if rest.is_empty() {
                return Err(CommandError::MissingArgument("select"));
            }
            // menu names may contain spaces ("Windshield Wiper")
            Command::Select(rest.join(" "))
        }
        "clear" => Command::ClearSelection,
        "up" => Command::Shift(ShiftDirection::Up),
        "down" => Command::Shift(ShiftDirection::Down),
        "gear" => match arg.map(|a| a.to_ascii_lowercase()).as_deref() {
            Some("up") => Command::Shift(ShiftDirection::Up),
            Some("down") => Command::Shift(ShiftDirection::Down),
            Some(other) => return Err(invalid("gear", other)),
            None => return Err(CommandError::MissingArgument("gear")),
        },
        "brake" => Command::Brake(on_off("brake", arg)?),
        "w" => Command::Forward(on_off("w", arg)?),
        "s" => Command::Reverse(on_off("s", arg)?),
        "steer" => Command::Steer(axis("steer", arg)?),
        "turn" => Command::Turn(axis("turn", arg)?),
        "speed" => match arg {
            Some(a) if a.eq_ignore_ascii_case("off") => Command::StopSpeed,
            Some(a) => Command::Speed(a.to_string()),
            None => return Err(CommandError::MissingArgument("speed")),
        },
        "headlight" => Command::Headlight,
        "beam" => Command::Beam,
        "left" => Command::Left,
        "right" => Command::Right,
        "hazard" => Command::Hazard,
        "wiper" => match arg.map(|a| a.to_ascii_lowercase()).as_deref() {
            Some("low") => Command::WiperLow,
            Some("high") => Command::WiperHigh,
            Some("auto") => Command::WiperAuto,
            Some(other) => return Err(invalid("wiper", other)),
            None => return Err(CommandError::MissingArgument("wiper")),
        },
        "door" => match arg.map(|a| a.to_ascii_lowercase()).as_deref() {
            Some("fl") => Command::Door(Door::FrontLeft),
            Some("rl") => Command::Door(Door::RearLeft),
            Some("fr") => Command::Door(Door::FrontRight),
            Some("rr") => Command::Door(Door::RearRight),
            Some("tail") | Some("tailgate") => Command::Door(Door::Tailgate),
            Some("send") => Command::DoorSend,
            Some(other) => return Err(invalid("door", other)),
            None => return Err(CommandError::MissingArgument("door")),
        },
        "angle" => Command::Angle(
            arg.ok_or(CommandError::MissingArgument("angle"))?
                .to_string(),
        ),
        "status" => Command::Status,
        "ports" => Command::Ports,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => return Err(CommandError::Unknown(head)),
    };
    Ok(command)
}
