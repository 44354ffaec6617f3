//! Line-oriented commands read from stdin.
//!
//! ```text
//! presence <room> on|off [profile]
//! override manual|switchcraft|tap <intensity>|smart [ttl_secs]
//! toggle [manual|switchcraft|tap]
//! clear
//! enable | disable
//! forget <slot>
//! tick
//! status
//! ```

use std::str::FromStr;

use smartswitch_app::switch_controller::SwitchInput;
use smartswitch_domain::behaviour::Intensity;
use smartswitch_domain::id::{ProfileId, SlotId};
use smartswitch_domain::overrides::{OverrideIntensity, OverrideRequest, OverrideSource};
use smartswitch_domain::room::RoomId;

/// A parsed command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Input(SwitchInput),
    /// Empty a behaviour slot.
    Forget(SlotId),
    Status,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("missing argument `{0}`")]
    MissingArgument(&'static str),
    #[error("invalid {name} `{value}`")]
    InvalidArgument { name: &'static str, value: String },
}

fn argument<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    name: &'static str,
) -> Result<&'a str, CommandError> {
    parts.next().ok_or(CommandError::MissingArgument(name))
}

fn parse<T: FromStr>(value: &str, name: &'static str) -> Result<T, CommandError> {
    value.parse().map_err(|_| CommandError::InvalidArgument {
        name,
        value: value.to_string(),
    })
}

fn parse_source(value: &str) -> Result<OverrideSource, CommandError> {
    match value {
        "manual" => Ok(OverrideSource::Manual),
        "switchcraft" => Ok(OverrideSource::Switchcraft),
        "tap" | "tap_to_toggle" => Ok(OverrideSource::TapToToggle),
        other => Err(CommandError::InvalidArgument {
            name: "source",
            value: other.to_string(),
        }),
    }
}

fn parse_room(value: &str) -> Result<RoomId, CommandError> {
    parse::<u8>(value, "room")
        .ok()
        .and_then(|index| RoomId::new(index).ok())
        .ok_or_else(|| CommandError::InvalidArgument {
            name: "room",
            value: value.to_string(),
        })
}

fn parse_target(value: &str) -> Result<OverrideIntensity, CommandError> {
    if value == "smart" {
        return Ok(OverrideIntensity::SmartOn);
    }
    parse::<u8>(value, "intensity")
        .ok()
        .and_then(|raw| Intensity::new(raw).ok())
        .map(OverrideIntensity::Fixed)
        .ok_or_else(|| CommandError::InvalidArgument {
            name: "intensity",
            value: value.to_string(),
        })
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let name = argument(&mut parts, "command")?;
        let command = match name {
            "presence" => {
                let room = parse_room(argument(&mut parts, "room")?)?;
                let present = match argument(&mut parts, "on|off")? {
                    "on" => true,
                    "off" => false,
                    other => {
                        return Err(CommandError::InvalidArgument {
                            name: "presence",
                            value: other.to_string(),
                        });
                    }
                };
                let profile = parts
                    .next()
                    .map(|value| parse::<ProfileId>(value, "profile"))
                    .transpose()?
                    .unwrap_or_default();
                Self::Input(SwitchInput::PresenceObserved {
                    room,
                    profile,
                    present,
                })
            }
            "override" => {
                let source = parse_source(argument(&mut parts, "source")?)?;
                let target = parse_target(argument(&mut parts, "intensity")?)?;
                let mut request = OverrideRequest::new(source, target);
                if let Some(ttl) = parts.next() {
                    let secs: u32 = parse(ttl, "ttl")?;
                    request = request.with_ttl(chrono::Duration::seconds(i64::from(secs)));
                }
                Self::Input(SwitchInput::OverrideRequested(request))
            }
            "toggle" => {
                let source = parts
                    .next()
                    .map(parse_source)
                    .transpose()?
                    .unwrap_or(OverrideSource::TapToToggle);
                Self::Input(SwitchInput::ToggleRequested { source })
            }
            "clear" => Self::Input(SwitchInput::OverrideCleared),
            "enable" => Self::Input(SwitchInput::BehaviourEnabled(true)),
            "disable" => Self::Input(SwitchInput::BehaviourEnabled(false)),
            "forget" => Self::Forget(parse(argument(&mut parts, "slot")?, "slot")?),
            "tick" => Self::Input(SwitchInput::Tick),
            "status" => Self::Status,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}
