// Message types for the runtime: the command vocabulary arriving over
// zenoh (plain text words) and the state messages published back out
// (JSON via serde).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One word of the command vocabulary. Movement commands carry a step
/// count; the bare word means one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GaitCommand {
    Forward(u8),
    Back(u8),
    Left(u8),
    Right(u8),
    Faster,
    Slower,
    More,
    Less,
    Higher,
    Lower,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised command: {0:?}")]
pub struct ParseCommandError(pub String);

impl FromStr for GaitCommand {
    type Err = ParseCommandError;

    /// Parse a command word with an optional step count, e.g. `forward`
    /// or `forward 3`. An unparsable count falls back to 1 rather than
    /// rejecting the whole command.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.trim().split_whitespace();

        let word = tokens.next().ok_or_else(|| ParseCommandError(s.into()))?;
        let steps = tokens
            .next()
            .map(|t| t.parse::<u8>().unwrap_or(1).max(1))
            .unwrap_or(1);

        match word {
            "forward" => Ok(GaitCommand::Forward(steps)),
            "back" => Ok(GaitCommand::Back(steps)),
            "left" => Ok(GaitCommand::Left(steps)),
            "right" => Ok(GaitCommand::Right(steps)),
            "faster" => Ok(GaitCommand::Faster),
            "slower" => Ok(GaitCommand::Slower),
            "more" => Ok(GaitCommand::More),
            "less" => Ok(GaitCommand::Less),
            "higher" => Ok(GaitCommand::Higher),
            "lower" => Ok(GaitCommand::Lower),
            "stop" => Ok(GaitCommand::Stop),
            _ => Err(ParseCommandError(s.into())),
        }
    }
}

/// Joint angles published after every emitted frame, in degrees,
/// `angles[leg] = [coxa, femur, tibia]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointState {
    pub angles: [[f32; 3]; 6],
}

impl From<&[crate::kinematics::JointAngles; 6]> for JointState {
    fn from(angles: &[crate::kinematics::JointAngles; 6]) -> Self {
        Self {
            angles: angles.map(|a| a.as_array()),
        }
    }
}

/// Health status published by the runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Idle,
    Walking,
    Fault,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_words() {
        assert_eq!("stop".parse(), Ok(GaitCommand::Stop));
        assert_eq!("faster".parse(), Ok(GaitCommand::Faster));
        assert_eq!("lower".parse(), Ok(GaitCommand::Lower));
        assert_eq!("forward".parse(), Ok(GaitCommand::Forward(1)));
    }

    #[test]
    fn parse_step_counts() {
        assert_eq!("forward 3".parse(), Ok(GaitCommand::Forward(3)));
        assert_eq!("left 2".parse(), Ok(GaitCommand::Left(2)));
        // junk count falls back to one step
        assert_eq!("back x".parse(), Ok(GaitCommand::Back(1)));
        // zero steps would be a no-op command; bump to one
        assert_eq!("right 0".parse(), Ok(GaitCommand::Right(1)));
    }

    #[test]
    fn parse_trims_whitespace() {
        assert_eq!("  stop \n".parse(), Ok(GaitCommand::Stop));
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!("dance".parse::<GaitCommand>().is_err());
        assert!("".parse::<GaitCommand>().is_err());
    }
}
