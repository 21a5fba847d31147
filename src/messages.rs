// Wire types exchanged between the operator station and the runtime

use serde::{Deserialize, Serialize};

/// POV value reported when no direction is pressed
pub const POV_NONE: i16 = -1;

/// Operator input sampled by the teleop station each tick.
///
/// Axes are normalized to [-1, 1] with y positive = forward. `pov` is
/// [`POV_NONE`] when released, otherwise a compass angle in [0, 360).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorCommand {
    pub x_axis: f64,
    pub y_axis: f64,
    pub pov: i16,
    #[serde(default)]
    pub inch: InchButtons,
}

impl Default for OperatorCommand {
    /// Neutral input: centered sticks, POV released, no buttons. This is what
    /// the watchdog substitutes when commands go stale, and releasing the POV
    /// is what cooperatively cancels an in-flight alignment.
    fn default() -> Self {
        Self {
            x_axis: 0.0,
            y_axis: 0.0,
            pov: POV_NONE,
            inch: InchButtons::default(),
        }
    }
}

/// Discrete inching buttons; at most one is honored per tick, in field order.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct InchButtons {
    pub forward: bool,
    pub reverse: bool,
    pub left: bool,
    pub right: bool,
}

impl InchButtons {
    pub fn any(&self) -> bool {
        self.forward || self.reverse || self.left || self.right
    }
}

/// Actuation snapshot published by the runtime each tick
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DriveActuation {
    pub left: f64,
    pub right: f64,
    pub mode: DriveMode,
}

/// Which path commanded the drivetrain this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveMode {
    #[default]
    Manual,
    Aligning,
    Inching,
}

/// Health status published by the runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
}
