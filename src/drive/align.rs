// Directional align state machine
//
// Autonomously rotates the robot to the nearest cardinal heading (0, 90,
// 180, 270) in response to a POV press, choosing the shorter turn direction.
// Non-blocking: the machine advances one control tick at a time, so it needs
// the rising-edge latch and a safety timer instead of a simple loop.
//
// Headings follow the gyro's convention:
//
//     0
//     |
// 270---90
//     |
//    180

use std::time::Instant;

use tracing::{debug, info};

use crate::config::{
    DIRECTIONAL_ALIGN_DRIVE_SPEED, DIRECTIONAL_ALIGN_MAX_TIME,
    DIRECTIONAL_ALIGN_TOLERANCE_DEGREES, LEFT_DRIVE_FORWARD_SCALAR, LEFT_DRIVE_REVERSE_SCALAR,
    RIGHT_DRIVE_FORWARD_SCALAR, RIGHT_DRIVE_REVERSE_SCALAR,
};
use crate::hw::MotorController;
use crate::messages::POV_NONE;

use super::MotorGroup;

/// The POV diagonals split the four sectors; shifting by 45 puts the
/// up-left diagonal at zero so integer division yields the sector.
const POV_NORMALIZATION_ANGLE: i16 = 45;

/// Which way the robot rotates to reach the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    fn opposite(self) -> Self {
        match self {
            TurnDirection::Left => TurnDirection::Right,
            TurnDirection::Right => TurnDirection::Left,
        }
    }
}

/// Tuning for the align maneuver
#[derive(Debug, Clone, Copy)]
pub struct AlignConfig {
    /// Fixed percent output applied to both sides while turning
    pub drive_speed: f64,
    /// Safety deadline; expiry abandons the turn, it is never retried
    pub max_duration: std::time::Duration,
    /// Heading band around the destination that counts as aligned
    pub tolerance_degrees: f64,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            drive_speed: DIRECTIONAL_ALIGN_DRIVE_SPEED,
            max_duration: DIRECTIONAL_ALIGN_MAX_TIME,
            tolerance_degrees: DIRECTIONAL_ALIGN_TOLERANCE_DEGREES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriveState {
    ManualControl,
    DirectionalAlign,
}

/// Map a pressed POV reading to the cardinal destination it selects
fn destination_from_pov(pov: i16) -> f64 {
    // Shift so the up-left diagonal maps to 0, then wrap back into [0, 360)
    let mut normalized = pov + POV_NORMALIZATION_ANGLE;
    if normalized >= 360 {
        normalized -= 360;
    }

    // Integer division is deliberate: sector index 0..=3, times 90
    let sector = normalized / 90;
    f64::from(sector * 90)
}

/// Choose the turn direction for the signed heading error.
///
/// Positive error means the destination is to the robot's left; more than
/// half a revolution means the other way around is shorter. An error of
/// exactly 180 resolves to a left turn without inversion.
fn turn_for(angle_distance: f64) -> TurnDirection {
    let direction = if angle_distance > 0.0 {
        TurnDirection::Left
    } else {
        TurnDirection::Right
    };

    if angle_distance.abs() > 180.0 {
        direction.opposite()
    } else {
        direction
    }
}

/// State machine cycling between manual control and an active align for the
/// lifetime of the robot.
pub struct DirectionalAlign {
    config: AlignConfig,
    state: DriveState,
    last_pov: i16,
    /// Rising-edge latch: true exactly when the POV went from released to
    /// pressed, forced false on entering an align and on release.
    state_change_allowed: bool,
    destination_angle: f64,
    started: Option<Instant>,
}

impl DirectionalAlign {
    pub fn new(config: AlignConfig) -> Self {
        Self {
            config,
            state: DriveState::ManualControl,
            last_pov: POV_NONE,
            state_change_allowed: false,
            destination_angle: 0.0,
            started: None,
        }
    }

    /// Whether an align is in progress; the caller must not apply manual
    /// drive input while this is true.
    pub fn is_active(&self) -> bool {
        self.state == DriveState::DirectionalAlign
    }

    /// Advance the machine one control tick.
    ///
    /// `pov` is [`POV_NONE`] or a compass angle in [0, 360); `heading` is a
    /// fresh gyro reading in degrees. Returns whether an align is active
    /// after this tick.
    pub fn tick<C: MotorController>(
        &mut self,
        pov: i16,
        heading: f64,
        left: &mut MotorGroup<C>,
        right: &mut MotorGroup<C>,
    ) -> bool {
        // Maintain the rising-edge latch. Changes between two pressed
        // directions do not matter.
        if pov != self.last_pov {
            if pov == POV_NONE {
                self.state_change_allowed = false;
            } else if self.last_pov == POV_NONE {
                self.state_change_allowed = true;
            }
        }
        self.last_pov = pov;

        match self.state {
            DriveState::ManualControl => {
                if self.state_change_allowed {
                    self.start_align(pov, heading, left, right);
                }
            }
            DriveState::DirectionalAlign => {
                // Three conditions end the align:
                // 1. Destination heading reached
                // 2. Safety timer expired (turn abandoned, not retried)
                // 3. Operator released and pressed again (cancel)
                //
                // The tolerance check does not wrap at 0/360, so approaching
                // zero from 359 only terminates via the safety timer.
                let aligned =
                    (heading - self.destination_angle).abs() <= self.config.tolerance_degrees;
                let expired = self
                    .started
                    .is_none_or(|started| started.elapsed() > self.config.max_duration);

                if aligned || expired || self.state_change_allowed {
                    if aligned {
                        info!("Align done at {:.1} deg", heading);
                    } else if self.state_change_allowed {
                        info!("Align cancelled by operator");
                    } else {
                        info!(
                            "Align to {:.0} deg abandoned after {:?}",
                            self.destination_angle, self.config.max_duration
                        );
                    }

                    left.set(0.0);
                    right.set(0.0);

                    self.started = None;
                    self.destination_angle = 0.0;
                    self.state_change_allowed = false;
                    self.state = DriveState::ManualControl;
                }
            }
        }

        self.is_active()
    }

    fn start_align<C: MotorController>(
        &mut self,
        pov: i16,
        heading: f64,
        left: &mut MotorGroup<C>,
        right: &mut MotorGroup<C>,
    ) {
        self.destination_angle = destination_from_pov(pov);

        let angle_distance = heading - self.destination_angle;
        let turn = turn_for(angle_distance);
        debug!(
            "Heading {:.1}, destination {:.0}, distance {:.1}",
            heading, self.destination_angle, angle_distance
        );
        info!(
            "Aligning to {:.0} deg, turning {:?}",
            self.destination_angle, turn
        );

        // The sides are commanded once here and run until an exit condition
        // stops them.
        let speed = self.config.drive_speed;
        match turn {
            TurnDirection::Left => {
                left.set(speed * LEFT_DRIVE_REVERSE_SCALAR);
                right.set(speed * RIGHT_DRIVE_FORWARD_SCALAR);
            }
            TurnDirection::Right => {
                left.set(speed * LEFT_DRIVE_FORWARD_SCALAR);
                right.set(speed * RIGHT_DRIVE_REVERSE_SCALAR);
            }
        }

        self.started = Some(Instant::now());
        // A held POV must not re-trigger once this align ends
        self.state_change_allowed = false;
        self.state = DriveState::DirectionalAlign;
    }
}
