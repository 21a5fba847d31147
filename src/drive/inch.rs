// Directional inching
//
// Fixed-speed, fixed-duration nudge in one of four directions. Deliberately
// blocking: once triggered, the calling tick stalls for the configured
// duration and cannot be cancelled. The duration is kept in the tens of
// milliseconds so the control loop's watchdog never sees it as a stall.

use std::thread;
use std::time::Duration;

use tracing::info;

use crate::config::{
    INCHING_DRIVE_DELAY, INCHING_DRIVE_SPEED, LEFT_DRIVE_FORWARD_SCALAR,
    LEFT_DRIVE_REVERSE_SCALAR, RIGHT_DRIVE_FORWARD_SCALAR, RIGHT_DRIVE_REVERSE_SCALAR,
};
use crate::hw::MotorController;
use crate::messages::InchButtons;

use super::{MotorGroup, SideSpeeds};

/// Tuning for the inching maneuver
#[derive(Debug, Clone, Copy)]
pub struct InchConfig {
    /// Percent output applied to both sides during the nudge
    pub drive_speed: f64,
    /// How long the nudge runs; also how long the control loop stalls
    pub duration: Duration,
}

impl Default for InchConfig {
    fn default() -> Self {
        Self {
            drive_speed: INCHING_DRIVE_SPEED,
            duration: INCHING_DRIVE_DELAY,
        }
    }
}

pub struct InchingDrive {
    config: InchConfig,
}

impl InchingDrive {
    pub fn new(config: InchConfig) -> Self {
        Self { config }
    }

    /// Run one inch if a button is held.
    ///
    /// Returns `false` immediately when no button is active. Otherwise
    /// commands both sides, sleeps for the configured duration, commands
    /// both sides off and returns `true` — the caller's tick is over.
    pub fn tick<C: MotorController>(
        &mut self,
        buttons: InchButtons,
        left: &mut MotorGroup<C>,
        right: &mut MotorGroup<C>,
    ) -> bool {
        let speed = self.config.drive_speed;

        // First pressed button wins, in this order
        let speeds = if buttons.forward {
            SideSpeeds::new(
                speed * LEFT_DRIVE_FORWARD_SCALAR,
                speed * RIGHT_DRIVE_FORWARD_SCALAR,
            )
        } else if buttons.reverse {
            SideSpeeds::new(
                speed * LEFT_DRIVE_REVERSE_SCALAR,
                speed * RIGHT_DRIVE_REVERSE_SCALAR,
            )
        } else if buttons.left {
            SideSpeeds::new(
                speed * LEFT_DRIVE_REVERSE_SCALAR,
                speed * RIGHT_DRIVE_FORWARD_SCALAR,
            )
        } else if buttons.right {
            SideSpeeds::new(
                speed * LEFT_DRIVE_FORWARD_SCALAR,
                speed * RIGHT_DRIVE_REVERSE_SCALAR,
            )
        } else {
            return false;
        };

        info!(
            "Inching: left {:.2}, right {:.2} for {:?}",
            speeds.left, speeds.right, self.config.duration
        );

        left.set(speeds.left);
        right.set(speeds.right);

        // Bounded synchronous stall, accepted by design
        thread::sleep(self.config.duration);

        left.set(0.0);
        right.set(0.0);

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::testing::side_groups;

    fn inch() -> InchingDrive {
        // Zero duration keeps the tests instant; the blocking behavior is
        // the same code path.
        InchingDrive::new(InchConfig {
            drive_speed: INCHING_DRIVE_SPEED,
            duration: Duration::ZERO,
        })
    }

    #[test]
    fn no_buttons_reports_no_action() {
        let (mut left, mut right) = side_groups();
        let handled = inch().tick(InchButtons::default(), &mut left, &mut right);

        assert!(!handled);
        assert!(left.primary().outputs.is_empty());
        assert!(right.primary().outputs.is_empty());
    }

    #[test]
    fn forward_inch_commands_then_stops() {
        let (mut left, mut right) = side_groups();
        let buttons = InchButtons {
            forward: true,
            ..InchButtons::default()
        };

        assert!(inch().tick(buttons, &mut left, &mut right));
        assert_eq!(
            left.primary().outputs,
            vec![INCHING_DRIVE_SPEED * LEFT_DRIVE_FORWARD_SCALAR, 0.0]
        );
        assert_eq!(
            right.primary().outputs,
            vec![INCHING_DRIVE_SPEED * RIGHT_DRIVE_FORWARD_SCALAR, 0.0]
        );
    }

    #[test]
    fn strafe_left_mirrors_the_sides() {
        let (mut left, mut right) = side_groups();
        let buttons = InchButtons {
            left: true,
            ..InchButtons::default()
        };

        assert!(inch().tick(buttons, &mut left, &mut right));
        assert_eq!(
            left.primary().outputs[0],
            INCHING_DRIVE_SPEED * LEFT_DRIVE_REVERSE_SCALAR
        );
        assert_eq!(
            right.primary().outputs[0],
            INCHING_DRIVE_SPEED * RIGHT_DRIVE_FORWARD_SCALAR
        );
    }

    #[test]
    fn forward_wins_over_other_buttons() {
        let (mut left, mut right) = side_groups();
        let buttons = InchButtons {
            forward: true,
            reverse: true,
            left: true,
            right: true,
        };

        assert!(inch().tick(buttons, &mut left, &mut right));
        assert_eq!(
            left.primary().outputs[0],
            INCHING_DRIVE_SPEED * LEFT_DRIVE_FORWARD_SCALAR
        );
    }
}
