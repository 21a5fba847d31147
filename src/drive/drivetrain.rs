// Per-tick drive control sequence
//
// Ordering per tick: an active (or starting) align owns the drivetrain and
// manual input is ignored outright; otherwise an inch, if requested, handles
// the whole tick; otherwise operator stick input is conditioned, mixed and
// applied. Exactly one path commands the motors on any tick.

use crate::config::{
    DRIVE_MOTOR_LOWER_LIMIT, DRIVE_MOTOR_UPPER_LIMIT, JOYSTICK_TRIM_LOWER_LIMIT,
    JOYSTICK_TRIM_UPPER_LIMIT,
};
use crate::hw::MotorController;
use crate::messages::{DriveActuation, DriveMode, OperatorCommand};

use super::{conditioner, AlignConfig, DirectionalAlign, InchConfig, InchingDrive, MotorGroup};

/// The drivetrain: both side groups plus the align and inch machinery.
///
/// Everything is injected at construction; nothing here reaches for process
/// globals, so tests and autonomous sequencers hand in their own groups.
pub struct Drivetrain<C: MotorController> {
    left: MotorGroup<C>,
    right: MotorGroup<C>,
    align: DirectionalAlign,
    inch: InchingDrive,
}

impl<C: MotorController> Drivetrain<C> {
    pub fn new(
        left: MotorGroup<C>,
        right: MotorGroup<C>,
        align_config: AlignConfig,
        inch_config: InchConfig,
    ) -> Self {
        Self {
            left,
            right,
            align: DirectionalAlign::new(align_config),
            inch: InchingDrive::new(inch_config),
        }
    }

    /// Run one control tick and report what was commanded
    pub fn tick(&mut self, cmd: &OperatorCommand, heading: f64) -> DriveActuation {
        // Align first; while it is active, manual input is not consulted
        if self.align.tick(cmd.pov, heading, &mut self.left, &mut self.right) {
            return self.actuation(DriveMode::Aligning);
        }

        // An inch handles the whole tick when a button is held
        if self.inch.tick(cmd.inch, &mut self.left, &mut self.right) {
            return self.actuation(DriveMode::Inching);
        }

        let x = conditioner::trim(cmd.x_axis, JOYSTICK_TRIM_UPPER_LIMIT, JOYSTICK_TRIM_LOWER_LIMIT);
        let y = conditioner::trim(cmd.y_axis, JOYSTICK_TRIM_UPPER_LIMIT, JOYSTICK_TRIM_LOWER_LIMIT);
        let speeds = conditioner::mix(x, y);

        debug_assert!(speeds.left <= DRIVE_MOTOR_UPPER_LIMIT && speeds.left >= DRIVE_MOTOR_LOWER_LIMIT);
        debug_assert!(speeds.right <= DRIVE_MOTOR_UPPER_LIMIT && speeds.right >= DRIVE_MOTOR_LOWER_LIMIT);

        self.left.set(speeds.left);
        self.right.set(speeds.right);

        self.actuation(DriveMode::Manual)
    }

    fn actuation(&self, mode: DriveMode) -> DriveActuation {
        DriveActuation {
            left: self.left.last_command(),
            right: self.right.last_command(),
            mode,
        }
    }

    /// Whether a directional align is in progress
    pub fn is_aligning(&self) -> bool {
        self.align.is_active()
    }

    pub fn set_brake_mode(&mut self) {
        self.left.set_brake_mode();
        self.right.set_brake_mode();
    }

    pub fn set_coast_mode(&mut self) {
        self.left.set_coast_mode();
        self.right.set_coast_mode();
    }

    /// Stop both sides immediately
    pub fn stop(&mut self) {
        self.left.set(0.0);
        self.right.set(0.0);
    }

    pub fn left(&self) -> &MotorGroup<C> {
        &self.left
    }

    pub fn right(&self) -> &MotorGroup<C> {
        &self.right
    }
}
