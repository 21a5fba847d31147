// Drivetrain control core
//
// Provides:
// - Motor group abstraction (N controllers acting as one logical actuator)
// - Signal conditioning (dead-band, saturation, arcade mixing)
// - Directional align state machine (autonomous turn to a cardinal heading)
// - Directional inching (fixed-duration nudges)
// - The per-tick drive control sequence tying them together

mod align;
mod conditioner;
mod drivetrain;
mod group;
mod inch;

pub use align::{AlignConfig, DirectionalAlign, TurnDirection};
pub use conditioner::{limit, mix, trim};
pub use drivetrain::Drivetrain;
pub use group::{CoordinationMode, FeedbackSensor, GroupError, MotorGroup, MAX_MOTORS};
pub use inch::{InchConfig, InchingDrive};

/// Logical percent-output commands for the two drive sides
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SideSpeeds {
    pub left: f64,
    pub right: f64,
}

impl SideSpeeds {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::group::{CoordinationMode, MotorGroup};
    use crate::hw::{MotorController, NeutralMode};

    /// Records every call so tests can assert on what the group actually
    /// sent to the hardware.
    pub struct MockController {
        pub id: u16,
        pub outputs: Vec<f64>,
        pub followed: Option<u16>,
        pub neutral: Option<NeutralMode>,
        pub position: i32,
    }

    impl MockController {
        pub fn new(id: u16) -> Self {
            Self {
                id,
                outputs: Vec::new(),
                followed: None,
                neutral: None,
                position: 0,
            }
        }

        pub fn last_output(&self) -> Option<f64> {
            self.outputs.last().copied()
        }
    }

    impl MotorController for MockController {
        fn id(&self) -> u16 {
            self.id
        }

        fn set_output(&mut self, percent: f64) {
            self.outputs.push(percent);
        }

        fn set_neutral_mode(&mut self, mode: NeutralMode) {
            self.neutral = Some(mode);
        }

        fn follow(&mut self, primary_id: u16) {
            self.followed = Some(primary_id);
        }

        fn sensor_position(&mut self) -> i32 {
            self.position
        }

        fn set_sensor_position(&mut self, ticks: i32) {
            self.position = ticks;
        }
    }

    /// Single-motor left/right groups, the common fixture for align, inch
    /// and drivetrain tests.
    pub fn side_groups() -> (MotorGroup<MockController>, MotorGroup<MockController>) {
        let left = MotorGroup::new(1, 1, CoordinationMode::Independent, None, MockController::new);
        let right = MotorGroup::new(1, 3, CoordinationMode::Independent, None, MockController::new);
        (left, right)
    }
}
