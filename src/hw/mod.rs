// Hardware abstraction for the drivetrain core
//
// The core never talks to a transport directly: it is written against these
// traits, and the runtime binary decides what stands behind them (the CAN
// bridge, or the logging stand-ins for bench runs without a robot).

pub mod canlink;

use tracing::{debug, info};

/// Behavior of a speed controller when commanded to zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeutralMode {
    Brake,
    Coast,
}

/// One physical speed controller.
///
/// Calls are infallible by contract: the drivetrain core assumes writes are
/// accepted and reads always return a value, possibly a stale one.
/// Implementations own transport faults (log and carry on).
pub trait MotorController {
    /// Bus address of this controller
    fn id(&self) -> u16;

    /// Command percent output in [-1, 1]
    fn set_output(&mut self, percent: f64);

    /// Select brake or coast behavior at zero output
    fn set_neutral_mode(&mut self, mode: NeutralMode);

    /// Hardware-link this controller to mirror the given primary. Once
    /// followed, the controller tracks the primary inside the bus itself and
    /// must not receive direct output commands.
    fn follow(&mut self, primary_id: u16);

    /// Position of the feedback sensor wired to this controller, in ticks
    fn sensor_position(&mut self) -> i32;

    /// Overwrite the feedback sensor position (0 to tare)
    fn set_sensor_position(&mut self, ticks: i32);
}

/// Heading feedback in degrees [0, 360); every call forces a fresh read.
pub trait HeadingSensor {
    fn heading_degrees(&mut self) -> f64;
}

/// Stand-in controller for running the loop without hardware (`--no-motors`);
/// logs every command instead of sending it.
pub struct LoggedMotorController {
    id: u16,
}

impl LoggedMotorController {
    pub fn new(id: u16) -> Self {
        info!("Motor {} running without hardware", id);
        Self { id }
    }
}

impl MotorController for LoggedMotorController {
    fn id(&self) -> u16 {
        self.id
    }

    fn set_output(&mut self, percent: f64) {
        debug!("Motor {}: output {:.3}", self.id, percent);
    }

    fn set_neutral_mode(&mut self, mode: NeutralMode) {
        debug!("Motor {}: neutral mode {:?}", self.id, mode);
    }

    fn follow(&mut self, primary_id: u16) {
        info!("Motor {}: following {}", self.id, primary_id);
    }

    fn sensor_position(&mut self) -> i32 {
        0
    }

    fn set_sensor_position(&mut self, ticks: i32) {
        debug!("Motor {}: sensor position set to {}", self.id, ticks);
    }
}

/// Constant-heading stand-in for bench runs without a gyro
pub struct FixedHeading(pub f64);

impl HeadingSensor for FixedHeading {
    fn heading_degrees(&mut self) -> f64 {
        self.0
    }
}
