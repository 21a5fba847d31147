// Loop rate, topics, drive tuning and CAN addressing
use std::time::Duration;

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Operator command timeout for the watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_CMD_OPERATOR: &str = "drivebase/cmd/operator"; // operator input
pub const TOPIC_RT_DRIVE: &str = "drivebase/rt/drive"; // actuation
pub const TOPIC_HEALTH: &str = "drivebase/state/health"; // health status

// Serial port for the USB -> CAN bridge
pub const CAN_BRIDGE_PORT: &str = "/dev/ttyACM0";
pub const CAN_BRIDGE_BAUDRATE: u32 = 1_000_000;

// CAN ids: two controllers per side, ids sequential from the primary
pub const LEFT_PRIMARY_CAN_ID: u16 = 1;
pub const RIGHT_PRIMARY_CAN_ID: u16 = 3;
pub const MOTORS_PER_SIDE: usize = 2;
pub const GYRO_CAN_ID: u16 = 9;

// Joystick dead-band, straddling zero
pub const JOYSTICK_TRIM_UPPER_LIMIT: f64 = 0.1;
pub const JOYSTICK_TRIM_LOWER_LIMIT: f64 = -0.1;

// Saturation bounds for anything sent to a speed controller
pub const DRIVE_MOTOR_UPPER_LIMIT: f64 = 1.0;
pub const DRIVE_MOTOR_LOWER_LIMIT: f64 = -1.0;

// The right gearbox is mounted mirrored, so its forward scalar is negative.
pub const LEFT_DRIVE_FORWARD_SCALAR: f64 = 1.0;
pub const LEFT_DRIVE_REVERSE_SCALAR: f64 = -1.0;
pub const RIGHT_DRIVE_FORWARD_SCALAR: f64 = -1.0;
pub const RIGHT_DRIVE_REVERSE_SCALAR: f64 = 1.0;

// Directional inching: the sleep stalls the control loop for the whole
// duration, so it must stay well under CMD_TIMEOUT
pub const INCHING_DRIVE_SPEED: f64 = 0.25;
pub const INCHING_DRIVE_DELAY: Duration = Duration::from_millis(100);

// Directional align
pub const DIRECTIONAL_ALIGN_DRIVE_SPEED: f64 = 0.55;
pub const DIRECTIONAL_ALIGN_MAX_TIME: Duration = Duration::from_secs(3);
pub const DIRECTIONAL_ALIGN_TOLERANCE_DEGREES: f64 = 1.0;
