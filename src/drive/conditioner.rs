// Input conditioning for manual drive
//
// Pure functions: dead-band trim, saturation, and the arcade mixing
// equations turning (x, y) stick input into per-side commands.

use crate::config::{
    DRIVE_MOTOR_LOWER_LIMIT, DRIVE_MOTOR_UPPER_LIMIT, LEFT_DRIVE_FORWARD_SCALAR,
    RIGHT_DRIVE_FORWARD_SCALAR,
};

use super::SideSpeeds;

/// Clamp small values to zero. Returns 0 when `lower < value < upper`
/// (bounds exclusive), otherwise the value unchanged. Suppresses joystick
/// noise and drift near center so the robot drives straight.
pub fn trim(value: f64, upper: f64, lower: f64) -> f64 {
    if value < upper && value > lower {
        0.0
    } else {
        value
    }
}

/// Saturate `value` into `[lower, upper]`
pub fn limit(value: f64, upper: f64, lower: f64) -> f64 {
    if value > upper {
        upper
    } else if value < lower {
        lower
    } else {
        value
    }
}

/// Arcade-mix trimmed stick input into per-side commands.
///
/// `y` positive is forward, `x` positive is a right turn. The side scalars
/// fold in the mirrored mounting of the right gearbox; both outputs saturate
/// at the drive motor limits.
pub fn mix(x: f64, y: f64) -> SideSpeeds {
    SideSpeeds {
        left: limit(
            (y + x) * LEFT_DRIVE_FORWARD_SCALAR,
            DRIVE_MOTOR_UPPER_LIMIT,
            DRIVE_MOTOR_LOWER_LIMIT,
        ),
        right: limit(
            (y - x) * RIGHT_DRIVE_FORWARD_SCALAR,
            DRIVE_MOTOR_UPPER_LIMIT,
            DRIVE_MOTOR_LOWER_LIMIT,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_zeroes_inside_the_dead_band() {
        assert_eq!(trim(0.05, 0.1, -0.1), 0.0);
        assert_eq!(trim(-0.05, 0.1, -0.1), 0.0);
        assert_eq!(trim(0.0, 0.1, -0.1), 0.0);
    }

    #[test]
    fn trim_passes_values_at_or_past_the_bounds() {
        assert_eq!(trim(0.1, 0.1, -0.1), 0.1);
        assert_eq!(trim(-0.1, 0.1, -0.1), -0.1);
        assert_eq!(trim(0.5, 0.1, -0.1), 0.5);
        assert_eq!(trim(-0.9, 0.1, -0.1), -0.9);
    }

    #[test]
    fn limit_saturates() {
        assert_eq!(limit(1.7, 1.0, -1.0), 1.0);
        assert_eq!(limit(-1.7, 1.0, -1.0), -1.0);
        assert_eq!(limit(0.3, 1.0, -1.0), 0.3);
    }

    #[test]
    fn mix_is_deterministic() {
        for &(x, y) in &[(0.0, 0.0), (0.3, -0.7), (-1.0, 1.0), (0.25, 0.25)] {
            let a = mix(trim(x, 0.1, -0.1), trim(y, 0.1, -0.1));
            let b = mix(trim(x, 0.1, -0.1), trim(y, 0.1, -0.1));
            assert_eq!(a, b);
        }
    }

    #[test]
    fn full_forward_drives_both_sides_forward() {
        let speeds = mix(0.0, 1.0);
        // Right side is mirrored: forward is a negative command
        assert_eq!(speeds.left, 1.0);
        assert_eq!(speeds.right, -1.0);
    }

    #[test]
    fn right_turn_mirrors_the_sides() {
        let speeds = mix(1.0, 0.0);
        assert_eq!(speeds.left, 1.0);
        assert_eq!(speeds.right, 1.0);
    }

    #[test]
    fn mix_saturates_combined_input() {
        let speeds = mix(1.0, 1.0);
        assert_eq!(speeds.left, 1.0);
        assert_eq!(speeds.right, 0.0);
    }

    #[test]
    fn centered_sticks_are_quiet() {
        assert_eq!(mix(0.0, 0.0), SideSpeeds::zero());
    }
}
