// Motor group abstraction
//
// Lets a handful of CAN speed controllers on one gearbox act as a single
// logical actuator. The first controller is the primary; every other entry
// derives its physical command from the value handed to `set`, according to
// its coordination mode. Followers are linked inside the controllers
// themselves at wiring time, so the group never commands them in software.

use tracing::debug;

use crate::hw::{MotorController, NeutralMode};

/// Maximum number of controllers in one group
pub const MAX_MOTORS: usize = 4;

/// How a controller in a group derives its command from the primary's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinationMode {
    /// First controller in a group; its command is authoritative
    Primary,
    /// Hardware-linked to mirror the primary, never commanded in software
    Follower,
    /// Commanded with the primary's value
    Independent,
    /// Commanded with the negated value
    Inverse,
    /// Commanded with the value plus the per-call offset
    IndependentWithOffset,
    /// Commanded with the negated (value plus offset)
    InverseWithOffset,
    /// Inert until reassigned to another mode via `set_entry_mode`
    Custom,
}

/// Feedback sensor wired to the primary controller of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackSensor {
    RelativeMagEncoder,
    AbsoluteMagEncoder,
}

/// Group configuration failures; programmer errors discovered at startup,
/// not runtime recoverable conditions.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum GroupError {
    #[error("motor group is already at capacity ({MAX_MOTORS} motors)")]
    CapacityExhausted,

    #[error("no controller with id {id} in this group")]
    UnknownController { id: u16 },
}

struct MotorEntry<C> {
    controller: C,
    mode: CoordinationMode,
}

/// A group of speed controllers commanded as one logical actuator
pub struct MotorGroup<C: MotorController> {
    entries: Vec<MotorEntry<C>>,
    primary_id: u16,
    sensor: Option<FeedbackSensor>,
    last_command: f64,
}

impl<C: MotorController> MotorGroup<C> {
    /// Create a group of `count` controllers (clamped to `1..=MAX_MOTORS`)
    /// with sequential ids starting at `primary_id`. Entry 0 is always the
    /// primary; the rest get `non_primary_mode`. `make` constructs the
    /// controller handle for each id.
    ///
    /// If a sensor is given it is assumed to be wired to the primary only.
    pub fn new(
        count: usize,
        primary_id: u16,
        non_primary_mode: CoordinationMode,
        sensor: Option<FeedbackSensor>,
        mut make: impl FnMut(u16) -> C,
    ) -> Self {
        debug_assert!(
            non_primary_mode != CoordinationMode::Primary,
            "a group has exactly one primary, at index 0"
        );

        let count = count.clamp(1, MAX_MOTORS);
        let mut entries = Vec::with_capacity(count);

        for i in 0..count {
            let mode = if i == 0 {
                CoordinationMode::Primary
            } else {
                non_primary_mode
            };
            let mut controller = make(primary_id + i as u16);

            // Followers are coordinated by the controllers themselves; wire
            // the link once, here.
            if mode == CoordinationMode::Follower {
                controller.follow(primary_id);
            }

            // Always start out coasting
            controller.set_neutral_mode(NeutralMode::Coast);

            entries.push(MotorEntry { controller, mode });
        }

        Self {
            entries,
            primary_id,
            sensor,
            last_command: 0.0,
        }
    }

    /// Append another controller to the group. Its id is the primary's id
    /// plus the current motor count. Cannot add a new primary.
    pub fn add_entry(
        &mut self,
        mode: CoordinationMode,
        make: impl FnOnce(u16) -> C,
    ) -> Result<(), GroupError> {
        debug_assert!(
            mode != CoordinationMode::Primary,
            "a group has exactly one primary, at index 0"
        );

        if self.entries.len() >= MAX_MOTORS {
            return Err(GroupError::CapacityExhausted);
        }

        let id = self.primary_id + self.entries.len() as u16;
        let mut controller = make(id);
        if mode == CoordinationMode::Follower {
            controller.follow(self.primary_id);
        }
        controller.set_neutral_mode(NeutralMode::Coast);

        self.entries.push(MotorEntry { controller, mode });
        Ok(())
    }

    /// Reassign the coordination mode of an existing entry, found by
    /// controller id. Intended to resolve entries created as `Custom`.
    pub fn set_entry_mode(&mut self, id: u16, mode: CoordinationMode) -> Result<(), GroupError> {
        let primary_id = self.primary_id;
        for entry in &mut self.entries {
            if entry.controller.id() == id {
                entry.mode = mode;
                if mode == CoordinationMode::Follower {
                    entry.controller.follow(primary_id);
                }
                return Ok(());
            }
        }
        Err(GroupError::UnknownController { id })
    }

    /// Command the group with the primary's logical value
    pub fn set(&mut self, value: f64) {
        self.set_with_offset(value, 0.0);
    }

    /// Command the group; `offset` only applies to `*WithOffset` entries.
    ///
    /// Every non-follower, non-custom entry is commanded on every call;
    /// controllers are idempotent under repeated identical commands.
    pub fn set_with_offset(&mut self, value: f64, offset: f64) {
        self.last_command = value;

        for entry in &mut self.entries {
            let command = match entry.mode {
                CoordinationMode::Primary | CoordinationMode::Independent => Some(value),
                // Already hardware-linked, no software command
                CoordinationMode::Follower => None,
                CoordinationMode::Inverse => Some(-value),
                CoordinationMode::IndependentWithOffset => Some(value + offset),
                CoordinationMode::InverseWithOffset => Some(-(value + offset)),
                // Inert until reassigned via set_entry_mode
                CoordinationMode::Custom => None,
            };

            if let Some(command) = command {
                entry.controller.set_output(command);
            }
        }
    }

    /// Put every controller in the group in brake mode
    pub fn set_brake_mode(&mut self) {
        debug!("Group {}: brake mode", self.primary_id);
        for entry in &mut self.entries {
            entry.controller.set_neutral_mode(NeutralMode::Brake);
        }
    }

    /// Put every controller in the group in coast mode
    pub fn set_coast_mode(&mut self) {
        debug!("Group {}: coast mode", self.primary_id);
        for entry in &mut self.entries {
            entry.controller.set_neutral_mode(NeutralMode::Coast);
        }
    }

    /// Zero the feedback sensor. No-op when the group has no sensor; absence
    /// of a sensor is a legitimate configuration, not an error.
    pub fn tare_encoder(&mut self) {
        if self.sensor.is_some() {
            self.entries[0].controller.set_sensor_position(0);
        }
    }

    /// Feedback sensor position, or 0 when the group has no sensor
    pub fn encoder_value(&mut self) -> i32 {
        if self.sensor.is_some() {
            self.entries[0].controller.sensor_position()
        } else {
            0
        }
    }

    /// The primary's controller handle
    pub fn primary(&self) -> &C {
        &self.entries[0].controller
    }

    /// Controller handle by position in the group
    pub fn controller(&self, index: usize) -> Option<&C> {
        self.entries.get(index).map(|e| &e.controller)
    }

    /// Number of controllers in the group
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last logical value handed to `set`; used for actuation telemetry
    pub fn last_command(&self) -> f64 {
        self.last_command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::testing::MockController;

    fn make_group(count: usize, mode: CoordinationMode) -> MotorGroup<MockController> {
        MotorGroup::new(count, 10, mode, None, MockController::new)
    }

    #[test]
    fn sequential_ids_from_primary() {
        let group = make_group(3, CoordinationMode::Independent);
        assert_eq!(group.len(), 3);
        assert_eq!(group.primary().id, 10);
        assert_eq!(group.controller(1).unwrap().id, 11);
        assert_eq!(group.controller(2).unwrap().id, 12);
    }

    #[test]
    fn inverse_pair() {
        let mut group = make_group(2, CoordinationMode::Inverse);
        group.set(0.6);
        assert_eq!(group.primary().last_output(), Some(0.6));
        assert_eq!(group.controller(1).unwrap().last_output(), Some(-0.6));
    }

    #[test]
    fn inverse_pair_negative_value() {
        // count=2, primaryId=10, mode=Inverse, Set(-0.3)
        // expects CommandMotor(10, -0.3) and CommandMotor(11, 0.3)
        let mut group = make_group(2, CoordinationMode::Inverse);
        group.set(-0.3);
        assert_eq!(group.primary().last_output(), Some(-0.3));
        assert_eq!(group.controller(1).unwrap().last_output(), Some(0.3));
    }

    #[test]
    fn offset_modes() {
        let mut group = make_group(2, CoordinationMode::IndependentWithOffset);
        group.set_with_offset(0.5, 0.2);
        assert_eq!(group.primary().last_output(), Some(0.5));
        assert_eq!(group.controller(1).unwrap().last_output(), Some(0.7));

        let mut group = make_group(2, CoordinationMode::InverseWithOffset);
        group.set_with_offset(0.5, 0.2);
        assert_eq!(group.controller(1).unwrap().last_output(), Some(-0.7));
    }

    #[test]
    fn follower_is_wired_once_and_never_commanded() {
        let mut group = make_group(2, CoordinationMode::Follower);
        assert_eq!(group.controller(1).unwrap().followed, Some(10));

        group.set(0.8);
        group.set(-0.2);
        assert_eq!(group.primary().outputs, vec![0.8, -0.2]);
        assert!(group.controller(1).unwrap().outputs.is_empty());
    }

    #[test]
    fn custom_is_inert_until_reassigned() {
        let mut group = make_group(2, CoordinationMode::Custom);
        group.set(0.4);
        assert!(group.controller(1).unwrap().outputs.is_empty());

        group
            .set_entry_mode(11, CoordinationMode::Inverse)
            .unwrap();
        group.set(0.4);
        assert_eq!(group.controller(1).unwrap().last_output(), Some(-0.4));
    }

    #[test]
    fn set_entry_mode_unknown_id() {
        let mut group = make_group(2, CoordinationMode::Independent);
        assert_eq!(
            group.set_entry_mode(99, CoordinationMode::Inverse),
            Err(GroupError::UnknownController { id: 99 })
        );
    }

    #[test]
    fn capacity_is_enforced() {
        let mut group = make_group(MAX_MOTORS, CoordinationMode::Independent);
        assert_eq!(group.len(), MAX_MOTORS);

        let result = group.add_entry(CoordinationMode::Independent, MockController::new);
        assert_eq!(result, Err(GroupError::CapacityExhausted));
        assert_eq!(group.len(), MAX_MOTORS);
    }

    #[test]
    fn creation_count_clamped_to_capacity() {
        let group = make_group(10, CoordinationMode::Independent);
        assert_eq!(group.len(), MAX_MOTORS);
    }

    #[test]
    fn added_follower_gets_next_id_and_link() {
        let mut group = make_group(1, CoordinationMode::Independent);
        group
            .add_entry(CoordinationMode::Follower, MockController::new)
            .unwrap();

        let added = group.controller(1).unwrap();
        assert_eq!(added.id, 11);
        assert_eq!(added.followed, Some(10));
    }

    #[test]
    fn neutral_modes_apply_to_every_entry() {
        let mut group = make_group(3, CoordinationMode::Independent);
        group.set_brake_mode();
        for i in 0..3 {
            assert_eq!(
                group.controller(i).unwrap().neutral,
                Some(crate::hw::NeutralMode::Brake)
            );
        }

        group.set_coast_mode();
        for i in 0..3 {
            assert_eq!(
                group.controller(i).unwrap().neutral,
                Some(crate::hw::NeutralMode::Coast)
            );
        }
    }

    #[test]
    fn encoder_requires_sensor() {
        let make = |id| {
            let mut controller = MockController::new(id);
            controller.position = 4096;
            controller
        };

        // No sensor attached: tare is a no-op and reads report zero
        let mut without =
            MotorGroup::new(1, 10, CoordinationMode::Independent, None, make);
        without.tare_encoder();
        assert_eq!(without.encoder_value(), 0);
        assert_eq!(without.primary().position, 4096);

        let mut with = MotorGroup::new(
            1,
            10,
            CoordinationMode::Independent,
            Some(FeedbackSensor::RelativeMagEncoder),
            make,
        );
        assert_eq!(with.encoder_value(), 4096);
        with.tare_encoder();
        assert_eq!(with.encoder_value(), 0);
    }
}
