// Drivetrain control runtime for a differential-drive robot base

pub mod config;
pub mod drive;
pub mod hw;
pub mod messages;
pub mod runtime;
