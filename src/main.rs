use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use drivebase_runtime::config::{
    CAN_BRIDGE_BAUDRATE, CAN_BRIDGE_PORT, GYRO_CAN_ID, LEFT_PRIMARY_CAN_ID, MOTORS_PER_SIDE,
    RIGHT_PRIMARY_CAN_ID,
};
use drivebase_runtime::drive::{
    AlignConfig, CoordinationMode, Drivetrain, FeedbackSensor, InchConfig, MotorGroup,
};
use drivebase_runtime::hw::canlink::{CanHeadingSensor, CanLink, CanMotorController};
use drivebase_runtime::hw::{FixedHeading, LoggedMotorController, MotorController};
use drivebase_runtime::runtime;

#[derive(Parser)]
#[command(about = "Drivetrain control runtime")]
struct Args {
    /// Serial port for the USB -> CAN bridge
    #[arg(long, default_value = CAN_BRIDGE_PORT)]
    port: String,

    /// Run without hardware; motor commands are logged instead of sent
    #[arg(long)]
    no_motors: bool,
}

/// Two motors per side, the second hardware-linked to the first, mag encoder
/// on the primaries.
fn build_drivetrain<C: MotorController>(mut make: impl FnMut(u16) -> C) -> Drivetrain<C> {
    let left = MotorGroup::new(
        MOTORS_PER_SIDE,
        LEFT_PRIMARY_CAN_ID,
        CoordinationMode::Follower,
        Some(FeedbackSensor::RelativeMagEncoder),
        &mut make,
    );
    let right = MotorGroup::new(
        MOTORS_PER_SIDE,
        RIGHT_PRIMARY_CAN_ID,
        CoordinationMode::Follower,
        Some(FeedbackSensor::RelativeMagEncoder),
        &mut make,
    );

    Drivetrain::new(left, right, AlignConfig::default(), InchConfig::default())
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();

    let result = if args.no_motors {
        info!("Running without hardware (--no-motors)");
        let drivetrain = build_drivetrain(LoggedMotorController::new);
        runtime::run(drivetrain, FixedHeading(0.0)).await
    } else {
        let link = match CanLink::open(&args.port, CAN_BRIDGE_BAUDRATE) {
            Ok(link) => Arc::new(Mutex::new(link)),
            Err(e) => {
                eprintln!("Failed to open CAN bridge on {}: {}", args.port, e);
                std::process::exit(1);
            }
        };
        info!("CAN bridge open on {}", args.port);

        let drivetrain = build_drivetrain(|id| CanMotorController::new(link.clone(), id));
        let gyro = CanHeadingSensor::new(link.clone(), GYRO_CAN_ID);
        runtime::run(drivetrain, gyro).await
    };

    if let Err(e) = result {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
