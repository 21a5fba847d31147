// 50 Hz control loop with an operator-command watchdog
//
// Commands arrive over zenoh from the operator station; if they go stale the
// watchdog substitutes neutral input, which zeroes the sticks and releases
// every button. An in-flight align keeps running under neutral input and is
// bounded by its own safety timer. An inch stalls the loop for its (short,
// bounded) duration; the next interval ticks fire immediately afterwards.

use std::time::Instant;

use tokio::time::{interval, Duration};
use tracing::{info, warn};

use crate::config::{CMD_TIMEOUT, LOOP_HZ, TOPIC_CMD_OPERATOR, TOPIC_HEALTH, TOPIC_RT_DRIVE};
use crate::drive::Drivetrain;
use crate::hw::{HeadingSensor, MotorController};
use crate::messages::{OperatorCommand, RuntimeHealth};

pub struct Runtime<C: MotorController, H: HeadingSensor> {
    drivetrain: Drivetrain<C>,
    heading: H,
    latest_cmd: Option<OperatorCommand>,
    cmd_received_at: Instant,
    health: RuntimeHealth,
}

impl<C: MotorController, H: HeadingSensor> Runtime<C, H> {
    pub fn new(drivetrain: Drivetrain<C>, heading: H) -> Self {
        Self {
            drivetrain,
            heading,
            latest_cmd: None,
            cmd_received_at: Instant::now(),
            health: RuntimeHealth::CmdStale, // Start stale until first cmd
        }
    }

    /// Record an incoming operator command
    fn on_command(&mut self, cmd: OperatorCommand) {
        self.latest_cmd = Some(cmd);
        self.cmd_received_at = Instant::now();
    }

    /// The command the drivetrain should see this tick, after the watchdog
    fn effective_command(&mut self) -> OperatorCommand {
        let cmd_age = self.cmd_received_at.elapsed();

        if cmd_age > CMD_TIMEOUT {
            if self.health != RuntimeHealth::CmdStale {
                warn!("Operator command stale ({:?} old), driving neutral", cmd_age);
            }
            self.health = RuntimeHealth::CmdStale;
            OperatorCommand::default()
        } else if let Some(ref cmd) = self.latest_cmd {
            self.health = RuntimeHealth::Ok;
            cmd.clone()
        } else {
            // No command ever received
            self.health = RuntimeHealth::CmdStale;
            OperatorCommand::default()
        }
    }
}

pub async fn run<C: MotorController, H: HeadingSensor>(
    drivetrain: Drivetrain<C>,
    heading: H,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(TOPIC_CMD_OPERATOR).await?;
    let pub_actuation = session.declare_publisher(TOPIC_RT_DRIVE).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let mut runtime = Runtime::new(drivetrain, heading);
    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));

    info!(
        "Runtime started: {}Hz loop, {}ms watchdog timeout",
        LOOP_HZ,
        CMD_TIMEOUT.as_millis()
    );
    info!("Subscribed to: {}", TOPIC_CMD_OPERATOR);
    info!("Publishing to: {}, {}", TOPIC_RT_DRIVE, TOPIC_HEALTH);

    loop {
        tick.tick().await;

        // 1. Drain all pending commands (non-blocking), keep latest
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<OperatorCommand>(&payload) {
                Ok(cmd) => {
                    runtime.on_command(cmd);
                }
                Err(e) => {
                    warn!("Failed to parse command: {}", e);
                }
            }
        }

        // 2. Apply the watchdog and run one drive control tick
        let cmd = runtime.effective_command();
        let degrees = runtime.heading.heading_degrees();
        let actuation = runtime.drivetrain.tick(&cmd, degrees);

        // 3. Publish actuation
        let actuation_json = serde_json::to_string(&actuation)?;
        pub_actuation.put(actuation_json).await?;

        // 4. Publish health
        let health_json = serde_json::to_string(&runtime.health)?;
        pub_health.put(health_json).await?;
    }
}
