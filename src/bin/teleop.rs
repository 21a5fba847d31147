// Keyboard operator station: WASD drive, arrows align, I/J/K/L inch,
// R/F speed, Q quit. Publishes OperatorCommand at ~50Hz.
//
// Terminal key events have no release notification, so every input decays
// back to neutral after a short timeout unless the key repeats.

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::{Duration, Instant};
use tracing::info;

use drivebase_runtime::config::TOPIC_CMD_OPERATOR;
use drivebase_runtime::messages::{InchButtons, OperatorCommand, POV_NONE};

const SPEEDS: [f64; 3] = [0.3, 0.6, 1.0]; // axis magnitude per speed step
const INPUT_TIMEOUT_MS: u64 = 150; // Reset to neutral after this much time with no input

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_OPERATOR).await?;

    info!("Controls: WASD=drive, arrows=align, I/J/K/L=inch, R/F=speed, Q=quit");
    info!("Speed: LOW");

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut speed_idx: usize = 0;

    // Persistent input state
    let mut cmd = OperatorCommand::default();
    let mut last_input = Instant::now();

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match code {
                    // Drive axes
                    KeyCode::Char('w') if pressed => {
                        cmd.y_axis = SPEEDS[speed_idx];
                        last_input = Instant::now();
                    }
                    KeyCode::Char('s') if pressed => {
                        cmd.y_axis = -SPEEDS[speed_idx];
                        last_input = Instant::now();
                    }
                    KeyCode::Char('a') if pressed => {
                        cmd.x_axis = -SPEEDS[speed_idx];
                        last_input = Instant::now();
                    }
                    KeyCode::Char('d') if pressed => {
                        cmd.x_axis = SPEEDS[speed_idx];
                        last_input = Instant::now();
                    }

                    // Directional align (POV)
                    KeyCode::Up if pressed => {
                        cmd.pov = 0;
                        last_input = Instant::now();
                    }
                    KeyCode::Right if pressed => {
                        cmd.pov = 90;
                        last_input = Instant::now();
                    }
                    KeyCode::Down if pressed => {
                        cmd.pov = 180;
                        last_input = Instant::now();
                    }
                    KeyCode::Left if pressed => {
                        cmd.pov = 270;
                        last_input = Instant::now();
                    }

                    // Inching
                    KeyCode::Char('i') if pressed => {
                        cmd.inch = InchButtons {
                            forward: true,
                            ..InchButtons::default()
                        };
                        last_input = Instant::now();
                    }
                    KeyCode::Char('k') if pressed => {
                        cmd.inch = InchButtons {
                            reverse: true,
                            ..InchButtons::default()
                        };
                        last_input = Instant::now();
                    }
                    KeyCode::Char('j') if pressed => {
                        cmd.inch = InchButtons {
                            left: true,
                            ..InchButtons::default()
                        };
                        last_input = Instant::now();
                    }
                    KeyCode::Char('l') if pressed => {
                        cmd.inch = InchButtons {
                            right: true,
                            ..InchButtons::default()
                        };
                        last_input = Instant::now();
                    }

                    // Speed control
                    KeyCode::Char('r') if pressed => {
                        speed_idx = (speed_idx + 1).min(SPEEDS.len() - 1);
                        print_speed(speed_idx);
                    }
                    KeyCode::Char('f') if pressed => {
                        speed_idx = speed_idx.saturating_sub(1);
                        print_speed(speed_idx);
                    }

                    // Quit
                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,

                    _ => {}
                }
            }
        }

        // Decay to neutral if no input for INPUT_TIMEOUT_MS; this is also
        // what releases the POV between two align requests
        if last_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            cmd.x_axis = 0.0;
            cmd.y_axis = 0.0;
            cmd.pov = POV_NONE;
            cmd.inch = InchButtons::default();
        }

        // Always publish at ~50Hz
        publisher.put(serde_json::to_string(&cmd)?).await?;
    }

    Ok(())
}

fn print_speed(idx: usize) {
    let label = ["LOW", "MED", "HIGH"][idx];
    info!("Speed: {}", label);
}
