// trapgen host binary: drives a simulated actuator through one profile

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use trapgen::{
    Config, MonotonicClock, Profile, ProfileCommand, SetpointController, SetpointSink,
    TrapezoidProfile,
};

#[derive(Parser)]
#[command(name = "trapgen", about = "Trapezoidal motion setpoint generator host")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(default_value = "trapgen.toml")]
    config: PathBuf,

    /// Override the configured goal.
    #[arg(long)]
    goal: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        tracing::warn!(
            "{} not found, using built-in defaults",
            cli.config.display()
        );
        Config::default()
    };
    let goal = cli.goal.unwrap_or(config.control.goal);

    tracing::info!("max velocity: {} units/s", config.profile.max_velocity);
    tracing::info!(
        "time to max velocity: {} s",
        config.profile.time_to_max_velocity
    );
    tracing::info!("mode: {:?}, goal: {}", config.profile.mode, goal);

    let profile = Arc::new(TrapezoidProfile::new(
        config.profile.max_velocity,
        config.profile.time_to_max_velocity,
    )?);
    profile.set_mode(config.profile.mode);

    let clock = Arc::new(MonotonicClock::new());
    let (command_tx, command_rx) = mpsc::channel::<ProfileCommand>(16);
    let controller = SetpointController::new(
        profile.clone(),
        clock,
        config.control.loop_hz,
        command_rx,
    );

    // Queue the goal before the loop starts so its first cycle already runs
    // against the configured session.
    command_tx.send(ProfileCommand::SetGoal { goal }).await?;
    let loop_task = tokio::spawn(controller.run(SimulatedActuator::default()));

    // Supervisory side: poll until the profile completes, then stop the loop.
    loop {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if profile.at_goal() {
            break;
        }
    }
    command_tx.send(ProfileCommand::Shutdown).await?;
    loop_task.await?;

    tracing::info!("profile complete after {:.3}s", profile.total_time());
    Ok(())
}

/// Stand-in for the external feedback controller plus plant: the measured
/// position lags the commanded setpoint by a first-order response.
#[derive(Default)]
struct SimulatedActuator {
    position: f64,
}

impl SetpointSink for SimulatedActuator {
    fn apply(&mut self, setpoint: f64) {
        self.position += 0.2 * (setpoint - self.position);
    }

    fn measure(&self) -> f64 {
        self.position
    }
}
