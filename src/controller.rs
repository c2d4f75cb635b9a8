// Periodic control-loop host around a trapezoidal profile engine

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::clock::TimeSource;
use crate::profile::trapezoid::TrapezoidProfile;
use crate::profile::{Profile, SetpointMode};

/// Commands accepted from the supervisory side. They are consumed at the
/// start of a control cycle, so every cycle runs against a single,
/// fully-configured session.
#[derive(Debug, Clone)]
pub enum ProfileCommand {
    /// Replace the active session with a new goal. This is also the only way
    /// to cancel a profile in flight.
    SetGoal { goal: f64 },
    SetMode(SetpointMode),
    /// Applies to the next goal, never to the active session.
    SetMaxVelocity(f64),
    /// Applies to the next goal, never to the active session.
    SetTimeToMaxV(f64),
    /// Restart the session clock at the current time. Discontinuous if a
    /// profile is in flight; see `TrapezoidProfile::reset_time`.
    ResetTime,
    /// Stop the control loop task.
    Shutdown,
}

/// Consumer of produced setpoints: the seam to the external feedback
/// controller. `apply` receives the commanded value once per cycle;
/// `measure` reports the sensed source value fed back as session origin.
pub trait SetpointSink: Send {
    fn apply(&mut self, setpoint: f64);
    fn measure(&self) -> f64;
}

/// Drives one actuator: polls supervisory commands, advances the profile
/// once per period, and feeds the resulting setpoint to the sink.
pub struct SetpointController {
    profile: Arc<TrapezoidProfile>,
    clock: Arc<dyn TimeSource>,
    period: Duration,
    commands: mpsc::Receiver<ProfileCommand>,
    last_setpoint: f64,
    active: bool,
    reached_logged: bool,
}

impl SetpointController {
    pub fn new(
        profile: Arc<TrapezoidProfile>,
        clock: Arc<dyn TimeSource>,
        loop_hz: f64,
        commands: mpsc::Receiver<ProfileCommand>,
    ) -> Self {
        Self {
            profile,
            clock,
            period: Duration::from_secs_f64(1.0 / loop_hz),
            commands,
            last_setpoint: 0.0,
            active: false,
            reached_logged: false,
        }
    }

    /// Runs the periodic loop until a `Shutdown` command arrives or every
    /// command sender is dropped.
    pub async fn run<S: SetpointSink>(mut self, mut sink: S) {
        let mut ticker = tokio::time::interval(self.period);
        loop {
            ticker.tick().await;
            if !self.step(&mut sink) {
                break;
            }
        }
    }

    /// Executes one control cycle. Returns `false` once the loop should
    /// stop. Public so tests can drive cycles against a manual clock.
    pub fn step(&mut self, sink: &mut dyn SetpointSink) -> bool {
        loop {
            match self.commands.try_recv() {
                Ok(command) => {
                    if !self.apply_command(command, sink) {
                        return false;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::info!("supervisory channel closed, stopping control loop");
                    return false;
                }
            }
        }

        if !self.active {
            return true;
        }

        let now = self.clock.now();
        let setpoint = self
            .profile
            .update_setpoint(self.last_setpoint, sink.measure(), now);
        self.last_setpoint = setpoint;
        sink.apply(setpoint);

        if self.profile.at_goal() && !self.reached_logged {
            tracing::info!("goal reached, holding setpoint {:.3}", setpoint);
            self.reached_logged = true;
        }
        true
    }

    fn apply_command(&mut self, command: ProfileCommand, sink: &mut dyn SetpointSink) -> bool {
        match command {
            ProfileCommand::SetGoal { goal } => {
                let now = self.clock.now();
                self.last_setpoint = self.profile.set_goal(goal, sink.measure(), now);
                self.active = true;
                self.reached_logged = false;
                tracing::info!(
                    "new goal {} (total_time {:.3}s)",
                    goal,
                    self.profile.total_time()
                );
            }
            ProfileCommand::SetMode(mode) => self.profile.set_mode(mode),
            ProfileCommand::SetMaxVelocity(v) => {
                if let Err(e) = self.profile.set_max_velocity(v) {
                    tracing::warn!("rejected max velocity update: {e}");
                }
            }
            ProfileCommand::SetTimeToMaxV(t) => {
                if let Err(e) = self.profile.set_time_to_max_v(t) {
                    tracing::warn!("rejected ramp time update: {e}");
                }
            }
            ProfileCommand::ResetTime => self.profile.reset_time(self.clock.now()),
            ProfileCommand::Shutdown => {
                tracing::info!("control loop shutting down");
                return false;
            }
        }
        true
    }
}
