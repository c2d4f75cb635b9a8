// Motion profile interface and shared types

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod trapezoid;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Whether the produced setpoint (and the meaning of `goal`/`cur_source`)
/// is a position or a velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SetpointMode {
    #[default]
    Distance,
    Velocity,
}

/// Shape of the active session's velocity curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileShape {
    /// Ramp up, cruise at max velocity, ramp down.
    Trapezoidal,
    /// Too short to reach max velocity; no cruise segment.
    Triangular,
}

/// Capability contract for a motion-profile generator.
///
/// The control loop only depends on this trait, so a future S-curve or
/// constant-velocity variant can be swapped in without touching the caller.
/// All times are monotonic fractional seconds supplied by the caller, and
/// must be non-decreasing across calls on the same session.
pub trait Profile: Send + Sync {
    /// Configures a new session toward `goal`, with `cur_source` as the
    /// current measurement and `t` as the session time base. Returns the
    /// setpoint valid at `t` (the starting value).
    fn set_goal(&self, goal: f64, cur_source: f64, t: f64) -> f64;

    /// Advances the session to `cur_time` and returns the setpoint for that
    /// instant. `cur_setpoint` and `cur_source` exist for uniformity with
    /// closed-loop profile variants; open-loop implementations may ignore
    /// them.
    fn update_setpoint(&self, cur_setpoint: f64, cur_source: f64, cur_time: f64) -> f64;

    /// True once the time most recently passed to `update_setpoint` (or
    /// `set_goal`) has reached the end of the session.
    fn at_goal(&self) -> bool;
}
