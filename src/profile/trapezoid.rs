//! Trapezoidal motion profile engine.
//!
//! Constant acceleration until the peak (at most max) velocity is reached,
//! zero acceleration for a calculated cruise time, then deceleration with the
//! negative slope of the initial ramp. Goals too close for the cruise segment
//! degrade to a triangular profile.

use std::sync::{Mutex, MutexGuard};

use super::{Profile, ProfileError, ProfileShape, SetpointMode};

/// Engine state behind the lock. Configuration fields feed the *next*
/// `set_goal`; session fields are a self-contained snapshot so that changing
/// the limits never retroactively alters an active session.
#[derive(Debug)]
struct Inner {
    // configuration
    max_velocity: f64,
    time_to_max_velocity: f64,
    acceleration: f64,
    mode: SetpointMode,

    // session, rebuilt by each set_goal
    sign: f64,
    shape: ProfileShape,
    accel_time: f64,
    cruise_time: f64,
    total_time: f64,
    start_time: f64,
    origin_source: f64,
    distance: f64,
    ramp_accel: f64,
    cruise_velocity: f64,
    last_time: f64,
}

impl Inner {
    /// Rebuilds the session toward `goal` and returns the setpoint at
    /// elapsed 0.
    fn plan(&mut self, goal: f64, cur_source: f64, t: f64) -> f64 {
        self.ramp_accel = self.acceleration;
        match self.mode {
            SetpointMode::Distance => {
                let delta = goal - cur_source;
                self.sign = sign_of(delta);
                self.distance = delta.abs();
                self.cruise_velocity = self.max_velocity;

                // Distance covered by a full 0 -> max -> 0 ramp pair.
                let dist_accel_decel = self.max_velocity * self.time_to_max_velocity;
                if self.distance == 0.0 {
                    // Degenerate goal: zero-duration session, immediately done.
                    self.shape = ProfileShape::Triangular;
                    self.accel_time = 0.0;
                    self.cruise_time = 0.0;
                } else if self.distance >= dist_accel_decel {
                    self.shape = ProfileShape::Trapezoidal;
                    self.accel_time = self.time_to_max_velocity;
                    self.cruise_time = (self.distance - dist_accel_decel) / self.max_velocity;
                } else {
                    // v² = 2a(d/2) gives the reduced peak velocity.
                    let v_peak = (self.distance * self.acceleration).sqrt();
                    self.shape = ProfileShape::Triangular;
                    self.accel_time = v_peak / self.acceleration;
                    self.cruise_time = 0.0;
                }
                self.total_time = 2.0 * self.accel_time + self.cruise_time;
            }
            SetpointMode::Velocity => {
                // The goal is a target velocity; only the ramp up to it is
                // generated, and the setpoint holds there afterwards. The
                // session origin is fixed at 0, cur_source is ignored.
                self.sign = sign_of(goal);
                self.distance = 0.0;
                self.cruise_velocity = goal.abs();
                self.shape = ProfileShape::Trapezoidal;
                self.accel_time = self.cruise_velocity / self.acceleration;
                self.cruise_time = 0.0;
                self.total_time = self.accel_time;
            }
        }
        self.start_time = t;
        self.last_time = t;
        self.origin_source = cur_source;

        match self.mode {
            SetpointMode::Distance => cur_source,
            SetpointMode::Velocity => 0.0,
        }
    }

    /// Closed-form setpoint at `cur_time`, re-evaluated from `start_time`
    /// every call so repeated queries are drift-free under call jitter.
    fn setpoint_at(&self, cur_time: f64) -> f64 {
        let elapsed = (cur_time - self.start_time).clamp(0.0, self.total_time);
        match self.mode {
            SetpointMode::Distance => {
                let pos = if elapsed < self.accel_time {
                    0.5 * self.ramp_accel * elapsed * elapsed
                } else if elapsed < self.accel_time + self.cruise_time {
                    0.5 * self.ramp_accel * self.accel_time * self.accel_time
                        + self.cruise_velocity * (elapsed - self.accel_time)
                } else {
                    // Deceleration mirrors the ramp, measured from the end.
                    let remaining = self.total_time - elapsed;
                    self.distance - 0.5 * self.ramp_accel * remaining * remaining
                };
                self.origin_source + self.sign * pos
            }
            SetpointMode::Velocity => {
                let v = if elapsed >= self.total_time {
                    self.cruise_velocity
                } else {
                    self.ramp_accel * elapsed
                };
                self.sign * v
            }
        }
    }

    fn at_goal(&self) -> bool {
        self.last_time - self.start_time >= self.total_time
    }
}

fn sign_of(delta: f64) -> f64 {
    if delta > 0.0 {
        1.0
    } else if delta < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn check_positive(name: &str, value: f64) -> Result<(), ProfileError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ProfileError::InvalidParameter(format!(
            "{name} must be finite and > 0, got {value}"
        )))
    }
}

/// Thread-safe trapezoidal profile generator.
///
/// Every public method takes the internal lock exactly once for its full
/// duration, so a high-rate control loop calling [`Profile::update_setpoint`]
/// and a supervisory thread reconfiguring via [`Profile::set_goal`] or the
/// limit setters never observe a torn session (a new `total_time` paired
/// with an old `start_time`). A new goal atomically replaces the previous
/// session; that is the only cancellation mechanism.
pub struct TrapezoidProfile {
    inner: Mutex<Inner>,
}

impl TrapezoidProfile {
    /// `max_velocity` is the cruise ceiling, `time_to_max_velocity` the time
    /// to ramp from 0 to it; their ratio is the constant acceleration. Both
    /// must be finite and positive.
    pub fn new(max_velocity: f64, time_to_max_velocity: f64) -> Result<Self, ProfileError> {
        check_positive("max_velocity", max_velocity)?;
        check_positive("time_to_max_velocity", time_to_max_velocity)?;
        Ok(Self {
            inner: Mutex::new(Inner {
                max_velocity,
                time_to_max_velocity,
                acceleration: max_velocity / time_to_max_velocity,
                mode: SetpointMode::Distance,
                sign: 0.0,
                shape: ProfileShape::Triangular,
                accel_time: 0.0,
                cruise_time: 0.0,
                total_time: 0.0,
                start_time: 0.0,
                origin_source: 0.0,
                distance: 0.0,
                ramp_accel: max_velocity / time_to_max_velocity,
                cruise_velocity: 0.0,
                last_time: 0.0,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Selects whether setpoints are positions (`Distance`) or velocities
    /// (`Velocity`). Takes effect on the next `set_goal`.
    pub fn set_mode(&self, mode: SetpointMode) {
        let mut inner = self.lock();
        if inner.mode != mode {
            tracing::debug!("setpoint mode changed to {:?}", mode);
        }
        inner.mode = mode;
    }

    pub fn mode(&self) -> SetpointMode {
        self.lock().mode
    }

    /// Updates the velocity ceiling. Applies to the next `set_goal`, never
    /// retroactively to an active session.
    pub fn set_max_velocity(&self, v: f64) -> Result<(), ProfileError> {
        check_positive("max_velocity", v)?;
        let mut inner = self.lock();
        inner.max_velocity = v;
        inner.acceleration = inner.max_velocity / inner.time_to_max_velocity;
        Ok(())
    }

    /// Updates the ramp duration. Applies to the next `set_goal`.
    pub fn set_time_to_max_v(&self, time_to_max_v: f64) -> Result<(), ProfileError> {
        check_positive("time_to_max_velocity", time_to_max_v)?;
        let mut inner = self.lock();
        inner.time_to_max_velocity = time_to_max_v;
        inner.acceleration = inner.max_velocity / inner.time_to_max_velocity;
        Ok(())
    }

    pub fn max_velocity(&self) -> f64 {
        self.lock().max_velocity
    }

    pub fn time_to_max_velocity(&self) -> f64 {
        self.lock().time_to_max_velocity
    }

    /// Shape of the current session's velocity curve.
    pub fn shape(&self) -> ProfileShape {
        self.lock().shape
    }

    /// Duration of the current session in seconds (0 for a degenerate goal).
    pub fn total_time(&self) -> f64 {
        self.lock().total_time
    }

    /// Restarts the elapsed-time clock at `t` without recomputing the shape
    /// parameters. Calling this mid-profile makes the next setpoint jump
    /// discontinuously back to the session start; only call it before a
    /// session begins.
    pub fn reset_time(&self, t: f64) {
        let mut inner = self.lock();
        inner.start_time = t;
        inner.last_time = t;
    }
}

impl Profile for TrapezoidProfile {
    fn set_goal(&self, goal: f64, cur_source: f64, t: f64) -> f64 {
        let mut inner = self.lock();
        let initial = inner.plan(goal, cur_source, t);
        tracing::debug!(
            "planned {:?} session: goal={} accel_time={:.3}s cruise_time={:.3}s total_time={:.3}s",
            inner.shape,
            goal,
            inner.accel_time,
            inner.cruise_time,
            inner.total_time,
        );
        initial
    }

    fn update_setpoint(&self, _cur_setpoint: f64, _cur_source: f64, cur_time: f64) -> f64 {
        let mut inner = self.lock();
        inner.last_time = cur_time;
        inner.setpoint_at(cur_time)
    }

    fn at_goal(&self) -> bool {
        self.lock().at_goal()
    }
}
