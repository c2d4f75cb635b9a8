// trapgen: trapezoidal motion setpoint generation for a single actuator

pub mod clock;
pub mod config;
pub mod controller;
pub mod profile;

pub use clock::{ManualClock, MonotonicClock, TimeSource};
pub use config::Config;
pub use controller::{ProfileCommand, SetpointController, SetpointSink};
pub use profile::trapezoid::TrapezoidProfile;
pub use profile::{Profile, ProfileError, ProfileShape, SetpointMode};
