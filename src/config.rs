// TOML configuration for the setpoint generator host

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::profile::SetpointMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub profile: ProfileConfig,

    #[serde(default)]
    pub control: ControlConfig,
}

/// Kinematic limits for the trapezoidal engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileConfig {
    /// Velocity ceiling (units/s).
    #[serde(default = "default_max_velocity")]
    pub max_velocity: f64,

    /// Time to ramp from rest to `max_velocity` (s).
    #[serde(default = "default_time_to_max_velocity")]
    pub time_to_max_velocity: f64,

    /// Whether setpoints are positions or velocities.
    #[serde(default)]
    pub mode: SetpointMode,
}

/// Control-loop timing and the demo goal.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControlConfig {
    /// Control loop rate (Hz).
    #[serde(default = "default_loop_hz")]
    pub loop_hz: f64,

    /// Goal commanded by the demo binary's supervisory task.
    #[serde(default = "default_goal")]
    pub goal: f64,
}

fn default_max_velocity() -> f64 {
    10.0
}
fn default_time_to_max_velocity() -> f64 {
    2.0
}
fn default_loop_hz() -> f64 {
    50.0
}
fn default_goal() -> f64 {
    100.0
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            max_velocity: default_max_velocity(),
            time_to_max_velocity: default_time_to_max_velocity(),
            mode: SetpointMode::default(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            loop_hz: default_loop_hz(),
            goal: default_goal(),
        }
    }
}

impl Config {
    /// Loads and validates a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Rejects limits that would corrupt the kinematics (fail fast at the
    /// boundary instead of letting NaN/Inf propagate).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.profile.max_velocity.is_finite() && self.profile.max_velocity > 0.0) {
            return Err(ConfigError::Invalid(
                "profile.max_velocity must be finite and positive".into(),
            ));
        }
        if !(self.profile.time_to_max_velocity.is_finite()
            && self.profile.time_to_max_velocity > 0.0)
        {
            return Err(ConfigError::Invalid(
                "profile.time_to_max_velocity must be finite and positive".into(),
            ));
        }
        if !(self.control.loop_hz.is_finite() && self.control.loop_hz > 0.0) {
            return Err(ConfigError::Invalid(
                "control.loop_hz must be finite and positive".into(),
            ));
        }
        if !self.control.goal.is_finite() {
            return Err(ConfigError::Invalid("control.goal must be finite".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.profile.max_velocity, 10.0);
        assert_eq!(config.profile.time_to_max_velocity, 2.0);
        assert_eq!(config.profile.mode, SetpointMode::Distance);
        assert_eq!(config.control.loop_hz, 50.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml_config() {
        let toml_config = r#"
[profile]
max_velocity = 4.0
time_to_max_velocity = 0.5
mode = "velocity"

[control]
loop_hz = 100.0
goal = 3.0
        "#;

        let config: Config = toml::from_str(toml_config).unwrap();
        assert_eq!(config.profile.max_velocity, 4.0);
        assert_eq!(config.profile.time_to_max_velocity, 0.5);
        assert_eq!(config.profile.mode, SetpointMode::Velocity);
        assert_eq!(config.control.loop_hz, 100.0);
        assert_eq!(config.control.goal, 3.0);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.profile.max_velocity = -1.0;
        assert!(config.validate().is_err());
        config.profile.max_velocity = 10.0;

        config.profile.time_to_max_velocity = 0.0;
        assert!(config.validate().is_err());
        config.profile.time_to_max_velocity = 2.0;

        config.control.loop_hz = f64::NAN;
        assert!(config.validate().is_err());
    }
}
