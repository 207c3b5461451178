//! Controller configuration
//!
//! Deserialized from YAML, immutable after construction. Field names
//! follow the app's historical argument keys so existing deployments can
//! keep their configuration files.

use std::time::Duration;

use fan_core::EntityId;
use fan_fsm::Timeouts;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::QuietHours;

/// Result type for configuration validation
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that fail configuration fast at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("fan_off_delay_minutes must be a positive finite number, got {0}")]
    InvalidDelay(f64),

    #[error("humidity_relative_high ({high}) must be above humidity_relative_low ({low})")]
    ThresholdOrder { high: f64, low: f64 },
}

/// Configuration for one fan controller instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Instance name, used for the published status entity
    #[serde(default = "default_name")]
    pub name: String,

    /// The extraction fan to control
    pub fan: EntityId,

    /// Humidity sensor in the controlled room
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_sensor: Option<EntityId>,

    /// Baseline humidity sensor (e.g. another room); humidity events are
    /// only evaluated when this is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_humidity_sensor: Option<EntityId>,

    /// Percentage points above the reference that count as high humidity
    #[serde(default = "default_relative_high")]
    pub humidity_relative_high: f64,

    /// Percentage points above the reference that count as dried out
    #[serde(default = "default_relative_low")]
    pub humidity_relative_low: f64,

    /// External do-not-disturb switch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet_switch: Option<EntityId>,

    /// Daily quiet window; quiet period = switch on OR time in window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet_hours: Option<QuietHours>,

    /// Delayed-off duration for manually triggered extraction, in minutes
    #[serde(default = "default_delay_minutes")]
    pub fan_off_delay_minutes: f64,
}

fn default_name() -> String {
    "shower_fan".to_string()
}

fn default_relative_high() -> f64 {
    20.0
}

fn default_relative_low() -> f64 {
    10.0
}

fn default_delay_minutes() -> f64 {
    5.0
}

impl ControllerConfig {
    /// Validate cross-field constraints; missing required fields are
    /// already rejected by deserialization.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.fan_off_delay_minutes.is_finite() || self.fan_off_delay_minutes <= 0.0 {
            return Err(ConfigError::InvalidDelay(self.fan_off_delay_minutes));
        }
        if self.humidity_relative_high <= self.humidity_relative_low {
            return Err(ConfigError::ThresholdOrder {
                high: self.humidity_relative_high,
                low: self.humidity_relative_low,
            });
        }
        Ok(())
    }

    /// Timeout durations derived from the configured delay
    pub fn timeouts(&self) -> Timeouts {
        Timeouts::with_extraction(Duration::from_secs_f64(self.fan_off_delay_minutes * 60.0))
    }

    /// Name of the published status entity
    pub fn status_entity(&self) -> String {
        format!("sensor.{}_fan_state_machine", self.name)
    }
}
