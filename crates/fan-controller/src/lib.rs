//! Orchestration shell for the shower-fan state machine
//!
//! The controller subscribes to external signal sources (fan power state,
//! humidity sensor, quiet-period switch, daily schedule), translates raw
//! notifications into FSM inputs, owns the single pending delayed-off
//! timer, and executes the commands the state machine emits. All events
//! are serialized through one mpsc stream and processed one at a time.

mod config;
mod controller;
mod hass;
mod schedule;

pub use config::{ConfigError, ConfigResult, ControllerConfig};
pub use controller::{ControllerError, ControllerEvent, FanController, TransitionRecord};
pub use hass::Hass;
pub use schedule::{spawn_quiet_schedule, QuietEdge, QuietHours};
