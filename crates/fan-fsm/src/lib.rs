//! Pure state machine governing extraction fan behavior
//!
//! `transition` is a deterministic function from (state, input) to the next
//! state plus an ordered list of commands for the caller to execute. It
//! performs no I/O itself: device calls and timer scheduling are described
//! by `Command` values, which keeps every transition trivially testable.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default delayed-off duration for manually triggered extraction
pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Fixed timeout bounding humidity-driven drying runs
///
/// Drying may need to outlast any manually triggered run by a wide margin,
/// so it does not follow the configured extraction delay.
pub const DRYING_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// State of the fan controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanState {
    /// Startup state, left exactly once via the restore procedure
    Init,
    Off,
    /// Fan running after a manual/occupancy signal, bounded by the normal timeout
    Extraction,
    /// Fan running because of high humidity, bounded by the long timeout
    Drying,
    /// Quiet period active, fan must stay off unless turned on manually
    Quiet,
    /// Manually requested extraction during a quiet period
    QuietExtraction,
}

impl FanState {
    /// All states, for exhaustive iteration in tests and diagnostics
    pub const ALL: [FanState; 6] = [
        FanState::Init,
        FanState::Off,
        FanState::Extraction,
        FanState::Drying,
        FanState::Quiet,
        FanState::QuietExtraction,
    ];
}

impl fmt::Display for FanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FanState::Init => "init",
            FanState::Off => "off",
            FanState::Extraction => "extraction",
            FanState::Drying => "drying",
            FanState::Quiet => "quiet",
            FanState::QuietExtraction => "quiet_extraction",
        };
        f.write_str(s)
    }
}

/// Input fed into the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanInput {
    TurnedOn,
    TurnedOff,
    HighHumidity,
    LowHumidity,
    Timeout,
    BeginQuiet,
    EndQuiet,
}

impl FanInput {
    /// All inputs, for exhaustive iteration in tests
    pub const ALL: [FanInput; 7] = [
        FanInput::TurnedOn,
        FanInput::TurnedOff,
        FanInput::HighHumidity,
        FanInput::LowHumidity,
        FanInput::Timeout,
        FanInput::BeginQuiet,
        FanInput::EndQuiet,
    ];
}

impl fmt::Display for FanInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FanInput::TurnedOn => "turned_on",
            FanInput::TurnedOff => "turned_off",
            FanInput::HighHumidity => "high_humidity",
            FanInput::LowHumidity => "low_humidity",
            FanInput::Timeout => "timeout",
            FanInput::BeginQuiet => "begin_quiet",
            FanInput::EndQuiet => "end_quiet",
        };
        f.write_str(s)
    }
}

/// Side effect requested by a transition
///
/// Commands are descriptions, not effects. `TurnOn`/`TurnOff` are idempotent
/// from the machine's point of view; the caller suppresses redundant device
/// calls since the table does not track physical power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TurnOn,
    TurnOff,
    StartTimeout(Duration),
    CancelTimeout,
}

/// Timeout durations used when building `StartTimeout` commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Delayed-off duration for extraction and quiet extraction
    pub extraction: Duration,
    /// Drying duration, fixed regardless of configuration
    pub drying: Duration,
}

impl Timeouts {
    /// Timeouts with a custom extraction delay; drying stays fixed.
    pub fn with_extraction(extraction: Duration) -> Self {
        Self {
            extraction,
            drying: DRYING_TIMEOUT,
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::with_extraction(DEFAULT_EXTRACTION_TIMEOUT)
    }
}

/// Input not valid for the current state
///
/// Non-fatal: the caller keeps its state, issues no commands, and reports
/// the event for diagnostics.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("transition from '{state}' on '{input}' is not allowed")]
pub struct InvalidTransition {
    pub state: FanState,
    pub input: FanInput,
}

/// Result of a successful transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: FanState,
    pub to: FanState,
    pub input: FanInput,
    /// Commands to execute, in order
    pub commands: Vec<Command>,
}

/// Compute the next state and commands for an input.
///
/// Returns `InvalidTransition` for any (state, input) pair not in the table;
/// the caller's state is then unchanged and nothing is executed.
pub fn transition(
    state: FanState,
    input: FanInput,
    timeouts: &Timeouts,
) -> Result<Transition, InvalidTransition> {
    use Command::*;
    use FanInput::*;
    use FanState::*;

    let (to, commands) = match (state, input) {
        (Init | Off, TurnedOn) => (Extraction, vec![StartTimeout(timeouts.extraction), TurnOn]),
        (Init, TurnedOff) => (Off, vec![TurnOff]),
        (Init | Off | Extraction | Drying, BeginQuiet) => (Quiet, vec![CancelTimeout, TurnOff]),
        (Off | Extraction, HighHumidity) => (Drying, vec![StartTimeout(timeouts.drying), TurnOn]),
        (Extraction, Timeout | TurnedOff) => (Off, vec![TurnOff]),
        (Drying, LowHumidity | TurnedOff | Timeout) => (Off, vec![TurnOff]),
        (Quiet, TurnedOn) => (
            QuietExtraction,
            vec![StartTimeout(timeouts.extraction), TurnOn],
        ),
        (Quiet | QuietExtraction, EndQuiet) => (Off, vec![TurnOff]),
        (QuietExtraction, Timeout | TurnedOff) => (Quiet, vec![CancelTimeout, TurnOff]),
        _ => return Err(InvalidTransition { state, input }),
    };

    Ok(Transition {
        from: state,
        to,
        input,
        commands,
    })
}
