//! Fan controller: event translation, command execution, restore

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use fan_core::{DeviceStatus, EntityId, StateChange, StatusUpdate};
use fan_fsm::{transition, Command, FanInput, FanState, Timeouts};
use serde_json::json;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::hass::Hass;
use crate::schedule::QuietEdge;

/// Event delivered to the controller's serialized input stream
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// A state-change notification from a subscribed entity
    StateChange(StateChange),
    /// A delayed-off timer fired; the epoch identifies which scheduling
    /// it belongs to so a stale, already-replaced timer is ignored
    Timeout { epoch: u64 },
    /// A daily quiet-hours boundary was reached
    QuietSchedule(QuietEdge),
}

/// Recoverable event-handling errors
///
/// Logged by the event loop; never fatal to the controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("non-numeric reading '{value}' from {entity_id}")]
    NonNumericReading { entity_id: EntityId, value: String },

    #[error("no reading available from {entity_id}")]
    MissingReading { entity_id: EntityId },
}

/// What the last processed input did, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord {
    pub previous: FanState,
    pub current: FanState,
    pub input: FanInput,
    /// False when the input was rejected as invalid for the state
    pub accepted: bool,
}

/// The controller owning the state machine and the pending timer.
///
/// All mutation happens through `handle_event` (and `restore` at startup),
/// driven one event at a time by `run`; neither the FSM state nor the
/// timer handle is ever touched concurrently.
pub struct FanController<H: Hass> {
    config: ControllerConfig,
    hass: Arc<H>,
    timeouts: Timeouts,
    state: FanState,
    pending_timeout: Option<JoinHandle<()>>,
    timer_epoch: u64,
    events_tx: UnboundedSender<ControllerEvent>,
    events_rx: UnboundedReceiver<ControllerEvent>,
    last_transition: Option<TransitionRecord>,
}

impl<H: Hass> FanController<H> {
    /// Create a controller in the `Init` state.
    ///
    /// `restore` must run (it does, at the top of `run`) before external
    /// events are fed in.
    pub fn new(config: ControllerConfig, hass: Arc<H>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let timeouts = config.timeouts();

        Self {
            config,
            hass,
            timeouts,
            state: FanState::Init,
            pending_timeout: None,
            timer_epoch: 0,
            events_tx,
            events_rx,
            last_transition: None,
        }
    }

    /// Sender for wiring external signal sources into the event stream
    pub fn sender(&self) -> UnboundedSender<ControllerEvent> {
        self.events_tx.clone()
    }

    /// Current FSM state
    pub fn state(&self) -> FanState {
        self.state
    }

    /// Last processed input and its outcome
    pub fn last_transition(&self) -> Option<&TransitionRecord> {
        self.last_transition.as_ref()
    }

    /// Whether a delayed-off timer is currently scheduled
    pub fn timeout_pending(&self) -> bool {
        self.pending_timeout.is_some()
    }

    /// Run the controller: restore once, then drain events until every
    /// sender is gone.
    pub async fn run(mut self) {
        info!(fan = %self.config.fan, "fan controller starting");
        self.restore();

        while let Some(event) = self.events_rx.recv().await {
            if let Err(e) = self.handle_event(event) {
                warn!(error = %e, "recoverable error while handling event");
            }
        }

        info!("event stream closed, fan controller stopping");
    }

    /// Reconcile FSM state with the real world after a restart.
    ///
    /// Only feeds triggers; the resulting commands go through the normal
    /// idempotent execution path, so no device call is issued when the
    /// device already matches.
    pub fn restore(&mut self) {
        let quiet = self.quiet_switch_on() || self.in_quiet_hours();
        let fan_on = self.fan_status() == DeviceStatus::On;

        info!(quiet, fan_on, "restoring controller state");

        if quiet {
            self.apply(FanInput::BeginQuiet);
            if fan_on {
                self.apply(FanInput::TurnedOn);
            }
        } else if fan_on {
            self.apply(FanInput::TurnedOn);
        } else {
            self.apply(FanInput::TurnedOff);
        }
    }

    /// Serialized event entry point
    pub fn handle_event(&mut self, event: ControllerEvent) -> Result<(), ControllerError> {
        match event {
            ControllerEvent::Timeout { epoch } => {
                if epoch == self.timer_epoch && self.pending_timeout.is_some() {
                    self.pending_timeout = None;
                    self.apply(FanInput::Timeout);
                } else {
                    debug!(epoch, "dropping stale timer event");
                }
                Ok(())
            }
            ControllerEvent::QuietSchedule(QuietEdge::Begin) => {
                self.apply(FanInput::BeginQuiet);
                Ok(())
            }
            ControllerEvent::QuietSchedule(QuietEdge::End) => {
                self.apply(FanInput::EndQuiet);
                Ok(())
            }
            ControllerEvent::StateChange(change) => self.on_state_change(change),
        }
    }

    fn on_state_change(&mut self, change: StateChange) -> Result<(), ControllerError> {
        if change.entity_id == self.config.fan {
            self.on_power_change(&change, FanInput::TurnedOn, FanInput::TurnedOff);
            Ok(())
        } else if Some(&change.entity_id) == self.config.quiet_switch.as_ref() {
            self.on_power_change(&change, FanInput::BeginQuiet, FanInput::EndQuiet);
            Ok(())
        } else if Some(&change.entity_id) == self.config.humidity_sensor.as_ref() {
            self.on_humidity_change(&change)
        } else {
            debug!(entity_id = %change.entity_id, "state change for unwatched entity");
            Ok(())
        }
    }

    /// Translate an on/off entity change into a pair of inputs, filtering
    /// out transitions to or from an indeterminate status.
    fn on_power_change(&mut self, change: &StateChange, on_input: FanInput, off_input: FanInput) {
        let old_indeterminate = change
            .old
            .as_deref()
            .map(DeviceStatus::from)
            .is_some_and(|s| s.is_indeterminate());

        let new = match change.new.as_deref().map(DeviceStatus::from) {
            Some(status) if !status.is_indeterminate() => status,
            _ => {
                debug!(entity_id = %change.entity_id, "ignoring indeterminate state change");
                return;
            }
        };

        if old_indeterminate {
            debug!(entity_id = %change.entity_id, "ignoring recovery from indeterminate state");
            return;
        }

        match new {
            DeviceStatus::On => self.apply(on_input),
            DeviceStatus::Off => self.apply(off_input),
            _ => {}
        }
    }

    /// Compare a humidity reading against the reference sensor.
    ///
    /// Strict inequalities: a reading exactly at a threshold, or anywhere
    /// inside the band, fires nothing.
    fn on_humidity_change(&mut self, change: &StateChange) -> Result<(), ControllerError> {
        let Some(reference_sensor) = self.config.reference_humidity_sensor.clone() else {
            return Ok(());
        };
        let Some(raw) = change.new.as_deref() else {
            return Ok(());
        };

        let humidity = parse_numeric(&change.entity_id, raw)?;
        let reference = self.read_numeric(&reference_sensor)?;

        debug!(humidity, reference, "evaluating humidity reading");

        if humidity > reference + self.config.humidity_relative_high {
            self.apply(FanInput::HighHumidity);
        } else if humidity < reference + self.config.humidity_relative_low {
            self.apply(FanInput::LowHumidity);
        }

        Ok(())
    }

    /// Feed one input through the state machine and execute its commands.
    ///
    /// Invalid inputs leave the state untouched; both outcomes are
    /// recorded and published.
    fn apply(&mut self, input: FanInput) {
        let previous = self.state;

        match transition(previous, input, &self.timeouts) {
            Ok(t) => {
                for command in &t.commands {
                    self.execute(*command);
                }
                self.state = t.to;
                debug!(from = %previous, to = %self.state, %input, "transitioned");
                self.record(previous, input, true);
            }
            Err(e) => {
                warn!(%e, "input ignored");
                self.record(previous, input, false);
            }
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::TurnOn => {
                if self.fan_status() != DeviceStatus::On {
                    self.hass.turn(&self.config.fan, true);
                }
            }
            Command::TurnOff => {
                if self.fan_status() != DeviceStatus::Off {
                    self.hass.turn(&self.config.fan, false);
                }
            }
            Command::StartTimeout(duration) => self.start_timeout(duration),
            Command::CancelTimeout => self.cancel_timeout(),
        }
    }

    /// Schedule the delayed-off timer, replacing any pending one.
    fn start_timeout(&mut self, duration: Duration) {
        self.cancel_timeout();

        self.timer_epoch += 1;
        let epoch = self.timer_epoch;
        let events = self.events_tx.clone();

        debug!(?duration, epoch, "starting delayed-off timer");

        self.pending_timeout = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = events.send(ControllerEvent::Timeout { epoch });
        }));
    }

    fn cancel_timeout(&mut self) {
        if let Some(handle) = self.pending_timeout.take() {
            debug!("cancelling pending delayed-off timer");
            handle.abort();
        }
    }

    fn record(&mut self, previous: FanState, input: FanInput, accepted: bool) {
        let mut attributes = HashMap::new();
        attributes.insert("input".to_string(), json!(input.to_string()));
        attributes.insert("previous_state".to_string(), json!(previous.to_string()));

        self.hass.publish_status(StatusUpdate {
            name: self.config.status_entity(),
            state: self.state.to_string(),
            attributes,
        });

        self.last_transition = Some(TransitionRecord {
            previous,
            current: self.state,
            input,
            accepted,
        });
    }

    fn fan_status(&self) -> DeviceStatus {
        self.hass
            .get_state(&self.config.fan)
            .as_deref()
            .map(DeviceStatus::from)
            .unwrap_or(DeviceStatus::Unknown)
    }

    fn quiet_switch_on(&self) -> bool {
        let Some(switch) = &self.config.quiet_switch else {
            return false;
        };
        self.hass.get_state(switch).as_deref() == Some("on")
    }

    fn in_quiet_hours(&self) -> bool {
        self.config
            .quiet_hours
            .map(|hours| hours.contains(Local::now().time()))
            .unwrap_or(false)
    }

    fn read_numeric(&self, entity_id: &EntityId) -> Result<f64, ControllerError> {
        let raw = self
            .hass
            .get_state(entity_id)
            .ok_or_else(|| ControllerError::MissingReading {
                entity_id: entity_id.clone(),
            })?;
        parse_numeric(entity_id, &raw)
    }
}

fn parse_numeric(entity_id: &EntityId, raw: &str) -> Result<f64, ControllerError> {
    raw.trim()
        .parse()
        .map_err(|_| ControllerError::NonNumericReading {
            entity_id: entity_id.clone(),
            value: raw.to_string(),
        })
}
