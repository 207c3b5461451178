//! In-process state hub
//!
//! The hub tracks the last reported state of every entity and broadcasts
//! state changes to subscribers. It is the controller's view of the
//! outside world: reads answer from the tracked states, device commands
//! are written back as state updates, and published status reports are
//! retained for inspection.

use dashmap::DashMap;
use fan_controller::{ControllerEvent, Hass};
use fan_core::{EntityId, StateChange, StatusUpdate};
use tokio::sync::{broadcast, mpsc::UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Default channel capacity for change subscriptions
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Entity state tracker and change broker
pub struct Hub {
    /// Last reported state per entity
    states: DashMap<EntityId, String>,
    /// Published status reports, keyed by status entity name
    statuses: DashMap<String, StatusUpdate>,
    /// Broadcast channel for state-change notifications
    changes_tx: broadcast::Sender<StateChange>,
}

impl Hub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (changes_tx, _) = broadcast::channel(capacity);
        Self {
            states: DashMap::new(),
            statuses: DashMap::new(),
            changes_tx,
        }
    }

    /// Record a new state for an entity and notify subscribers.
    ///
    /// Returns the previous state, if any.
    pub fn set(&self, entity_id: EntityId, state: impl Into<String>) -> Option<String> {
        let state = state.into();
        let old = self.states.insert(entity_id.clone(), state.clone());

        debug!(%entity_id, %state, "entity state updated");

        // Send errors only mean there are no active receivers
        let _ = self.changes_tx.send(StateChange {
            entity_id,
            old: old.clone(),
            new: Some(state),
        });

        old
    }

    /// Last reported state of an entity
    pub fn get(&self, entity_id: &EntityId) -> Option<String> {
        self.states.get(entity_id).map(|s| s.clone())
    }

    /// Subscribe to all state changes
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.changes_tx.subscribe()
    }

    /// Last status report published under `name`
    pub fn status(&self, name: &str) -> Option<StatusUpdate> {
        self.statuses.get(name).map(|s| s.clone())
    }

    /// Number of tracked entities
    pub fn entity_count(&self) -> usize {
        self.states.len()
    }

    /// Spawn a task forwarding every state change into a controller's
    /// event stream. The task ends when either side is dropped.
    pub fn forward_changes(&self, events: UnboundedSender<ControllerEvent>) -> JoinHandle<()> {
        let mut changes = self.subscribe();

        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => {
                        if events.send(ControllerEvent::StateChange(change)).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "change subscriber lagged, notifications dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl Hass for Hub {
    fn get_state(&self, entity_id: &EntityId) -> Option<String> {
        self.get(entity_id)
    }

    /// Device commands are reflected straight back as state updates, so
    /// the change flows through the same subscription path as external
    /// notifications.
    fn turn(&self, entity_id: &EntityId, on: bool) {
        let state = if on { "on" } else { "off" };
        debug!(%entity_id, state, "turning entity");
        self.set(entity_id.clone(), state);
    }

    fn publish_status(&self, status: StatusUpdate) {
        self.statuses.insert(status.name.clone(), status);
    }
}
