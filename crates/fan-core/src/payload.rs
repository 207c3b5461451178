//! Payloads crossing the host boundary

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::EntityId;

/// A state-change notification for a single entity.
///
/// `old` is `None` the first time an entity reports a state, `new` is
/// `None` when the entity is removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub entity_id: EntityId,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// A status report published by the controller for observability.
///
/// Mirrors what a dashboard sensor would show: the current FSM state plus
/// metadata about the last processed input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// Name of the status entity, e.g. `sensor.shower_fan_fan_state_machine`
    pub name: String,

    /// Current FSM state
    pub state: String,

    /// Last-transition metadata (input, previous state)
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}
