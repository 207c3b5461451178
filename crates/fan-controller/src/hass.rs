//! Host runtime boundary

use fan_core::{EntityId, StatusUpdate};

/// Interface to the host smart-home runtime.
///
/// Injected at construction so tests can substitute a recording fake; the
/// in-memory implementation lives in `fan-hub`. Subscriptions and timer
/// scheduling are not part of this trait: notifications reach the
/// controller through its serialized event stream instead.
pub trait Hass: Send + Sync {
    /// Read the current reported state of an entity, if it has one.
    fn get_state(&self, entity_id: &EntityId) -> Option<String>;

    /// Issue a power command.
    ///
    /// Fire and forget: the result is not awaited and never trusted. The
    /// device's actual state arrives later as a state-change notification.
    fn turn(&self, entity_id: &EntityId, on: bool);

    /// Report the controller's state machine for observability.
    fn publish_status(&self, status: StatusUpdate);
}
