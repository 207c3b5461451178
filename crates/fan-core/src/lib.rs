//! Shared types for the shower-fan controller
//!
//! This crate provides the vocabulary used at the boundary between the
//! controller and the host smart-home runtime: EntityId, DeviceStatus,
//! and the payloads for state-change notifications and status reports.

mod entity_id;
mod payload;
mod status;

pub use entity_id::{EntityId, EntityIdError};
pub use payload::{StateChange, StatusUpdate};
pub use status::DeviceStatus;
