//! Entity ID type representing a domain.object_id pair

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for invalid entity IDs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntityIdError {
    #[error("entity id must contain exactly one '.' separator")]
    InvalidFormat,

    #[error("entity id domain and object_id cannot be empty")]
    EmptyPart,

    #[error("entity id parts must be lowercase alphanumeric with underscores")]
    InvalidChars,
}

/// A validated entity reference such as `fan.master_bathroom` or
/// `sensor.living_room_humidity`.
///
/// Stored as the full `domain.object_id` string with the separator position
/// cached, so borrowing either part is free.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    id: String,
    separator: usize,
}

impl EntityId {
    /// Create a new EntityId from domain and object_id parts
    pub fn new(
        domain: impl AsRef<str>,
        object_id: impl AsRef<str>,
    ) -> Result<Self, EntityIdError> {
        format!("{}.{}", domain.as_ref(), object_id.as_ref()).parse()
    }

    /// The domain part (e.g. "fan")
    pub fn domain(&self) -> &str {
        &self.id[..self.separator]
    }

    /// The object_id part (e.g. "master_bathroom")
    pub fn object_id(&self) -> &str {
        &self.id[self.separator + 1..]
    }

    /// The full entity id as a string slice
    pub fn as_str(&self) -> &str {
        &self.id
    }

    fn is_valid_part(part: &str) -> bool {
        part.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.matches('.').count() != 1 {
            return Err(EntityIdError::InvalidFormat);
        }

        // Exactly one '.' is present, so split_once cannot fail
        let separator = s.find('.').ok_or(EntityIdError::InvalidFormat)?;
        let (domain, object_id) = (&s[..separator], &s[separator + 1..]);

        if domain.is_empty() || object_id.is_empty() {
            return Err(EntityIdError::EmptyPart);
        }
        if !Self::is_valid_part(domain) || !Self::is_valid_part(object_id) {
            return Err(EntityIdError::InvalidChars);
        }

        Ok(Self {
            id: s.to_string(),
            separator,
        })
    }
}

impl TryFrom<String> for EntityId {
    type Error = EntityIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> String {
        id.id
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_entity_id() {
        let id = EntityId::new("fan", "master_bathroom").unwrap();
        assert_eq!(id.domain(), "fan");
        assert_eq!(id.object_id(), "master_bathroom");
        assert_eq!(id.to_string(), "fan.master_bathroom");
    }

    #[test]
    fn test_parse_entity_id() {
        let id: EntityId = "sensor.humidity".parse().unwrap();
        assert_eq!(id.domain(), "sensor");
        assert_eq!(id.object_id(), "humidity");
    }

    #[test]
    fn test_invalid_format() {
        assert_eq!(
            "no_separator".parse::<EntityId>().unwrap_err(),
            EntityIdError::InvalidFormat
        );
        assert_eq!(
            "too.many.parts".parse::<EntityId>().unwrap_err(),
            EntityIdError::InvalidFormat
        );
    }

    #[test]
    fn test_empty_parts() {
        assert_eq!(
            ".object".parse::<EntityId>().unwrap_err(),
            EntityIdError::EmptyPart
        );
        assert_eq!(
            "domain.".parse::<EntityId>().unwrap_err(),
            EntityIdError::EmptyPart
        );
    }

    #[test]
    fn test_invalid_chars() {
        assert_eq!(
            "FAN.bathroom".parse::<EntityId>().unwrap_err(),
            EntityIdError::InvalidChars
        );
        assert_eq!(
            "fan.bath-room".parse::<EntityId>().unwrap_err(),
            EntityIdError::InvalidChars
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = EntityId::new("switch", "quiet_time").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"switch.quiet_time\"");

        let parsed: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_serde_rejects_invalid() {
        assert!(serde_json::from_str::<EntityId>("\"notanentity\"").is_err());
    }
}
