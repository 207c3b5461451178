//! Device status values as reported by the host runtime

use std::fmt;

/// Status of a device or sensor as reported by the host.
///
/// Host state values are free-form strings; this classifies the ones the
/// controller cares about and keeps anything else verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceStatus {
    On,
    Off,
    Unavailable,
    Unknown,
    Other(String),
}

impl DeviceStatus {
    /// Whether the host reports this entity as unavailable
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DeviceStatus::Unavailable)
    }

    /// Whether the host cannot report a real value for this entity
    ///
    /// Transitions to or from such a status must never reach the state
    /// machine.
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, DeviceStatus::Unavailable | DeviceStatus::Unknown)
    }
}

impl From<&str> for DeviceStatus {
    fn from(s: &str) -> Self {
        match s {
            "on" => DeviceStatus::On,
            "off" => DeviceStatus::Off,
            "unavailable" => DeviceStatus::Unavailable,
            "unknown" => DeviceStatus::Unknown,
            other => DeviceStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceStatus::On => f.write_str("on"),
            DeviceStatus::Off => f.write_str("off"),
            DeviceStatus::Unavailable => f.write_str("unavailable"),
            DeviceStatus::Unknown => f.write_str("unknown"),
            DeviceStatus::Other(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(DeviceStatus::from("on"), DeviceStatus::On);
        assert_eq!(DeviceStatus::from("off"), DeviceStatus::Off);
        assert_eq!(DeviceStatus::from("unavailable"), DeviceStatus::Unavailable);
        assert_eq!(DeviceStatus::from("unknown"), DeviceStatus::Unknown);
        assert_eq!(
            DeviceStatus::from("42.5"),
            DeviceStatus::Other("42.5".to_string())
        );
    }

    #[test]
    fn test_indeterminate() {
        assert!(DeviceStatus::Unavailable.is_indeterminate());
        assert!(DeviceStatus::Unknown.is_indeterminate());
        assert!(!DeviceStatus::On.is_indeterminate());
        assert!(!DeviceStatus::Other("standby".into()).is_indeterminate());
    }

    #[test]
    fn test_display_roundtrip() {
        for s in ["on", "off", "unavailable", "unknown", "cleaning"] {
            assert_eq!(DeviceStatus::from(s).to_string(), s);
        }
    }
}
