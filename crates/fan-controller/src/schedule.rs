//! Daily quiet-hours schedule
//!
//! The quiet window is a pair of wall-clock times; the window may wrap
//! past midnight (the default 23:00 to 06:00 does). A background task
//! delivers `QuietSchedule` events into the controller stream at each
//! boundary, replacing host-side daily callback registration.

use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::controller::ControllerEvent;

/// Which quiet-window boundary a schedule tick crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuietEdge {
    Begin,
    End,
}

/// A daily do-not-disturb window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    #[serde(default = "default_from")]
    pub from: NaiveTime,
    #[serde(default = "default_to")]
    pub to: NaiveTime,
}

fn default_from() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 0, 0).unwrap()
}

fn default_to() -> NaiveTime {
    NaiveTime::from_hms_opt(6, 0, 0).unwrap()
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            from: default_from(),
            to: default_to(),
        }
    }
}

impl QuietHours {
    /// Whether `time` falls inside the window.
    ///
    /// The window is half-open: it contains `from` and excludes `to`, so a
    /// tick exactly at `to` is already outside.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.from <= self.to {
            self.from <= time && time < self.to
        } else {
            // Wraps past midnight
            time >= self.from || time < self.to
        }
    }
}

/// Time until the next daily occurrence of `at`, seen from `now`
fn until_next(now: NaiveDateTime, at: NaiveTime) -> std::time::Duration {
    let today = now.date().and_time(at);
    let next = if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    };
    (next - now).to_std().unwrap_or_default()
}

/// Spawn the daily tick task for a quiet window.
///
/// Sends `QuietSchedule(Begin)` at `from` and `QuietSchedule(End)` at `to`,
/// every day, until the controller's receiver is dropped.
pub fn spawn_quiet_schedule(
    hours: QuietHours,
    events: UnboundedSender<ControllerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Local::now().naive_local();
            let to_begin = until_next(now, hours.from);
            let to_end = until_next(now, hours.to);

            let (wait, edge) = if to_begin <= to_end {
                (to_begin, QuietEdge::Begin)
            } else {
                (to_end, QuietEdge::End)
            };

            debug!(?wait, ?edge, "sleeping until next quiet-hours boundary");
            tokio::time::sleep(wait).await;

            if events.send(ControllerEvent::QuietSchedule(edge)).is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn test_default_window() {
        let hours = QuietHours::default();
        assert_eq!(hours.from, t(23, 0, 0));
        assert_eq!(hours.to, t(6, 0, 0));
    }

    #[test]
    fn test_contains_wrapping_window() {
        let hours = QuietHours::default();

        assert!(hours.contains(t(23, 0, 0)));
        assert!(hours.contains(t(23, 59, 59)));
        assert!(hours.contains(t(0, 0, 0)));
        assert!(hours.contains(t(5, 59, 59)));

        assert!(!hours.contains(t(6, 0, 0)));
        assert!(!hours.contains(t(12, 0, 0)));
        assert!(!hours.contains(t(22, 59, 59)));
    }

    #[test]
    fn test_contains_non_wrapping_window() {
        let hours = QuietHours {
            from: t(13, 0, 0),
            to: t(15, 0, 0),
        };

        assert!(hours.contains(t(13, 0, 0)));
        assert!(hours.contains(t(14, 30, 0)));
        assert!(!hours.contains(t(15, 0, 0)));
        assert!(!hours.contains(t(12, 59, 59)));
    }

    #[test]
    fn test_until_next_later_today() {
        let now = NaiveDateTime::parse_from_str("2024-03-01 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let wait = until_next(now, t(23, 0, 0));
        assert_eq!(wait, std::time::Duration::from_secs(13 * 3600));
    }

    #[test]
    fn test_until_next_rolls_to_tomorrow() {
        let now = NaiveDateTime::parse_from_str("2024-03-01 23:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let wait = until_next(now, t(23, 0, 0));
        assert_eq!(wait, std::time::Duration::from_secs(23 * 3600 + 1800));
    }

    #[test]
    fn test_until_next_at_exact_boundary_waits_a_day() {
        let now = NaiveDateTime::parse_from_str("2024-03-01 23:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let wait = until_next(now, t(23, 0, 0));
        assert_eq!(wait, std::time::Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_serde_window() {
        let hours: QuietHours =
            serde_yaml::from_str("from: \"21:00:00\"\nto: \"07:30:00\"\n").unwrap();
        assert_eq!(hours.from, t(21, 0, 0));
        assert_eq!(hours.to, t(7, 30, 0));
    }
}
