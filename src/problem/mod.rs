//! Problem querying: fetch, enrichment, follow loop and output formats.

pub mod fetch;
pub mod format;
pub mod poller;

pub use fetch::*;
pub use poller::*;

use crate::api::Severity;

/// Sentinel shown when the trigger lookup missed for an event.
pub const UNKNOWN_HOST: &str = "<Unknown Host>";
pub const UNKNOWN_TRIGGER: &str = "<Unknown Trigger>";
pub const UNKNOWN_SEVERITY: &str = "<Unknown Severity>";

/// A problem joined with its trigger metadata.
///
/// Enrichment fields are optional: a trigger lookup miss yields `None`,
/// rendered as an explicit sentinel instead of failing the batch.
#[derive(Debug, Clone)]
pub struct EnrichedProblem {
    pub eventid: u64,
    /// Event creation time, Unix seconds.
    pub clock: i64,
    pub triggerid: u64,
    pub acknowledged: bool,
    pub severity: Option<Severity>,
    pub host_name: Option<String>,
    pub description: Option<String>,
}

impl EnrichedProblem {
    pub fn severity_label(&self) -> &str {
        self.severity.map(Severity::label).unwrap_or(UNKNOWN_SEVERITY)
    }

    pub fn host_label(&self) -> &str {
        self.host_name.as_deref().unwrap_or(UNKNOWN_HOST)
    }

    pub fn trigger_label(&self) -> &str {
        self.description.as_deref().unwrap_or(UNKNOWN_TRIGGER)
    }
}

/// The poller's only in-memory state: a monotonic high-water mark plus the
/// time window. Never persisted across process restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollCursor {
    /// Lower event-id bound for the next fetch (`last max + 1`).
    pub eventid_from: Option<u64>,
    pub time_from: Option<i64>,
    pub time_till: Option<i64>,
}

impl PollCursor {
    /// Initial cursor from the CLI time window.
    ///
    /// An explicit start time sets `time_from`, and a non-zero period then
    /// caps the window with `time_till = start + period`. Without a start
    /// time, a non-zero period looks back from `now`, uncapped.
    pub fn from_window(start_time: Option<i64>, time_period: i64, now: i64) -> Self {
        let mut cursor = PollCursor::default();
        match start_time {
            Some(start) => {
                cursor.time_from = Some(start);
                if time_period != 0 {
                    cursor.time_till = Some(start + time_period);
                }
            }
            None => {
                if time_period != 0 {
                    cursor.time_from = Some(now - time_period);
                }
            }
        }
        cursor
    }

    /// Advance after a poll. The upper time bound is dropped unconditionally
    /// once polling continues; the event-id bound only moves when the poll
    /// actually saw events.
    pub fn after_poll(&mut self, max_eventid: Option<u64>) {
        self.time_till = None;
        if let Some(max) = max_eventid {
            self.eventid_from = Some(max + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_with_start_time_is_capped() {
        let c = PollCursor::from_window(Some(1_000), 604_800, 9_999_999);
        assert_eq!(c.time_from, Some(1_000));
        assert_eq!(c.time_till, Some(605_800));
        assert_eq!(c.eventid_from, None);
    }

    #[test]
    fn test_window_without_start_time_looks_back_from_now() {
        let now = 2_000_000;
        let c = PollCursor::from_window(None, 604_800, now);
        assert_eq!(c.time_from, Some(now - 604_800));
        assert_eq!(c.time_till, None);
    }

    #[test]
    fn test_zero_period_disables_the_window() {
        let c = PollCursor::from_window(None, 0, 500);
        assert_eq!(c.time_from, None);
        assert_eq!(c.time_till, None);

        let c = PollCursor::from_window(Some(100), 0, 500);
        assert_eq!(c.time_from, Some(100));
        assert_eq!(c.time_till, None);
    }

    #[test]
    fn test_after_poll_advances_high_water_mark() {
        let mut c = PollCursor::from_window(Some(100), 3600, 0);
        c.after_poll(Some(41));
        assert_eq!(c.eventid_from, Some(42));
        assert_eq!(c.time_till, None, "upper bound dropped once polling continues");

        // An empty poll drops the cap but keeps the mark untouched.
        let mut c = PollCursor::from_window(Some(100), 3600, 0);
        c.after_poll(None);
        assert_eq!(c.eventid_from, None);
        assert_eq!(c.time_till, None);
    }
}
