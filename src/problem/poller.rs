//! The follow loop: repeated polls with a synthesized monotonic cursor.
//!
//! The API offers no streaming primitive, only point-in-time queries with a
//! sort and limit, so continuity is built client-side: after every poll the
//! lower event-id bound moves to `last max + 1`, which yields no duplicates
//! and no gaps as long as event ids increase monotonically at the source.
//!
//! Each iteration resolves to a typed outcome with an explicit policy:
//! events and empty polls continue, transport errors retry with a bounded
//! doubling backoff, API errors exit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;

use crate::api::{ApiError, ZabbixApi};

use super::fetch::{enrich, fetch_problems, ProblemQuery};
use super::{EnrichedProblem, PollCursor};

/// Granularity of stop-flag checks while sleeping.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

#[derive(Error, Debug)]
pub enum PollerError {
    #[error("no events found")]
    NoEvents,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// One poll against the event source.
pub trait ProblemSource {
    fn poll(&mut self, cursor: &PollCursor) -> Result<Vec<EnrichedProblem>, ApiError>;
}

/// The real source: `problem.get` plus trigger enrichment.
pub struct ApiProblemSource<'a> {
    api: &'a mut ZabbixApi,
    query: ProblemQuery,
    /// Skip the trigger join (ids-only output needs no metadata).
    raw: bool,
}

impl<'a> ApiProblemSource<'a> {
    pub fn new(api: &'a mut ZabbixApi, query: ProblemQuery) -> Self {
        Self {
            api,
            query,
            raw: false,
        }
    }

    pub fn without_enrichment(api: &'a mut ZabbixApi, query: ProblemQuery) -> Self {
        Self {
            api,
            query,
            raw: true,
        }
    }
}

impl ProblemSource for ApiProblemSource<'_> {
    fn poll(&mut self, cursor: &PollCursor) -> Result<Vec<EnrichedProblem>, ApiError> {
        let problems = fetch_problems(self.api, &self.query, cursor)?;
        if self.raw {
            Ok(problems
                .into_iter()
                .map(|p| EnrichedProblem {
                    eventid: p.eventid,
                    clock: p.clock,
                    triggerid: p.objectid,
                    acknowledged: p.acknowledged,
                    severity: None,
                    host_name: None,
                    description: None,
                })
                .collect())
        } else {
            enrich(self.api, &problems)
        }
    }
}

/// Follow-mode tuning.
#[derive(Debug, Clone)]
pub struct FollowOptions {
    /// Delay between polls.
    pub interval: Duration,
    /// Retry budget for transient errors before giving up.
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for FollowOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

/// Outcome of a single poll iteration.
#[derive(Debug)]
pub enum IterationOutcome {
    Events(Vec<EnrichedProblem>),
    Empty,
    Transient(ApiError),
    Fatal(ApiError),
}

fn classify(result: Result<Vec<EnrichedProblem>, ApiError>) -> IterationOutcome {
    match result {
        Ok(batch) if batch.is_empty() => IterationOutcome::Empty,
        Ok(batch) => IterationOutcome::Events(batch),
        Err(err) if err.is_transient() => IterationOutcome::Transient(err),
        Err(err) => IterationOutcome::Fatal(err),
    }
}

/// One-shot mode: a single fetch. Zero events is a user-facing failure
/// here, unlike in follow mode.
pub fn run_once(
    source: &mut dyn ProblemSource,
    cursor: &mut PollCursor,
) -> Result<Vec<EnrichedProblem>, PollerError> {
    let batch = source.poll(cursor)?;
    if batch.is_empty() {
        return Err(PollerError::NoEvents);
    }
    cursor.after_poll(batch.iter().map(|p| p.eventid).max());
    Ok(batch)
}

/// Follow mode: poll until the stop flag is raised.
///
/// Emission order is the order received from the API (event id descending,
/// newest first), consistently across fetches. The stop flag is observed
/// between iterations and while sleeping; an in-flight call always runs to
/// completion first.
pub fn run_follow<S, F>(
    source: &mut S,
    cursor: &mut PollCursor,
    options: &FollowOptions,
    stop: &AtomicBool,
    mut emit: F,
) -> Result<(), PollerError>
where
    S: ProblemSource,
    F: FnMut(&[EnrichedProblem]),
{
    let mut retries = 0u32;
    let mut backoff = options.initial_backoff;

    while !stop.load(Ordering::Relaxed) {
        match classify(source.poll(cursor)) {
            IterationOutcome::Events(batch) => {
                retries = 0;
                backoff = options.initial_backoff;
                emit(&batch);
                cursor.after_poll(batch.iter().map(|p| p.eventid).max());
                if !sleep_interruptible(options.interval, stop) {
                    break;
                }
            }
            IterationOutcome::Empty => {
                retries = 0;
                backoff = options.initial_backoff;
                cursor.after_poll(None);
                if !sleep_interruptible(options.interval, stop) {
                    break;
                }
            }
            IterationOutcome::Transient(err) => {
                if retries >= options.max_retries {
                    return Err(err.into());
                }
                retries += 1;
                tracing::warn!(
                    "poll failed ({}), retry {}/{} in {:?}",
                    err,
                    retries,
                    options.max_retries,
                    backoff
                );
                if !sleep_interruptible(backoff, stop) {
                    break;
                }
                backoff *= 2;
            }
            IterationOutcome::Fatal(err) => return Err(err.into()),
        }
    }

    tracing::info!("follow loop stopped");
    Ok(())
}

/// Sleep in small slices, watching the stop flag.
///
/// Returns `false` when the flag was raised before the full duration
/// elapsed.
fn sleep_interruptible(duration: Duration, stop: &AtomicBool) -> bool {
    let mut remaining = duration;
    while !remaining.is_zero() {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let slice = remaining.min(SLEEP_SLICE);
        std::thread::sleep(slice);
        remaining -= slice;
    }
    !stop.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn problem(eventid: u64) -> EnrichedProblem {
        EnrichedProblem {
            eventid,
            clock: 1_700_000_000,
            triggerid: 1,
            acknowledged: false,
            severity: None,
            host_name: None,
            description: None,
        }
    }

    /// Scripted source: plays back batches, then raises the stop flag.
    struct FakeSource {
        script: VecDeque<Result<Vec<EnrichedProblem>, ApiError>>,
        cursors: Vec<PollCursor>,
        stop: Arc<AtomicBool>,
    }

    impl ProblemSource for FakeSource {
        fn poll(&mut self, cursor: &PollCursor) -> Result<Vec<EnrichedProblem>, ApiError> {
            self.cursors.push(cursor.clone());
            match self.script.pop_front() {
                Some(step) => {
                    if self.script.is_empty() {
                        self.stop.store(true, Ordering::Relaxed);
                    }
                    step
                }
                None => {
                    self.stop.store(true, Ordering::Relaxed);
                    Ok(Vec::new())
                }
            }
        }
    }

    fn fast_options() -> FollowOptions {
        FollowOptions {
            interval: Duration::ZERO,
            max_retries: 3,
            initial_backoff: Duration::ZERO,
        }
    }

    /// A transport-class error, built without touching the network.
    fn transport_error() -> ApiError {
        let err = reqwest::blocking::Client::new()
            .get("http://")
            .send()
            .unwrap_err();
        ApiError::Transport(err)
    }

    #[test]
    fn test_follow_advances_cursor_without_gaps_or_repeats() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut source = FakeSource {
            script: VecDeque::from(vec![
                Ok(vec![problem(5), problem(4), problem(3)]),
                Ok(vec![problem(9), problem(8)]),
            ]),
            cursors: Vec::new(),
            stop: stop.clone(),
        };

        let mut cursor = PollCursor::from_window(None, 3_600, 10_000);
        let mut emitted: Vec<u64> = Vec::new();
        run_follow(&mut source, &mut cursor, &fast_options(), &stop, |batch| {
            emitted.extend(batch.iter().map(|p| p.eventid));
        })
        .unwrap();

        // Lower bound of poll N+1 is exactly max(poll N) + 1.
        assert_eq!(source.cursors[0].eventid_from, None);
        assert_eq!(source.cursors[1].eventid_from, Some(6));
        // Upper bound never reappears once polling continues.
        assert_eq!(source.cursors[1].time_till, None);

        // All ids emitted exactly once, in the order received.
        assert_eq!(emitted, vec![5, 4, 3, 9, 8]);
        let mut unique = emitted.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), emitted.len());

        assert_eq!(cursor.eventid_from, Some(10));
    }

    #[test]
    fn test_follow_treats_empty_poll_as_normal_iteration() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut source = FakeSource {
            script: VecDeque::from(vec![Ok(vec![]), Ok(vec![problem(2)]), Ok(vec![])]),
            cursors: Vec::new(),
            stop: stop.clone(),
        };
        let mut cursor = PollCursor::default();
        let mut emitted = 0usize;
        run_follow(&mut source, &mut cursor, &fast_options(), &stop, |batch| {
            emitted += batch.len();
        })
        .unwrap();
        assert_eq!(emitted, 1);
        assert_eq!(source.cursors.len(), 3);
    }

    #[test]
    fn test_follow_retries_transient_errors_then_recovers() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut source = FakeSource {
            script: VecDeque::from(vec![
                Err(transport_error()),
                Err(transport_error()),
                Ok(vec![problem(7)]),
            ]),
            cursors: Vec::new(),
            stop: stop.clone(),
        };
        let mut cursor = PollCursor::default();
        let mut emitted: Vec<u64> = Vec::new();
        run_follow(&mut source, &mut cursor, &fast_options(), &stop, |batch| {
            emitted.extend(batch.iter().map(|p| p.eventid));
        })
        .unwrap();
        assert_eq!(emitted, vec![7]);
    }

    #[test]
    fn test_follow_gives_up_after_retry_budget() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut source = FakeSource {
            script: VecDeque::from(vec![
                Err(transport_error()),
                Err(transport_error()),
                Err(transport_error()),
                Err(transport_error()),
                Err(transport_error()),
            ]),
            cursors: Vec::new(),
            stop: stop.clone(),
        };
        let mut cursor = PollCursor::default();
        let result = run_follow(
            &mut source,
            &mut cursor,
            &fast_options(),
            &stop,
            |_batch| {},
        );
        assert!(matches!(result, Err(PollerError::Api(_))));
        // initial attempt + 3 retries
        assert_eq!(source.cursors.len(), 4);
    }

    #[test]
    fn test_follow_exits_on_fatal_api_error() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut source = FakeSource {
            script: VecDeque::from(vec![Err(ApiError::Rpc {
                code: -32602,
                message: "Invalid params.".into(),
                data: String::new(),
            })]),
            cursors: Vec::new(),
            stop: stop.clone(),
        };
        let mut cursor = PollCursor::default();
        let result = run_follow(
            &mut source,
            &mut cursor,
            &fast_options(),
            &stop,
            |_batch| {},
        );
        assert!(matches!(result, Err(PollerError::Api(ApiError::Rpc { .. }))));
        assert_eq!(source.cursors.len(), 1, "no retry for API-level errors");
    }

    #[test]
    fn test_one_shot_empty_is_a_failure() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut source = FakeSource {
            script: VecDeque::from(vec![Ok(vec![])]),
            cursors: Vec::new(),
            stop,
        };
        let mut cursor = PollCursor::default();
        let result = run_once(&mut source, &mut cursor);
        assert!(matches!(result, Err(PollerError::NoEvents)));
    }

    #[test]
    fn test_one_shot_returns_batch_in_received_order() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut source = FakeSource {
            script: VecDeque::from(vec![Ok(vec![problem(12), problem(11)])]),
            cursors: Vec::new(),
            stop,
        };
        let mut cursor = PollCursor::default();
        let batch = run_once(&mut source, &mut cursor).unwrap();
        let ids: Vec<u64> = batch.iter().map(|p| p.eventid).collect();
        assert_eq!(ids, vec![12, 11]);
        assert_eq!(cursor.eventid_from, Some(13));
    }
}
