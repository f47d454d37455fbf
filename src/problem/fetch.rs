//! Problem fetch and enrichment.
//!
//! One `problem.get` per poll, then a bulk `trigger.get` join for severity,
//! description and host name, then a bulk `host.get` to drop problems on
//! disabled or in-maintenance hosts. All calls are read-only.

use std::collections::HashMap;

use serde_json::{json, Map, Value};

use crate::api::{ApiError, Host, Problem, Trigger, ZabbixApi};
use crate::scope::ResolvedScope;

use super::{EnrichedProblem, PollCursor};

/// Query settings that stay fixed across polls.
#[derive(Debug, Clone)]
pub struct ProblemQuery {
    pub scope: ResolvedScope,
    /// Maximum rows per fetch; 0 disables the limit.
    pub limit: u64,
    /// Include acknowledged problems (excluded by default).
    pub include_ack: bool,
}

/// Build the `problem.get` parameter object for one poll.
pub fn build_params(query: &ProblemQuery, cursor: &PollCursor) -> Value {
    let mut call = Map::new();
    call.insert("sortfield".into(), json!("eventid"));
    call.insert("sortorder".into(), json!("DESC"));
    call.insert("output".into(), json!("extend"));
    call.insert("source".into(), json!(0));

    if query.limit != 0 {
        call.insert("limit".into(), json!(query.limit));
    }
    // Without the parameter the API returns both; `false` means
    // unacknowledged only.
    if !query.include_ack {
        call.insert("acknowledged".into(), json!(false));
    }
    if let Some(from) = cursor.time_from {
        call.insert("time_from".into(), json!(from));
    }
    if let Some(till) = cursor.time_till {
        call.insert("time_till".into(), json!(till));
    }
    if let Some(eventid_from) = cursor.eventid_from {
        call.insert("eventid_from".into(), json!(eventid_from));
    }
    query.scope.apply_to(&mut call);

    Value::Object(call)
}

/// Fetch one batch of problems.
///
/// Elements that fail to decode (for example an out-of-domain acknowledged
/// flag) are skipped with a warning; a single malformed event never aborts
/// the run.
pub fn fetch_problems(
    api: &mut ZabbixApi,
    query: &ProblemQuery,
    cursor: &PollCursor,
) -> Result<Vec<Problem>, ApiError> {
    let raw = api.call("problem.get", build_params(query, cursor))?;
    let rows = raw
        .as_array()
        .ok_or_else(|| ApiError::Decode("problem.get did not return an array".into()))?;

    let mut problems = Vec::with_capacity(rows.len());
    for row in rows {
        match serde_json::from_value::<Problem>(row.clone()) {
            Ok(p) => problems.push(p),
            Err(err) => tracing::warn!("skipping malformed problem event: {}", err),
        }
    }
    Ok(problems)
}

/// Join trigger metadata onto a batch of problems.
///
/// A trigger lookup miss leaves the enrichment fields empty (rendered as
/// sentinels downstream). Problems on hosts that are disabled or under
/// maintenance are dropped; problems whose host is unknown are kept.
pub fn enrich(
    api: &mut ZabbixApi,
    problems: &[Problem],
) -> Result<Vec<EnrichedProblem>, ApiError> {
    if problems.is_empty() {
        return Ok(Vec::new());
    }

    let mut triggerids: Vec<u64> = problems.iter().map(|p| p.objectid).collect();
    triggerids.sort_unstable();
    triggerids.dedup();

    let raw = api.call(
        "trigger.get",
        json!({
            "triggerids": triggerids,
            "output": "extend",
            "expandDescription": 1,
            "expandComment": 1,
            "preservekeys": 1,
            "selectHosts": "extend",
        }),
    )?;
    // With preservekeys the result is an object keyed by trigger id; an
    // empty result degrades to an array. Individual malformed triggers are
    // skipped, not fatal.
    let mut triggers: HashMap<String, Trigger> = HashMap::new();
    match raw {
        Value::Object(entries) => {
            for (id, value) in entries {
                match serde_json::from_value::<Trigger>(value) {
                    Ok(trigger) => {
                        triggers.insert(id, trigger);
                    }
                    Err(err) => tracing::warn!("skipping malformed trigger {}: {}", id, err),
                }
            }
        }
        Value::Array(entries) if entries.is_empty() => {}
        _ => {
            return Err(ApiError::Decode(
                "trigger.get did not return an object".into(),
            ))
        }
    }

    let active = host_activity(api, &triggers)?;

    let mut enriched = Vec::with_capacity(problems.len());
    for problem in problems {
        let trigger = triggers.get(&problem.objectid.to_string());
        let host_name = trigger.and_then(|t| t.host_name()).map(str::to_string);

        if let Some(name) = &host_name {
            if let Some(false) = active.get(name.as_str()).copied() {
                tracing::debug!("dropping problem {} on inactive host {}", problem.eventid, name);
                continue;
            }
        }

        enriched.push(EnrichedProblem {
            eventid: problem.eventid,
            clock: problem.clock,
            triggerid: problem.objectid,
            acknowledged: problem.acknowledged,
            severity: trigger.map(|t| t.priority),
            host_name,
            description: trigger.map(|t| t.description.clone()),
        });
    }
    Ok(enriched)
}

/// Bulk lookup of host status: name -> enabled-and-not-in-maintenance.
fn host_activity(
    api: &mut ZabbixApi,
    triggers: &HashMap<String, Trigger>,
) -> Result<HashMap<String, bool>, ApiError> {
    let mut names: Vec<&str> = triggers.values().filter_map(Trigger::host_name).collect();
    names.sort_unstable();
    names.dedup();
    if names.is_empty() {
        return Ok(HashMap::new());
    }

    let hosts: Vec<Host> = api.call_typed(
        "host.get",
        json!({
            "output": ["hostid", "host", "status", "maintenance_status"],
            "filter": { "host": names },
        }),
    )?;
    Ok(hosts
        .into_iter()
        .map(|h| (h.host.clone(), h.is_active()))
        .collect())
}
