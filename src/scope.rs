//! Query scope: which hosts, groups or triggers an operation applies to.
//!
//! The variants are mutually exclusive (enforced at the CLI layer). Name
//! scopes resolve to numeric ids through the API; numeric scopes are
//! verified to exist. Zero matches fails fast with an actionable message.

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::api::{ApiError, HostGroup, ZabbixApi};

#[derive(Error, Debug)]
pub enum ScopeError {
    #[error("No hosts found")]
    NoHosts,
    #[error("No hostgroups found")]
    NoHostGroups,
    #[error("No triggers found")]
    NoTriggers,
    #[error("Hostid {0} does not exist")]
    UnknownHostId(u64),
    #[error("Hostgroupid {0} does not exist")]
    UnknownGroupId(u64),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// User-supplied scope selection, before resolution.
#[derive(Debug, Clone)]
pub enum Scope {
    /// Host names, or numeric host ids with `numeric`.
    Hosts(Vec<String>),
    /// Host group names, or numeric group ids with `numeric`.
    HostGroups(Vec<String>),
    /// Trigger ids are always numeric.
    Triggers(Vec<u64>),
    AllHosts,
}

/// Scope resolved to numeric ids, ready to parameterize an API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedScope {
    HostIds(Vec<u64>),
    GroupIds(Vec<u64>),
    TriggerIds(Vec<u64>),
    All,
}

impl ResolvedScope {
    /// Insert the scope parameter into an API call parameter map.
    pub fn apply_to(&self, call: &mut Map<String, Value>) {
        match self {
            ResolvedScope::HostIds(ids) => {
                call.insert("hostids".into(), json!(ids));
            }
            ResolvedScope::GroupIds(ids) => {
                call.insert("groupids".into(), json!(ids));
            }
            ResolvedScope::TriggerIds(ids) => {
                call.insert("objectids".into(), json!(ids));
            }
            ResolvedScope::All => {}
        }
    }
}

/// Keep only items that parse as numeric ids (non-digit items are ignored,
/// matching the historical behavior of the tools).
pub fn numeric_ids(items: &[String]) -> Vec<u64> {
    items.iter().filter_map(|s| s.parse::<u64>().ok()).collect()
}

impl Scope {
    /// Resolve the scope to numeric ids via the API.
    pub fn resolve(&self, api: &mut ZabbixApi, numeric: bool) -> Result<ResolvedScope, ScopeError> {
        match self {
            Scope::AllHosts => Ok(ResolvedScope::All),
            Scope::Triggers(ids) => {
                if ids.is_empty() {
                    Err(ScopeError::NoTriggers)
                } else {
                    Ok(ResolvedScope::TriggerIds(ids.clone()))
                }
            }
            Scope::HostGroups(args) => {
                let ids = if numeric {
                    let ids = numeric_ids(args);
                    for &id in &ids {
                        if !group_exists(api, id)? {
                            return Err(ScopeError::UnknownGroupId(id));
                        }
                    }
                    ids
                } else {
                    let groups: Vec<HostGroup> = api.call_typed(
                        "hostgroup.get",
                        json!({ "filter": { "name": args } }),
                    )?;
                    groups.into_iter().map(|g| g.groupid).collect()
                };
                if ids.is_empty() {
                    Err(ScopeError::NoHostGroups)
                } else {
                    Ok(ResolvedScope::GroupIds(ids))
                }
            }
            Scope::Hosts(args) => {
                let ids = if numeric {
                    let ids = numeric_ids(args);
                    for &id in &ids {
                        if !host_exists(api, id)? {
                            return Err(ScopeError::UnknownHostId(id));
                        }
                    }
                    ids
                } else {
                    let hosts: Vec<crate::api::Host> = api.call_typed(
                        "host.get",
                        json!({ "output": ["hostid"], "filter": { "host": args } }),
                    )?;
                    hosts.into_iter().map(|h| h.hostid).collect()
                };
                if ids.is_empty() {
                    Err(ScopeError::NoHosts)
                } else {
                    Ok(ResolvedScope::HostIds(ids))
                }
            }
        }
    }
}

fn group_exists(api: &mut ZabbixApi, id: u64) -> Result<bool, ApiError> {
    let groups: Vec<HostGroup> = api.call_typed(
        "hostgroup.get",
        json!({ "output": ["groupid"], "groupids": [id] }),
    )?;
    Ok(!groups.is_empty())
}

fn host_exists(api: &mut ZabbixApi, id: u64) -> Result<bool, ApiError> {
    let hosts: Vec<crate::api::Host> = api.call_typed(
        "host.get",
        json!({ "output": ["hostid"], "hostids": [id] }),
    )?;
    Ok(!hosts.is_empty())
}
