//! Typed records for the Zabbix API payloads.
//!
//! The API encodes almost every scalar as a JSON string ("eventid": "123"),
//! so numeric fields go through explicit string adapters instead of relying
//! on permissive deserialization. Out-of-domain values are typed errors,
//! never a silent coercion.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Domain errors for value mappings.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid severity level: {0} (expected 0..=5)")]
    InvalidSeverity(i64),
    #[error("invalid acknowledged flag: {0} (expected 0 or 1)")]
    InvalidAck(i64),
}

/// Trigger severity, ordinal 0..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    NotClassified,
    Information,
    Warning,
    Average,
    High,
    Disaster,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Severity::NotClassified,
        Severity::Information,
        Severity::Warning,
        Severity::Average,
        Severity::High,
        Severity::Disaster,
    ];

    /// Human-readable label, matching the frontend spelling.
    pub fn label(self) -> &'static str {
        match self {
            Severity::NotClassified => "NOT CLASSIFIED",
            Severity::Information => "INFORMATION",
            Severity::Warning => "WARNING",
            Severity::Average => "AVERAGE",
            Severity::High => "HIGH",
            Severity::Disaster => "DISASTER",
        }
    }

    /// Single-word form usable as an HTML class name.
    pub fn css_class(self) -> &'static str {
        match self {
            Severity::NotClassified => "NOTCLASSIFIED",
            Severity::Information => "INFORMATION",
            Severity::Warning => "WARNING",
            Severity::Average => "AVERAGE",
            Severity::High => "HIGH",
            Severity::Disaster => "DISASTER",
        }
    }
}

impl TryFrom<i64> for Severity {
    type Error = ModelError;

    fn try_from(level: i64) -> Result<Self, ModelError> {
        match level {
            0 => Ok(Severity::NotClassified),
            1 => Ok(Severity::Information),
            2 => Ok(Severity::Warning),
            3 => Ok(Severity::Average),
            4 => Ok(Severity::High),
            5 => Ok(Severity::Disaster),
            other => Err(ModelError::InvalidSeverity(other)),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = de::int_string(deserializer)?;
        Severity::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// Map the API acknowledged flag ({0,1}) to a boolean.
pub fn ack_from_int(value: i64) -> Result<bool, ModelError> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ModelError::InvalidAck(other)),
    }
}

/// A problem event as returned by `problem.get` (trigger source only).
#[derive(Debug, Clone, Deserialize)]
pub struct Problem {
    #[serde(deserialize_with = "de::u64_string")]
    pub eventid: u64,
    /// Event creation time, Unix seconds.
    #[serde(deserialize_with = "de::i64_string")]
    pub clock: i64,
    /// Trigger reference.
    #[serde(deserialize_with = "de::u64_string")]
    pub objectid: u64,
    #[serde(deserialize_with = "de::ack_string")]
    pub acknowledged: bool,
}

/// Reference to a host as embedded in trigger/event payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct HostRef {
    #[serde(default)]
    pub host: String,
}

/// A trigger definition, joined onto problems for enrichment.
#[derive(Debug, Clone, Deserialize)]
pub struct Trigger {
    #[serde(default)]
    pub description: String,
    pub priority: Severity,
    #[serde(default)]
    pub hosts: Vec<HostRef>,
}

impl Trigger {
    /// Display name of the first attached host, if any.
    pub fn host_name(&self) -> Option<&str> {
        self.hosts.first().map(|h| h.host.as_str())
    }
}

/// Host inventory: a map of field name to value.
///
/// Hosts without inventory come back as an empty JSON array instead of an
/// object; both decode to an empty map.
#[derive(Debug, Clone, Default)]
pub struct Inventory(pub BTreeMap<String, String>);

impl Inventory {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Field names, excluding the internal hostid backreference.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str).filter(|k| *k != "hostid")
    }
}

impl<'de> Deserialize<'de> for Inventory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Map(BTreeMap<String, String>),
            // "no inventory" sentinel: []
            Empty(Vec<serde_json::Value>),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Map(m) => Ok(Inventory(m)),
            Repr::Empty(_) => Ok(Inventory::default()),
        }
    }
}

/// A host as returned by `host.get`.
#[derive(Debug, Clone, Deserialize)]
pub struct Host {
    #[serde(deserialize_with = "de::u64_string")]
    pub hostid: u64,
    #[serde(default)]
    pub host: String,
    /// 0 = monitored, 1 = disabled. Absent when not requested.
    #[serde(default, deserialize_with = "de::opt_i64_string")]
    pub status: Option<i64>,
    /// 0 = no maintenance. Absent when not requested.
    #[serde(default, deserialize_with = "de::opt_i64_string")]
    pub maintenance_status: Option<i64>,
    #[serde(default)]
    pub inventory: Inventory,
}

impl Host {
    /// Enabled and not under maintenance.
    pub fn is_active(&self) -> bool {
        self.status.unwrap_or(0) == 0 && self.maintenance_status.unwrap_or(0) == 0
    }
}

/// A host group as returned by `hostgroup.get`.
#[derive(Debug, Clone, Deserialize)]
pub struct HostGroup {
    #[serde(deserialize_with = "de::u64_string")]
    pub groupid: u64,
    #[serde(default)]
    pub name: String,
}

/// A host interface as returned by `hostinterface.get`.
#[derive(Debug, Clone, Deserialize)]
pub struct HostInterface {
    #[serde(deserialize_with = "de::u64_string")]
    pub interfaceid: u64,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub dns: String,
    #[serde(rename = "type", default, deserialize_with = "de::opt_i64_string")]
    pub kind: Option<i64>,
}

impl HostInterface {
    /// Interface type label (Agent/SNMP/IPMI/JMX).
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            Some(1) => "Agent",
            Some(2) => "SNMP",
            Some(3) => "IPMI",
            Some(4) => "JMX",
            _ => "Unknown",
        }
    }
}

/// A graph definition as returned by `graph.get`.
#[derive(Debug, Clone, Deserialize)]
pub struct Graph {
    #[serde(deserialize_with = "de::u64_string")]
    pub graphid: u64,
    #[serde(deserialize_with = "de::u32_string")]
    pub width: u32,
    #[serde(deserialize_with = "de::u32_string")]
    pub height: u32,
    #[serde(deserialize_with = "de::i64_string")]
    pub graphtype: i64,
}

/// Serde adapters for string-encoded scalars.
pub(crate) mod de {
    use serde::{Deserialize, Deserializer};

    pub fn int_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("expected integer string, got {s:?}")))
    }

    pub fn u64_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<u64>()
            .map_err(|_| serde::de::Error::custom(format!("expected integer string, got {s:?}")))
    }

    pub fn u32_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<u32>()
            .map_err(|_| serde::de::Error::custom(format!("expected integer string, got {s:?}")))
    }

    pub fn i64_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        int_string(deserializer)
    }

    pub fn opt_i64_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| {
                s.parse::<i64>().map_err(|_| {
                    serde::de::Error::custom(format!("expected integer string, got {s:?}"))
                })
            })
            .transpose()
    }

    pub fn ack_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = int_string(deserializer)?;
        super::ack_from_int(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping_total_over_domain() {
        let labels: Vec<&str> = (0..=5)
            .map(|n| Severity::try_from(n).unwrap().label())
            .collect();
        assert_eq!(
            labels,
            vec![
                "NOT CLASSIFIED",
                "INFORMATION",
                "WARNING",
                "AVERAGE",
                "HIGH",
                "DISASTER"
            ]
        );
        // Injective: all variants distinct
        for (i, a) in Severity::ALL.iter().enumerate() {
            for b in &Severity::ALL[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_severity_out_of_range_rejected() {
        assert_eq!(Severity::try_from(6), Err(ModelError::InvalidSeverity(6)));
        assert_eq!(Severity::try_from(-1), Err(ModelError::InvalidSeverity(-1)));
    }

    #[test]
    fn test_ack_mapping() {
        assert_eq!(ack_from_int(0), Ok(false));
        assert_eq!(ack_from_int(1), Ok(true));
        assert_eq!(ack_from_int(2), Err(ModelError::InvalidAck(2)));
        assert_eq!(ack_from_int(7), Err(ModelError::InvalidAck(7)));
    }

    #[test]
    fn test_problem_decodes_string_scalars() {
        let p: Problem = serde_json::from_value(serde_json::json!({
            "eventid": "4723",
            "clock": "1735207200",
            "objectid": "991",
            "acknowledged": "0",
            "name": "High CPU on web01"
        }))
        .unwrap();
        assert_eq!(p.eventid, 4723);
        assert_eq!(p.clock, 1_735_207_200);
        assert_eq!(p.objectid, 991);
        assert!(!p.acknowledged);
    }

    #[test]
    fn test_problem_rejects_bad_ack() {
        let res: Result<Problem, _> = serde_json::from_value(serde_json::json!({
            "eventid": "1",
            "clock": "0",
            "objectid": "1",
            "acknowledged": "2"
        }));
        assert!(res.is_err());
    }

    #[test]
    fn test_inventory_empty_array_is_empty_map() {
        let h: Host = serde_json::from_value(serde_json::json!({
            "hostid": "10084",
            "host": "web01",
            "inventory": []
        }))
        .unwrap();
        assert!(h.inventory.is_empty());

        let h: Host = serde_json::from_value(serde_json::json!({
            "hostid": "10084",
            "host": "web01",
            "inventory": {"os": "Debian 12", "hostid": "10084"}
        }))
        .unwrap();
        assert_eq!(h.inventory.get("os"), Some("Debian 12"));
        // hostid backreference is not a user-facing field
        assert_eq!(h.inventory.field_names().collect::<Vec<_>>(), vec!["os"]);
    }

    #[test]
    fn test_host_active_flags() {
        let h: Host = serde_json::from_value(serde_json::json!({
            "hostid": "1", "host": "a", "status": "0", "maintenance_status": "0"
        }))
        .unwrap();
        assert!(h.is_active());
        let h: Host = serde_json::from_value(serde_json::json!({
            "hostid": "2", "host": "b", "status": "1", "maintenance_status": "0"
        }))
        .unwrap();
        assert!(!h.is_active());
        let h: Host = serde_json::from_value(serde_json::json!({
            "hostid": "3", "host": "c", "status": "0", "maintenance_status": "1"
        }))
        .unwrap();
        assert!(!h.is_active());
    }

    #[test]
    fn test_interface_kind_labels() {
        let i: HostInterface = serde_json::from_value(serde_json::json!({
            "interfaceid": "7", "ip": "10.0.0.1", "dns": "", "type": "2"
        }))
        .unwrap();
        assert_eq!(i.kind_label(), "SNMP");
    }
}
