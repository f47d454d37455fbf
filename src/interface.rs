//! Host interface lookup and rendering.

use serde_json::json;
use thiserror::Error;

use crate::api::{ApiError, Host, HostInterface, ZabbixApi};

#[derive(Error, Debug)]
pub enum InterfaceError {
    #[error("Could not find host {0}")]
    HostNotFound(String),
    #[error("No interfaces defined for {0}")]
    NoInterfaces(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Output shapes for the interface listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceFormat {
    /// `ip (dns: name)`, dns part only when set.
    Default,
    /// Numeric interface id only.
    Numeric,
    /// `id:ip (kind)`.
    Extended,
}

/// Fetch all interfaces of one host, by host name.
pub fn fetch_interfaces(
    api: &mut ZabbixApi,
    host_name: &str,
) -> Result<Vec<HostInterface>, InterfaceError> {
    let hosts: Vec<Host> = api.call_typed(
        "host.get",
        json!({ "output": "extend", "filter": { "host": host_name } }),
    )?;
    let host = hosts
        .first()
        .ok_or_else(|| InterfaceError::HostNotFound(host_name.to_string()))?;

    let interfaces: Vec<HostInterface> = api.call_typed(
        "hostinterface.get",
        json!({ "output": "extend", "hostids": host.hostid }),
    )?;
    if interfaces.is_empty() {
        return Err(InterfaceError::NoInterfaces(host_name.to_string()));
    }
    Ok(interfaces)
}

pub fn format_interface(interface: &HostInterface, format: InterfaceFormat) -> String {
    match format {
        InterfaceFormat::Numeric => interface.interfaceid.to_string(),
        InterfaceFormat::Extended => format!(
            "{}:{} ({})",
            interface.interfaceid,
            interface.ip,
            interface.kind_label()
        ),
        InterfaceFormat::Default => {
            if interface.dns.is_empty() {
                interface.ip.clone()
            } else {
                format!("{} (dns: {})", interface.ip, interface.dns)
            }
        }
    }
}
