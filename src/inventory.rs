//! Host inventory queries and CSV output.

use std::io::Write;

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::api::{ApiError, Host, ZabbixApi};
use crate::scope::{Scope, ScopeError};

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("No hosts found")]
    NoHosts,
    #[error("No results")]
    NoResults,
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("CSV output failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Which inventory fields to return.
#[derive(Debug, Clone)]
pub enum FieldSelection {
    All,
    Fields(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct InventoryQuery {
    pub scope: Scope,
    pub numeric: bool,
    /// Only monitored hosts.
    pub monitored: bool,
    /// Only hosts that have inventory data.
    pub with_inventory: bool,
    pub fields: FieldSelection,
}

/// Fetch inventory rows for the selected hosts.
pub fn fetch_inventory(
    api: &mut ZabbixApi,
    query: &InventoryQuery,
) -> Result<Vec<Host>, InventoryError> {
    let resolved = query.scope.resolve(api, query.numeric)?;

    // First pass: the member host ids, honoring the host filters.
    let mut listing = Map::new();
    listing.insert("output".into(), json!(["hostid"]));
    if query.monitored {
        listing.insert("monitored_hosts".into(), json!(true));
    }
    if query.with_inventory {
        listing.insert("withInventory".into(), json!(true));
    }
    resolved.apply_to(&mut listing);

    let members: Vec<Host> = api.call_typed("host.get", Value::Object(listing))?;
    let hostids: Vec<u64> = members.into_iter().map(|h| h.hostid).collect();
    if hostids.is_empty() {
        return Err(InventoryError::NoHosts);
    }

    // Second pass: the actual inventory payload.
    let select = match &query.fields {
        FieldSelection::All => json!(true),
        FieldSelection::Fields(fields) => json!(fields),
    };
    let rows: Vec<Host> = api.call_typed(
        "host.get",
        json!({
            "output": ["host", "hostid"],
            "hostids": hostids,
            "selectInventory": select,
        }),
    )?;
    if rows.is_empty() {
        return Err(InventoryError::NoResults);
    }
    Ok(rows)
}

/// Column names after `id` and `host`: the requested fields, or for the
/// all-fields query whatever the first row's inventory carries.
pub fn column_fields(rows: &[Host], selection: &FieldSelection) -> Vec<String> {
    match selection {
        FieldSelection::Fields(fields) => fields.clone(),
        FieldSelection::All => rows
            .first()
            .map(|h| h.inventory.field_names().map(str::to_string).collect())
            .unwrap_or_default(),
    }
}

/// Write the rows as RFC 4180 CSV with every field quoted.
pub fn write_csv<W: Write>(
    rows: &[Host],
    selection: &FieldSelection,
    out: W,
) -> Result<(), InventoryError> {
    let fields = column_fields(rows, selection);
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(out);

    let mut header = vec!["id".to_string(), "host".to_string()];
    header.extend(fields.iter().cloned());
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.hostid.to_string(), row.host.clone()];
        for field in &fields {
            let value = if row.inventory.is_empty() {
                ""
            } else {
                row.inventory.get(field).unwrap_or("")
            };
            record.push(value.to_string());
        }
        writer.write_record(&record)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
