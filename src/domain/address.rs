//! Node address discovery from `multipass info --format json` output.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use serde::Deserialize;

use super::error::MalformedOutputError;
use super::id::NodeName;

#[derive(Debug, Deserialize)]
struct InfoPayload {
    info: HashMap<String, InstanceInfo>,
}

#[derive(Debug, Deserialize)]
struct InstanceInfo {
    #[serde(default)]
    ipv4: Vec<String>,
}

/// Parse the first IPv4 address reported for `node` in an info payload.
///
/// # Errors
///
/// Returns [`MalformedOutputError`] when the payload is empty, is not the
/// expected JSON shape, has no entry for the node, lists no IPv4 address,
/// or the first entry is not a valid address.
pub fn parse_node_address(node: &NodeName, payload: &str) -> Result<Ipv4Addr, MalformedOutputError> {
    if payload.trim().is_empty() {
        return Err(MalformedOutputError::EmptyOutput);
    }

    let parsed: InfoPayload = serde_json::from_str(payload)
        .map_err(|e| MalformedOutputError::InvalidJson(e.to_string()))?;

    let instance = parsed
        .info
        .get(node.as_str())
        .ok_or_else(|| MalformedOutputError::MissingInstance {
            node: node.to_string(),
        })?;

    let first = instance
        .ipv4
        .first()
        .ok_or_else(|| MalformedOutputError::MissingAddress {
            node: node.to_string(),
        })?;

    first
        .trim()
        .parse()
        .map_err(|_| MalformedOutputError::InvalidAddress {
            value: first.clone(),
        })
}
