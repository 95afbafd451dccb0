//! GoldRush resources.
//!
//! Two static configuration listings and two chain status views. The chain
//! status views always fetch the full status collection; a single chain is
//! picked out locally.

use serde_json::{Value, json};
use tracing::warn;

use crate::client::GoldRushClient;
use crate::client::chains::{QUOTE_CURRENCIES, SUPPORTED_CHAINS};
use crate::core::error::{RegistryError, ToolError};
use crate::core::registry::{ResourceMeta, ResourceRequest};
use crate::core::session::SessionBuilder;

const JSON: &str = "application/json";

pub const SUPPORTED_CHAINS_URI: &str = "config://supported-chains";
pub const QUOTE_CURRENCIES_URI: &str = "config://quote-currencies";
pub const ALL_CHAINS_STATUS_URI: &str = "status://all-chains";
pub const CHAIN_STATUS_TEMPLATE: &str = "status://chain/{chainName}";

pub fn register_all(builder: &mut SessionBuilder) -> Result<(), RegistryError> {
    builder.resource(
        SUPPORTED_CHAINS_URI,
        ResourceMeta {
            name: "supported-chains",
            title: "Supported Chains",
            description: "Chain names accepted by the chainName parameter",
            mime_type: JSON,
        },
        supported_chains,
    )?;

    builder.resource(
        QUOTE_CURRENCIES_URI,
        ResourceMeta {
            name: "quote-currencies",
            title: "Quote Currencies",
            description: "Currency codes accepted by the quoteCurrency parameter",
            mime_type: JSON,
        },
        quote_currencies,
    )?;

    builder.resource(
        ALL_CHAINS_STATUS_URI,
        ResourceMeta {
            name: "all-chains-status",
            title: "All Chains Status",
            description: "Sync status and latest block of every supported chain",
            mime_type: JSON,
        },
        all_chains_status,
    )?;

    builder.resource_template(
        CHAIN_STATUS_TEMPLATE,
        ResourceMeta {
            name: "chain-status",
            title: "Chain Status",
            description: "Sync status of one chain, by name or numeric chain id",
            mime_type: JSON,
        },
        chain_status,
    )
}

async fn supported_chains(_client: GoldRushClient, _request: ResourceRequest) -> Result<Value, ToolError> {
    Ok(json!(SUPPORTED_CHAINS))
}

async fn quote_currencies(_client: GoldRushClient, _request: ResourceRequest) -> Result<Value, ToolError> {
    Ok(json!(QUOTE_CURRENCIES))
}

async fn all_chains_status(client: GoldRushClient, _request: ResourceRequest) -> Result<Value, ToolError> {
    Ok(client.all_chain_status().await?)
}

/// Read one chain's status entry.
///
/// Upstream failures and misses are reported in the payload rather than as
/// errors, so the read itself always succeeds.
async fn chain_status(client: GoldRushClient, request: ResourceRequest) -> Result<Value, ToolError> {
    let Some(chain) = request.params.get("chainName") else {
        return Ok(json!({ "error": "Failed to fetch chain status" }));
    };

    let status = match client.all_chain_status().await {
        Ok(data) if !data.is_null() => data,
        Ok(_) => {
            warn!(uri = %request.uri, "chain status response carried no data");
            return Ok(json!({ "error": "Failed to fetch chain status" }));
        }
        Err(err) => {
            warn!(uri = %request.uri, error = %err, "failed to fetch chain status");
            return Ok(json!({ "error": "Failed to fetch chain status" }));
        }
    };

    let items = status
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    Ok(match find_chain(items, chain) {
        Some(entry) => entry.clone(),
        None => json!({ "error": format!("Chain not found for: {chain}") }),
    })
}

/// First entry whose `name` equals `key`, or whose `chain_id` equals it when
/// `key` is an integer. `chain_id` may arrive as a number or a string.
fn find_chain<'a>(items: &'a [Value], key: &str) -> Option<&'a Value> {
    let id = key.parse::<i64>().ok();
    items.iter().find(|item| {
        if item.get("name").and_then(Value::as_str) == Some(key) {
            return true;
        }
        let Some(id) = id else { return false };
        match item.get("chain_id") {
            Some(Value::Number(n)) => n.as_i64() == Some(id),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok() == Some(id),
            _ => false,
        }
    })
}
