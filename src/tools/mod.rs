//! GoldRush tools.
//!
//! Each service module exports a `register` function that adds its tools to
//! a [`SessionBuilder`]. Parameter declarations shared across services live
//! here so that every tool spells `chainName`, `walletAddress` and
//! `quoteCurrency` the same way.

pub mod all_chains;
pub mod balance;
pub mod base;
pub mod bitcoin;
pub mod nft;
pub mod pricing;
pub mod security;
pub mod transaction;

use serde::Deserialize;
use serde_json::json;

use crate::client::chains::{DEFAULT_QUOTE_CURRENCY, QUOTE_CURRENCIES, SUPPORTED_CHAINS};
use crate::core::error::RegistryError;
use crate::core::pagination::Aggregation;
use crate::core::schema::{ParamKind, ParamSpec};
use crate::core::session::SessionBuilder;

/// Register every service's tools, in listing order.
pub fn register_all(builder: &mut SessionBuilder) -> Result<(), RegistryError> {
    all_chains::register(builder)?;
    balance::register(builder)?;
    base::register(builder)?;
    nft::register(builder)?;
    pricing::register(builder)?;
    security::register(builder)?;
    transaction::register(builder)?;
    bitcoin::register(builder)?;
    Ok(())
}

/// Policy for tools that return every page of a listing.
fn all_pages(builder: &SessionBuilder) -> Aggregation {
    Aggregation::AllPages {
        max_pages: builder.settings().max_pages,
    }
}

fn chain_name() -> ParamSpec {
    ParamSpec::required(
        "chainName",
        ParamKind::Enum(SUPPORTED_CHAINS),
        "The blockchain network to query (e.g. 'eth-mainnet', 'matic-mainnet')",
    )
}

fn wallet_address() -> ParamSpec {
    ParamSpec::required(
        "walletAddress",
        ParamKind::String,
        "The wallet address to query. Accepts ENS, RNS, Lens Handle or Unstoppable Domain names",
    )
}

fn quote_currency() -> ParamSpec {
    ParamSpec::optional(
        "quoteCurrency",
        ParamKind::Enum(QUOTE_CURRENCIES),
        "Currency to quote values in",
    )
    .with_default(json!(DEFAULT_QUOTE_CURRENCY))
}

fn flag(name: &'static str, description: &'static str) -> ParamSpec {
    ParamSpec::optional(name, ParamKind::Boolean, description)
}

fn integer(name: &'static str, description: &'static str) -> ParamSpec {
    ParamSpec::optional(name, ParamKind::Integer, description)
}

/// Non-negative integer bounded to `u32`, for page numbers and sizes.
fn index(name: &'static str, description: &'static str) -> ParamSpec {
    ParamSpec::optional(name, ParamKind::Index, description)
}

fn text(name: &'static str, description: &'static str) -> ParamSpec {
    ParamSpec::optional(name, ParamKind::String, description)
}

fn page_size() -> ParamSpec {
    index("pageSize", "Number of items per page")
}

/// Subject of tools keyed by chain and wallet.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChainWallet {
    chain_name: String,
    wallet_address: String,
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GoldRushClient;
    use crate::client::testing::FakeUpstream;
    use crate::core::schema::ParameterSchema;
    use crate::core::session::SessionSettings;
    use std::sync::Arc;

    #[test]
    fn test_register_all_lists_every_tool() {
        let client = GoldRushClient::new(Arc::new(FakeUpstream::new()));
        let mut builder = SessionBuilder::new(client, SessionSettings::default());
        register_all(&mut builder).unwrap();

        let session = builder.build();
        assert_eq!(session.tools().unwrap().len(), 31);
    }

    #[test]
    fn test_quote_currency_defaults_to_usd() {
        let schema = ParameterSchema::new("t", vec![chain_name(), quote_currency()]).unwrap();
        let args = schema.prepare(Some(json!({"chainName": "eth-mainnet"}))).unwrap();
        assert_eq!(args.get("quoteCurrency"), Some(&json!("USD")));
    }

    #[test]
    fn test_unsupported_chain_rejected() {
        let schema = ParameterSchema::new("t", vec![chain_name()]).unwrap();
        assert!(schema.prepare(Some(json!({"chainName": "not-a-chain"}))).is_err());
    }

    #[test]
    fn test_all_pages_takes_cap_from_settings() {
        let client = GoldRushClient::new(Arc::new(FakeUpstream::new()));
        let builder = SessionBuilder::new(client, SessionSettings { max_pages: Some(4) });
        assert_eq!(all_pages(&builder), Aggregation::AllPages { max_pages: Some(4) });
    }
}
