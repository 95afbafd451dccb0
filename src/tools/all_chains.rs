//! Cross-chain tools: activity, balances and transactions across every
//! supported chain at once.

use serde::Deserialize;
use serde_json::Value;

use super::{flag, integer, quote_currency, text, wallet_address};
use crate::client::GoldRushClient;
use crate::client::chains::SUPPORTED_CHAINS;
use crate::client::options::{AddressActivityOptions, MultichainBalancesOptions, MultichainTransactionsOptions};
use crate::core::error::{RegistryError, ToolError};
use crate::core::schema::{ParamKind, ParamSpec, ToolArgs};
use crate::core::session::SessionBuilder;

/// Register the cross-chain tools.
///
/// These address several chains in one upstream call; none of them pages.
///
/// # Arguments
/// * `builder` - Session builder the tools are added to; its client backs every handler
pub fn register(builder: &mut SessionBuilder) -> Result<(), RegistryError> {
    builder.tool(
        "multichain_transactions",
        "Fetch transactions for one or more addresses across multiple chains, newest first.",
        vec![
            chains(),
            ParamSpec::optional("addresses", ParamKind::StringArray, "Addresses to fetch transactions for"),
            integer("limit", "Maximum number of transactions to return"),
            text("before", "Pagination cursor: return transactions before this point"),
            text("after", "Pagination cursor: return transactions after this point"),
            flag("withLogs", "Include event logs"),
            flag("withDecodedLogs", "Include decoded event logs"),
            quote_currency(),
        ],
        multichain_transactions,
    )?;

    builder.tool(
        "multichain_address_activity",
        "List the chains on which an address has activity, with first and last seen dates.",
        vec![wallet_address(), flag("testnets", "Include testnet chains")],
        multichain_address_activity,
    )?;

    builder.tool(
        "multichain_balances",
        "Fetch token balances for an address across multiple chains.",
        vec![
            wallet_address(),
            chains(),
            integer("limit", "Maximum number of balances to return"),
            text("before", "Pagination cursor: return balances before this point"),
            integer("cutoffTimestamp", "Only include balances changed after this unix timestamp"),
            quote_currency(),
        ],
        multichain_balances,
    )?;

    Ok(())
}

fn chains() -> ParamSpec {
    ParamSpec::optional(
        "chains",
        ParamKind::EnumArray(SUPPORTED_CHAINS),
        "Chains to include; all supported chains when omitted",
    )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Wallet {
    wallet_address: String,
}

async fn multichain_transactions(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let options: MultichainTransactionsOptions = args.parse()?;
    Ok(client.multichain_transactions(&options).await?)
}

async fn multichain_address_activity(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let wallet: Wallet = args.parse()?;
    let options: AddressActivityOptions = args.parse()?;
    Ok(client
        .address_activity(&wallet.wallet_address, &options)
        .await?)
}

async fn multichain_balances(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let wallet: Wallet = args.parse()?;
    let options: MultichainBalancesOptions = args.parse()?;
    Ok(client
        .multichain_balances(&wallet.wallet_address, &options)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FakeUpstream;
    use crate::tools::test_support::{payload, session_with};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_multichain_transactions_joins_lists() {
        let upstream = Arc::new(FakeUpstream::new().with("/v1/allchains/transactions/", json!({ "items": [] })));
        let session = session_with(upstream.clone(), register);

        let result = session
            .dispatch(
                "multichain_transactions",
                Some(json!({
                    "chains": ["eth-mainnet", "base-mainnet"],
                    "addresses": ["0x1", "0x2"],
                    "limit": 10
                })),
            )
            .await
            .unwrap();

        assert_eq!(payload(&result), json!({ "items": [] }));
        let calls = upstream.calls();
        assert_eq!(calls[0].query.get("chains"), Some("eth-mainnet,base-mainnet"));
        assert_eq!(calls[0].query.get("addresses"), Some("0x1,0x2"));
        assert_eq!(calls[0].query.get("quote-currency"), Some("USD"));
    }

    #[tokio::test]
    async fn test_unsupported_chain_in_list_rejected() {
        let session = session_with(Arc::new(FakeUpstream::new()), register);

        let err = session
            .dispatch(
                "multichain_balances",
                Some(json!({ "walletAddress": "0x1", "chains": ["eth-mainnet", "nowhere"] })),
            )
            .await
            .unwrap_err();

        match err {
            RegistryError::InvalidParams { violations, .. } => {
                assert!(violations.iter().any(|v| v.starts_with("/chains/1")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_address_activity_path() {
        let path = "/v1/address/0xabc/activity/";
        let upstream = Arc::new(FakeUpstream::new().with(path, json!({ "items": [{ "name": "eth-mainnet" }] })));
        let session = session_with(upstream.clone(), register);

        let result = session
            .dispatch("multichain_address_activity", Some(json!({ "walletAddress": "0xabc" })))
            .await
            .unwrap();

        assert_eq!(payload(&result)["items"][0]["name"], "eth-mainnet");
        assert_eq!(upstream.calls()[0].path, path);
    }
}
