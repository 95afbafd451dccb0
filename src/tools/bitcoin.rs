//! Bitcoin tools. These always query `btc-mainnet`, so they take no chain
//! parameter.

use serde::Deserialize;
use serde_json::Value;

use super::{index, page_size, quote_currency, wallet_address};
use crate::client::GoldRushClient;
use crate::client::options::{BitcoinTransactionsOptions, QuoteOptions};
use crate::core::error::{RegistryError, ToolError};
use crate::core::pagination::{Aggregation, aggregate};
use crate::core::schema::{ParamKind, ParamSpec, ToolArgs};
use crate::core::session::SessionBuilder;

/// Register the Bitcoin tools. These always address `btc-mainnet`.
pub fn register(builder: &mut SessionBuilder) -> Result<(), RegistryError> {
    builder.tool(
        "bitcoin_hd_wallet_balances",
        "Fetch balances for every active address derived from a Bitcoin HD wallet (xpub).",
        vec![wallet_address(), quote_currency()],
        bitcoin_hd_wallet_balances,
    )?;

    builder.tool(
        "bitcoin_non_hd_wallet_balances",
        "Fetch the balance of a single Bitcoin address.",
        vec![wallet_address(), quote_currency()],
        bitcoin_non_hd_wallet_balances,
    )?;

    builder.tool(
        "bitcoin_transactions",
        "Fetch one page of transactions for a Bitcoin address.",
        vec![
            ParamSpec::required("address", ParamKind::String, "The Bitcoin address"),
            page_size(),
            index("pageNumber", "Zero-based page to fetch"),
        ],
        bitcoin_transactions,
    )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Wallet {
    wallet_address: String,
}

async fn bitcoin_hd_wallet_balances(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let wallet: Wallet = args.parse()?;
    let options: QuoteOptions = args.parse()?;
    Ok(client
        .bitcoin_hd_wallet_balances(&wallet.wallet_address, &options)
        .await?)
}

async fn bitcoin_non_hd_wallet_balances(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let wallet: Wallet = args.parse()?;
    let options: QuoteOptions = args.parse()?;
    Ok(client
        .bitcoin_non_hd_wallet_balances(&wallet.wallet_address, &options)
        .await?)
}

#[derive(Deserialize)]
struct Address {
    address: String,
}

async fn bitcoin_transactions(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let subject: Address = args.parse()?;
    let options: BitcoinTransactionsOptions = args.parse()?;
    let pages = client.bitcoin_transactions(&subject.address, &options);
    Ok(aggregate(pages, Aggregation::SinglePage).await?)
}
