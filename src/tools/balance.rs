//! Balance service tools: token balances, historical balances and
//! portfolio, ERC20 transfers, token holders and native balances.

use serde::Deserialize;
use serde_json::Value;

use super::{
    ChainWallet, all_pages, chain_name, flag, index, integer, page_size, quote_currency, text, wallet_address,
};
use crate::client::GoldRushClient;
use crate::client::options::{
    BalancesOptions, HistoricalBalancesOptions, NativeBalanceOptions, PortfolioOptions,
    TokenHoldersOptions, TransfersOptions,
};
use crate::core::error::{RegistryError, ToolError};
use crate::core::pagination::{Aggregation, aggregate};
use crate::core::schema::{ParamKind, ParamSpec, ToolArgs};
use crate::core::session::SessionBuilder;

/// Register the balance service tools.
///
/// `erc20_token_transfers` drains every page under the session's
/// aggregation policy; `token_holders` returns the single page asked for.
///
/// # Arguments
/// * `builder` - Session builder the tools are added to; its client backs every handler
pub fn register(builder: &mut SessionBuilder) -> Result<(), RegistryError> {
    builder.tool(
        "token_balances",
        "Fetch the native and fungible (ERC20) tokens held by an address, with their current spot prices.",
        vec![
            chain_name(),
            wallet_address(),
            quote_currency(),
            flag("nft", "Include NFTs in the response"),
            flag("noNftFetch", "Exclude NFTs that need an external metadata fetch"),
            flag("noSpam", "Exclude spam tokens"),
            flag("noNftAssetMetadata", "Exclude NFT asset metadata"),
        ],
        token_balances,
    )?;

    builder.tool(
        "historical_token_balances",
        "Fetch the tokens held by an address at a historical block height or date.",
        vec![
            chain_name(),
            wallet_address(),
            quote_currency(),
            flag("nft", "Include NFTs in the response"),
            flag("noNftFetch", "Exclude NFTs that need an external metadata fetch"),
            flag("noSpam", "Exclude spam tokens"),
            flag("noNftAssetMetadata", "Exclude NFT asset metadata"),
            integer("blockHeight", "Block height to read balances at"),
            text("date", "Date to read balances at (YYYY-MM-DD); ignored when blockHeight is set"),
        ],
        historical_token_balances,
    )?;

    builder.tool(
        "historical_portfolio_value",
        "Render a daily portfolio balance for an address, broken down by token.",
        vec![
            chain_name(),
            wallet_address(),
            quote_currency(),
            integer("days", "Number of days of history (default 30 upstream)"),
        ],
        historical_portfolio_value,
    )?;

    // Captured once; the cap cannot change after registration
    let policy = all_pages(builder);
    builder.tool(
        "erc20_token_transfers",
        "Render the transfer-in and transfer-out of a token along with historical prices for an address. \
         Every page of the listing is fetched and returned as one list of items.",
        vec![
            chain_name(),
            wallet_address(),
            quote_currency(),
            text("contractAddress", "Only return transfers of this token contract"),
            integer("startingBlock", "Block to start from"),
            integer("endingBlock", "Block to end at"),
            page_size(),
        ],
        move |client, args| erc20_token_transfers(client, args, policy),
    )?;

    builder.tool(
        "token_holders",
        "Get one page of the holders of a token, optionally at a historical block height or date.",
        vec![
            chain_name(),
            ParamSpec::required("tokenAddress", ParamKind::String, "The token contract address"),
            integer("blockHeight", "Block height to read holders at"),
            text("date", "Date to read holders at (YYYY-MM-DD)"),
            page_size(),
            index("pageNumber", "Zero-based page to fetch"),
        ],
        token_holders,
    )?;

    builder.tool(
        "native_token_balance",
        "Get the native token balance of an address.",
        vec![
            chain_name(),
            wallet_address(),
            quote_currency(),
            integer("blockHeight", "Block height to read the balance at"),
        ],
        native_token_balance,
    )?;

    Ok(())
}

async fn token_balances(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    // Subject goes in the path, options in the query string
    let subject: ChainWallet = args.parse()?;
    let options: BalancesOptions = args.parse()?;
    Ok(client
        .token_balances(&subject.chain_name, &subject.wallet_address, &options)
        .await?)
}

async fn historical_token_balances(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let subject: ChainWallet = args.parse()?;
    let options: HistoricalBalancesOptions = args.parse()?;
    Ok(client
        .historical_token_balances(&subject.chain_name, &subject.wallet_address, &options)
        .await?)
}

async fn historical_portfolio_value(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let subject: ChainWallet = args.parse()?;
    let options: PortfolioOptions = args.parse()?;
    Ok(client
        .historical_portfolio(&subject.chain_name, &subject.wallet_address, &options)
        .await?)
}

async fn erc20_token_transfers(
    client: GoldRushClient,
    args: ToolArgs,
    policy: Aggregation,
) -> Result<Value, ToolError> {
    let subject: ChainWallet = args.parse()?;
    let options: TransfersOptions = args.parse()?;
    // Nothing is fetched until aggregate polls the stream
    let pages = client.erc20_transfers(&subject.chain_name, &subject.wallet_address, &options);
    Ok(aggregate(pages, policy).await?)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChainToken {
    chain_name: String,
    token_address: String,
}

async fn token_holders(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let subject: ChainToken = args.parse()?;
    let options: TokenHoldersOptions = args.parse()?;
    // Starts at the caller's pageNumber and stops after that one page
    let pages = client.token_holders(&subject.chain_name, &subject.token_address, &options);
    Ok(aggregate(pages, Aggregation::SinglePage).await?)
}

async fn native_token_balance(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let subject: ChainWallet = args.parse()?;
    let options: NativeBalanceOptions = args.parse()?;
    Ok(client
        .native_token_balance(&subject.chain_name, &subject.wallet_address, &options)
        .await?)
}
