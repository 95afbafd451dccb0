//! Base service tools: chains, gas prices, blocks, address resolution and
//! event logs.

use serde::Deserialize;
use serde_json::Value;

use super::{
    ChainWallet, all_pages, chain_name, flag, index, integer, page_size, quote_currency, text, wallet_address,
};
use crate::client::GoldRushClient;
use crate::client::chains::GAS_EVENT_TYPES;
use crate::client::options::{
    LogEventsByAddressOptions, LogEventsByTopicOptions, LogsOptions, PageOptions, QuoteOptions,
};
use crate::core::error::{RegistryError, ToolError};
use crate::core::pagination::{Aggregation, aggregate};
use crate::core::schema::{ParamKind, ParamSpec, ToolArgs};
use crate::core::session::SessionBuilder;

/// Register the base service tools.
///
/// The two log-event listings drain every page; `block_heights` returns one
/// page, so callers walk it with `pageNumber` themselves.
///
/// # Arguments
/// * `builder` - Session builder the tools are added to; its client backs every handler
pub fn register(builder: &mut SessionBuilder) -> Result<(), RegistryError> {
    builder.tool(
        "all_chains",
        "List every chain supported by the GoldRush API, with its metadata.",
        vec![],
        all_chains,
    )?;

    builder.tool(
        "gas_prices",
        "Get real-time gas estimates for different transaction speeds on a chain.",
        vec![
            chain_name(),
            ParamSpec::required(
                "eventType",
                ParamKind::Enum(GAS_EVENT_TYPES),
                "Transaction type to estimate gas for",
            ),
            quote_currency(),
        ],
        gas_prices,
    )?;

    builder.tool(
        "block",
        "Fetch a single block at a block height, including its hash and timestamp.",
        vec![
            chain_name(),
            ParamSpec::required("blockHeight", ParamKind::String, "Block height, or 'latest'"),
        ],
        block,
    )?;

    builder.tool(
        "block_heights",
        "Get one page of block heights between two dates.",
        vec![
            chain_name(),
            ParamSpec::required("startDate", ParamKind::String, "Start date (YYYY-MM-DD)"),
            ParamSpec::required("endDate", ParamKind::String, "End date (YYYY-MM-DD), or 'latest'"),
            page_size(),
            index("pageNumber", "Zero-based page to fetch"),
        ],
        block_heights,
    )?;

    builder.tool(
        "resolve_address",
        "Resolve an ENS, RNS or Unstoppable Domain name to its address.",
        vec![chain_name(), wallet_address()],
        resolve_address,
    )?;

    builder.tool(
        "logs",
        "Get decoded event logs for a block range, optionally filtered by emitting address or topics.",
        vec![
            chain_name(),
            integer("startingBlock", "Block to start from"),
            text("endingBlock", "Block to end at, or 'latest'"),
            text("address", "Only return logs emitted by this address"),
            text("topics", "Comma separated topic hashes to filter on"),
            text("blockHash", "Only return logs from this block"),
            flag("skipDecode", "Return raw logs without decoding"),
        ],
        logs,
    )?;

    let policy = all_pages(builder);
    builder.tool(
        "log_events_by_address",
        "Get every decoded event log emitted by a contract address within a block range. \
         All pages are fetched and returned as one list of items.",
        vec![
            chain_name(),
            ParamSpec::required("contractAddress", ParamKind::String, "The contract address"),
            integer("startingBlock", "Block to start from"),
            text("endingBlock", "Block to end at, or 'latest'"),
            page_size(),
        ],
        move |client, args| log_events_by_address(client, args, policy),
    )?;

    builder.tool(
        "log_events_by_topic",
        "Get every decoded event log carrying a topic hash within a block range. \
         All pages are fetched and returned as one list of items.",
        vec![
            chain_name(),
            ParamSpec::required("topicHash", ParamKind::String, "The event topic hash"),
            integer("startingBlock", "Block to start from"),
            text("endingBlock", "Block to end at, or 'latest'"),
            text("secondaryTopics", "Additional topic hashes to filter on"),
            page_size(),
        ],
        move |client, args| log_events_by_topic(client, args, policy),
    )?;

    Ok(())
}

/// List every chain the upstream knows about. Takes no arguments.
async fn all_chains(client: GoldRushClient, _args: ToolArgs) -> Result<Value, ToolError> {
    Ok(client.all_chains().await?)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GasSubject {
    chain_name: String,
    event_type: String,
}

async fn gas_prices(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let subject: GasSubject = args.parse()?;
    let options: QuoteOptions = args.parse()?;
    Ok(client
        .gas_prices(&subject.chain_name, &subject.event_type, &options)
        .await?)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockSubject {
    chain_name: String,
    block_height: String,
}

async fn block(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let subject: BlockSubject = args.parse()?;
    Ok(client.block(&subject.chain_name, &subject.block_height).await?)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DateRange {
    chain_name: String,
    start_date: String,
    end_date: String,
}

async fn block_heights(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let range: DateRange = args.parse()?;
    // pageNumber picks the page; page-size rides along in the query
    let options: PageOptions = args.parse()?;
    let pages = client.block_heights(&range.chain_name, &range.start_date, &range.end_date, &options);
    Ok(aggregate(pages, Aggregation::SinglePage).await?)
}

async fn resolve_address(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let subject: ChainWallet = args.parse()?;
    Ok(client
        .resolve_address(&subject.chain_name, &subject.wallet_address)
        .await?)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChainOnly {
    chain_name: String,
}

async fn logs(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let subject: ChainOnly = args.parse()?;
    let options: LogsOptions = args.parse()?;
    Ok(client.logs(&subject.chain_name, &options).await?)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContractSubject {
    chain_name: String,
    contract_address: String,
}

async fn log_events_by_address(
    client: GoldRushClient,
    args: ToolArgs,
    policy: Aggregation,
) -> Result<Value, ToolError> {
    let subject: ContractSubject = args.parse()?;
    let options: LogEventsByAddressOptions = args.parse()?;
    // Drained page by page, then flattened into one items list
    let pages = client.log_events_by_address(&subject.chain_name, &subject.contract_address, &options);
    Ok(aggregate(pages, policy).await?)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicSubject {
    chain_name: String,
    topic_hash: String,
}

async fn log_events_by_topic(
    client: GoldRushClient,
    args: ToolArgs,
    policy: Aggregation,
) -> Result<Value, ToolError> {
    let subject: TopicSubject = args.parse()?;
    let options: LogEventsByTopicOptions = args.parse()?;
    let pages = client.log_events_by_topic(&subject.chain_name, &subject.topic_hash, &options);
    Ok(aggregate(pages, policy).await?)
}
