//! Transaction service tools.

use serde::Deserialize;
use serde_json::{Value, json};

use super::{ChainWallet, chain_name, flag, quote_currency, wallet_address};
use crate::client::GoldRushClient;
use crate::client::options::{TransactionOptions, TransactionSummaryOptions, TransactionsOptions};
use crate::core::error::{RegistryError, ToolError};
use crate::core::schema::{ParamKind, ParamSpec, ToolArgs};
use crate::core::session::SessionBuilder;

/// Register the transaction service tools.
///
/// # Arguments
/// * `builder` - Session builder the tools are added to; its client backs every handler
pub fn register(builder: &mut SessionBuilder) -> Result<(), RegistryError> {
    builder.tool(
        "transaction",
        "Fetch a single transaction by hash, including its decoded event logs.",
        vec![
            chain_name(),
            ParamSpec::required("txHash", ParamKind::String, "The transaction hash"),
            quote_currency(),
            flag("noLogs", "Omit event logs"),
            flag("withInternal", "Include internal transactions"),
            flag("withState", "Include state changes"),
            flag("withInputData", "Include raw input data"),
        ],
        transaction,
    )?;

    builder.tool(
        "transaction_summary",
        "Summarise the transaction activity of an address: counts, first and latest transactions.",
        vec![
            chain_name(),
            wallet_address(),
            quote_currency(),
            flag("withGas", "Include gas usage totals"),
        ],
        transaction_summary,
    )?;

    builder.tool(
        "transactions_for_address",
        "Fetch one page of transactions for an address, with decoded event logs.",
        vec![
            chain_name(),
            wallet_address(),
            ParamSpec::optional("page", ParamKind::Index, "Zero-based page to fetch").with_default(json!(0)),
            quote_currency(),
            flag("noLogs", "Omit event logs"),
            flag("blockSignedAtAsc", "Sort transactions oldest first"),
        ],
        transactions_for_address,
    )?;

    builder.tool(
        "transactions_for_block",
        "Fetch every transaction in a block, with decoded event logs.",
        vec![
            chain_name(),
            ParamSpec::required("blockHeight", ParamKind::String, "Block height, or 'latest'"),
            quote_currency(),
            flag("noLogs", "Omit event logs"),
        ],
        transactions_for_block,
    )?;

    builder.tool(
        "transactions_for_time_bucket",
        "Fetch the transactions of an address within a 15 minute time bucket.",
        vec![
            chain_name(),
            wallet_address(),
            ParamSpec::required(
                "timeBucket",
                ParamKind::Integer,
                "Bucket index: the unix timestamp divided by 900",
            ),
            quote_currency(),
            flag("noLogs", "Omit event logs"),
        ],
        transactions_for_time_bucket,
    )?;

    Ok(())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxSubject {
    chain_name: String,
    tx_hash: String,
}

async fn transaction(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let subject: TxSubject = args.parse()?;
    let options: TransactionOptions = args.parse()?;
    Ok(client
        .transaction(&subject.chain_name, &subject.tx_hash, &options)
        .await?)
}

async fn transaction_summary(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let subject: ChainWallet = args.parse()?;
    let options: TransactionSummaryOptions = args.parse()?;
    Ok(client
        .transaction_summary(&subject.chain_name, &subject.wallet_address, &options)
        .await?)
}

/// Subject of `transactions_for_address`. The page is part of the upstream
/// path rather than the query, so it lives here and not in the options.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddressPage {
    chain_name: String,
    wallet_address: String,
    page: u32,
}

async fn transactions_for_address(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let subject: AddressPage = args.parse()?;
    let options: TransactionsOptions = args.parse()?;
    Ok(client
        .transactions_page(&subject.chain_name, &subject.wallet_address, subject.page, &options)
        .await?)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockSubject {
    chain_name: String,
    block_height: String,
}

async fn transactions_for_block(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let subject: BlockSubject = args.parse()?;
    let options: TransactionsOptions = args.parse()?;
    Ok(client
        .transactions_for_block(&subject.chain_name, &subject.block_height, &options)
        .await?)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeBucket {
    chain_name: String,
    wallet_address: String,
    time_bucket: i64,
}

async fn transactions_for_time_bucket(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    // Bucket index is the unix timestamp divided by 900
    let subject: TimeBucket = args.parse()?;
    let options: TransactionsOptions = args.parse()?;
    Ok(client
        .transactions_for_time_bucket(
            &subject.chain_name,
            &subject.wallet_address,
            subject.time_bucket,
            &options,
        )
        .await?)
}
