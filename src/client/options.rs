//! Per-operation option records.
//!
//! Every option an endpoint understands is listed here with its default.
//! Records deserialize from validated tool arguments (camelCase keys) and
//! render themselves as upstream query parameters (kebab-case keys). Unset
//! options are left off the query so the upstream applies its own default.

use serde::Deserialize;

/// Query string parameters for one upstream request, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, String)>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a parameter.
    pub fn set(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key.to_string(), value)),
        }
        self
    }

    /// Add a parameter only when a value is present.
    pub fn opt<T: ToString>(self, key: &str, value: Option<&T>) -> Self {
        match value {
            Some(value) => self.set(key, value.to_string()),
            None => self,
        }
    }

    /// Add a comma-joined list; empty lists are omitted.
    pub fn list(self, key: &str, values: &[String]) -> Self {
        if values.is_empty() {
            self
        } else {
            self.set(key, values.join(","))
        }
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Conversion of an option record into upstream query parameters.
pub trait ToQuery {
    fn to_query(&self) -> Query;
}

/// Options for endpoints that only take a quote currency.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuoteOptions {
    pub quote_currency: Option<String>,
}

impl ToQuery for QuoteOptions {
    fn to_query(&self) -> Query {
        Query::new().opt("quote-currency", self.quote_currency.as_ref())
    }
}

/// Token balances for an address.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BalancesOptions {
    pub quote_currency: Option<String>,
    /// Include NFTs in the response.
    pub nft: Option<bool>,
    /// Skip fetching NFT metadata from the source.
    pub no_nft_fetch: Option<bool>,
    pub no_spam: Option<bool>,
    pub no_nft_asset_metadata: Option<bool>,
}

impl ToQuery for BalancesOptions {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("quote-currency", self.quote_currency.as_ref())
            .opt("nft", self.nft.as_ref())
            .opt("no-nft-fetch", self.no_nft_fetch.as_ref())
            .opt("no-spam", self.no_spam.as_ref())
            .opt("no-nft-asset-metadata", self.no_nft_asset_metadata.as_ref())
    }
}

/// Token balances at a past block or date.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoricalBalancesOptions {
    pub quote_currency: Option<String>,
    pub nft: Option<bool>,
    pub no_nft_fetch: Option<bool>,
    pub no_spam: Option<bool>,
    pub no_nft_asset_metadata: Option<bool>,
    pub block_height: Option<i64>,
    /// `YYYY-MM-DD`; ignored by the upstream when `block_height` is set.
    pub date: Option<String>,
}

impl ToQuery for HistoricalBalancesOptions {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("quote-currency", self.quote_currency.as_ref())
            .opt("nft", self.nft.as_ref())
            .opt("no-nft-fetch", self.no_nft_fetch.as_ref())
            .opt("no-spam", self.no_spam.as_ref())
            .opt("no-nft-asset-metadata", self.no_nft_asset_metadata.as_ref())
            .opt("block-height", self.block_height.as_ref())
            .opt("date", self.date.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortfolioOptions {
    pub quote_currency: Option<String>,
    /// Number of days of history to return.
    pub days: Option<i64>,
}

impl ToQuery for PortfolioOptions {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("quote-currency", self.quote_currency.as_ref())
            .opt("days", self.days.as_ref())
    }
}

/// ERC20 transfers for an address. Paged by the client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransfersOptions {
    pub quote_currency: Option<String>,
    pub contract_address: Option<String>,
    pub starting_block: Option<i64>,
    pub ending_block: Option<i64>,
    pub page_size: Option<u32>,
}

impl ToQuery for TransfersOptions {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("quote-currency", self.quote_currency.as_ref())
            .opt("contract-address", self.contract_address.as_ref())
            .opt("starting-block", self.starting_block.as_ref())
            .opt("ending-block", self.ending_block.as_ref())
            .opt("page-size", self.page_size.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenHoldersOptions {
    pub block_height: Option<i64>,
    pub date: Option<String>,
    pub page_size: Option<u32>,
    pub page_number: Option<u32>,
}

impl ToQuery for TokenHoldersOptions {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("block-height", self.block_height.as_ref())
            .opt("date", self.date.as_ref())
            .opt("page-size", self.page_size.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NativeBalanceOptions {
    pub quote_currency: Option<String>,
    pub block_height: Option<i64>,
}

impl ToQuery for NativeBalanceOptions {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("quote-currency", self.quote_currency.as_ref())
            .opt("block-height", self.block_height.as_ref())
    }
}

/// Paging for endpoints that list by page number.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageOptions {
    pub page_size: Option<u32>,
    pub page_number: Option<u32>,
}

impl ToQuery for PageOptions {
    fn to_query(&self) -> Query {
        Query::new().opt("page-size", self.page_size.as_ref())
    }
}

/// Raw event log query over a block range.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogsOptions {
    pub starting_block: Option<i64>,
    pub ending_block: Option<String>,
    pub address: Option<String>,
    pub topics: Option<String>,
    pub block_hash: Option<String>,
    pub skip_decode: Option<bool>,
}

impl ToQuery for LogsOptions {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("starting-block", self.starting_block.as_ref())
            .opt("ending-block", self.ending_block.as_ref())
            .opt("address", self.address.as_ref())
            .opt("topics", self.topics.as_ref())
            .opt("block-hash", self.block_hash.as_ref())
            .opt("skip-decode", self.skip_decode.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogEventsByAddressOptions {
    pub starting_block: Option<i64>,
    /// Block height or `latest`.
    pub ending_block: Option<String>,
    pub page_size: Option<u32>,
}

impl ToQuery for LogEventsByAddressOptions {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("starting-block", self.starting_block.as_ref())
            .opt("ending-block", self.ending_block.as_ref())
            .opt("page-size", self.page_size.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogEventsByTopicOptions {
    pub starting_block: Option<i64>,
    pub ending_block: Option<String>,
    pub secondary_topics: Option<String>,
    pub page_size: Option<u32>,
}

impl ToQuery for LogEventsByTopicOptions {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("starting-block", self.starting_block.as_ref())
            .opt("ending-block", self.ending_block.as_ref())
            .opt("secondary-topics", self.secondary_topics.as_ref())
            .opt("page-size", self.page_size.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NftOptions {
    pub no_spam: Option<bool>,
    pub no_nft_asset_metadata: Option<bool>,
    /// Fetch metadata for tokens the upstream has not cached yet.
    pub with_uncached: Option<bool>,
}

impl ToQuery for NftOptions {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("no-spam", self.no_spam.as_ref())
            .opt("no-nft-asset-metadata", self.no_nft_asset_metadata.as_ref())
            .opt("with-uncached", self.with_uncached.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OwnershipOptions {
    pub traits_filter: Option<String>,
    pub values_filter: Option<String>,
}

impl ToQuery for OwnershipOptions {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("traits-filter", self.traits_filter.as_ref())
            .opt("values-filter", self.values_filter.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenPricesOptions {
    /// Start date, `YYYY-MM-DD`.
    pub from: Option<String>,
    /// End date, `YYYY-MM-DD`.
    pub to: Option<String>,
    pub prices_at_asc: Option<bool>,
}

impl ToQuery for TokenPricesOptions {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("from", self.from.as_ref())
            .opt("to", self.to.as_ref())
            .opt("prices-at-asc", self.prices_at_asc.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionOptions {
    pub quote_currency: Option<String>,
    pub no_logs: Option<bool>,
    pub with_internal: Option<bool>,
    pub with_state: Option<bool>,
    pub with_input_data: Option<bool>,
}

impl ToQuery for TransactionOptions {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("quote-currency", self.quote_currency.as_ref())
            .opt("no-logs", self.no_logs.as_ref())
            .opt("with-internal", self.with_internal.as_ref())
            .opt("with-state", self.with_state.as_ref())
            .opt("with-input-data", self.with_input_data.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionSummaryOptions {
    pub quote_currency: Option<String>,
    pub with_gas: Option<bool>,
}

impl ToQuery for TransactionSummaryOptions {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("quote-currency", self.quote_currency.as_ref())
            .opt("with-gas", self.with_gas.as_ref())
    }
}

/// Shared by the address, block and time-bucket transaction listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionsOptions {
    pub quote_currency: Option<String>,
    pub no_logs: Option<bool>,
    pub block_signed_at_asc: Option<bool>,
}

impl ToQuery for TransactionsOptions {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("quote-currency", self.quote_currency.as_ref())
            .opt("no-logs", self.no_logs.as_ref())
            .opt("block-signed-at-asc", self.block_signed_at_asc.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MultichainTransactionsOptions {
    pub chains: Vec<String>,
    pub addresses: Vec<String>,
    pub limit: Option<i64>,
    /// Cursor for transactions before this point.
    pub before: Option<String>,
    /// Cursor for transactions after this point.
    pub after: Option<String>,
    pub with_logs: Option<bool>,
    pub with_decoded_logs: Option<bool>,
    pub quote_currency: Option<String>,
}

impl ToQuery for MultichainTransactionsOptions {
    fn to_query(&self) -> Query {
        Query::new()
            .list("chains", &self.chains)
            .list("addresses", &self.addresses)
            .opt("limit", self.limit.as_ref())
            .opt("before", self.before.as_ref())
            .opt("after", self.after.as_ref())
            .opt("with-logs", self.with_logs.as_ref())
            .opt("with-decoded-logs", self.with_decoded_logs.as_ref())
            .opt("quote-currency", self.quote_currency.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressActivityOptions {
    pub testnets: Option<bool>,
}

impl ToQuery for AddressActivityOptions {
    fn to_query(&self) -> Query {
        Query::new().opt("testnets", self.testnets.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MultichainBalancesOptions {
    pub chains: Vec<String>,
    pub limit: Option<i64>,
    pub before: Option<String>,
    pub cutoff_timestamp: Option<i64>,
    pub quote_currency: Option<String>,
}

impl ToQuery for MultichainBalancesOptions {
    fn to_query(&self) -> Query {
        Query::new()
            .list("chains", &self.chains)
            .opt("limit", self.limit.as_ref())
            .opt("before", self.before.as_ref())
            .opt("cutoff-timestamp", self.cutoff_timestamp.as_ref())
            .opt("quote-currency", self.quote_currency.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BitcoinTransactionsOptions {
    pub page_size: Option<u32>,
    pub page_number: Option<u32>,
}

impl ToQuery for BitcoinTransactionsOptions {
    fn to_query(&self) -> Query {
        Query::new().opt("page-size", self.page_size.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unset_options_are_omitted() {
        let options = BalancesOptions::default();
        assert!(options.to_query().is_empty());
    }

    #[test]
    fn test_options_render_kebab_case() {
        let options: BalancesOptions = serde_json::from_value(json!({
            "quoteCurrency": "EUR",
            "noSpam": true,
            "chainName": "eth-mainnet"
        }))
        .unwrap();

        let query = options.to_query();
        assert_eq!(query.get("quote-currency"), Some("EUR"));
        assert_eq!(query.get("no-spam"), Some("true"));
        assert_eq!(query.get("nft"), None);
    }

    #[test]
    fn test_lists_are_comma_joined() {
        let options: MultichainTransactionsOptions = serde_json::from_value(json!({
            "chains": ["eth-mainnet", "base-mainnet"],
            "limit": 25
        }))
        .unwrap();

        let query = options.to_query();
        assert_eq!(query.get("chains"), Some("eth-mainnet,base-mainnet"));
        assert_eq!(query.get("addresses"), None);
        assert_eq!(query.get("limit"), Some("25"));
    }

    #[test]
    fn test_set_replaces_existing_value() {
        let query = Query::new().set("page-number", 0).set("page-number", 3);
        assert_eq!(query.pairs().len(), 1);
        assert_eq!(query.get("page-number"), Some("3"));
    }
}
