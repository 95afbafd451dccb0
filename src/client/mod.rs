//! GoldRush API client.
//!
//! `GoldRushClient` exposes one async method per upstream operation. Each
//! method builds an [`ApiRequest`] and hands it to an [`Upstream`], which owns
//! the wire details and the caller's credential. The client never retries,
//! caches or throttles: whatever the upstream reports is passed through.

pub mod chains;
pub mod http;
pub mod options;
#[cfg(test)]
pub mod testing;

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use thiserror::Error;

use self::chains::BITCOIN_CHAIN;
use self::options::*;

pub use self::http::HttpConnector;

/// One GET request against the upstream API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// Path below the base URL, e.g. `/v1/chains/status/`.
    pub path: String,
    pub query: Query,
}

impl ApiRequest {
    pub fn new(path: impl Into<String>, query: Query) -> Self {
        Self {
            path: path.into(),
            query,
        }
    }
}

/// Failure reported by the upstream or while talking to it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The upstream answered with a non-success HTTP status.
    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The upstream envelope carried `error: true`.
    #[error("upstream error {code}: {message}")]
    Upstream { code: String, message: String },

    /// The response body was not a GoldRush envelope.
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

/// The wire underneath the client.
///
/// Implementations return the envelope's `data` member (`Value::Null` when
/// the upstream sent none) or the failure that prevented it.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn get(&self, request: &ApiRequest) -> Result<Value, ApiError>;
}

/// One page of a page-numbered listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// The page's `data` member exactly as received.
    pub data: Value,
}

impl Page {
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    /// Whether the upstream advertised a following page.
    pub fn has_more(&self) -> bool {
        self.data
            .pointer("/pagination/has_more")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Take `data.items`, or nothing when the page has no item list.
    pub fn into_items(self) -> Vec<Value> {
        match self.data {
            Value::Object(mut data) => match data.remove("items") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }
}

/// Lazy, finite, non-restartable sequence of pages.
pub type PageStream = BoxStream<'static, Result<Page, ApiError>>;

/// Builds clients bound to a caller-supplied credential.
///
/// The HTTP transport asks for a fresh client on every request so that no
/// two callers ever share one.
pub trait ClientConnector: Send + Sync {
    fn connect(&self, api_key: &str) -> Result<GoldRushClient, ApiError>;
}

/// Typed facade over the GoldRush endpoints.
#[derive(Clone)]
pub struct GoldRushClient {
    upstream: Arc<dyn Upstream>,
}

/// Percent-encode a caller-supplied value for use as one path segment, so
/// `/`, `?` or `#` cannot change which endpoint is addressed.
fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

impl GoldRushClient {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self { upstream }
    }

    async fn fetch(&self, path: String, query: Query) -> Result<Value, ApiError> {
        self.upstream.get(&ApiRequest::new(path, query)).await
    }

    /// Walk a page-numbered listing starting at `first_page`.
    ///
    /// Nothing is requested until the stream is polled. The stream ends after
    /// the first page whose `pagination.has_more` is not `true`, or right
    /// after yielding an error.
    fn paginate(&self, path: String, query: Query, first_page: u32) -> PageStream {
        let upstream = Arc::clone(&self.upstream);
        stream::unfold(Some(first_page), move |next| {
            let upstream = Arc::clone(&upstream);
            let request = ApiRequest::new(path.clone(), query.clone());
            async move {
                let page_number = next?;
                let request = ApiRequest {
                    query: request.query.set("page-number", page_number),
                    ..request
                };
                match upstream.get(&request).await {
                    Ok(data) => {
                        let page = Page::new(data);
                        // The last addressable page ends the walk even if more is claimed.
                        let following = if page.has_more() { page_number.checked_add(1) } else { None };
                        Some((Ok(page), following))
                    }
                    Err(err) => Some((Err(err), None)),
                }
            }
        })
        .boxed()
    }

    // ----- All-chains service -----

    pub async fn multichain_transactions(
        &self,
        options: &MultichainTransactionsOptions,
    ) -> Result<Value, ApiError> {
        self.fetch("/v1/allchains/transactions/".into(), options.to_query())
            .await
    }

    pub async fn address_activity(
        &self,
        wallet_address: &str,
        options: &AddressActivityOptions,
    ) -> Result<Value, ApiError> {
        let wallet_address = segment(wallet_address);
        self.fetch(
            format!("/v1/address/{wallet_address}/activity/"),
            options.to_query(),
        )
        .await
    }

    pub async fn multichain_balances(
        &self,
        wallet_address: &str,
        options: &MultichainBalancesOptions,
    ) -> Result<Value, ApiError> {
        let wallet_address = segment(wallet_address);
        self.fetch(
            format!("/v1/allchains/address/{wallet_address}/balances/"),
            options.to_query(),
        )
        .await
    }

    // ----- Balance service -----

    pub async fn token_balances(
        &self,
        chain_name: &str,
        wallet_address: &str,
        options: &BalancesOptions,
    ) -> Result<Value, ApiError> {
        let chain_name = segment(chain_name);
        let wallet_address = segment(wallet_address);
        self.fetch(
            format!("/v1/{chain_name}/address/{wallet_address}/balances_v2/"),
            options.to_query(),
        )
        .await
    }

    pub async fn historical_token_balances(
        &self,
        chain_name: &str,
        wallet_address: &str,
        options: &HistoricalBalancesOptions,
    ) -> Result<Value, ApiError> {
        let chain_name = segment(chain_name);
        let wallet_address = segment(wallet_address);
        self.fetch(
            format!("/v1/{chain_name}/address/{wallet_address}/historical_balances/"),
            options.to_query(),
        )
        .await
    }

    pub async fn historical_portfolio(
        &self,
        chain_name: &str,
        wallet_address: &str,
        options: &PortfolioOptions,
    ) -> Result<Value, ApiError> {
        let chain_name = segment(chain_name);
        let wallet_address = segment(wallet_address);
        self.fetch(
            format!("/v1/{chain_name}/address/{wallet_address}/portfolio_v2/"),
            options.to_query(),
        )
        .await
    }

    pub fn erc20_transfers(
        &self,
        chain_name: &str,
        wallet_address: &str,
        options: &TransfersOptions,
    ) -> PageStream {
        let chain_name = segment(chain_name);
        let wallet_address = segment(wallet_address);
        self.paginate(
            format!("/v1/{chain_name}/address/{wallet_address}/transfers_v2/"),
            options.to_query(),
            0,
        )
    }

    pub fn token_holders(
        &self,
        chain_name: &str,
        token_address: &str,
        options: &TokenHoldersOptions,
    ) -> PageStream {
        let chain_name = segment(chain_name);
        let token_address = segment(token_address);
        self.paginate(
            format!("/v1/{chain_name}/tokens/{token_address}/token_holders_v2/"),
            options.to_query(),
            options.page_number.unwrap_or(0),
        )
    }

    pub async fn native_token_balance(
        &self,
        chain_name: &str,
        wallet_address: &str,
        options: &NativeBalanceOptions,
    ) -> Result<Value, ApiError> {
        let chain_name = segment(chain_name);
        let wallet_address = segment(wallet_address);
        self.fetch(
            format!("/v1/{chain_name}/address/{wallet_address}/balances_native/"),
            options.to_query(),
        )
        .await
    }

    // ----- Base service -----

    pub async fn all_chains(&self) -> Result<Value, ApiError> {
        self.fetch("/v1/chains/".into(), Query::new()).await
    }

    pub async fn all_chain_status(&self) -> Result<Value, ApiError> {
        self.fetch("/v1/chains/status/".into(), Query::new()).await
    }

    pub async fn gas_prices(
        &self,
        chain_name: &str,
        event_type: &str,
        options: &QuoteOptions,
    ) -> Result<Value, ApiError> {
        let chain_name = segment(chain_name);
        let event_type = segment(event_type);
        self.fetch(
            format!("/v1/{chain_name}/event/{event_type}/gas_prices/"),
            options.to_query(),
        )
        .await
    }

    pub async fn block(&self, chain_name: &str, block_height: &str) -> Result<Value, ApiError> {
        let chain_name = segment(chain_name);
        let block_height = segment(block_height);
        self.fetch(
            format!("/v1/{chain_name}/block_v2/{block_height}/"),
            Query::new(),
        )
        .await
    }

    pub fn block_heights(
        &self,
        chain_name: &str,
        start_date: &str,
        end_date: &str,
        options: &PageOptions,
    ) -> PageStream {
        let chain_name = segment(chain_name);
        let start_date = segment(start_date);
        let end_date = segment(end_date);
        self.paginate(
            format!("/v1/{chain_name}/block_v2/{start_date}/{end_date}/"),
            options.to_query(),
            options.page_number.unwrap_or(0),
        )
    }

    pub async fn resolve_address(
        &self,
        chain_name: &str,
        wallet_address: &str,
    ) -> Result<Value, ApiError> {
        let chain_name = segment(chain_name);
        let wallet_address = segment(wallet_address);
        self.fetch(
            format!("/v1/{chain_name}/address/{wallet_address}/resolve_address/"),
            Query::new(),
        )
        .await
    }

    pub async fn logs(&self, chain_name: &str, options: &LogsOptions) -> Result<Value, ApiError> {
        let chain_name = segment(chain_name);
        self.fetch(format!("/v1/{chain_name}/events/"), options.to_query())
            .await
    }

    pub fn log_events_by_address(
        &self,
        chain_name: &str,
        contract_address: &str,
        options: &LogEventsByAddressOptions,
    ) -> PageStream {
        let chain_name = segment(chain_name);
        let contract_address = segment(contract_address);
        self.paginate(
            format!("/v1/{chain_name}/events/address/{contract_address}/"),
            options.to_query(),
            0,
        )
    }

    pub fn log_events_by_topic(
        &self,
        chain_name: &str,
        topic_hash: &str,
        options: &LogEventsByTopicOptions,
    ) -> PageStream {
        let chain_name = segment(chain_name);
        let topic_hash = segment(topic_hash);
        self.paginate(
            format!("/v1/{chain_name}/events/topics/{topic_hash}/"),
            options.to_query(),
            0,
        )
    }

    // ----- NFT service -----

    pub async fn nfts_for_address(
        &self,
        chain_name: &str,
        wallet_address: &str,
        options: &NftOptions,
    ) -> Result<Value, ApiError> {
        let chain_name = segment(chain_name);
        let wallet_address = segment(wallet_address);
        self.fetch(
            format!("/v1/{chain_name}/address/{wallet_address}/balances_nft/"),
            options.to_query(),
        )
        .await
    }

    pub async fn check_ownership(
        &self,
        chain_name: &str,
        wallet_address: &str,
        collection_contract: &str,
        options: &OwnershipOptions,
    ) -> Result<Value, ApiError> {
        let chain_name = segment(chain_name);
        let wallet_address = segment(wallet_address);
        let collection_contract = segment(collection_contract);
        self.fetch(
            format!("/v1/{chain_name}/address/{wallet_address}/collection/{collection_contract}/"),
            options.to_query(),
        )
        .await
    }

    pub async fn check_ownership_token_id(
        &self,
        chain_name: &str,
        wallet_address: &str,
        collection_contract: &str,
        token_id: &str,
    ) -> Result<Value, ApiError> {
        let chain_name = segment(chain_name);
        let wallet_address = segment(wallet_address);
        let collection_contract = segment(collection_contract);
        let token_id = segment(token_id);
        self.fetch(
            format!(
                "/v1/{chain_name}/address/{wallet_address}/collection/{collection_contract}/token/{token_id}/"
            ),
            Query::new(),
        )
        .await
    }

    // ----- Pricing service -----

    pub async fn token_prices(
        &self,
        chain_name: &str,
        quote_currency: &str,
        contract_address: &str,
        options: &TokenPricesOptions,
    ) -> Result<Value, ApiError> {
        let chain_name = segment(chain_name);
        let quote_currency = segment(quote_currency);
        let contract_address = segment(contract_address);
        self.fetch(
            format!(
                "/v1/pricing/historical_by_addresses_v2/{chain_name}/{quote_currency}/{contract_address}/"
            ),
            options.to_query(),
        )
        .await
    }

    // ----- Security service -----

    pub async fn token_approvals(
        &self,
        chain_name: &str,
        wallet_address: &str,
    ) -> Result<Value, ApiError> {
        let chain_name = segment(chain_name);
        let wallet_address = segment(wallet_address);
        self.fetch(
            format!("/v1/{chain_name}/approvals/{wallet_address}/"),
            Query::new(),
        )
        .await
    }

    pub async fn nft_approvals(
        &self,
        chain_name: &str,
        wallet_address: &str,
    ) -> Result<Value, ApiError> {
        let chain_name = segment(chain_name);
        let wallet_address = segment(wallet_address);
        self.fetch(
            format!("/v1/{chain_name}/nft/approvals/{wallet_address}/"),
            Query::new(),
        )
        .await
    }

    // ----- Transaction service -----

    pub async fn transaction(
        &self,
        chain_name: &str,
        tx_hash: &str,
        options: &TransactionOptions,
    ) -> Result<Value, ApiError> {
        let chain_name = segment(chain_name);
        let tx_hash = segment(tx_hash);
        self.fetch(
            format!("/v1/{chain_name}/transaction_v2/{tx_hash}/"),
            options.to_query(),
        )
        .await
    }

    pub async fn transaction_summary(
        &self,
        chain_name: &str,
        wallet_address: &str,
        options: &TransactionSummaryOptions,
    ) -> Result<Value, ApiError> {
        let chain_name = segment(chain_name);
        let wallet_address = segment(wallet_address);
        self.fetch(
            format!("/v1/{chain_name}/address/{wallet_address}/transactions_summary/"),
            options.to_query(),
        )
        .await
    }

    pub async fn transactions_page(
        &self,
        chain_name: &str,
        wallet_address: &str,
        page: u32,
        options: &TransactionsOptions,
    ) -> Result<Value, ApiError> {
        let chain_name = segment(chain_name);
        let wallet_address = segment(wallet_address);
        self.fetch(
            format!("/v1/{chain_name}/address/{wallet_address}/transactions_v3/page/{page}/"),
            options.to_query(),
        )
        .await
    }

    pub async fn transactions_for_block(
        &self,
        chain_name: &str,
        block_height: &str,
        options: &TransactionsOptions,
    ) -> Result<Value, ApiError> {
        let chain_name = segment(chain_name);
        let block_height = segment(block_height);
        self.fetch(
            format!("/v1/{chain_name}/block/{block_height}/transactions_v3/"),
            options.to_query(),
        )
        .await
    }

    pub async fn transactions_for_time_bucket(
        &self,
        chain_name: &str,
        wallet_address: &str,
        time_bucket: i64,
        options: &TransactionsOptions,
    ) -> Result<Value, ApiError> {
        let chain_name = segment(chain_name);
        let wallet_address = segment(wallet_address);
        self.fetch(
            format!("/v1/{chain_name}/bulk/transactions/{wallet_address}/{time_bucket}/"),
            options.to_query(),
        )
        .await
    }

    // ----- Bitcoin service -----

    pub async fn bitcoin_hd_wallet_balances(
        &self,
        wallet_address: &str,
        options: &QuoteOptions,
    ) -> Result<Value, ApiError> {
        let wallet_address = segment(wallet_address);
        self.fetch(
            format!("/v1/{BITCOIN_CHAIN}/address/{wallet_address}/hd_wallets/"),
            options.to_query(),
        )
        .await
    }

    pub async fn bitcoin_non_hd_wallet_balances(
        &self,
        wallet_address: &str,
        options: &QuoteOptions,
    ) -> Result<Value, ApiError> {
        let wallet_address = segment(wallet_address);
        self.fetch(
            format!("/v1/{BITCOIN_CHAIN}/address/{wallet_address}/balances_v2/"),
            options.to_query(),
        )
        .await
    }

    pub fn bitcoin_transactions(
        &self,
        address: &str,
        options: &BitcoinTransactionsOptions,
    ) -> PageStream {
        self.paginate(
            "/v1/cq/covalent/app/bitcoin/transactions/".into(),
            options.to_query().set("address", address),
            options.page_number.unwrap_or(0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeUpstream;
    use super::*;
    use futures_util::TryStreamExt;
    use serde_json::json;

    #[test]
    fn test_page_has_more() {
        assert!(Page::new(json!({"pagination": {"has_more": true}})).has_more());
        assert!(!Page::new(json!({"pagination": {"has_more": false}})).has_more());
        assert!(!Page::new(json!({"items": []})).has_more());
    }

    #[test]
    fn test_page_into_items() {
        let page = Page::new(json!({"items": [1, 2], "pagination": null}));
        assert_eq!(page.into_items(), vec![json!(1), json!(2)]);
        assert!(Page::new(Value::Null).into_items().is_empty());
    }

    #[tokio::test]
    async fn test_paths_and_query() {
        let upstream = Arc::new(
            FakeUpstream::new().with("/v1/eth-mainnet/address/0xabc/balances_v2/", json!({"items": []})),
        );
        let client = GoldRushClient::new(upstream.clone());

        let options = BalancesOptions {
            quote_currency: Some("EUR".into()),
            ..Default::default()
        };
        client
            .token_balances("eth-mainnet", "0xabc", &options)
            .await
            .unwrap();

        let calls = upstream.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].query.get("quote-currency"), Some("EUR"));
    }

    #[tokio::test]
    async fn test_path_segments_are_escaped() {
        let upstream = Arc::new(FakeUpstream::new());
        let client = GoldRushClient::new(upstream.clone());

        let _ = client
            .token_balances("eth-mainnet", "0xabc#/x?y", &Default::default())
            .await;

        assert_eq!(
            upstream.calls()[0].path,
            "/v1/eth-mainnet/address/0xabc%23%2Fx%3Fy/balances_v2/"
        );
    }

    #[tokio::test]
    async fn test_paginate_follows_has_more() {
        let path = "/v1/eth-mainnet/events/address/0xdead/";
        let upstream = Arc::new(
            FakeUpstream::new()
                .with_page(path, 0, json!({"items": [1], "pagination": {"has_more": true}}))
                .with_page(path, 1, json!({"items": [2], "pagination": {"has_more": false}})),
        );
        let client = GoldRushClient::new(upstream.clone());

        let pages: Vec<Page> = client
            .log_events_by_address("eth-mainnet", "0xdead", &Default::default())
            .try_collect()
            .await
            .unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(upstream.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_paginate_ends_at_last_page_number() {
        let path = "/v1/eth-mainnet/tokens/0xtoken/token_holders_v2/";
        let upstream = Arc::new(FakeUpstream::new().with_page(
            path,
            u32::MAX,
            json!({"items": [1], "pagination": {"has_more": true}}),
        ));
        let client = GoldRushClient::new(upstream.clone());

        let options = TokenHoldersOptions {
            page_number: Some(u32::MAX),
            ..Default::default()
        };
        let pages: Vec<Page> = client
            .token_holders("eth-mainnet", "0xtoken", &options)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(upstream.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_paginate_stops_after_error() {
        let upstream = Arc::new(FakeUpstream::new());
        let client = GoldRushClient::new(upstream.clone());

        let results: Vec<_> = client
            .erc20_transfers("eth-mainnet", "0xabc", &Default::default())
            .collect()
            .await;

        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[tokio::test]
    async fn test_paginate_is_lazy() {
        let upstream = Arc::new(FakeUpstream::new());
        let client = GoldRushClient::new(upstream.clone());

        let _pages = client.block_heights("eth-mainnet", "2024-01-01", "2024-01-02", &Default::default());
        assert!(upstream.calls().is_empty());
    }
}
