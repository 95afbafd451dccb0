//! Pricing service tools.

use serde::Deserialize;
use serde_json::Value;

use super::{chain_name, flag, quote_currency, text};
use crate::client::GoldRushClient;
use crate::client::options::TokenPricesOptions;
use crate::core::error::{RegistryError, ToolError};
use crate::core::schema::{ParamKind, ParamSpec, ToolArgs};
use crate::core::session::SessionBuilder;

/// Register the pricing tool.
pub fn register(builder: &mut SessionBuilder) -> Result<(), RegistryError> {
    builder.tool(
        "historical_token_prices",
        "Get historical prices for a token between two dates.",
        vec![
            chain_name(),
            quote_currency(),
            ParamSpec::required("contractAddress", ParamKind::String, "The token contract address"),
            text("from", "Start date (YYYY-MM-DD)"),
            text("to", "End date (YYYY-MM-DD)"),
            flag("pricesAtAsc", "Sort prices in chronological order"),
        ],
        historical_token_prices,
    )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceSubject {
    chain_name: String,
    quote_currency: String,
    contract_address: String,
}

async fn historical_token_prices(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let subject: PriceSubject = args.parse()?;
    let options: TokenPricesOptions = args.parse()?;
    Ok(client
        .token_prices(
            &subject.chain_name,
            &subject.quote_currency,
            &subject.contract_address,
            &options,
        )
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
    async fn test_quote_currency_goes_into_path() {
        let path = "/v1/pricing/historical_by_addresses_v2/eth-mainnet/USD/0xtoken/";
        let upstream = Arc::new(FakeUpstream::new().with(path, json!([{ "prices": [] }])));
        let session = session_with(upstream.clone(), register);

        let result = session
            .dispatch(
                "historical_token_prices",
                Some(json!({ "chainName": "eth-mainnet", "contractAddress": "0xtoken", "from": "2024-01-01" })),
            )
            .await
            .unwrap();

        assert_eq!(payload(&result), json!([{ "prices": [] }]));
        let calls = upstream.calls();
        assert_eq!(calls[0].path, path);
        assert_eq!(calls[0].query.get("from"), Some("2024-01-01"));
        assert_eq!(calls[0].query.get("quote-currency"), None);
    }
}
