//! Fixed vocabularies understood by the GoldRush API.
//!
//! These lists feed the enum constraints of tool parameter schemas and are
//! also served verbatim by the `config://` resources.

/// Chain identifiers accepted by chain-scoped endpoints.
pub const SUPPORTED_CHAINS: &[&str] = &[
    "eth-mainnet",
    "eth-sepolia",
    "eth-holesky",
    "matic-mainnet",
    "matic-amoy-testnet",
    "bsc-mainnet",
    "bsc-testnet",
    "opbnb-mainnet",
    "avalanche-mainnet",
    "avalanche-testnet",
    "avalanche-dfk-subnet",
    "avalanche-beam-mainnet",
    "avalanche-shrapnel-subnet",
    "optimism-mainnet",
    "optimism-sepolia",
    "arbitrum-mainnet",
    "arbitrum-nova-mainnet",
    "arbitrum-sepolia",
    "base-mainnet",
    "base-sepolia-testnet",
    "fantom-mainnet",
    "fantom-testnet",
    "gnosis-mainnet",
    "gnosis-testnet",
    "linea-mainnet",
    "linea-sepolia-testnet",
    "zksync-mainnet",
    "zksync-sepolia-testnet",
    "polygon-zkevm-mainnet",
    "polygon-zkevm-cardona-testnet",
    "scroll-mainnet",
    "scroll-sepolia-testnet",
    "mantle-mainnet",
    "mantle-sepolia-testnet",
    "blast-mainnet",
    "blast-sepolia-testnet",
    "zora-mainnet",
    "zora-sepolia-testnet",
    "celo-mainnet",
    "moonbeam-mainnet",
    "moonbeam-moonriver",
    "moonbeam-moonbase-alpha",
    "cronos-mainnet",
    "cronos-testnet",
    "cronos-zkevm-mainnet",
    "aurora-mainnet",
    "aurora-testnet",
    "emerald-paratime-mainnet",
    "boba-mainnet",
    "boba-bnb-mainnet",
    "metis-mainnet",
    "metis-stardust-testnet",
    "harmony-mainnet",
    "canto-mainnet",
    "kcc-mainnet",
    "oasys-mainnet",
    "astar-mainnet",
    "axie-mainnet",
    "sei-mainnet",
    "taiko-mainnet",
    "taiko-hekla-testnet",
    "mode-mainnet",
    "mode-testnet",
    "manta-sepolia-testnet",
    "rollux-mainnet",
    "rollux-testnet",
    "horizen-eon-mainnet",
    "loot-mainnet",
    "redstone-mainnet",
    "ink-mainnet",
    "ink-sepolia-testnet",
    "unichain-mainnet",
    "unichain-sepolia-testnet",
    "sonic-mainnet",
    "berachain-mainnet",
    "apechain-mainnet",
    "world-mainnet",
    "viction-mainnet",
    "fraxtal-mainnet",
    "lisk-mainnet",
    "cyber-mainnet",
    "merlin-mainnet",
    "zetachain-mainnet",
    "gunzilla-testnet",
    "solana-mainnet",
    "btc-mainnet",
];

/// Currencies in which monetary values can be quoted.
pub const QUOTE_CURRENCIES: &[&str] = &[
    "USD", "CAD", "EUR", "SGD", "INR", "JPY", "VND", "CNY", "KRW", "RUB", "TRY", "NGN", "ARS",
    "AUD", "CHF", "GBP",
];

/// Transaction types the gas price endpoint can estimate.
pub const GAS_EVENT_TYPES: &[&str] = &["erc20", "nativetokens", "uniswapv3"];

/// Chain used by every Bitcoin endpoint.
pub const BITCOIN_CHAIN: &str = "btc-mainnet";

/// Quote currency applied when the caller does not pick one.
pub const DEFAULT_QUOTE_CURRENCY: &str = "USD";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_vocabularies_have_no_duplicates() {
        let chains: HashSet<_> = SUPPORTED_CHAINS.iter().collect();
        assert_eq!(chains.len(), SUPPORTED_CHAINS.len());

        let currencies: HashSet<_> = QUOTE_CURRENCIES.iter().collect();
        assert_eq!(currencies.len(), QUOTE_CURRENCIES.len());
    }

    #[test]
    fn test_defaults_are_members() {
        assert!(SUPPORTED_CHAINS.contains(&BITCOIN_CHAIN));
        assert!(QUOTE_CURRENCIES.contains(&DEFAULT_QUOTE_CURRENCY));
    }
}
