//! NFT service tools.

use serde::Deserialize;
use serde_json::Value;

use super::{ChainWallet, chain_name, flag, text, wallet_address};
use crate::client::GoldRushClient;
use crate::client::options::{NftOptions, OwnershipOptions};
use crate::core::error::{RegistryError, ToolError};
use crate::core::schema::{ParamKind, ParamSpec, ToolArgs};
use crate::core::session::SessionBuilder;

/// Register the NFT service tools.
pub fn register(builder: &mut SessionBuilder) -> Result<(), RegistryError> {
    builder.tool(
        "nft_for_address",
        "Render the NFTs (ERC721 and ERC1155) held by an address, with their metadata.",
        vec![
            chain_name(),
            wallet_address(),
            flag("noSpam", "Exclude spam collections"),
            flag("noNftAssetMetadata", "Exclude NFT asset metadata"),
            flag("withUncached", "Fetch metadata for assets that are not cached yet"),
        ],
        nft_for_address,
    )?;

    builder.tool(
        "nft_check_ownership",
        "Verify whether an address holds NFTs from a collection, optionally filtered by trait.",
        vec![
            chain_name(),
            wallet_address(),
            collection_contract(),
            text("traitsFilter", "Trait types to filter on, comma separated"),
            text("valuesFilter", "Trait values to filter on, comma separated"),
        ],
        nft_check_ownership,
    )?;

    builder.tool(
        "nft_check_ownership_token_id",
        "Verify whether an address holds a specific token of a collection.",
        vec![
            chain_name(),
            wallet_address(),
            collection_contract(),
            ParamSpec::required("tokenId", ParamKind::String, "The token id to check"),
        ],
        nft_check_ownership_token_id,
    )?;

    Ok(())
}

fn collection_contract() -> ParamSpec {
    ParamSpec::required(
        "collectionContract",
        ParamKind::String,
        "The NFT collection contract address",
    )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Holding {
    chain_name: String,
    wallet_address: String,
    collection_contract: String,
    #[serde(default)]
    token_id: Option<String>,
}

async fn nft_for_address(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let subject: ChainWallet = args.parse()?;
    let options: NftOptions = args.parse()?;
    Ok(client
        .nfts_for_address(&subject.chain_name, &subject.wallet_address, &options)
        .await?)
}

async fn nft_check_ownership(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let holding: Holding = args.parse()?;
    let options: OwnershipOptions = args.parse()?;
    Ok(client
        .check_ownership(
            &holding.chain_name,
            &holding.wallet_address,
            &holding.collection_contract,
            &options,
        )
        .await?)
}

async fn nft_check_ownership_token_id(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let holding: Holding = args.parse()?;
    let token_id = holding
        .token_id
        .ok_or_else(|| ToolError::Arguments("tokenId is required".into()))?;
    Ok(client
        .check_ownership_token_id(
            &holding.chain_name,
            &holding.wallet_address,
            &holding.collection_contract,
            &token_id,
        )
        .await?)
}
