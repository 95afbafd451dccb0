//! Security service tools: outstanding token and NFT approvals.

use serde_json::Value;

use super::{ChainWallet, chain_name, wallet_address};
use crate::client::GoldRushClient;
use crate::core::error::{RegistryError, ToolError};
use crate::core::schema::ToolArgs;
use crate::core::session::SessionBuilder;

/// Register the approval tools.
pub fn register(builder: &mut SessionBuilder) -> Result<(), RegistryError> {
    builder.tool(
        "token_approvals",
        "List the ERC20 token approvals granted by an address, with the value at risk per spender.",
        vec![chain_name(), wallet_address()],
        token_approvals,
    )?;

    builder.tool(
        "nft_approvals",
        "List the NFT approvals granted by an address, per collection and operator.",
        vec![chain_name(), wallet_address()],
        nft_approvals,
    )
}

async fn token_approvals(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let subject: ChainWallet = args.parse()?;
    Ok(client
        .token_approvals(&subject.chain_name, &subject.wallet_address)
        .await?)
}

async fn nft_approvals(client: GoldRushClient, args: ToolArgs) -> Result<Value, ToolError> {
    let subject: ChainWallet = args.parse()?;
    Ok(client
        .nft_approvals(&subject.chain_name, &subject.wallet_address)
        .await?)
}
