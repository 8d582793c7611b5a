// Origin-anchored asset identifiers

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};

/// Cross-chain asset identifier.
pub type AssetId = B256;

/// `keccak256(abi.encode(originChainId, vault, token))`.
///
/// The chain id must be the chain the token is native to, not the chain the
/// relay happens to run against: every chain derives the same id for the same
/// asset.
pub fn compute_asset_id(origin_chain_id: u64, vault: Address, token: Address) -> AssetId {
    let encoded = (U256::from(origin_chain_id), vault, token).abi_encode_params();
    keccak256(encoded)
}

/// Where a token natively lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetOrigin {
    pub chain_id: u64,
    pub token: Address,
}

impl AssetOrigin {
    pub fn new(chain_id: u64, token: Address) -> Self {
        Self { chain_id, token }
    }

    pub fn asset_id(&self, vault: Address) -> AssetId {
        compute_asset_id(self.chain_id, vault, self.token)
    }
}
