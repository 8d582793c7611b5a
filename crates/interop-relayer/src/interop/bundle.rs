// Interop bundle construction, execution encoding and receipt extraction

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolEvent, SolValue};
use thiserror::Error;
use tracing::{debug, warn};

use super::abi::{IERC7786Attributes, InteropBundle, InteropBundleSent, InteropCallStarter};
use super::address::encode_address_only;
use super::asset::AssetId;
use crate::chains::ReceiptLog;

/// Version tag prepended to asset-router deposit data.
pub const NEW_ENCODING_VERSION: u8 = 0x01;

/// Tag prepended to an encoded bundle inside the L2->L1 message.
pub const BUNDLE_IDENTIFIER: u8 = 0x01;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("InteropBundleSent event not found in receipt of {tx_hash}")]
    EventNotFound { tx_hash: B256 },

    #[error("receipt of {tx_hash} carries {count} InteropBundleSent events, expected exactly one")]
    DuplicateEvent { tx_hash: B256, count: usize },

    #[error("bundle does not decode: {0}")]
    Decode(#[from] alloy_sol_types::Error),
}

/// `abi.encode(amount, receiver, token)`.
pub fn encode_bridge_burn_data(amount: U256, receiver: Address, token: Address) -> Bytes {
    (amount, receiver, token).abi_encode_params().into()
}

/// `version ‖ abi.encode(assetId, transferData)`.
pub fn encode_asset_router_deposit_data(asset_id: AssetId, transfer_data: Bytes) -> Bytes {
    let encoded = (asset_id, transfer_data).abi_encode_params();
    let mut out = Vec::with_capacity(1 + encoded.len());
    out.push(NEW_ENCODING_VERSION);
    out.extend_from_slice(&encoded);
    out.into()
}

/// Second-bridge calldata moving `amount` of `asset_id` to `recipient`.
/// `legacy_token` is the zero address for tokens registered through the vault.
pub fn build_transfer_bundle(
    asset_id: AssetId,
    amount: U256,
    recipient: Address,
    legacy_token: Address,
) -> Bytes {
    let burn = encode_bridge_burn_data(amount, recipient, legacy_token);
    encode_asset_router_deposit_data(asset_id, burn)
}

/// Single call to the asset router carrying the burn payload, executed as an
/// indirect call with no message value.
pub fn transfer_call_starters(asset_router: Address, burn_payload: Bytes) -> Vec<InteropCallStarter> {
    let indirect = SolCall::abi_encode(&IERC7786Attributes::indirectCallCall {
        _indirectCallMessageValue: U256::ZERO,
    });

    vec![InteropCallStarter {
        to: encode_address_only(asset_router),
        data: burn_payload,
        callAttributes: vec![indirect.into()],
    }]
}

/// Bundle attributes naming who may unbundle on the destination chain.
pub fn unbundler_attributes(unbundler: Address) -> Vec<Bytes> {
    let attribute = SolCall::abi_encode(&IERC7786Attributes::unbundlerAddressCall {
        _unbundlerAddress: encode_address_only(unbundler),
    });
    vec![attribute.into()]
}

/// ABI encoding of the bundle exactly as the destination handler decodes it:
/// the bundle as a single tuple parameter.
pub fn encode_bundle_for_execution(bundle: &InteropBundle) -> Bytes {
    SolValue::abi_encode(bundle).into()
}

pub fn decode_bundle(encoded: &[u8]) -> Result<InteropBundle, BundleError> {
    Ok(<InteropBundle as SolValue>::abi_decode(encoded, true)?)
}

/// Identity of a bundle: hash of its execution encoding.
pub fn bundle_hash(bundle: &InteropBundle) -> B256 {
    keccak256(encode_bundle_for_execution(bundle))
}

/// Payload of the L2->L1 message the interop center emits for a bundle.
pub fn bundle_message_payload(encoded_bundle: &[u8]) -> Bytes {
    let mut out = Vec::with_capacity(1 + encoded_bundle.len());
    out.push(BUNDLE_IDENTIFIER);
    out.extend_from_slice(encoded_bundle);
    out.into()
}

/// Find the single `InteropBundleSent` event in a submission receipt.
///
/// Every log is decoded against the event schema; logs that do not decode are
/// skipped. When `emitter` is given, only logs from that contract count. More
/// than one match is rejected rather than resolved by position.
pub fn extract_bundle(
    tx_hash: B256,
    logs: &[ReceiptLog],
    emitter: Option<Address>,
) -> Result<InteropBundle, BundleError> {
    let mut matches: Vec<InteropBundle> = logs
        .iter()
        .filter(|log| emitter.map_or(true, |addr| log.address == addr))
        .filter_map(|log| {
            InteropBundleSent::decode_raw_log(log.topics.iter().copied(), &log.data, true)
                .map(|event| event.interopBundle)
                .ok()
        })
        .collect();

    debug!("Found {} InteropBundleSent event(s) in {} logs", matches.len(), logs.len());

    match matches.len() {
        0 => Err(BundleError::EventNotFound { tx_hash }),
        1 => Ok(matches.remove(0)),
        count => {
            warn!("Receipt {} emitted {} bundle events", tx_hash, count);
            Err(BundleError::DuplicateEvent { tx_hash, count })
        }
    }
}
