// Source-chain inclusion proofs and their destination-facing form

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Deserializer, Serialize};

use super::abi::{L2Message, MessageInclusionProof};

/// Response of `zks_getL2ToL1LogProof`. Only produced by the source chain once
/// the batch containing the transaction is finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofResponse {
    /// Message index inside the batch.
    #[serde(deserialize_with = "quantity")]
    pub id: u64,
    #[serde(deserialize_with = "quantity")]
    pub batch_number: u64,
    pub proof: Vec<B256>,
    pub root: B256,
}

/// Nodes return either JSON numbers or hex quantities here.
fn quantity<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Quantity {
        Number(u64),
        Text(String),
    }

    match Quantity::deserialize(deserializer)? {
        Quantity::Number(n) => Ok(n),
        Quantity::Text(s) => {
            let parsed = match s.strip_prefix("0x") {
                Some(hex) => u64::from_str_radix(hex, 16),
                None => s.parse::<u64>(),
            };
            parsed.map_err(|e| serde::de::Error::custom(format!("invalid quantity {s:?}: {e}")))
        }
    }
}

/// The L2->L1 message whose inclusion is being proven.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenMessage {
    pub tx_number_in_batch: u16,
    pub sender: Address,
    pub data: Bytes,
}

/// Build the destination-facing proof from the source chain's response and
/// the metadata of the original submission. Consumed exactly once.
pub fn build_inclusion_proof(
    source_chain_id: u64,
    response: &ProofResponse,
    message: ProvenMessage,
) -> MessageInclusionProof {
    MessageInclusionProof {
        chainId: U256::from(source_chain_id),
        l1BatchNumber: U256::from(response.batch_number),
        l2MessageIndex: U256::from(response.id),
        message: L2Message {
            txNumberInBatch: message.tx_number_in_batch,
            sender: message.sender,
            data: message.data,
        },
        proof: response.proof.clone(),
    }
}
