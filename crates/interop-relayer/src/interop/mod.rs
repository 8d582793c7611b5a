// Interop wire formats: ERC-7930 addresses, asset ids, bundles and proofs

pub mod abi;
pub mod address;
pub mod asset;
pub mod bundle;
pub mod proof;

pub use abi::{InteropBundle, InteropCall, MessageInclusionProof, SystemContracts};
pub use address::{encode_address_only, encode_chain_only};
pub use asset::{compute_asset_id, AssetId, AssetOrigin};
pub use bundle::{build_transfer_bundle, decode_bundle, encode_bundle_for_execution, extract_bundle, BundleError};
pub use proof::{build_inclusion_proof, ProofResponse, ProvenMessage};
