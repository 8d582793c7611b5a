// ERC-7930 interoperable address encoding (write path only)

use alloy_primitives::{Address, Bytes, U256};

/// Version 0x0001 followed by chain type 0x0000 (EVM).
const EVM_V1_HEADER: [u8; 4] = [0x00, 0x01, 0x00, 0x00];

const EVM_ADDRESS_LEN: u8 = 20;

/// Minimal big-endian bytes of a chain id. Zero encodes as a single zero byte.
pub fn chain_reference(chain_id: U256) -> Vec<u8> {
    let bytes = chain_id.to_be_bytes::<32>();
    match bytes.iter().position(|b| *b != 0) {
        Some(first) => bytes[first..].to_vec(),
        None => vec![0u8],
    }
}

/// Interoperable address naming a chain with no account:
/// header, chain reference length, chain reference, zero address length.
pub fn encode_chain_only(chain_id: U256) -> Bytes {
    let reference = chain_reference(chain_id);
    let mut out = Vec::with_capacity(EVM_V1_HEADER.len() + reference.len() + 2);
    out.extend_from_slice(&EVM_V1_HEADER);
    // At most 32 bytes, always fits.
    out.push(reference.len() as u8);
    out.extend_from_slice(&reference);
    out.push(0x00);
    out.into()
}

/// Interoperable address naming an account with no chain:
/// header, zero chain reference length, address length 20, address bytes.
pub fn encode_address_only(address: Address) -> Bytes {
    let mut out = Vec::with_capacity(EVM_V1_HEADER.len() + 2 + EVM_ADDRESS_LEN as usize);
    out.extend_from_slice(&EVM_V1_HEADER);
    out.push(0x00);
    out.push(EVM_ADDRESS_LEN);
    out.extend_from_slice(address.as_slice());
    out.into()
}
