// Contract interfaces and wire structures used by the interop relay

use alloy_primitives::{address, Address};
use alloy_sol_types::sol;
use serde::{Deserialize, Serialize};

sol! {
    /// One call inside a bundle, as emitted by the interop center.
    #[derive(Debug, PartialEq, Eq)]
    struct InteropCall {
        bytes1 version;
        bool shadowAccount;
        address to;
        address from;
        uint256 value;
        bytes data;
    }

    /// Routing metadata attached to a bundle.
    #[derive(Debug, PartialEq, Eq)]
    struct BundleAttributes {
        bytes executionAddress;
        bytes unbundlerAddress;
    }

    /// Versioned envelope executed atomically on the destination chain.
    #[derive(Debug, PartialEq, Eq)]
    struct InteropBundle {
        bytes1 version;
        uint256 sourceChainId;
        uint256 destinationChainId;
        bytes32 interopBundleSalt;
        InteropCall[] calls;
        BundleAttributes bundleAttributes;
    }

    /// Sender-side description of a call, before the interop center fills in
    /// chain ids, salt and sender.
    #[derive(Debug, PartialEq, Eq)]
    struct InteropCallStarter {
        bytes to;
        bytes data;
        bytes[] callAttributes;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct L2Message {
        uint16 txNumberInBatch;
        address sender;
        bytes data;
    }

    /// Destination-facing inclusion proof for one L2->L1 message.
    #[derive(Debug, PartialEq, Eq)]
    struct MessageInclusionProof {
        uint256 chainId;
        uint256 l1BatchNumber;
        uint256 l2MessageIndex;
        L2Message message;
        bytes32[] proof;
    }

    #[derive(Debug, PartialEq, Eq)]
    event InteropBundleSent(bytes32 l2l1MsgHash, bytes32 interopBundleHash, InteropBundle interopBundle);

    interface IL1Messenger {
        function sendToL1(bytes _message) external returns (bytes32);
    }

    interface IInteropRootStorage {
        function interopRoots(uint256 chainId, uint256 batchNumber) external view returns (bytes32);
    }

    interface IMessageVerification {
        function proveL2MessageInclusionShared(
            uint256 chainId,
            uint256 batchNumber,
            uint256 index,
            L2Message message,
            bytes32[] proof
        ) external view returns (bool);
    }

    interface INativeTokenVault {
        function assetId(address _tokenAddress) external view returns (bytes32);
        function ensureTokenIsRegistered(address _nativeToken) external returns (bytes32);
        function tokenAddress(bytes32 _assetId) external view returns (address);
    }

    interface IInteropCenter {
        function sendBundle(
            bytes _destinationChainId,
            InteropCallStarter[] _callStarters,
            bytes[] _bundleAttributes
        ) external payable returns (bytes32);
    }

    interface IInteropHandler {
        function executeBundle(bytes _bundle, MessageInclusionProof _proof) external;
    }

    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address owner) external view returns (uint256);
    }

    /// ERC-7786 attribute selectors; only the calldata encoding is used.
    interface IERC7786Attributes {
        function indirectCall(uint256 _indirectCallMessageValue) external;
        function unbundlerAddress(bytes _unbundlerAddress) external;
    }
}

pub const L1_MESSENGER_ADDRESS: Address = address!("0000000000000000000000000000000000008008");
pub const L2_MESSAGE_VERIFICATION_ADDRESS: Address = address!("0000000000000000000000000000000000010009");
pub const INTEROP_CENTER_ADDRESS: Address = address!("000000000000000000000000000000000001000d");
pub const INTEROP_HANDLER_ADDRESS: Address = address!("000000000000000000000000000000000001000e");
pub const L2_ASSET_ROUTER_ADDRESS: Address = address!("0000000000000000000000000000000000010003");
pub const L2_NATIVE_TOKEN_VAULT_ADDRESS: Address = address!("0000000000000000000000000000000000010004");
pub const L2_INTEROP_ROOT_STORAGE_ADDRESS: Address = address!("0000000000000000000000000000000000010008");

/// System contract addresses, identical on every chain of the ecosystem unless
/// a deployment overrides them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemContracts {
    pub l1_messenger: Address,
    pub message_verification: Address,
    pub interop_center: Address,
    pub interop_handler: Address,
    pub asset_router: Address,
    pub native_token_vault: Address,
    pub interop_root_storage: Address,
}

impl Default for SystemContracts {
    fn default() -> Self {
        Self {
            l1_messenger: L1_MESSENGER_ADDRESS,
            message_verification: L2_MESSAGE_VERIFICATION_ADDRESS,
            interop_center: INTEROP_CENTER_ADDRESS,
            interop_handler: INTEROP_HANDLER_ADDRESS,
            asset_router: L2_ASSET_ROUTER_ADDRESS,
            native_token_vault: L2_NATIVE_TOKEN_VAULT_ADDRESS,
            interop_root_storage: L2_INTEROP_ROOT_STORAGE_ADDRESS,
        }
    }
}
