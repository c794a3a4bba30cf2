//! Contract ABI definitions for the Safe and the administered contract

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};

use crate::network::{NodeClient, RpcError};

sol! {
    /// Safe interface subset used by the workflow
    interface ISafe {
        function nonce() external view returns (uint256);

        function getThreshold() external view returns (uint256);

        function getOwners() external view returns (address[] memory);

        function execTransaction(
            address to,
            uint256 value,
            bytes calldata data,
            uint8 operation,
            uint256 safeTxGas,
            uint256 baseGas,
            uint256 gasPrice,
            address gasToken,
            address payable refundReceiver,
            bytes memory signatures
        ) external payable returns (bool success);
    }

    /// OpenZeppelin `Ownable` as inherited by CryptoArt
    interface IOwnable {
        function owner() external view returns (address);

        function transferOwnership(address newOwner) external;
    }

    /// EIP-712 typed struct hashed into the Safe transaction hash
    #[derive(Debug, PartialEq, Eq)]
    struct SafeTx {
        address to;
        uint256 value;
        bytes data;
        uint8 operation;
        uint256 safeTxGas;
        uint256 baseGas;
        uint256 gasPrice;
        address gasToken;
        address refundReceiver;
        uint256 nonce;
    }
}

/// EIP-712 type hash for SafeTx
pub const SAFE_TX_TYPEHASH: [u8; 32] = [
    0xbb, 0x83, 0x10, 0xd4, 0x86, 0x36, 0x8d, 0xb6, 0xbd, 0x6f, 0x84, 0x94, 0x02, 0xfd, 0xd7, 0x3a,
    0xd5, 0x3d, 0x31, 0x6b, 0x5a, 0x4b, 0x26, 0x44, 0xad, 0x6e, 0xfe, 0x0f, 0x94, 0x12, 0x86, 0xd8,
];

async fn view<C: NodeClient, T: SolCall>(
    node: &C,
    to: Address,
    call: T,
) -> Result<T::Return, RpcError> {
    let data = Bytes::from(call.abi_encode());
    let output = node.call(to, &data).await?;
    T::abi_decode_returns(&output, true).map_err(|e| RpcError::DecodeError(e.to_string()))
}

/// Current Safe nonce
pub async fn safe_nonce<C: NodeClient>(node: &C, safe: Address) -> Result<U256, RpcError> {
    Ok(view(node, safe, ISafe::nonceCall {}).await?._0)
}

/// Number of owner signatures required to execute
pub async fn safe_threshold<C: NodeClient>(node: &C, safe: Address) -> Result<usize, RpcError> {
    let threshold = view(node, safe, ISafe::getThresholdCall {}).await?._0;
    usize::try_from(threshold).map_err(|_| RpcError::DecodeError(format!("threshold {}", threshold)))
}

/// Current Safe owners
pub async fn safe_owners<C: NodeClient>(node: &C, safe: Address) -> Result<Vec<Address>, RpcError> {
    Ok(view(node, safe, ISafe::getOwnersCall {}).await?._0)
}

/// Current owner of an `Ownable` contract
pub async fn contract_owner<C: NodeClient>(node: &C, contract: Address) -> Result<Address, RpcError> {
    Ok(view(node, contract, IOwnable::ownerCall {}).await?._0)
}

/// Call data for `transferOwnership(newOwner)`
pub fn encode_transfer_ownership(new_owner: Address) -> Bytes {
    Bytes::from(IOwnable::transferOwnershipCall { newOwner: new_owner }.abi_encode())
}
