//! Direct ownership transfer signed by the contract owner

use alloy_primitives::{Address, B256};

use crate::network::{NodeClient, Session};
use crate::safe::{contract_owner, encode_transfer_ownership};
use crate::workflow::{validate_gas_price, WorkflowError};

/// A broadcast `transferOwnership` call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectTransfer {
    pub previous_owner: Address,
    pub new_owner: Address,
    pub tx_hash: B256,
}

/// Transfer ownership of `contract` to `new_owner` from the session account
pub async fn transfer_ownership_direct<C: NodeClient>(
    session: &Session<C>,
    contract: Address,
    new_owner: Address,
) -> Result<DirectTransfer, WorkflowError> {
    session.ensure_chain().await?;

    let owner = contract_owner(session.node(), contract).await?;
    log::info!("Current owner of {} is {}", contract, owner);
    if owner != session.address() {
        return Err(WorkflowError::NotOwner {
            owner,
            signer: session.address(),
        });
    }

    let raw_price = session.node().gas_price().await?;
    let gas_price =
        validate_gas_price(raw_price.as_deref()).ok_or(WorkflowError::InvalidGasPrice(raw_price))?;

    log::info!("Transferring ownership to {}", new_owner);
    let tx_hash = session
        .send_call(contract, encode_transfer_ownership(new_owner), gas_price)
        .await?;

    Ok(DirectTransfer {
        previous_owner: owner,
        new_owner,
        tx_hash,
    })
}
