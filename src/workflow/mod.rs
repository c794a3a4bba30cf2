//! Administrative workflows
//!
//! Drives a contract call through a Safe: propose it to the transaction
//! service, wait for owner confirmations, then execute it on chain. Also
//! provides the direct (non-multisig) ownership transfer.
//!
//! The workflow assumes a single operator per Safe. Two proposals built
//! against the same Safe nonce cannot both execute; the proposal driver
//! detects that situation but does not resolve it.

pub mod execution;
pub mod poll;
pub mod proposal;
pub mod transfer;

#[cfg(test)]
pub(crate) mod testing;

use alloy_primitives::{Address, Bytes, B256};
use thiserror::Error;

use crate::crypto::KeyError;
use crate::network::{NetworkError, NodeClient, RpcError, SendError, Session};
use crate::safe::{SafeError, SafeService, ServiceError};

pub use execution::{validate_gas_price, ExecutionOutcome};
pub use poll::{PollError, PollPolicy};
pub use proposal::ProposalRequest;
pub use transfer::{transfer_ownership_direct, DirectTransfer};

/// Workflow errors
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    #[error("Node error: {0}")]
    Rpc(#[from] RpcError),
    #[error("Broadcast error: {0}")]
    Send(#[from] SendError),
    #[error("Transaction service error: {0}")]
    Service(#[from] ServiceError),
    #[error("Safe error: {0}")]
    Safe(#[from] SafeError),
    #[error("Crypto error: {0}")]
    Key(#[from] KeyError),
    #[error("Polling stopped: {0}")]
    Poll(#[from] PollError),
    #[error("Safe nonce {nonce} is already used by pending proposal(s) {existing:?}")]
    NonceCollision { nonce: u64, existing: Vec<B256> },
    #[error("Invalid gas estimate from transaction service: {0}")]
    InvalidEstimate(String),
    #[error("Invalid gas price: {0:?}")]
    InvalidGasPrice(Option<String>),
    #[error("Signer {signer} is not the contract owner ({owner})")]
    NotOwner { owner: Address, signer: Address },
}

/// Result of a full propose-and-execute run
#[derive(Clone, Debug, PartialEq)]
pub struct WorkflowOutcome {
    pub safe_tx_hash: B256,
    /// Owners whose signatures were submitted
    pub signers: Vec<Address>,
    pub execution: ExecutionOutcome,
}

/// Proposal and execution drivers bound to one session and service
pub struct MultisigWorkflow<'a, C, S> {
    session: &'a Session<C>,
    service: &'a S,
    policy: PollPolicy,
    allow_nonce_reuse: bool,
}

impl<'a, C: NodeClient, S: SafeService> MultisigWorkflow<'a, C, S> {
    pub fn new(session: &'a Session<C>, service: &'a S, policy: PollPolicy) -> Self {
        Self {
            session,
            service,
            policy,
            allow_nonce_reuse: false,
        }
    }

    /// Proceed (with a warning) when the Safe nonce is already taken
    pub fn allow_nonce_reuse(mut self, allow: bool) -> Self {
        self.allow_nonce_reuse = allow;
        self
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Propose `data` against `to` from `safe`, collect approvals, and execute
    pub async fn run(
        &self,
        safe: Address,
        to: Address,
        data: Bytes,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let request = ProposalRequest { safe, to, data };
        let mut tx = self.propose(&request).await?;
        let signers = tx.signed_by();
        let execution = self.execute(&mut tx).await?;

        Ok(WorkflowOutcome {
            safe_tx_hash: tx.safe_tx_hash(),
            signers,
            execution,
        })
    }
}
