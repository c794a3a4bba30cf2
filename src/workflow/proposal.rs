//! Multisig proposal driver
//!
//! Turns a contract call into a Safe transaction carrying exactly
//! `threshold` owner signatures.

use alloy_primitives::{Address, Bytes, B256, U256};

use crate::network::{NodeClient, RpcError};
use crate::safe::{
    hex_prefixed, safe_nonce, safe_owners, safe_threshold, EstimateRequest, MultisigTransaction,
    ProposeRequest, SafeService, SafeSignature, SafeTransaction, SafeTransactionData, OPERATION_CALL,
};
use crate::workflow::{MultisigWorkflow, WorkflowError};

/// A call to be made by the Safe
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalRequest {
    pub safe: Address,
    /// Target contract
    pub to: Address,
    /// Encoded function selector and arguments
    pub data: Bytes,
}

impl<'a, C: NodeClient, S: SafeService> MultisigWorkflow<'a, C, S> {
    /// Propose the call and wait until enough owners have confirmed it
    ///
    /// The returned transaction holds the local signature plus remote ones,
    /// one per distinct owner, up to the Safe threshold. Confirmations from
    /// non-owners, or whose signature does not recover to the listed owner,
    /// are ignored.
    pub async fn propose(&self, request: &ProposalRequest) -> Result<SafeTransaction, WorkflowError> {
        let session = self.session;
        let node = session.node();
        let safe = request.safe;

        session.ensure_chain().await?;

        let nonce = safe_nonce(node, safe).await?;
        log::info!("Safe {} nonce {}", safe, nonce);
        let pending = self.pending_at(safe, nonce).await?;

        let estimate_request = EstimateRequest {
            to: request.to.to_checksum(None),
            value: "0".to_string(),
            data: hex_prefixed(&request.data),
            operation: OPERATION_CALL,
        };
        log::debug!("Estimating gas {:?}", estimate_request);
        let estimate = self
            .service
            .estimate_safe_transaction(safe, &estimate_request)
            .await?;
        let safe_tx_gas = U256::from_str_radix(estimate.safe_tx_gas.trim(), 10)
            .map_err(|_| WorkflowError::InvalidEstimate(estimate.safe_tx_gas.clone()))?;
        log::info!("Got gas estimate {}", safe_tx_gas);

        let owners = safe_owners(node, safe).await?;
        let threshold = safe_threshold(node, safe).await?;
        log::info!("Safe threshold: {} of {}", threshold, owners.len());

        let data = SafeTransactionData::call(safe, request.to, request.data.clone(), safe_tx_gas, nonce);
        let mut tx = SafeTransaction::new(safe, session.network().chain_id(), data, threshold);
        let safe_tx_hash = tx.safe_tx_hash();
        log::info!("Safe tx hash = {}", safe_tx_hash);
        self.check_collision(&pending, safe_tx_hash)?;

        let local = SafeSignature::sign(session.signer(), &safe_tx_hash)?;
        tx.add_signature(local.clone(), &owners)?;

        log::info!("Proposing transaction");
        self.service
            .propose_transaction(safe, &ProposeRequest::new(&tx, &local))
            .await?;

        log::info!("Awaiting {} confirmation(s)", threshold);
        let service = self.service;
        let owners = &owners;
        let base = &tx;
        let signed = self
            .policy
            .poll_until(move |_| async move {
                let list = service.get_transaction_confirmations(safe_tx_hash).await?;
                let mut candidate = base.clone();
                for confirmation in &list.results {
                    if candidate.is_ready() {
                        break;
                    }
                    if candidate.has_signature(&confirmation.owner) {
                        continue;
                    }
                    if let Err(e) = candidate.add_signature(confirmation.to_signature(), owners) {
                        log::warn!("Ignoring confirmation from {}: {}", confirmation.owner, e);
                    }
                }
                log::info!(
                    "Current num confirmations {} ({} valid)",
                    list.count,
                    candidate.signature_count()
                );
                Ok::<_, WorkflowError>(candidate.is_ready().then_some(candidate))
            })
            .await?;
        log::info!("Received all required confirmations");
        let tx = signed;
        log::debug!("Signatures from {:?}", tx.signed_by());

        Ok(tx)
    }

    /// Unexecuted service transactions that already use `nonce`
    async fn pending_at(
        &self,
        safe: Address,
        nonce: U256,
    ) -> Result<Vec<MultisigTransaction>, WorkflowError> {
        let nonce = u64::try_from(nonce).map_err(|_| RpcError::InvalidQuantity(nonce.to_string()))?;
        Ok(self.service.get_pending_transactions(safe, nonce).await?)
    }

    /// Refuse (or warn about) other proposals at the same nonce
    fn check_collision(
        &self,
        pending: &[MultisigTransaction],
        safe_tx_hash: B256,
    ) -> Result<(), WorkflowError> {
        let existing: Vec<B256> = pending
            .iter()
            .map(|tx| tx.safe_tx_hash)
            .filter(|hash| *hash != safe_tx_hash)
            .collect();
        let nonce = match pending.first() {
            Some(tx) if !existing.is_empty() => tx.nonce,
            _ => return Ok(()),
        };

        if self.allow_nonce_reuse {
            log::warn!(
                "Safe nonce {} is already used by pending proposal(s) {:?}; only one can execute",
                nonce,
                existing
            );
            return Ok(());
        }

        Err(WorkflowError::NonceCollision { nonce, existing })
    }
}
