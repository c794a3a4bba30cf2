//! Execution of a fully signed Safe transaction

use alloy_primitives::{B256, U256};

use crate::network::{parse_quantity, NodeClient};
use crate::safe::{SafeService, SafeTransaction, ServiceError};
use crate::workflow::{MultisigWorkflow, WorkflowError};

/// How an execution attempt ended
#[derive(Clone, Debug, PartialEq)]
pub enum ExecutionOutcome {
    /// `execTransaction` was broadcast and mined
    Executed {
        tx_hash: B256,
        /// Hash the transaction service recorded for the execution
        service_tx_hash: Option<B256>,
        success: bool,
    },
    /// Nothing was broadcast
    Skipped { reason: String },
}

/// Parse a node gas price, rejecting missing, malformed, and zero values
pub fn validate_gas_price(raw: Option<&str>) -> Option<U256> {
    raw.and_then(parse_quantity).filter(|price| !price.is_zero())
}

impl<'a, C: NodeClient, S: SafeService> MultisigWorkflow<'a, C, S> {
    /// Broadcast `execTransaction` and wait until the service and the node
    /// both see it executed
    pub async fn execute(&self, tx: &mut SafeTransaction) -> Result<ExecutionOutcome, WorkflowError> {
        let session = self.session;
        let call_data = tx.finalize()?;

        let raw_price = session.node().gas_price().await?;
        let gas_price = match validate_gas_price(raw_price.as_deref()) {
            Some(price) => price,
            None => {
                log::warn!("Invalid gas price {:?}, not executing", raw_price);
                return Ok(ExecutionOutcome::Skipped {
                    reason: format!("invalid gas price {:?}", raw_price),
                });
            }
        };
        log::info!("Gas price {}", gas_price);

        log::info!("Executing Safe transaction {}", tx.safe_tx_hash());
        let tx_hash = session.send_call(tx.safe(), call_data, gas_price).await?;
        tx.mark_broadcast();

        let safe_tx_hash = tx.safe_tx_hash();
        let service = self.service;
        let executed = self
            .policy
            .poll_until(move |attempt| async move {
                match service.get_transaction(safe_tx_hash).await {
                    Ok(remote) if remote.is_executed => Ok(Some(remote)),
                    Ok(_) => {
                        log::info!("Waiting for execution (attempt {})", attempt);
                        Ok(None)
                    }
                    Err(e @ (ServiceError::NotFound(_)
                    | ServiceError::HttpError(_)
                    | ServiceError::InvalidResponseStatus { .. })) => {
                        log::warn!("Transaction service not ready: {}", e);
                        Ok(None)
                    }
                    Err(e) => Err(WorkflowError::from(e)),
                }
            })
            .await?;
        log::info!("Transaction service reports execution");

        let node = session.node();
        let receipt = self
            .policy
            .poll_until(move |_| async move {
                Ok::<_, WorkflowError>(node.transaction_receipt(tx_hash).await?)
            })
            .await?;

        let success = receipt.succeeded() && executed.is_successful.unwrap_or(true);
        if success {
            log::info!("Transaction {} mined in block {:?}", tx_hash, receipt.block_number);
        } else {
            log::warn!("Transaction {} reverted", tx_hash);
        }

        Ok(ExecutionOutcome::Executed {
            tx_hash,
            service_tx_hash: executed.transaction_hash,
            success,
        })
    }
}
