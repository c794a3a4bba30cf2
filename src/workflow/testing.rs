//! In-memory node and transaction service used by the workflow tests

use alloy_consensus::TxEnvelope;
use alloy_eips::eip2718::Decodable2718;
use alloy_primitives::{keccak256, Address, Bytes, TxKind, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use alloy_transport::TransportErrorKind;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::crypto::KeyPair;
use crate::network::{Network, NodeClient, RpcError, Session, TransactionReceipt};
use crate::safe::{
    encode_transfer_ownership, hex_prefixed, Confirmation, ConfirmationList, EstimateRequest,
    EstimateResponse, IOwnable, ISafe, MultisigTransaction, Page, ProposeRequest, SafeService,
    SafeSignature, ServiceError,
};
use crate::workflow::PollPolicy;

pub(crate) fn fast_policy() -> PollPolicy {
    PollPolicy::new(Duration::from_millis(1)).with_max_attempts(Some(50))
}

pub(crate) fn transfer_call_data() -> Bytes {
    encode_transfer_ownership(Address::repeat_byte(0xde))
}

pub(crate) struct NodeState {
    pub chain_id: u64,
    pub safe_nonce: U256,
    pub threshold: usize,
    pub owners: Vec<Address>,
    pub contract_owner: Address,
    pub gas_price: Option<String>,
    pub receipt_after: u32,
    pub receipt_polls: u32,
    pub sent: Vec<(B256, Vec<u8>)>,
}

pub(crate) struct FakeNode {
    pub state: Mutex<NodeState>,
}

impl FakeNode {
    pub fn sent_hashes(&self) -> Vec<B256> {
        self.state.lock().unwrap().sent.iter().map(|(h, _)| *h).collect()
    }

    pub fn sent_raw(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().sent.iter().map(|(_, r)| r.clone()).collect()
    }

    pub fn set_gas_price(&self, gas_price: Option<&str>) {
        self.state.lock().unwrap().gas_price = gas_price.map(str::to_string);
    }

    /// Call data of the `index`th broadcast transaction
    pub fn sent_input(&self, index: usize) -> (TxKind, Bytes) {
        let raw = self.sent_raw().remove(index);
        let envelope = TxEnvelope::decode_2718(&mut raw.as_slice()).unwrap();
        let legacy = envelope.as_legacy().unwrap();
        (legacy.tx().to, legacy.tx().input.clone())
    }

    pub fn set_contract_owner(&self, owner: Address) {
        self.state.lock().unwrap().contract_owner = owner;
    }
}

impl NodeClient for Arc<FakeNode> {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        Ok(self.state.lock().unwrap().chain_id)
    }

    async fn call(&self, _to: Address, data: &Bytes) -> Result<Bytes, RpcError> {
        let state = self.state.lock().unwrap();
        let selector: [u8; 4] = data[..4].try_into().unwrap();
        let output = if selector == ISafe::nonceCall::SELECTOR {
            (state.safe_nonce,).abi_encode_params()
        } else if selector == ISafe::getThresholdCall::SELECTOR {
            (U256::from(state.threshold),).abi_encode_params()
        } else if selector == ISafe::getOwnersCall::SELECTOR {
            (state.owners.clone(),).abi_encode_params()
        } else if selector == IOwnable::ownerCall::SELECTOR {
            (state.contract_owner,).abi_encode_params()
        } else {
            return Err(RpcError::TransportError(TransportErrorKind::custom_str(
                "execution reverted",
            )));
        };
        Ok(Bytes::from(output))
    }

    async fn gas_price(&self) -> Result<Option<String>, RpcError> {
        Ok(self.state.lock().unwrap().gas_price.clone())
    }

    async fn estimate_gas(&self, _from: Address, _to: Address, _data: &Bytes) -> Result<u64, RpcError> {
        Ok(120_000)
    }

    async fn transaction_count(&self, _address: Address) -> Result<u64, RpcError> {
        Ok(self.state.lock().unwrap().sent.len() as u64)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, RpcError> {
        let hash = keccak256(raw);
        self.state.lock().unwrap().sent.push((hash, raw.to_vec()));
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>, RpcError> {
        let mut state = self.state.lock().unwrap();
        state.receipt_polls += 1;
        let known = state.sent.iter().any(|(h, _)| *h == hash);
        if known && state.receipt_polls >= state.receipt_after {
            return Ok(Some(TransactionReceipt {
                transaction_hash: hash,
                block_number: Some(16),
                status: true,
            }));
        }
        Ok(None)
    }
}

pub(crate) struct ServiceState {
    pub approvers: Vec<KeyPair>,
    /// Number of approvers that have confirmed at each poll; the last entry repeats
    pub arrivals: Vec<usize>,
    /// Report the first approver's confirmation twice
    pub duplicate_first: bool,
    /// Non-owners whose confirmations are listed on every poll
    pub outsiders: Vec<KeyPair>,
    /// Approvers listed on every poll with a signature from some other key
    pub forged: Vec<usize>,
    pub safe_tx_gas: String,
    pub proposals: Vec<ProposeRequest>,
    pub pending: Vec<MultisigTransaction>,
    pub confirmation_polls: usize,
    pub executed_after: u32,
    pub transaction_polls: u32,
    pub transient_failures: u32,
}

pub(crate) struct FakeService {
    pub state: Mutex<ServiceState>,
}

impl FakeService {
    pub fn set_arrivals(&self, arrivals: Vec<usize>) {
        self.state.lock().unwrap().arrivals = arrivals;
    }

    pub fn set_executed_after(&self, polls: u32) {
        self.state.lock().unwrap().executed_after = polls;
    }

    pub fn set_duplicate_first(&self, duplicate: bool) {
        self.state.lock().unwrap().duplicate_first = duplicate;
    }

    pub fn add_outsider(&self, kp: KeyPair) {
        self.state.lock().unwrap().outsiders.push(kp);
    }

    pub fn forge_confirmation_for(&self, approver: usize) {
        self.state.lock().unwrap().forged.push(approver);
    }

    pub fn set_transient_failures(&self, failures: u32) {
        self.state.lock().unwrap().transient_failures = failures;
    }

    pub fn set_safe_tx_gas(&self, gas: &str) {
        self.state.lock().unwrap().safe_tx_gas = gas.to_string();
    }

    pub fn add_pending(&self, tx: MultisigTransaction) {
        self.state.lock().unwrap().pending.push(tx);
    }

    pub fn proposal_count(&self) -> usize {
        self.state.lock().unwrap().proposals.len()
    }

    pub fn confirmation_polls(&self) -> usize {
        self.state.lock().unwrap().confirmation_polls
    }

    pub fn transaction_polls(&self) -> u32 {
        self.state.lock().unwrap().transaction_polls
    }

    fn find_proposal(state: &ServiceState, safe_tx_hash: B256) -> Option<ProposeRequest> {
        let wanted = hex_prefixed(safe_tx_hash.as_slice());
        state
            .proposals
            .iter()
            .find(|p| p.contract_transaction_hash == wanted)
            .cloned()
    }
}

fn confirmation(owner: Address, signature: Bytes) -> Confirmation {
    Confirmation {
        owner,
        submission_date: None,
        transaction_hash: None,
        signature,
        signature_type: Some("EOA".to_string()),
    }
}

impl SafeService for FakeService {
    async fn estimate_safe_transaction(
        &self,
        _safe: Address,
        _request: &EstimateRequest,
    ) -> Result<EstimateResponse, ServiceError> {
        Ok(EstimateResponse {
            safe_tx_gas: self.state.lock().unwrap().safe_tx_gas.clone(),
        })
    }

    async fn propose_transaction(
        &self,
        safe: Address,
        request: &ProposeRequest,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock().unwrap();
        state.pending.push(MultisigTransaction {
            safe,
            safe_tx_hash: request.contract_transaction_hash.parse().unwrap(),
            nonce: request.nonce.parse().unwrap(),
            is_executed: false,
            is_successful: None,
            transaction_hash: None,
            confirmations_required: None,
        });
        state.proposals.push(request.clone());
        Ok(())
    }

    async fn get_transaction_confirmations(
        &self,
        safe_tx_hash: B256,
    ) -> Result<ConfirmationList, ServiceError> {
        let mut state = self.state.lock().unwrap();
        let proposal = Self::find_proposal(&state, safe_tx_hash)
            .ok_or_else(|| ServiceError::NotFound("confirmations".to_string()))?;

        let poll = state.confirmation_polls;
        state.confirmation_polls += 1;
        let confirmed = match state.arrivals.get(poll).or(state.arrivals.last()) {
            Some(n) => *n,
            None => 0,
        };

        let proposer_sig = hex::decode(proposal.signature.trim_start_matches("0x")).unwrap();
        let mut results = vec![confirmation(
            proposal.sender.parse().unwrap(),
            Bytes::from(proposer_sig),
        )];
        for kp in &state.outsiders {
            let sig = SafeSignature::sign(kp, &safe_tx_hash).unwrap();
            results.push(confirmation(sig.signer, sig.data));
        }
        for &index in &state.forged {
            let sig = SafeSignature::sign(&KeyPair::generate(), &safe_tx_hash).unwrap();
            results.push(confirmation(state.approvers[index].address(), sig.data));
        }
        for kp in state.approvers.iter().take(confirmed) {
            let sig = SafeSignature::sign(kp, &safe_tx_hash).unwrap();
            results.push(confirmation(sig.signer, sig.data));
        }
        if state.duplicate_first && confirmed > 0 {
            let sig = SafeSignature::sign(&state.approvers[0], &safe_tx_hash).unwrap();
            results.push(confirmation(sig.signer, sig.data));
        }

        Ok(Page {
            count: results.len(),
            next: None,
            previous: None,
            results,
        })
    }

    async fn get_transaction(
        &self,
        safe_tx_hash: B256,
    ) -> Result<MultisigTransaction, ServiceError> {
        let mut state = self.state.lock().unwrap();
        if state.transient_failures > 0 {
            state.transient_failures -= 1;
            return Err(ServiceError::InvalidResponseStatus {
                status: 502,
                body: "Bad Gateway".to_string(),
            });
        }

        let proposal = Self::find_proposal(&state, safe_tx_hash)
            .ok_or_else(|| ServiceError::NotFound("transaction".to_string()))?;
        state.transaction_polls += 1;
        let executed = state.transaction_polls >= state.executed_after;

        Ok(MultisigTransaction {
            safe: proposal.refund_receiver.parse().unwrap(),
            safe_tx_hash,
            nonce: proposal.nonce.parse().unwrap(),
            is_executed: executed,
            is_successful: executed.then_some(true),
            transaction_hash: executed.then(|| B256::repeat_byte(0xee)),
            confirmations_required: None,
        })
    }

    async fn get_pending_transactions(
        &self,
        safe: Address,
        nonce: u64,
    ) -> Result<Vec<MultisigTransaction>, ServiceError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .pending
            .iter()
            .filter(|tx| tx.safe == safe && tx.nonce == nonce && !tx.is_executed)
            .cloned()
            .collect())
    }
}

/// A Safe on rinkeby whose first owner is the session signer
pub(crate) struct TestEnv {
    pub signer: KeyPair,
    pub approvers: Vec<KeyPair>,
    pub safe: Address,
    pub target: Address,
    pub node: Arc<FakeNode>,
    pub service: FakeService,
}

impl TestEnv {
    pub fn new(threshold: usize, owner_count: usize) -> Self {
        let signer = KeyPair::generate();
        let approvers: Vec<KeyPair> = (1..owner_count).map(|_| KeyPair::generate()).collect();
        let mut owners = vec![signer.address()];
        owners.extend(approvers.iter().map(|k| k.address()));

        let node = Arc::new(FakeNode {
            state: Mutex::new(NodeState {
                chain_id: Network::Rinkeby.chain_id(),
                safe_nonce: U256::from(5u64),
                threshold,
                owners,
                contract_owner: Address::repeat_byte(0x5a),
                gas_price: Some("0x3b9aca00".to_string()),
                receipt_after: 1,
                receipt_polls: 0,
                sent: Vec::new(),
            }),
        });

        let service = FakeService {
            state: Mutex::new(ServiceState {
                approvers: approvers.clone(),
                arrivals: vec![owner_count - 1],
                duplicate_first: false,
                outsiders: Vec::new(),
                forged: Vec::new(),
                safe_tx_gas: "45000".to_string(),
                proposals: Vec::new(),
                pending: Vec::new(),
                confirmation_polls: 0,
                executed_after: 1,
                transaction_polls: 0,
                transient_failures: 0,
            }),
        };

        Self {
            signer,
            approvers,
            safe: Address::repeat_byte(0x5a),
            target: Address::repeat_byte(0xca),
            node,
            service,
        }
    }

    pub fn session(&self) -> Session<Arc<FakeNode>> {
        Session::with_client(Network::Rinkeby, self.signer.clone(), self.node.clone())
    }
}
