//! Safe transaction service client
//!
//! The service stores proposals and collects owner confirmations off chain.
//! Only the endpoints the workflow consumes are modelled.

use alloy_primitives::{Address, Bytes, B256};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::safe::signature::SafeSignature;
use crate::safe::transaction::SafeTransaction;

/// Transaction service errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid response status code {status}: {body}")]
    InvalidResponseStatus { status: u16, body: String },
}

/// Body of a gas estimation request
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub to: String,
    /// In wei
    pub value: String,
    pub data: String,
    pub operation: u8,
}

/// Gas estimation result
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    pub safe_tx_gas: String,
}

/// Body of a proposal: the transaction, its hash, and the proposer's signature
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProposeRequest {
    pub to: String,
    pub value: String,
    pub data: String,
    pub operation: u8,
    pub safe_tx_gas: String,
    pub base_gas: String,
    pub gas_price: String,
    pub gas_token: String,
    pub refund_receiver: String,
    pub nonce: String,
    pub contract_transaction_hash: String,
    pub sender: String,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl ProposeRequest {
    /// Build from a proposal carrying `sender`'s signature
    pub fn new(tx: &SafeTransaction, sender: &SafeSignature) -> Self {
        let data = tx.data();
        Self {
            to: data.to.to_checksum(None),
            value: data.value.to_string(),
            data: hex_prefixed(&data.data),
            operation: data.operation,
            safe_tx_gas: data.safe_tx_gas.to_string(),
            base_gas: data.base_gas.to_string(),
            gas_price: data.gas_price.to_string(),
            gas_token: data.gas_token.to_checksum(None),
            refund_receiver: data.refund_receiver.to_checksum(None),
            nonce: data.nonce.to_string(),
            contract_transaction_hash: hex_prefixed(tx.safe_tx_hash().as_slice()),
            sender: sender.signer.to_checksum(None),
            signature: hex_prefixed(&sender.data),
            origin: Some(env!("CARGO_PKG_NAME").to_string()),
        }
    }
}

/// One owner's recorded confirmation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub owner: Address,
    #[serde(default)]
    pub submission_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    pub signature: Bytes,
    #[serde(default)]
    pub signature_type: Option<String>,
}

impl Confirmation {
    /// View as a signature that can be attached to a transaction
    pub fn to_signature(&self) -> SafeSignature {
        SafeSignature::new(self.owner, self.signature.clone())
    }
}

/// A page of results
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub count: usize,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Confirmations recorded for a Safe transaction hash
pub type ConfirmationList = Page<Confirmation>;

/// The service's view of a multisig transaction
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MultisigTransaction {
    pub safe: Address,
    pub safe_tx_hash: B256,
    #[serde(deserialize_with = "u64_lenient")]
    pub nonce: u64,
    #[serde(default)]
    pub is_executed: bool,
    #[serde(default)]
    pub is_successful: Option<bool>,
    /// Null until executed
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    #[serde(default)]
    pub confirmations_required: Option<u64>,
}

/// `0x`-prefixed lowercase hex
pub fn hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Accept numbers encoded either as JSON numbers or decimal strings
fn u64_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom(format!("invalid number {}", n))),
        Value::String(s) => s.parse().map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!("expected number, got {}", other))),
    }
}

/// Transaction service operations consumed by the workflow
#[allow(async_fn_in_trait)]
pub trait SafeService {
    /// Estimate `safeTxGas` for a call from the Safe
    async fn estimate_safe_transaction(
        &self,
        safe: Address,
        request: &EstimateRequest,
    ) -> Result<EstimateResponse, ServiceError>;

    /// Register a new proposal with the proposer's signature
    async fn propose_transaction(
        &self,
        safe: Address,
        request: &ProposeRequest,
    ) -> Result<(), ServiceError>;

    /// Confirmations recorded against a Safe transaction hash
    async fn get_transaction_confirmations(
        &self,
        safe_tx_hash: B256,
    ) -> Result<ConfirmationList, ServiceError>;

    /// A single multisig transaction by Safe transaction hash
    async fn get_transaction(&self, safe_tx_hash: B256)
        -> Result<MultisigTransaction, ServiceError>;

    /// Unexecuted transactions of `safe` that use `nonce`
    async fn get_pending_transactions(
        &self,
        safe: Address,
        nonce: u64,
    ) -> Result<Vec<MultisigTransaction>, ServiceError>;
}

/// HTTP client for the hosted transaction service
pub struct HttpSafeService {
    base_url: String,
    http: reqwest::Client,
}

impl HttpSafeService {
    /// Create a client for the service rooted at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Absolute URL for an API path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response, ServiceError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::InvalidResponseStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let url = self.endpoint(path);
        log::debug!("GET {}", url);
        let response = self.http.get(&url).send().await?;
        Ok(Self::check(response, path).await?.json().await?)
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<reqwest::Response, ServiceError> {
        let url = self.endpoint(path);
        log::debug!("POST {} {}", url, serde_json::to_string(body)?);
        let response = self.http.post(&url).json(body).send().await?;
        Self::check(response, path).await
    }
}

impl SafeService for HttpSafeService {
    async fn estimate_safe_transaction(
        &self,
        safe: Address,
        request: &EstimateRequest,
    ) -> Result<EstimateResponse, ServiceError> {
        let path = format!("safes/{}/multisig-transactions/estimations/", safe.to_checksum(None));
        Ok(self.post(&path, request).await?.json().await?)
    }

    async fn propose_transaction(
        &self,
        safe: Address,
        request: &ProposeRequest,
    ) -> Result<(), ServiceError> {
        let path = format!("safes/{}/multisig-transactions/", safe.to_checksum(None));
        self.post(&path, request).await?;
        Ok(())
    }

    async fn get_transaction_confirmations(
        &self,
        safe_tx_hash: B256,
    ) -> Result<ConfirmationList, ServiceError> {
        self.get(&format!(
            "multisig-transactions/{}/confirmations/",
            hex_prefixed(safe_tx_hash.as_slice())
        ))
            .await
    }

    async fn get_transaction(
        &self,
        safe_tx_hash: B256,
    ) -> Result<MultisigTransaction, ServiceError> {
        self.get(&format!(
            "multisig-transactions/{}/",
            hex_prefixed(safe_tx_hash.as_slice())
        ))
            .await
    }

    async fn get_pending_transactions(
        &self,
        safe: Address,
        nonce: u64,
    ) -> Result<Vec<MultisigTransaction>, ServiceError> {
        let page: Page<MultisigTransaction> = self
            .get(&format!(
                "safes/{}/multisig-transactions/?nonce={}&executed=false",
                safe.to_checksum(None),
                nonce
            ))
            .await?;
        Ok(page
            .results
            .into_iter()
            .filter(|tx| tx.nonce == nonce && !tx.is_executed)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::safe::transaction::SafeTransactionData;
    use alloy_primitives::U256;
    use serde_json::json;

    #[test]
    fn test_endpoint_building() {
        let service = HttpSafeService::new("https://safe-transaction.rinkeby.gnosis.io/");
        assert_eq!(
            service.endpoint("/multisig-transactions/0xabc/"),
            "https://safe-transaction.rinkeby.gnosis.io/api/v1/multisig-transactions/0xabc/"
        );
    }

    #[test]
    fn test_propose_request_fields() {
        let kp = KeyPair::generate();
        let safe = Address::repeat_byte(0x5a);
        let data = SafeTransactionData::call(
            safe,
            Address::repeat_byte(0xca),
            Bytes::from(vec![0xf2, 0xfd]),
            U256::from(45_000u64),
            U256::from(3u64),
        );
        let tx = SafeTransaction::new(safe, 4, data, 2);
        let sig = SafeSignature::sign(&kp, &tx.safe_tx_hash()).unwrap();

        let request = ProposeRequest::new(&tx, &sig);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["safeTxGas"], "45000");
        assert_eq!(body["baseGas"], "21000");
        assert_eq!(body["nonce"], "3");
        assert_eq!(body["value"], "0");
        assert_eq!(body["data"], "0xf2fd");
        assert_eq!(body["sender"], kp.address().to_checksum(None));
        assert_eq!(body["refundReceiver"], safe.to_checksum(None));
        assert_eq!(
            body["contractTransactionHash"],
            hex_prefixed(tx.safe_tx_hash().as_slice())
        );
        assert_eq!(request.signature.len(), 2 + 130);
    }

    #[test]
    fn test_confirmation_list_parsing() {
        let owner = Address::repeat_byte(0x11);
        let list: ConfirmationList = serde_json::from_value(json!({
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{
                "owner": owner.to_checksum(None),
                "submissionDate": "2021-11-02T10:15:30.123456Z",
                "transactionHash": null,
                "signature": format!("0x{}", "ab".repeat(65)),
                "signatureType": "EOA"
            }]
        }))
        .unwrap();

        assert_eq!(list.count, 1);
        let sig = list.results[0].to_signature();
        assert_eq!(sig.signer, owner);
        assert_eq!(sig.data.len(), 65);
    }

    #[test]
    fn test_multisig_transaction_parsing() {
        let tx: MultisigTransaction = serde_json::from_value(json!({
            "safe": Address::repeat_byte(0x5a).to_checksum(None),
            "safeTxHash": B256::repeat_byte(0x01),
            "nonce": "12",
            "isExecuted": true,
            "isSuccessful": true,
            "transactionHash": B256::repeat_byte(0x02),
            "confirmationsRequired": 2
        }))
        .unwrap();
        assert_eq!(tx.nonce, 12);
        assert!(tx.is_executed);
        assert_eq!(tx.transaction_hash, Some(B256::repeat_byte(0x02)));

        let pending: MultisigTransaction = serde_json::from_value(json!({
            "safe": Address::repeat_byte(0x5a).to_checksum(None),
            "safeTxHash": B256::repeat_byte(0x01),
            "nonce": 12,
            "isExecuted": false,
            "transactionHash": null
        }))
        .unwrap();
        assert!(!pending.is_executed);
        assert!(pending.transaction_hash.is_none());
    }
}
