use crate::client::{ChainClient, TransferRequest};
use async_trait::async_trait;
use sha3::{Digest, Keccak256};
use sluice_types::{Address, ChainError, TokenAmount};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::RwLock;

/// Deterministic in-process chain client for tests and the local harness.
///
/// Connectivity and the next broadcast outcome are scriptable; transaction
/// ids are derived by hashing the request, so repeated runs are stable.
pub struct SimulatedChainClient {
    connected: AtomicBool,
    gas_price: TokenAmount,
    balances: RwLock<HashMap<Address, TokenAmount>>,
    sent: RwLock<Vec<TransferRequest>>,
    fail_next: Mutex<Option<String>>,
    sequence: AtomicU64,
}

impl Default for SimulatedChainClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedChainClient {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            // 1 gwei
            gas_price: TokenAmount::from_base_units(1_000_000_000),
            balances: RwLock::new(HashMap::new()),
            sent: RwLock::new(Vec::new()),
            fail_next: Mutex::new(None),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Queue a broadcast rejection for the next `sign_and_send`.
    pub fn fail_next_send(&self, reason: &str) {
        let mut fail = self
            .fail_next
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *fail = Some(reason.to_string());
    }

    pub async fn fund(&self, address: &Address, amount: TokenAmount) {
        let mut balances = self.balances.write().await;
        balances.insert(address.clone(), amount);
    }

    pub async fn sent_transfers(&self) -> Vec<TransferRequest> {
        self.sent.read().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.read().await.len()
    }
}

#[async_trait]
impl ChainClient for SimulatedChainClient {
    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn balance(&self, address: &Address) -> Result<TokenAmount, ChainError> {
        let balances = self.balances.read().await;
        Ok(balances.get(address).copied().unwrap_or(TokenAmount::ZERO))
    }

    async fn gas_price(&self) -> Result<TokenAmount, ChainError> {
        Ok(self.gas_price)
    }

    async fn nonce(&self, _address: &Address) -> Result<u64, ChainError> {
        // Next nonce tracks the number of transactions broadcast so far.
        Ok(self.sequence.load(Ordering::SeqCst))
    }

    async fn sign_and_send(&self, request: TransferRequest) -> Result<String, ChainError> {
        let queued_failure = {
            let mut fail = self
                .fail_next
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            fail.take()
        };
        if let Some(reason) = queued_failure {
            return Err(ChainError::Broadcast(reason));
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let mut hasher = Keccak256::new();
        hasher.update(request.to.as_str().as_bytes());
        hasher.update(request.value.to_base_units().to_le_bytes());
        hasher.update(request.nonce.to_le_bytes());
        hasher.update(request.chain_id.to_le_bytes());
        hasher.update(sequence.to_le_bytes());
        let tx_id = format!("0x{}", hex::encode(hasher.finalize()));

        let mut sent = self.sent.write().await;
        sent.push(request);

        Ok(tx_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> Address {
        Address::parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap()
    }

    fn request() -> TransferRequest {
        TransferRequest {
            to: addr(),
            value: TokenAmount::from_base_units(1),
            gas_limit: 21_000,
            gas_price: TokenAmount::from_base_units(1_000_000_000),
            nonce: 0,
            chain_id: 1,
        }
    }

    #[tokio::test]
    async fn test_tx_ids_are_unique() {
        let client = SimulatedChainClient::new();
        let a = client.sign_and_send(request()).await.unwrap();
        let b = client.sign_and_send(request()).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(client.sent_count().await, 2);
    }

    #[tokio::test]
    async fn test_scripted_failure_fires_once() {
        let client = SimulatedChainClient::new();
        client.fail_next_send("rejected");

        assert!(matches!(
            client.sign_and_send(request()).await,
            Err(ChainError::Broadcast(_))
        ));
        assert!(client.sign_and_send(request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_balance_defaults_to_zero() {
        let client = SimulatedChainClient::new();
        assert_eq!(client.balance(&addr()).await.unwrap(), TokenAmount::ZERO);

        client.fund(&addr(), TokenAmount::from_base_units(42)).await;
        assert_eq!(
            client.balance(&addr()).await.unwrap(),
            TokenAmount::from_base_units(42)
        );
    }
}
