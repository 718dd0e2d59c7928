use async_trait::async_trait;
use sluice_types::{Address, ChainError, NetworkId, TokenAmount};
use std::collections::HashMap;
use std::sync::Arc;

/// A signed value transfer ready for broadcast. Gas price and nonce are
/// filled in by the payout path immediately before signing.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub to: Address,
    pub value: TokenAmount,
    pub gas_limit: u64,
    pub gas_price: TokenAmount,
    pub nonce: u64,
    pub chain_id: u64,
}

/// Per-network chain access, consumed as a capability. Key management,
/// signing, and broadcast mechanics live behind this trait and are not
/// reimplemented here.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn is_connected(&self) -> bool;
    async fn balance(&self, address: &Address) -> Result<TokenAmount, ChainError>;
    async fn gas_price(&self) -> Result<TokenAmount, ChainError>;
    async fn nonce(&self, address: &Address) -> Result<u64, ChainError>;
    /// Sign and broadcast; returns the transaction id.
    async fn sign_and_send(&self, request: TransferRequest) -> Result<String, ChainError>;
}

/// The configured chain clients, keyed by network id.
#[derive(Default, Clone)]
pub struct ClientSet {
    clients: HashMap<NetworkId, Arc<dyn ChainClient>>,
}

impl ClientSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, network: NetworkId, client: Arc<dyn ChainClient>) {
        self.clients.insert(network, client);
    }

    pub fn get(&self, network: &NetworkId) -> Option<Arc<dyn ChainClient>> {
        self.clients.get(network).cloned()
    }
}
