use crate::client::{ClientSet, TransferRequest};
use async_trait::async_trait;
use sluice_types::{Address, ChainError, NetworkId, Networks, TokenAmount};
use std::sync::Arc;
use tracing::{error, info};

const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Proof that a payout was broadcast.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub network: NetworkId,
    pub to: Address,
    pub amount: TokenAmount,
    pub tx_id: String,
    pub explorer_link: String,
}

/// Best-effort operational notification after a successful send. Failures
/// are logged and never roll back the payout.
#[async_trait]
pub trait PayoutNotifier: Send + Sync {
    async fn payout_sent(&self, receipt: &TxReceipt, note: &str);
}

/// Executes on-chain payouts through the injected chain clients.
///
/// Every failure path returns before any caller-visible ledger could have
/// been touched, so a failed send is always safe to retry.
pub struct PayoutExecutor {
    clients: ClientSet,
    networks: Networks,
    sender: Address,
    notifier: Option<Arc<dyn PayoutNotifier>>,
}

impl PayoutExecutor {
    pub fn new(clients: ClientSet, networks: Networks, sender: Address) -> Self {
        Self {
            clients,
            networks,
            sender,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn PayoutNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn sender(&self) -> &Address {
        &self.sender
    }

    /// Treasury balance on one network, for purchase checks and reports.
    pub async fn treasury_balance(&self, network: &NetworkId) -> Result<TokenAmount, ChainError> {
        let client = self.clients.get(network).ok_or_else(|| ChainError::NotConnected {
            network: network.to_string(),
        })?;
        if !client.is_connected().await {
            return Err(ChainError::NotConnected {
                network: network.to_string(),
            });
        }
        client.balance(&self.sender).await
    }

    /// Send `amount` of `network`'s native asset to `to`.
    pub async fn send(
        &self,
        network: &NetworkId,
        to: &Address,
        amount: TokenAmount,
        note: &str,
    ) -> Result<TxReceipt, ChainError> {
        let config = self.networks.get(network).ok_or_else(|| ChainError::NotConnected {
            network: network.to_string(),
        })?;
        let client = self.clients.get(network).ok_or_else(|| ChainError::NotConnected {
            network: network.to_string(),
        })?;

        if !client.is_connected().await {
            error!(network = %network, "Payout refused, client not connected");
            return Err(ChainError::NotConnected {
                network: network.to_string(),
            });
        }

        let gas_price = client.gas_price().await?;
        let nonce = client.nonce(&self.sender).await?;

        let request = TransferRequest {
            to: to.clone(),
            value: amount,
            gas_limit: TRANSFER_GAS_LIMIT,
            gas_price,
            nonce,
            chain_id: config.chain_id,
        };

        let tx_id = client.sign_and_send(request).await?;
        let receipt = TxReceipt {
            network: network.clone(),
            to: to.clone(),
            amount,
            explorer_link: config.explorer_tx_link(&tx_id),
            tx_id,
        };

        info!(
            network = %receipt.network,
            to = %receipt.to,
            amount = %receipt.amount,
            tx_id = %receipt.tx_id,
            "💸 Payout sent"
        );

        if let Some(notifier) = &self.notifier {
            notifier.payout_sent(&receipt, note).await;
        }

        Ok(receipt)
    }
}
