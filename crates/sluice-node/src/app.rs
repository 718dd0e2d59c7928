use crate::config::NodeConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sluice_chain::{ClientSet, PayoutExecutor, PayoutNotifier, TxReceipt};
use sluice_engine::{ConversationEngine, Messenger};
use sluice_store::{JsonStore, StateStore};
use sluice_types::{Address, ChatId};
use std::sync::Arc;
use tracing::{info, warn};

/// Forwards payout notifications to the review channel, the same channel
/// reviewers act in.
pub struct ReviewChannelNotifier {
    messenger: Arc<dyn Messenger>,
    channel: ChatId,
}

impl ReviewChannelNotifier {
    pub fn new(messenger: Arc<dyn Messenger>, channel: ChatId) -> Self {
        Self { messenger, channel }
    }
}

#[async_trait]
impl PayoutNotifier for ReviewChannelNotifier {
    async fn payout_sent(&self, receipt: &TxReceipt, note: &str) {
        let text = format!(
            "💸 Outgoing transaction ({})\nNetwork: {}\nAmount: {}\nTo: {}\nTx: {}",
            note, receipt.network, receipt.amount, receipt.to, receipt.explorer_link
        );
        if let Err(e) = self.messenger.send(self.channel, &text).await {
            warn!(error = %e, "Failed to deliver payout notification");
        }
    }
}

/// Assemble the engine from configuration and the injected capabilities.
pub fn build_engine(
    config: &NodeConfig,
    clients: ClientSet,
    messenger: Arc<dyn Messenger>,
) -> Result<Arc<ConversationEngine>> {
    let networks = config.networks()?;
    if networks.is_empty() {
        anyhow::bail!("No networks configured");
    }

    let sender = Address::parse(&config.payout.sender_address)
        .map_err(|e| anyhow::anyhow!("Invalid payout.sender_address: {}", e))?;

    let store: Arc<dyn StateStore> = Arc::new(
        JsonStore::open(&config.node.data_dir).context("Failed to open the state store")?,
    );

    let notifier = Arc::new(ReviewChannelNotifier::new(
        messenger.clone(),
        ChatId(config.node.review_channel),
    ));
    let executor = Arc::new(
        PayoutExecutor::new(clients, networks.clone(), sender).with_notifier(notifier),
    );

    let engine = ConversationEngine::new(
        store,
        executor,
        messenger,
        networks,
        config.auth_policy(),
        config.engine_config(),
    );

    info!("🚀 Engine assembled");
    Ok(Arc::new(engine))
}

/// Log per-network connectivity at startup, the way operators expect to
/// see which faucets are live.
pub async fn report_connectivity(config: &NodeConfig, clients: &ClientSet) -> Result<()> {
    for (id, _) in config.networks()?.iter() {
        match clients.get(id) {
            Some(client) if client.is_connected().await => {
                info!(network = %id, "🔗 Connected to network RPC");
            }
            Some(_) => {
                warn!(network = %id, "Network RPC not connected");
            }
            None => {
                warn!(network = %id, "No chain client configured for network");
            }
        }
    }
    Ok(())
}
