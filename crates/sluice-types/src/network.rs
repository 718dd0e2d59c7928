use crate::amount::TokenAmount;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Configuration key for a reward network (e.g. `sepolia`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(pub String);

impl NetworkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Static per-network configuration. Loaded once at startup and immutable
/// afterwards; user data never lives here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub display_name: String,
    pub currency_symbol: String,
    pub faucet_enabled: bool,
    pub purchase_enabled: bool,
    pub faucet_amount: Option<TokenAmount>,
    pub task_reward_amount: Option<TokenAmount>,
    pub chain_id: u64,
    pub rpc_url: String,
    pub explorer_url: String,
}

impl NetworkConfig {
    /// The task-based reward amount falls back to the faucet amount when
    /// not configured separately.
    pub fn reward_amount(&self) -> Option<TokenAmount> {
        self.task_reward_amount.or(self.faucet_amount)
    }

    pub fn explorer_tx_link(&self, tx_id: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), tx_id)
    }
}

/// The full set of configured reward networks, keyed by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Networks(BTreeMap<NetworkId, NetworkConfig>);

impl Networks {
    pub fn new(map: BTreeMap<NetworkId, NetworkConfig>) -> Self {
        Self(map)
    }

    pub fn get(&self, id: &NetworkId) -> Option<&NetworkConfig> {
        self.0.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NetworkId, &NetworkConfig)> {
        self.0.iter()
    }

    pub fn faucet_enabled(&self) -> impl Iterator<Item = (&NetworkId, &NetworkConfig)> {
        self.0.iter().filter(|(_, c)| c.faucet_enabled)
    }

    pub fn purchase_enabled(&self) -> impl Iterator<Item = (&NetworkId, &NetworkConfig)> {
        self.0.iter().filter(|(_, c)| c.purchase_enabled)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve a user-supplied token name against the id, currency symbol,
    /// or squashed display name of each network (owner `send` lookup).
    pub fn resolve(&self, name: &str) -> Option<&NetworkId> {
        let needle = name.to_lowercase();
        self.0.iter().find_map(|(id, config)| {
            let squashed = config.display_name.to_lowercase().replace(' ', "");
            if needle == id.as_str().to_lowercase()
                || needle == config.currency_symbol.to_lowercase()
                || needle == squashed
            {
                Some(id)
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Networks {
        let mut map = BTreeMap::new();
        map.insert(
            NetworkId::new("sepolia"),
            NetworkConfig {
                display_name: "Eth Sepolia".to_string(),
                currency_symbol: "ETH".to_string(),
                faucet_enabled: true,
                purchase_enabled: true,
                faucet_amount: TokenAmount::from_display(0.05),
                task_reward_amount: None,
                chain_id: 11155111,
                rpc_url: "http://localhost:8545".to_string(),
                explorer_url: "https://sepolia.etherscan.io/".to_string(),
            },
        );
        Networks::new(map)
    }

    #[test]
    fn test_reward_amount_falls_back_to_faucet() {
        let networks = sample();
        let config = networks.get(&NetworkId::new("sepolia")).unwrap();
        assert_eq!(config.reward_amount(), config.faucet_amount);
    }

    #[test]
    fn test_resolve_by_id_symbol_and_display() {
        let networks = sample();
        assert!(networks.resolve("sepolia").is_some());
        assert!(networks.resolve("eth").is_some());
        assert!(networks.resolve("ethsepolia").is_some());
        assert!(networks.resolve("monad").is_none());
    }

    #[test]
    fn test_explorer_link_normalizes_trailing_slash() {
        let networks = sample();
        let config = networks.get(&NetworkId::new("sepolia")).unwrap();
        assert_eq!(
            config.explorer_tx_link("0xabc"),
            "https://sepolia.etherscan.io/tx/0xabc"
        );
    }
}
