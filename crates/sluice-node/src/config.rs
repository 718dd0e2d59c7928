use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sluice_engine::{AuthPolicy, EngineConfig, SocialTasksConfig};
use sluice_types::{AccountId, ChatId, NetworkConfig, NetworkId, Networks, TokenAmount};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub node: NodeSettings,
    pub payout: PayoutSettings,
    pub campaign: CampaignSettings,
    pub networks: BTreeMap<String, NetworkSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSettings {
    pub data_dir: PathBuf,
    /// Privileged identities; owners may issue every command.
    pub owner_ids: Vec<i64>,
    /// Additional identities allowed to act on review requests.
    #[serde(default)]
    pub reviewer_ids: Vec<i64>,
    /// Chat receiving review requests and operational notices.
    pub review_channel: i64,
    /// Channel accounts must join before using the service; omit to skip
    /// the gate.
    #[serde(default)]
    pub gate_channel: Option<i64>,
    #[serde(default)]
    pub gate_invite_url: Option<String>,
    pub owner_contact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutSettings {
    /// Treasury address payouts are sent from. The matching key lives
    /// inside the chain-client capability, never here.
    pub sender_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSettings {
    pub promo_link: String,
    pub follow_primary: String,
    pub follow_secondary: String,
    pub promo_hashtags: String,
    pub partner_bot_url: String,
}

/// Amounts are written in display units (e.g. `faucet_amount = 0.05`) and
/// converted to base units once at load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    pub display_name: String,
    pub currency_symbol: String,
    #[serde(default)]
    pub faucet_enabled: bool,
    #[serde(default)]
    pub purchase_enabled: bool,
    #[serde(default)]
    pub faucet_amount: Option<f64>,
    #[serde(default)]
    pub task_reward_amount: Option<f64>,
    pub chain_id: u64,
    pub rpc_url: String,
    pub explorer_url: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let mut networks = BTreeMap::new();
        networks.insert(
            "sepolia".to_string(),
            NetworkSettings {
                display_name: "Eth Sepolia".to_string(),
                currency_symbol: "ETH".to_string(),
                faucet_enabled: true,
                purchase_enabled: true,
                faucet_amount: Some(0.05),
                task_reward_amount: None,
                chain_id: 11155111,
                rpc_url: "https://rpc.sepolia.org".to_string(),
                explorer_url: "https://sepolia.etherscan.io".to_string(),
            },
        );

        Self {
            node: NodeSettings {
                data_dir: PathBuf::from("./data"),
                owner_ids: vec![],
                reviewer_ids: vec![],
                review_channel: 0,
                gate_channel: None,
                gate_invite_url: None,
                owner_contact: "@faucet_admin".to_string(),
            },
            payout: PayoutSettings {
                sender_address: "0x0000000000000000000000000000000000000000".to_string(),
            },
            campaign: CampaignSettings {
                promo_link: "https://t.me/sluice_faucet_bot".to_string(),
                follow_primary: "@sluice_faucet".to_string(),
                follow_secondary: "@sluice_partner".to_string(),
                promo_hashtags: "#faucet #testnet".to_string(),
                partner_bot_url: "https://t.me/partner_bot".to_string(),
            },
            networks,
        }
    }
}

impl NodeConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| "Failed to parse configuration")?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Convert the `[networks.*]` tables to the runtime directory,
    /// validating that every configured amount is representable.
    pub fn networks(&self) -> Result<Networks> {
        let mut map = BTreeMap::new();
        for (id, settings) in &self.networks {
            let faucet_amount = settings
                .faucet_amount
                .map(|v| {
                    TokenAmount::from_display(v)
                        .with_context(|| format!("faucet_amount for {} is not representable", id))
                })
                .transpose()?;
            let task_reward_amount = settings
                .task_reward_amount
                .map(|v| {
                    TokenAmount::from_display(v).with_context(|| {
                        format!("task_reward_amount for {} is not representable", id)
                    })
                })
                .transpose()?;

            map.insert(
                NetworkId::new(id.clone()),
                NetworkConfig {
                    display_name: settings.display_name.clone(),
                    currency_symbol: settings.currency_symbol.clone(),
                    faucet_enabled: settings.faucet_enabled,
                    purchase_enabled: settings.purchase_enabled,
                    faucet_amount,
                    task_reward_amount,
                    chain_id: settings.chain_id,
                    rpc_url: settings.rpc_url.clone(),
                    explorer_url: settings.explorer_url.clone(),
                },
            );
        }
        Ok(Networks::new(map))
    }

    pub fn auth_policy(&self) -> AuthPolicy {
        AuthPolicy::new(
            self.node.owner_ids.iter().copied().map(AccountId),
            self.node.reviewer_ids.iter().copied().map(AccountId),
        )
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            review_channel: ChatId(self.node.review_channel),
            gate_channel: self.node.gate_channel.map(ChatId),
            gate_invite_url: self.node.gate_invite_url.clone(),
            owner_contact: self.node.owner_contact.clone(),
            promo_link: self.campaign.promo_link.clone(),
            social: SocialTasksConfig {
                follow_primary: self.campaign.follow_primary.clone(),
                follow_secondary: self.campaign.follow_secondary.clone(),
                promo_hashtags: self.campaign.promo_hashtags.clone(),
                partner_bot_url: self.campaign.partner_bot_url.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_roundtrip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = NodeConfig::default();
        config.node.owner_ids = vec![999];
        config.save_to_file(&path).unwrap();

        let loaded = NodeConfig::from_file(&path).unwrap();
        assert_eq!(loaded.node.owner_ids, vec![999]);
        assert!(loaded.networks.contains_key("sepolia"));
    }

    #[test]
    fn test_networks_conversion() {
        let config = NodeConfig::default();
        let networks = config.networks().unwrap();
        let sepolia = networks.get(&NetworkId::new("sepolia")).unwrap();
        assert_eq!(
            sepolia.faucet_amount,
            TokenAmount::from_display(0.05)
        );
        assert_eq!(sepolia.reward_amount(), sepolia.faucet_amount);
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut config = NodeConfig::default();
        config
            .networks
            .get_mut("sepolia")
            .unwrap()
            .faucet_amount = Some(-1.0);
        assert!(config.networks().is_err());
    }
}
