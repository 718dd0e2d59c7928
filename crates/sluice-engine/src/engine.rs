use crate::auth::AuthPolicy;
use crate::maintenance::Maintenance;
use crate::messenger::{Action, Event, EventKind, Messenger, PhotoRef};
use crate::queue::{Evidence, PendingVerification, TaskKind, VerificationQueue};
use crate::session::{RewardContext, Session};
use sluice_chain::PayoutExecutor;
use sluice_ledger::{AccountRegistry, EligibilityLedger, Ownership, RedemptionRegistry};
use sluice_store::record::CAMPAIGN_EARN_REWARD;
use sluice_store::StateStore;
use sluice_types::error::format_wait;
use sluice_types::{AccountId, Address, ChatId, NetworkId, Networks, Result, SluiceError, TokenAmount};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

// Inline action payloads. The reviewer token format is part of the external
// protocol and must stay stable.
pub(crate) const CB_MENU_FAUCET: &str = "menu_faucet";
pub(crate) const CB_MENU_BALANCE: &str = "menu_balance";
pub(crate) const CB_MENU_PURCHASE: &str = "menu_purchase";
pub(crate) const CB_MENU_EARN: &str = "menu_earn";
pub(crate) const CB_BACK_TO_START: &str = "back_to_start";
pub(crate) const CB_FAUCET_HELP: &str = "how_to_use_faucet";
pub(crate) const CB_FAUCET_REOPEN: &str = "faucet_menu_reopen";
pub(crate) const CB_CHANNEL_JOINED: &str = "check_channel_join";
pub(crate) const CB_CLAIM_PREFIX: &str = "claim_token_";
pub(crate) const CB_BUY_PREFIX: &str = "buy_token_";
pub(crate) const CB_REWARD_PREFIX: &str = "select_reward_token_";
pub(crate) const CB_TASK_SOCIAL: &str = "select_task_social";
pub(crate) const CB_TASK_SCREENSHOT: &str = "select_task_screenshot";
pub(crate) const CB_FOLLOW_1_DONE: &str = "social_follow_1_done";
pub(crate) const CB_FOLLOW_2_DONE: &str = "social_follow_2_done";
pub(crate) const CB_ADMIN_APPROVE_PREFIX: &str = "admin_approve_task_";
pub(crate) const CB_ADMIN_REJECT_PREFIX: &str = "admin_reject_task_";

/// Social-task campaign parameters, injected from configuration rather
/// than hardcoded.
#[derive(Debug, Clone)]
pub struct SocialTasksConfig {
    /// Primary profile to follow, with leading `@`.
    pub follow_primary: String,
    /// Partner profile to follow, with leading `@`.
    pub follow_secondary: String,
    pub promo_hashtags: String,
    /// Partner bot entry link; the account id is appended as a start
    /// parameter.
    pub partner_bot_url: String,
}

impl SocialTasksConfig {
    fn profile_url(handle: &str) -> String {
        format!("https://x.com/{}", handle.trim_start_matches('@'))
    }

    fn partner_link(&self, account: AccountId) -> String {
        format!("{}?start={}", self.partner_bot_url, account)
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Chat receiving review requests and operational notices.
    pub review_channel: ChatId,
    /// Channel an account must join before using the service, if gating is
    /// configured.
    pub gate_channel: Option<ChatId>,
    pub gate_invite_url: Option<String>,
    /// Contact handle shown in "contact the admin" replies.
    pub owner_contact: String,
    /// Public entry link used in the promotion post text.
    pub promo_link: String,
    pub social: SocialTasksConfig,
}

/// Drives all account-facing flows: faucet claims, purchase inquiries, and
/// the task-based reward campaign, plus the reviewer and owner surfaces.
///
/// One session variant per account; the transport serializes events per
/// account, so session reads and writes for one account never race.
pub struct ConversationEngine {
    pub accounts: AccountRegistry,
    pub eligibility: EligibilityLedger,
    pub redemptions: RedemptionRegistry,
    pub queue: VerificationQueue,
    pub maintenance: Maintenance,
    pub(crate) executor: Arc<PayoutExecutor>,
    pub(crate) messenger: Arc<dyn Messenger>,
    pub(crate) networks: Networks,
    pub(crate) policy: AuthPolicy,
    pub(crate) config: EngineConfig,
    pub(crate) sessions: RwLock<HashMap<AccountId, Session>>,
}

impl ConversationEngine {
    pub fn new(
        store: Arc<dyn StateStore>,
        executor: Arc<PayoutExecutor>,
        messenger: Arc<dyn Messenger>,
        networks: Networks,
        policy: AuthPolicy,
        config: EngineConfig,
    ) -> Self {
        Self {
            accounts: AccountRegistry::new(store.clone()),
            eligibility: EligibilityLedger::new(store.clone()),
            redemptions: RedemptionRegistry::new(store),
            queue: VerificationQueue::new(),
            maintenance: Maintenance::new(),
            executor,
            messenger,
            networks,
            policy,
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Entry point for every inbound event.
    pub async fn handle_event(&self, event: Event) -> Result<()> {
        self.accounts
            .touch(
                event.account,
                &event.display_name,
                event.username.as_deref(),
                event.timestamp,
            )
            .await?;

        // Reviewer decisions are not account flows; the human gate keeps
        // working while maintenance is on.
        let reviewer_action = matches!(
            &event.kind,
            EventKind::Button(data)
                if data.starts_with(CB_ADMIN_APPROVE_PREFIX)
                    || data.starts_with(CB_ADMIN_REJECT_PREFIX)
        );
        if self.maintenance.is_on() && !self.policy.is_owner(event.account) && !reviewer_action {
            self.reply(
                &event,
                "⚠️ The service is currently in maintenance mode. Please try again later.",
            )
            .await?;
            return Ok(());
        }

        match event.kind.clone() {
            EventKind::Text(text) if text.starts_with('/') => {
                self.handle_command(&event, &text).await
            }
            EventKind::Text(text) => self.handle_text(&event, &text).await,
            EventKind::Button(data) => self.handle_button(&event, &data).await,
            EventKind::Photo(photo) => self.handle_photo(&event, &photo).await,
        }
    }

    async fn handle_command(&self, event: &Event, text: &str) -> Result<()> {
        let mut parts = text.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let rest: Vec<&str> = parts.collect();

        match command {
            "/start" => self.handle_start(event).await,
            "/cancel" => {
                self.clear_session(event.account).await;
                self.reply(event, "Operation canceled. Use /start to see the options again.")
                    .await?;
                Ok(())
            }
            "/faucet" => self.send_faucet_menu(event).await,
            "/balance" => self.send_balance_report(event).await,
            "/send" => self.handle_owner_send(event, &rest).await,
            "/stat" => self.handle_owner_stat(event).await,
            "/broadcast" => self.handle_owner_broadcast(event, text).await,
            "/maintenance" => self.handle_owner_maintenance(event, &rest).await,
            other => {
                debug!(account = %event.account, command = other, "Unknown command ignored");
                Ok(())
            }
        }
    }

    async fn handle_button(&self, event: &Event, data: &str) -> Result<()> {
        if let Some(rest) = data.strip_prefix(CB_ADMIN_APPROVE_PREFIX) {
            return self.handle_reviewer_decision(event, rest, true).await;
        }
        if let Some(rest) = data.strip_prefix(CB_ADMIN_REJECT_PREFIX) {
            return self.handle_reviewer_decision(event, rest, false).await;
        }

        match data {
            CB_MENU_FAUCET | CB_FAUCET_REOPEN => self.send_faucet_menu(event).await,
            CB_MENU_BALANCE => self.send_balance_report(event).await,
            CB_MENU_PURCHASE => self.send_purchase_menu(event).await,
            CB_MENU_EARN => self.send_reward_menu(event).await,
            CB_BACK_TO_START => {
                self.clear_session(event.account).await;
                self.send_main_menu(event).await
            }
            CB_FAUCET_HELP => self.send_faucet_help(event).await,
            CB_CHANNEL_JOINED => self.handle_channel_recheck(event).await,
            CB_TASK_SOCIAL => self.start_social_branch(event).await,
            CB_TASK_SCREENSHOT => self.start_screenshot_branch(event).await,
            CB_FOLLOW_1_DONE => self.handle_follow_primary_done(event).await,
            CB_FOLLOW_2_DONE => self.handle_follow_secondary_done(event).await,
            _ => {
                if let Some(network) = data.strip_prefix(CB_CLAIM_PREFIX) {
                    self.start_claim_flow(event, &NetworkId::new(network)).await
                } else if let Some(network) = data.strip_prefix(CB_BUY_PREFIX) {
                    self.start_purchase_amount(event, &NetworkId::new(network))
                        .await
                } else if let Some(network) = data.strip_prefix(CB_REWARD_PREFIX) {
                    self.start_reward_address(event, &NetworkId::new(network))
                        .await
                } else {
                    debug!(account = %event.account, data, "Unknown button payload ignored");
                    Ok(())
                }
            }
        }
    }

    async fn handle_text(&self, event: &Event, text: &str) -> Result<()> {
        let session = self.session(event.account).await;
        match session {
            Some(Session::AwaitingClaimAddress { network }) => {
                self.handle_claim_address(event, &network, text).await
            }
            Some(Session::AwaitingPurchaseAmount { network }) => {
                self.handle_purchase_amount(event, &network, text).await
            }
            Some(Session::AwaitingRewardAddress {
                network,
                amount,
                campaign_reentry,
            }) => {
                self.handle_reward_address(event, &network, amount, campaign_reentry, text)
                    .await
            }
            Some(Session::AwaitingSocialHandle { ctx }) => {
                self.handle_social_handle(event, ctx, text).await
            }
            Some(Session::AwaitingPostLink { ctx, handle }) => {
                self.handle_post_link(event, ctx, handle, text).await
            }
            Some(Session::AwaitingScreenshot { .. }) => {
                // Text while an image is required: re-prompt, keep session.
                self.reply(
                    event,
                    "That doesn't look like a screenshot. Please send an image of your completed tasks.",
                )
                .await?;
                Ok(())
            }
            _ => {
                self.reply(event, "Please use /start to see the available options.")
                    .await?;
                Ok(())
            }
        }
    }

    async fn handle_photo(&self, event: &Event, photo: &PhotoRef) -> Result<()> {
        let session = self.session(event.account).await;
        match session {
            Some(Session::AwaitingScreenshot { ctx }) => {
                self.handle_screenshot_submission(event, ctx, photo).await
            }
            _ => {
                debug!(account = %event.account, "Unsolicited photo ignored");
                Ok(())
            }
        }
    }

    // --- menus and entry gating ---

    async fn handle_start(&self, event: &Event) -> Result<()> {
        let Some(channel) = self.config.gate_channel else {
            return self.send_main_menu(event).await;
        };

        match self
            .messenger
            .is_channel_member(channel, event.account)
            .await
        {
            Ok(true) => self.send_main_menu(event).await,
            Ok(false) => self.send_join_prompt(event).await,
            Err(e) => {
                error!(account = %event.account, error = %e, "Channel membership check failed");
                self.reply(
                    event,
                    "An error occurred while checking channel membership. Please try again later.",
                )
                .await?;
                Ok(())
            }
        }
    }

    async fn handle_channel_recheck(&self, event: &Event) -> Result<()> {
        let Some(channel) = self.config.gate_channel else {
            return self.send_main_menu(event).await;
        };

        match self
            .messenger
            .is_channel_member(channel, event.account)
            .await
        {
            Ok(true) => {
                self.reply(event, "✅ Membership verified!").await?;
                self.send_main_menu(event).await
            }
            Ok(false) => self.send_join_prompt(event).await,
            Err(e) => {
                error!(account = %event.account, error = %e, "Channel membership re-check failed");
                self.reply(
                    event,
                    "An error occurred while verifying channel membership. Please try again later.",
                )
                .await?;
                Ok(())
            }
        }
    }

    async fn send_join_prompt(&self, event: &Event) -> Result<()> {
        let mut actions = Vec::new();
        if let Some(url) = &self.config.gate_invite_url {
            actions.push(Action::url("Join the channel 🚀", url.clone()));
        }
        actions.push(Action::callback("I have joined ✅", CB_CHANNEL_JOINED));

        self.messenger
            .send_with_actions(
                event.account.into(),
                "👋 Welcome! Before you can use the service you must join our channel, then press 'I have joined'.",
                &actions,
            )
            .await?;
        Ok(())
    }

    async fn send_main_menu(&self, event: &Event) -> Result<()> {
        let actions = vec![
            Action::callback("Faucet 🤖", CB_MENU_FAUCET),
            Action::callback("Balance 💰", CB_MENU_BALANCE),
            Action::callback("Purchase Token 💳", CB_MENU_PURCHASE),
            Action::callback("Get More Tokens ☕", CB_MENU_EARN),
        ];
        self.messenger
            .send_with_actions(
                event.account.into(),
                "Hello! Welcome to the faucet. Please choose an option:",
                &actions,
            )
            .await?;
        Ok(())
    }

    async fn send_faucet_menu(&self, event: &Event) -> Result<()> {
        let mut actions: Vec<Action> = self
            .networks
            .faucet_enabled()
            .map(|(id, config)| {
                Action::callback(
                    format!("Claim {}", config.display_name),
                    format!("{}{}", CB_CLAIM_PREFIX, id),
                )
            })
            .collect();
        actions.push(Action::callback("How to use? 🆘", CB_FAUCET_HELP));
        actions.push(Action::callback("⬅️ Back to main menu", CB_BACK_TO_START));

        self.messenger
            .send_with_actions(
                event.account.into(),
                "Please select which testnet token you want to claim:",
                &actions,
            )
            .await?;
        Ok(())
    }

    async fn send_faucet_help(&self, event: &Event) -> Result<()> {
        let actions = vec![
            Action::callback("⬅️ Back to faucet menu", CB_FAUCET_REOPEN),
            Action::callback("⬅️ Back to main menu", CB_BACK_TO_START),
        ];
        self.messenger
            .send_with_actions(
                event.account.into(),
                "How to use the faucet:\n\
                 1. Select the testnet token you want to claim.\n\
                 2. Send your wallet address when prompted.\n\
                 3. Respect the 24-hour claim limit.\n\
                 4. Complete any required verification tasks.",
                &actions,
            )
            .await?;
        Ok(())
    }

    // --- claim flow ---

    async fn start_claim_flow(&self, event: &Event, network: &NetworkId) -> Result<()> {
        let Some(config) = self.networks.get(network).filter(|c| c.faucet_enabled) else {
            self.reply(event, "The faucet for this token is currently unavailable.")
                .await?;
            return Ok(());
        };

        self.set_session(
            event.account,
            Session::AwaitingClaimAddress {
                network: network.clone(),
            },
        )
        .await;

        self.reply(
            event,
            &format!(
                "Please send your {} wallet address to receive the testnet tokens.",
                config.currency_symbol
            ),
        )
        .await?;
        Ok(())
    }

    async fn handle_claim_address(
        &self,
        event: &Event,
        network: &NetworkId,
        text: &str,
    ) -> Result<()> {
        let address = match Address::parse(text) {
            Ok(address) => address,
            Err(_) => {
                // Malformed input re-prompts the same state.
                self.reply(
                    event,
                    "That doesn't look like a valid wallet address. Please send a correct one.",
                )
                .await?;
                return Ok(());
            }
        };

        let Some(config) = self.networks.get(network).cloned() else {
            self.clear_session(event.account).await;
            self.reply(event, "The faucet for this token is currently unavailable.")
                .await?;
            return Ok(());
        };

        let reservation = match self
            .eligibility
            .check_and_reserve(event.account, network, event.timestamp)
            .await
        {
            Ok(reservation) => reservation,
            Err(SluiceError::RateLimited { remaining_secs }) => {
                self.clear_session(event.account).await;
                self.reply(
                    event,
                    &format!(
                        "You can only claim this token once every 24 hours. Please wait {}.",
                        format_wait(remaining_secs)
                    ),
                )
                .await?;
                return Ok(());
            }
            Err(e) => {
                self.clear_session(event.account).await;
                self.reply(event, "Your previous claim is still being processed.")
                    .await?;
                warn!(account = %event.account, error = %e, "Claim refused");
                return Ok(());
            }
        };

        let Some(amount) = config.faucet_amount else {
            self.clear_session(event.account).await;
            error!(
                network = %network,
                "Faucet amount not configured, refusing claim"
            );
            self.reply(
                event,
                &format!(
                    "Configuration error: the faucet amount is not set for {}. Please contact the admin: {}",
                    config.display_name, self.config.owner_contact
                ),
            )
            .await?;
            return Ok(());
        };

        self.reply(
            event,
            &format!(
                "Processing your request to send {} {} to {}...",
                amount, config.currency_symbol, address
            ),
        )
        .await?;

        match self
            .executor
            .send(network, &address, amount, "faucet claim")
            .await
        {
            Ok(receipt) => {
                // Cooldown is consumed only once the send is confirmed, and
                // persisted before the confirmation reply goes out.
                self.eligibility
                    .commit(reservation, event.timestamp)
                    .await?;
                self.clear_session(event.account).await;
                self.reply(
                    event,
                    &format!("✅ Success! Token sent.\nTx: {}", receipt.explorer_link),
                )
                .await?;
            }
            Err(e) => {
                drop(reservation);
                self.clear_session(event.account).await;
                self.reply(event, &format!("Failed to send token. Reason: {}", e))
                    .await?;
            }
        }
        Ok(())
    }

    // --- purchase flow ---

    async fn send_purchase_menu(&self, event: &Event) -> Result<()> {
        let mut actions: Vec<Action> = self
            .networks
            .purchase_enabled()
            .map(|(id, config)| {
                Action::callback(
                    format!("Buy {}", config.display_name),
                    format!("{}{}", CB_BUY_PREFIX, id),
                )
            })
            .collect();
        actions.push(Action::callback("⬅️ Back to main menu", CB_BACK_TO_START));

        self.set_session(event.account, Session::SelectingPurchaseNetwork)
            .await;
        self.messenger
            .send_with_actions(
                event.account.into(),
                "Which token would you like to purchase?",
                &actions,
            )
            .await?;
        Ok(())
    }

    async fn start_purchase_amount(&self, event: &Event, network: &NetworkId) -> Result<()> {
        if !matches!(
            self.session(event.account).await,
            Some(Session::SelectingPurchaseNetwork)
        ) {
            debug!(account = %event.account, "Purchase selection outside the flow ignored");
            return Ok(());
        }

        let Some(config) = self.networks.get(network).filter(|c| c.purchase_enabled) else {
            self.clear_session(event.account).await;
            self.reply(event, "This token is not available for purchase.")
                .await?;
            return Ok(());
        };

        self.set_session(
            event.account,
            Session::AwaitingPurchaseAmount {
                network: network.clone(),
            },
        )
        .await;
        self.reply(
            event,
            &format!(
                "You selected {}. How much {} would you like to purchase?",
                config.display_name, config.currency_symbol
            ),
        )
        .await?;
        Ok(())
    }

    async fn handle_purchase_amount(
        &self,
        event: &Event,
        network: &NetworkId,
        text: &str,
    ) -> Result<()> {
        let amount = match text.trim().parse::<f64>() {
            Ok(value) if value > 0.0 => value,
            _ => {
                self.reply(event, "Invalid amount. Please enter a positive number.")
                    .await?;
                return Ok(());
            }
        };

        let Some(config) = self.networks.get(network).cloned() else {
            self.clear_session(event.account).await;
            self.reply(event, "This token is not available for purchase.")
                .await?;
            return Ok(());
        };

        self.clear_session(event.account).await;

        match self.executor.treasury_balance(network).await {
            Err(e) => {
                warn!(network = %network, error = %e, "Treasury balance unavailable");
                self.reply(
                    event,
                    &format!(
                        "🚫 Apologies! The connection to {} is unavailable right now.",
                        config.display_name
                    ),
                )
                .await?;
            }
            Ok(balance) if balance.to_display() < amount => {
                self.reply(
                    event,
                    &format!(
                        "🚫 Apologies! The treasury does not hold enough {} to fulfill your request.",
                        config.display_name
                    ),
                )
                .await?;
            }
            Ok(_) => {
                // Inquiry only: the reviewer follows up out of band.
                self.reply(
                    event,
                    &format!(
                        "✅ We can fulfill your request for {:.4} {} of {}!\n\nPlease contact the admin to proceed: {}",
                        amount, config.currency_symbol, config.display_name, self.config.owner_contact
                    ),
                )
                .await?;
                if let Err(e) = self
                    .messenger
                    .send(
                        self.config.review_channel,
                        &format!(
                            "❗ NEW PURCHASE REQUEST\nUser: {} ({})\nWants to buy {:.4} {} of {}.",
                            event.display_name,
                            event.account,
                            amount,
                            config.currency_symbol,
                            config.display_name
                        ),
                    )
                    .await
                {
                    warn!(error = %e, "Failed to notify reviewer about purchase request");
                }
            }
        }
        Ok(())
    }

    // --- earn-reward flow ---

    async fn send_reward_menu(&self, event: &Event) -> Result<()> {
        let campaign_reentry = self
            .accounts
            .campaign_done(event.account, CAMPAIGN_EARN_REWARD)
            .await?;

        let mut actions = Vec::new();
        for (id, config) in self.networks.faucet_enabled() {
            let amount = config
                .reward_amount()
                .map(|a| a.to_string())
                .unwrap_or_else(|| "0".to_string());
            actions.push(Action::callback(
                format!("Get {} ({} {})", config.display_name, amount, config.currency_symbol),
                format!("{}{}", CB_REWARD_PREFIX, id),
            ));
        }
        actions.push(Action::callback("⬅️ Back to main menu", CB_BACK_TO_START));

        self.set_session(
            event.account,
            Session::SelectingRewardNetwork { campaign_reentry },
        )
        .await;
        self.messenger
            .send_with_actions(
                event.account.into(),
                "Great! Which testnet token would you like to receive as a reward for completing tasks?",
                &actions,
            )
            .await?;
        Ok(())
    }

    async fn start_reward_address(&self, event: &Event, network: &NetworkId) -> Result<()> {
        let Some(Session::SelectingRewardNetwork { campaign_reentry }) =
            self.session(event.account).await
        else {
            debug!(account = %event.account, "Reward selection outside the flow ignored");
            return Ok(());
        };

        let Some(config) = self.networks.get(network).filter(|c| c.faucet_enabled) else {
            self.clear_session(event.account).await;
            self.reply(event, "Error: selected token not found. Please try again.")
                .await?;
            return Ok(());
        };

        let Some(amount) = config.reward_amount() else {
            self.clear_session(event.account).await;
            error!(
                network = %network,
                "Task reward amount not configured, aborting reward flow"
            );
            self.reply(
                event,
                &format!(
                    "Configuration error: the reward amount is not set for {}. Please contact the admin: {}",
                    config.display_name, self.config.owner_contact
                ),
            )
            .await?;
            return Ok(());
        };

        self.set_session(
            event.account,
            Session::AwaitingRewardAddress {
                network: network.clone(),
                amount,
                campaign_reentry,
            },
        )
        .await;
        self.reply(
            event,
            &format!(
                "You've chosen {}. Please send your {} wallet address to receive the reward.",
                config.display_name, config.currency_symbol
            ),
        )
        .await?;
        Ok(())
    }

    async fn handle_reward_address(
        &self,
        event: &Event,
        network: &NetworkId,
        amount: TokenAmount,
        campaign_reentry: bool,
        text: &str,
    ) -> Result<()> {
        let address = match Address::parse(text) {
            Ok(address) => address,
            Err(_) => {
                self.reply(
                    event,
                    "That doesn't look like a valid wallet address. Please send a correct one.",
                )
                .await?;
                return Ok(());
            }
        };

        // Address uniqueness gate, before any task branch is shown.
        let ownership = self.redemptions.resolve(&address, event.account).await?;
        let reentry = match ownership {
            Ownership::OwnedByOther => {
                self.clear_session(event.account).await;
                self.reply(
                    event,
                    "🚫 This wallet address has already been used to claim rewards by another account. \
                     Each address can be used by one account only. Please use a different address.",
                )
                .await?;
                return Ok(());
            }
            Ownership::OwnedBySelf => {
                info!(
                    account = %event.account,
                    address = %address,
                    "Campaign re-entry with previously redeemed address"
                );
                true
            }
            Ownership::Free => campaign_reentry,
        };

        if reentry {
            self.reply(
                event,
                "⚠️ You have completed this campaign before. You can go through the tasks again, \
                 but no further rewards will be distributed.",
            )
            .await?;
        }

        let ctx = RewardContext {
            network: network.clone(),
            amount,
            address,
            reentry,
        };
        self.set_session(event.account, Session::ChoosingTask { ctx })
            .await;

        let actions = vec![
            Action::callback("Complete social tasks 🐦", CB_TASK_SOCIAL),
            Action::callback("Submit partner bot proof 🤖", CB_TASK_SCREENSHOT),
        ];
        self.messenger
            .send_with_actions(
                event.account.into(),
                "Great! Now select which task you would like to complete to earn your reward:",
                &actions,
            )
            .await?;
        Ok(())
    }

    async fn start_social_branch(&self, event: &Event) -> Result<()> {
        let Some(Session::ChoosingTask { ctx }) = self.session(event.account).await else {
            debug!(account = %event.account, "Task selection outside the flow ignored");
            return Ok(());
        };

        let primary = self.config.social.follow_primary.clone();
        let actions = vec![
            Action::url(
                format!("Follow {} 🐦", primary),
                SocialTasksConfig::profile_url(&primary),
            ),
            Action::callback("I have followed ✅", CB_FOLLOW_1_DONE),
        ];
        self.set_session(event.account, Session::AwaitingFollowPrimary { ctx })
            .await;
        self.messenger
            .send_with_actions(
                event.account.into(),
                &format!(
                    "First task:\n1. Follow {}\n2. Press 'I have followed' when done.",
                    primary
                ),
                &actions,
            )
            .await?;
        Ok(())
    }

    async fn handle_follow_primary_done(&self, event: &Event) -> Result<()> {
        let Some(Session::AwaitingFollowPrimary { ctx }) = self.session(event.account).await
        else {
            debug!(account = %event.account, "Follow confirmation outside the flow ignored");
            return Ok(());
        };

        self.set_session(event.account, Session::AwaitingSocialHandle { ctx })
            .await;
        self.reply(
            event,
            "Thank you for following! Please send your handle (e.g. @yourname) or profile link for verification.",
        )
        .await?;
        Ok(())
    }

    async fn handle_social_handle(
        &self,
        event: &Event,
        ctx: RewardContext,
        text: &str,
    ) -> Result<()> {
        let handle = text.trim().to_string();
        let secondary = self.config.social.follow_secondary.clone();

        let actions = vec![
            Action::url(
                format!("Follow {} 🐦", secondary),
                SocialTasksConfig::profile_url(&secondary),
            ),
            Action::callback("I have followed ✅", CB_FOLLOW_2_DONE),
        ];
        self.set_session(
            event.account,
            Session::AwaitingFollowSecondary { ctx, handle },
        )
        .await;
        self.messenger
            .send_with_actions(
                event.account.into(),
                &format!(
                    "Got it! Second task:\n1. Follow our partner {}\n2. Press 'I have followed' when done.",
                    secondary
                ),
                &actions,
            )
            .await?;
        Ok(())
    }

    async fn handle_follow_secondary_done(&self, event: &Event) -> Result<()> {
        let Some(Session::AwaitingFollowSecondary { ctx, handle }) =
            self.session(event.account).await
        else {
            debug!(account = %event.account, "Follow confirmation outside the flow ignored");
            return Ok(());
        };

        let promo = format!(
            "Get free testnet tokens from this faucet!\n\nClick here: {}\n\n{}",
            self.config.promo_link, self.config.social.promo_hashtags
        );
        self.set_session(event.account, Session::AwaitingPostLink { ctx, handle })
            .await;
        self.reply(
            event,
            &format!(
                "Almost there! Final task:\n1. Publish a post with the following content:\n\n{}\n\n\
                 2. Keep the hashtags.\n3. Then send the link to your post (e.g. https://x.com/yourname/status/12345).",
                promo
            ),
        )
        .await?;
        Ok(())
    }

    async fn handle_post_link(
        &self,
        event: &Event,
        ctx: RewardContext,
        handle: String,
        text: &str,
    ) -> Result<()> {
        let link = text.trim();
        if !is_social_post_link(link) {
            self.reply(
                event,
                "That doesn't look like a valid post link. Please send a direct link to your post \
                 (e.g. https://x.com/yourname/status/12345).",
            )
            .await?;
            return Ok(());
        }

        self.reply(event, "We are checking your submission, please wait a moment.")
            .await?;

        let notification = format!(
            "✅ NEW TASK VERIFICATION REQUEST\n\n\
             User: {} ({})\nUsername: @{}\n\
             Reward: {} {} → {}\n\
             Handle (self-reported): {}\nPost link: {}\n\
             Status: {}\n\nPlease review and decide.",
            event.display_name,
            event.account,
            event.username.as_deref().unwrap_or("N/A"),
            ctx.amount,
            self.currency_symbol(&ctx.network),
            ctx.address,
            handle,
            link,
            reentry_status(ctx.reentry),
        );

        let actions = decision_actions(event.account);
        let reviewer_msg = match self
            .messenger
            .send_with_actions(self.config.review_channel, &notification, &actions)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                error!(account = %event.account, error = %e, "Failed to deliver review request");
                self.clear_session(event.account).await;
                self.reply(
                    event,
                    "Failed to submit your task for verification. Please try again later.",
                )
                .await?;
                return Ok(());
            }
        };

        let record = PendingVerification {
            task: TaskKind::SocialPost,
            network: ctx.network,
            amount: ctx.amount,
            address: ctx.address,
            evidence: Evidence::SocialPost {
                handle,
                link: link.to_string(),
            },
            submitter_name: event.display_name.clone(),
            submitter_username: event.username.clone(),
            reentry: ctx.reentry,
            reviewer_msg,
        };
        self.submit_for_review(event, record).await
    }

    async fn start_screenshot_branch(&self, event: &Event) -> Result<()> {
        let Some(Session::ChoosingTask { ctx }) = self.session(event.account).await else {
            debug!(account = %event.account, "Task selection outside the flow ignored");
            return Ok(());
        };

        let link = self.config.social.partner_link(event.account);
        let actions = vec![Action::url("Open the partner bot 🚀", link)];
        self.set_session(event.account, Session::AwaitingScreenshot { ctx })
            .await;
        self.messenger
            .send_with_actions(
                event.account.into(),
                "Open the partner bot with the button below and complete the tasks there.\n\n\
                 Once done, send a screenshot of your completion proof directly to this chat. \
                 Your submission will be reviewed manually.",
                &actions,
            )
            .await?;
        Ok(())
    }

    async fn handle_screenshot_submission(
        &self,
        event: &Event,
        ctx: RewardContext,
        photo: &PhotoRef,
    ) -> Result<()> {
        self.reply(
            event,
            "Thank you for submitting your screenshot! Your task completion will now be reviewed.",
        )
        .await?;

        let caption = format!(
            "✅ NEW TASK VERIFICATION REQUEST (SCREENSHOT)\n\n\
             User: {} ({})\nUsername: @{}\n\
             Reward: {} {} → {}\n\
             Status: {}\n\nPlease review the screenshot and decide.",
            event.display_name,
            event.account,
            event.username.as_deref().unwrap_or("N/A"),
            ctx.amount,
            self.currency_symbol(&ctx.network),
            ctx.address,
            reentry_status(ctx.reentry),
        );

        let actions = decision_actions(event.account);
        let reviewer_msg = match self
            .messenger
            .send_photo(self.config.review_channel, photo, &caption, &actions)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                error!(account = %event.account, error = %e, "Failed to deliver review request");
                self.clear_session(event.account).await;
                self.reply(
                    event,
                    "Failed to submit your screenshot for verification. Please try again later.",
                )
                .await?;
                return Ok(());
            }
        };

        let record = PendingVerification {
            task: TaskKind::Screenshot,
            network: ctx.network,
            amount: ctx.amount,
            address: ctx.address,
            evidence: Evidence::Screenshot(photo.clone()),
            submitter_name: event.display_name.clone(),
            submitter_username: event.username.clone(),
            reentry: ctx.reentry,
            reviewer_msg,
        };
        self.submit_for_review(event, record).await
    }

    /// Terminal step of both task branches: hand the record to the review
    /// queue and end the session. A resubmission replaces the prior record;
    /// its orphaned reviewer message is annotated as stale.
    async fn submit_for_review(&self, event: &Event, record: PendingVerification) -> Result<()> {
        let replaced = self.queue.enqueue(event.account, record).await;
        if let Some(prior) = replaced {
            if let Err(e) = self
                .messenger
                .edit_message(
                    self.config.review_channel,
                    prior.reviewer_msg,
                    &format!(
                        "⚠️ Superseded by a newer submission from {} ({}).",
                        prior.submitter_name, event.account
                    ),
                )
                .await
            {
                warn!(error = %e, "Failed to annotate superseded review request");
            }
        }

        self.clear_session(event.account).await;
        self.reply(
            event,
            "Your task submission has been sent for review. You will be notified of the outcome shortly!",
        )
        .await?;
        Ok(())
    }

    // --- session plumbing ---

    pub(crate) async fn session(&self, account: AccountId) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions.get(&account).cloned()
    }

    pub(crate) async fn set_session(&self, account: AccountId, session: Session) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(account, session);
    }

    pub(crate) async fn clear_session(&self, account: AccountId) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&account);
    }

    pub(crate) async fn reply(&self, event: &Event, text: &str) -> Result<()> {
        self.messenger.send(event.account.into(), text).await?;
        Ok(())
    }

    pub(crate) fn currency_symbol(&self, network: &NetworkId) -> String {
        self.networks
            .get(network)
            .map(|c| c.currency_symbol.clone())
            .unwrap_or_else(|| network.to_string().to_uppercase())
    }
}

pub(crate) fn decision_actions(account: AccountId) -> Vec<Action> {
    vec![
        Action::callback("✅ Approve", format!("{}{}", CB_ADMIN_APPROVE_PREFIX, account)),
        Action::callback("❌ Reject", format!("{}{}", CB_ADMIN_REJECT_PREFIX, account)),
    ]
}

pub(crate) fn reentry_status(reentry: bool) -> &'static str {
    if reentry {
        "Re-entry (no reward)"
    } else {
        "First time (reward eligible)"
    }
}

fn is_social_post_link(link: &str) -> bool {
    (link.starts_with("https://x.com/") || link.starts_with("https://twitter.com/"))
        && link.contains("/status/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_social_post_link_patterns() {
        assert!(is_social_post_link("https://x.com/name/status/123"));
        assert!(is_social_post_link("https://twitter.com/name/status/123"));
        assert!(!is_social_post_link("https://x.com/name"));
        assert!(!is_social_post_link("https://example.com/name/status/123"));
        assert!(!is_social_post_link("x.com/name/status/123"));
    }

    #[test]
    fn test_decision_action_tokens() {
        let actions = decision_actions(AccountId(42));
        match &actions[0] {
            Action::Callback { data, .. } => assert_eq!(data, "admin_approve_task_42"),
            _ => panic!("expected callback"),
        }
        match &actions[1] {
            Action::Callback { data, .. } => assert_eq!(data, "admin_reject_task_42"),
            _ => panic!("expected callback"),
        }
    }
}
