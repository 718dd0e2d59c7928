use crate::engine::{reentry_status, ConversationEngine};
use crate::messenger::Event;
use crate::queue::{Evidence, PendingVerification, TaskKind};
use sluice_store::record::CAMPAIGN_EARN_REWARD;
use sluice_types::{AccountId, Address, ChatId, Result, TokenAmount};
use std::time::Duration;
use tracing::{error, info, warn};

const BROADCAST_PACING: Duration = Duration::from_millis(50);

impl ConversationEngine {
    // --- reviewer decision protocol ---

    /// Act on an `admin_<approve|reject>_task_<accountId>` token. Only an
    /// identity in the reviewer set may act; a decision is effective
    /// exactly once.
    pub(crate) async fn handle_reviewer_decision(
        &self,
        event: &Event,
        token_rest: &str,
        approve: bool,
    ) -> Result<()> {
        if !self.policy.is_reviewer(event.account) {
            self.reply(event, "You are not authorized to perform this action.")
                .await?;
            return Ok(());
        }

        let Ok(subject) = token_rest.parse::<i64>().map(AccountId) else {
            warn!(token = token_rest, "Malformed reviewer decision token");
            self.reply(event, "Malformed review token.").await?;
            return Ok(());
        };

        let Some(record) = self.queue.dequeue(subject).await else {
            // Double-click protection: the submission was already resolved.
            info!(subject = %subject, "Reviewer acted on an already processed submission");
            self.reply(
                event,
                &format!(
                    "Task request for account {} not found or already processed.",
                    subject
                ),
            )
            .await?;
            return Ok(());
        };

        if approve {
            self.approve_submission(event, subject, record).await
        } else {
            self.reject_submission(event, subject, record).await
        }
    }

    async fn approve_submission(
        &self,
        event: &Event,
        subject: AccountId,
        record: PendingVerification,
    ) -> Result<()> {
        let symbol = self.currency_symbol(&record.network);

        if record.reentry {
            // Repeat completion: approval never pays and never rebinds.
            info!(subject = %subject, "Re-entry submission approved, no payout");
            self.annotate_decision(
                &record,
                &format!(
                    "✅ Approved (no token sent, repeat completion)\n{}\nProcessed by {}",
                    submission_summary(subject, &record, &symbol),
                    event.display_name
                ),
            )
            .await;
            self.messenger
                .send(
                    subject.into(),
                    "🎉 Congratulations! Your task submission has been APPROVED.\n\n\
                     However, as you have completed this campaign before, no further rewards will be distributed.",
                )
                .await?;
            return Ok(());
        }

        match self
            .executor
            .send(&record.network, &record.address, record.amount, "task reward")
            .await
        {
            Ok(receipt) => {
                // Persist the campaign flag and the address binding before
                // the confirmation goes out.
                self.accounts
                    .mark_campaign_done(subject, CAMPAIGN_EARN_REWARD, event.timestamp)
                    .await?;
                if let Err(e) = self.redemptions.bind(&record.address, subject).await {
                    // resolve() gated the address at entry, so a conflict
                    // here means another account bound it mid-flight.
                    error!(
                        subject = %subject,
                        address = %record.address,
                        error = %e,
                        "Address bind failed after payout"
                    );
                }

                self.annotate_decision(
                    &record,
                    &format!(
                        "✅ Approved & token sent!\n{}\nTx: {}\nProcessed by {}",
                        submission_summary(subject, &record, &symbol),
                        receipt.explorer_link,
                        event.display_name
                    ),
                )
                .await;
                self.messenger
                    .send(
                        subject.into(),
                        &format!(
                            "🎉 Congratulations! Your task submission has been APPROVED and your reward has been sent!\n\n\
                             You received {} {} at {}.\nTx: {}",
                            record.amount, symbol, record.address, receipt.explorer_link
                        ),
                    )
                    .await?;
            }
            Err(e) => {
                // Nothing was mutated; leave the submission pending so the
                // reviewer can retry the approval.
                error!(subject = %subject, error = %e, "Reward payout failed");
                self.queue.restore(subject, record).await;
                if let Err(notify_err) = self
                    .messenger
                    .send(
                        self.config.review_channel,
                        &format!(
                            "❗ Approval for account {} failed to send the reward: {}\n\
                             The submission remains pending; approve again to retry.",
                            subject, e
                        ),
                    )
                    .await
                {
                    warn!(error = %notify_err, "Failed to notify reviewer about payout failure");
                }
                self.messenger
                    .send(
                        subject.into(),
                        &format!(
                            "🚫 Your task submission was approved, but there was an issue sending your reward. \
                             Reason: {}. Please contact the admin: {}",
                            e, self.config.owner_contact
                        ),
                    )
                    .await?;
            }
        }
        Ok(())
    }

    async fn reject_submission(
        &self,
        event: &Event,
        subject: AccountId,
        record: PendingVerification,
    ) -> Result<()> {
        let symbol = self.currency_symbol(&record.network);
        info!(subject = %subject, task = record.task.describe(), "Submission rejected");

        self.annotate_decision(
            &record,
            &format!(
                "❌ Rejected\n{}\nProcessed by {}",
                submission_summary(subject, &record, &symbol),
                event.display_name
            ),
        )
        .await;

        let guidance = match record.task {
            TaskKind::SocialPost => format!(
                "🚫 Unfortunately, your task submission has been REJECTED.\n\n\
                 Please make sure you followed {} and {} and provided a valid promotion post link. \
                 You can try again from the menu.",
                self.config.social.follow_primary, self.config.social.follow_secondary
            ),
            TaskKind::Screenshot => "🚫 Unfortunately, your task submission has been REJECTED.\n\n\
                 Please make sure you completed the partner bot tasks and provided a clear screenshot. \
                 You can try again from the menu."
                .to_string(),
        };
        self.messenger.send(subject.into(), &guidance).await?;
        Ok(())
    }

    /// Rewrite the reviewer message with the decision outcome, dropping its
    /// action buttons. Best-effort: the decision stands even if the edit
    /// fails.
    async fn annotate_decision(&self, record: &PendingVerification, text: &str) {
        if let Err(e) = self
            .messenger
            .edit_message(self.config.review_channel, record.reviewer_msg, text)
            .await
        {
            warn!(error = %e, "Failed to annotate processed review request");
        }
    }

    // --- owner commands ---

    pub(crate) async fn handle_owner_send(&self, event: &Event, args: &[&str]) -> Result<()> {
        if !self.policy.is_owner(event.account) {
            self.reply(event, "You are not authorized to use this command.")
                .await?;
            return Ok(());
        }

        if args.len() != 3 {
            self.reply(
                event,
                "Usage: /send <amount> <token_name> <recipient_address>\nExample: /send 0.5 sepolia 0xabc...",
            )
            .await?;
            return Ok(());
        }
        let (amount_str, token_name, recipient) = (args[0], args[1], args[2]);

        let amount = match amount_str
            .parse::<f64>()
            .ok()
            .and_then(TokenAmount::from_display)
        {
            Some(amount) if !amount.is_zero() => amount,
            _ => {
                self.reply(event, "Invalid amount. Usage: /send <amount> <token_name> <recipient_address>")
                    .await?;
                return Ok(());
            }
        };

        let Some(network) = self.networks.resolve(token_name).cloned() else {
            self.reply(event, "Invalid arguments. Check the token name and address.")
                .await?;
            return Ok(());
        };

        let Ok(address) = Address::parse(recipient) else {
            self.reply(event, "Invalid arguments. Check the token name and address.")
                .await?;
            return Ok(());
        };

        let symbol = self.currency_symbol(&network);
        self.reply(event, &format!("Sending {} {} to {}...", amount, symbol, address))
            .await?;

        // Owner is trusted: no cooldown, uniqueness, or review gating.
        match self
            .executor
            .send(&network, &address, amount, "manual payout")
            .await
        {
            Ok(receipt) => {
                self.reply(
                    event,
                    &format!("✅ Success! Token sent.\nTx: {}", receipt.explorer_link),
                )
                .await?;
            }
            Err(e) => {
                self.reply(event, &format!("Failed to send token. Reason: {}", e))
                    .await?;
            }
        }
        Ok(())
    }

    pub(crate) async fn handle_owner_stat(&self, event: &Event) -> Result<()> {
        if !self.policy.is_owner(event.account) {
            self.reply(event, "You are not authorized to use this command.")
                .await?;
            return Ok(());
        }

        let accounts = self.accounts.count().await?;
        let redemptions = self.redemptions.count().await?;
        let pending = self.queue.len().await;

        self.reply(
            event,
            &format!(
                "📊 Statistics\nTotal accounts: {}\nRedeemed addresses: {}\nPending verifications: {}",
                accounts, redemptions, pending
            ),
        )
        .await?;
        Ok(())
    }

    pub(crate) async fn handle_owner_broadcast(&self, event: &Event, text: &str) -> Result<()> {
        if !self.policy.is_owner(event.account) {
            self.reply(event, "You are not authorized to use this command.")
                .await?;
            return Ok(());
        }

        let message = text
            .strip_prefix("/broadcast")
            .map(str::trim)
            .unwrap_or_default();
        if message.is_empty() {
            self.reply(event, "Usage: /broadcast <your message>").await?;
            return Ok(());
        }

        let mut sent = 0usize;
        let mut failed = 0usize;
        for id in self.accounts.all_ids().await? {
            match self.messenger.send(ChatId::from(id), message).await {
                Ok(_) => sent += 1,
                Err(e) => {
                    // Best-effort fan-out: keep going past individual
                    // delivery failures.
                    warn!(account = %id, error = %e, "Broadcast delivery failed");
                    failed += 1;
                }
            }
            tokio::time::sleep(BROADCAST_PACING).await;
        }

        info!(sent, failed, "📣 Broadcast completed");
        self.reply(
            event,
            &format!("Broadcast sent to {} accounts. Failed for {}.", sent, failed),
        )
        .await?;
        Ok(())
    }

    pub(crate) async fn handle_owner_maintenance(&self, event: &Event, args: &[&str]) -> Result<()> {
        if !self.policy.is_owner(event.account) {
            self.reply(event, "You are not authorized to use this command.")
                .await?;
            return Ok(());
        }

        match args.first().map(|s| s.to_lowercase()).as_deref() {
            Some("on") => {
                self.maintenance.set(true);
                self.reply(event, "Maintenance mode is now ON.").await?;
            }
            Some("off") => {
                self.maintenance.set(false);
                self.reply(event, "Maintenance mode is now OFF.").await?;
            }
            _ => {
                self.reply(event, "Usage: /maintenance <on|off>").await?;
            }
        }
        Ok(())
    }

    // --- treasury report ---

    pub(crate) async fn send_balance_report(&self, event: &Event) -> Result<()> {
        let mut lines = vec!["💰 Current treasury balances 💰".to_string()];
        for (id, config) in self.networks.iter() {
            match self.executor.treasury_balance(id).await {
                Ok(balance) => {
                    lines.push(format!(
                        "{}: {} {}",
                        config.display_name, balance, config.currency_symbol
                    ));
                }
                Err(e) => {
                    warn!(network = %id, error = %e, "Balance fetch failed");
                    lines.push(format!("{}: not connected", config.display_name));
                }
            }
        }
        self.reply(event, &lines.join("\n")).await?;
        Ok(())
    }
}

fn submission_summary(subject: AccountId, record: &PendingVerification, symbol: &str) -> String {
    let mut summary = format!(
        "User: {} ({}) (@{})\nReward: {} {}\nAddress: {}\nTask: {}",
        record.submitter_name,
        subject,
        record.submitter_username.as_deref().unwrap_or("N/A"),
        record.amount,
        symbol,
        record.address,
        record.task.describe(),
    );
    match &record.evidence {
        Evidence::SocialPost { handle, link } => {
            summary.push_str(&format!("\nHandle: {}\nPost: {}", handle, link));
        }
        Evidence::Screenshot(photo) => {
            summary.push_str(&format!("\nScreenshot: {}", photo.0));
        }
    }
    summary.push_str(&format!("\nStatus: {}", reentry_status(record.reentry)));
    summary
}
