use sluice_store::{AccountRecord, StateStore};
use sluice_types::{AccountId, Result};
use std::sync::Arc;
use tracing::info;

/// Account bookkeeping over the persistent store: first-contact creation,
/// campaign-completion flags, and the broadcast roster.
pub struct AccountRegistry {
    store: Arc<dyn StateStore>,
}

impl AccountRegistry {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Record an account on first contact. Existing records keep their
    /// original `first_seen`; the display name and username are refreshed.
    pub async fn touch(
        &self,
        id: AccountId,
        display_name: &str,
        username: Option<&str>,
        now: i64,
    ) -> Result<AccountRecord> {
        match self.store.get_account(id).await? {
            Some(mut record) => {
                if record.display_name != display_name
                    || record.username.as_deref() != username
                {
                    record.display_name = display_name.to_string();
                    record.username = username.map(str::to_string);
                    self.store.put_account(id, record.clone()).await?;
                }
                Ok(record)
            }
            None => {
                let record = AccountRecord::new(
                    display_name.to_string(),
                    username.map(str::to_string),
                    now,
                );
                self.store.put_account(id, record.clone()).await?;
                info!(account = %id, name = display_name, "👤 New account recorded");
                Ok(record)
            }
        }
    }

    pub async fn campaign_done(&self, id: AccountId, campaign: &str) -> Result<bool> {
        Ok(self
            .store
            .get_account(id)
            .await?
            .map(|r| r.campaign_done(campaign))
            .unwrap_or(false))
    }

    /// Persist a campaign-completion flag. Called only after the associated
    /// payout has been confirmed sent.
    pub async fn mark_campaign_done(&self, id: AccountId, campaign: &str, now: i64) -> Result<()> {
        let mut record = match self.store.get_account(id).await? {
            Some(record) => record,
            None => AccountRecord::new(id.to_string(), None, now),
        };
        if record.completed_campaigns.insert(campaign.to_string()) {
            self.store.put_account(id, record).await?;
            info!(account = %id, campaign, "🏁 Campaign completion recorded");
        }
        Ok(())
    }

    pub async fn all_ids(&self) -> Result<Vec<AccountId>> {
        self.store.account_ids().await
    }

    pub async fn count(&self) -> Result<usize> {
        self.store.account_count().await
    }
}
