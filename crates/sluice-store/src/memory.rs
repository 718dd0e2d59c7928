use crate::{AccountRecord, StateStore};
use async_trait::async_trait;
use sluice_types::{AccountId, Address, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory backend for tests and the local harness.
#[derive(Default)]
pub struct MemoryStore {
    accounts: Arc<RwLock<HashMap<AccountId, AccountRecord>>>,
    redemptions: Arc<RwLock<HashMap<Address, AccountId>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get_account(&self, id: AccountId) -> Result<Option<AccountRecord>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&id).cloned())
    }

    async fn put_account(&self, id: AccountId, record: AccountRecord) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        accounts.insert(id, record);
        Ok(())
    }

    async fn account_ids(&self) -> Result<Vec<AccountId>> {
        let accounts = self.accounts.read().await;
        let mut ids: Vec<AccountId> = accounts.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    async fn account_count(&self) -> Result<usize> {
        Ok(self.accounts.read().await.len())
    }

    async fn redemption_owner(&self, address: &Address) -> Result<Option<AccountId>> {
        let redemptions = self.redemptions.read().await;
        Ok(redemptions.get(address).copied())
    }

    async fn put_redemption(&self, address: Address, owner: AccountId) -> Result<()> {
        let mut redemptions = self.redemptions.write().await;
        redemptions.insert(address, owner);
        Ok(())
    }

    async fn redemption_count(&self) -> Result<usize> {
        Ok(self.redemptions.read().await.len())
    }
}
