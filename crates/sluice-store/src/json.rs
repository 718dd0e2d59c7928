use crate::{AccountRecord, StateStore};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sluice_types::{AccountId, Address, Result, SluiceError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

const ACCOUNTS_FILE: &str = "accounts.json";
const REDEMPTIONS_FILE: &str = "redemptions.json";

/// File-backed store: two JSON documents in a data directory, loaded
/// wholesale at startup and rewritten wholesale after every mutation.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so a crash mid-write leaves the previous document intact.
pub struct JsonStore {
    accounts_path: PathBuf,
    redemptions_path: PathBuf,
    accounts: Arc<RwLock<HashMap<AccountId, AccountRecord>>>,
    redemptions: Arc<RwLock<HashMap<Address, AccountId>>>,
}

impl JsonStore {
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .map_err(|e| SluiceError::Storage(format!("create {}: {}", data_dir.display(), e)))?;

        let accounts_path = data_dir.join(ACCOUNTS_FILE);
        let redemptions_path = data_dir.join(REDEMPTIONS_FILE);

        let accounts: HashMap<AccountId, AccountRecord> = load_document(&accounts_path);
        let redemptions: HashMap<Address, AccountId> = load_document(&redemptions_path);

        info!(
            accounts = accounts.len(),
            redemptions = redemptions.len(),
            data_dir = %data_dir.display(),
            "🗄️ State store loaded"
        );

        Ok(Self {
            accounts_path,
            redemptions_path,
            accounts: Arc::new(RwLock::new(accounts)),
            redemptions: Arc::new(RwLock::new(redemptions)),
        })
    }
}

fn load_document<T: DeserializeOwned + Default>(path: &Path) -> T {
    match std::fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt state document, starting empty");
                T::default()
            }
        },
        Err(_) => {
            info!(path = %path.display(), "No state document found, starting empty");
            T::default()
        }
    }
}

fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| SluiceError::Storage(format!("serialize {}: {}", path.display(), e)))?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)
        .map_err(|e| SluiceError::Storage(format!("write {}: {}", tmp.display(), e)))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| SluiceError::Storage(format!("rename into {}: {}", path.display(), e)))?;
    Ok(())
}

#[async_trait]
impl StateStore for JsonStore {
    async fn get_account(&self, id: AccountId) -> Result<Option<AccountRecord>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&id).cloned())
    }

    async fn put_account(&self, id: AccountId, record: AccountRecord) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        accounts.insert(id, record);
        write_document(&self.accounts_path, &*accounts)
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
        write_document(&self.redemptions_path, &*redemptions)
    }

    async fn redemption_count(&self) -> Result<usize> {
        Ok(self.redemptions.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();

        {
            let store = JsonStore::open(dir.path()).unwrap();
            let mut record = AccountRecord::new("Bob".to_string(), None, 500);
            record
                .last_claim_times
                .insert(sluice_types::NetworkId::new("sepolia"), 1000);
            store.put_account(AccountId(7), record).await.unwrap();

            let address = Address::parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
            store.put_redemption(address, AccountId(7)).await.unwrap();
        }

        let reopened = JsonStore::open(dir.path()).unwrap();
        let record = reopened.get_account(AccountId(7)).await.unwrap().unwrap();
        assert_eq!(record.display_name, "Bob");
        assert_eq!(
            record.last_claim(&sluice_types::NetworkId::new("sepolia")),
            Some(1000)
        );
        assert_eq!(reopened.redemption_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_document_starts_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(ACCOUNTS_FILE), "{not json").unwrap();

        let store = JsonStore::open(dir.path()).unwrap();
        assert_eq!(store.account_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        store
            .put_account(
                AccountId(1),
                AccountRecord::new("A".to_string(), None, 0),
            )
            .await
            .unwrap();

        assert!(dir.path().join(ACCOUNTS_FILE).exists());
        assert!(!dir.path().join("accounts.json.tmp").exists());
    }
}
