//! In-memory backends, primarily for testing.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{AccountGateway, BlobStore, CreateOutcome, TokenStore};
use crate::auth::account::{Account, Provider};
use crate::auth::token::TokenRecord;

/// In-memory token store.
pub struct MemoryTokenStore {
    records: RwLock<HashMap<String, TokenRecord>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn put(&self, record: TokenRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(record.token.clone(), record);
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<TokenRecord>> {
        Ok(self.records.read().await.get(token).cloned())
    }

    async fn delete(&self, token: &str) -> Result<()> {
        self.records.write().await.remove(token);
        Ok(())
    }
}

/// In-memory account gateway keyed by internal id, with the same uniqueness
/// behavior the Postgres schema enforces.
pub struct MemoryAccountGateway {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryAccountGateway {
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
        }
    }

    /// Seed an existing account (test setup).
    pub async fn insert(&self, account: Account) {
        self.accounts
            .write()
            .await
            .insert(account.internal_id.clone(), account);
    }

    /// Number of stored accounts (test assertions).
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// True when no accounts are stored.
    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

impl Default for MemoryAccountGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountGateway for MemoryAccountGateway {
    async fn find_by_provider_identity(
        &self,
        provider: Provider,
        provider_id: &str,
    ) -> Result<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|account| account.provider == provider && account.provider_id == provider_id)
            .cloned())
    }

    async fn find_by_internal_id(&self, internal_id: &str) -> Result<Option<Account>> {
        Ok(self.accounts.read().await.get(internal_id).cloned())
    }

    async fn create(&self, account: Account) -> Result<CreateOutcome> {
        let mut accounts = self.accounts.write().await;
        let taken = accounts.values().any(|existing| {
            existing.provider == account.provider && existing.provider_id == account.provider_id
        });
        if taken {
            return Ok(CreateOutcome::Conflict);
        }
        accounts.insert(account.internal_id.clone(), account.clone());
        Ok(CreateOutcome::Created(account))
    }

    async fn save(&self, account: &Account) -> Result<()> {
        self.accounts
            .write()
            .await
            .insert(account.internal_id.clone(), account.clone());
        Ok(())
    }

    async fn exists_by_nickname(&self, nickname: &str) -> Result<bool> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .any(|account| account.nickname.as_deref() == Some(nickname)))
    }
}

/// In-memory blob store recording uploads.
pub struct MemoryBlobStore {
    uploads: RwLock<Vec<String>>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            uploads: RwLock::new(Vec::new()),
        }
    }

    /// URLs uploaded so far (test assertions).
    pub async fn uploads(&self) -> Vec<String> {
        self.uploads.read().await.clone()
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, _bytes: Vec<u8>, filename: &str) -> Result<String> {
        let url = format!("memory://profile/{filename}");
        self.uploads.write().await.push(url.clone());
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<()> {
        self.uploads.write().await.retain(|stored| stored != url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenKind;

    #[tokio::test]
    async fn token_store_put_get_delete() {
        let store = MemoryTokenStore::new();
        let record = TokenRecord {
            token: "tok".to_string(),
            internal_id: "user-1".to_string(),
            kind: TokenKind::Access,
            expires_at_ms: i64::MAX,
        };
        store.put(record.clone()).await.unwrap();
        assert_eq!(store.get("tok").await.unwrap(), Some(record));

        store.delete("tok").await.unwrap();
        assert_eq!(store.get("tok").await.unwrap(), None);
        // Deleting again is a no-op.
        store.delete("tok").await.unwrap();
    }

    #[tokio::test]
    async fn account_create_reports_provider_identity_conflicts() {
        let gateway = MemoryAccountGateway::new();
        let first = Account::provisional(Provider::Kakao, "a@example.com");
        assert!(matches!(
            gateway.create(first).await.unwrap(),
            CreateOutcome::Created(_)
        ));

        let second = Account::provisional(Provider::Kakao, "a@example.com");
        assert!(matches!(
            gateway.create(second).await.unwrap(),
            CreateOutcome::Conflict
        ));
        assert_eq!(gateway.len().await, 1);
    }

    #[tokio::test]
    async fn nickname_lookup_sees_saved_accounts() {
        let gateway = MemoryAccountGateway::new();
        let mut account = Account::provisional(Provider::Kakao, "a@example.com");
        account.nickname = Some("alice".to_string());
        gateway.insert(account).await;

        assert!(gateway.exists_by_nickname("alice").await.unwrap());
        assert!(!gateway.exists_by_nickname("bob").await.unwrap());
    }

    #[tokio::test]
    async fn blob_store_records_uploads() {
        let blobs = MemoryBlobStore::new();
        let url = blobs.upload(vec![1, 2, 3], "me.png").await.unwrap();
        assert_eq!(url, "memory://profile/me.png");
        assert_eq!(blobs.uploads().await, vec![url.clone()]);

        blobs.delete(&url).await.unwrap();
        assert!(blobs.uploads().await.is_empty());
    }
}
