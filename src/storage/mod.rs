//! External collaborators consumed by the core.
//!
//! Provides the [`TokenStore`], [`AccountGateway`] and [`BlobStore`] traits
//! and their backends:
//! - Postgres via sqlx (production)
//! - In-memory (tests, local development)
//! - HTTP object store for profile images

mod blob;
mod memory;
mod postgres;

use anyhow::Result;
use async_trait::async_trait;

pub use blob::{BlobConfig, HttpBlobStore};
pub use memory::{MemoryAccountGateway, MemoryBlobStore, MemoryTokenStore};
pub use postgres::{PgAccountGateway, PgTokenStore};

use crate::auth::account::{Account, Provider};
use crate::auth::token::TokenRecord;

/// Key-value store for issued tokens. Entries need only atomic per-key
/// put/get/delete; no cross-key transaction exists anywhere in the core.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn put(&self, record: TokenRecord) -> Result<()>;

    /// Fetch a record by its token string. Expiry is enforced by the caller;
    /// backends may return records past their expiry.
    async fn get(&self, token: &str) -> Result<Option<TokenRecord>>;

    /// Delete a token. Deleting an absent token is not an error.
    async fn delete(&self, token: &str) -> Result<()>;
}

/// Outcome of an account create attempt. `Conflict` means another request
/// won the race for the same `(provider, provider_id)` pair.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(Account),
    Conflict,
}

/// Lookup/create/update of account records.
#[async_trait]
pub trait AccountGateway: Send + Sync {
    async fn find_by_provider_identity(
        &self,
        provider: Provider,
        provider_id: &str,
    ) -> Result<Option<Account>>;

    async fn find_by_internal_id(&self, internal_id: &str) -> Result<Option<Account>>;

    /// Insert a new account, reporting `Conflict` when the provider identity
    /// already exists instead of failing.
    async fn create(&self, account: Account) -> Result<CreateOutcome>;

    /// Persist the current state of an existing account.
    async fn save(&self, account: &Account) -> Result<()>;

    async fn exists_by_nickname(&self, nickname: &str) -> Result<bool>;
}

/// Profile image storage. Returns a public URL for an uploaded object.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<String>;

    async fn delete(&self, url: &str) -> Result<()>;
}
