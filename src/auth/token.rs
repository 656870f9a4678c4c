//! Opaque access/refresh token lifecycle.
//!
//! Tokens are random strings validated against the token store; nothing is
//! encoded in the token itself. The manager holds no mutable state — every
//! side effect is a store write.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use base64::Engine;
use rand::{rngs::OsRng, RngCore};

use super::config::TokenConfig;
use super::error::{AuthError, Error};
use crate::storage::TokenStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }

    #[must_use]
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "access" => Some(Self::Access),
            "refresh" => Some(Self::Refresh),
            _ => None,
        }
    }
}

/// One stored token. Lookup past `expires_at_ms` behaves as absent even if
/// the row has not been purged yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenRecord {
    pub token: String,
    pub internal_id: String,
    pub kind: TokenKind,
    pub expires_at_ms: i64,
}

/// New pair minted by a refresh rotation.
#[derive(Clone, Debug)]
pub struct RotatedTokens {
    pub internal_id: String,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenManager {
    store: Arc<dyn TokenStore>,
    config: TokenConfig,
}

impl TokenManager {
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>, config: TokenConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Issue an access token for `internal_id`.
    pub async fn issue_access(&self, internal_id: &str) -> Result<String, Error> {
        self.issue(internal_id, TokenKind::Access, self.config.access_ttl())
            .await
    }

    /// Issue a refresh token for `internal_id`.
    pub async fn issue_refresh(&self, internal_id: &str) -> Result<String, Error> {
        self.issue(internal_id, TokenKind::Refresh, self.config.refresh_ttl())
            .await
    }

    async fn issue(
        &self,
        internal_id: &str,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<String, Error> {
        let token = generate_token()?;
        let record = TokenRecord {
            token: token.clone(),
            internal_id: internal_id.to_string(),
            kind,
            expires_at_ms: now_ms() + i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
        };
        self.store.put(record).await?;
        Ok(token)
    }

    /// Resolve a presented token to its internal id.
    ///
    /// Expired tokens fail with `TokenExpired`; callers must treat that the
    /// same as `TokenNotFound`.
    pub async fn validate(&self, token: Option<&str>) -> Result<String, Error> {
        let record = self.lookup(token).await?;
        Ok(record.internal_id)
    }

    /// Rotate a refresh token: validate, delete, mint a fresh pair.
    ///
    /// The old refresh token is deleted before the new pair exists, so it is
    /// single-use even when the call is retried. The prior access token is
    /// deliberately left alive until its own expiry.
    pub async fn rotate_refresh(&self, old_refresh: Option<&str>) -> Result<RotatedTokens, Error> {
        let record = self.lookup(old_refresh).await?;
        if record.kind != TokenKind::Refresh {
            return Err(AuthError::TokenNotFound.into());
        }

        self.store.delete(&record.token).await?;

        let access_token = self.issue_access(&record.internal_id).await?;
        let refresh_token = self.issue_refresh(&record.internal_id).await?;

        Ok(RotatedTokens {
            internal_id: record.internal_id,
            access_token,
            refresh_token,
        })
    }

    /// Delete whichever tokens are present. Deleting an absent token is a
    /// no-op, so logout is idempotent.
    pub async fn revoke(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<(), Error> {
        if let Some(token) = access_token.filter(|token| !token.is_empty()) {
            self.store.delete(token).await?;
        }
        if let Some(token) = refresh_token.filter(|token| !token.is_empty()) {
            self.store.delete(token).await?;
        }
        Ok(())
    }

    async fn lookup(&self, token: Option<&str>) -> Result<TokenRecord, Error> {
        let token = token
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::TokenMissing)?;
        let record = self
            .store
            .get(token)
            .await?
            .ok_or(AuthError::TokenNotFound)?;
        if now_ms() > record.expires_at_ms {
            return Err(AuthError::TokenExpired.into());
        }
        Ok(record)
    }
}

/// Milliseconds since the Unix epoch.
#[must_use]
pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Create a new opaque token.
/// The raw value is only returned to set the cookie; the store keys on it.
fn generate_token() -> Result<String, Error> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate token")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTokenStore;
    use std::time::Duration;

    fn manager(config: TokenConfig) -> TokenManager {
        TokenManager::new(Arc::new(MemoryTokenStore::new()), config)
    }

    #[tokio::test]
    async fn issue_then_validate_round_trips() {
        let tokens = manager(TokenConfig::new());
        let token = tokens.issue_access("user-1").await.unwrap();
        let internal_id = tokens.validate(Some(&token)).await.unwrap();
        assert_eq!(internal_id, "user-1");
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let tokens = manager(TokenConfig::new());
        let err = tokens.validate(None).await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::TokenMissing)));

        let err = tokens.validate(Some("")).await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::TokenMissing)));
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let tokens = manager(TokenConfig::new());
        let err = tokens.validate(Some("never-issued")).await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::TokenNotFound)));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let tokens = manager(TokenConfig::new().with_access_ttl(Duration::from_millis(1)));
        let token = tokens.issue_access("user-1").await.unwrap();
        tokio::time::sleep(Duration::from_millis(25)).await;
        let err = tokens.validate(Some(&token)).await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn rotation_invalidates_the_old_refresh_token() {
        let tokens = manager(TokenConfig::new());
        let old = tokens.issue_refresh("user-1").await.unwrap();

        let rotated = tokens.rotate_refresh(Some(&old)).await.unwrap();
        assert_eq!(rotated.internal_id, "user-1");

        let err = tokens.validate(Some(&old)).await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::TokenNotFound)));

        // The new pair is live.
        assert_eq!(
            tokens.validate(Some(&rotated.access_token)).await.unwrap(),
            "user-1"
        );
        assert_eq!(
            tokens.validate(Some(&rotated.refresh_token)).await.unwrap(),
            "user-1"
        );
    }

    #[tokio::test]
    async fn rotation_retry_fails_closed() {
        let tokens = manager(TokenConfig::new());
        let old = tokens.issue_refresh("user-1").await.unwrap();
        tokens.rotate_refresh(Some(&old)).await.unwrap();

        let err = tokens.rotate_refresh(Some(&old)).await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::TokenNotFound)));
    }

    #[tokio::test]
    async fn rotation_leaves_the_prior_access_token_alive() {
        // Documented behavior: rotation does not revoke the access token; it
        // dies on its own (shorter) TTL.
        let tokens = manager(TokenConfig::new());
        let access = tokens.issue_access("user-1").await.unwrap();
        let refresh = tokens.issue_refresh("user-1").await.unwrap();

        tokens.rotate_refresh(Some(&refresh)).await.unwrap();

        assert_eq!(tokens.validate(Some(&access)).await.unwrap(), "user-1");
    }

    #[tokio::test]
    async fn access_tokens_cannot_be_rotated() {
        let tokens = manager(TokenConfig::new());
        let access = tokens.issue_access("user-1").await.unwrap();
        let err = tokens.rotate_refresh(Some(&access)).await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::TokenNotFound)));
    }

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let tokens = manager(TokenConfig::new());
        let access = tokens.issue_access("user-1").await.unwrap();
        let refresh = tokens.issue_refresh("user-1").await.unwrap();

        tokens
            .revoke(Some(&access), Some(&refresh))
            .await
            .unwrap();
        // Second revoke of the same tokens is a no-op, never an error.
        tokens
            .revoke(Some(&access), Some(&refresh))
            .await
            .unwrap();

        let err = tokens.validate(Some(&access)).await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::TokenNotFound)));
        let err = tokens.validate(Some(&refresh)).await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::TokenNotFound)));
    }

    #[tokio::test]
    async fn revoke_accepts_missing_tokens() {
        let tokens = manager(TokenConfig::new());
        tokens.revoke(None, None).await.unwrap();
        tokens.revoke(Some(""), None).await.unwrap();
    }

    #[test]
    fn generated_tokens_are_unique_and_urlsafe() {
        let first = generate_token().unwrap();
        let second = generate_token().unwrap();
        assert_ne!(first, second);
        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(first.as_bytes())
            .unwrap();
        assert_eq!(decoded.len(), 32);
    }
}
