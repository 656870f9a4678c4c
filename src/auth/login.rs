//! OAuth callback orchestration.
//!
//! Drives the authorization code into one of three outcomes: returning
//! complete user, returning provisional user, or brand-new user. Account
//! creation happens on first login; there is no separate signup step because
//! the provider is the sole source of identity.

use std::sync::Arc;

use anyhow::anyhow;
use tracing::info;

use super::account::Account;
use super::error::Error;
use super::token::TokenManager;
use crate::oauth::{OAuthProvider, ProviderProfile};
use crate::storage::{AccountGateway, CreateOutcome};

/// Result of a login, including the tokens the transport layer must set as
/// cookies. `refresh_token` is only present for complete accounts.
#[derive(Clone, Debug)]
pub struct LoginOutcome {
    pub has_account: bool,
    pub nickname: Option<String>,
    pub nickname_duplicate: Option<bool>,
    pub access_token: String,
    pub refresh_token: Option<String>,
}

pub struct LoginOrchestrator {
    provider: Arc<dyn OAuthProvider>,
    accounts: Arc<dyn AccountGateway>,
    tokens: TokenManager,
}

impl LoginOrchestrator {
    #[must_use]
    pub fn new(
        provider: Arc<dyn OAuthProvider>,
        accounts: Arc<dyn AccountGateway>,
        tokens: TokenManager,
    ) -> Self {
        Self {
            provider,
            accounts,
            tokens,
        }
    }

    /// Handle the OAuth redirect.
    ///
    /// Steps run strictly in order and each fails the whole login on its
    /// own: code exchange, profile fetch, account classification, token
    /// issuance.
    pub async fn login(&self, code: &str) -> Result<LoginOutcome, Error> {
        let provider_token = self.provider.exchange_code(code).await?;
        let profile = self.provider.fetch_profile(&provider_token).await?;

        let account = match self
            .accounts
            .find_by_provider_identity(self.provider.provider(), &profile.provider_id)
            .await?
        {
            Some(account) => account,
            None => self.create_or_fetch(&profile).await?,
        };

        if account.has_account {
            let access_token = self.tokens.issue_access(&account.internal_id).await?;
            let refresh_token = self.tokens.issue_refresh(&account.internal_id).await?;
            return Ok(LoginOutcome {
                has_account: true,
                nickname: None,
                nickname_duplicate: None,
                access_token,
                refresh_token: Some(refresh_token),
            });
        }

        // Provisional session: access token only, refresh comes with
        // registration completion.
        let nickname_duplicate = self.accounts.exists_by_nickname(&profile.nickname).await?;
        let access_token = self.tokens.issue_access(&account.internal_id).await?;
        Ok(LoginOutcome {
            has_account: false,
            nickname: Some(profile.nickname.clone()),
            nickname_duplicate: Some(nickname_duplicate),
            access_token,
            refresh_token: None,
        })
    }

    /// Create a provisional account, falling back to the winner's row when a
    /// concurrent first login races us to the unique constraint.
    async fn create_or_fetch(&self, profile: &ProviderProfile) -> Result<Account, Error> {
        let fresh = Account::provisional(self.provider.provider(), &profile.provider_id);
        match self.accounts.create(fresh).await? {
            CreateOutcome::Created(account) => {
                info!(
                    provider = %account.provider,
                    "created provisional account for first-time login"
                );
                Ok(account)
            }
            CreateOutcome::Conflict => self
                .accounts
                .find_by_provider_identity(self.provider.provider(), &profile.provider_id)
                .await?
                .ok_or_else(|| {
                    Error::Infrastructure(anyhow!(
                        "account missing after provider identity conflict"
                    ))
                }),
        }
    }
}
