//! Identity provider abstraction.

mod kakao;

use async_trait::async_trait;

pub use kakao::{KakaoConfig, KakaoProvider};

use crate::auth::account::Provider;
use crate::auth::error::OAuthError;

/// Profile fields returned by the provider after a successful login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Stable identifier within the provider, paired with [`Provider`] to
    /// bind an account.
    pub provider_id: String,
    /// Candidate nickname, requested but not committed until registration.
    pub nickname: String,
    pub email: Option<String>,
}

/// Remote identity provider client.
///
/// Both calls are single attempts with a bounded timeout; failures are never
/// retried here.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    fn provider(&self) -> Provider;

    /// Exchange an authorization code for a provider access token.
    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError>;

    /// Fetch the profile behind a provider access token.
    async fn fetch_profile(&self, provider_access_token: &str)
        -> Result<ProviderProfile, OAuthError>;
}
