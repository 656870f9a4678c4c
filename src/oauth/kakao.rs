//! Kakao OAuth client.
//!
//! Code exchange is a form-encoded POST to the token endpoint; the profile
//! fetch is a bearer GET against the userinfo endpoint. Kakao reports the
//! account email under `kakao_account.email` (used as the provider id) and
//! the nickname under `properties.nickname`.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use url::Url;

use super::{OAuthProvider, ProviderProfile};
use crate::auth::account::Provider;
use crate::auth::error::OAuthError;
use crate::APP_USER_AGENT;

const DEFAULT_TOKEN_URL: &str = "https://kauth.kakao.com/oauth/token";
const DEFAULT_USERINFO_URL: &str = "https://kapi.kakao.com/v2/user/me";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Kakao OAuth2 configuration.
///
/// Required fields are constructor parameters; endpoint overrides chain via
/// `with_*` (tests point them at a local stub).
#[derive(Clone, Debug)]
pub struct KakaoConfig {
    client_id: String,
    client_secret: SecretString,
    redirect_uri: Url,
    token_url: Url,
    userinfo_url: Url,
    timeout: Duration,
}

impl KakaoConfig {
    /// # Panics
    /// Never: the default endpoint URLs are valid.
    #[must_use]
    pub fn new(client_id: String, client_secret: SecretString, redirect_uri: Url) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            token_url: DEFAULT_TOKEN_URL.parse().expect("valid default URL"),
            userinfo_url: DEFAULT_USERINFO_URL.parse().expect("valid default URL"),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    #[must_use]
    pub fn with_userinfo_url(mut self, url: Url) -> Self {
        self.userinfo_url = url;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct KakaoProvider {
    config: KakaoConfig,
    client: reqwest::Client,
}

impl KakaoProvider {
    pub fn new(config: KakaoConfig) -> Result<Self, OAuthError> {
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|err| OAuthError::Server(format!("failed to build client: {err}")))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl OAuthProvider for KakaoProvider {
    fn provider(&self) -> Provider {
        Provider::Kakao
    }

    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .client
            .post(self.config.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_client_error() {
            return Err(OAuthError::Client(format!(
                "token endpoint returned {status}"
            )));
        }
        if status.is_server_error() {
            return Err(OAuthError::Server(format!(
                "token endpoint returned {status}"
            )));
        }

        let body: Value = response.json().await.map_err(transport_error)?;
        access_token_from_response(&body)
    }

    async fn fetch_profile(
        &self,
        provider_access_token: &str,
    ) -> Result<ProviderProfile, OAuthError> {
        let response = self
            .client
            .get(self.config.userinfo_url.clone())
            .bearer_auth(provider_access_token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_client_error() {
            return Err(OAuthError::Client(format!(
                "userinfo endpoint returned {status}"
            )));
        }
        if status.is_server_error() {
            return Err(OAuthError::Server(format!(
                "userinfo endpoint returned {status}"
            )));
        }

        let body: Value = response.json().await.map_err(transport_error)?;
        profile_from_userinfo(&body)
    }
}

/// Timeouts and other transport failures are treated like a 5xx.
fn transport_error(err: reqwest::Error) -> OAuthError {
    OAuthError::Server(err.to_string())
}

fn access_token_from_response(body: &Value) -> Result<String, OAuthError> {
    body.get("access_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .ok_or(OAuthError::MissingAccessToken)
}

fn profile_from_userinfo(body: &Value) -> Result<ProviderProfile, OAuthError> {
    // The provider answered but unusably; same failure class as a 5xx.
    let email = body
        .pointer("/kakao_account/email")
        .and_then(Value::as_str)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| OAuthError::Server("userinfo missing kakao_account.email".to_string()))?;
    let nickname = body
        .pointer("/properties/nickname")
        .and_then(Value::as_str)
        .unwrap_or_default();

    Ok(ProviderProfile {
        provider_id: email.to_string(),
        nickname: nickname.to_string(),
        email: Some(email.to_string()),
    })
}
