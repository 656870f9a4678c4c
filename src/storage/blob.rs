//! HTTP object-store backend for profile images.
//!
//! Uploads go to `{endpoint}/{bucket}/{key}` with a bearer token; the
//! returned public URL is `{public_base_url}/{key}`. Keys are prefixed with
//! the upload timestamp so repeated filenames never collide.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::BlobStore;
use crate::auth::token::now_ms;
use crate::APP_USER_AGENT;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct BlobConfig {
    endpoint: Url,
    bucket: String,
    public_base_url: Url,
    token: SecretString,
    timeout: Duration,
}

impl BlobConfig {
    #[must_use]
    pub fn new(endpoint: Url, bucket: String, public_base_url: Url, token: SecretString) -> Self {
        Self {
            endpoint,
            bucket,
            public_base_url,
            token,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct HttpBlobStore {
    config: BlobConfig,
    client: reqwest::Client,
}

impl HttpBlobStore {
    pub fn new(config: BlobConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.timeout)
            .build()
            .context("failed to build blob store client")?;
        Ok(Self { config, client })
    }

    fn object_url(&self, key: &str) -> Result<Url> {
        self.config
            .endpoint
            .join(&format!("{}/{key}", self.config.bucket))
            .context("failed to build object URL")
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<String> {
        let key = object_key(filename);
        let url = self.object_url(&key)?;

        let response = self
            .client
            .put(url)
            .bearer_auth(self.config.token.expose_secret())
            .body(bytes)
            .send()
            .await
            .context("blob upload request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("blob store returned {status} for upload of {key}"));
        }

        let public = self
            .config
            .public_base_url
            .join(&key)
            .context("failed to build public URL")?;
        Ok(public.to_string())
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let key = key_from_public_url(url)?;
        let object = self.object_url(&key)?;

        let response = self
            .client
            .delete(object)
            .bearer_auth(self.config.token.expose_secret())
            .send()
            .await
            .context("blob delete request failed")?;

        let status = response.status();
        // 404 means already gone; delete stays idempotent.
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            return Err(anyhow!("blob store returned {status} for delete of {key}"));
        }
        Ok(())
    }
}

fn object_key(filename: &str) -> String {
    format!("{}_{filename}", now_ms())
}

fn key_from_public_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url).with_context(|| format!("invalid blob URL: {url}"))?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| anyhow!("blob URL has no object key: {url}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_keys_carry_the_filename() {
        let key = object_key("me.png");
        assert!(key.ends_with("_me.png"));
    }

    #[test]
    fn key_from_public_url_takes_the_last_segment() {
        let key = key_from_public_url("https://img.haru.app/profile/123_me.png").unwrap();
        assert_eq!(key, "123_me.png");
    }

    #[test]
    fn key_from_public_url_rejects_bare_hosts() {
        assert!(key_from_public_url("https://img.haru.app/").is_err());
        assert!(key_from_public_url("not a url").is_err());
    }
}
