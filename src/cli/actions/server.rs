use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::api;
use crate::auth::TokenConfig;
use crate::cli::actions::Action;
use crate::oauth::KakaoConfig;
use crate::storage::BlobConfig;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    let Action::Server {
        port,
        dsn,
        frontend_url,
        access_ttl_secs,
        refresh_ttl_secs,
        kakao_client_id,
        kakao_client_secret,
        kakao_redirect_uri,
        blob_endpoint,
        blob_bucket,
        blob_public_url,
        blob_token,
    } = action;

    let token_config = TokenConfig::new()
        .with_access_ttl(Duration::from_secs(access_ttl_secs))
        .with_refresh_ttl(Duration::from_secs(refresh_ttl_secs));

    let redirect_uri = Url::parse(&kakao_redirect_uri)
        .with_context(|| format!("Invalid Kakao redirect URI: {kakao_redirect_uri}"))?;
    let kakao_config = KakaoConfig::new(kakao_client_id, kakao_client_secret, redirect_uri);

    let blob_endpoint = Url::parse(&blob_endpoint)
        .with_context(|| format!("Invalid blob endpoint: {blob_endpoint}"))?;
    let blob_public_url = Url::parse(&blob_public_url)
        .with_context(|| format!("Invalid blob public URL: {blob_public_url}"))?;
    let blob_config = BlobConfig::new(blob_endpoint, blob_bucket, blob_public_url, blob_token);

    api::new(
        port,
        dsn,
        frontend_url,
        token_config,
        kakao_config,
        blob_config,
    )
    .await
}
