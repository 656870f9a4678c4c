//! Refresh-token rotation endpoint.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::instrument;

use crate::api::cookies::{
    extract_cookie, token_cookie, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
use crate::api::{response, AppContext};

#[utoipa::path(
    get,
    path = "/refresh",
    responses(
        (status = 200, description = "Both cookies rotated", body = response::Envelope),
        (status = 401, description = "Missing, unknown or expired refresh token", body = response::Envelope)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn refresh(headers: HeaderMap, ctx: Extension<Arc<AppContext>>) -> impl IntoResponse {
    let refresh_token = extract_cookie(&headers, REFRESH_TOKEN_COOKIE);
    let rotated = match ctx.tokens.rotate_refresh(refresh_token.as_deref()).await {
        Ok(rotated) => rotated,
        Err(err) => return response::failure(&err).into_response(),
    };

    let token_config = ctx.tokens.config();
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = token_cookie(
        ACCESS_TOKEN_COOKIE,
        &rotated.access_token,
        token_config.access_ttl(),
    ) {
        response_headers.append(SET_COOKIE, cookie);
    }
    if let Ok(cookie) = token_cookie(
        REFRESH_TOKEN_COOKIE,
        &rotated.refresh_token,
        token_config.refresh_ttl(),
    ) {
        response_headers.append(SET_COOKIE, cookie);
    }

    (
        StatusCode::OK,
        response_headers,
        Json(response::Envelope::success()),
    )
        .into_response()
}
