//! Logout endpoint.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::{error, instrument};

use crate::api::cookies::{
    clear_cookie, extract_cookie, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
use crate::api::{response, AppContext};

#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 200, description = "Tokens revoked, cookies cleared", body = response::Envelope)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn logout(headers: HeaderMap, ctx: Extension<Arc<AppContext>>) -> impl IntoResponse {
    let access_token = extract_cookie(&headers, ACCESS_TOKEN_COOKIE);
    let refresh_token = extract_cookie(&headers, REFRESH_TOKEN_COOKIE);

    if let Err(err) = ctx
        .tokens
        .revoke(access_token.as_deref(), refresh_token.as_deref())
        .await
    {
        error!("failed to revoke tokens on logout: {err}");
    }

    // Cookies are cleared even when the token records were already gone.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_cookie(ACCESS_TOKEN_COOKIE) {
        response_headers.append(SET_COOKIE, cookie);
    }
    if let Ok(cookie) = clear_cookie(REFRESH_TOKEN_COOKIE) {
        response_headers.append(SET_COOKIE, cookie);
    }

    (
        StatusCode::OK,
        response_headers,
        Json(response::Envelope::success()),
    )
        .into_response()
}
