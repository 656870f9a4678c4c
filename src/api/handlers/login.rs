//! Kakao OAuth callback endpoint.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::api::cookies::{token_cookie, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::api::{response, AppContext};

#[derive(Deserialize, Debug)]
pub struct LoginQuery {
    code: String,
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    has_account: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nickname_duplicate: Option<bool>,
}

#[utoipa::path(
    get,
    path = "/auth/kakao",
    params(
        ("code" = String, Query, description = "Authorization code from the Kakao redirect")
    ),
    responses(
        (status = 200, description = "Login succeeded", body = LoginResponse),
        (status = 400, description = "Provider rejected the code"),
        (status = 502, description = "Provider failure")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    ctx: Extension<Arc<AppContext>>,
    Query(query): Query<LoginQuery>,
) -> impl IntoResponse {
    let outcome = match ctx.login.login(&query.code).await {
        Ok(outcome) => outcome,
        Err(err) => return response::failure(&err).into_response(),
    };

    let mut headers = HeaderMap::new();
    let token_config = ctx.tokens.config();
    if let Ok(cookie) = token_cookie(
        ACCESS_TOKEN_COOKIE,
        &outcome.access_token,
        token_config.access_ttl(),
    ) {
        headers.append(SET_COOKIE, cookie);
    }
    // Refresh cookie only for complete accounts; provisional sessions get it
    // at registration.
    if let Some(refresh_token) = &outcome.refresh_token {
        if let Ok(cookie) = token_cookie(
            REFRESH_TOKEN_COOKIE,
            refresh_token,
            token_config.refresh_ttl(),
        ) {
            headers.append(SET_COOKIE, cookie);
        }
    }

    let body = LoginResponse {
        has_account: outcome.has_account,
        nickname: outcome.nickname,
        nickname_duplicate: outcome.nickname_duplicate,
    };
    (StatusCode::OK, headers, Json(body)).into_response()
}
