//! Registration completion endpoint.
//!
//! Multipart form: `nickname` (text), `surveyResult` (JSON array of category
//! labels), `profileImage` (file). Requires a valid ACCESS_TOKEN cookie;
//! sets the REFRESH_TOKEN cookie on success.

use std::sync::Arc;

use axum::{
    extract::{Extension, Multipart},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::instrument;

use crate::api::cookies::{
    extract_cookie, token_cookie, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
use crate::api::{response, AppContext};
use crate::auth::RegistrationRequest;

#[utoipa::path(
    post,
    path = "/auth/join",
    responses(
        (status = 200, description = "Registration completed", body = response::Envelope),
        (status = 400, description = "Malformed multipart payload", body = response::Envelope),
        (status = 401, description = "Missing or invalid access token", body = response::Envelope),
        (status = 409, description = "Nickname already taken", body = response::Envelope)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn join(
    headers: HeaderMap,
    ctx: Extension<Arc<AppContext>>,
    multipart: Multipart,
) -> impl IntoResponse {
    // Resolve the session first so a bad token never consumes the upload.
    let access_token = extract_cookie(&headers, ACCESS_TOKEN_COOKIE);
    let internal_id = match ctx.tokens.validate(access_token.as_deref()).await {
        Ok(internal_id) => internal_id,
        Err(err) => return response::failure(&err).into_response(),
    };

    let request = match parse_join_form(multipart).await {
        Ok(request) => request,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(response::Envelope::fail("INVALID_REQUEST", message)),
            )
                .into_response();
        }
    };

    let refresh_token = match ctx.registration.complete(&internal_id, request).await {
        Ok(refresh_token) => refresh_token,
        Err(err) => return response::failure(&err).into_response(),
    };

    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = token_cookie(
        REFRESH_TOKEN_COOKIE,
        &refresh_token,
        ctx.tokens.config().refresh_ttl(),
    ) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (
        StatusCode::OK,
        response_headers,
        Json(response::Envelope::success()),
    )
        .into_response()
}

async fn parse_join_form(mut multipart: Multipart) -> Result<RegistrationRequest, String> {
    let mut nickname = None;
    let mut categories = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| format!("invalid multipart payload: {err}"))?
    {
        match field.name() {
            Some("nickname") => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| format!("invalid nickname field: {err}"))?;
                nickname = Some(value);
            }
            Some("surveyResult") => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| format!("invalid surveyResult field: {err}"))?;
                let parsed: Vec<String> = serde_json::from_str(&value)
                    .map_err(|err| format!("surveyResult must be a JSON array: {err}"))?;
                categories = Some(parsed);
            }
            Some("profileImage") => {
                let filename = field
                    .file_name()
                    .map_or_else(|| "profile".to_string(), ToString::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| format!("invalid profileImage field: {err}"))?;
                image = Some((bytes.to_vec(), filename));
            }
            // Unknown fields are skipped, not errors.
            _ => {}
        }
    }

    let nickname = nickname
        .filter(|nickname| !nickname.trim().is_empty())
        .ok_or_else(|| "missing nickname".to_string())?;
    let (image, image_filename) = image.ok_or_else(|| "missing profileImage".to_string())?;

    Ok(RegistrationRequest {
        nickname,
        image,
        image_filename,
        categories: categories.unwrap_or_default(),
    })
}
