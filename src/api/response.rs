//! Success/failure envelope returned by every endpoint.
//!
//! Failure codes are stable and independent of the HTTP status code; mobile
//! clients branch on `code`, not on transport status.

use axum::http::StatusCode;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::{AuthError, Error, OAuthError, RegistrationError};

#[derive(Serialize, ToSchema, Debug)]
pub struct Envelope {
    result: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl Envelope {
    #[must_use]
    pub fn success() -> Self {
        Self {
            result: "success",
            code: None,
            message: None,
        }
    }

    #[must_use]
    pub fn fail(code: &'static str, message: String) -> Self {
        Self {
            result: "fail",
            code: Some(code),
            message: Some(message),
        }
    }
}

#[must_use]
pub fn failure_code(err: &Error) -> &'static str {
    match err {
        Error::Auth(AuthError::TokenMissing) => "TOKEN_MISSING",
        Error::Auth(AuthError::TokenNotFound) => "TOKEN_NOT_FOUND",
        Error::Auth(AuthError::TokenExpired) => "TOKEN_EXPIRED",
        Error::Auth(AuthError::SessionNotProvisional) => "SESSION_NOT_PROVISIONAL",
        Error::OAuth(OAuthError::Client(_)) => "OAUTH_CLIENT_ERROR",
        Error::OAuth(OAuthError::Server(_)) => "OAUTH_SERVER_ERROR",
        Error::OAuth(OAuthError::MissingAccessToken) => "OAUTH_MISSING_TOKEN",
        Error::Registration(RegistrationError::NicknameTaken) => "NICKNAME_TAKEN",
        Error::Registration(RegistrationError::ProfileUploadFailed(_)) => "PROFILE_UPLOAD_FAILED",
        Error::Infrastructure(_) => "INTERNAL_ERROR",
    }
}

#[must_use]
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Auth(_) => StatusCode::UNAUTHORIZED,
        Error::OAuth(OAuthError::Client(_)) => StatusCode::BAD_REQUEST,
        Error::OAuth(_) => StatusCode::BAD_GATEWAY,
        Error::Registration(RegistrationError::NicknameTaken) => StatusCode::CONFLICT,
        Error::Registration(RegistrationError::ProfileUploadFailed(_)) => StatusCode::BAD_GATEWAY,
        Error::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map a domain error to (status, envelope). Infrastructure details are
/// logged server-side, never echoed to the client.
#[must_use]
pub fn failure(err: &Error) -> (StatusCode, axum::Json<Envelope>) {
    let message = match err {
        Error::Infrastructure(inner) => {
            error!("request failed: {inner:#}");
            "internal error".to_string()
        }
        other => other.to_string(),
    };
    (
        status_for(err),
        axum::Json(Envelope::fail(failure_code(err), message)),
    )
}
