//! Error taxonomy for the token and registration core.
//!
//! Domain failures are typed and returned to the transport layer, which maps
//! them to a stable failure code. Collaborator failures (database, network)
//! propagate unchanged as `Error::Infrastructure` and fail the request.

use thiserror::Error;

/// Session/token failures, recovered at the boundary as "unauthorized".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no token presented")]
    TokenMissing,
    #[error("token not found or invalid")]
    TokenNotFound,
    #[error("token expired")]
    TokenExpired,
    #[error("session is not provisional")]
    SessionNotProvisional,
}

/// Failures talking to the identity provider. Never retried automatically.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OAuthError {
    #[error("provider rejected the request: {0}")]
    Client(String),
    #[error("provider failure: {0}")]
    Server(String),
    #[error("token response missing access_token")]
    MissingAccessToken,
}

/// Registration-completion failures. Partial state is documented, not rolled
/// back (see `RegistrationOrchestrator::complete`).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("nickname already taken")]
    NicknameTaken,
    #[error("profile image upload failed: {0}")]
    ProfileUploadFailed(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    OAuth(#[from] OAuthError),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error("infrastructure failure: {0}")]
    Infrastructure(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn auth_error_messages_are_stable() {
        assert_eq!(AuthError::TokenMissing.to_string(), "no token presented");
        assert_eq!(AuthError::TokenExpired.to_string(), "token expired");
        assert_eq!(
            AuthError::SessionNotProvisional.to_string(),
            "session is not provisional"
        );
    }

    #[test]
    fn domain_errors_wrap_transparently() {
        let err = Error::from(OAuthError::MissingAccessToken);
        assert_eq!(err.to_string(), "token response missing access_token");

        let err = Error::from(RegistrationError::NicknameTaken);
        assert_eq!(err.to_string(), "nickname already taken");
    }

    #[test]
    fn infrastructure_wraps_anyhow() {
        let err = Error::from(anyhow!("connection refused"));
        assert!(matches!(err, Error::Infrastructure(_)));
        assert!(err.to_string().contains("connection refused"));
    }
}
