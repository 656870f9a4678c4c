//! Session/token lifecycle and login/registration orchestration.
//!
//! A session is derived per request from the presented access token, never
//! persisted: Anonymous (no valid token) → Provisional (valid token,
//! incomplete profile) → Full (complete profile, refresh token held) →
//! LoggedOut (tokens revoked). `LoginOrchestrator` moves Anonymous to
//! Provisional or Full; `RegistrationOrchestrator` moves Provisional to
//! Full.

pub mod account;
pub mod config;
pub mod error;
pub mod login;
pub mod registration;
pub mod survey;
pub mod token;

pub use account::{Account, Provider};
pub use config::TokenConfig;
pub use error::{AuthError, Error, OAuthError, RegistrationError};
pub use login::{LoginOrchestrator, LoginOutcome};
pub use registration::{RegistrationOrchestrator, RegistrationRequest};
pub use survey::SurveyAnswers;
pub use token::{RotatedTokens, TokenManager};
