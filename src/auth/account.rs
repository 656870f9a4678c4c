//! Account model shared by the orchestrators and the account gateway.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::survey::SurveyAnswers;

/// External identity provider. Kakao is the only provider today; the
/// `(provider, provider_id)` pair is what binds an account to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Provider {
    Kakao,
}

impl Provider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kakao => "KAKAO",
        }
    }

    /// Parse the stored representation.
    #[must_use]
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "KAKAO" => Some(Self::Kakao),
            _ => None,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user account.
///
/// `internal_id` is the only key the token layer ever references. It is
/// generated once at creation and never changes, independent of the provider
/// identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub internal_id: String,
    pub provider: Provider,
    pub provider_id: String,
    /// None until registration completes; globally unique once set.
    pub nickname: Option<String>,
    /// false = provisional (provider login only), true = complete profile.
    pub has_account: bool,
    pub profile_image_url: Option<String>,
    pub survey: SurveyAnswers,
}

impl Account {
    /// A brand-new provisional account bound to a provider identity.
    ///
    /// The candidate nickname from the provider profile is NOT committed
    /// here; it is only persisted at registration, after the uniqueness
    /// check.
    #[must_use]
    pub fn provisional(provider: Provider, provider_id: &str) -> Self {
        Self {
            internal_id: Uuid::new_v4().to_string(),
            provider,
            provider_id: provider_id.to_string(),
            nickname: None,
            has_account: false,
            profile_image_url: None,
            survey: SurveyAnswers::default(),
        }
    }
}
