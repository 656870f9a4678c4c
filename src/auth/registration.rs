//! Registration completion for provisional accounts.
//!
//! The steps after the nickname check are independently-failable writes, not
//! a transaction. What has committed when a later step fails:
//! - nickname write fails: nothing committed.
//! - image upload / URL write fails: nickname is committed and stays.
//! - survey/completion write fails: nickname and image URL are committed,
//!   the account remains provisional.
//! - refresh issuance fails: the account is complete but the client holds no
//!   refresh token until its next login.

use std::sync::Arc;

use tracing::info;

use super::error::{AuthError, Error, RegistrationError};
use super::survey::SurveyAnswers;
use super::token::TokenManager;
use crate::storage::{AccountGateway, BlobStore};

/// Fields the client submits to complete its profile.
#[derive(Clone, Debug)]
pub struct RegistrationRequest {
    pub nickname: String,
    pub image: Vec<u8>,
    pub image_filename: String,
    pub categories: Vec<String>,
}

pub struct RegistrationOrchestrator {
    accounts: Arc<dyn AccountGateway>,
    blobs: Arc<dyn BlobStore>,
    tokens: TokenManager,
}

impl RegistrationOrchestrator {
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountGateway>,
        blobs: Arc<dyn BlobStore>,
        tokens: TokenManager,
    ) -> Self {
        Self {
            accounts,
            blobs,
            tokens,
        }
    }

    /// Complete a provisional account and upgrade the session to full.
    ///
    /// `internal_id` must already be resolved from the presented access
    /// token by the caller. Returns the first refresh token.
    pub async fn complete(
        &self,
        internal_id: &str,
        request: RegistrationRequest,
    ) -> Result<String, Error> {
        let mut account = self
            .accounts
            .find_by_internal_id(internal_id)
            .await?
            .ok_or(AuthError::TokenNotFound)?;
        if account.has_account {
            return Err(AuthError::SessionNotProvisional.into());
        }

        if self.accounts.exists_by_nickname(&request.nickname).await? {
            return Err(RegistrationError::NicknameTaken.into());
        }

        // First write; everything before this point is read-only.
        account.nickname = Some(request.nickname.clone());
        self.accounts.save(&account).await?;

        let image_url = self
            .blobs
            .upload(request.image, &request.image_filename)
            .await
            .map_err(|err| RegistrationError::ProfileUploadFailed(err.to_string()))?;
        account.profile_image_url = Some(image_url);
        self.accounts.save(&account).await?;

        account.has_account = true;
        account.survey = SurveyAnswers::from_categories(&request.categories);
        self.accounts.save(&account).await?;

        let refresh_token = self.tokens.issue_refresh(internal_id).await?;
        info!("registration completed, session upgraded to full");
        Ok(refresh_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::account::{Account, Provider};
    use crate::auth::config::TokenConfig;
    use crate::storage::{MemoryAccountGateway, MemoryBlobStore, MemoryTokenStore};
    use anyhow::anyhow;
    use async_trait::async_trait;

    fn request(nickname: &str, categories: &[&str]) -> RegistrationRequest {
        RegistrationRequest {
            nickname: nickname.to_string(),
            image: vec![0xFF, 0xD8],
            image_filename: "me.jpg".to_string(),
            categories: categories.iter().map(ToString::to_string).collect(),
        }
    }

    struct Fixture {
        accounts: Arc<MemoryAccountGateway>,
        blobs: Arc<MemoryBlobStore>,
        tokens: TokenManager,
        orchestrator: RegistrationOrchestrator,
    }

    fn fixture() -> Fixture {
        let accounts = Arc::new(MemoryAccountGateway::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let tokens = TokenManager::new(Arc::new(MemoryTokenStore::new()), TokenConfig::new());
        let orchestrator =
            RegistrationOrchestrator::new(accounts.clone(), blobs.clone(), tokens.clone());
        Fixture {
            accounts,
            blobs,
            tokens,
            orchestrator,
        }
    }

    async fn seed_provisional(accounts: &MemoryAccountGateway) -> String {
        let account = Account::provisional(Provider::Kakao, "u1");
        let internal_id = account.internal_id.clone();
        accounts.insert(account).await;
        internal_id
    }

    #[tokio::test]
    async fn completes_profile_and_issues_refresh_token() {
        let fx = fixture();
        let internal_id = seed_provisional(&fx.accounts).await;

        let refresh = fx
            .orchestrator
            .complete(&internal_id, request("alice", &["환경", "운동"]))
            .await
            .unwrap();

        let account = fx
            .accounts
            .find_by_internal_id(&internal_id)
            .await
            .unwrap()
            .unwrap();
        assert!(account.has_account);
        assert_eq!(account.nickname.as_deref(), Some("alice"));
        assert!(account
            .profile_image_url
            .as_deref()
            .unwrap()
            .contains("me.jpg"));
        assert!(account.survey.environment);
        assert!(account.survey.exercise);
        assert!(!account.survey.travel);

        assert_eq!(
            fx.tokens.validate(Some(&refresh)).await.unwrap(),
            internal_id
        );
    }

    #[tokio::test]
    async fn taken_nickname_fails_with_no_writes() {
        let fx = fixture();
        let internal_id = seed_provisional(&fx.accounts).await;

        let mut other = Account::provisional(Provider::Kakao, "u2");
        other.nickname = Some("alice".to_string());
        fx.accounts.insert(other).await;

        let err = fx
            .orchestrator
            .complete(&internal_id, request("alice", &[]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Registration(RegistrationError::NicknameTaken)
        ));

        let account = fx
            .accounts
            .find_by_internal_id(&internal_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.nickname, None);
        assert!(!account.has_account);
        assert!(fx.blobs.uploads().await.is_empty());
    }

    struct FailingBlobStore;

    #[async_trait]
    impl BlobStore for FailingBlobStore {
        async fn upload(&self, _bytes: Vec<u8>, _filename: &str) -> anyhow::Result<String> {
            Err(anyhow!("bucket unavailable"))
        }

        async fn delete(&self, _url: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn upload_failure_keeps_the_committed_nickname() {
        let accounts = Arc::new(MemoryAccountGateway::new());
        let tokens = TokenManager::new(Arc::new(MemoryTokenStore::new()), TokenConfig::new());
        let orchestrator = RegistrationOrchestrator::new(
            accounts.clone(),
            Arc::new(FailingBlobStore),
            tokens.clone(),
        );
        let internal_id = seed_provisional(&accounts).await;

        let err = orchestrator
            .complete(&internal_id, request("alice", &["환경"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Registration(RegistrationError::ProfileUploadFailed(_))
        ));

        // Best-effort: the nickname write is not rolled back, and the
        // account stays provisional with no refresh token issued.
        let account = accounts
            .find_by_internal_id(&internal_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.nickname.as_deref(), Some("alice"));
        assert!(!account.has_account);
        assert_eq!(account.profile_image_url, None);
    }

    #[tokio::test]
    async fn complete_account_is_rejected() {
        let fx = fixture();
        let mut account = Account::provisional(Provider::Kakao, "u1");
        account.has_account = true;
        account.nickname = Some("alice".to_string());
        let internal_id = account.internal_id.clone();
        fx.accounts.insert(account).await;

        let err = fx
            .orchestrator
            .complete(&internal_id, request("alice2", &[]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Auth(AuthError::SessionNotProvisional)
        ));
    }

    #[tokio::test]
    async fn unknown_internal_id_is_unauthorized() {
        let fx = fixture();
        let err = fx
            .orchestrator
            .complete("no-such-user", request("alice", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::TokenNotFound)));
    }

    #[tokio::test]
    async fn unknown_survey_categories_are_ignored() {
        let fx = fixture();
        let internal_id = seed_provisional(&fx.accounts).await;

        fx.orchestrator
            .complete(&internal_id, request("alice", &["환경", "요리", "뜨개질"]))
            .await
            .unwrap();

        let account = fx
            .accounts
            .find_by_internal_id(&internal_id)
            .await
            .unwrap()
            .unwrap();
        assert!(account.survey.environment);
        let expected = SurveyAnswers {
            environment: true,
            ..SurveyAnswers::default()
        };
        assert_eq!(account.survey, expected);
    }
}
