//! Postgres backends for tokens and accounts.
//!
//! Schema lives in `sql/schema.sql`. The `accounts` table carries the unique
//! constraints the core relies on: `(provider, provider_id)` and `nickname`.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::Instrument;

use super::{AccountGateway, CreateOutcome, TokenStore};
use crate::auth::account::{Account, Provider};
use crate::auth::survey::SurveyAnswers;
use crate::auth::token::{TokenKind, TokenRecord};

pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn put(&self, record: TokenRecord) -> Result<()> {
        let query = r"
            INSERT INTO tokens (token, internal_id, kind, expires_at_ms)
            VALUES ($1, $2, $3, $4)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(&record.token)
            .bind(&record.internal_id)
            .bind(record.kind.as_str())
            .bind(record.expires_at_ms)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to store token")?;
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<TokenRecord>> {
        let query = "SELECT token, internal_id, kind, expires_at_ms FROM tokens WHERE token = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(token)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup token")?;

        row.map(|row| {
            let kind: String = row.get("kind");
            let kind = TokenKind::from_str(&kind)
                .ok_or_else(|| anyhow!("unknown token kind in store: {kind}"))?;
            Ok(TokenRecord {
                token: row.get("token"),
                internal_id: row.get("internal_id"),
                kind,
                expires_at_ms: row.get("expires_at_ms"),
            })
        })
        .transpose()
    }

    async fn delete(&self, token: &str) -> Result<()> {
        let query = "DELETE FROM tokens WHERE token = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        // Zero rows affected is fine: delete is idempotent.
        sqlx::query(query)
            .bind(token)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to delete token")?;
        Ok(())
    }
}

pub struct PgAccountGateway {
    pool: PgPool,
}

impl PgAccountGateway {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ACCOUNT_COLUMNS: &str = r"
    internal_id, provider, provider_id, nickname, has_account, profile_image_url,
    environment, charity, relationships, relaxation, romance, exercise,
    travel, lang, culture, challenge, hobby, workplace
";

fn account_from_row(row: &PgRow) -> Result<Account> {
    let provider: String = row.get("provider");
    let provider = Provider::from_str(&provider)
        .ok_or_else(|| anyhow!("unknown provider in store: {provider}"))?;
    Ok(Account {
        internal_id: row.get("internal_id"),
        provider,
        provider_id: row.get("provider_id"),
        nickname: row.get("nickname"),
        has_account: row.get("has_account"),
        profile_image_url: row.get("profile_image_url"),
        survey: SurveyAnswers {
            environment: row.get("environment"),
            charity: row.get("charity"),
            relationships: row.get("relationships"),
            relaxation: row.get("relaxation"),
            romance: row.get("romance"),
            exercise: row.get("exercise"),
            travel: row.get("travel"),
            culture: row.get("culture"),
            lang: row.get("lang"),
            challenge: row.get("challenge"),
            hobby: row.get("hobby"),
            workplace: row.get("workplace"),
        },
    })
}

#[async_trait]
impl AccountGateway for PgAccountGateway {
    async fn find_by_provider_identity(
        &self,
        provider: Provider,
        provider_id: &str,
    ) -> Result<Option<Account>> {
        let query = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE provider = $1 AND provider_id = $2"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(provider.as_str())
            .bind(provider_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup account by provider identity")?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_by_internal_id(&self, internal_id: &str) -> Result<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE internal_id = $1");
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(internal_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup account by internal id")?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn create(&self, account: Account) -> Result<CreateOutcome> {
        let query = r"
            INSERT INTO accounts (internal_id, provider, provider_id, has_account)
            VALUES ($1, $2, $3, $4)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let inserted = sqlx::query(query)
            .bind(&account.internal_id)
            .bind(account.provider.as_str())
            .bind(&account.provider_id)
            .bind(account.has_account)
            .execute(&self.pool)
            .instrument(span)
            .await;

        match inserted {
            Ok(_) => Ok(CreateOutcome::Created(account)),
            Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::Conflict),
            Err(err) => Err(err).context("failed to create account"),
        }
    }

    async fn save(&self, account: &Account) -> Result<()> {
        let query = r"
            UPDATE accounts SET
                nickname = $2,
                has_account = $3,
                profile_image_url = $4,
                environment = $5, charity = $6, relationships = $7, relaxation = $8,
                romance = $9, exercise = $10, travel = $11, lang = $12,
                culture = $13, challenge = $14, hobby = $15, workplace = $16
            WHERE internal_id = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(&account.internal_id)
            .bind(&account.nickname)
            .bind(account.has_account)
            .bind(&account.profile_image_url)
            .bind(account.survey.environment)
            .bind(account.survey.charity)
            .bind(account.survey.relationships)
            .bind(account.survey.relaxation)
            .bind(account.survey.romance)
            .bind(account.survey.exercise)
            .bind(account.survey.travel)
            .bind(account.survey.lang)
            .bind(account.survey.culture)
            .bind(account.survey.challenge)
            .bind(account.survey.hobby)
            .bind(account.survey.workplace)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to save account")?;

        if result.rows_affected() == 0 {
            return Err(anyhow!(
                "no account with internal id {}",
                account.internal_id
            ));
        }
        Ok(())
    }

    async fn exists_by_nickname(&self, nickname: &str) -> Result<bool> {
        let query = "SELECT EXISTS(SELECT 1 FROM accounts WHERE nickname = $1) AS taken";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(nickname)
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .context("failed to check nickname")?;
        Ok(row.get("taken"))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }
}
