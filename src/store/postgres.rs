//! PostgreSQL-backed credential and session stores

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::{Client, NoTls, Row};
use uuid::Uuid;

use crate::auth::models::{Account, Role, Session};
use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::store::{CredentialStore, SessionStore};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id UUID PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL,
    expert_profile_id UUID,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    active BOOLEAN NOT NULL DEFAULT TRUE,
    last_login_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    expires_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS sessions_account_id_idx ON sessions(account_id);
";

/// PostgreSQL implementation of both store traits
pub struct PgStore {
    client: Client,
}

impl PgStore {
    /// Connect to PostgreSQL and spawn the connection driver task
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let (client, connection) =
            tokio_postgres::connect(&config.connection_string(), NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        Ok(Self { client })
    }

    /// Create the accounts and sessions tables if they do not exist
    pub async fn init_schema(&self) -> Result<()> {
        self.client.batch_execute(SCHEMA).await?;
        tracing::debug!("Database schema ready");
        Ok(())
    }
}

const ACCOUNT_COLUMNS: &str = "id, email, password_hash, role, expert_profile_id, \
     first_name, last_name, active, last_login_at, created_at";

fn account_from_row(row: &Row) -> Result<Account> {
    let role_name: String = row.get("role");
    let profile_id: Option<Uuid> = row.get("expert_profile_id");
    let role = match (role_name.as_str(), profile_id) {
        ("admin", _) => Role::Admin,
        ("expert", Some(profile_id)) => Role::Expert { profile_id },
        ("expert", None) => {
            return Err(Error::Store(
                "expert account without a linked profile".to_string(),
            ))
        }
        (other, _) => return Err(Error::Store(format!("unknown role '{}'", other))),
    };

    Ok(Account {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        active: row.get("active"),
        last_login_at: row.get("last_login_at"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_active_by_email(&self, email: &str) -> Result<Option<Account>> {
        let needle = email.trim().to_lowercase();
        let query = format!(
            "SELECT {} FROM accounts WHERE email = $1 AND active",
            ACCOUNT_COLUMNS
        );
        let row = self.client.query_opt(query.as_str(), &[&needle]).await?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let query = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);
        let row = self.client.query_opt(query.as_str(), &[&id]).await?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn insert(&self, account: &Account) -> Result<()> {
        let result = self
            .client
            .execute(
                "INSERT INTO accounts \
                 (id, email, password_hash, role, expert_profile_id, \
                  first_name, last_name, active, last_login_at, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
                 ON CONFLICT (email) DO NOTHING",
                &[
                    &account.id,
                    &account.email,
                    &account.password_hash,
                    &account.role.kind().to_string(),
                    &account.role.expert_profile_id(),
                    &account.first_name,
                    &account.last_name,
                    &account.active,
                    &account.last_login_at,
                    &account.created_at,
                ],
            )
            .await?;

        if result == 0 {
            return Err(Error::AccountAlreadyExists(account.email.clone()));
        }
        Ok(())
    }

    async fn set_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        self.client
            .execute("UPDATE accounts SET last_login_at = $2 WHERE id = $1", &[&id, &at])
            .await?;
        Ok(())
    }

    async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<()> {
        let updated = self
            .client
            .execute(
                "UPDATE accounts SET password_hash = $2 WHERE id = $1",
                &[&id, &hash],
            )
            .await?;
        if updated == 0 {
            return Err(Error::Store(format!("no account {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn insert(&self, session: &Session) -> Result<()> {
        self.client
            .execute(
                "INSERT INTO sessions (token, account_id, expires_at) VALUES ($1, $2, $3)",
                &[&session.token, &session.account_id, &session.expires_at],
            )
            .await?;
        Ok(())
    }

    async fn find_with_account(&self, token: &str) -> Result<Option<(Session, Account)>> {
        let query = format!(
            "SELECT s.token, s.account_id, s.expires_at, {} \
             FROM sessions s JOIN accounts a ON a.id = s.account_id \
             WHERE s.token = $1",
            account_columns_prefixed()
        );
        let row = self.client.query_opt(query.as_str(), &[&token]).await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let session = Session {
            token: row.get("token"),
            account_id: row.get("account_id"),
            expires_at: row.get("expires_at"),
        };
        let account = account_from_row(&row)?;
        Ok(Some((session, account)))
    }

    async fn delete(&self, token: &str) -> Result<()> {
        self.client
            .execute("DELETE FROM sessions WHERE token = $1", &[&token])
            .await?;
        Ok(())
    }

    async fn delete_for_account_except(&self, account_id: Uuid, keep_token: &str) -> Result<()> {
        self.client
            .execute(
                "DELETE FROM sessions WHERE account_id = $1 AND token <> $2",
                &[&account_id, &keep_token],
            )
            .await?;
        Ok(())
    }

    async fn delete_for_account(&self, account_id: Uuid) -> Result<()> {
        self.client
            .execute("DELETE FROM sessions WHERE account_id = $1", &[&account_id])
            .await?;
        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64> {
        let removed = self
            .client
            .execute("DELETE FROM sessions WHERE expires_at <= NOW()", &[])
            .await?;
        Ok(removed)
    }
}

fn account_columns_prefixed() -> String {
    ACCOUNT_COLUMNS
        .split(", ")
        .map(|c| format!("a.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}
