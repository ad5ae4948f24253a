//! Auth service: login, logout, token validation, role checks

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::models::{Account, Role, RoleKind, Session};
use crate::auth::storage::TokenStorage;
use crate::auth::{password, token};
use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::store::{CredentialStore, SessionStore};

/// The client-local view of "who is signed in right now".
///
/// The token can be present without a resolved account right after startup,
/// before the persisted token has been validated.
#[derive(Default)]
struct SessionState {
    token: Option<String>,
    account: Option<Account>,
}

/// Orchestrates authentication against the credential and session stores.
///
/// Owns its session state explicitly; construct a fresh instance per client
/// (or per test) instead of sharing a global.
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    token_storage: Arc<dyn TokenStorage>,
    session_ttl: chrono::Duration,
    bcrypt_cost: u32,
    state: RwLock<SessionState>,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        token_storage: Arc<dyn TokenStorage>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            credentials,
            sessions,
            token_storage,
            session_ttl: chrono::Duration::hours(config.session_ttl_hours),
            bcrypt_cost: config.bcrypt_cost,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Resume a previous session from the persisted token, if one exists.
    ///
    /// Call once at startup, before rendering anything protected. Returns
    /// whether a session was resumed.
    pub async fn resume(&self) -> Result<bool> {
        match self.token_storage.load() {
            Ok(Some(token)) => {
                self.state.write().await.token = Some(token);
                self.validate_token().await
            }
            Ok(None) => Ok(false),
            Err(e) => {
                tracing::warn!("Could not read persisted token: {}", e);
                Ok(false)
            }
        }
    }

    /// Sign in with email and password, adopting the new session as this
    /// client instance's current one.
    pub async fn login(&self, email: &str, plaintext: &str) -> Result<Account> {
        let (account, token) = self.login_session(email, plaintext).await?;

        if let Err(e) = self.token_storage.store(&token) {
            tracing::warn!("Could not persist token, session will not survive restart: {}", e);
        }

        {
            let mut state = self.state.write().await;
            state.token = Some(token);
            state.account = Some(account.clone());
        }

        tracing::info!("Signed in {}", account.email);
        Ok(account)
    }

    /// Authenticate and create a session row, returning the account with
    /// the session's own token.
    ///
    /// Touches no client-local state, so concurrent callers each receive
    /// the token of the session they created; the HTTP login route builds
    /// its response from this.
    ///
    /// Lookup failures and password mismatches are both reported as
    /// `InvalidCredentials` so callers cannot tell which emails exist; a
    /// credential-store outage is reported as `SessionCreationFailed`, the
    /// same "try again" kind as a session-insert failure.
    pub async fn login_session(&self, email: &str, plaintext: &str) -> Result<(Account, String)> {
        let account = match self.credentials.find_active_by_email(email).await {
            Ok(Some(account)) => account,
            Ok(None) => return Err(Error::InvalidCredentials),
            Err(e) => {
                tracing::error!("Account lookup failed: {}", e);
                return Err(Error::SessionCreationFailed);
            }
        };

        if !password::verify(plaintext, &account.password_hash) {
            return Err(Error::InvalidCredentials);
        }

        let session = Session {
            token: token::generate(),
            account_id: account.id,
            expires_at: chrono::Utc::now() + self.session_ttl,
        };
        if let Err(e) = self.sessions.insert(&session).await {
            tracing::error!("Session insert failed: {}", e);
            return Err(Error::SessionCreationFailed);
        }

        // Best-effort; a failed timestamp update must not undo the login.
        let now = chrono::Utc::now();
        let mut account = account;
        match self.credentials.set_last_login(account.id, now).await {
            Ok(()) => account.last_login_at = Some(now),
            Err(e) => tracing::warn!("Could not update last login for {}: {}", account.id, e),
        }

        Ok((account, session.token))
    }

    /// Sign out. Idempotent; never fails from the caller's perspective.
    ///
    /// The server-side session delete is fire-and-forget: if it fails, the
    /// row expires on its own and local state is cleared regardless.
    pub async fn logout(&self) {
        let token = self.state.write().await.token.take();

        if let Some(token) = token {
            if let Err(e) = self.sessions.delete(&token).await {
                tracing::warn!("Session delete failed, row will expire naturally: {}", e);
            }
        }
        if let Err(e) = self.token_storage.clear() {
            tracing::warn!("Could not clear persisted token: {}", e);
        }

        self.state.write().await.account = None;
    }

    /// Check whether the held token still names a live session.
    ///
    /// Resolves the current account on success; clears all local state on an
    /// absent or expired session. With no token held this answers false
    /// without touching the store.
    pub async fn validate_token(&self) -> Result<bool> {
        let token = self.state.read().await.token.clone();
        let Some(token) = token else {
            return Ok(false);
        };

        match self.resolve_token(&token).await? {
            Some(account) => {
                let mut state = self.state.write().await;
                state.account = Some(account);
                Ok(true)
            }
            None => {
                self.logout().await;
                Ok(false)
            }
        }
    }

    /// Look up a bearer token, answering the account only for a live
    /// session on an active account. Does not touch local state.
    pub async fn resolve_token(&self, token: &str) -> Result<Option<Account>> {
        let Some((session, account)) = self.sessions.find_with_account(token).await? else {
            return Ok(None);
        };
        if session.is_expired() || !account.active {
            return Ok(None);
        }
        Ok(Some(account))
    }

    /// Pure role predicate on the resolved account. False when nobody is
    /// signed in.
    pub async fn has_role(&self, role: RoleKind) -> bool {
        self.state
            .read()
            .await
            .account
            .as_ref()
            .map(|a| a.role.kind() == role)
            .unwrap_or(false)
    }

    /// The resolved account, if a session has been validated
    pub async fn current_account(&self) -> Option<Account> {
        self.state.read().await.account.clone()
    }

    /// The held session token, if any
    pub async fn current_token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    /// Delete a specific session row, best-effort. Clears local state too
    /// when the revoked token is the held one.
    pub async fn revoke(&self, token: &str) {
        if let Err(e) = self.sessions.delete(token).await {
            tracing::warn!("Session delete failed, row will expire naturally: {}", e);
        }

        let mut state = self.state.write().await;
        if state.token.as_deref() == Some(token) {
            state.token = None;
            state.account = None;
            if let Err(e) = self.token_storage.clear() {
                tracing::warn!("Could not clear persisted token: {}", e);
            }
        }
    }

    /// Change the signed-in account's password.
    ///
    /// Verifies the current password against a fresh copy of the stored
    /// hash, then revokes the account's other sessions so a leaked old
    /// password cannot keep riding an existing token.
    pub async fn change_password(&self, current: &str, new: &str) -> Result<()> {
        let (account_id, held_token) = {
            let state = self.state.read().await;
            let account = state.account.as_ref().ok_or(Error::NoSession)?;
            (account.id, state.token.clone())
        };

        self.change_password_for(account_id, held_token.as_deref(), current, new)
            .await
    }

    /// Change a specific account's password, keeping `keep_token` alive.
    ///
    /// Backs both the client-side `change_password` and the HTTP password
    /// route, where the account comes from the request's own session.
    pub async fn change_password_for(
        &self,
        account_id: uuid::Uuid,
        keep_token: Option<&str>,
        current: &str,
        new: &str,
    ) -> Result<()> {
        let stored = match self.credentials.find_by_id(account_id).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                tracing::error!("Signed-in account {} no longer exists", account_id);
                return Err(Error::UpdateFailed);
            }
            Err(e) => {
                tracing::error!("Could not re-fetch account {}: {}", account_id, e);
                return Err(Error::UpdateFailed);
            }
        };

        if !password::verify(current, &stored.password_hash) {
            return Err(Error::WrongCurrentPassword);
        }

        let new_hash = password::hash(new, self.bcrypt_cost).map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            Error::UpdateFailed
        })?;

        if let Err(e) = self.credentials.set_password_hash(account_id, &new_hash).await {
            tracing::error!("Password update failed for {}: {}", account_id, e);
            return Err(Error::UpdateFailed);
        }

        // Best-effort revocation; the password itself has already changed.
        // With no token to keep, every session for the account goes.
        let revoked = match keep_token {
            Some(token) => {
                self.sessions
                    .delete_for_account_except(account_id, token)
                    .await
            }
            None => self.sessions.delete_for_account(account_id).await,
        };
        if let Err(e) = revoked {
            tracing::warn!("Could not revoke sessions for {}: {}", account_id, e);
        }

        if let Some(account) = self.state.write().await.account.as_mut() {
            if account.id == account_id {
                account.password_hash = new_hash;
            }
        }

        tracing::info!("Password changed for account {}", account_id);
        Ok(())
    }

    /// Create a credential record. Admin screens and the bootstrap command
    /// use this; the expert role must carry its profile link.
    pub async fn create_account(
        &self,
        email: &str,
        plaintext: &str,
        role: Role,
        first_name: &str,
        last_name: &str,
    ) -> Result<Account> {
        let hash = password::hash(plaintext, self.bcrypt_cost)?;
        let account = Account::new(email, hash, role, first_name, last_name);
        self.credentials.insert(&account).await?;
        tracing::info!("Created {} account {}", account.role.kind(), account.email);
        Ok(account)
    }

    /// Remove expired session rows. Hygiene only; validation never depends
    /// on it.
    pub async fn sweep_expired_sessions(&self) -> Result<u64> {
        let removed = self.sessions.delete_expired().await?;
        if removed > 0 {
            tracing::debug!("Swept {} expired sessions", removed);
        }
        Ok(removed)
    }
}
