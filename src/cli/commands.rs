//! CLI command implementations

use anyhow::Result;
use std::fs;
use std::sync::Arc;

use crate::api;
use crate::auth::models::Role;
use crate::auth::{AuthService, FileTokenStorage};
use crate::cli::{error, info, success, warn};
use crate::config::{self, Config};
use crate::error::Error;
use crate::store::postgres::PgStore;

/// Initialize a new klinik.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = std::path::Path::new("klinik.toml");

    if config_path.exists() {
        warn("klinik.toml already exists");
        return Ok(());
    }

    let content = config::loader::default_config_content();
    fs::write(config_path, content)?;

    success("Created klinik.toml");
    info("Edit the configuration file, then run 'klinik-auth seed-admin' to create the first admin");

    Ok(())
}

/// Start the admin HTTP API server
pub async fn serve(host: &str, port: u16) -> Result<()> {
    let config = load_config()?;
    api::run_server(config, host, port).await?;
    Ok(())
}

/// Create the first admin account
pub async fn seed_admin(
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
) -> Result<()> {
    let config = load_config()?;
    let service = connect_service(&config).await?;

    match service
        .create_account(email, password, Role::Admin, first_name, last_name)
        .await
    {
        Ok(account) => {
            success(&format!("Created admin account {}", account.email));
            Ok(())
        }
        Err(Error::AccountAlreadyExists(email)) => {
            warn(&format!("Account {} already exists", email));
            Ok(())
        }
        Err(e) => {
            error(&format!("Could not create admin account: {}", e));
            Err(e.into())
        }
    }
}

/// Sign in and persist the session token
pub async fn login(email: &str, password: &str) -> Result<()> {
    let config = load_config()?;
    let service = connect_service(&config).await?;

    match service.login(email, password).await {
        Ok(account) => {
            success(&format!(
                "Signed in as {} ({})",
                account.display_name(),
                account.role.kind()
            ));
            Ok(())
        }
        Err(e @ Error::InvalidCredentials) | Err(e @ Error::SessionCreationFailed) => {
            error(&e.to_string());
            Err(e.into())
        }
        Err(e) => {
            error(&format!("Sign-in failed: {}", e));
            Err(e.into())
        }
    }
}

/// Sign out and clear the persisted token
pub async fn logout() -> Result<()> {
    let config = load_config()?;
    let service = connect_service(&config).await?;

    service.resume().await?;
    service.logout().await;
    success("Signed out");
    Ok(())
}

/// Show the currently signed-in account
pub async fn whoami() -> Result<()> {
    let config = load_config()?;
    let service = connect_service(&config).await?;

    if service.resume().await? {
        if let Some(account) = service.current_account().await {
            info(&format!(
                "{} <{}> role={}",
                account.display_name(),
                account.email,
                account.role.kind()
            ));
            if let Some(profile_id) = account.role.expert_profile_id() {
                info(&format!("Expert profile: {}", profile_id));
            }
        }
    } else {
        warn("Not signed in");
    }
    Ok(())
}

/// Change the signed-in account's password
pub async fn passwd(current: &str, new: &str) -> Result<()> {
    let config = load_config()?;
    let service = connect_service(&config).await?;

    if !service.resume().await? {
        error("Not signed in. Run 'klinik-auth login' first.");
        return Err(Error::NoSession.into());
    }

    match service.change_password(current, new).await {
        Ok(()) => {
            success("Password changed");
            Ok(())
        }
        Err(e @ Error::WrongCurrentPassword) => {
            error(&e.to_string());
            Err(e.into())
        }
        Err(e) => {
            error(&format!("Password change failed: {}", e));
            Err(e.into())
        }
    }
}

/// Remove expired session rows
pub async fn sweep() -> Result<()> {
    let config = load_config()?;
    let service = connect_service(&config).await?;

    let removed = service.sweep_expired_sessions().await?;
    success(&format!("Removed {} expired sessions", removed));
    Ok(())
}

fn load_config() -> Result<Config> {
    config::load_config().map_err(|e| {
        error(&e.to_string());
        e.into()
    })
}

/// Build an auth service backed by PostgreSQL and the configured token file
async fn connect_service(config: &Config) -> Result<Arc<AuthService>> {
    let store = Arc::new(PgStore::connect(&config.database).await?);
    store.init_schema().await?;

    Ok(Arc::new(AuthService::new(
        store.clone(),
        store,
        Arc::new(FileTokenStorage::new(&config.auth.token_file)),
        &config.auth,
    )))
}
