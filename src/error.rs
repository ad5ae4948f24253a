//! Error types for the back-office auth service

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Could not create a session, please try again")]
    SessionCreationFailed,

    #[error("Not signed in")]
    NoSession,

    #[error("Current password is incorrect")]
    WrongCurrentPassword,

    #[error("Could not save changes, please try again")]
    UpdateFailed,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Account '{0}' already exists")]
    AccountAlreadyExists(String),

    #[error("Config file not found. Run 'klinik-auth init' first.")]
    ConfigNotFound,

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for Error {
    fn from(err: bcrypt::BcryptError) -> Self {
        Error::Hashing(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
