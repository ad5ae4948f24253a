//! Authentication and session management for a counseling practice
//! back-office.
//!
//! This is the library interface, allowing programmatic access to the auth
//! service, its stores, and the route guard.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod store;

pub use auth::AuthService;
pub use config::Config;
pub use error::Error;
