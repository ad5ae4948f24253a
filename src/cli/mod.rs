//! CLI interface for the back-office auth service

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "klinik-auth")]
#[command(version = "1.0.0")]
#[command(about = "Authentication and session management for the back-office", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new klinik.toml configuration file
    Init,

    /// Start the admin HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "3470")]
        port: u16,
    },

    /// Create the first admin account
    SeedAdmin {
        /// Login email for the admin
        #[arg(short, long)]
        email: String,

        /// Password, also readable from the environment
        #[arg(short, long, env = "KLINIK_ADMIN_PASSWORD")]
        password: String,

        /// First name
        #[arg(long, default_value = "Admin")]
        first_name: String,

        /// Last name
        #[arg(long, default_value = "")]
        last_name: String,
    },

    /// Sign in and persist the session token
    Login {
        /// Login email
        #[arg(short, long)]
        email: String,

        /// Password, also readable from the environment
        #[arg(short, long, env = "KLINIK_PASSWORD")]
        password: String,
    },

    /// Sign out and clear the persisted token
    Logout,

    /// Show the currently signed-in account
    Whoami,

    /// Change the signed-in account's password
    Passwd {
        /// Current password
        #[arg(long, env = "KLINIK_PASSWORD")]
        current: String,

        /// New password
        #[arg(long, env = "KLINIK_NEW_PASSWORD")]
        new: String,
    },

    /// Remove expired session rows
    Sweep,
}
