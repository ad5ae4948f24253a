use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use klinik_auth::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "klinik_auth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => cli::commands::init().await,
        Commands::Serve { host, port } => cli::commands::serve(&host, port).await,
        Commands::SeedAdmin {
            email,
            password,
            first_name,
            last_name,
        } => cli::commands::seed_admin(&email, &password, &first_name, &last_name).await,
        Commands::Login { email, password } => cli::commands::login(&email, &password).await,
        Commands::Logout => cli::commands::logout().await,
        Commands::Whoami => cli::commands::whoami().await,
        Commands::Passwd { current, new } => cli::commands::passwd(&current, &new).await,
        Commands::Sweep => cli::commands::sweep().await,
    }
}
