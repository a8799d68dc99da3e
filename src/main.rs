use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use tarefas::cli::{Cli, Commands};
use tarefas::web::{self, Context};
use tarefas::{Config, Database, Profile};

#[tokio::main]
async fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tarefas=info,tower_http=info")),
        )
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    // Load configuration, from an explicit path when given
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load_with_profile(profile)?,
    };

    let (bind_override, ephemeral) = match cli.command {
        Some(Commands::Serve { bind, ephemeral }) => (bind, ephemeral),
        None => (None, false),
    };

    let db = if ephemeral {
        tracing::warn!("using an in-memory database; all data is lost on exit");
        Database::open_in_memory()?
    } else {
        let db_path = config.get_database_path();
        Database::new(
            db_path
                .to_str()
                .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?,
        )?
    };

    let bind = bind_override.unwrap_or_else(|| config.bind_address.clone());
    let app = web::router(Context::new(db, config));

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(address = %bind, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
