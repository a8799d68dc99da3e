use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tarefas")]
#[command(about = "Multi-user to-do list web application")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server (default if no subcommand)
    Serve {
        /// Bind address, e.g. 127.0.0.1:3000 (overrides config)
        #[arg(long)]
        bind: Option<String>,

        /// Use an in-memory database that is discarded on exit
        #[arg(long)]
        ephemeral: bool,
    },
}
