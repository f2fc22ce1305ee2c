pub mod client;
pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "flock")]
#[command(about = "Flock CLI - command-line client for the flock-api server")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        help = "Server URL (falls back to FLOCK_SERVER, then the saved session)"
    )]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Server status and information")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Account registration, login and session inspection")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Create a church and become its founding administrator")]
    Onboard(commands::onboard::OnboardArgs),
}

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let server = cli.server.clone();

    match cli.command {
        Commands::Server { cmd } => commands::server::handle(cmd, server, output_format).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, server, output_format).await,
        Commands::Onboard(args) => commands::onboard::handle(args, server, output_format).await,
    }
}
