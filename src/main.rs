mod cli;
mod config;
mod engine;
mod generator;
mod persona;
mod server;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use engine::types::DensityPolicy;

#[derive(Parser)]
#[command(name = "marginalia", version, about = "Inline persona commentary for journal text")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (transport from config: stdio or http)
    Serve,
    /// Run analysis rounds over a text file and print the comments
    Analyze {
        /// Text file to analyze, or `-` for stdin
        path: PathBuf,
        /// Session ID (a fresh one is generated if omitted)
        #[arg(long)]
        session: Option<String>,
        /// Number of analysis rounds to run against the same session
        #[arg(long, default_value_t = 1)]
        rounds: usize,
        /// Extra instructions applied to every voice
        #[arg(long)]
        meta: Option<String>,
        /// The writer's current emotional state
        #[arg(long)]
        state: Option<String>,
        /// Density policy: sentence_exclusive or persona_unique
        #[arg(long)]
        policy: Option<String>,
        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the configured persona voices
    Personas,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = config::MarginaliaConfig::load()?;

    // Initialize tracing with the configured log level.
    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            server::serve(config).await?;
        }
        Command::Analyze {
            path,
            session,
            rounds,
            meta,
            state,
            policy,
            json,
        } => {
            let policy = policy
                .map(|p| p.parse::<DensityPolicy>())
                .transpose()
                .map_err(anyhow::Error::msg)?;
            let args = cli::AnalyzeArgs {
                path,
                session,
                rounds,
                meta,
                state,
                policy,
                json,
            };
            cli::analyze(&config, args).await?;
        }
        Command::Personas => {
            cli::personas(&config)?;
        }
    }

    Ok(())
}
