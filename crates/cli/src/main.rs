//! docchat CLI — the main entry point.
//!
//! Commands:
//! - `serve`   — Start the chat-with-pdf HTTP server
//! - `ask`     — Ask questions about a local PDF, in-process
//! - `init`    — Write a default config file
//! - `doctor`  — Diagnose configuration and upstream reachability

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "docchat",
    about = "docchat: ask questions about a PDF, get answers with page citations",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.docchat/config.toml
    #[arg(short, long, global = true, env = "DOCCHAT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask about a PDF (interactive unless --question is given)
    Ask {
        /// Path to the PDF file
        pdf: PathBuf,

        /// Ask a single question instead of entering interactive mode
        #[arg(short, long)]
        question: Option<String>,

        /// Number of pages in the PDF; citations past it are dropped
        #[arg(long)]
        pages: Option<u32>,
    },

    /// Write a default config file
    Init,

    /// Diagnose configuration and upstream reachability
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Ask {
            pdf,
            question,
            pages,
        } => commands::ask::run(config_path, &pdf, question, pages).await?,
        Commands::Init => commands::init::run(config_path).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
