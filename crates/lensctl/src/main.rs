//! Lens Control - CLI client for the Lens daemon.
//!
//! Talks to lensd over its HTTP API: browse personas, chat, run panels,
//! and administer the library.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lensctl")]
#[command(about = "Lens - synthesized persona platform", long_about = None)]
#[command(version)]
struct Cli {
    /// Daemon base URL
    #[arg(long, default_value = "http://127.0.0.1:7810", global = true)]
    daemon: String,

    /// Identity sent to the daemon (owner/admin operations)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show daemon health and library size
    Status,

    /// Show dashboard statistics
    Stats,

    /// List the interview questions
    Questions,

    /// Browse published personas
    Personas {
        /// Free-text search over narratives and attributes
        #[arg(long)]
        search: Option<String>,

        /// Filter by decision style (analytical/emotional/social/practical)
        #[arg(long)]
        decision_style: Option<String>,
    },

    /// Show one persona in full
    Show {
        /// Persona ID
        id: String,
    },

    /// Chat with a persona
    Chat {
        /// Persona ID
        persona_id: String,

        /// The message to send
        message: String,

        /// Continue an existing session
        #[arg(long)]
        session: Option<String>,
    },

    /// Ask a panel of personas the same question
    Panel {
        /// Persona IDs (2 to 5)
        #[arg(required = true, num_args = 2..=5)]
        persona_ids: Vec<String>,

        /// The question to pose
        #[arg(long, short = 'q')]
        question: String,
    },

    /// Seed the library with the built-in demo personas (admin)
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = client::DaemonClient::new(&cli.daemon, cli.user.clone());

    match cli.command {
        Commands::Status => commands::status(&client).await,
        Commands::Stats => commands::stats(&client).await,
        Commands::Questions => commands::questions(&client).await,
        Commands::Personas {
            search,
            decision_style,
        } => commands::personas(&client, search, decision_style).await,
        Commands::Show { id } => commands::show(&client, &id).await,
        Commands::Chat {
            persona_id,
            message,
            session,
        } => commands::chat(&client, &persona_id, &message, session).await,
        Commands::Panel {
            persona_ids,
            question,
        } => commands::panel(&client, &persona_ids, &question).await,
        Commands::Seed => commands::seed(&client).await,
    }
}
