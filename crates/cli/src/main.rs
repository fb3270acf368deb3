//! `PowerMemo` CLI
//!
//! A command-line interface for the `PowerMemo` memory service.

mod commands;

use clap::{Parser, Subcommand};
use powermemo_client::PowermemoClient;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

/// `PowerMemo` CLI: store and inspect long-term user memory.
#[derive(Parser, Debug)]
#[command(name = "powermemo", version, about)]
struct Cli {
    /// Project URL of the memory service.
    #[arg(
        long,
        env = "POWERMEMO_PROJECT_URL",
        default_value = "http://localhost:8019",
        global = true
    )]
    project_url: String,

    /// API key for authentication.
    #[arg(long, env = "POWERMEMO_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the service is reachable.
    Ping,
    /// Manage users.
    User(commands::users::UserArgs),
    /// Store a blob for a user.
    Insert(commands::insert::InsertArgs),
    /// Inspect and delete stored blobs.
    Blob(commands::blobs::BlobArgs),
    /// Process a user's buffered blobs now.
    Flush(commands::blobs::FlushArgs),
    /// Show a user's profile.
    Profile(commands::profile::ProfileArgs),
    /// List or search a user's events.
    Events(commands::events::EventsArgs),
    /// Print the memory context for a user.
    Context(commands::context::ContextArgs),
    /// Read or replace the project's profile configuration.
    Config(commands::config::ConfigArgs),
    /// Show project usage counters.
    Usage,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let builder = PowermemoClient::builder(&cli.project_url);
    let builder = match cli.api_key {
        Some(ref key) => builder.api_key(key),
        None => builder,
    };
    let client = builder.build()?;
    debug!(base_url = client.base_url(), "client configured");

    match cli.command {
        Command::Ping => commands::ping::run(&client).await,
        Command::User(args) => commands::users::run(&client, &args, &cli.format).await,
        Command::Insert(args) => commands::insert::run(&client, &args, &cli.format).await,
        Command::Blob(args) => commands::blobs::run(&client, &args, &cli.format).await,
        Command::Flush(args) => commands::blobs::flush(&client, &args).await,
        Command::Profile(args) => commands::profile::run(&client, &args, &cli.format).await,
        Command::Events(args) => commands::events::run(&client, &args, &cli.format).await,
        Command::Context(args) => commands::context::run(&client, &args, &cli.format).await,
        Command::Config(args) => commands::config::run(&client, &args, &cli.format).await,
        Command::Usage => commands::config::usage(&client, &cli.format).await,
    }
}
