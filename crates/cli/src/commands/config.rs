use clap::{Args, Subcommand};
use powermemo_client::PowermemoClient;
use serde_json::json;

use super::read_text;
use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the current profile configuration.
    Get,
    /// Replace the profile configuration.
    Set {
        /// Configuration text (string or @file path).
        config: String,
    },
}

pub async fn run(
    client: &PowermemoClient,
    args: &ConfigArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    match &args.command {
        ConfigCommand::Get => {
            let config = client.get_config().await?;
            match format {
                OutputFormat::Json => println!("{}", json!({ "profile_config": config })),
                OutputFormat::Text => print!("{config}"),
            }
        }
        ConfigCommand::Set { config } => {
            client.update_config(&read_text(config)?).await?;
            if matches!(format, OutputFormat::Text) {
                println!("Profile configuration updated.");
            }
        }
    }
    Ok(())
}

pub async fn usage(client: &PowermemoClient, format: &OutputFormat) -> anyhow::Result<()> {
    let usage = client.get_usage().await?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&usage)?);
        }
        OutputFormat::Text => {
            for (key, value) in &usage {
                println!("{key}: {value}");
            }
        }
    }
    Ok(())
}
