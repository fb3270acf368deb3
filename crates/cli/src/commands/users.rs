use clap::{Args, Subcommand};
use powermemo_client::PowermemoClient;
use serde_json::json;

use super::parse_json_data;
use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Show a user's stored data.
    Get {
        /// User ID.
        id: String,
    },
    /// Register a user.
    Create {
        /// Requested user ID; the service assigns one when omitted.
        #[arg(long)]
        id: Option<String>,
        /// JSON object attached to the user (string or @file path).
        #[arg(long)]
        data: Option<String>,
    },
    /// Replace a user's data.
    Update {
        /// User ID.
        id: String,
        /// JSON object attached to the user (string or @file path).
        #[arg(long)]
        data: String,
    },
    /// Delete a user and everything stored for it.
    Delete {
        /// User ID.
        id: String,
    },
}

fn parse_object(input: &str) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    match parse_json_data(input)? {
        serde_json::Value::Object(map) => Ok(map),
        other => anyhow::bail!("user data must be a JSON object, got {other}"),
    }
}

pub async fn run(
    client: &PowermemoClient,
    args: &UserArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    match &args.command {
        UserCommand::Get { id } => {
            let user = client.get_user(id).await?;
            let fields = user.fields().cloned().unwrap_or_default();
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&fields)?);
                }
                OutputFormat::Text => {
                    println!("User {}", user.id());
                    for (key, value) in &fields {
                        println!("  {key}: {value}");
                    }
                }
            }
        }
        UserCommand::Create { id, data } => {
            let data = data.as_deref().map(parse_object).transpose()?;
            let created = client.add_user(data, id.as_deref()).await?;
            match format {
                OutputFormat::Json => println!("{}", json!({ "id": created })),
                OutputFormat::Text => println!("Created user {created}"),
            }
        }
        UserCommand::Update { id, data } => {
            let updated = client.update_user(id, Some(parse_object(data)?)).await?;
            match format {
                OutputFormat::Json => println!("{}", json!({ "id": updated })),
                OutputFormat::Text => println!("Updated user {updated}"),
            }
        }
        UserCommand::Delete { id } => {
            client.delete_user(id).await?;
            if matches!(format, OutputFormat::Text) {
                println!("Deleted user {id}");
            }
        }
    }
    Ok(())
}
