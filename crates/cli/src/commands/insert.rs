use clap::{Args, Subcommand};
use powermemo_client::PowermemoClient;
use powermemo_core::{Blob, ChatMessage, ChatRole, TranscriptStamp, parse_timestamp};
use serde_json::json;

use super::{parse_field, parse_json_data, read_text};
use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct InsertArgs {
    /// User ID.
    #[arg(long)]
    pub user: String,
    /// Metadata attached to the blob (key=value, value parsed as JSON when possible).
    #[arg(long, value_parser = parse_field)]
    pub field: Vec<(String, serde_json::Value)>,
    /// Creation time, e.g. 2024-05-01T12:00:00Z.
    #[arg(long)]
    pub created_at: Option<String>,
    /// Flush the user's buffer for this blob type after inserting.
    #[arg(long)]
    pub flush: bool,
    #[command(subcommand)]
    pub kind: InsertKind,
}

#[derive(Subcommand, Debug)]
pub enum InsertKind {
    /// A plain document.
    Doc {
        /// Document text (string or @file path).
        content: String,
    },
    /// A conversation.
    Chat {
        /// Messages as `user:TEXT` or `assistant:TEXT`, in order.
        #[arg(required = true, value_parser = parse_message)]
        messages: Vec<ChatMessage>,
    },
    /// A source snippet.
    Code {
        /// Source text (string or @file path).
        content: String,
        /// Language of the snippet.
        #[arg(long)]
        language: Option<String>,
    },
    /// An image by URL, inline base64 data, or both.
    Image {
        /// Image URL.
        #[arg(long)]
        url: Option<String>,
        /// Base64-encoded image data (string or @file path).
        #[arg(long)]
        base64: Option<String>,
    },
    /// An audio transcript.
    Transcript {
        /// JSON list of stamps (string or @file path), each with `content`,
        /// `start_timestamp_in_seconds` and optional
        /// `end_time_timestamp_in_seconds` and `speaker`.
        stamps: String,
    },
}

fn parse_message(s: &str) -> Result<ChatMessage, String> {
    let (role, content) = s
        .split_once(':')
        .ok_or_else(|| format!("invalid ROLE:TEXT: no `:` found in `{s}`"))?;
    let role = match role.trim() {
        "user" => ChatRole::User,
        "assistant" => ChatRole::Assistant,
        other => return Err(format!("unknown role `{other}`, expected user or assistant")),
    };
    Ok(ChatMessage::new(role, content.trim_start()))
}

fn build_blob(args: &InsertArgs) -> anyhow::Result<Blob> {
    let mut blob = match &args.kind {
        InsertKind::Doc { content } => Blob::doc(read_text(content)?),
        InsertKind::Chat { messages } => Blob::chat(messages.clone()),
        InsertKind::Code { content, language } => Blob::code(read_text(content)?, language.clone()),
        InsertKind::Image { url, base64 } => {
            let base64 = base64.as_deref().map(read_text).transpose()?;
            Blob::image(url.clone(), base64)
        }
        InsertKind::Transcript { stamps } => {
            let stamps: Vec<TranscriptStamp> = serde_json::from_value(parse_json_data(stamps)?)?;
            Blob::transcript(stamps)
        }
    };
    for (key, value) in &args.field {
        blob = blob.with_field(key.clone(), value.clone());
    }
    if let Some(raw) = &args.created_at {
        match parse_timestamp(raw)? {
            Some(created_at) => blob = blob.with_created_at(created_at),
            None => anyhow::bail!("--created-at must be a timestamp, got `{raw}`"),
        }
    }
    Ok(blob)
}

pub async fn run(
    client: &PowermemoClient,
    args: &InsertArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let blob = build_blob(args)?;
    let user = client.user(args.user.clone());
    let id = user.insert(&blob).await?;
    if args.flush {
        user.flush(blob.blob_type()).await?;
    }

    match format {
        OutputFormat::Json => {
            println!("{}", json!({ "id": id, "blob_type": blob.blob_type() }));
        }
        OutputFormat::Text => {
            println!("Inserted {} blob {id}", blob.blob_type());
        }
    }
    Ok(())
}
