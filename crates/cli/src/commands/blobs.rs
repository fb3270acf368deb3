use clap::{Args, Subcommand};
use powermemo_client::PowermemoClient;
use powermemo_core::{Blob, BlobContent, BlobData, BlobType, ChatRole};

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct BlobArgs {
    /// User ID.
    #[arg(long)]
    pub user: String,
    #[command(subcommand)]
    pub command: BlobCommand,
}

#[derive(Subcommand, Debug)]
pub enum BlobCommand {
    /// Show one blob.
    Get {
        /// Blob ID.
        id: String,
    },
    /// List blob IDs of one type.
    List {
        /// Blob type (chat, doc, code, image, transcript).
        #[arg(long = "type", default_value = "chat")]
        blob_type: BlobType,
        /// Page number, starting at 0.
        #[arg(long, default_value_t = 0)]
        page: u32,
        /// Page size.
        #[arg(long, default_value_t = 10)]
        page_size: u32,
    },
    /// Delete one blob.
    Delete {
        /// Blob ID.
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct FlushArgs {
    /// User ID.
    #[arg(long)]
    pub user: String,
    /// Blob type whose buffer is flushed.
    #[arg(long = "type", default_value = "chat")]
    pub blob_type: BlobType,
}

fn print_blob(blob: &Blob) {
    print!("{} blob", blob.blob_type());
    match blob.created_at() {
        Some(at) => println!(" created {}", at.to_rfc3339()),
        None => println!(),
    }
    if let Some(fields) = blob.fields() {
        for (key, value) in fields {
            println!("  {key}: {value}");
        }
    }
    match blob.content() {
        BlobContent::Chat(chat) => {
            for msg in &chat.messages {
                let who = msg.alias.as_deref().unwrap_or(match msg.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "assistant",
                });
                println!("  [{who}] {}", msg.content);
            }
        }
        BlobContent::Doc(doc) => println!("{}", doc.content),
        BlobContent::Code(code) => {
            if let Some(language) = &code.language {
                println!("  language: {language}");
            }
            println!("{}", code.content);
        }
        BlobContent::Image(image) => {
            println!("  url: {}", image.url.as_deref().unwrap_or("-"));
            if let Some(data) = &image.base64 {
                println!("  base64: {} bytes", data.len());
            }
        }
        BlobContent::Transcript(transcript) => {
            for stamp in &transcript.transcripts {
                let speaker = stamp.speaker.as_deref().unwrap_or("?");
                println!(
                    "  {start:>8.2}s {speaker}: {content}",
                    start = stamp.start_timestamp_in_seconds,
                    content = stamp.content,
                );
            }
        }
    }
}

pub async fn run(
    client: &PowermemoClient,
    args: &BlobArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let user = client.user(args.user.clone());
    match &args.command {
        BlobCommand::Get { id } => {
            let blob = user.get(id).await?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&BlobData::from(&blob))?);
                }
                OutputFormat::Text => print_blob(&blob),
            }
        }
        BlobCommand::List {
            blob_type,
            page,
            page_size,
        } => {
            let ids = user.get_all(*blob_type, *page, *page_size).await?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&ids)?);
                }
                OutputFormat::Text => {
                    println!("{} {blob_type} blobs (page {page}):", ids.len());
                    for id in &ids {
                        println!("  {id}");
                    }
                }
            }
        }
        BlobCommand::Delete { id } => {
            user.delete(id).await?;
            if matches!(format, OutputFormat::Text) {
                println!("Deleted blob {id}");
            }
        }
    }
    Ok(())
}

pub async fn flush(client: &PowermemoClient, args: &FlushArgs) -> anyhow::Result<()> {
    client
        .user(args.user.clone())
        .flush(args.blob_type)
        .await?;
    println!("Flushed {} buffer for {}", args.blob_type, args.user);
    Ok(())
}
