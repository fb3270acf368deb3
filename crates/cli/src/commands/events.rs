use clap::{Args, Subcommand};
use powermemo_client::{DEFAULT_TOPK, EventQuery, EventSearch, PowermemoClient};
use powermemo_core::UserEvent;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct EventsArgs {
    /// User ID.
    #[arg(long)]
    pub user: String,
    #[command(subcommand)]
    pub command: EventsCommand,
}

#[derive(Subcommand, Debug)]
pub enum EventsCommand {
    /// List the most recent events.
    List {
        /// Maximum number of events.
        #[arg(long, default_value_t = DEFAULT_TOPK)]
        topk: u32,
        /// Trim the list to this many tokens.
        #[arg(long)]
        max_token_size: Option<u32>,
        /// Only events that carry a summary.
        #[arg(long)]
        need_summary: bool,
    },
    /// Find events similar to a query.
    Search {
        /// Free-text query.
        query: String,
        /// Maximum number of events.
        #[arg(long, default_value_t = DEFAULT_TOPK)]
        topk: u32,
        /// Minimum similarity score.
        #[arg(long, default_value_t = 0.5)]
        similarity_threshold: f64,
        /// Only search the last N days.
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Delete one event.
    Delete {
        /// Event ID.
        id: String,
    },
}

fn print_events(events: &[UserEvent], format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(events)?);
        }
        OutputFormat::Text => {
            println!("{} events:", events.len());
            for event in events {
                let created = event
                    .created_at
                    .map_or_else(|| "?".to_string(), |at| at.to_rfc3339());
                let tip = event
                    .event_data
                    .as_ref()
                    .and_then(|d| d.event_tip.as_deref())
                    .unwrap_or("-");
                match event.similarity {
                    Some(score) => println!("  {} | {created} | {score:.2} | {tip}", event.id),
                    None => println!("  {} | {created} | {tip}", event.id),
                }
            }
        }
    }
    Ok(())
}

pub async fn run(
    client: &PowermemoClient,
    args: &EventsArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let user = client.user(args.user.clone());
    match &args.command {
        EventsCommand::List {
            topk,
            max_token_size,
            need_summary,
        } => {
            let query = EventQuery {
                topk: *topk,
                max_token_size: *max_token_size,
                need_summary: *need_summary,
            };
            print_events(&user.event(&query).await?, format)?;
        }
        EventsCommand::Search {
            query,
            topk,
            similarity_threshold,
            days,
        } => {
            let search = EventSearch {
                topk: *topk,
                similarity_threshold: *similarity_threshold,
                time_range_in_days: *days,
                ..EventSearch::new(query.clone())
            };
            print_events(&user.search_event(&search).await?, format)?;
        }
        EventsCommand::Delete { id } => {
            user.delete_event(id).await?;
            if matches!(format, OutputFormat::Text) {
                println!("Deleted event {id}");
            }
        }
    }
    Ok(())
}
