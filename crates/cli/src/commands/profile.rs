use clap::Args;
use powermemo_client::{ContextOptions, PowermemoClient};
use powermemo_core::group_profiles_by_topic;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// User ID.
    pub user: String,
    /// Only show these topics.
    #[arg(long = "only")]
    pub only_topics: Vec<String>,
    /// Rank these topics first.
    #[arg(long = "prefer")]
    pub prefer_topics: Vec<String>,
    /// Trim the profile to this many tokens.
    #[arg(long)]
    pub max_token_size: Option<u32>,
    /// Group entries by topic and sub-topic.
    #[arg(long)]
    pub grouped: bool,
}

pub async fn run(
    client: &PowermemoClient,
    args: &ProfileArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let user = client.user(args.user.clone());
    let filtered =
        args.max_token_size.is_some() || !args.only_topics.is_empty() || !args.prefer_topics.is_empty();
    let profiles = if filtered {
        let options = ContextOptions {
            max_token_size: args.max_token_size.unwrap_or_default(),
            only_topics: args.only_topics.clone(),
            prefer_topics: args.prefer_topics.clone(),
            ..ContextOptions::default()
        };
        user.profile_with(&options).await?
    } else {
        user.profile().await?
    };

    match (format, args.grouped) {
        (OutputFormat::Json, true) => {
            let grouped = group_profiles_by_topic(&profiles);
            println!("{}", serde_json::to_string_pretty(&grouped)?);
        }
        (OutputFormat::Json, false) => {
            println!("{}", serde_json::to_string_pretty(&profiles)?);
        }
        (OutputFormat::Text, true) => {
            for (topic, entries) in group_profiles_by_topic(&profiles) {
                println!("{topic}");
                for (sub_topic, entry) in entries {
                    println!("  {sub_topic}: {}", entry.content);
                }
            }
        }
        (OutputFormat::Text, false) => {
            println!("{} profile entries:", profiles.len());
            for profile in &profiles {
                println!("  {}", profile.describe());
            }
        }
    }
    Ok(())
}
