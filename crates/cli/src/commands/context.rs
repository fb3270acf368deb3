use std::collections::BTreeMap;

use clap::Args;
use powermemo_client::{ContextOptions, DEFAULT_MAX_TOKEN_SIZE, PowermemoClient};
use serde_json::json;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct ContextArgs {
    /// User ID.
    pub user: String,
    /// Upper bound on the context, in tokens.
    #[arg(long, default_value_t = DEFAULT_MAX_TOKEN_SIZE)]
    pub max_token_size: u32,
    /// Rank these topics first.
    #[arg(long = "prefer")]
    pub prefer_topics: Vec<String>,
    /// Restrict the context to these topics.
    #[arg(long = "only")]
    pub only_topics: Vec<String>,
    /// Maximum sub-topics per topic.
    #[arg(long)]
    pub max_subtopic_size: Option<u32>,
    /// Per-topic sub-topic limits (topic=N).
    #[arg(long = "limit", value_parser = parse_limit)]
    pub topic_limits: Vec<(String, u32)>,
    /// Share of the budget spent on profiles versus events.
    #[arg(long)]
    pub profile_event_ratio: Option<f64>,
    /// Only include events that carry a summary.
    #[arg(long)]
    pub require_event_summary: Option<bool>,
}

fn parse_limit(s: &str) -> Result<(String, u32), String> {
    let (topic, limit) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid TOPIC=N: no `=` found in `{s}`"))?;
    let limit = limit
        .parse()
        .map_err(|e| format!("invalid limit for `{topic}`: {e}"))?;
    Ok((topic.to_string(), limit))
}

impl ContextArgs {
    fn options(&self) -> ContextOptions {
        ContextOptions {
            max_token_size: self.max_token_size,
            prefer_topics: self.prefer_topics.clone(),
            only_topics: self.only_topics.clone(),
            max_subtopic_size: self.max_subtopic_size,
            topic_limits: self.topic_limits.iter().cloned().collect::<BTreeMap<_, _>>(),
            profile_event_ratio: self.profile_event_ratio,
            require_event_summary: self.require_event_summary,
            ..ContextOptions::default()
        }
    }
}

pub async fn run(
    client: &PowermemoClient,
    args: &ContextArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let context = client.user(args.user.clone()).context(&args.options()).await?;
    match format {
        OutputFormat::Json => println!("{}", json!({ "context": context })),
        OutputFormat::Text => println!("{context}"),
    }
    Ok(())
}
