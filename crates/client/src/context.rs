use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use powermemo_core::ChatMessage;
use serde_json::json;

use crate::{Error, User};

/// Context length used when `max_token_size` is zero.
pub const DEFAULT_MAX_TOKEN_SIZE: u32 = 1000;

/// Everything except RFC 3986 unreserved characters.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Options for [`User::context`].
///
/// Rendered into the query string in a fixed order. List options become one
/// repeated key per element, `topic_limits` and `chats` are sent as a single
/// JSON-encoded value each, and unset options are left out entirely.
///
/// # Example
///
/// ```
/// use powermemo_client::ContextOptions;
///
/// let options = ContextOptions {
///     prefer_topics: vec!["interest".into(), "work".into()],
///     topic_limits: [("interest".to_string(), 3)].into(),
///     require_event_summary: Some(true),
///     ..ContextOptions::default()
/// };
/// assert_eq!(
///     options.query_string(),
///     "max_token_size=1000&prefer_topics=interest&prefer_topics=work\
///      &topic_limits_json=%7B%22interest%22%3A3%7D&require_event_summary=true"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ContextOptions {
    /// Upper bound on the returned context, in tokens. Zero means
    /// [`DEFAULT_MAX_TOKEN_SIZE`].
    pub max_token_size: u32,
    /// Topics to rank first.
    pub prefer_topics: Vec<String>,
    /// Topics to restrict the context to.
    pub only_topics: Vec<String>,
    /// Maximum number of sub-topics per topic.
    pub max_subtopic_size: Option<u32>,
    /// Per-topic sub-topic limits.
    pub topic_limits: BTreeMap<String, u32>,
    /// Share of the token budget spent on profiles versus events.
    pub profile_event_ratio: Option<f64>,
    /// Whether events must carry a summary to be included.
    pub require_event_summary: Option<bool>,
    /// Recent conversation used to pick relevant memories.
    pub chats: Vec<ChatMessage>,
    /// Minimum similarity for an event to be considered relevant to `chats`.
    pub event_similarity_threshold: Option<f64>,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            max_token_size: DEFAULT_MAX_TOKEN_SIZE,
            prefer_topics: Vec::new(),
            only_topics: Vec::new(),
            max_subtopic_size: None,
            topic_limits: BTreeMap::new(),
            profile_event_ratio: None,
            require_event_summary: None,
            chats: Vec::new(),
            event_similarity_threshold: None,
        }
    }
}

impl ContextOptions {
    fn effective_max_token_size(&self) -> u32 {
        if self.max_token_size == 0 {
            DEFAULT_MAX_TOKEN_SIZE
        } else {
            self.max_token_size
        }
    }

    /// The ordered parameter list. The profile endpoint takes everything but
    /// the event tuning knobs.
    fn pairs(&self, include_context_only: bool) -> Vec<(&'static str, String)> {
        let mut pairs = vec![(
            "max_token_size",
            self.effective_max_token_size().to_string(),
        )];
        pairs.extend(
            self.prefer_topics
                .iter()
                .map(|topic| ("prefer_topics", topic.clone())),
        );
        pairs.extend(
            self.only_topics
                .iter()
                .map(|topic| ("only_topics", topic.clone())),
        );
        if let Some(size) = self.max_subtopic_size {
            pairs.push(("max_subtopic_size", size.to_string()));
        }
        if !self.topic_limits.is_empty() {
            pairs.push(("topic_limits_json", json!(self.topic_limits).to_string()));
        }
        if include_context_only {
            if let Some(ratio) = self.profile_event_ratio {
                pairs.push(("profile_event_ratio", ratio.to_string()));
            }
            if let Some(required) = self.require_event_summary {
                let flag = if required { "true" } else { "false" };
                pairs.push(("require_event_summary", flag.to_owned()));
            }
        }
        if !self.chats.is_empty() {
            pairs.push(("chats_str", json!(self.chats).to_string()));
        }
        if include_context_only {
            if let Some(threshold) = self.event_similarity_threshold {
                pairs.push(("event_similarity_threshold", threshold.to_string()));
            }
        }
        pairs
    }

    /// The context query as ordered, unencoded key/value pairs.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.pairs(true)
    }

    /// The context query, percent-encoded and joined with `&`.
    pub fn query_string(&self) -> String {
        encode(&self.pairs(true))
    }

    pub(crate) fn profile_query_string(&self) -> String {
        encode(&self.pairs(false))
    }
}

fn encode(pairs: &[(&'static str, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{key}={}", utf8_percent_encode(value, QUERY_VALUE)))
        .collect::<Vec<_>>()
        .join("&")
}

impl User {
    /// Fetch a synthesized memory context for this user, ready to be placed
    /// in a prompt.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> Result<(), powermemo_client::Error> {
    /// use powermemo_client::{ContextOptions, PowermemoClient};
    ///
    /// let client = PowermemoClient::new("http://localhost:8019", "secret")?;
    /// let context = client
    ///     .user("u-1")
    ///     .context(&ContextOptions {
    ///         max_token_size: 500,
    ///         only_topics: vec!["interest".into()],
    ///         ..ContextOptions::default()
    ///     })
    ///     .await?;
    /// println!("{context}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn context(&self, options: &ContextOptions) -> Result<String, Error> {
        let path = format!("{}?{}", self.path("/users/context"), options.query_string());
        let data = self.client.get(&path).await?;
        Ok(data.str_field("context")?.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use powermemo_core::ChatMessage;
    use serde_json::json;

    use super::*;
    use crate::test_support::{MockServer, ok};

    fn keys(pairs: &[(&'static str, String)]) -> Vec<&'static str> {
        pairs.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn default_only_sends_token_budget() {
        let options = ContextOptions::default();
        assert_eq!(
            options.query_pairs(),
            vec![("max_token_size", "1000".to_string())]
        );
    }

    #[test]
    fn zero_budget_falls_back_to_default() {
        let options = ContextOptions {
            max_token_size: 0,
            ..ContextOptions::default()
        };
        assert_eq!(options.query_string(), "max_token_size=1000");
    }

    #[test]
    fn repeated_keys_and_embedded_json() {
        let options = ContextOptions {
            prefer_topics: vec!["a".into(), "b".into()],
            only_topics: vec!["c".into()],
            topic_limits: [("x".to_string(), 1)].into(),
            ..ContextOptions::default()
        };

        let pairs = options.query_pairs();
        assert_eq!(pairs.iter().filter(|(k, _)| *k == "prefer_topics").count(), 2);
        assert_eq!(pairs.iter().filter(|(k, _)| *k == "only_topics").count(), 1);
        assert!(pairs.contains(&("topic_limits_json", r#"{"x":1}"#.to_string())));

        let query = options.query_string();
        assert_eq!(query.matches("prefer_topics=").count(), 2);
        assert_eq!(query.matches("only_topics=").count(), 1);
        assert!(query.contains("topic_limits_json=%7B%22x%22%3A1%7D"));
    }

    #[test]
    fn parameters_follow_fixed_order() {
        let options = ContextOptions {
            max_token_size: 300,
            prefer_topics: vec!["p".into()],
            only_topics: vec!["o".into()],
            max_subtopic_size: Some(4),
            topic_limits: [("t".to_string(), 2)].into(),
            profile_event_ratio: Some(0.75),
            require_event_summary: Some(false),
            chats: vec![ChatMessage::user("hi")],
            event_similarity_threshold: Some(0.2),
        };
        assert_eq!(
            keys(&options.query_pairs()),
            vec![
                "max_token_size",
                "prefer_topics",
                "only_topics",
                "max_subtopic_size",
                "topic_limits_json",
                "profile_event_ratio",
                "require_event_summary",
                "chats_str",
                "event_similarity_threshold",
            ]
        );
    }

    #[test]
    fn scalars_render_plainly() {
        let options = ContextOptions {
            max_subtopic_size: Some(4),
            profile_event_ratio: Some(0.75),
            require_event_summary: Some(true),
            ..ContextOptions::default()
        };
        let pairs = options.query_pairs();
        assert!(pairs.contains(&("max_subtopic_size", "4".to_string())));
        assert!(pairs.contains(&("profile_event_ratio", "0.75".to_string())));
        assert!(pairs.contains(&("require_event_summary", "true".to_string())));
    }

    #[test]
    fn chats_are_embedded_as_json_array() {
        let options = ContextOptions {
            chats: vec![ChatMessage::user("I love jazz")],
            ..ContextOptions::default()
        };
        let pairs = options.query_pairs();
        let (_, chats) = pairs.iter().find(|(k, _)| *k == "chats_str").unwrap();
        let decoded: serde_json::Value = serde_json::from_str(chats).unwrap();
        assert_eq!(decoded, json!([{"role": "user", "content": "I love jazz"}]));
    }

    #[test]
    fn profile_query_drops_context_only_parameters() {
        let options = ContextOptions {
            profile_event_ratio: Some(0.5),
            require_event_summary: Some(true),
            event_similarity_threshold: Some(0.1),
            only_topics: vec!["x".into()],
            ..ContextOptions::default()
        };
        assert_eq!(
            options.profile_query_string(),
            "max_token_size=1000&only_topics=x"
        );
    }

    #[test]
    fn values_are_percent_encoded() {
        let options = ContextOptions {
            prefer_topics: vec!["life & work".into()],
            ..ContextOptions::default()
        };
        assert!(options.query_string().ends_with("prefer_topics=life%20%26%20work"));
    }

    #[tokio::test]
    async fn context_returns_text() {
        let server = MockServer::start().await;
        let user = server.client().user("u-1");
        let handle = server.serve(vec![ok(json!({"context": "# Memory\n- likes jazz"}))]);

        let options = ContextOptions {
            prefer_topics: vec!["a".into(), "b".into()],
            topic_limits: [("x".to_string(), 1)].into(),
            ..ContextOptions::default()
        };
        let context = user.context(&options).await.unwrap();
        assert_eq!(context, "# Memory\n- likes jazz");

        let requests = handle.await.unwrap();
        assert_eq!(requests[0].path(), "/api/v1/users/context/u-1");
        assert_eq!(
            requests[0].query(),
            vec![
                ("max_token_size".to_string(), "1000".to_string()),
                ("prefer_topics".to_string(), "a".to_string()),
                ("prefer_topics".to_string(), "b".to_string()),
                ("topic_limits_json".to_string(), r#"{"x":1}"#.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn context_requires_string() {
        let server = MockServer::start().await;
        let user = server.client().user("u-1");
        let _handle = server.serve(vec![ok(json!({"context": null}))]);

        let err = user.context(&ContextOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::ResponseShape { ref field, .. } if field == "context"));
    }
}
