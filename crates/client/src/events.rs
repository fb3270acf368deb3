use powermemo_core::UserEvent;
use serde::Serialize;
use tracing::warn;

use crate::{Error, ResponseData, User, segment};

/// Number of events returned when `topk` is zero.
pub const DEFAULT_TOPK: u32 = 10;

/// Parameters for listing a user's recent events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    /// Maximum number of events. Zero means [`DEFAULT_TOPK`].
    pub topk: u32,
    /// Trim the list to fit this many tokens.
    pub max_token_size: Option<u32>,
    /// Only return events that carry a summary.
    pub need_summary: bool,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            topk: DEFAULT_TOPK,
            max_token_size: None,
            need_summary: false,
        }
    }
}

impl EventQuery {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let topk = if self.topk == 0 { DEFAULT_TOPK } else { self.topk };
        let mut pairs = vec![("topk", topk.to_string())];
        if let Some(size) = self.max_token_size {
            pairs.push(("max_token_size", size.to_string()));
        }
        if self.need_summary {
            pairs.push(("need_summary", "true".to_owned()));
        }
        pairs
    }
}

/// Parameters for a similarity search over a user's events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventSearch {
    pub query: String,
    pub topk: u32,
    pub similarity_threshold: f64,
    /// Only consider events from the last this-many days.
    pub time_range_in_days: u32,
}

impl EventSearch {
    /// A search for `query` with the service's usual defaults: ten results,
    /// a 0.5 similarity floor, and a one-week window.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            topk: DEFAULT_TOPK,
            similarity_threshold: 0.5,
            time_range_in_days: 7,
        }
    }
}

fn decode_events(mut data: ResponseData) -> Result<Vec<UserEvent>, Error> {
    let items = data.take_array("events")?;
    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<UserEvent>(item) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(index, error = %e, "skipping malformed event");
                None
            }
        })
        .collect())
}

impl User {
    /// List this user's most recent events.
    pub async fn event(&self, query: &EventQuery) -> Result<Vec<UserEvent>, Error> {
        let data = self
            .client
            .get_with_query(&self.path("/users/event"), &query.pairs())
            .await?;
        decode_events(data)
    }

    /// Find events semantically close to `search.query`.
    pub async fn search_event(&self, search: &EventSearch) -> Result<Vec<UserEvent>, Error> {
        let data = self
            .client
            .get_with_query(&self.path("/users/event/search"), search)
            .await?;
        decode_events(data)
    }

    /// Overwrite an event's data.
    pub async fn update_event<B>(&self, event_id: &str, event_data: &B) -> Result<(), Error>
    where
        B: Serialize + ?Sized,
    {
        let path = format!("{}/{}", self.path("/users/event"), segment(event_id));
        self.client.put_json(&path, event_data).await?;
        Ok(())
    }

    pub async fn delete_event(&self, event_id: &str) -> Result<(), Error> {
        let path = format!("{}/{}", self.path("/users/event"), segment(event_id));
        self.client.delete(&path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_support::{MockServer, ok, status};

    fn event(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "event_data": {
                "profile_delta": [
                    {"content": "adopted a corgi", "attributes": {"topic": "life", "sub_topic": "pets"}}
                ],
                "event_tip": "User has a new dog",
            },
            "created_at": "2024-03-02T10:00:00.123456",
            "updated_at": "2024-03-02T10:00:00.123456",
        })
    }

    #[test]
    fn event_query_defaults() {
        assert_eq!(
            EventQuery::default().pairs(),
            vec![("topk", "10".to_string())]
        );
        let zero = EventQuery {
            topk: 0,
            ..EventQuery::default()
        };
        assert_eq!(zero.pairs(), vec![("topk", "10".to_string())]);
    }

    #[test]
    fn event_search_defaults() {
        let search = EventSearch::new("dogs");
        assert_eq!(search.topk, 10);
        assert!((search.similarity_threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(search.time_range_in_days, 7);
    }

    #[tokio::test]
    async fn event_sends_optional_parameters() {
        let server = MockServer::start().await;
        let user = server.client().user("u-1");
        let handle = server.serve(vec![ok(json!({"events": [event("e-1")]}))]);

        let query = EventQuery {
            topk: 5,
            max_token_size: Some(200),
            need_summary: true,
        };
        let events = user.event(&query).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "e-1");
        let data = events[0].event_data.as_ref().unwrap();
        assert_eq!(data.event_tip.as_deref(), Some("User has a new dog"));
        assert_eq!(data.profile_delta[0].content, "adopted a corgi");
        assert!(events[0].created_at.is_some());

        let requests = handle.await.unwrap();
        assert_eq!(requests[0].path(), "/api/v1/users/event/u-1");
        assert_eq!(
            requests[0].query(),
            vec![
                ("topk".to_string(), "5".to_string()),
                ("max_token_size".to_string(), "200".to_string()),
                ("need_summary".to_string(), "true".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn event_skips_malformed_entries() {
        let server = MockServer::start().await;
        let user = server.client().user("u-1");
        let _handle = server.serve(vec![ok(json!({
            "events": [event("e-1"), {"event_data": null}, event("e-3")]
        }))]);

        let events = user.event(&EventQuery::default()).await.unwrap();
        let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e-1", "e-3"]);
    }

    #[tokio::test]
    async fn event_accepts_null_timestamps() {
        let server = MockServer::start().await;
        let user = server.client().user("u-1");
        let _handle = server.serve(vec![ok(json!({
            "events": [{"id": "e-1", "created_at": "null", "updated_at": null}]
        }))]);

        let events = user.event(&EventQuery::default()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].created_at.is_none());
        assert!(events[0].updated_at.is_none());
    }

    #[tokio::test]
    async fn event_propagates_http_failure() {
        let server = MockServer::start().await;
        let user = server.client().user("u-1");
        let _handle = server.serve(vec![status(503)]);

        let err = user.event(&EventQuery::default()).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn search_event_sends_all_parameters() {
        let server = MockServer::start().await;
        let user = server.client().user("u-1");
        let mut hit = event("e-2");
        hit["similarity"] = json!(0.83);
        let handle = server.serve(vec![ok(json!({"events": [hit]}))]);

        let events = user
            .search_event(&EventSearch::new("new pets"))
            .await
            .unwrap();
        assert_eq!(events[0].similarity, Some(0.83));

        let requests = handle.await.unwrap();
        assert_eq!(requests[0].path(), "/api/v1/users/event/search/u-1");
        assert_eq!(
            requests[0].query(),
            vec![
                ("query".to_string(), "new pets".to_string()),
                ("topk".to_string(), "10".to_string()),
                ("similarity_threshold".to_string(), "0.5".to_string()),
                ("time_range_in_days".to_string(), "7".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn update_and_delete_target_event_id() {
        let server = MockServer::start().await;
        let user = server.client().user("u-1");
        let handle = server.serve(vec![ok(json!(null)), ok(json!(null))]);

        let patch = json!({"event_tip": "User has two dogs"});
        user.update_event("e-1", &patch).await.unwrap();
        user.delete_event("e-1").await.unwrap();

        let requests = handle.await.unwrap();
        assert_eq!(requests[0].method, "PUT");
        assert_eq!(requests[0].path(), "/api/v1/users/event/u-1/e-1");
        assert_eq!(requests[0].json(), patch);
        assert_eq!(requests[1].method, "DELETE");
        assert_eq!(requests[1].path(), "/api/v1/users/event/u-1/e-1");
    }
}
