//! Read-only projections derived by the service from a user's blobs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::timestamp;

/// Topic label used when the service omits one.
pub const UNSET_TOPIC: &str = "NONE";

fn unset_topic() -> String {
    UNSET_TOPIC.to_owned()
}

/// Topic classification attached to a profile entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileAttributes {
    #[serde(default = "unset_topic")]
    pub topic: String,
    #[serde(default = "unset_topic")]
    pub sub_topic: String,
}

impl Default for ProfileAttributes {
    fn default() -> Self {
        Self {
            topic: unset_topic(),
            sub_topic: unset_topic(),
        }
    }
}

/// Wire shape of a profile entry.
#[derive(Debug, Clone, Deserialize)]
struct ProfileRecord {
    id: String,
    content: String,
    #[serde(default)]
    attributes: ProfileAttributes,
    #[serde(with = "timestamp::required")]
    created_at: DateTime<Utc>,
    #[serde(with = "timestamp::required")]
    updated_at: DateTime<Utc>,
}

/// One piece of what the service knows about a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ProfileRecord")]
pub struct UserProfile {
    pub id: String,
    pub content: String,
    pub topic: String,
    pub sub_topic: String,
    #[serde(serialize_with = "timestamp::required::serialize")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "timestamp::required::serialize")]
    pub updated_at: DateTime<Utc>,
}

impl From<ProfileRecord> for UserProfile {
    fn from(record: ProfileRecord) -> Self {
        Self {
            id: record.id,
            content: record.content,
            topic: record.attributes.topic,
            sub_topic: record.attributes.sub_topic,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl UserProfile {
    /// One-line `topic: sub_topic - content` rendering.
    pub fn describe(&self) -> String {
        format!("{}: {} - {}", self.topic, self.sub_topic, self.content)
    }
}

/// A profile entry keyed under its topic and sub-topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileEntry {
    pub id: String,
    pub content: String,
    #[serde(serialize_with = "timestamp::required::serialize")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "timestamp::required::serialize")]
    pub updated_at: DateTime<Utc>,
}

/// Nest profiles as `topic -> sub_topic -> entry`.
///
/// When two profiles share a topic and sub-topic, the later one wins.
pub fn group_profiles_by_topic(
    profiles: &[UserProfile],
) -> BTreeMap<String, BTreeMap<String, ProfileEntry>> {
    let mut grouped: BTreeMap<String, BTreeMap<String, ProfileEntry>> = BTreeMap::new();
    for p in profiles {
        grouped.entry(p.topic.clone()).or_default().insert(
            p.sub_topic.clone(),
            ProfileEntry {
                id: p.id.clone(),
                content: p.content.clone(),
                created_at: p.created_at,
                updated_at: p.updated_at,
            },
        );
    }
    grouped
}

/// A single profile change carried by an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDelta {
    pub content: String,
    /// Usually `{"topic": .., "sub_topic": ..}`.
    #[serde(default)]
    pub attributes: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTag {
    pub tag: String,
    pub value: String,
}

/// Structured content of a user event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub profile_delta: Vec<ProfileDelta>,
    /// Free-text summary of the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_tip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_tags: Option<Vec<EventTag>>,
}

/// A detected change to a user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEvent {
    pub id: String,
    #[serde(default)]
    pub event_data: Option<EventData>,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Only set on search results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}
