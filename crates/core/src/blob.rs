//! Typed memory content.
//!
//! A [`Blob`] is one unit of memory submitted for a user. Its payload is one
//! of a closed set of variants ([`BlobContent`]); the discriminant sent on the
//! wire is always derived from the populated variant, so a blob cannot carry
//! a tag that disagrees with its payload.
//!
//! On the wire every blob travels inside a [`BlobData`] envelope whose
//! `blob_data` object is opaque until the tag is known. Decoding is therefore
//! done in two passes: the envelope first, then the payload against the shape
//! selected by the tag.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::DecodeError;
use crate::timestamp;

/// Discriminant for the blob variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobType {
    Chat,
    Doc,
    Image,
    Code,
    Transcript,
}

impl BlobType {
    /// Every variant, in wire order.
    pub const ALL: [Self; 5] = [
        Self::Chat,
        Self::Doc,
        Self::Image,
        Self::Code,
        Self::Transcript,
    ];

    /// The tag as it appears on the wire and in resource paths.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Doc => "doc",
            Self::Image => "image",
            Self::Code => "code",
            Self::Transcript => "transcript",
        }
    }
}

impl fmt::Display for BlobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlobType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| DecodeError::UnknownBlobType(s.to_owned()))
    }
}

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One OpenAI-style chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Display name for the speaker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Free-form per-message timestamp. Passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            alias: None,
            created_at: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }
}

/// A conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBlob {
    pub messages: Vec<ChatMessage>,
}

/// A plain text document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocBlob {
    pub content: String,
}

/// A source code snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlob {
    pub content: String,
    #[serde(default)]
    pub language: Option<String>,
}

/// An image given by URL, inline base64 data, both, or neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageBlob {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub base64: Option<String>,
}

/// A timed segment of an audio transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptStamp {
    pub content: String,
    pub start_timestamp_in_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time_timestamp_in_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

/// An audio transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptBlob {
    pub transcripts: Vec<TranscriptStamp>,
}

/// Variant-specific payload of a [`Blob`].
#[derive(Debug, Clone, PartialEq)]
pub enum BlobContent {
    Chat(ChatBlob),
    Doc(DocBlob),
    Code(CodeBlob),
    Image(ImageBlob),
    Transcript(TranscriptBlob),
}

impl BlobContent {
    pub fn blob_type(&self) -> BlobType {
        match self {
            Self::Chat(_) => BlobType::Chat,
            Self::Doc(_) => BlobType::Doc,
            Self::Code(_) => BlobType::Code,
            Self::Image(_) => BlobType::Image,
            Self::Transcript(_) => BlobType::Transcript,
        }
    }

    /// Encode the payload as the `blob_data` object.
    ///
    /// Image always carries both `url` and `base64` keys and code always
    /// carries `language`; unset values are `null`.
    pub fn to_blob_data(&self) -> Map<String, Value> {
        let mut data = Map::new();
        match self {
            Self::Chat(chat) => {
                data.insert("messages".into(), json!(chat.messages));
            }
            Self::Doc(doc) => {
                data.insert("content".into(), Value::String(doc.content.clone()));
            }
            Self::Code(code) => {
                data.insert("content".into(), Value::String(code.content.clone()));
                data.insert("language".into(), json!(code.language));
            }
            Self::Image(image) => {
                data.insert("url".into(), json!(image.url));
                data.insert("base64".into(), json!(image.base64));
            }
            Self::Transcript(transcript) => {
                data.insert("transcripts".into(), json!(transcript.transcripts));
            }
        }
        data
    }

    /// Decode a `blob_data` object against the shape selected by `blob_type`.
    pub fn from_blob_data(
        blob_type: BlobType,
        data: Map<String, Value>,
    ) -> Result<Self, DecodeError> {
        let value = Value::Object(data);
        let invalid = |source| DecodeError::InvalidPayload { blob_type, source };
        let content = match blob_type {
            BlobType::Chat => Self::Chat(serde_json::from_value(value).map_err(invalid)?),
            BlobType::Doc => Self::Doc(serde_json::from_value(value).map_err(invalid)?),
            BlobType::Code => Self::Code(serde_json::from_value(value).map_err(invalid)?),
            BlobType::Image => Self::Image(serde_json::from_value(value).map_err(invalid)?),
            BlobType::Transcript => {
                Self::Transcript(serde_json::from_value(value).map_err(invalid)?)
            }
        };
        Ok(content)
    }
}

impl From<ChatBlob> for BlobContent {
    fn from(blob: ChatBlob) -> Self {
        Self::Chat(blob)
    }
}

impl From<DocBlob> for BlobContent {
    fn from(blob: DocBlob) -> Self {
        Self::Doc(blob)
    }
}

impl From<CodeBlob> for BlobContent {
    fn from(blob: CodeBlob) -> Self {
        Self::Code(blob)
    }
}

impl From<ImageBlob> for BlobContent {
    fn from(blob: ImageBlob) -> Self {
        Self::Image(blob)
    }
}

impl From<TranscriptBlob> for BlobContent {
    fn from(blob: TranscriptBlob) -> Self {
        Self::Transcript(blob)
    }
}

/// One unit of typed memory content.
///
/// # Example
///
/// ```
/// use powermemo_core::{Blob, BlobType, ChatMessage};
///
/// let blob = Blob::chat(vec![
///     ChatMessage::user("I moved to Lisbon last spring"),
///     ChatMessage::assistant("How are you finding it?"),
/// ])
/// .with_field("source", "onboarding");
///
/// assert_eq!(blob.blob_type(), BlobType::Chat);
/// assert!(blob.blob_data().contains_key("messages"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    content: BlobContent,
    fields: Option<Map<String, Value>>,
    created_at: Option<DateTime<Utc>>,
}

impl Blob {
    pub fn new(content: impl Into<BlobContent>) -> Self {
        Self {
            content: content.into(),
            fields: None,
            created_at: None,
        }
    }

    pub fn chat(messages: Vec<ChatMessage>) -> Self {
        Self::new(ChatBlob { messages })
    }

    pub fn doc(content: impl Into<String>) -> Self {
        Self::new(DocBlob {
            content: content.into(),
        })
    }

    pub fn code(content: impl Into<String>, language: Option<String>) -> Self {
        Self::new(CodeBlob {
            content: content.into(),
            language,
        })
    }

    pub fn image(url: Option<String>, base64: Option<String>) -> Self {
        Self::new(ImageBlob { url, base64 })
    }

    pub fn transcript(transcripts: Vec<TranscriptStamp>) -> Self {
        Self::new(TranscriptBlob { transcripts })
    }

    /// Replace the metadata mapping.
    #[must_use]
    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Add a single metadata entry.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn blob_type(&self) -> BlobType {
        self.content.blob_type()
    }

    pub fn fields(&self) -> Option<&Map<String, Value>> {
        self.fields.as_ref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn content(&self) -> &BlobContent {
        &self.content
    }

    pub fn into_content(self) -> BlobContent {
        self.content
    }

    /// The normalized payload mapping sent as `blob_data`.
    pub fn blob_data(&self) -> Map<String, Value> {
        self.content.to_blob_data()
    }
}

/// Wire envelope for a blob, used for both insert requests and reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobData {
    /// Raw tag. Kept as a string so an unknown tag surfaces as
    /// [`DecodeError::UnknownBlobType`] rather than an envelope parse failure.
    pub blob_type: String,
    pub blob_data: Map<String, Value>,
    #[serde(default)]
    pub fields: Option<Map<String, Value>>,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl BlobData {
    /// Resolve the tag, then re-decode `blob_data` into the variant payload.
    pub fn into_blob(self) -> Result<Blob, DecodeError> {
        let blob_type: BlobType = self.blob_type.parse()?;
        let content = BlobContent::from_blob_data(blob_type, self.blob_data)?;
        Ok(Blob {
            content,
            fields: self.fields,
            created_at: self.created_at,
        })
    }
}

impl From<&Blob> for BlobData {
    fn from(blob: &Blob) -> Self {
        Self {
            blob_type: blob.blob_type().as_str().to_owned(),
            blob_data: blob.blob_data(),
            fields: blob.fields.clone(),
            created_at: blob.created_at,
            updated_at: None,
        }
    }
}

impl TryFrom<BlobData> for Blob {
    type Error = DecodeError;

    fn try_from(data: BlobData) -> Result<Self, Self::Error> {
        data.into_blob()
    }
}
