//! Core types for the `PowerMemo` memory service.
//!
//! This crate holds everything that is independent of transport: the blob
//! content model and its wire envelope, lenient timestamp parsing, and the
//! profile/event projections the service returns.

pub mod blob;
pub mod error;
pub mod id;
pub mod profile;
pub mod timestamp;

pub use blob::{
    Blob, BlobContent, BlobData, BlobType, ChatBlob, ChatMessage, ChatRole, CodeBlob, DocBlob,
    ImageBlob, TranscriptBlob, TranscriptStamp,
};
pub use error::{DecodeError, TimeFormatError};
pub use id::{DEFAULT_UUID_SALT, string_to_uuid};
pub use profile::{
    EventData, EventTag, ProfileAttributes, ProfileDelta, ProfileEntry, UNSET_TOPIC, UserEvent,
    UserProfile, group_profiles_by_topic,
};
pub use timestamp::{format_timestamp, parse_timestamp};
