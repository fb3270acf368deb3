use thiserror::Error;

/// A timestamp string matched none of the accepted layouts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized timestamp format: {input:?}")]
pub struct TimeFormatError {
    input: String,
}

impl TimeFormatError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// The rejected input, with surrounding quotes removed.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// Errors raised while turning a wire envelope into a concrete [`Blob`](crate::Blob).
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The envelope carried a `blob_type` outside the known set.
    #[error("unknown blob type: {0}")]
    UnknownBlobType(String),

    /// The `blob_data` object does not fit the shape required by its tag.
    #[error("invalid {blob_type} payload: {source}")]
    InvalidPayload {
        /// Tag the payload was decoded against.
        blob_type: crate::BlobType,
        /// Underlying serde failure.
        #[source]
        source: serde_json::Error,
    },
}
