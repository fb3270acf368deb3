use powermemo_core::{Blob, BlobData, BlobType, parse_timestamp};
use serde_json::Value;

use crate::{Error, ResponseData, User, segment};

/// Envelope timestamps in none of the accepted layouts fail as
/// [`Error::TimeFormat`].
fn check_timestamps(data: &ResponseData) -> Result<(), Error> {
    for key in ["created_at", "updated_at"] {
        if let Some(Value::String(text)) = data.field(key) {
            parse_timestamp(text)?;
        }
    }
    Ok(())
}

impl User {
    /// Store a blob for this user. Returns the blob id.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> Result<(), powermemo_client::Error> {
    /// use powermemo_client::PowermemoClient;
    /// use powermemo_core::Blob;
    ///
    /// let client = PowermemoClient::new("http://localhost:8019", "secret")?;
    /// let user = client.user("u-1");
    /// let id = user
    ///     .insert(&Blob::doc("Meeting notes: ship v2 on Friday").with_field("team", "core"))
    ///     .await?;
    /// println!("stored {id}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn insert(&self, blob: &Blob) -> Result<String, Error> {
        let body = BlobData::from(blob);
        let data = self
            .client
            .post_json(&self.path("/blobs/insert"), &body)
            .await?;
        Ok(data.str_field("id")?.to_owned())
    }

    /// Fetch one blob and decode it into its concrete variant.
    pub async fn get(&self, blob_id: &str) -> Result<Blob, Error> {
        let path = format!("{}/{}", self.path("/blobs"), segment(blob_id));
        let data = self.client.get(&path).await?;
        check_timestamps(&data)?;
        let envelope: BlobData = serde_json::from_value(data.into_value())
            .map_err(|e| Error::Decode(format!("invalid blob envelope: {e}")))?;
        Ok(envelope.into_blob()?)
    }

    /// List blob ids of one type, a page at a time.
    ///
    /// Fails as a whole if any listed id is not a string.
    pub async fn get_all(
        &self,
        blob_type: BlobType,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<String>, Error> {
        let path = format!("{}/{blob_type}", self.path("/users/blobs"));
        let mut data = self
            .client
            .get_with_query(&path, &[("page", page), ("page_size", page_size)])
            .await?;
        data.take_array("ids")?
            .into_iter()
            .enumerate()
            .map(|(i, id)| match id {
                Value::String(id) => Ok(id),
                _ => Err(Error::shape(format!("ids[{i}]"), "a string")),
            })
            .collect()
    }

    /// Delete one blob.
    pub async fn delete(&self, blob_id: &str) -> Result<(), Error> {
        let path = format!("{}/{}", self.path("/blobs"), segment(blob_id));
        self.client.delete(&path).await?;
        Ok(())
    }

    /// Ask the service to process this user's buffered blobs of one type into
    /// profiles and events now, instead of waiting for the buffer to fill.
    pub async fn flush(&self, blob_type: BlobType) -> Result<(), Error> {
        let path = format!("{}/{blob_type}", self.path("/users/buffer"));
        self.client.post_empty(&path).await?;
        Ok(())
    }
}
