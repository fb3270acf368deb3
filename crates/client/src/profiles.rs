use powermemo_core::UserProfile;
use serde_json::{Value, json};
use tracing::warn;

use crate::{ContextOptions, Error, ResponseData, User, segment};

/// Decode each element of `profiles` independently, skipping bad ones.
fn decode_profiles(mut data: ResponseData) -> Result<Vec<UserProfile>, Error> {
    let items = data.take_array("profiles")?;
    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<UserProfile>(item) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(index, error = %e, "skipping malformed profile");
                None
            }
        })
        .collect())
}

fn profile_body(content: &str, topic: &str, sub_topic: &str) -> Value {
    json!({
        "content": content,
        "attributes": {"topic": topic, "sub_topic": sub_topic},
    })
}

impl User {
    /// Fetch every profile entry the service has derived for this user.
    ///
    /// Entries that fail to decode are logged and left out; the call only
    /// fails if the envelope itself is bad or `profiles` is not an array.
    pub async fn profile(&self) -> Result<Vec<UserProfile>, Error> {
        let data = self.client.get(&self.path("/users/profile")).await?;
        decode_profiles(data)
    }

    /// Like [`profile`](Self::profile), but let the service filter and trim
    /// the result using the profile-related subset of `options`.
    pub async fn profile_with(&self, options: &ContextOptions) -> Result<Vec<UserProfile>, Error> {
        let path = format!(
            "{}?{}",
            self.path("/users/profile"),
            options.profile_query_string()
        );
        let data = self.client.get(&path).await?;
        decode_profiles(data)
    }

    /// Add a profile entry by hand. Returns the new profile id.
    pub async fn add_profile(
        &self,
        content: &str,
        topic: &str,
        sub_topic: &str,
    ) -> Result<String, Error> {
        let data = self
            .client
            .post_json(
                &self.path("/users/profile"),
                &profile_body(content, topic, sub_topic),
            )
            .await?;
        Ok(data.str_field("id")?.to_owned())
    }

    /// Overwrite a profile entry.
    pub async fn update_profile(
        &self,
        profile_id: &str,
        content: &str,
        topic: &str,
        sub_topic: &str,
    ) -> Result<(), Error> {
        let path = format!("{}/{}", self.path("/users/profile"), segment(profile_id));
        self.client
            .put_json(&path, &profile_body(content, topic, sub_topic))
            .await?;
        Ok(())
    }

    pub async fn delete_profile(&self, profile_id: &str) -> Result<(), Error> {
        let path = format!("{}/{}", self.path("/users/profile"), segment(profile_id));
        self.client.delete(&path).await?;
        Ok(())
    }
}
