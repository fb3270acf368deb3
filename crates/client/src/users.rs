use serde_json::{Map, Value, json};
use tracing::warn;

use crate::{Error, PowermemoClient, segment};

/// Handle to one user of the memory service.
///
/// Holds no server-side session; every method is an independent,
/// authenticated request. `fields` is only populated when the handle came
/// from a successful fetch.
#[derive(Debug, Clone)]
pub struct User {
    pub(crate) id: String,
    pub(crate) client: PowermemoClient,
    pub(crate) fields: Option<Map<String, Value>>,
}

impl User {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Fields cached when the handle was fetched.
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        self.fields.as_ref()
    }

    pub fn client(&self) -> &PowermemoClient {
        &self.client
    }

    /// `/{resource}/{user_id}` with the id escaped.
    pub(crate) fn path(&self, resource: &str) -> String {
        format!("{resource}/{}", segment(&self.id))
    }
}

impl PowermemoClient {
    /// Register a user. Returns the id assigned by the service.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> Result<(), powermemo_client::Error> {
    /// use powermemo_client::PowermemoClient;
    ///
    /// let client = PowermemoClient::new("http://localhost:8019", "secret")?;
    /// let data = serde_json::json!({"plan": "pro"});
    /// let id = client.add_user(data.as_object().cloned(), None).await?;
    /// println!("created {id}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn add_user(
        &self,
        data: Option<Map<String, Value>>,
        id: Option<&str>,
    ) -> Result<String, Error> {
        let body = json!({ "data": data, "id": id });
        let data = self.post_json("/users", &body).await?;
        Ok(data.str_field("id")?.to_owned())
    }

    /// Replace a user's data. Returns the user id.
    pub async fn update_user(
        &self,
        user_id: &str,
        data: Option<Map<String, Value>>,
    ) -> Result<String, Error> {
        let body = json!({ "data": data });
        let data = self
            .put_json(&format!("/users/{}", segment(user_id)), &body)
            .await?;
        Ok(data.str_field("id")?.to_owned())
    }

    /// Fetch a user and cache its fields on the returned handle.
    pub async fn get_user(&self, user_id: &str) -> Result<User, Error> {
        let data = self.get(&format!("/users/{}", segment(user_id))).await?;
        Ok(User {
            id: user_id.to_owned(),
            client: self.clone(),
            fields: Some(data.into_map()?),
        })
    }

    /// A handle for `user_id` without contacting the service.
    pub fn user(&self, user_id: impl Into<String>) -> User {
        User {
            id: user_id.into(),
            client: self.clone(),
            fields: None,
        }
    }

    /// Fetch a user, creating it if the fetch fails.
    ///
    /// The fallback fires on *any* fetch failure, not only "not found": a
    /// transient network error also leads to a create attempt. The handle
    /// returned after a create carries no cached fields.
    pub async fn get_or_create_user(&self, user_id: &str) -> Result<User, Error> {
        match self.get_user(user_id).await {
            Ok(user) => Ok(user),
            Err(e) => {
                warn!(user_id, error = %e, "user fetch failed, creating user");
                self.add_user(None, Some(user_id)).await?;
                Ok(self.user(user_id))
            }
        }
    }

    /// Delete a user and everything stored for it.
    pub async fn delete_user(&self, user_id: &str) -> Result<(), Error> {
        self.delete(&format!("/users/{}", segment(user_id)))
            .await?;
        Ok(())
    }
}
