use reqwest::Method;
use tracing::instrument;

use super::{Access, ApiClient, NO_QUERY};
use crate::errors::ServiceError;
use crate::models::{NewUser, Page, StatusToggle, User, UserQuery, UserUpdate};

/// Admin-only account management. Non-admin sessions get `Forbidden`.
pub struct UsersApi<'a> {
    client: &'a ApiClient,
}

impl<'a> UsersApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, query: &UserQuery) -> Result<Page<User>, ServiceError> {
        self.client.get_json("users", query).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<User, ServiceError> {
        self.client.get_json(&format!("users/{id}"), NO_QUERY).await
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn create(&self, user: &NewUser) -> Result<User, ServiceError> {
        self.client
            .send_json(Method::POST, "users", user, Access::Bearer)
            .await
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: i64, update: &UserUpdate) -> Result<User, ServiceError> {
        self.client
            .send_json(Method::PUT, &format!("users/{id}"), update, Access::Bearer)
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.client
            .send_unit::<()>(Method::DELETE, &format!("users/{id}"), None, Access::Bearer)
            .await
    }

    /// Flips `is_active`. Not idempotent: each call inverts the flag.
    #[instrument(skip(self))]
    pub async fn toggle_status(&self, id: i64) -> Result<StatusToggle, ServiceError> {
        self.client
            .send_json(
                Method::PUT,
                &format!("users/{id}/status"),
                &serde_json::json!({}),
                Access::Bearer,
            )
            .await
    }
}
