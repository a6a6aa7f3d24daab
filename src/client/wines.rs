use reqwest::Method;
use tracing::instrument;

use super::{Access, ApiClient, NO_QUERY};
use crate::errors::ServiceError;
use crate::models::{Page, Wine, WineDraft, WinePatch, WineQuery};

/// `/wines` catalog endpoints. Inputs are sent as given; validated
/// entry points live in [`crate::services::wines::WineService`].
pub struct WinesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> WinesApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, query: &WineQuery) -> Result<Page<Wine>, ServiceError> {
        self.client.get_json("wines", query).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Wine, ServiceError> {
        self.client.get_json(&format!("wines/{id}"), NO_QUERY).await
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create(&self, draft: &WineDraft) -> Result<Wine, ServiceError> {
        self.client
            .send_json(Method::POST, "wines", draft, Access::Bearer)
            .await
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: i64, patch: &WinePatch) -> Result<Wine, ServiceError> {
        self.client
            .send_json(Method::PUT, &format!("wines/{id}"), patch, Access::Bearer)
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.client
            .send_unit::<()>(Method::DELETE, &format!("wines/{id}"), None, Access::Bearer)
            .await
    }

    /// Wines the backend considers at or below their threshold.
    #[instrument(skip(self))]
    pub async fn low_stock(&self) -> Result<Vec<Wine>, ServiceError> {
        self.client.get_json("wines/low-stock", NO_QUERY).await
    }

    pub async fn regions(&self) -> Result<Vec<String>, ServiceError> {
        self.client.get_json("wines/regions", NO_QUERY).await
    }

    pub async fn varieties(&self) -> Result<Vec<String>, ServiceError> {
        self.client.get_json("wines/varieties", NO_QUERY).await
    }

    pub async fn suppliers(&self) -> Result<Vec<String>, ServiceError> {
        self.client.get_json("wines/suppliers", NO_QUERY).await
    }

    pub async fn locations(&self) -> Result<Vec<String>, ServiceError> {
        self.client.get_json("wines/locations", NO_QUERY).await
    }
}
