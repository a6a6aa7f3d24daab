use reqwest::Method;
use tracing::instrument;

use super::{Access, ApiClient, NO_QUERY};
use crate::errors::ServiceError;
use crate::models::{
    InventoryTransaction, Page, TransactionDraft, TransactionQuery, TransactionRequest,
    TransactionType,
};

/// `/inventory` endpoints. Transactions are append-only.
pub struct InventoryApi<'a> {
    client: &'a ApiClient,
}

impl<'a> InventoryApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        query: &TransactionQuery,
    ) -> Result<Page<InventoryTransaction>, ServiceError> {
        self.client.get_json("inventory", query).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<InventoryTransaction, ServiceError> {
        self.client
            .get_json(&format!("inventory/{id}"), NO_QUERY)
            .await
    }

    /// Every movement recorded for one wine, newest first.
    #[instrument(skip(self))]
    pub async fn history(&self, wine_id: i64) -> Result<Vec<InventoryTransaction>, ServiceError> {
        self.client
            .get_json(&format!("inventory/wine/{wine_id}"), NO_QUERY)
            .await
    }

    pub async fn stock_in(
        &self,
        request: &TransactionRequest,
    ) -> Result<InventoryTransaction, ServiceError> {
        self.post(TransactionType::In, request).await
    }

    pub async fn stock_out(
        &self,
        request: &TransactionRequest,
    ) -> Result<InventoryTransaction, ServiceError> {
        self.post(TransactionType::Out, request).await
    }

    /// Posts a draft to the route matching its direction.
    pub async fn create(&self, draft: &TransactionDraft) -> Result<InventoryTransaction, ServiceError> {
        self.post(draft.kind, &draft.to_request()).await
    }

    #[instrument(skip(self, request), fields(wine_id = request.wine_id, quantity = request.quantity))]
    async fn post(
        &self,
        kind: TransactionType,
        request: &TransactionRequest,
    ) -> Result<InventoryTransaction, ServiceError> {
        self.client
            .send_json(Method::POST, kind.path(), request, Access::Bearer)
            .await
    }
}
