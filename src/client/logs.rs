use tracing::instrument;

use super::{ApiClient, NO_QUERY};
use crate::errors::ServiceError;
use crate::models::{LogQuery, OperationLog, Page};

pub struct LogsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> LogsApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, query: &LogQuery) -> Result<Page<OperationLog>, ServiceError> {
        self.client.get_json("logs", query).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<OperationLog, ServiceError> {
        self.client.get_json(&format!("logs/{id}"), NO_QUERY).await
    }
}
