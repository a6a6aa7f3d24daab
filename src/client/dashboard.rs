use tracing::instrument;

use super::{ApiClient, NO_QUERY};
use crate::errors::ServiceError;
use crate::models::{
    AlertCounts, DashboardSummary, DistributionDimension, StockDistribution, StockTrend,
    TrendQuery,
};

pub struct DashboardApi<'a> {
    client: &'a ApiClient,
}

impl<'a> DashboardApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<DashboardSummary, ServiceError> {
        self.client.get_json("dashboard/summary", NO_QUERY).await
    }

    #[instrument(skip(self))]
    pub async fn trends(&self, query: &TrendQuery) -> Result<Vec<StockTrend>, ServiceError> {
        self.client.get_json("dashboard/trends", query).await
    }

    #[instrument(skip(self))]
    pub async fn distribution(
        &self,
        dimension: DistributionDimension,
    ) -> Result<Vec<StockDistribution>, ServiceError> {
        self.client
            .get_json(&format!("dashboard/distribution/{dimension}"), NO_QUERY)
            .await
    }

    /// Server-side alert counts; these follow the backend's own threshold rule.
    #[instrument(skip(self))]
    pub async fn alerts(&self) -> Result<AlertCounts, ServiceError> {
        self.client.get_json("dashboard/alerts", NO_QUERY).await
    }
}
